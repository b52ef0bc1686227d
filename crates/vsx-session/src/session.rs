//! Session facade over one receiver connection
//!
//! A [`Session`] owns the observer bus and a command queue. Binding a
//! transport (with [`Session::open`] or [`Session::attach`]) spawns the
//! session task, which runs a select! loop over:
//! - Inbound bytes, framed and decoded into published events
//! - Caller commands, encoded and written in order
//! - Scheduled writes (the initial status query and staggered input-name
//!   queries), woken by the earliest due time
//!
//! The task is the only owner of the codec, so learned input names need no
//! locking.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use vsx_protocol::{
    CommandIntent, DecodedEvent, Direction, EncodeCommand, EventName, HmgButton, Query,
    ReceiverCodec, TERMINATOR,
};

use crate::events::{SessionEvent, Subscription};
use crate::transport::connect_tcp;
use crate::{SessionConfig, SessionError};

/// Delay between the wake line and the initial status query
pub const WAKE_DELAY: Duration = Duration::from_millis(100);

/// Spacing between staggered writes
pub const STAGGER_INTERVAL: Duration = Duration::from_millis(100);

const EVENT_CAPACITY: usize = 256;

/// Commands queued from the handle to the session task
#[derive(Debug)]
enum SessionCommand {
    Send(CommandIntent),
    Close,
}

/// Handle to a receiver session
///
/// Subscribe before binding a transport to see the `connect` event.
pub struct Session {
    config: SessionConfig,
    event_tx: broadcast::Sender<SessionEvent>,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    cmd_rx: Option<mpsc::UnboundedReceiver<SessionCommand>>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Create a session; no I/O happens until `open` or `attach`
    ///
    /// The config's `log_sink` is not used here. Log output is global and is
    /// routed to the sink by [`init_logging`](crate::init_logging).
    pub fn new(config: SessionConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        Self {
            config,
            event_tx,
            cmd_tx,
            cmd_rx: Some(cmd_rx),
            task: None,
        }
    }

    /// Session settings
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receive every event
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.event_tx.subscribe(), None)
    }

    /// Receive only events published under `name`
    pub fn subscribe_to(&self, name: EventName) -> Subscription {
        Subscription::new(self.event_tx.subscribe(), Some(name))
    }

    /// Connect to the configured endpoint over TCP and start the session
    ///
    /// A failed attempt is also published as an `error` event. Nothing is
    /// retried; the caller may call `open` again.
    pub async fn open(&mut self) -> Result<(), SessionError> {
        if self.cmd_rx.is_none() {
            return Err(SessionError::AlreadyOpen);
        }

        let endpoint = self.config.endpoint();
        match connect_tcp(&endpoint, self.config.connect_timeout()).await {
            Ok(stream) => self.attach(stream),
            Err(e) => {
                let _ = self.event_tx.send(SessionEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Start the session over an already connected stream
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the session task is
    /// spawned with `tokio::spawn`.
    pub fn attach<S>(&mut self, stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let cmd_rx = self.cmd_rx.take().ok_or(SessionError::AlreadyOpen)?;
        let task = SessionTask::new(stream, self.event_tx.clone(), self.config.verbose);
        self.task = Some(tokio::spawn(task.run(cmd_rx)));
        Ok(())
    }

    /// Queue a command for the receiver
    ///
    /// Commands sent before a transport is bound are written once it is.
    pub fn send(&self, intent: CommandIntent) -> Result<(), SessionError> {
        self.cmd_tx
            .send(SessionCommand::Send(intent))
            .map_err(|_| SessionError::Closed)
    }

    /// Main zone power
    pub fn power(&self, on: bool) -> Result<(), SessionError> {
        self.send(CommandIntent::PowerSet { on })
    }

    /// Zone 2 power
    pub fn zone_power(&self, on: bool) -> Result<(), SessionError> {
        self.send(CommandIntent::ZonePowerSet { on })
    }

    /// Main zone mute
    pub fn mute(&self, on: bool) -> Result<(), SessionError> {
        self.send(CommandIntent::MuteSet { on })
    }

    /// Zone 2 mute
    pub fn zone_mute(&self, on: bool) -> Result<(), SessionError> {
        self.send(CommandIntent::ZoneMuteSet { on })
    }

    /// Main zone volume in dB, clamped to -80..=+12
    pub fn volume(&self, db: impl Into<Option<f64>>) -> Result<(), SessionError> {
        self.send(CommandIntent::VolumeSet { db: db.into() })
    }

    /// Zone 2 volume in dB, clamped to -80..=0
    pub fn zone_volume(&self, db: impl Into<Option<f64>>) -> Result<(), SessionError> {
        self.send(CommandIntent::ZoneVolumeSet { db: db.into() })
    }

    /// Main zone volume one step up
    pub fn volume_up(&self) -> Result<(), SessionError> {
        self.send(CommandIntent::VolumeStep {
            direction: Direction::Up,
        })
    }

    /// Main zone volume one step down
    pub fn volume_down(&self) -> Result<(), SessionError> {
        self.send(CommandIntent::VolumeStep {
            direction: Direction::Down,
        })
    }

    /// Zone 2 volume one step up
    pub fn zone_volume_up(&self) -> Result<(), SessionError> {
        self.send(CommandIntent::ZoneVolumeStep {
            direction: Direction::Up,
        })
    }

    /// Zone 2 volume one step down
    pub fn zone_volume_down(&self) -> Result<(), SessionError> {
        self.send(CommandIntent::ZoneVolumeStep {
            direction: Direction::Down,
        })
    }

    /// Select the main zone input, then ask for it back
    pub fn select_input(&self, input: u8) -> Result<(), SessionError> {
        self.send(CommandIntent::InputSelect { input })?;
        self.send(CommandIntent::Query(Query::Input))
    }

    /// Select the zone 2 input
    pub fn select_zone_input(&self, input: u8) -> Result<(), SessionError> {
        self.send(CommandIntent::ZoneInputSelect { input })
    }

    /// Select a listening mode by ordinal
    pub fn listening_mode(&self, mode: u16) -> Result<(), SessionError> {
        self.send(CommandIntent::ListeningModeSelect { mode })
    }

    /// Ask for an input's display name
    pub fn query_input_name(&self, input: u8) -> Result<(), SessionError> {
        self.send(CommandIntent::InputNameQuery { input })
    }

    /// Press a home media gallery button
    pub fn hmg_button(&self, button: HmgButton) -> Result<(), SessionError> {
        self.send(CommandIntent::HmgButton { button })
    }

    /// Refresh every status value and all input names
    pub fn query_status(&self) -> Result<(), SessionError> {
        self.send(CommandIntent::BulkStatusQuery)
    }

    /// Close the transport; the task publishes `end` once done
    pub fn close(&self) -> Result<(), SessionError> {
        self.cmd_tx
            .send(SessionCommand::Close)
            .map_err(|_| SessionError::Closed)
    }

    /// Wait for the session task to finish
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Session task failed: {}", e);
            }
        }
    }
}

/// A write waiting for its due time
#[derive(Debug)]
struct ScheduledWrite {
    due: Instant,
    action: Deferred,
}

#[derive(Debug)]
enum Deferred {
    /// Bulk status query that completes the connect handshake
    InitialQuery,
    Line(Vec<u8>),
}

/// State owned by the spawned session task
struct SessionTask<S> {
    stream: S,
    codec: ReceiverCodec,
    event_tx: broadcast::Sender<SessionEvent>,
    scheduled: VecDeque<ScheduledWrite>,
    verbose: bool,
    buffer: Vec<u8>,
}

impl<S> SessionTask<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(stream: S, event_tx: broadcast::Sender<SessionEvent>, verbose: bool) -> Self {
        Self {
            stream,
            codec: ReceiverCodec::new(),
            event_tx,
            scheduled: VecDeque::new(),
            verbose,
            buffer: vec![0u8; 1024],
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>) {
        info!("Session task started");

        match self.drive(&mut cmd_rx).await {
            Ok(()) => self.publish(SessionEvent::Disconnected),
            Err(e) => {
                warn!("Session transport error: {}", e);
                self.publish(SessionEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        info!("Session task ended");
    }

    /// Main loop - runs until the peer closes, the caller closes, or I/O fails
    async fn drive(
        &mut self,
        cmd_rx: &mut mpsc::UnboundedReceiver<SessionCommand>,
    ) -> io::Result<()> {
        self.write_line(&[TERMINATOR]).await?;
        self.schedule(Instant::now() + WAKE_DELAY, Deferred::InitialQuery);

        loop {
            let next_due = self.scheduled.front().map(|write| write.due);

            tokio::select! {
                result = self.stream.read(&mut self.buffer) => {
                    let n = result?;
                    if n == 0 {
                        debug!("Receiver closed the connection");
                        return Ok(());
                    }
                    self.handle_bytes(n).await?;
                }

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Send(intent)) => self.write_intent(&intent).await?,
                        Some(SessionCommand::Close) | None => {
                            debug!("Closing receiver connection");
                            self.stream.shutdown().await?;
                            return Ok(());
                        }
                    }
                }

                _ = sleep_until_due(next_due) => {
                    self.run_due().await?;
                }
            }
        }
    }

    async fn handle_bytes(&mut self, n: usize) -> io::Result<()> {
        self.codec.push_bytes(&self.buffer[..n]);

        while let Some((event, line)) = self.codec.next_event_with_line() {
            self.log_decoded(&line, &event);
            let follow_up = event.follow_up();
            self.publish(SessionEvent::Decoded(event));

            if let Some(query) = follow_up {
                self.write_line(&query.encode()).await?;
            }
        }
        Ok(())
    }

    async fn write_intent(&mut self, intent: &CommandIntent) -> io::Result<()> {
        let encoded = intent.encode();
        for line in &encoded.lines {
            self.write_line(line).await?;
        }

        let now = Instant::now();
        for (i, line) in encoded.staggered.into_iter().enumerate() {
            let due = now + STAGGER_INTERVAL * (i as u32 + 1);
            self.schedule(due, Deferred::Line(line));
        }
        Ok(())
    }

    async fn run_due(&mut self) -> io::Result<()> {
        let now = Instant::now();
        while let Some(write) = self.pop_due(now) {
            match write.action {
                Deferred::InitialQuery => {
                    self.write_intent(&CommandIntent::BulkStatusQuery).await?;
                    info!("Receiver session ready");
                    self.publish(SessionEvent::Connected);
                }
                Deferred::Line(line) => self.write_line(&line).await?,
            }
        }
        Ok(())
    }

    fn schedule(&mut self, due: Instant, action: Deferred) {
        let index = self.scheduled.partition_point(|write| write.due <= due);
        self.scheduled.insert(index, ScheduledWrite { due, action });
    }

    fn pop_due(&mut self, now: Instant) -> Option<ScheduledWrite> {
        if self.scheduled.front()?.due <= now {
            self.scheduled.pop_front()
        } else {
            None
        }
    }

    async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        debug!("-> {:?}", String::from_utf8_lossy(line));
        self.stream.write_all(line).await?;
        self.stream.flush().await
    }

    fn log_decoded(&self, line: &str, event: &DecodedEvent) {
        if self.verbose {
            info!("<- {:?} {}: {:?}", line, event.name(), event);
        } else {
            debug!("<- {:?} {}: {:?}", line, event.name(), event);
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => sleep_until(due).await,
        None => std::future::pending().await,
    }
}
