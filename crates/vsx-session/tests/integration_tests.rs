//! Integration tests for the receiver session
//!
//! These tests drive a real session against the virtual receiver over an
//! in-memory duplex stream and verify:
//! - The connect handshake and initial status query
//! - Event publication in wire order
//! - Command round trips and the listening mode follow-up query
//! - Input name learning
//! - Disconnect and close behavior

use vsx_protocol::{DecodedEvent, EventName, HmgButton};
use vsx_session::{Session, SessionConfig, SessionError, SessionEvent};
use vsx_sim::{VirtualReceiver, VirtualReceiverCommand};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;
    use std::time::Duration;
    use tokio::sync::{broadcast, mpsc};
    use tokio::task::JoinHandle;
    use vsx_session::Subscription;
    use vsx_sim::run_virtual_receiver_task;

    pub const TIMEOUT: Duration = Duration::from_secs(5);

    /// A session wired to a virtual receiver
    pub struct Harness {
        pub session: Session,
        pub lines: broadcast::Receiver<String>,
        pub receiver_tx: mpsc::Sender<VirtualReceiverCommand>,
        pub receiver_task: JoinHandle<std::io::Result<()>>,
    }

    /// Start the receiver task, then attach a session to it
    ///
    /// `subscribe` runs before the session is attached so it sees `connect`.
    pub fn start<T>(
        receiver: VirtualReceiver,
        subscribe: impl FnOnce(&Session) -> T,
    ) -> (Harness, T) {
        let (session_stream, receiver_stream) = tokio::io::duplex(4096);
        let (receiver_tx, receiver_rx) = mpsc::channel(16);
        let (line_tx, lines) = broadcast::channel(256);

        let receiver_task = tokio::spawn(run_virtual_receiver_task(
            receiver_stream,
            receiver,
            receiver_rx,
            line_tx,
        ));

        let mut session = Session::new(SessionConfig::default());
        let subscribed = subscribe(&session);
        session.attach(session_stream).unwrap();

        let harness = Harness {
            session,
            lines,
            receiver_tx,
            receiver_task,
        };
        (harness, subscribed)
    }

    /// Next event on a subscription, failing the test on timeout or close
    pub async fn next_event(subscription: &mut Subscription) -> SessionEvent {
        tokio::time::timeout(TIMEOUT, subscription.recv())
            .await
            .expect("timed out waiting for event")
            .expect("session event bus closed")
    }

    /// Next decoded event on a subscription
    pub async fn next_decoded(subscription: &mut Subscription) -> DecodedEvent {
        match next_event(subscription).await {
            SessionEvent::Decoded(event) => event,
            other => panic!("expected a decoded event, got {:?}", other),
        }
    }

    /// Next command line the virtual receiver saw
    pub async fn next_line(lines: &mut broadcast::Receiver<String>) -> String {
        tokio::time::timeout(TIMEOUT, lines.recv())
            .await
            .expect("timed out waiting for command line")
            .expect("receiver line channel closed")
    }

    /// Skip command lines until `expected` arrives
    pub async fn wait_for_line(lines: &mut broadcast::Receiver<String>, expected: &str) {
        while next_line(lines).await != expected {}
    }

    /// Skip decoded events until one matches
    pub async fn wait_for(
        subscription: &mut Subscription,
        mut predicate: impl FnMut(&DecodedEvent) -> bool,
    ) -> DecodedEvent {
        loop {
            let event = next_decoded(subscription).await;
            if predicate(&event) {
                return event;
            }
        }
    }
}

use helpers::*;

// ============================================================================
// Handshake Tests
// ============================================================================

mod handshake_tests {
    use super::*;

    #[tokio::test]
    async fn initial_status_query_in_wire_order() {
        let (mut h, _) = start(VirtualReceiver::new("Test"), |_| ());

        let mut lines = Vec::new();
        for _ in 0..9 {
            lines.push(next_line(&mut h.lines).await);
        }

        assert_eq!(
            lines,
            vec!["?P", "?V", "?ZV", "?AP", "?M", "?Z2M", "?F", "?L", "?RGB04"]
        );
    }

    #[tokio::test]
    async fn connect_precedes_status_events() {
        let (_h, mut all) = start(VirtualReceiver::new("Test"), |s| s.subscribe());

        assert_eq!(next_event(&mut all).await, SessionEvent::Connected);

        let mut events = Vec::new();
        for _ in 0..8 {
            events.push(next_decoded(&mut all).await);
        }

        assert_eq!(
            events,
            vec![
                DecodedEvent::PowerChanged { on: true },
                DecodedEvent::VolumeChanged { db: -20.0 },
                DecodedEvent::ZoneVolumeChanged { db: -40 },
                DecodedEvent::ZonePowerChanged { on: false },
                DecodedEvent::MuteChanged { on: false },
                DecodedEvent::ZoneMuteChanged { on: false },
                DecodedEvent::InputChanged {
                    input: 4,
                    name: None
                },
                DecodedEvent::ListeningModeDisplay { mode: 152 },
            ]
        );
    }

    #[tokio::test]
    async fn input_names_learned_from_staggered_queries() {
        let mut receiver = VirtualReceiver::new("Test");
        receiver.rename_input(4, "Living Room");
        receiver.rename_input(25, "Blu-ray");

        let (h, mut names) = start(receiver, |s| s.subscribe_to(EventName::InputName));

        assert_eq!(
            next_decoded(&mut names).await,
            DecodedEvent::InputNameLearned {
                input: 4,
                name: "Living Room".into()
            }
        );
        assert_eq!(
            next_decoded(&mut names).await,
            DecodedEvent::InputNameLearned {
                input: 25,
                name: "Blu-ray".into()
            }
        );

        drop(h);
    }
}

// ============================================================================
// Command Round Trip Tests
// ============================================================================

mod command_tests {
    use super::*;

    #[tokio::test]
    async fn power_round_trip() {
        let (mut h, mut power) =
            start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::Power));

        assert_eq!(
            next_decoded(&mut power).await,
            DecodedEvent::PowerChanged { on: true }
        );

        h.session.power(false).unwrap();

        wait_for_line(&mut h.lines, "PF").await;
        assert_eq!(
            next_decoded(&mut power).await,
            DecodedEvent::PowerChanged { on: false }
        );
    }

    #[tokio::test]
    async fn volume_round_trip_in_half_db() {
        let (mut h, mut volume) =
            start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::Volume));

        next_decoded(&mut volume).await;
        h.session.volume(-35.5).unwrap();

        wait_for_line(&mut h.lines, "090VL").await;
        assert_eq!(
            next_decoded(&mut volume).await,
            DecodedEvent::VolumeChanged { db: -35.5 }
        );
    }

    #[tokio::test]
    async fn volume_clamps_above_maximum() {
        let (mut h, mut volume) =
            start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::Volume));

        next_decoded(&mut volume).await;
        h.session.volume(20.0).unwrap();

        wait_for_line(&mut h.lines, "185VL").await;
        assert_eq!(
            next_decoded(&mut volume).await,
            DecodedEvent::VolumeChanged { db: 12.0 }
        );
    }

    #[tokio::test]
    async fn zone_mute_is_not_main_mute() {
        let (h, mut zone_mute) =
            start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::ZoneMute));

        // Main mute is reported before zone mute in the initial status
        next_decoded(&mut zone_mute).await;
        let mut mute = h.session.subscribe_to(EventName::Mute);
        h.session.zone_mute(true).unwrap();

        assert_eq!(
            next_decoded(&mut zone_mute).await,
            DecodedEvent::ZoneMuteChanged { on: true }
        );
        assert_eq!(mute.try_recv(), None);
    }

    #[tokio::test]
    async fn zone_volume_steps() {
        let (h, mut zone_volume) =
            start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::ZoneVolume));

        next_decoded(&mut zone_volume).await;
        h.session.zone_volume_up().unwrap();
        h.session.zone_volume_up().unwrap();
        h.session.zone_volume_down().unwrap();

        let steps = vec![
            next_decoded(&mut zone_volume).await,
            next_decoded(&mut zone_volume).await,
            next_decoded(&mut zone_volume).await,
        ];
        assert_eq!(
            steps,
            vec![
                DecodedEvent::ZoneVolumeChanged { db: -39 },
                DecodedEvent::ZoneVolumeChanged { db: -38 },
                DecodedEvent::ZoneVolumeChanged { db: -39 },
            ]
        );
    }

    #[tokio::test]
    async fn select_input_carries_learned_name() {
        let mut receiver = VirtualReceiver::new("Test");
        receiver.rename_input(4, "Living Room");

        let (h, mut names) = start(receiver, |s| s.subscribe_to(EventName::InputName));
        let mut input = h.session.subscribe_to(EventName::Input);

        next_decoded(&mut names).await;
        h.session.select_input(4).unwrap();

        let event = wait_for(&mut input, |event| {
            matches!(event, DecodedEvent::InputChanged { name: Some(_), .. })
        })
        .await;
        assert_eq!(
            event,
            DecodedEvent::InputChanged {
                input: 4,
                name: Some("Living Room".into())
            }
        );
    }

    #[tokio::test]
    async fn select_zone_input_decodes_zone_line() {
        let (mut h, mut zone_input) =
            start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::ZoneInput));

        h.session.select_zone_input(19).unwrap();

        wait_for_line(&mut h.lines, "19ZS").await;
        let event = next_decoded(&mut zone_input).await;
        assert!(matches!(
            event,
            DecodedEvent::ZoneInputChanged { input: 19, .. }
        ));
    }

    #[tokio::test]
    async fn unknown_input_reply_is_unclassified() {
        let (h, mut data) = start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::Data));

        h.session.select_input(77).unwrap();

        assert_eq!(
            next_decoded(&mut data).await,
            DecodedEvent::Unclassified { line: "E06".into() }
        );
    }

    #[tokio::test]
    async fn hmg_button_written_verbatim() {
        let (mut h, _) = start(VirtualReceiver::new("Test"), |_| ());

        h.session.hmg_button(HmgButton::Enter).unwrap();

        wait_for_line(&mut h.lines, "30NW").await;
    }
}

// ============================================================================
// Listening Mode Tests
// ============================================================================

mod listening_mode_tests {
    use super::*;

    #[tokio::test]
    async fn mode_echo_requeries_display() {
        let (mut h, mut display) = start(VirtualReceiver::new("Test"), |s| {
            s.subscribe_to(EventName::ListeningModeDisplay)
        });
        let mut echo = h.session.subscribe_to(EventName::ListeningModeSet);

        assert_eq!(
            next_decoded(&mut display).await,
            DecodedEvent::ListeningModeDisplay { mode: 152 }
        );

        h.session.listening_mode(4).unwrap();

        wait_for_line(&mut h.lines, "0004SR").await;
        assert_eq!(
            next_decoded(&mut echo).await,
            DecodedEvent::ListeningModeCommandEcho { mode: 4 }
        );
        wait_for_line(&mut h.lines, "?L").await;
        let event = next_decoded(&mut display).await;
        assert_eq!(event, DecodedEvent::ListeningModeDisplay { mode: 4 });
        assert_eq!(
            event.listening_mode_name(),
            Some("Front Stage Surround Advance Wide")
        );
    }

    #[tokio::test]
    async fn front_panel_change_is_published() {
        let (h, mut mute) = start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::Mute));

        next_decoded(&mut mute).await;
        h.receiver_tx
            .send(VirtualReceiverCommand::Announce(vec!["MUT0".into()]))
            .await
            .unwrap();

        assert_eq!(
            next_decoded(&mut mute).await,
            DecodedEvent::MuteChanged { on: true }
        );
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn receiver_shutdown_publishes_end() {
        let (mut h, mut end) = start(VirtualReceiver::new("Test"), |s| s.subscribe_to(EventName::End));

        // Last staggered name query; nothing else is scheduled after it
        wait_for_line(&mut h.lines, "?RGB44").await;
        h.receiver_tx
            .send(VirtualReceiverCommand::Shutdown)
            .await
            .unwrap();

        assert_eq!(next_event(&mut end).await, SessionEvent::Disconnected);

        tokio::time::timeout(TIMEOUT, h.session.wait()).await.unwrap();
        assert!(matches!(h.session.mute(true), Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn close_ends_receiver_task() {
        let (mut h, _) = start(VirtualReceiver::new("Test"), |_| ());

        wait_for_line(&mut h.lines, "?P").await;
        h.session.close().unwrap();

        // Replies still in flight may hit the closed stream, so only the
        // task ending is checked
        let joined = tokio::time::timeout(TIMEOUT, h.receiver_task).await.unwrap();
        assert!(joined.is_ok());
    }

    #[tokio::test]
    async fn refresh_repeats_status_query() {
        let (mut h, _) = start(VirtualReceiver::new("Test"), |_| ());

        wait_for_line(&mut h.lines, "?L").await;
        h.session.query_status().unwrap();

        wait_for_line(&mut h.lines, "?P").await;
        assert_eq!(next_line(&mut h.lines).await, "?V");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use vsx_protocol::{CommandIntent, ResponseDecoder};

    fn toggle_intent() -> impl Strategy<Value = CommandIntent> {
        prop_oneof![
            any::<bool>().prop_map(|on| CommandIntent::PowerSet { on }),
            any::<bool>().prop_map(|on| CommandIntent::ZonePowerSet { on }),
            any::<bool>().prop_map(|on| CommandIntent::MuteSet { on }),
            any::<bool>().prop_map(|on| CommandIntent::ZoneMuteSet { on }),
        ]
    }

    fn expected_echo(intent: &CommandIntent) -> DecodedEvent {
        match *intent {
            CommandIntent::PowerSet { on } => DecodedEvent::PowerChanged { on },
            CommandIntent::ZonePowerSet { on } => DecodedEvent::ZonePowerChanged { on },
            CommandIntent::MuteSet { on } => DecodedEvent::MuteChanged { on },
            CommandIntent::ZoneMuteSet { on } => DecodedEvent::ZoneMuteChanged { on },
            _ => unreachable!(),
        }
    }

    proptest! {
        #[test]
        fn toggles_echo_their_own_state(intents in prop::collection::vec(toggle_intent(), 1..20)) {
            let mut receiver = VirtualReceiver::new("Test");
            let mut decoder = ResponseDecoder::new();

            for intent in &intents {
                for line in intent.encode().lines {
                    let line = String::from_utf8(line).unwrap();
                    let replies = receiver.process_line(line.trim_end_matches('\r'));
                    prop_assert_eq!(replies.len(), 1);
                    prop_assert_eq!(decoder.decode(&replies[0]), Some(expected_echo(intent)));
                }
            }
        }

        #[test]
        fn zone_volume_echo_matches_request(db in -80i16..=0) {
            let mut receiver = VirtualReceiver::new("Test");
            let mut decoder = ResponseDecoder::new();

            let intent = CommandIntent::ZoneVolumeSet { db: Some(f64::from(db)) };
            let line = String::from_utf8(intent.encode().lines[0].clone()).unwrap();
            let replies = receiver.process_line(line.trim_end_matches('\r'));

            prop_assert_eq!(
                decoder.decode(&replies[0]),
                Some(DecodedEvent::ZoneVolumeChanged { db })
            );
        }
    }
}
