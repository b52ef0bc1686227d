//! Logging setup and the custom sink layer

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

use crate::{LogSink, SessionConfig};

/// Crates whose events are forwarded to the sink
const PROJECT_CRATES: &[&str] = &["vsx_protocol", "vsx_session", "vsx_sim"];

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "vsx_protocol=info,vsx_session=info,vsx_sim=info";

/// Tracing layer that formats events from this workspace and hands them to a
/// [`LogSink`]
pub struct SinkLayer {
    sink: LogSink,
}

impl SinkLayer {
    /// Create a layer writing to `sink`
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if !PROJECT_CRATES.iter().any(|name| target.starts_with(name)) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut line = format!("[{}] {}", metadata.level(), target);
        if let Some(message) = visitor.message {
            line.push_str(": ");
            line.push_str(&message);
        }
        for (name, value) in visitor.fields {
            line.push_str(&format!(" {}={}", name, value));
        }

        (self.sink)(&line);
    }
}

/// Visitor collecting the message and any structured fields
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            name => self.fields.push((name, value.to_string())),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            name => self.fields.push((name, format!("{:?}", value))),
        }
    }
}

/// Install the global subscriber: `RUST_LOG`-driven filter, stderr formatter,
/// and the config's custom sink when one is set
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &SessionConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .with(config.log_sink.clone().map(SinkLayer::new))
        .try_init()
}
