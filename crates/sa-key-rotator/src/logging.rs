//! Process-wide structured logging.
//!
//! On Google Cloud compute (GCE, Cloud Run, Cloud Functions) every event is
//! written to stderr as one JSON object in the shape Cloud Logging parses:
//! `message`, `severity` and `logging.googleapis.com/sourceLocation`, plus
//! the event's own fields. Elsewhere the regular `fmt` output is used.

use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting verbosity.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let filter = env_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if on_google_compute() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(CloudLoggingFormat)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
}

/// Filter for a `LOG_LEVEL` value; `info` when unset or unparseable.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    let directive = match level.map(|l| l.trim().to_ascii_lowercase()) {
        None => "info".to_string(),
        Some(l) if l.is_empty() => "info".to_string(),
        Some(l) if l == "warning" => "warn".to_string(),
        Some(l) if l == "critical" => "error".to_string(),
        Some(l) => l,
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Whether the process runs on Google Cloud compute infrastructure.
pub fn on_google_compute() -> bool {
    let set = |var: &str| std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false);
    if set("GCE_METADATA_HOST") || set("K_SERVICE") || set("FUNCTION_TARGET") {
        return true;
    }
    std::fs::read_to_string("/sys/class/dmi/id/product_name")
        .map(|name| is_google_product(&name))
        .unwrap_or(false)
}

/// DMI product names of Google machines, e.g. `Google Compute Engine`.
fn is_google_product(product_name: &str) -> bool {
    product_name.contains("Google")
}

/// Cloud Logging severity for a tracing level.
pub fn severity(level: &Level, critical: bool) -> &'static str {
    match *level {
        Level::ERROR if critical => "CRITICAL",
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        _ => "DEBUG",
    }
}

#[derive(Default)]
struct JsonVisitor {
    fields: Map<String, Value>,
    message: Option<String>,
    critical: bool,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.insert(field, Value::String(format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "critical" {
            self.critical = value;
        }
        self.insert(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }
}

/// Single-line JSON in the Cloud Logging structured format.
pub struct CloudLoggingFormat;

impl<S, N> FormatEvent<S, N> for CloudLoggingFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let mut entry = visitor.fields;
        entry.insert(
            "message".to_string(),
            Value::String(visitor.message.unwrap_or_default()),
        );
        entry.insert(
            "severity".to_string(),
            Value::String(severity(meta.level(), visitor.critical).to_string()),
        );

        let mut location = Map::new();
        if let Some(file) = meta.file() {
            location.insert("file".to_string(), Value::String(file.to_string()));
        }
        if let Some(line) = meta.line() {
            location.insert("line".to_string(), Value::String(line.to_string()));
        }
        location.insert(
            "function".to_string(),
            Value::String(meta.target().to_string()),
        );
        entry.insert(
            "logging.googleapis.com/sourceLocation".to_string(),
            Value::Object(location),
        );

        writeln!(writer, "{}", Value::Object(entry))
    }
}
