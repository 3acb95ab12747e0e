//! Tracing subscriber setup: console formatter and initialisation.
use std::fmt::Write as _;
use std::io::IsTerminal as _;

use tracing_subscriber::EnvFilter;

/// Collects the `message` field and every other field of a
/// [`tracing::Event`] as `key=value` pairs.
#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: String,
}

impl FieldCollector {
    fn push(&mut self, name: &str, value: &dyn std::fmt::Display) {
        if name == "message" {
            self.message = value.to_string();
        } else {
            write!(self.fields, " {name}={value}").ok();
        }
    }
}

impl tracing::field::Visit for FieldCollector {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push(field.name(), &format_args!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field.name(), &value);
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits one line per event:
/// the level, the message, then the structured fields.
pub(super) struct BootstrapFormatter {
    pub(super) ansi: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for BootstrapFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let FieldCollector { message, fields } = collector;

        let (label, color) = match *event.metadata().level() {
            tracing::Level::ERROR => ("ERROR", "\x1b[31m"),
            tracing::Level::WARN => ("WARN ", "\x1b[33m"),
            tracing::Level::INFO => ("INFO ", "\x1b[32m"),
            tracing::Level::DEBUG => ("DEBUG", "\x1b[2m"),
            _ => ("TRACE", "\x1b[2m"),
        };

        if self.ansi {
            writeln!(writer, "{color}{label}\x1b[0m {message}\x1b[2m{fields}\x1b[0m")
        } else {
            writeln!(writer, "{label} {message}{fields}")
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Events go to stderr so the container log captures them; the filter comes
/// from `RUST_LOG` and defaults to `info`. Must be called once at program
/// startup, before any logging.
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = std::io::stderr().is_terminal();

    let console_layer = fmt::layer()
        .event_format(BootstrapFormatter { ansi })
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt as _;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(ansi: bool, emit: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let layer = tracing_subscriber::fmt::layer()
            .event_format(BootstrapFormatter { ansi })
            .with_writer(move || writer.clone());
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn plain_line_has_level_message_and_fields() {
        let out = capture(false, || {
            tracing::error!(path = "/etc/app.conf", expected = 0o640, "Dest file has bad perm");
        });
        assert_eq!(
            out,
            "ERROR Dest file has bad perm path=/etc/app.conf expected=416\n"
        );
    }

    #[test]
    fn display_fields_are_rendered_without_quotes() {
        let path = std::path::Path::new("/run_command");
        let out = capture(false, || {
            tracing::info!(path = %path.display(), "Writing out command to execute");
        });
        assert_eq!(out, "INFO  Writing out command to execute path=/run_command\n");
    }

    #[test]
    fn ansi_output_colours_the_level() {
        let out = capture(true, || tracing::warn!("careful"));
        assert!(out.starts_with("\x1b[33mWARN "), "got {out:?}");
        assert!(out.contains("careful"));
    }
}
