use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::{Layer, Layered, SubscriberExt};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter, Registry};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over `log_level`. When `log_file` is given, a daily-rolling
/// JSON log is written next to it; keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init_logging(log_level: Option<&str>, log_file: Option<&Path>, json_console: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    let registry = Registry::default().with(env_filter);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let console: BoxedLayer = if json_console {
        console_layer.json().boxed()
    } else {
        console_layer.with_ansi(true).boxed()
    };

    let (file_layer, guard) = match log_file {
        Some(log_path) => {
            let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = log_path
                .file_name()
                .map_or_else(|| "physique.log".into(), |name| name.to_string_lossy().into_owned());
            let (writer, guard) = non_blocking(rolling::daily(directory, file_name));

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .json();
            (Some(layer.boxed()), Some(guard))
        }
        None => (None, None),
    };

    let layers: Vec<BoxedLayer> = std::iter::once(console).chain(file_layer).collect();

    registry
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
#[derive(Debug)]
pub struct OperationTimer {
    operation: String,
    start: Instant,
    finished: bool,
}

impl OperationTimer {
    /// Start timing `operation`
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
            finished: false,
        }
    }

    /// Stop the timer, log at info level and return the elapsed milliseconds
    pub fn finish(mut self) -> u128 {
        self.finished = true;
        let duration = self.start.elapsed().as_millis();
        info!(operation = %self.operation, duration_ms = duration, "Operation completed");
        duration
    }

    /// Elapsed time so far
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            let duration = self.start.elapsed().as_millis();
            tracing::debug!(operation = %self.operation, duration_ms = duration, "Operation finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(run: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, run);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_operation_timer_measures_elapsed() {
        let timer = OperationTimer::new("store_scan");
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(timer.elapsed() >= std::time::Duration::from_millis(2));
        assert!(timer.finish() >= 2);
    }

    #[test]
    fn test_finished_timer_logs_once() {
        let output = capture(|| {
            OperationTimer::new("get_user").finish();
        });
        assert_eq!(output.matches("get_user").count(), 1);
        assert!(output.contains("Operation completed"));
        assert!(!output.contains("Operation finished"));
    }

    #[test]
    fn test_dropped_timer_logs_at_debug() {
        let output = capture(|| {
            let _timer = OperationTimer::new("save_scan");
        });
        assert!(output.contains("Operation finished"));
        assert!(!output.contains("Operation completed"));
    }
}
