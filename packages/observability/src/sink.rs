//! Line-oriented writers for the JSON layer.
//!
//! Each log line is written and flushed under a lock so concurrent request
//! tasks never interleave partial lines on stdout or in the log file.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Shared writer that flushes after every write.
#[derive(Clone)]
pub struct LineWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LineWriter {
    /// Writer over the process's stdout.
    pub fn stdout() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    /// Writer appending to a file, creating parent directories as needed.
    pub fn append_to(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Box::new(file))),
        })
    }
}

impl io::Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber.
#[derive(Clone)]
pub struct LineWriterFactory {
    writer: LineWriter,
}

impl LineWriterFactory {
    pub fn new(writer: LineWriter) -> Self {
        Self { writer }
    }
}

impl<'a> MakeWriter<'a> for LineWriterFactory {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

/// Install the JSON subscriber as the global default.
pub(crate) fn init_json_subscriber(config: &LogConfig) {
    let writer = match config.log_path.as_deref() {
        Some(path) => match LineWriter::append_to(path) {
            Ok(writer) => writer,
            Err(e) => {
                eprintln!(
                    "failed to open log file {}: {e}; falling back to stdout",
                    path.display()
                );
                LineWriter::stdout()
            }
        },
        None => LineWriter::stdout(),
    };

    let json_layer = JsonLayer::new(config.service_name.clone(), LineWriterFactory::new(writer));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let _ = tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter))
        .try_init();
}
