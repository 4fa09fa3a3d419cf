use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

/// An injected byte sink that observes download progress.
///
/// Every verified piece's bytes are mirrored into the sink as they are
/// written to disk, so a consumer that counts what it receives (a
/// progress bar, a rate meter) tracks the download for free. A sink
/// failure is logged and otherwise ignored; observation must not be able
/// to stall the download.
#[derive(Clone, Default)]
pub struct Progress {
    sink: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
}

impl Progress {
    /// Progress reporting into the given sink.
    pub fn sink(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(sink))),
        }
    }

    /// No progress reporting.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub(crate) fn record(&self, data: &[u8]) {
        if let Some(sink) = &self.sink {
            let mut sink = sink.lock();
            if let Err(e) = sink.write_all(data) {
                warn!(error = %e, "progress sink write failed");
            }
        }
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}
