use std::{
    io::{self, Read},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
};
use tracing::info;

/// Receives progress for long table scans. Called for every buffered read, so
/// implementations must be cheap and must not block.
pub trait ProgressListener: Send + Sync {
    fn begin_task(&self, description: &str, total_units: u64);
    fn increment(&self, units: u64);
}

/// Byte stream that reports every read to a [`ProgressListener`].
pub struct ProgressReader<'a, R> {
    inner: R,
    listener: &'a dyn ProgressListener,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    pub fn new(inner: R, listener: &'a dyn ProgressListener) -> Self {
        Self { inner, listener }
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.listener.increment(n as u64);
        }
        Ok(n)
    }
}

/// Logs each completed tenth of the current task.
#[derive(Debug, Default)]
pub struct LogProgress {
    task: Mutex<String>,
    total: AtomicU64,
    done: AtomicU64,
    decile: AtomicU64,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressListener for LogProgress {
    fn begin_task(&self, description: &str, total_units: u64) {
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = description.to_owned();
        self.total.store(total_units, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        self.decile.store(0, Ordering::Relaxed);
        info!(total_units, "{}", description);
    }

    fn increment(&self, units: u64) {
        let done = self.done.fetch_add(units, Ordering::Relaxed) + units;
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return;
        }
        let decile = (done.min(total) * 10) / total;
        let prev = self.decile.load(Ordering::Relaxed);
        if decile > prev
            && self
                .decile
                .compare_exchange(prev, decile, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            let task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
            info!("{}: {}%", task, decile * 10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_reports_every_byte() -> io::Result<()> {
        let progress = LogProgress::new();
        progress.begin_task("bytes", 10_000);
        let data = vec![b'x'; 10_000];
        let mut reader = ProgressReader::new(Cursor::new(data), &progress);
        let mut sink = Vec::new();
        reader.read_to_end(&mut sink)?;
        assert_eq!(sink.len(), 10_000);
        assert_eq!(progress.done(), 10_000);
        assert_eq!(progress.decile.load(Ordering::Relaxed), 10);
        Ok(())
    }

    #[test]
    fn begin_task_resets_counters() {
        let progress = LogProgress::new();
        progress.begin_task("first", 10);
        progress.increment(7);
        progress.begin_task("second", 0);
        assert_eq!(progress.done(), 0);
        progress.increment(3);
        assert_eq!(progress.decile.load(Ordering::Relaxed), 0);
    }
}
