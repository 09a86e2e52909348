use indicatif::{ProgressBar, ProgressStyle};

/// Receives `(done, total)` after every attempted cell.
pub trait ProgressSink: Sync {
    fn report(&self, done: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Sync,
{
    fn report(&self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Discards every report.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _done: usize, _total: usize) {}
}

/// Single evolving terminal line: `Progress: done/total`.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("Progress: {pos}/{len} [{elapsed_precise}] {bar:40} ETA {eta}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, done: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(done as u64);
        if done == total {
            self.bar.finish();
        }
    }
}
