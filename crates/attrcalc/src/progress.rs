//! Progress channel

use std::io::Write;

/// Records between two intermediate progress emissions.
pub const DEFAULT_PROGRESS_EVERY: usize = 100;

pub trait ProgressSink {
    /// `fraction` is already rounded to two decimals.
    fn emit(&mut self, fraction: f64);
}

/// Write one `progress: <fraction>` line and flush it.
pub fn write_progress<W: Write + ?Sized>(out: &mut W, fraction: f64) -> std::io::Result<()> {
    writeln!(out, "progress: {fraction:.2}")?;
    out.flush()
}

/// Progress lines on any writer. Write failures are ignored: a closed
/// channel must not fail the run.
#[derive(Debug, Default)]
pub struct LineProgress<W: Write> {
    out: W,
}

impl<W: Write> LineProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressSink for LineProgress<W> {
    fn emit(&mut self, fraction: f64) {
        let _ = write_progress(&mut self.out, fraction);
    }
}

/// Writes progress lines to stdout so a supervisor tailing the stream sees
/// each one immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&mut self, fraction: f64) {
        let _ = write_progress(&mut std::io::stdout().lock(), fraction);
    }
}

impl ProgressSink for Vec<f64> {
    fn emit(&mut self, fraction: f64) {
        self.push(fraction);
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
