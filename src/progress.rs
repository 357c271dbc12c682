//! Cargo-style console progress
//!
//! Operations scroll above a spinner that stays on the bottom line. The
//! spinner is itself a `Logger`, so the walkers drive it without knowing
//! about the terminal; every event is also forwarded to an inner logger.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::logger::Logger;
use crate::path::RemotePath;

pub struct OpProgress {
    spinner: ProgressBar,
    start_time: Instant,
    show_ops: bool,
    ops: AtomicU64,
    bytes: AtomicU64,
    inner: Arc<dyn Logger>,
}

impl OpProgress {
    pub fn new(verbose: bool, inner: Arc<dyn Logger>) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner,
            start_time: Instant::now(),
            show_ops: verbose,
            ops: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            inner,
        }
    }

    /// Hidden spinner for non-interactive use; still forwards to `inner`
    pub fn hidden(inner: Arc<dyn Logger>) -> Self {
        let progress = Self::new(false, inner);
        progress.spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        progress
    }

    fn print_op(&self, operation: &str, path: &str) {
        let n = self.ops.fetch_add(1, Ordering::Relaxed) + 1;
        if self.show_ops {
            self.spinner.suspend(|| println!("  {:>7} {}", operation, path));
        }
        self.spinner.set_message(format!(
            "{} operations ({:.1} MB) in {:.1}s",
            n,
            self.bytes.load(Ordering::Relaxed) as f64 / 1_048_576.0,
            self.start_time.elapsed().as_secs_f64()
        ));
    }

    pub fn op_count(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }

    pub fn finish_and_clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Logger for OpProgress {
    fn start(&self, op: &str, root: &RemotePath) {
        self.spinner.set_message(format!("{} {}", op, root));
        self.inner.start(op, root);
    }
    fn mkdir(&self, path: &RemotePath) {
        self.print_op("mkdir", path.as_str());
        self.inner.mkdir(path);
    }
    fn upload(&self, src: &Path, dst: &RemotePath, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.print_op("upload", dst.as_str());
        self.inner.upload(src, dst, bytes);
    }
    fn unlink(&self, path: &RemotePath) {
        self.print_op("unlink", path.as_str());
        self.inner.unlink(path);
    }
    fn rmdir(&self, path: &RemotePath) {
        self.print_op("rmdir", path.as_str());
        self.inner.rmdir(path);
    }
    fn rename(&self, path: &RemotePath, new_name: &str) {
        self.print_op("rename", &format!("{} -> {}", path, new_name));
        self.inner.rename(path, new_name);
    }
    fn error(&self, context: &str, path: &RemotePath, msg: &str) {
        self.spinner
            .suspend(|| eprintln!("  {:>7} {}: {}", "FAILED", path, msg));
        self.inner.error(context, path, msg);
    }
    fn done(&self, ops: u64, failures: u64, seconds: f64) {
        self.inner.done(ops, failures, seconds);
    }
}
