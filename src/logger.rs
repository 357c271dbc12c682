use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::path::RemotePath;
use crate::walker::TreeOp;

/// Observer for every remote call issued by the walkers.
/// All methods default to no-ops so sinks only implement what they need.
pub trait Logger: Send + Sync {
    fn start(&self, _op: &str, _root: &RemotePath) {}
    fn mkdir(&self, _path: &RemotePath) {}
    fn upload(&self, _src: &Path, _dst: &RemotePath, _bytes: u64) {}
    fn unlink(&self, _path: &RemotePath) {}
    fn rmdir(&self, _path: &RemotePath) {}
    fn rename(&self, _path: &RemotePath, _new_name: &str) {}
    fn error(&self, _context: &str, _path: &RemotePath, _msg: &str) {}
    fn done(&self, _ops: u64, _failures: u64, _seconds: f64) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn start(&self, op: &str, root: &RemotePath) {
        self.line(&format!("START op={} root={}", op, root));
    }
    fn mkdir(&self, path: &RemotePath) {
        self.line(&format!("MKDIR path={}", path));
    }
    fn upload(&self, src: &Path, dst: &RemotePath, bytes: u64) {
        self.line(&format!(
            "UPLOAD src={} dst={} bytes={}",
            src.display(),
            dst,
            bytes
        ));
    }
    fn unlink(&self, path: &RemotePath) {
        self.line(&format!("UNLINK path={}", path));
    }
    fn rmdir(&self, path: &RemotePath) {
        self.line(&format!("RMDIR path={}", path));
    }
    fn rename(&self, path: &RemotePath, new_name: &str) {
        self.line(&format!("RENAME path={} new_name={}", path, new_name));
    }
    fn error(&self, context: &str, path: &RemotePath, msg: &str) {
        self.line(&format!("ERROR ctx={} path={} msg={}", context, path, msg));
    }
    fn done(&self, ops: u64, failures: u64, seconds: f64) {
        self.line(&format!("DONE ops={ops} failures={failures} seconds={seconds:.3}"));
    }
}

/// Collects the operations a dry run would issue, in order
#[derive(Default)]
pub struct PlanLogger {
    lines: Mutex<Vec<String>>,
    ops: Mutex<u64>,
}

impl PlanLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: String, counts: bool) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
        if counts {
            if let Ok(mut ops) = self.ops.lock() {
                *ops += 1;
            }
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn op_count(&self) -> u64 {
        self.ops.lock().map(|n| *n).unwrap_or(0)
    }
}

impl Logger for PlanLogger {
    fn mkdir(&self, path: &RemotePath) {
        self.push(TreeOp::Mkdir(path.clone()).to_string(), true);
    }
    fn upload(&self, src: &Path, dst: &RemotePath, bytes: u64) {
        let op = TreeOp::Upload {
            local: src.to_path_buf(),
            remote: dst.clone(),
            size: bytes,
        };
        self.push(op.to_string(), true);
    }
    fn error(&self, _context: &str, _path: &RemotePath, msg: &str) {
        self.push(format!("skip   {}", msg), false);
    }
}
