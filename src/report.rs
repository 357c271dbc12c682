//! Per-operation outcome collection
//!
//! Leaf failures never abort a walk, so the walkers record every remote
//! call here. The CLI prints a summary and can dump the records as JSONL.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::RemotePath;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Mkdir,
    Upload,
    Unlink,
    Rmdir,
    Rename,
    List,
    /// Local enumeration problem while mirroring
    Walk,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpRecord {
    pub timestamp: String,
    pub op: OpKind,
    pub path: String,
    pub local: Option<PathBuf>,
    pub ok: bool,
    pub bytes: u64,
    pub error: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct OpReport {
    pub dirs_created: u64,
    pub files_uploaded: u64,
    pub bytes_uploaded: u64,
    pub files_unlinked: u64,
    pub dirs_removed: u64,
    pub records: Vec<OpRecord>,
    /// Directories whose listing failed; nothing below them was touched
    pub aborted: Vec<RemotePath>,
    /// Directories left in place because part of their subtree was aborted
    pub skipped: Vec<RemotePath>,
}

impl OpReport {
    pub fn record_ok(&mut self, op: OpKind, path: &RemotePath, local: Option<&Path>, bytes: u64) {
        match op {
            OpKind::Mkdir => self.dirs_created += 1,
            OpKind::Upload => {
                self.files_uploaded += 1;
                self.bytes_uploaded += bytes;
            }
            OpKind::Unlink => self.files_unlinked += 1,
            OpKind::Rmdir => self.dirs_removed += 1,
            OpKind::Rename | OpKind::List | OpKind::Walk => {}
        }
        self.records.push(OpRecord {
            timestamp: Utc::now().to_rfc3339(),
            op,
            path: path.to_string(),
            local: local.map(Path::to_path_buf),
            ok: true,
            bytes,
            error: None,
        });
    }

    pub fn record_err(&mut self, op: OpKind, path: &RemotePath, local: Option<&Path>, error: &Error) {
        self.records.push(OpRecord {
            timestamp: Utc::now().to_rfc3339(),
            op,
            path: path.to_string(),
            local: local.map(Path::to_path_buf),
            ok: false,
            bytes: 0,
            error: Some(error.to_string()),
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &OpRecord> {
        self.records.iter().filter(|r| !r.ok)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures().count() as u64
    }

    pub fn op_count(&self) -> u64 {
        self.records.len() as u64
    }

    /// True when no branch had to be abandoned
    pub fn is_complete(&self) -> bool {
        self.aborted.is_empty()
    }

    pub fn write_jsonl(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for record in &self.records {
            serde_json::to_writer(&mut writer, record).map_err(std::io::Error::from)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;

    fn read_jsonl(path: &Path) -> Vec<OpRecord> {
        if !path.exists() {
            return Vec::new();
        }
        let reader = BufReader::new(File::open(path).unwrap());
        reader
            .lines()
            .map(|line| line.unwrap())
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(&line).unwrap())
            .collect()
    }

    #[test]
    fn test_counters_and_failures() {
        let mut report = OpReport::default();
        let root = RemotePath::parse("/static").unwrap();
        let file = root.join("x.txt").unwrap();

        report.record_ok(OpKind::Mkdir, &root, None, 0);
        report.record_ok(OpKind::Upload, &file, Some(Path::new("/tmp/x.txt")), 42);
        report.record_err(
            OpKind::Upload,
            &root.join("y.txt").unwrap(),
            None,
            &Error::transport("upload", "/static/y.txt", "HTTP 500"),
        );

        assert_eq!(report.dirs_created, 1);
        assert_eq!(report.files_uploaded, 1);
        assert_eq!(report.bytes_uploaded, 42);
        assert_eq!(report.op_count(), 3);
        assert_eq!(report.failure_count(), 1);
        let failed = report.failures().next().unwrap();
        assert_eq!(failed.path, "/static/y.txt");
        assert!(failed.error.as_deref().unwrap().contains("HTTP 500"));
        assert!(report.is_complete());
    }

    #[test]
    fn test_jsonl_round_trip() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("report.jsonl");
        let mut report = OpReport::default();
        let root = RemotePath::parse("/music").unwrap();
        report.record_ok(OpKind::Rmdir, &root, None, 0);
        report.write_jsonl(&out).unwrap();

        let records = read_jsonl(&out);
        assert_eq!(records, report.records);
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("\"op\":\"rmdir\""));
    }

    #[test]
    fn test_read_missing_report_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_jsonl(&tmp.path().join("none.jsonl")).is_empty());
    }
}
