//! Tree walkers: mirror (local to remote), delete and snapshot (remote)
//!
//! All three walk with explicit stacks so deep remote trees cannot exhaust
//! the call stack. They share one shape: list a directory, then for each
//! child either descend or perform a leaf action. A failing listing ends
//! that branch; a failing leaf action is recorded and siblings continue.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::client::RemoteFs;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::path::RemotePath;
use crate::report::{OpKind, OpReport};

/// One remote mutation in a planned sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    Mkdir(RemotePath),
    Upload {
        local: PathBuf,
        remote: RemotePath,
        size: u64,
    },
    Unlink(RemotePath),
    Rmdir(RemotePath),
}

impl TreeOp {
    pub fn remote_path(&self) -> &RemotePath {
        match self {
            TreeOp::Mkdir(p) | TreeOp::Unlink(p) | TreeOp::Rmdir(p) => p,
            TreeOp::Upload { remote, .. } => remote,
        }
    }
}

impl fmt::Display for TreeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeOp::Mkdir(p) => write!(f, "mkdir  {}", p),
            TreeOp::Upload {
                local,
                remote,
                size,
            } => write!(f, "upload {} -> {} ({} bytes)", local.display(), remote, size),
            TreeOp::Unlink(p) => write!(f, "unlink {}", p),
            TreeOp::Rmdir(p) => write!(f, "rmdir  {}", p),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Unlink each target before uploading; the device refuses to overwrite
    pub replace_existing: bool,
    /// Visit siblings in file name order
    pub sorted: bool,
    /// Plan and log only, no remote calls
    pub dry_run: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            replace_existing: true,
            sorted: false,
            dry_run: false,
        }
    }
}

/// Pre-order mirror plan of a local tree
#[derive(Debug, Default)]
pub struct MirrorPlan {
    pub ops: Vec<TreeOp>,
    /// Local entries that could not be read or mapped, with their subtree skipped
    pub problems: Vec<(PathBuf, Error)>,
}

/// Walk `local_root` pre-order and map every directory and regular file
/// onto `remote_root`. The root itself maps to `mkdir(remote_root)`.
pub fn mirror_plan(local_root: &Path, remote_root: &RemotePath, sorted: bool) -> Result<MirrorPlan> {
    if !local_root.exists() {
        return Err(Error::LocalRoot {
            path: local_root.to_path_buf(),
            reason: "does not exist".to_string(),
        });
    }
    if !local_root.is_dir() {
        return Err(Error::LocalRoot {
            path: local_root.to_path_buf(),
            reason: "is not a directory".to_string(),
        });
    }

    let mut walker = WalkDir::new(local_root).follow_links(false);
    if sorted {
        walker = walker.sort_by_file_name();
    }

    let mut plan = MirrorPlan::default();
    let mut it = walker.into_iter();
    while let Some(item) = it.next() {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(local_root).to_path_buf();
                plan.problems.push((path, Error::Io(e.into())));
                continue;
            }
        };
        let rel = entry.path().strip_prefix(local_root).unwrap_or(entry.path());
        let target = match remote_root.join_relative(rel) {
            Ok(target) => target,
            Err(e) => {
                plan.problems.push((entry.path().to_path_buf(), e));
                if entry.file_type().is_dir() {
                    it.skip_current_dir();
                }
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            plan.ops.push(TreeOp::Mkdir(target));
            continue;
        }
        // a link to a regular file is uploaded with the target's contents
        let meta = if file_type.is_symlink() {
            std::fs::metadata(entry.path())
        } else {
            entry.metadata().map_err(std::io::Error::from)
        };
        match meta {
            Ok(meta) if meta.is_file() => plan.ops.push(TreeOp::Upload {
                local: entry.path().to_path_buf(),
                remote: target,
                size: meta.len(),
            }),
            Ok(meta) => {
                let reason = if meta.is_dir() {
                    "symlinked directory is not followed"
                } else {
                    "not a regular file"
                };
                let err = Error::local_entry(entry.path(), reason);
                plan.problems.push((entry.path().to_path_buf(), err));
            }
            Err(e) => plan.problems.push((entry.path().to_path_buf(), Error::Io(e))),
        }
    }
    Ok(plan)
}

/// Make `remote_root` contain everything under `local_root`.
/// Directories are created before any file inside them is uploaded.
/// Nothing on the remote side is removed.
pub fn mirror_tree<R: RemoteFs + ?Sized>(
    remote: &R,
    local_root: &Path,
    remote_root: &RemotePath,
    options: &MirrorOptions,
    logger: &dyn Logger,
) -> Result<OpReport> {
    let start = Instant::now();
    logger.start("mirror", remote_root);
    let plan = mirror_plan(local_root, remote_root, options.sorted)?;

    let mut report = OpReport::default();
    for (path, err) in &plan.problems {
        logger.error("walk", remote_root, &format!("{}: {}", path.display(), err));
        report.record_err(OpKind::Walk, remote_root, Some(path.as_path()), err);
    }

    for op in plan.ops {
        if options.dry_run {
            match &op {
                TreeOp::Mkdir(path) => logger.mkdir(path),
                TreeOp::Upload {
                    local,
                    remote: target,
                    size,
                } => logger.upload(local, target, *size),
                _ => {}
            }
            continue;
        }
        match op {
            TreeOp::Mkdir(path) => match remote.mkdir(&path) {
                Ok(()) => {
                    logger.mkdir(&path);
                    report.record_ok(OpKind::Mkdir, &path, None, 0);
                }
                // usually "already exists"; never fatal for a mirror
                Err(e) => {
                    logger.error("mkdir", &path, &e.to_string());
                    report.record_err(OpKind::Mkdir, &path, None, &e);
                }
            },
            TreeOp::Upload {
                local,
                remote: target,
                ..
            } => {
                if options.replace_existing && remote.unlink(&target).is_ok() {
                    logger.unlink(&target);
                }
                match remote.upload(&target, &local) {
                    Ok(bytes) => {
                        logger.upload(&local, &target, bytes);
                        report.record_ok(OpKind::Upload, &target, Some(local.as_path()), bytes);
                    }
                    Err(e) => {
                        logger.error("upload", &target, &e.to_string());
                        report.record_err(OpKind::Upload, &target, Some(local.as_path()), &e);
                    }
                }
            }
            TreeOp::Unlink(_) | TreeOp::Rmdir(_) => {}
        }
    }

    logger.done(
        report.op_count(),
        report.failure_count(),
        start.elapsed().as_secs_f64(),
    );
    Ok(report)
}

struct Frame {
    path: RemotePath,
    pending: std::vec::IntoIter<Entry>,
    /// False once any listing below this directory failed
    intact: bool,
}

/// Remove `root` and everything below it, children strictly before parents.
///
/// Fails only when `root` itself cannot be listed. A subdirectory whose
/// listing fails is abandoned: nothing under it is touched, and neither it
/// nor any of its ancestors is `rmdir`ed. Those directories end up in
/// `OpReport::aborted` / `OpReport::skipped`.
pub fn delete_tree<R: RemoteFs + ?Sized>(
    remote: &R,
    root: &RemotePath,
    logger: &dyn Logger,
) -> Result<OpReport> {
    let start = Instant::now();
    logger.start("delete", root);

    let children = remote.list(root).map_err(|e| {
        logger.error("list", root, &e.to_string());
        into_inconsistent(root, e)
    })?;

    let mut report = OpReport::default();
    let mut stack = vec![Frame {
        path: root.clone(),
        pending: children.into_iter(),
        intact: true,
    }];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.pending.next(),
            None => break,
        };
        match next {
            Some(Entry::File { path, .. }) => match remote.unlink(&path) {
                Ok(()) => {
                    logger.unlink(&path);
                    report.record_ok(OpKind::Unlink, &path, None, 0);
                }
                Err(e) => {
                    logger.error("unlink", &path, &e.to_string());
                    report.record_err(OpKind::Unlink, &path, None, &e);
                }
            },
            Some(Entry::Dir { path, .. }) => match remote.list(&path) {
                Ok(children) => stack.push(Frame {
                    path,
                    pending: children.into_iter(),
                    intact: true,
                }),
                Err(e) => {
                    logger.error("list", &path, &e.to_string());
                    report.record_err(OpKind::List, &path, None, &e);
                    report.aborted.push(path);
                    if let Some(frame) = stack.last_mut() {
                        frame.intact = false;
                    }
                }
            },
            None => {
                let Some(done) = stack.pop() else { break };
                if !done.intact {
                    report.skipped.push(done.path);
                    if let Some(parent) = stack.last_mut() {
                        parent.intact = false;
                    }
                    continue;
                }
                match remote.rmdir(&done.path) {
                    Ok(()) => {
                        logger.rmdir(&done.path);
                        report.record_ok(OpKind::Rmdir, &done.path, None, 0);
                    }
                    Err(e) => {
                        logger.error("rmdir", &done.path, &e.to_string());
                        report.record_err(OpKind::Rmdir, &done.path, None, &e);
                    }
                }
            }
        }
    }

    logger.done(
        report.op_count(),
        report.failure_count(),
        start.elapsed().as_secs_f64(),
    );
    Ok(report)
}

/// Recursively list `root` into a point-in-time snapshot.
/// Any listing failure aborts the whole fetch.
pub fn fetch_snapshot<R: RemoteFs + ?Sized>(remote: &R, root: &RemotePath) -> Result<Entry> {
    let root_name = root.name().unwrap_or("/");
    // Flat arena: a child is always pushed after its parent
    let mut nodes: Vec<(Entry, Vec<usize>)> = vec![(Entry::dir(root_name, root.clone()), Vec::new())];
    let mut stack = vec![0usize];

    while let Some(idx) = stack.pop() {
        let path = nodes[idx].0.path().clone();
        let listing = remote.list(&path).map_err(|e| into_inconsistent(&path, e))?;
        for child in listing {
            let child_idx = nodes.len();
            if child.is_dir() {
                stack.push(child_idx);
            }
            nodes.push((child, Vec::new()));
            nodes[idx].1.push(child_idx);
        }
    }

    let mut built: Vec<Option<Entry>> = Vec::with_capacity(nodes.len());
    built.resize_with(nodes.len(), || None);
    for (idx, (mut entry, child_idxs)) in nodes.into_iter().enumerate().rev() {
        if let Entry::Dir { children, .. } = &mut entry {
            *children = child_idxs.iter().filter_map(|&c| built[c].take()).collect();
        }
        built[idx] = Some(entry);
    }
    built
        .first_mut()
        .and_then(Option::take)
        .ok_or_else(|| Error::inconsistent(root.as_str(), "empty snapshot"))
}

/// Post-order removal sequence for a snapshot, matching `delete_tree`
pub fn removal_plan(snapshot: &Entry) -> Vec<TreeOp> {
    let mut ops = Vec::with_capacity(snapshot.node_count());
    let mut stack = vec![(snapshot, false)];
    while let Some((node, expanded)) = stack.pop() {
        match node {
            Entry::File { path, .. } => ops.push(TreeOp::Unlink(path.clone())),
            Entry::Dir { path, children, .. } => {
                if expanded {
                    ops.push(TreeOp::Rmdir(path.clone()));
                } else {
                    stack.push((node, true));
                    stack.extend(children.iter().rev().map(|c| (c, false)));
                }
            }
        }
    }
    ops
}

fn into_inconsistent(path: &RemotePath, e: Error) -> Error {
    match e {
        e @ Error::InconsistentTree { .. } => e,
        other => Error::inconsistent(path.as_str(), format!("listing unavailable: {other}")),
    }
}
