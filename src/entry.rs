//! Remote tree nodes and the listing wire format

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::RemotePath;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A node of a remote tree.
/// Directory children are filled by one `list` call per directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    File {
        name: String,
        path: RemotePath,
    },
    Dir {
        name: String,
        path: RemotePath,
        children: Vec<Entry>,
    },
}

impl Entry {
    pub fn file(name: impl Into<String>, path: RemotePath) -> Self {
        Entry::File {
            name: name.into(),
            path,
        }
    }

    /// Directory node whose content has not been listed yet
    pub fn dir(name: impl Into<String>, path: RemotePath) -> Self {
        Entry::Dir {
            name: name.into(),
            path,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::File { name, .. } | Entry::Dir { name, .. } => name,
        }
    }

    pub fn path(&self) -> &RemotePath {
        match self {
            Entry::File { path, .. } | Entry::Dir { path, .. } => path,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File { .. } => EntryKind::File,
            Entry::Dir { .. } => EntryKind::Dir,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Dir { .. })
    }

    /// Children of a directory; empty for files
    pub fn children(&self) -> &[Entry] {
        match self {
            Entry::Dir { children, .. } => children,
            Entry::File { .. } => &[],
        }
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }
}

/// One element of the `GET /api/v1/dir` JSON array.
/// Fields are optional so that a malformed node maps to `InconsistentTree`
/// instead of a generic decode failure.
#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
}

/// Decode a directory listing body into child entries of `dir`
pub fn parse_listing(dir: &RemotePath, body: &str) -> Result<Vec<Entry>> {
    let wire: Vec<WireEntry> = serde_json::from_str(body)
        .map_err(|e| Error::inconsistent(dir.as_str(), format!("malformed listing: {e}")))?;

    let mut entries = Vec::with_capacity(wire.len());
    for node in wire {
        let name = node
            .name
            .ok_or_else(|| Error::inconsistent(dir.as_str(), "listing node without name"))?;
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            return Err(Error::inconsistent(
                dir.as_str(),
                format!("invalid node name {name:?}"),
            ));
        }
        let path = dir.join(&name)?;
        let entry = match node.kind.as_deref() {
            Some("file") => Entry::file(name, path),
            Some("dir") => Entry::dir(name, path),
            Some(other) => {
                return Err(Error::inconsistent(
                    path.as_str(),
                    format!("unknown node type {other:?}"),
                ))
            }
            None => return Err(Error::inconsistent(path.as_str(), "listing node without type")),
        };
        entries.push(entry);
    }
    Ok(entries)
}
