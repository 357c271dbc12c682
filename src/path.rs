//! Rooted POSIX paths on the device side
//!
//! A `RemotePath` is kept separate from `std::path::Path`: the device always
//! sees `/`-rooted, slash-normalized strings, while local paths follow the
//! host platform. Mapping a local file onto the device goes through
//! [`RemotePath::join_relative`].

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        RemotePath("/".to_string())
    }

    /// Normalize `s` into a rooted path.
    /// Empty segments and `.` are dropped; `..` and NUL bytes are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        Self::root().join(s)
    }

    /// Append one or more `/`-separated segments
    pub fn join(&self, rel: &str) -> Result<Self> {
        if rel.contains('\0') {
            return Err(Error::InvalidPath(rel.to_string()));
        }
        let mut out = self.0.clone();
        for seg in rel.split('/') {
            match seg {
                "" | "." => {}
                ".." => return Err(Error::InvalidPath(rel.to_string())),
                s => {
                    if !out.ends_with('/') {
                        out.push('/');
                    }
                    out.push_str(s);
                }
            }
        }
        Ok(RemotePath(out))
    }

    /// Map a path relative to a local root onto this remote root
    pub fn join_relative(&self, rel: &Path) -> Result<Self> {
        let mut out = self.clone();
        for component in rel.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(s) => {
                    let seg = s
                        .to_str()
                        .ok_or_else(|| Error::InvalidPath(rel.to_string_lossy().into_owned()))?;
                    if seg.contains('/') {
                        return Err(Error::InvalidPath(seg.to_string()));
                    }
                    out = out.join(seg)?;
                }
                _ => return Err(Error::InvalidPath(rel.to_string_lossy().into_owned())),
            }
        }
        Ok(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment; `None` for the root
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    pub fn parent(&self) -> Option<RemotePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(RemotePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// True if `self` equals `ancestor` or lies below it
    pub fn starts_with(&self, ancestor: &RemotePath) -> bool {
        if ancestor.is_root() || self == ancestor {
            return true;
        }
        self.0.starts_with(&ancestor.0) && self.0.as_bytes().get(ancestor.0.len()) == Some(&b'/')
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RemotePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
