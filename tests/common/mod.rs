//! In-memory device used by the walker tests.
//! Behaves like the device's SD card: mkdir needs an existing parent and
//! fails on existing nodes, rmdir needs an empty directory, upload refuses
//! to overwrite.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use devtree::{Entry, Error, RemoteFs, RemotePath, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Mkdir(String),
    Rmdir(String),
    Unlink(String),
    List(String),
    Upload(String),
    Rename(String, String),
}

impl Call {
    pub fn path(&self) -> &str {
        match self {
            Call::Mkdir(p)
            | Call::Rmdir(p)
            | Call::Unlink(p)
            | Call::List(p)
            | Call::Upload(p)
            | Call::Rename(p, _) => p,
        }
    }
}

pub struct MemRemote {
    nodes: RefCell<BTreeMap<String, Node>>,
    calls: RefCell<Vec<Call>>,
    fail_list: RefCell<BTreeSet<String>>,
    fail_upload: RefCell<BTreeSet<String>>,
}

fn fail(op: &'static str, path: &RemotePath, why: &str) -> Error {
    Error::Transport {
        op,
        path: path.to_string(),
        reason: why.to_string(),
    }
}

impl MemRemote {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            nodes: RefCell::new(nodes),
            calls: RefCell::new(Vec::new()),
            fail_list: RefCell::new(BTreeSet::new()),
            fail_upload: RefCell::new(BTreeSet::new()),
        }
    }

    /// Seed a node (and any missing parent directories) without logging a call
    pub fn seed(&self, path: &str, node: Node) {
        let path = RemotePath::parse(path).unwrap();
        let mut parent = path.parent();
        while let Some(p) = parent {
            self.nodes
                .borrow_mut()
                .entry(p.to_string())
                .or_insert(Node::Dir);
            parent = p.parent();
        }
        self.nodes.borrow_mut().insert(path.to_string(), node);
    }

    pub fn fail_list_at(&self, path: &str) {
        self.fail_list.borrow_mut().insert(path.to_string());
    }

    pub fn fail_upload_at(&self, path: &str) {
        self.fail_upload.borrow_mut().insert(path.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn nodes(&self) -> BTreeMap<String, Node> {
        self.nodes.borrow().clone()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.borrow().contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.borrow().get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    fn is_dir(&self, path: &RemotePath) -> bool {
        matches!(self.nodes.borrow().get(path.as_str()), Some(Node::Dir))
    }

    fn has_children(&self, path: &RemotePath) -> bool {
        self.nodes
            .borrow()
            .keys()
            .any(|k| k.as_str() != path.as_str() && RemotePath::parse(k).unwrap().parent().as_ref() == Some(path))
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl RemoteFs for MemRemote {
    fn mkdir(&self, path: &RemotePath) -> Result<()> {
        self.log(Call::Mkdir(path.to_string()));
        if self.exists(path.as_str()) {
            return Err(fail("mkdir", path, "HTTP 500 Internal Server Error"));
        }
        match path.parent() {
            Some(parent) if self.is_dir(&parent) => {
                self.nodes.borrow_mut().insert(path.to_string(), Node::Dir);
                Ok(())
            }
            _ => Err(fail("mkdir", path, "HTTP 500 Internal Server Error")),
        }
    }

    fn rmdir(&self, path: &RemotePath) -> Result<()> {
        self.log(Call::Rmdir(path.to_string()));
        if !self.is_dir(path) || self.has_children(path) {
            return Err(fail("rmdir", path, "HTTP 500 Internal Server Error"));
        }
        self.nodes.borrow_mut().remove(path.as_str());
        Ok(())
    }

    fn unlink(&self, path: &RemotePath) -> Result<()> {
        self.log(Call::Unlink(path.to_string()));
        let is_file = matches!(self.nodes.borrow().get(path.as_str()), Some(Node::File(_)));
        if !is_file {
            return Err(fail("unlink", path, "HTTP 500 Internal Server Error"));
        }
        self.nodes.borrow_mut().remove(path.as_str());
        Ok(())
    }

    fn list(&self, path: &RemotePath) -> Result<Vec<Entry>> {
        self.log(Call::List(path.to_string()));
        if self.fail_list.borrow().contains(path.as_str()) || !self.is_dir(path) {
            return Err(fail("list", path, "HTTP 500 Internal Server Error"));
        }
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        for (key, node) in nodes.iter() {
            let p = RemotePath::parse(key).unwrap();
            if p.parent().as_ref() != Some(path) {
                continue;
            }
            let name = p.name().unwrap().to_string();
            out.push(match node {
                Node::Dir => Entry::dir(name, p),
                Node::File(_) => Entry::file(name, p),
            });
        }
        Ok(out)
    }

    fn upload(&self, remote: &RemotePath, local: &Path) -> Result<u64> {
        self.log(Call::Upload(remote.to_string()));
        if self.fail_upload.borrow().contains(remote.as_str()) || self.exists(remote.as_str()) {
            return Err(fail("upload", remote, "HTTP 500 Internal Server Error"));
        }
        match remote.parent() {
            Some(parent) if self.is_dir(&parent) => {}
            _ => return Err(fail("upload", remote, "HTTP 500 Internal Server Error")),
        }
        let data = std::fs::read(local)?;
        let len = data.len() as u64;
        self.nodes.borrow_mut().insert(remote.to_string(), Node::File(data));
        Ok(len)
    }

    fn rename(&self, path: &RemotePath, new_name: &str) -> Result<()> {
        self.log(Call::Rename(path.to_string(), new_name.to_string()));
        let parent = path.parent().ok_or_else(|| fail("rename", path, "root"))?;
        let target = parent.join(new_name)?;
        let mut nodes = self.nodes.borrow_mut();
        let moved: Vec<(String, Node)> = nodes
            .iter()
            .filter(|(k, _)| RemotePath::parse(k).unwrap().starts_with(path))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if moved.is_empty() {
            return Err(fail("rename", path, "HTTP 500 Internal Server Error"));
        }
        for (k, v) in moved {
            nodes.remove(&k);
            let new_key = format!("{}{}", target, &k[path.as_str().len()..]);
            nodes.insert(new_key, v);
        }
        Ok(())
    }
}
