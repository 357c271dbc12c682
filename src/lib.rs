//! devtree library
//!
//! Treats a device's `/api/v1` HTTP file facade as a filesystem: mirror a
//! local tree onto it, delete a remote subtree, or fetch and render one.

pub mod cli;
pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod logger;
pub mod path;
pub mod printer;
pub mod progress;
pub mod report;
pub mod url;
pub mod walker;

pub use client::{HttpRemote, RemoteFs};
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use path::RemotePath;
pub use printer::render;
pub use report::{OpKind, OpRecord, OpReport};
pub use walker::{delete_tree, fetch_snapshot, mirror_plan, mirror_tree, removal_plan, MirrorOptions, TreeOp};
