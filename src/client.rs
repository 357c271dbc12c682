//! Remote tree client
//!
//! `RemoteFs` is the only interface the walkers use to touch the device.
//! Each method is exactly one request/response exchange with no retry;
//! `Ok` means the device answered 200, anything else is a `Transport` error.
//! `HttpRemote` speaks the device's `/api/v1` facade over blocking HTTP.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;

use crate::entry::{parse_listing, Entry};
use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::url::{Api, DeviceUrl};

const USER_AGENT: &str = concat!("devtree/", env!("CARGO_PKG_VERSION"));

pub trait RemoteFs {
    /// Create one directory; the parent must already exist
    fn mkdir(&self, path: &RemotePath) -> Result<()>;

    /// Remove one directory, which the device expects to be empty
    fn rmdir(&self, path: &RemotePath) -> Result<()>;

    /// Remove one file
    fn unlink(&self, path: &RemotePath) -> Result<()>;

    /// Immediate children of `path`.
    /// An error means the listing is absent, which is not the same as `Ok(vec![])`.
    fn list(&self, path: &RemotePath) -> Result<Vec<Entry>>;

    /// Stream `local` to `remote`, returning the number of bytes sent
    fn upload(&self, remote: &RemotePath, local: &Path) -> Result<u64>;

    /// Rename the directory at `path` to `new_name` within the same parent
    fn rename(&self, path: &RemotePath, new_name: &str) -> Result<()>;
}

pub struct HttpRemote {
    client: Client,
    url: DeviceUrl,
}

impl HttpRemote {
    pub fn new(url: DeviceUrl, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Url(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    fn check(op: &'static str, path: &RemotePath, resp: reqwest::Result<Response>) -> Result<Response> {
        let resp = resp.map_err(|e| Error::transport(op, path.as_str(), e))?;
        if resp.status() != StatusCode::OK {
            return Err(Error::transport(op, path.as_str(), format!("HTTP {}", resp.status())));
        }
        Ok(resp)
    }
}

impl RemoteFs for HttpRemote {
    fn mkdir(&self, path: &RemotePath) -> Result<()> {
        let resp = self.client.post(self.url.api(Api::Dir, path)).send();
        Self::check("mkdir", path, resp).map(drop)
    }

    fn rmdir(&self, path: &RemotePath) -> Result<()> {
        let resp = self.client.delete(self.url.api(Api::Dir, path)).send();
        Self::check("rmdir", path, resp).map(drop)
    }

    fn unlink(&self, path: &RemotePath) -> Result<()> {
        let resp = self.client.delete(self.url.api(Api::File, path)).send();
        Self::check("unlink", path, resp).map(drop)
    }

    fn list(&self, path: &RemotePath) -> Result<Vec<Entry>> {
        let resp = self.client.get(self.url.api(Api::Dir, path)).send();
        let body = Self::check("list", path, resp)?
            .text()
            .map_err(|e| Error::transport("list", path.as_str(), e))?;
        parse_listing(path, &body)
    }

    fn upload(&self, remote: &RemotePath, local: &Path) -> Result<u64> {
        let file = File::open(local)?;
        let len = file.metadata()?.len();
        // The device derives the target from the part's filename
        let part = Part::reader_with_length(file, len)
            .file_name(remote.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| Error::transport("upload", remote.as_str(), e))?;
        let form = Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url.api(Api::Upload, remote))
            .multipart(form)
            .send();
        Self::check("upload", remote, resp)?;
        Ok(len)
    }

    fn rename(&self, path: &RemotePath, new_name: &str) -> Result<()> {
        if path.is_root() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        if new_name.is_empty() || new_name == "." || new_name == ".." || new_name.contains('/') {
            return Err(Error::InvalidPath(new_name.to_string()));
        }
        let resp = self
            .client
            .put(self.url.api(Api::Dir, path))
            .form(&[("new_name", new_name)])
            .send();
        Self::check("rename", path, resp).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::DEFAULT_PORT;

    #[test]
    fn test_new_creates_instance_successfully() {
        let url = DeviceUrl::parse("127.0.0.1", DEFAULT_PORT).unwrap();
        let remote = HttpRemote::new(url, Duration::from_secs(5));
        assert!(remote.is_ok());
    }

    #[test]
    fn test_rename_rejects_bad_names_without_network() {
        // Port 9 (discard) on localhost; validation must fail before any request
        let url = DeviceUrl::parse("127.0.0.1:9", DEFAULT_PORT).unwrap();
        let remote = HttpRemote::new(url, Duration::from_millis(200)).unwrap();
        let dir = RemotePath::parse("/music/old").unwrap();
        assert!(matches!(remote.rename(&dir, "a/b"), Err(Error::InvalidPath(_))));
        assert!(matches!(remote.rename(&dir, ""), Err(Error::InvalidPath(_))));
        assert!(matches!(
            remote.rename(&RemotePath::root(), "x"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_upload_missing_local_file_is_io_error() {
        let url = DeviceUrl::parse("127.0.0.1:9", DEFAULT_PORT).unwrap();
        let remote = HttpRemote::new(url, Duration::from_millis(200)).unwrap();
        let target = RemotePath::parse("/x.bin").unwrap();
        let err = remote
            .upload(&target, Path::new("/definitely/not/here.bin"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
