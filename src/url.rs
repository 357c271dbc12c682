//! Device URL parsing and API endpoint construction

use ::url::Url;

use crate::error::{Error, Result};
use crate::path::RemotePath;

/// Port the device's web server listens on
pub const DEFAULT_PORT: u16 = 8000;

/// Endpoint families under `/api/v1`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Api {
    Dir,
    File,
    Upload,
}

impl Api {
    fn segment(self) -> &'static str {
        match self {
            Api::Dir => "dir",
            Api::File => "file",
            Api::Upload => "upload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUrl {
    base: Url,
}

impl DeviceUrl {
    /// Accepts `http(s)://host[:port][/prefix]` or a bare `host[:port]`.
    /// A bare host gets `http://` and `default_port` when no port is given.
    pub fn parse(s: &str, default_port: u16) -> Result<Self> {
        let s_trim = s.trim();
        if s_trim.is_empty() {
            return Err(Error::Url("empty url".to_string()));
        }
        let has_scheme = s_trim.contains("://");
        let candidate = if has_scheme {
            s_trim.to_string()
        } else {
            format!("http://{}", s_trim)
        };
        let mut base = Url::parse(&candidate).map_err(|e| Error::Url(format!("{s_trim}: {e}")))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(Error::Url(format!("unsupported scheme {:?}", base.scheme())));
        }
        if base.host_str().map_or(true, str::is_empty) {
            return Err(Error::Url(format!("{s_trim}: missing host")));
        }
        if !has_scheme && base.port().is_none() {
            base.set_port(Some(default_port))
                .map_err(|_| Error::Url(format!("{s_trim}: cannot set port")))?;
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `<base>/api/v1/<family><path>` with every segment percent-encoded
    pub fn api(&self, api: Api, path: &RemotePath) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.pop_if_empty();
            segs.extend(["api", "v1", api.segment()]);
            segs.extend(path.segments());
            // the device root is addressed with a trailing slash
            if path.is_root() {
                segs.push("");
            }
        }
        url
    }
}
