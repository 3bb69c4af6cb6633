//! Location model for local and remote resources
//!
//! A `Location` is a URI-like string naming a resource that is either local
//! (a plain filesystem path or a `file://` URL) or remote (any other scheme,
//! e.g. `s3://bucket/key`). Classification and joining are pure string/path
//! manipulation; no I/O happens here.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An absolute or relative identifier for a local or remote resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Wrap a location string verbatim
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a location from a local filesystem path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().to_string_lossy().into_owned())
    }

    /// The underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URI scheme, if the location carries one
    ///
    /// A scheme is a leading `[a-zA-Z][a-zA-Z0-9+.-]*` token followed by
    /// `://`. Windows drive letters (`C:\...`) do not qualify.
    pub fn scheme(&self) -> Option<&str> {
        let (candidate, _) = self.0.split_once("://")?;
        let mut chars = candidate.chars();
        let first = chars.next()?;
        if !first.is_ascii_alphabetic() {
            return None;
        }
        if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) {
            Some(candidate)
        } else {
            None
        }
    }

    /// True when the location is absolute: it has a scheme or is an
    /// absolute filesystem path
    pub fn is_absolute(&self) -> bool {
        self.scheme().is_some() || Path::new(&self.0).is_absolute()
    }

    /// Return the local filesystem path when this location has direct
    /// local access; `None` for genuinely remote backends
    pub fn direct_access(&self) -> Option<PathBuf> {
        match self.scheme() {
            None => Some(PathBuf::from(&self.0)),
            Some("file") => Some(PathBuf::from(&self.0["file://".len()..])),
            Some(_) => None,
        }
    }

    /// Join a relative string onto this location's parent directory
    ///
    /// Local locations use filesystem join rules on the parent path; remote
    /// locations concatenate onto the prefix up to and including the last
    /// `/`. A remote location without any `/` in it yields `rel` unchanged.
    pub fn parent_join(&self, rel: &str) -> Location {
        match self.direct_access() {
            Some(path) => {
                let parent = path.parent().unwrap_or_else(|| Path::new(""));
                Location::from_path(parent.join(rel))
            }
            None => match self.0.rfind('/') {
                Some(idx) => Location::new(format!("{}{}", &self.0[..=idx], rel)),
                None => Location::new(rel),
            },
        }
    }

    /// Split a remote location into its authority (bucket or host) and key
    /// path
    pub fn remote_parts(&self) -> Result<(&str, &str)> {
        let scheme = self.scheme().ok_or_else(|| Error::Resolution {
            message: format!("location has no scheme: {}", self.0),
        })?;
        let rest = &self.0[scheme.len() + "://".len()..];
        let (authority, key) = rest.split_once('/').unwrap_or((rest, ""));
        if authority.is_empty() {
            return Err(Error::Resolution {
                message: format!("location has no authority: {}", self.0),
            });
        }
        Ok((authority, key))
    }

    /// The path component after the authority, without a leading slash
    ///
    /// This is the subpath preserved inside a mirrored workspace.
    pub fn key_path(&self) -> &str {
        self.remote_parts().map(|(_, key)| key).unwrap_or("")
    }

    /// The remainder of `child` after this location's prefix, if `child`
    /// lies under this location
    pub fn relative_suffix<'a>(&self, child: &'a Location) -> Option<&'a str> {
        child.0.strip_prefix(&self.0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Location {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
