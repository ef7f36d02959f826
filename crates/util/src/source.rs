use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Where a feed or a store lives.
#[derive(
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash
)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl FromStr for Source {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Source::Url(s.to_string()));
        }
        Ok(Source::File(PathBuf::from(s)))
    }
}

impl Source {
    pub fn path(&self) -> Result<PathBuf, SourceError> {
        match self {
            Source::File(path) => Ok(path.clone()),
            Source::Url(_) => Err(SourceError::NotAPath),
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::File(path) => f.write_str(path.display().to_string().as_str()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source is not a path.")]
    NotAPath,
}
