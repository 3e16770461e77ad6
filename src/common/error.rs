//! Error types for the resolver

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("DNS error: {0}")]
    Dns(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn dns<S: Into<String>>(msg: S) -> Self {
        Error::Dns(msg.into())
    }

    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        Error::Fetch(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single hostname lookup.
///
/// These never cross the batch boundary as errors; the resolver stores the
/// rendered message in the hostname's record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no such host")]
    NoSuchHost,

    #[error("no IPv4 address for host")]
    NoAddress,

    #[error("lookup timed out")]
    TimedOut,

    #[error("lookup exceeded deadline of {0:?}")]
    Deadline(Duration),

    #[error("{0}")]
    Resolver(String),

    #[error("lookup aborted: {0}")]
    Aborted(String),
}

impl LookupError {
    pub fn resolver<S: Into<String>>(msg: S) -> Self {
        LookupError::Resolver(msg.into())
    }
}
