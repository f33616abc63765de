use std::fmt;
use std::fs::{self, DirBuilder};
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::defaults::DEFAULT_TCP_PORT;

/// Where the daemon listens or where the bus bridge can be reached.
///
/// Written as `unix:///absolute/path` or `tcp://host[:port]`; a TCP endpoint
/// without a port uses [`DEFAULT_TCP_PORT`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket.
    Unix {
        /// Absolute socket path.
        path: Utf8PathBuf,
    },
    /// TCP socket.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Unix domain socket at `path`.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// TCP socket at `host:port`.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket path of a Unix endpoint.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_path()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the directory holding a Unix socket, readable by its owner
    /// only. TCP endpoints are left untouched.
    ///
    /// # Errors
    ///
    /// Fails when the socket path has no parent, or the parent cannot be
    /// created or is not a directory.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        match self.unix_path() {
            Some(path) => ensure_socket_directory(path),
            None => Ok(()),
        }
    }
}

fn ensure_socket_directory(socket: &Utf8Path) -> Result<(), SocketPreparationError> {
    let directory = socket
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .ok_or_else(|| SocketPreparationError::MissingParent {
            path: socket.to_path_buf(),
        })?;

    match fs::metadata(directory) {
        Ok(metadata) if metadata.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(SocketPreparationError::NotADirectory {
                path: directory.to_path_buf(),
            });
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(SocketPreparationError::CreateDirectory {
                path: directory.to_path_buf(),
                source,
            });
        }
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o700);
    builder
        .create(directory)
        .map_err(|source| SocketPreparationError::CreateDirectory {
            path: directory.to_path_buf(),
            source,
        })
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input).map_err(|source| SocketParseError::InvalidUrl {
            input: input.to_owned(),
            source,
        })?;
        match url.scheme() {
            "unix" => parse_unix(input, &url),
            "tcp" => parse_tcp(input, &url),
            scheme => Err(SocketParseError::Scheme {
                input: input.to_owned(),
                scheme: scheme.to_owned(),
            }),
        }
    }
}

fn parse_unix(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    // `unix://run/x.sock` parses `run` as a host, leaving a relative path.
    let path = url.path();
    if url.host_str().is_some_and(|host| !host.is_empty()) || !path.starts_with('/') || path == "/" {
        return Err(SocketParseError::UnixPath {
            input: input.to_owned(),
        });
    }
    Ok(SocketEndpoint::unix(path))
}

fn parse_tcp(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| SocketParseError::Host {
            input: input.to_owned(),
        })?;
    Ok(SocketEndpoint::tcp(host, url.port().unwrap_or(DEFAULT_TCP_PORT)))
}

/// Reasons a socket endpoint string is rejected.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// The text is not a URL.
    #[error("'{input}' is not a socket URL: {source}")]
    InvalidUrl {
        /// Rejected text.
        input: String,
        /// Parser diagnostic.
        #[source]
        source: url::ParseError,
    },
    /// The scheme is neither `unix` nor `tcp`.
    #[error("'{input}' uses scheme '{scheme}'; expected unix or tcp")]
    Scheme {
        /// Rejected text.
        input: String,
        /// Scheme found.
        scheme: String,
    },
    /// A TCP endpoint names no host.
    #[error("'{input}' names no TCP host")]
    Host {
        /// Rejected text.
        input: String,
    },
    /// A Unix endpoint lacks an absolute socket path.
    #[error("'{input}' must name an absolute socket path")]
    UnixPath {
        /// Rejected text.
        input: String,
    },
}

/// Failures while creating a socket's directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Socket path.
        path: Utf8PathBuf,
    },
    /// The parent exists but is a file.
    #[error("'{path}' is not a directory")]
    NotADirectory {
        /// Parent path.
        path: Utf8PathBuf,
    },
    /// The directory could not be inspected or created.
    #[error("cannot create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory path.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("tcp://127.0.0.1:9780", SocketEndpoint::tcp("127.0.0.1", 9780))]
    #[case("tcp://bmc.local", SocketEndpoint::tcp("bmc.local", DEFAULT_TCP_PORT))]
    #[case("unix:///run/dcmi/bus-bridge.sock", SocketEndpoint::unix("/run/dcmi/bus-bridge.sock"))]
    fn parses_endpoints(#[case] input: &str, #[case] expected: SocketEndpoint) {
        let endpoint: SocketEndpoint = input.parse().expect("endpoint should parse");

        assert_eq!(endpoint, expected);
        assert_eq!(endpoint.to_string().parse::<SocketEndpoint>().ok(), Some(endpoint));
    }

    #[rstest]
    #[case("udp://127.0.0.1:9780")]
    #[case("unix://run/dcmid.sock")]
    #[case("unix:///")]
    #[case("/run/dcmid.sock")]
    fn rejects_unusable_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err());
    }

    #[rstest]
    fn relative_socket_has_no_parent() {
        let error = SocketEndpoint::unix("dcmid.sock")
            .prepare_filesystem()
            .expect_err("bare file name has no parent");

        assert!(matches!(error, SocketPreparationError::MissingParent { .. }));
    }

    #[rstest]
    fn creates_nested_socket_directory() {
        let scratch = tempfile::tempdir().expect("temp dir");
        let socket = Utf8PathBuf::from_path_buf(scratch.path().join("run/dcmi/dcmid.sock"))
            .expect("utf-8 temp path");

        SocketEndpoint::unix(socket)
            .prepare_filesystem()
            .expect("directory should be created");

        assert!(scratch.path().join("run/dcmi").is_dir());
    }

    #[rstest]
    fn refuses_file_in_place_of_directory() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let socket = Utf8PathBuf::from_path_buf(file.path().join("dcmid.sock"))
            .expect("utf-8 temp path");

        let error = SocketEndpoint::unix(socket)
            .prepare_filesystem()
            .expect_err("parent is a file");

        assert!(matches!(error, SocketPreparationError::NotADirectory { .. }));
    }

    #[rstest]
    fn tcp_endpoints_need_no_preparation() {
        assert!(SocketEndpoint::tcp("127.0.0.1", 1).prepare_filesystem().is_ok());
    }
}
