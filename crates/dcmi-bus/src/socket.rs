//! JSONL backend forwarding bus calls to an external bridge.
//!
//! Each call opens a connection to the bridge, writes one request line and
//! reads one reply line. The bridge owns the actual bus connection; this side
//! only encodes the call and decodes the reply.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use dcmi_config::{MapperLayout, SocketEndpoint};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::backend::{DirectoryService, MethodCall, MethodInvoker, PropertyBackend};
use crate::error::{BusError, BusMethod};
use crate::tree::{ObjectTree, ServiceMap};
use crate::value::{PropertyMap, Value};

const SOCKET_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::socket");

/// Time allowed for establishing a bridge connection.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single reply line.
const MAX_REPLY_BYTES: u64 = 1024 * 1024;

/// Service, path and interface a directory query is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTarget {
    /// Destination service.
    pub service: String,
    /// Destination object path.
    pub path: String,
    /// Destination interface.
    pub interface: String,
}

/// One request line sent to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BridgeRequest {
    /// Directory subtree query.
    GetSubTree {
        /// Directory service location.
        target: BridgeTarget,
        /// Search root.
        root: String,
        /// Traversal depth; zero is unrestricted.
        depth: i32,
        /// Interface filter.
        interfaces: Vec<String>,
    },
    /// Directory owner query.
    GetObject {
        /// Directory service location.
        target: BridgeTarget,
        /// Object path whose owners are requested.
        object_path: String,
        /// Interface filter.
        interfaces: Vec<String>,
    },
    /// Single property read.
    Get {
        /// Owning service.
        service: String,
        /// Object path.
        path: String,
        /// Interface declaring the property.
        interface: String,
        /// Property name.
        property: String,
    },
    /// Read of every property of an interface.
    GetAll {
        /// Owning service.
        service: String,
        /// Object path.
        path: String,
        /// Interface to read.
        interface: String,
    },
    /// Single property write.
    Set {
        /// Owning service.
        service: String,
        /// Object path.
        path: String,
        /// Interface declaring the property.
        interface: String,
        /// Property name.
        property: String,
        /// New value.
        value: Value,
    },
    /// Method invocation.
    Call(MethodCall),
}

impl BridgeRequest {
    const fn method(&self) -> BusMethod {
        match self {
            Self::GetSubTree { .. } => BusMethod::GetSubTree,
            Self::GetObject { .. } => BusMethod::GetObject,
            Self::Get { .. } => BusMethod::Get,
            Self::GetAll { .. } => BusMethod::GetAll,
            Self::Set { .. } => BusMethod::Set,
            Self::Call(_) => BusMethod::Call,
        }
    }

    fn subject(&self) -> (&str, &str) {
        match self {
            Self::GetSubTree { root, target, .. } => (root.as_str(), target.interface.as_str()),
            Self::GetObject {
                object_path,
                target,
                ..
            } => (object_path.as_str(), target.interface.as_str()),
            Self::Get {
                path, interface, ..
            }
            | Self::GetAll {
                path, interface, ..
            }
            | Self::Set {
                path, interface, ..
            } => (path.as_str(), interface.as_str()),
            Self::Call(call) => (call.path.as_str(), call.interface.as_str()),
        }
    }
}

/// One reply line received from the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeReply {
    /// The call succeeded.
    Ok {
        /// Call result; `null` for calls without a reply body.
        #[serde(default)]
        result: serde_json::Value,
    },
    /// The bus reported an error.
    Error {
        /// Error description supplied by the bridge.
        message: String,
    },
}

enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Bus backend talking JSONL to a bridge process.
#[derive(Debug, Clone)]
pub struct SocketBus {
    endpoint: SocketEndpoint,
    mapper: MapperLayout,
}

impl SocketBus {
    /// Creates a backend for the bridge at `endpoint`, sending directory
    /// queries to `mapper`.
    #[must_use]
    pub const fn new(endpoint: SocketEndpoint, mapper: MapperLayout) -> Self {
        Self { endpoint, mapper }
    }

    /// Bridge endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    fn mapper_target(&self) -> BridgeTarget {
        BridgeTarget {
            service: self.mapper.service.clone(),
            path: self.mapper.path.clone(),
            interface: self.mapper.interface.clone(),
        }
    }

    fn exchange<T: DeserializeOwned>(&self, request: &BridgeRequest) -> Result<T, BusError> {
        let method = request.method();
        let (path, interface) = request.subject();
        let endpoint = self.endpoint.to_string();
        debug!(target: SOCKET_TARGET, %method, path, interface, "forwarding bus call");

        let mut line = serde_json::to_vec(request)
            .map_err(|error| BusError::protocol(method, error.to_string()))?;
        line.push(b'\n');

        let mut connection =
            connect(&self.endpoint).map_err(|error| BusError::transport(&endpoint, error))?;
        connection
            .write_all(&line)
            .and_then(|()| connection.flush())
            .map_err(|error| BusError::transport(&endpoint, error))?;

        let mut reply = String::new();
        BufReader::new(connection.take(MAX_REPLY_BYTES))
            .read_line(&mut reply)
            .map_err(|error| BusError::transport(&endpoint, error))?;
        if reply.trim().is_empty() {
            return Err(BusError::protocol(method, "bridge closed without replying"));
        }

        let reply: BridgeReply = serde_json::from_str(reply.trim_end())
            .map_err(|error| BusError::protocol(method, error.to_string()))?;
        match reply {
            BridgeReply::Ok { result } => serde_json::from_value(result)
                .map_err(|error| BusError::protocol(method, error.to_string())),
            BridgeReply::Error { message } => Err(BusError::rpc(method, path, interface, message)),
        }
    }
}

impl DirectoryService for SocketBus {
    fn get_sub_tree(
        &self,
        root: &str,
        depth: i32,
        interfaces: &[String],
    ) -> Result<ObjectTree, BusError> {
        self.exchange(&BridgeRequest::GetSubTree {
            target: self.mapper_target(),
            root: root.to_owned(),
            depth,
            interfaces: interfaces.to_vec(),
        })
    }

    fn get_object(&self, path: &str, interfaces: &[String]) -> Result<ServiceMap, BusError> {
        self.exchange(&BridgeRequest::GetObject {
            target: self.mapper_target(),
            object_path: path.to_owned(),
            interfaces: interfaces.to_vec(),
        })
    }
}

impl PropertyBackend for SocketBus {
    fn get(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
    ) -> Result<Value, BusError> {
        self.exchange(&BridgeRequest::Get {
            service: service.to_owned(),
            path: path.to_owned(),
            interface: interface.to_owned(),
            property: property.to_owned(),
        })
    }

    fn get_all(
        &self,
        service: &str,
        path: &str,
        interface: &str,
    ) -> Result<PropertyMap, BusError> {
        self.exchange(&BridgeRequest::GetAll {
            service: service.to_owned(),
            path: path.to_owned(),
            interface: interface.to_owned(),
        })
    }

    fn set(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: Value,
    ) -> Result<(), BusError> {
        self.exchange::<serde_json::Value>(&BridgeRequest::Set {
            service: service.to_owned(),
            path: path.to_owned(),
            interface: interface.to_owned(),
            property: property.to_owned(),
            value,
        })
        .map(drop)
    }
}

impl MethodInvoker for SocketBus {
    fn call(&self, call: &MethodCall) -> Result<(), BusError> {
        self.exchange::<serde_json::Value>(&BridgeRequest::Call(call.clone()))
            .map(drop)
    }
}

fn connect(endpoint: &SocketEndpoint) -> io::Result<Connection> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address = resolve_tcp_address(host, *port)?;
            TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT).map(Connection::Tcp)
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str())
            }

            #[cfg(not(unix))]
            {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unix sockets are unavailable on this platform: {path}"),
                ))
            }
        }
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream: UnixStream = socket.into();
    Ok(Connection::Unix(stream))
}
