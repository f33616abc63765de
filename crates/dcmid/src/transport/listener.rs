//! Accept loop for the daemon socket.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dcmi_config::SocketEndpoint;
use tracing::{debug, info, warn};

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError, MAX_CONNECTIONS};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};

/// Pause between polls while no client is waiting.
const IDLE_POLL: Duration = Duration::from_millis(25);
/// Pause after a failed accept.
const FAILURE_PAUSE: Duration = Duration::from_millis(150);
/// Read and write budget for each client.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

enum Socket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl Socket {
    fn accept(&self) -> io::Result<ConnectionStream> {
        match self {
            Self::Tcp(listener) => listener.accept().map(|(stream, _)| ConnectionStream::Tcp(stream)),
            #[cfg(unix)]
            Self::Unix(listener) => listener
                .accept()
                .map(|(stream, _)| ConnectionStream::Unix(stream)),
        }
    }

    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }
}

/// Listener bound to the daemon endpoint but not yet accepting.
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    socket: Socket,
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let socket = match endpoint {
            SocketEndpoint::Tcp { host, port } => Socket::Tcp(bind_tcp(endpoint, host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => Socket::Unix(bind_unix(path.as_str())?),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::Unsupported {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Bound TCP address; `None` for Unix sockets.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.socket {
            Socket::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Socket::Unix(_) => None,
        }
    }

    pub(crate) fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Starts accepting on a background thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.socket.set_nonblocking() {
            remove_socket_file(&self.endpoint);
            return Err(ListenerError::Configure {
                endpoint: self.endpoint.to_string(),
                source,
            });
        }
        let stop = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            handler,
            stop: Arc::clone(&stop),
            active: Arc::new(AtomicUsize::new(0)),
        };
        let thread = thread::spawn(move || accept_loop.run());
        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Controls a running listener.
///
/// Dropping the handle stops the accept loop without waiting for it.
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to exit. In-flight connections are not
    /// awaited.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        self.thread
            .take()
            .map_or(Ok(()), |thread| thread.join().map_err(|_| ListenerError::Panicked))
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct AcceptLoop {
    listener: SocketListener,
    handler: Arc<dyn ConnectionHandler>,
    stop: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

impl AcceptLoop {
    fn run(self) {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint,
            max_connections = MAX_CONNECTIONS,
            "accepting connections"
        );
        let mut repeated_failure = None::<io::ErrorKind>;
        while !self.stop.load(Ordering::SeqCst) {
            match self.listener.socket.accept() {
                Ok(stream) => {
                    repeated_failure = None;
                    self.serve(stream);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => thread::sleep(IDLE_POLL),
                Err(error) => {
                    // Log a failure once until the next successful accept.
                    if repeated_failure.replace(error.kind()) != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, %error, "accept failed");
                    }
                    thread::sleep(FAILURE_PAUSE);
                }
            }
        }
        remove_socket_file(&self.listener.endpoint);
        info!(target: LISTENER_TARGET, "listener stopped");
    }

    fn serve(&self, stream: ConnectionStream) {
        let peer = stream.peer();
        let Some(slot) = ConnectionSlot::claim(&self.active) else {
            warn!(target: LISTENER_TARGET, %peer, "connection limit reached; closing client");
            return;
        };
        if let Err(error) = stream.prepare(CLIENT_TIMEOUT) {
            warn!(target: LISTENER_TARGET, %peer, %error, "cannot configure client socket");
            return;
        }
        debug!(target: LISTENER_TARGET, %peer, "connection accepted");
        let handler = Arc::clone(&self.handler);
        thread::spawn(move || {
            let _slot = slot;
            handler.handle(stream);
        });
    }
}

/// One of the [`MAX_CONNECTIONS`] concurrent connection slots.
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    fn claim(active: &Arc<AtomicUsize>) -> Option<Self> {
        active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count < MAX_CONNECTIONS).then_some(count + 1)
            })
            .ok()
            .map(|_| Self(Arc::clone(active)))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn bind_tcp(endpoint: &SocketEndpoint, host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let address = (host, port)
        .to_socket_addrs()
        .and_then(|mut addresses| {
            addresses.next().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
            })
        })
        .map_err(|source| ListenerError::Address {
            endpoint: endpoint.to_string(),
            source,
        })?;
    TcpListener::bind(address).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Binds `path`, first removing a socket file whose owner has gone away.
#[cfg(unix)]
fn bind_unix(path: &str) -> Result<UnixListener, ListenerError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.file_type().is_socket() => {
            return Err(ListenerError::NotASocket {
                path: path.to_owned(),
            });
        }
        Ok(_) if UnixStream::connect(path).is_ok() => {
            return Err(ListenerError::SocketInUse {
                path: path.to_owned(),
            });
        }
        Ok(_) => {
            fs::remove_file(path).map_err(|source| ListenerError::StaleSocket {
                path: path.to_owned(),
                source,
            })?;
            warn!(target: LISTENER_TARGET, path, "removed stale socket");
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ListenerError::StaleSocket {
                path: path.to_owned(),
                source,
            });
        }
    }
    UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        endpoint: format!("unix://{path}"),
        source,
    })
}

fn remove_socket_file(endpoint: &SocketEndpoint) {
    #[cfg(unix)]
    if let Some(path) = endpoint.unix_path()
        && let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(target: LISTENER_TARGET, %error, %path, "cannot remove socket file");
    }
    #[cfg(not(unix))]
    let _ = endpoint;
}
