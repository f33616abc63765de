//! Connection handler that dispatches JSONL DCMI requests.

use std::io::{self, Read};
use std::sync::Arc;

use dcmi_bus::Bus;
use dcmi_handler::DcmiHandler;
use tracing::{debug, warn};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::parse_request;
use super::response::ResponseWriter;

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Connection handler that executes one DCMI request per connection.
///
/// The command handler is shared read-only between connection threads.
pub(crate) struct DispatchConnectionHandler<B> {
    handler: Arc<DcmiHandler<B>>,
}

impl<B: Bus> DispatchConnectionHandler<B> {
    pub(crate) fn new(handler: Arc<DcmiHandler<B>>) -> Self {
        Self { handler }
    }

    fn dispatch(&self, mut stream: ConnectionStream) {
        let request_bytes = match read_request_line(&mut stream) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                reply_error(&mut ResponseWriter::new(&mut stream), &error);
                return;
            }
        };

        let mut writer = ResponseWriter::new(&mut stream);
        let request = match parse_request(&request_bytes) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request");
                reply_error(&mut writer, &error);
                return;
            }
        };

        let command = request.command();
        debug!(
            target: DISPATCH_TARGET,
            command = command.code(),
            "dispatching request"
        );
        match self.handler.execute(&request) {
            Ok(response) => {
                if let Err(error) = writer.write_success(&response) {
                    warn!(target: DISPATCH_TARGET, %error, "failed to write reply");
                }
            }
            Err(error) => {
                let error = DispatchError::from(error);
                warn!(
                    target: DISPATCH_TARGET,
                    command = command.code(),
                    completion_code = error.completion_code().as_u8(),
                    %error,
                    "command failed"
                );
                reply_error(&mut writer, &error);
            }
        }
    }
}

impl<B: Bus + 'static> ConnectionHandler for DispatchConnectionHandler<B> {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}

fn reply_error<W: io::Write>(writer: &mut ResponseWriter<W>, error: &DispatchError) {
    if let Err(write_error) = writer.write_error(error) {
        warn!(target: DISPATCH_TARGET, error = %write_error, "failed to write error reply");
    }
}

/// Reads a bounded JSONL request line from the stream.
///
/// Returns `Ok(None)` if the client disconnects without sending data and
/// `Ok(Some(bytes))` once a full line (or EOF after partial data) arrives.
fn read_request_line(stream: &mut impl Read) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;
        let Some(received) = chunk.get(..bytes_read).filter(|bytes| !bytes.is_empty()) else {
            return Ok((!buffer.is_empty()).then_some(buffer));
        };

        if let Some(newline) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend(received.iter().take(newline + 1));
            enforce_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_limit(buffer.len())?;
    }
}

fn read_with_retry(stream: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(size, MAX_REQUEST_BYTES));
    }
    Ok(())
}
