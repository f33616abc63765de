//! Request decoding for the dispatch loop.

use dcmi_handler::DcmiRequest;

use super::errors::DispatchError;

/// Parses one JSONL line into a DCMI request.
///
/// Trailing whitespace, including the newline delimiter, is ignored.
pub(crate) fn parse_request(line: &[u8]) -> Result<DcmiRequest, DispatchError> {
    let trimmed = line.trim_ascii_end();
    if trimmed.is_empty() {
        return Err(DispatchError::malformed("empty request line"));
    }
    serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
}
