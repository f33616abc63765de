//! Reply serialisation for the dispatch loop.

use std::io::Write;

use dcmi_handler::{CompletionCode, DcmiResponse};
use serde::Serialize;

use super::errors::DispatchError;

/// Reply sent for every request, serialised as one JSONL line.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum Reply<'a> {
    /// The command completed.
    Ok {
        completion_code: u8,
        data: &'a DcmiResponse,
    },
    /// The request or command failed.
    Error { completion_code: u8, message: String },
}

/// Writer that frames replies onto a stream.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_reply(&mut self, reply: &Reply<'_>) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, reply)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub(crate) fn write_success(&mut self, data: &DcmiResponse) -> Result<(), DispatchError> {
        self.write_reply(&Reply::Ok {
            completion_code: CompletionCode::Success.as_u8(),
            data,
        })
    }

    pub(crate) fn write_error(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write_reply(&Reply::Error {
            completion_code: error.completion_code().as_u8(),
            message: error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use dcmi_handler::{DcmiError, SensorInfoResponse};
    use serde_json::json;

    use super::*;

    fn written(write: impl FnOnce(&mut ResponseWriter<&mut Vec<u8>>)) -> serde_json::Value {
        let mut output = Vec::new();
        write(&mut ResponseWriter::new(&mut output));
        assert_eq!(output.last(), Some(&b'\n'));
        serde_json::from_slice(&output).expect("reply is JSON")
    }

    #[test]
    fn success_carries_data_and_zero_code() {
        let data = DcmiResponse::SensorInfo(SensorInfoResponse {
            num_instances: 2,
            num_records: 1,
            record_ids: vec![7],
        });

        let reply = written(|writer| writer.write_success(&data).expect("write reply"));

        assert_eq!(
            reply,
            json!({
                "status": "ok",
                "completion_code": 0,
                "data": {"num_instances": 2, "num_records": 1, "record_ids": [7]}
            })
        );
    }

    #[test]
    fn error_carries_completion_code_and_message() {
        let error = DispatchError::from(DcmiError::PowerManagementUnsupported);

        let reply = written(|writer| writer.write_error(&error).expect("write reply"));

        assert_eq!(reply["status"], "error");
        assert_eq!(reply["completion_code"], 0xC1);
        assert!(reply["message"].is_string());
    }
}
