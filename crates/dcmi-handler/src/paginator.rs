//! Response framing for enumerations.

use serde::Serialize;

use crate::resolver::EntityRecord;

/// Most record ids carried by one Get Sensor Info response.
pub const MAX_RECORDS: usize = 8;

/// One bounded batch of record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseFrame {
    /// Instances of the requested type in the whole configuration.
    pub num_instances: usize,
    /// Record ids packed into this frame, at most [`MAX_RECORDS`].
    pub record_ids: Vec<u16>,
}

impl ResponseFrame {
    /// Number of record ids in this frame.
    #[must_use]
    pub fn num_records(&self) -> usize {
        self.record_ids.len()
    }
}

/// Packs the head of `records` into a frame.
///
/// Takes at most [`MAX_RECORDS`] entries; `total` passes through untouched.
#[must_use]
pub fn paginate(records: &[EntityRecord], total: usize) -> ResponseFrame {
    ResponseFrame {
        num_instances: total,
        record_ids: records
            .iter()
            .take(MAX_RECORDS)
            .map(|record| record.record_id)
            .collect(),
    }
}
