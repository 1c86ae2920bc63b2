//! Per-frame observation handed to the aligner and the tracker.

use bytes::Bytes;

use crate::Timestamp;

/// Visual frame as seen by the temporal calibration
///
/// The image payload is opaque here: only the tracker capability interprets
/// it. Cloning is cheap (`Bytes` is reference counted), which lets the aligner
/// keep the previous frame as its reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameObservation {
    /// Frame sequence number
    pub id: u64,

    /// Capture timestamp (camera clock, nanoseconds)
    pub timestamp: Timestamp,

    /// Raw image data
    pub image: Bytes,
}

impl FrameObservation {
    pub fn new(id: u64, timestamp: Timestamp, image: Bytes) -> Self {
        Self {
            id,
            timestamp,
            image,
        }
    }

    /// Frame without image payload
    pub fn without_image(id: u64, timestamp: Timestamp) -> Self {
        Self::new(id, timestamp, Bytes::new())
    }
}
