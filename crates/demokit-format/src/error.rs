//! Error types for demonstration encoding and decoding.

use crate::RecordKind;
use thiserror::Error;

/// Errors that can occur when reading or writing demonstration streams.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be represented in the record schema
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Stream contents could not be decoded
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),
}

/// Data that does not fit the fixed record schema.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Action descriptions and action sizes disagree on the branch count
    #[error(
        "Brain declares {sizes} action branches but has {descriptions} action descriptions"
    )]
    ActionBranchMismatch { descriptions: usize, sizes: usize },

    /// Stacked observation count of zero
    #[error("Number of stacked vector observations must be at least 1")]
    NoStackedObservations,

    /// Payload does not fit the u32 length prefix
    #[error("{kind} record payload is {len} bytes, which exceeds the length prefix")]
    PayloadTooLarge { kind: RecordKind, len: usize },

    /// Serializer rejected the value
    #[error("Failed to serialize {kind} record: {message}")]
    Serialize { kind: RecordKind, message: String },
}

/// Malformed or unsupported demonstration streams.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Stream does not start with the magic bytes
    #[error("Not a demonstration stream (bad magic bytes)")]
    BadMagic,

    /// Stream ends before a complete header record
    #[error("Stream ends before the header record")]
    MissingHeader,

    /// Header written by a newer format version
    #[error("Format version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Record kind byte not recognised
    #[error("Unknown record kind {kind:#04x} at offset {offset}")]
    UnknownRecordKind { kind: u8, offset: u64 },

    /// Payload checksum does not match
    #[error(
        "Checksum mismatch in {kind} record at offset {offset} \
         (expected {expected:#010X}, got {computed:#010X})"
    )]
    ChecksumMismatch {
        kind: RecordKind,
        offset: u64,
        expected: u32,
        computed: u32,
    },

    /// Record appears where the stream layout does not allow it
    #[error("Unexpected {kind} record at offset {offset}: {reason}")]
    UnexpectedRecord {
        kind: RecordKind,
        offset: u64,
        reason: &'static str,
    },

    /// Payload bytes could not be deserialized
    #[error("Failed to deserialize {kind} record at offset {offset}: {message}")]
    Deserialize {
        kind: RecordKind,
        offset: u64,
        message: String,
    },
}

/// Consistency problems found in a decoded demonstration.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Header brain parameters violate the schema
    #[error("Invalid brain parameters: {0}")]
    BrainParameters(#[from] EncodingError),

    /// Summary step count disagrees with the step records
    #[error("Summary reports {summary} steps but the file holds {actual}")]
    StepCountMismatch { summary: u64, actual: u64 },

    /// Summary episode count disagrees with the step records
    #[error("Summary reports {summary} episodes but the steps complete {actual}")]
    EpisodeCountMismatch { summary: u64, actual: u64 },

    /// Summary reward disagrees with the step records
    #[error("Summary reports cumulative reward {summary} but the steps sum to {actual}")]
    RewardMismatch { summary: f64, actual: f64 },
}

/// Result type for demonstration format operations.
pub type FormatResult<T> = Result<T, FormatError>;
