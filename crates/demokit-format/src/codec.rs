//! Framed binary codec for demonstration streams.
//!
//! Stream layout (all integers little-endian):
//!
//! ```text
//! stream  := MAGIC ("DEMO") record*
//! record  := kind (u8) | payload_len (u32) | checksum (u32) | payload
//! ```
//!
//! `kind` is `0x01` header, `0x02` step, `0x03` summary. The payload is the
//! bincode encoding of the record struct (fixed-width integers and IEEE-754
//! floats, length-prefixed strings and sequences). The checksum is xxHash32
//! of the payload bytes.
//!
//! The stream is append-only: the writer never seeks back, so the summary is
//! computed while recording and emitted once at the end. A reader that hits
//! end of input in the middle of a record keeps everything before it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read, Write};
use xxhash_rust::xxh32::xxh32;

use crate::{
    AgentInfo, DecodeError, DemonstrationFile, DemonstrationHeader, DemonstrationSummary,
    EncodingError, FormatResult, RecordKind, FORMAT_VERSION, MAGIC,
};

/// Bytes in front of every record payload: kind, length, checksum.
pub const RECORD_PREFIX_SIZE: usize = 9;

/// Seed for the xxHash32 payload checksum.
const CHECKSUM_SEED: u32 = 0;

/// Encode one record (prefix and payload) into a byte buffer.
pub fn encode_record<T: Serialize>(
    kind: RecordKind,
    value: &T,
) -> Result<Vec<u8>, EncodingError> {
    let payload = bincode::serialize(value).map_err(|e| EncodingError::Serialize {
        kind,
        message: e.to_string(),
    })?;
    let len = u32::try_from(payload.len()).map_err(|_| EncodingError::PayloadTooLarge {
        kind,
        len: payload.len(),
    })?;

    let mut out = Vec::with_capacity(RECORD_PREFIX_SIZE + payload.len());
    out.push(kind.as_byte());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&xxh32(&payload, CHECKSUM_SEED).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Writes a demonstration stream in header, steps, summary order.
///
/// The header is written by [`DemonstrationWriter::new`] and the summary by
/// [`DemonstrationWriter::finish`], which consumes the writer, so the
/// ordering of the three record kinds cannot be violated through this type.
#[derive(Debug)]
pub struct DemonstrationWriter<W: Write> {
    inner: W,
    steps_written: u64,
}

impl<W: Write> DemonstrationWriter<W> {
    /// Start a stream: validate the header, then write magic and header record.
    pub fn new(mut inner: W, header: &DemonstrationHeader) -> FormatResult<Self> {
        header.brain_parameters.validate()?;
        let record = encode_record(RecordKind::Header, header)?;

        inner.write_all(&MAGIC)?;
        inner.write_all(&record)?;

        Ok(Self {
            inner,
            steps_written: 0,
        })
    }

    /// Append one step record.
    pub fn append_step(&mut self, info: &AgentInfo) -> FormatResult<()> {
        let record = encode_record(RecordKind::Step, info)?;
        self.inner.write_all(&record)?;
        self.steps_written += 1;
        Ok(())
    }

    /// Write the summary trailer, flush, and hand back the inner writer.
    ///
    /// On error the inner writer is dropped.
    pub fn finish(mut self, summary: &DemonstrationSummary) -> FormatResult<W> {
        let record = encode_record(RecordKind::Summary, summary)?;
        self.inner.write_all(&record)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Number of step records appended so far.
    pub fn steps_written(&self) -> u64 {
        self.steps_written
    }
}

/// A decoded record following the header.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Step(AgentInfo),
    Summary(DemonstrationSummary),
}

/// Reads a demonstration stream record by record.
#[derive(Debug)]
pub struct DemonstrationReader<R: Read> {
    frames: FrameReader<R>,
    header: DemonstrationHeader,
    summary_seen: bool,
}

impl<R: Read> DemonstrationReader<R> {
    /// Check the magic bytes and decode the header record.
    pub fn open(mut inner: R) -> FormatResult<Self> {
        let mut magic = [0u8; 4];
        let n = read_full(&mut inner, &mut magic)?;
        if n < magic.len() {
            return Err(DecodeError::MissingHeader.into());
        }
        if magic != MAGIC {
            return Err(DecodeError::BadMagic.into());
        }

        let mut frames = FrameReader {
            inner,
            offset: MAGIC.len() as u64,
            truncated: false,
        };
        let Some(frame) = frames.read_frame()? else {
            return Err(DecodeError::MissingHeader.into());
        };
        if frame.kind != RecordKind::Header {
            return Err(DecodeError::UnexpectedRecord {
                kind: frame.kind,
                offset: frame.offset,
                reason: "the first record must be the header",
            }
            .into());
        }
        check_version(&frame.payload)?;
        let header = frame.decode()?;

        Ok(Self {
            frames,
            header,
            summary_seen: false,
        })
    }

    /// The decoded header record.
    pub fn header(&self) -> &DemonstrationHeader {
        &self.header
    }

    /// Whether the stream ended partway through a record.
    pub fn is_truncated(&self) -> bool {
        self.frames.truncated
    }

    /// Decode the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> FormatResult<Option<Record>> {
        let Some(frame) = self.frames.read_frame()? else {
            return Ok(None);
        };

        if self.summary_seen {
            return Err(DecodeError::UnexpectedRecord {
                kind: frame.kind,
                offset: frame.offset,
                reason: "records may not follow the summary",
            }
            .into());
        }

        match frame.kind {
            RecordKind::Header => Err(DecodeError::UnexpectedRecord {
                kind: frame.kind,
                offset: frame.offset,
                reason: "a stream has exactly one header",
            }
            .into()),
            RecordKind::Step => Ok(Some(Record::Step(frame.decode()?))),
            RecordKind::Summary => {
                self.summary_seen = true;
                Ok(Some(Record::Summary(frame.decode()?)))
            }
        }
    }

    /// Decode every remaining record into a [`DemonstrationFile`].
    pub fn read_to_end(mut self) -> FormatResult<DemonstrationFile> {
        let mut steps = Vec::new();
        let mut summary = None;

        while let Some(record) = self.next_record()? {
            match record {
                Record::Step(info) => steps.push(info),
                Record::Summary(s) => summary = Some(s),
            }
        }

        Ok(DemonstrationFile {
            header: self.header,
            steps,
            summary,
            truncated: self.frames.truncated,
        })
    }
}

/// One checksum-verified record as read from the stream.
struct Frame {
    kind: RecordKind,
    offset: u64,
    payload: Vec<u8>,
}

impl Frame {
    fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        bincode::deserialize(&self.payload).map_err(|e| DecodeError::Deserialize {
            kind: self.kind,
            offset: self.offset,
            message: e.to_string(),
        })
    }
}

#[derive(Debug)]
struct FrameReader<R: Read> {
    inner: R,
    offset: u64,
    truncated: bool,
}

impl<R: Read> FrameReader<R> {
    /// Read one framed record. Returns `None` at a clean end of stream or when
    /// the stream stops partway through a record (which sets `truncated`).
    fn read_frame(&mut self) -> FormatResult<Option<Frame>> {
        let offset = self.offset;
        let mut prefix = [0u8; RECORD_PREFIX_SIZE];
        let n = read_full(&mut self.inner, &mut prefix)?;
        if n == 0 {
            return Ok(None);
        }
        if n < RECORD_PREFIX_SIZE {
            self.truncated = true;
            return Ok(None);
        }

        let kind = RecordKind::from_byte(prefix[0]).ok_or(DecodeError::UnknownRecordKind {
            kind: prefix[0],
            offset,
        })?;
        let len = u32::from_le_bytes([prefix[1], prefix[2], prefix[3], prefix[4]]);
        let expected = u32::from_le_bytes([prefix[5], prefix[6], prefix[7], prefix[8]]);

        // Grows with the bytes actually present, so a corrupt length cannot
        // force a huge allocation.
        let mut payload = Vec::new();
        (&mut self.inner)
            .take(u64::from(len))
            .read_to_end(&mut payload)?;
        if payload.len() < len as usize {
            self.truncated = true;
            return Ok(None);
        }

        let computed = xxh32(&payload, CHECKSUM_SEED);
        if computed != expected {
            return Err(DecodeError::ChecksumMismatch {
                kind,
                offset,
                expected,
                computed,
            }
            .into());
        }

        self.offset += (RECORD_PREFIX_SIZE + payload.len()) as u64;
        Ok(Some(Frame {
            kind,
            offset,
            payload,
        }))
    }
}

/// Fill `buf` as far as the reader allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reject headers from a newer format before decoding the rest of the payload.
fn check_version(payload: &[u8]) -> Result<(), DecodeError> {
    let Some(bytes) = payload.get(..4) else {
        return Err(DecodeError::MissingHeader);
    };
    let found = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if found > FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }
    Ok(())
}
