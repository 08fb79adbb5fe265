// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Streams [`Record`]s out of a single growing file (or any seekable byte
//! stream), one at a time, with an all-or-nothing read per record.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{DecodeError, Unified2Error};
use crate::record::{self, Record, DEFAULT_MAX_RECORD_LENGTH};

const HEADER_LEN: u64 = 8;

/// Wraps a `Read + Seek` stream and yields one [`Record`] per call to
/// [`RecordReader::next`].
///
/// Every call is atomic with respect to stream position: if a complete
/// record isn't available yet, the stream is left exactly where it was
/// before the call, so a file being actively written can be polled
/// repeatedly without losing or duplicating bytes.
pub struct RecordReader<S> {
    stream: S,
    max_record_length: u32,
}

impl<S: Read + Seek> RecordReader<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
        }
    }

    pub fn with_max_record_length(stream: S, max_record_length: u32) -> Self {
        Self {
            stream,
            max_record_length,
        }
    }

    /// Current absolute position in the underlying stream.
    pub fn tell(&mut self) -> std::io::Result<u64> {
        self.stream.stream_position()
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Return the next record, `Ok(None)` on EOF-pending (no complete record
    /// available right now — retry later), or `Err` on a decode or I/O
    /// error.
    ///
    /// A decode error (malformed body for a recognized type) is only raised
    /// once the full declared body has already been read off the stream, so
    /// the stream position has already advanced past the offending record —
    /// the caller may keep reading.
    pub fn next(&mut self) -> Result<Option<Record>, Unified2Error> {
        let start = self.stream.stream_position()?;

        let mut header = [0u8; HEADER_LEN as usize];
        if !self.read_fully(&mut header)? {
            self.stream.seek(SeekFrom::Start(start))?;
            return Ok(None);
        }

        let record_type = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        if length > self.max_record_length {
            // The header itself was fully read and is not replayed (it's
            // known-good); there's no well-defined number of body bytes to
            // skip for a bogus length, so we don't attempt to consume them.
            return Err(DecodeError::LengthTooLarge {
                record_type,
                declared: length,
                max: self.max_record_length,
            }
            .into());
        }

        let mut body = vec![0u8; length as usize];
        if !self.read_fully(&mut body)? {
            self.stream.seek(SeekFrom::Start(start))?;
            return Ok(None);
        }

        let record = record::decode(record_type, &body)?;
        Ok(Some(record))
    }

    /// Read `buf.len()` bytes, returning `Ok(false)` (not an error) if the
    /// stream runs out before `buf` is filled.
    fn read_fully(&mut self, buf: &mut [u8]) -> std::io::Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..])? {
                0 => return Ok(false),
                n => filled += n,
            }
        }
        Ok(true)
    }
}

/// Iterates a [`RecordReader`] by reference, yielding `Result` items and
/// stopping (returning `None`) on the EOF-pending sentinel. A decode error
/// is yielded as `Some(Err(..))` without stopping iteration — the reader has
/// already advanced past the offending record.
pub struct Iter<'a, S> {
    reader: &'a mut RecordReader<S>,
}

impl<'a, S: Read + Seek> Iterator for Iter<'a, S> {
    type Item = Result<Record, Unified2Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a, S: Read + Seek> IntoIterator for &'a mut RecordReader<S> {
    type Item = Result<Record, Unified2Error>;
    type IntoIter = Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        Iter { reader: self }
    }
}
