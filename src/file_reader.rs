// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Concatenates a fixed, ordered list of files into one record stream.
//!
//! Unlike [`crate::spool::SpoolRecordReader`], the file list never changes
//! after construction — there's no rotation awareness here, only sequencing.

use std::fs::File;
use std::path::PathBuf;

use crate::error::Unified2Error;
use crate::reader::RecordReader;
use crate::record::{Record, DEFAULT_MAX_RECORD_LENGTH};

pub struct FileRecordReader {
    paths: Vec<PathBuf>,
    index: usize,
    current: Option<RecordReader<File>>,
    max_record_length: u32,
}

impl FileRecordReader {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            index: 0,
            current: None,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
        }
    }

    /// Override the sanity bound applied to every file this reader opens.
    /// Only affects files opened after the call.
    pub fn with_max_record_length(mut self, max_record_length: u32) -> Self {
        self.max_record_length = max_record_length;
        self
    }

    /// Return the next record, or `Ok(None)` once the last file in the list
    /// is exhausted. If the last file is still being appended to, repeated
    /// calls keep polling it rather than treating it as permanently done.
    pub fn next(&mut self) -> Result<Option<Record>, Unified2Error> {
        loop {
            if self.current.is_none() {
                if self.index >= self.paths.len() {
                    return Ok(None);
                }
                let file = File::open(&self.paths[self.index])?;
                self.current = Some(RecordReader::with_max_record_length(
                    file,
                    self.max_record_length,
                ));
            }

            let reader = self.current.as_mut().expect("just ensured Some above");
            match reader.next()? {
                Some(record) => return Ok(Some(record)),
                None => {
                    self.index += 1;
                    if self.index >= self.paths.len() {
                        // Parked on the last file; it may still grow.
                        return Ok(None);
                    }
                    self.current = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn encode_minimal_event() -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(1u32.to_be_bytes());
        body.extend(1u32.to_be_bytes());
        body.extend([0u8; 4 * 7]); // event-second .. priority
        body.extend([207, 25, 71, 28]);
        body.extend([10, 20, 11, 123]);
        body.extend([0u8; 2 + 2 + 4]); // ports + protocol/impact/impact/blocked
        let mut out = Vec::new();
        out.extend(crate::record::TYPE_EVENT_IPV4.to_be_bytes());
        out.extend((body.len() as u32).to_be_bytes());
        out.extend(body);
        out
    }

    #[test]
    fn concatenates_multiple_files_in_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        std::fs::write(&a, encode_minimal_event()).unwrap();
        std::fs::write(&b, encode_minimal_event()).unwrap();

        let mut reader = FileRecordReader::new(vec![a, b]);
        assert!(reader.next().unwrap().is_some());
        assert!(reader.next().unwrap().is_some());
        assert!(reader.next().unwrap().is_none());
    }

    #[test]
    fn last_file_growing_is_picked_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("growing.log");
        std::fs::write(&path, encode_minimal_event()).unwrap();

        let mut reader = FileRecordReader::new(vec![path.clone()]);
        assert!(reader.next().unwrap().is_some());
        assert!(reader.next().unwrap().is_none());

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&encode_minimal_event()).unwrap();
        f.flush().unwrap();

        assert!(reader.next().unwrap().is_some());
        assert!(reader.next().unwrap().is_none());
    }
}
