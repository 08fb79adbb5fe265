// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Event-level readers: a [`crate::record::Record`] stream plus an
//! [`Aggregator`] in front, so callers see complete [`Event`]s instead of
//! the flat record stream.

use std::path::PathBuf;

use crate::aggregator::{Aggregator, Event};
use crate::bookmark::Bookmark;
use crate::error::Unified2Error;
use crate::file_reader::FileRecordReader;
use crate::spool::SpoolRecordReader;

/// Aggregates events out of a fixed list of files. No bookmarking: intended
/// for one-shot reads of files already on disk (the `read` CLI subcommand).
pub struct FileEventReader {
    records: FileRecordReader,
    aggregator: Aggregator,
}

impl FileEventReader {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            records: FileRecordReader::new(paths),
            aggregator: Aggregator::new(),
        }
    }

    /// Override the sanity bound applied to every file this reader opens.
    pub fn with_max_record_length(mut self, max_record_length: u32) -> Self {
        self.records = self.records.with_max_record_length(max_record_length);
        self
    }

    /// Next complete event. Once the file list is exhausted, flushes and
    /// returns whatever event was still in flight rather than waiting for a
    /// header that will never arrive; a subsequent call returns `Ok(None)`.
    pub fn next(&mut self) -> Result<Option<Event>, Unified2Error> {
        loop {
            match self.records.next()? {
                Some(record) => {
                    if let Some(event) = self.aggregator.add(record) {
                        return Ok(Some(event));
                    }
                }
                None => return Ok(self.aggregator.flush()),
            }
        }
    }
}

/// Aggregates events out of a tailed spool directory, with durable
/// bookmarking so a restart resumes after the last event it fully delivered.
pub struct SpoolEventReader {
    records: SpoolRecordReader,
    aggregator: Aggregator,
    bookmark: Bookmark,
    on_rollover: Option<Box<dyn FnMut(&str, &str)>>,
}

impl SpoolEventReader {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        bookmark_path: impl Into<PathBuf>,
    ) -> Result<Self, Unified2Error> {
        let bookmark = Bookmark::new(bookmark_path);
        let (filename, offset) = bookmark.get()?;
        let records = match filename {
            Some(name) => SpoolRecordReader::with_bookmark(dir, prefix, name, offset),
            None => SpoolRecordReader::new(dir, prefix),
        };
        Ok(Self {
            records,
            aggregator: Aggregator::new(),
            bookmark,
            on_rollover: None,
        })
    }

    /// Override the sanity bound applied to every file this reader opens.
    pub fn with_max_record_length(mut self, max_record_length: u32) -> Self {
        self.records = self.records.with_max_record_length(max_record_length);
        self
    }

    /// Called with `(closed_name, opened_name)` on each rotation transition
    /// (not on the idle-to-reading transition of the very first file opened).
    pub fn set_on_rollover(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.on_rollover = Some(Box::new(hook));
    }

    /// Next complete event, persisting the bookmark as soon as the boundary
    /// is known. On the spool's EOF-pending sentinel, flushes and returns
    /// whatever event is still in flight (recording the bookmark at the
    /// reader's current position) rather than waiting on a future event
    /// header that may not arrive for a long time on a quiet sensor.
    pub fn next(&mut self) -> Result<Option<Event>, Unified2Error> {
        loop {
            let (before_filename, before_offset) = self.records.tell()?;

            match self.records.next()? {
                Some(record) => {
                    if let Some((closed, opened)) = self.records.take_rollover() {
                        if let Some(hook) = &mut self.on_rollover {
                            hook(&closed, &opened);
                        }
                    }

                    if let Some(event) = self.aggregator.add(record) {
                        // The position captured just before this record was
                        // read is exactly where the just-emitted event ends.
                        if let Some(name) = before_filename {
                            self.bookmark.set(&name, before_offset)?;
                        }
                        return Ok(Some(event));
                    }
                }
                None => {
                    if let Some(event) = self.aggregator.flush() {
                        let (filename, offset) = self.records.tell()?;
                        if let Some(name) = filename {
                            self.bookmark.set(&name, offset)?;
                        }
                        return Ok(Some(event));
                    }
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn encode_event(sensor_id: u32, event_id: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(sensor_id.to_be_bytes());
        body.extend(event_id.to_be_bytes());
        body.extend([0u8; 4 * 7]);
        body.extend([207, 25, 71, 28]);
        body.extend([10, 20, 11, 123]);
        body.extend([0u8; 2 + 2 + 4]);
        let mut out = Vec::new();
        out.extend(crate::record::TYPE_EVENT_IPV4.to_be_bytes());
        out.extend((body.len() as u32).to_be_bytes());
        out.extend(body);
        out
    }

    fn encode_packet(sensor_id: u32, event_id: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(sensor_id.to_be_bytes());
        body.extend(event_id.to_be_bytes());
        body.extend([0u8; 4 * 3]);
        body.extend(1u32.to_be_bytes()); // linktype
        body.extend(2u32.to_be_bytes()); // packet-length
        body.extend([0xAA, 0xBB]);
        let mut out = Vec::new();
        out.extend(crate::record::TYPE_PACKET.to_be_bytes());
        out.extend((body.len() as u32).to_be_bytes());
        out.extend(body);
        out
    }

    #[test]
    fn file_event_reader_flushes_in_flight_event_at_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        let mut bytes = encode_event(1, 100);
        bytes.extend(encode_packet(1, 100));
        std::fs::write(&path, bytes).unwrap();

        let mut reader = FileEventReader::new(vec![path]);
        let event = reader.next().unwrap().expect("eof flushes the in-flight event");
        assert_eq!((event.sensor_id, event.event_id), (1, 100));
        assert_eq!(event.records.len(), 2);

        assert!(reader.next().unwrap().is_none());
    }

    #[test]
    fn file_event_reader_emits_on_second_header_then_flushes_last_at_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        let mut bytes = encode_event(1, 100);
        bytes.extend(encode_event(1, 101));
        std::fs::write(&path, bytes).unwrap();

        let mut reader = FileEventReader::new(vec![path]);
        let event = reader.next().unwrap().expect("first event flushed by second header");
        assert_eq!(event.event_id, 100);
        let last = reader.next().unwrap().expect("second event flushed at eof");
        assert_eq!(last.event_id, 101);
        assert!(reader.next().unwrap().is_none());
    }

    #[test]
    fn spool_event_reader_persists_bookmark_after_each_event() {
        let dir = tempdir().unwrap();
        let spool_dir = dir.path().join("spool");
        std::fs::create_dir(&spool_dir).unwrap();
        let bookmark_path = dir.path().join("bookmark");

        let mut bytes = encode_event(1, 100);
        bytes.extend(encode_packet(1, 100));
        bytes.extend(encode_event(1, 101));
        std::fs::write(spool_dir.join("unified2.log.0001"), bytes).unwrap();

        let mut reader =
            SpoolEventReader::new(&spool_dir, "unified2.log", &bookmark_path).unwrap();
        let event = reader.next().unwrap().expect("first event flushed on second header");
        assert_eq!(event.event_id, 100);

        let bookmark = Bookmark::new(&bookmark_path);
        let (filename, offset) = bookmark.get().unwrap();
        assert_eq!(filename.as_deref(), Some("unified2.log.0001"));
        assert!(offset > 0);
    }

    #[test]
    fn spool_event_reader_resumes_from_bookmark_across_restart() {
        let dir = tempdir().unwrap();
        let spool_dir = dir.path().join("spool");
        std::fs::create_dir(&spool_dir).unwrap();
        let bookmark_path = dir.path().join("bookmark");

        let mut bytes = encode_event(1, 100);
        bytes.extend(encode_event(1, 101));
        std::fs::write(spool_dir.join("unified2.log.0001"), &bytes).unwrap();

        {
            let mut reader =
                SpoolEventReader::new(&spool_dir, "unified2.log", &bookmark_path).unwrap();
            let event = reader.next().unwrap().expect("first event");
            assert_eq!(event.event_id, 100);
        }

        // Restart: a fresh reader should pick up from the bookmark and only
        // see the second event, not redeliver the first.
        let mut reader =
            SpoolEventReader::new(&spool_dir, "unified2.log", &bookmark_path).unwrap();
        let event = reader.next().unwrap().expect("second event flushed at eof");
        assert_eq!(event.event_id, 101);
        assert!(reader.next().unwrap().is_none());
    }

    #[test]
    fn spool_event_reader_fires_rollover_hook_with_both_names_on_rotation_only() {
        let dir = tempdir().unwrap();
        let spool_dir = dir.path().join("spool");
        std::fs::create_dir(&spool_dir).unwrap();
        let bookmark_path = dir.path().join("bookmark");

        std::fs::write(spool_dir.join("unified2.log.0001"), encode_event(1, 100)).unwrap();
        std::fs::write(spool_dir.join("unified2.log.0002"), encode_event(1, 101)).unwrap();

        let mut reader =
            SpoolEventReader::new(&spool_dir, "unified2.log", &bookmark_path).unwrap();
        let rollovers = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let recorded = rollovers.clone();
        reader.set_on_rollover(move |closed, opened| {
            recorded.borrow_mut().push((closed.to_string(), opened.to_string()));
        });

        // First record ever read opens 0001: idle-to-reading, not a rollover.
        let event = reader.next().unwrap().expect("first event flushed at rotation");
        assert_eq!(event.event_id, 100);
        assert_eq!(
            *rollovers.borrow(),
            vec![("unified2.log.0001".to_string(), "unified2.log.0002".to_string())]
        );

        let last = reader.next().unwrap().expect("second event flushed at eof");
        assert_eq!(last.event_id, 101);
        assert_eq!(rollovers.borrow().len(), 1); // no further rollovers fired
    }
}
