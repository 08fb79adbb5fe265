// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Tails a directory of rotating unified2 spool files.
//!
//! A spool file is opened on first read and never reopened once the reader
//! has moved past it: the reader advances to the next file only when a
//! strictly later one already exists (the rotation rule, see `next`). This
//! is what lets the same state machine handle both "the current file is
//! still being appended to" and "the sensor rotated to a new file" without
//! ever re-reading or skipping a byte.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;

use crate::error::Unified2Error;
use crate::reader::RecordReader;
use crate::record::{Record, DEFAULT_MAX_RECORD_LENGTH};

struct OpenFile {
    basename: String,
    reader: RecordReader<File>,
}

/// Tails `<dir>/<prefix>*`, delivering records in basename-sort order.
pub struct SpoolRecordReader {
    dir: PathBuf,
    prefix: String,
    /// Basename of the most recently opened file; the next file considered
    /// must sort strictly after it. `None` only before the first file opens.
    last_opened: Option<String>,
    /// Basenames lexically less than this are skipped at startup — the
    /// bookmark says they were already fully delivered in a prior run.
    skip_before: Option<String>,
    /// Seek-to offset applied the one time we open `skip_before` itself.
    pending_seek: Option<u64>,
    current: Option<OpenFile>,
    max_record_length: u32,
    /// `(closed, opened)` basenames of the most recent rotation, if one
    /// hasn't been consumed via [`Self::take_rollover`] yet. Only set when
    /// an already-open file is closed in favor of a later one — never on
    /// the very first file this reader opens (that's idle-to-reading, not
    /// a rotation).
    pending_rollover: Option<(String, String)>,
}

impl SpoolRecordReader {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            last_opened: None,
            skip_before: None,
            pending_seek: None,
            current: None,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
            pending_rollover: None,
        }
    }

    /// Resume a prior run: basenames before `bookmark_filename` are treated
    /// as already delivered, and `bookmark_filename` itself (if present) is
    /// opened seeked to `bookmark_offset`. If `bookmark_filename` has
    /// already rotated out of the directory, the reader starts at the first
    /// remaining candidate whose basename is `>= bookmark_filename`.
    pub fn with_bookmark(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        bookmark_filename: impl Into<String>,
        bookmark_offset: u64,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            last_opened: None,
            skip_before: Some(bookmark_filename.into()),
            pending_seek: Some(bookmark_offset),
            current: None,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
            pending_rollover: None,
        }
    }

    /// Override the sanity bound applied to every file this reader opens.
    /// Only affects files opened after the call.
    pub fn with_max_record_length(mut self, max_record_length: u32) -> Self {
        self.max_record_length = max_record_length;
        self
    }

    /// Basenames under `dir` starting with `prefix`, sorted ascending. This
    /// is the canonical processing order: sensors name rotated files with a
    /// monotonically increasing suffix, so lexical order matches write
    /// order by construction.
    pub fn list_candidates(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&self.prefix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn next_candidate(&self, candidates: &[String]) -> Option<String> {
        match &self.last_opened {
            Some(last) => candidates.iter().filter(|c| c.as_str() > last.as_str()).min().cloned(),
            None => match &self.skip_before {
                Some(floor) => candidates
                    .iter()
                    .filter(|c| c.as_str() >= floor.as_str())
                    .min()
                    .cloned(),
                None => candidates.iter().min().cloned(),
            },
        }
    }

    /// Open the next candidate file, if one exists. Returns its basename, or
    /// `None` if there's nothing newer to open yet.
    pub fn open_next(&mut self) -> Result<Option<String>, Unified2Error> {
        let candidates = self.list_candidates()?;
        let Some(basename) = self.next_candidate(&candidates) else {
            return Ok(None);
        };

        let mut file = File::open(self.dir.join(&basename))?;
        if let Some(offset) = self.pending_seek.take() {
            if self.skip_before.as_deref() == Some(basename.as_str()) {
                file.seek(SeekFrom::Start(offset))?;
            }
        }

        self.last_opened = Some(basename.clone());
        self.current = Some(OpenFile {
            basename: basename.clone(),
            reader: RecordReader::with_max_record_length(file, self.max_record_length),
        });
        Ok(Some(basename))
    }

    /// Drive the state machine one step: read a record from the currently
    /// open file, rotating to the next file on EOF if one already exists,
    /// or parking at EOF (to pick up growth) if not.
    pub fn next(&mut self) -> Result<Option<Record>, Unified2Error> {
        loop {
            if self.current.is_none() {
                if self.open_next()?.is_none() {
                    return Ok(None);
                }
                continue;
            }

            let open = self.current.as_mut().expect("just ensured Some above");
            match open.reader.next()? {
                Some(record) => return Ok(Some(record)),
                None => {
                    let candidates = self.list_candidates()?;
                    if self.next_candidate(&candidates).is_some() {
                        let closed = self.current.take().expect("just matched Some above").basename;
                        if let Some(opened) = self.open_next()? {
                            self.pending_rollover = Some((closed, opened));
                        }
                    } else {
                        return Ok(None); // parked; this file may still grow
                    }
                }
            }
        }
    }

    /// `(basename, offset)` of the currently open file, at the position
    /// immediately after the last record successfully returned.
    pub fn tell(&mut self) -> Result<(Option<String>, u64), Unified2Error> {
        match &mut self.current {
            Some(open) => Ok((Some(open.basename.clone()), open.reader.tell()?)),
            None => Ok((self.last_opened.clone(), 0)),
        }
    }

    /// Take the most recent rotation transition, if one hasn't already been
    /// consumed. `None` on the very first file opened by this reader — only
    /// a genuine close-then-open-the-next-file transition counts.
    pub fn take_rollover(&mut self) -> Option<(String, String)> {
        self.pending_rollover.take()
    }
}
