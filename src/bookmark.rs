// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Durable (filename, offset) bookmark naming the boundary after the last
//! event a [`crate::event_reader::SpoolEventReader`] delivered.
//!
//! Stored as a two-line text file: basename on line 1, decimal offset on
//! line 2. Writes go to a sibling temp file first and are then renamed into
//! place, so a crash mid-write can never leave a half-written bookmark.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Unified2Error;

pub struct Bookmark {
    path: PathBuf,
}

impl Bookmark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current bookmark, or `(None, 0)` if no bookmark has been written yet.
    pub fn get(&self) -> Result<(Option<String>, u64), Unified2Error> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((None, 0)),
            Err(e) => return Err(e.into()),
        };
        let mut lines = content.lines();
        let filename = lines.next().map(str::to_string);
        let offset = lines
            .next()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Ok((filename, offset))
    }

    /// Atomically persist `filename`/`offset` as the new bookmark.
    pub fn set(&self, filename: &str, offset: u64) -> Result<(), Unified2Error> {
        let tmp_path = temp_sibling(&self.path);
        {
            let mut f = std::fs::File::create(&tmp_path)?;
            writeln!(f, "{filename}")?;
            writeln!(f, "{offset}")?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
