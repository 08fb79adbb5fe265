// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Error types threaded through every fallible operation in this crate.
//!
//! EOF-pending is deliberately *not* a variant here — callers see it as
//! `Ok(None)`. Only genuine failures (I/O, malformed records, bad config)
//! are represented as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record type {record_type}: body too short (need at least {min_len} bytes, got {actual})")]
    BodyTooShort {
        record_type: u32,
        min_len: usize,
        actual: usize,
    },

    #[error("record type {record_type}: declared length {declared} exceeds the configured maximum {max}")]
    LengthTooLarge {
        record_type: u32,
        declared: u32,
        max: u32,
    },
}

#[derive(Debug, Error)]
pub enum Unified2Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Unified2Error>;
