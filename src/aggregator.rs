// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Folds a flat record stream into [`Event`] groups keyed by
//! `(sensor-id, event-id)`.
//!
//! Unified2 guarantees the event-header record precedes the records it
//! covers, but doesn't delimit the end of an event — only the arrival of the
//! next event-header (or end-of-stream) signals that the previous event is
//! complete. This is the "emit previous on new header" resolution.

use crate::record::Record;

/// A non-empty, ordered sequence of records sharing one `(sensor-id,
/// event-id)`. The first record is always an event-header kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sensor_id: u32,
    pub event_id: u32,
    pub records: Vec<Record>,
}

impl Event {
    fn from_queue(records: Vec<Record>) -> Self {
        let (sensor_id, event_id) = records[0]
            .event_header_key()
            .expect("aggregator only ever starts a queue with an event-header record");
        Event {
            sensor_id,
            event_id,
            records,
        }
    }
}

/// Strict per-event grouper: an event-header record starts a new group and
/// flushes whatever was pending; a packet/extra-data record joins the
/// current group only if its key matches, otherwise it's a stray and is
/// dropped silently.
#[derive(Default)]
pub struct Aggregator {
    queue: Vec<Record>,
    current: Option<(u32, u32)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently queued for the in-progress event.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Feed one record in. Returns the *previous* event once a new
    /// event-header record arrives to start the next one.
    pub fn add(&mut self, record: Record) -> Option<Event> {
        if let Some(key) = record.event_header_key() {
            let emitted = if self.queue.is_empty() {
                None
            } else {
                Some(Event::from_queue(std::mem::take(&mut self.queue)))
            };
            self.queue.push(record);
            self.current = Some(key);
            emitted
        } else {
            match record.associated_key() {
                Some(key) if Some(key) == self.current => self.queue.push(record),
                _ => {} // stray record with no matching in-progress event: drop it
            }
            None
        }
    }

    /// Wrap whatever is queued into a final [`Event`]. Used at end-of-stream
    /// since nothing else signals the last event's completion.
    pub fn flush(&mut self) -> Option<Event> {
        if self.queue.is_empty() {
            None
        } else {
            Some(Event::from_queue(std::mem::take(&mut self.queue)))
        }
    }
}
