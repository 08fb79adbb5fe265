//! Shared fixture-building helpers for the integration tests. Builds a
//! self-contained equivalent of the original multi-record-event fixture:
//! one event-ipv4 header followed by 16 packet records, all sharing
//! `(sensor-id, event-id) = (1, 1)` and the source/destination IPs from the
//! original py-idstools test suite.

pub const SENSOR_ID: u32 = 1;
pub const EVENT_ID: u32 = 1;
pub const SOURCE_IP: [u8; 4] = [207, 25, 71, 28];
pub const DESTINATION_IP: [u8; 4] = [10, 20, 11, 123];

pub fn encode_event_header(sensor_id: u32, event_id: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend(sensor_id.to_be_bytes());
    body.extend(event_id.to_be_bytes());
    body.extend(1_700_000_000u32.to_be_bytes()); // event-second
    body.extend(0u32.to_be_bytes()); // event-microsecond
    body.extend(1000u32.to_be_bytes()); // signature-id
    body.extend(1u32.to_be_bytes()); // generator-id
    body.extend(1u32.to_be_bytes()); // signature-revision
    body.extend(0u32.to_be_bytes()); // classification-id
    body.extend(3u32.to_be_bytes()); // priority
    body.extend(SOURCE_IP);
    body.extend(DESTINATION_IP);
    body.extend(80u16.to_be_bytes());
    body.extend(443u16.to_be_bytes());
    body.push(6); // protocol (TCP)
    body.push(0); // impact-flag
    body.push(0); // impact
    body.push(0); // blocked
    wrap(7, &body) // TYPE_EVENT_IPV4
}

pub fn encode_packet(sensor_id: u32, event_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend(sensor_id.to_be_bytes());
    body.extend(event_id.to_be_bytes());
    body.extend(1_700_000_000u32.to_be_bytes()); // event-second
    body.extend(1_700_000_000u32.to_be_bytes()); // packet-second
    body.extend(0u32.to_be_bytes()); // packet-microsecond
    body.extend(1u32.to_be_bytes()); // linktype (DLT_EN10MB)
    body.extend((payload.len() as u32).to_be_bytes());
    body.extend(payload);
    wrap(2, &body) // TYPE_PACKET
}

fn wrap(record_type: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(record_type.to_be_bytes());
    out.extend((body.len() as u32).to_be_bytes());
    out.extend(body);
    out
}

/// The full fixture: one event header, followed by 16 packet records.
pub fn multi_record_event() -> Vec<u8> {
    let mut out = encode_event_header(SENSOR_ID, EVENT_ID);
    for i in 0..16u8 {
        out.extend(encode_packet(SENSOR_ID, EVENT_ID, &[i; 8]));
    }
    out
}

/// Number of records in [`multi_record_event`].
pub const MULTI_RECORD_EVENT_COUNT: usize = 17;
