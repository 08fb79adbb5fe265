// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! The unified2 wire format decoder.
//!
//! ## File Layout
//!
//! ```text
//! [RecordHeader : 8 bytes]
//!   type   : u32 (BE)
//!   length : u32 (BE)
//!
//! [body : length bytes, layout depends on type]
//! ```
//!
//! Every record is modeled as a variant of [`Record`] rather than a loose
//! key-value map: type-specific fields are accessible without per-key
//! lookups, and the compiler catches a typo in a field name. Record types
//! this crate doesn't recognize are preserved verbatim as [`Record::Unknown`]
//! rather than rejected — the sensor may emit kinds newer than this decoder.

use std::io::{Cursor, Read};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::DecodeError;

pub const TYPE_PACKET: u32 = 2;
pub const TYPE_EVENT_IPV4: u32 = 7;
pub const TYPE_EVENT_IPV6: u32 = 72;
pub const TYPE_EVENT_V2_IPV4: u32 = 104;
pub const TYPE_EVENT_V2_IPV6: u32 = 105;
pub const TYPE_EXTRA_DATA: u32 = 110;

/// Recommended sanity bound on a record's declared body length.
pub const DEFAULT_MAX_RECORD_LENGTH: u32 = 65535;

/// A packet (type 2) record: raw packet data captured against an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    pub sensor_id: u32,
    pub event_id: u32,
    pub event_second: u32,
    pub packet_second: u32,
    pub packet_microsecond: u32,
    pub linktype: u32,
    pub packet_data: Vec<u8>,
}

impl PacketRecord {
    pub fn packet_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.packet_second as i64, self.packet_microsecond * 1000)
    }
}

/// An event-header record (types 7, 72, 104, 105).
///
/// `mpls_label` / `vlan_id` are only present on the "v2" variants (104, 105);
/// they are `None` for plain IPv4/IPv6 events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub sensor_id: u32,
    pub event_id: u32,
    pub event_second: u32,
    pub event_microsecond: u32,
    pub signature_id: u32,
    pub generator_id: u32,
    pub signature_revision: u32,
    pub classification_id: u32,
    pub priority: u32,
    pub source_ip: IpAddr,
    pub destination_ip: IpAddr,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: u8,
    pub impact_flag: u8,
    pub impact: u8,
    pub blocked: u8,
    pub mpls_label: Option<u32>,
    pub vlan_id: Option<u16>,
}

impl EventRecord {
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.event_second as i64, self.event_microsecond * 1000)
    }
}

/// An extra-data (type 110) record: out-of-band data attached to an event
/// (e.g. an HTTP URI or a normalized payload the sensor extracted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraDataRecord {
    pub event_type: u32,
    pub event_length: u32,
    pub sensor_id: u32,
    pub event_id: u32,
    pub event_second: u32,
    pub record_type: u32,
    pub data_type: u32,
    pub data: Vec<u8>,
}

/// A record of a type this decoder does not recognize. The raw body is
/// preserved so nothing is lost even if this crate is older than the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRecord {
    pub record_type: u32,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Packet(PacketRecord),
    EventIpv4(EventRecord),
    EventIpv6(EventRecord),
    EventV2Ipv4(EventRecord),
    EventV2Ipv6(EventRecord),
    ExtraData(ExtraDataRecord),
    Unknown(UnknownRecord),
}

impl Record {
    pub fn record_type(&self) -> u32 {
        match self {
            Record::Packet(_) => TYPE_PACKET,
            Record::EventIpv4(_) => TYPE_EVENT_IPV4,
            Record::EventIpv6(_) => TYPE_EVENT_IPV6,
            Record::EventV2Ipv4(_) => TYPE_EVENT_V2_IPV4,
            Record::EventV2Ipv6(_) => TYPE_EVENT_V2_IPV6,
            Record::ExtraData(_) => TYPE_EXTRA_DATA,
            Record::Unknown(u) => u.record_type,
        }
    }

    /// `Some((sensor-id, event-id))` if this record is an event-header kind,
    /// i.e. the kind that opens a new [`crate::aggregator::Aggregator`] group.
    pub fn event_header_key(&self) -> Option<(u32, u32)> {
        match self {
            Record::EventIpv4(e)
            | Record::EventIpv6(e)
            | Record::EventV2Ipv4(e)
            | Record::EventV2Ipv6(e) => Some((e.sensor_id, e.event_id)),
            _ => None,
        }
    }

    /// `Some((sensor-id, event-id))` if this record carries a key that can be
    /// matched against an in-progress event (packet, extra-data). Unknown
    /// records never carry a recoverable key.
    pub fn associated_key(&self) -> Option<(u32, u32)> {
        match self {
            Record::Packet(p) => Some((p.sensor_id, p.event_id)),
            Record::ExtraData(d) => Some((d.sensor_id, d.event_id)),
            _ => None,
        }
    }

    /// A stable, dash-separated-key JSON view of this record, insulating
    /// generic consumers (the CLI's JSON-lines output, for instance) from
    /// the typed field layout above.
    pub fn fields(&self) -> Value {
        match self {
            Record::Packet(p) => json!({
                "type": "packet",
                "sensor-id": p.sensor_id,
                "event-id": p.event_id,
                "event-second": p.event_second,
                "packet-second": p.packet_second,
                "packet-microsecond": p.packet_microsecond,
                "linktype": p.linktype,
                "packet-length": p.packet_data.len(),
            }),
            Record::EventIpv4(e) => event_fields("event-ipv4", e),
            Record::EventIpv6(e) => event_fields("event-ipv6", e),
            Record::EventV2Ipv4(e) => event_fields("event-v2-ipv4", e),
            Record::EventV2Ipv6(e) => event_fields("event-v2-ipv6", e),
            Record::ExtraData(d) => json!({
                "type": "extra-data",
                "event-type": d.event_type,
                "event-length": d.event_length,
                "sensor-id": d.sensor_id,
                "event-id": d.event_id,
                "event-second": d.event_second,
                "data-type": d.data_type,
                "data-length": d.data.len(),
            }),
            Record::Unknown(u) => json!({
                "type": "unknown",
                "type-code": u.record_type,
                "length": u.body.len(),
            }),
        }
    }
}

fn event_fields(kind: &str, e: &EventRecord) -> Value {
    json!({
        "type": kind,
        "sensor-id": e.sensor_id,
        "event-id": e.event_id,
        "event-second": e.event_second,
        "event-microsecond": e.event_microsecond,
        "signature-id": e.signature_id,
        "generator-id": e.generator_id,
        "signature-revision": e.signature_revision,
        "classification-id": e.classification_id,
        "priority": e.priority,
        "source-ip": e.source_ip.to_string(),
        "destination-ip": e.destination_ip.to_string(),
        "source-port": e.source_port,
        "destination-port": e.destination_port,
        "protocol": e.protocol,
        "impact-flag": e.impact_flag,
        "impact": e.impact,
        "blocked": e.blocked,
        "mpls-label": e.mpls_label,
        "vlan-id": e.vlan_id,
    })
}

/// Decode one record body given its wire `type` code.
///
/// Fails with [`DecodeError::BodyTooShort`] if `body` is shorter than the
/// fixed layout for a recognized `record_type` requires. Trailing bytes past
/// the layout (or past a declared variable-length field) are tolerated and
/// ignored — they belong to a newer record shape than this decoder knows.
/// An unrecognized `record_type` is never an error: it comes back as
/// [`Record::Unknown`] with the body preserved verbatim.
pub fn decode(record_type: u32, body: &[u8]) -> std::result::Result<Record, DecodeError> {
    match record_type {
        TYPE_PACKET => decode_packet(body).map(Record::Packet),
        TYPE_EVENT_IPV4 => decode_event(body, false, false, TYPE_EVENT_IPV4).map(Record::EventIpv4),
        TYPE_EVENT_IPV6 => decode_event(body, true, false, TYPE_EVENT_IPV6).map(Record::EventIpv6),
        TYPE_EVENT_V2_IPV4 => {
            decode_event(body, false, true, TYPE_EVENT_V2_IPV4).map(Record::EventV2Ipv4)
        }
        TYPE_EVENT_V2_IPV6 => {
            decode_event(body, true, true, TYPE_EVENT_V2_IPV6).map(Record::EventV2Ipv6)
        }
        TYPE_EXTRA_DATA => decode_extra_data(body).map(Record::ExtraData),
        other => Ok(Record::Unknown(UnknownRecord {
            record_type: other,
            body: body.to_vec(),
        })),
    }
}

// The reads below are preceded by an explicit `body.len() >= fixed` check,
// so a read past that point can only fail if the check above is wrong —
// `.expect()` documents that invariant rather than hiding it behind `?`.

fn ru32(cur: &mut Cursor<&[u8]>) -> u32 {
    cur.read_u32::<BigEndian>().expect("length checked by caller")
}

fn ru16(cur: &mut Cursor<&[u8]>) -> u16 {
    cur.read_u16::<BigEndian>().expect("length checked by caller")
}

fn ru8(cur: &mut Cursor<&[u8]>) -> u8 {
    cur.read_u8().expect("length checked by caller")
}

fn r_ipv4(cur: &mut Cursor<&[u8]>) -> Ipv4Addr {
    Ipv4Addr::from(cur.read_u32::<BigEndian>().expect("length checked by caller"))
}

fn r_ipv6(cur: &mut Cursor<&[u8]>) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    cur.read_exact(&mut octets).expect("length checked by caller");
    Ipv6Addr::from(octets)
}

fn decode_packet(body: &[u8]) -> std::result::Result<PacketRecord, DecodeError> {
    const FIXED: usize = 4 * 7; // sensor-id..packet-length
    if body.len() < FIXED {
        return Err(DecodeError::BodyTooShort {
            record_type: TYPE_PACKET,
            min_len: FIXED,
            actual: body.len(),
        });
    }
    let mut cur = Cursor::new(body);
    let sensor_id = ru32(&mut cur);
    let event_id = ru32(&mut cur);
    let event_second = ru32(&mut cur);
    let packet_second = ru32(&mut cur);
    let packet_microsecond = ru32(&mut cur);
    let linktype = ru32(&mut cur);
    let packet_length = ru32(&mut cur) as usize;

    let needed = FIXED + packet_length;
    if body.len() < needed {
        return Err(DecodeError::BodyTooShort {
            record_type: TYPE_PACKET,
            min_len: needed,
            actual: body.len(),
        });
    }

    Ok(PacketRecord {
        sensor_id,
        event_id,
        event_second,
        packet_second,
        packet_microsecond,
        linktype,
        packet_data: body[FIXED..needed].to_vec(),
    })
}

fn decode_event(
    body: &[u8],
    ipv6: bool,
    v2: bool,
    record_type: u32,
) -> std::result::Result<EventRecord, DecodeError> {
    let addr_size = if ipv6 { 16 } else { 4 };
    let mut fixed = 4 * 9 + addr_size * 2 + 2 * 2 + 4;
    if v2 {
        fixed += 4 + 2 + 2;
    }
    if body.len() < fixed {
        return Err(DecodeError::BodyTooShort {
            record_type,
            min_len: fixed,
            actual: body.len(),
        });
    }

    let mut cur = Cursor::new(body);
    let sensor_id = ru32(&mut cur);
    let event_id = ru32(&mut cur);
    let event_second = ru32(&mut cur);
    let event_microsecond = ru32(&mut cur);
    let signature_id = ru32(&mut cur);
    let generator_id = ru32(&mut cur);
    let signature_revision = ru32(&mut cur);
    let classification_id = ru32(&mut cur);
    let priority = ru32(&mut cur);
    let source_ip = if ipv6 {
        IpAddr::V6(r_ipv6(&mut cur))
    } else {
        IpAddr::V4(r_ipv4(&mut cur))
    };
    let destination_ip = if ipv6 {
        IpAddr::V6(r_ipv6(&mut cur))
    } else {
        IpAddr::V4(r_ipv4(&mut cur))
    };
    let source_port = ru16(&mut cur);
    let destination_port = ru16(&mut cur);
    let protocol = ru8(&mut cur);
    let impact_flag = ru8(&mut cur);
    let impact = ru8(&mut cur);
    let blocked = ru8(&mut cur);

    let (mpls_label, vlan_id) = if v2 {
        let mpls = ru32(&mut cur);
        let vlan = ru16(&mut cur);
        let _pad = ru16(&mut cur);
        (Some(mpls), Some(vlan))
    } else {
        (None, None)
    };

    Ok(EventRecord {
        sensor_id,
        event_id,
        event_second,
        event_microsecond,
        signature_id,
        generator_id,
        signature_revision,
        classification_id,
        priority,
        source_ip,
        destination_ip,
        source_port,
        destination_port,
        protocol,
        impact_flag,
        impact,
        blocked,
        mpls_label,
        vlan_id,
    })
}

fn decode_extra_data(body: &[u8]) -> std::result::Result<ExtraDataRecord, DecodeError> {
    const FIXED: usize = 4 * 8;
    if body.len() < FIXED {
        return Err(DecodeError::BodyTooShort {
            record_type: TYPE_EXTRA_DATA,
            min_len: FIXED,
            actual: body.len(),
        });
    }
    let mut cur = Cursor::new(body);
    let event_type = ru32(&mut cur);
    let event_length = ru32(&mut cur);
    let sensor_id = ru32(&mut cur);
    let event_id = ru32(&mut cur);
    let event_second = ru32(&mut cur);
    let record_type = ru32(&mut cur);
    let data_type = ru32(&mut cur);
    let data_length = ru32(&mut cur) as usize;

    let needed = FIXED + data_length;
    if body.len() < needed {
        return Err(DecodeError::BodyTooShort {
            record_type: TYPE_EXTRA_DATA,
            min_len: needed,
            actual: body.len(),
        });
    }

    Ok(ExtraDataRecord {
        event_type,
        event_length,
        sensor_id,
        event_id,
        event_second,
        record_type,
        data_type,
        data: body[FIXED..needed].to_vec(),
    })
}
