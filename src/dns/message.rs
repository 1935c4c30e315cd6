use log::{debug, trace};

use super::name::decode_name;
use super::result::{Address, DnsName, DnsResult};
use super::types::{DnsClass, RecordType};
use crate::error::ParseError;

pub const HEADER_LEN: usize = 12;

/// DNS Header Format (RFC 1035 Section 4.1.1, 12 bytes):
/// ```text
///  0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl DnsHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let Some(hdr) = buf.get(..HEADER_LEN) else {
            return Err(ParseError::MessageTooShort(buf.len()));
        };
        let field = |i: usize| u16::from_be_bytes([hdr[i], hdr[i + 1]]);

        Ok(Self {
            id: field(0),
            flags: field(2),
            qd_count: field(4),
            an_count: field(6),
            ns_count: field(8),
            ar_count: field(10),
        })
    }
}

/// Name, type and class at the start of a question or resource record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Bytes covered on the wire, name included.
    pub len: usize,
    pub rtype: RecordType,
    pub class: DnsClass,
}

/// Decode the name at `offset` into `name` and the TYPE and CLASS behind it.
pub fn decode_entry(buf: &[u8], offset: usize, name: &mut DnsName) -> Result<Entry, ParseError> {
    let name_len = decode_name(buf, offset, name)?;

    let fixed = offset + name_len;
    let Some(fields) = buf.get(fixed..fixed + 4) else {
        return Err(ParseError::EntryTruncated { offset: fixed });
    };

    Ok(Entry {
        len: name_len + 4,
        rtype: RecordType::from_u16(u16::from_be_bytes([fields[0], fields[1]])),
        class: DnsClass::from_u16(u16::from_be_bytes([fields[2], fields[3]])),
    })
}

/// Parse a DNS response and collect the addresses it resolves.
///
/// DNS Message Format (RFC 1035 Section 4.1):
/// ```text
///     +---------------------+
///     |        Header       |  12 bytes
///     +---------------------+
///     |       Question      |  exactly one, class IN
///     +---------------------+
///     |        Answer       |  A and AAAA records are collected
///     +---------------------+
///     |      Authority      |  ignored
///     +---------------------+
///     |      Additional     |  ignored
///     +---------------------+
/// ```
///
/// The result is built from scratch, so nothing of a failed parse leaks out.
/// Answers are read best effort: the first one that does not decode ends
/// the scan and keeps what was collected before it.
pub fn parse_dns(buf: &[u8]) -> Result<DnsResult, ParseError> {
    let mut result = DnsResult::new();

    if buf.len() <= HEADER_LEN {
        return Err(ParseError::MessageTooShort(buf.len()));
    }

    let header = DnsHeader::parse(buf)?;
    if header.qd_count != 1 {
        return Err(ParseError::QuestionCount(header.qd_count));
    }
    result.id = header.id;

    let question = decode_entry(buf, HEADER_LEN, &mut result.name)?;
    if question.class != DnsClass::In {
        return Err(ParseError::QuestionClass(question.class.to_u16()));
    }
    if result.name.is_empty() {
        return Err(ParseError::EmptyName);
    }

    collect_answers(buf, HEADER_LEN + question.len, header.an_count, &mut result);

    if result.addresses.is_empty() {
        debug!(
            "DNS response {:#06x} for {} has no usable addresses",
            result.id, result.name
        );
        return Err(ParseError::NoAddresses {
            answers: header.an_count,
        });
    }

    Ok(result)
}

/// Resource Record (RR) Format (RFC 1035 Section 4.1.3):
/// ```text
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     /                      NAME                     /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     CLASS                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TTL                      |
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                   RDLENGTH                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
///     /                     RDATA                     /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
fn collect_answers(buf: &[u8], mut offset: usize, count: u16, result: &mut DnsResult) {
    let mut owner = DnsName::new();

    for index in 0..count {
        let entry = match decode_entry(buf, offset, &mut owner) {
            Ok(entry) => entry,
            Err(e) => {
                trace!("answer {index}: {e}");
                return;
            }
        };
        if entry.class != DnsClass::In {
            trace!("answer {index}: class {:?}, stopping", entry.class);
            return;
        }
        offset += entry.len;

        // TTL (4 bytes) is not interpreted, RDLENGTH follows it.
        let Some(fixed) = buf.get(offset..offset + 6) else {
            trace!("answer {index}: TTL/RDLENGTH truncated");
            return;
        };
        let rdlength = usize::from(u16::from_be_bytes([fixed[4], fixed[5]]));
        offset += 6;

        let Some(rdata) = buf.get(offset..offset + rdlength) else {
            trace!("answer {index}: RDATA of {rdlength} bytes truncated");
            return;
        };
        offset += rdlength;

        match address_from_rdata(entry.rtype, rdata) {
            Some(address) => {
                trace!("answer {index}: {owner} {} {address}", entry.rtype);
                if result.addresses.push(address).is_err() {
                    return;
                }
            }
            None => trace!("answer {index}: skipping {}", entry.rtype),
        }

        if result.addresses.is_full() {
            trace!("address list full after answer {index}");
            return;
        }
    }
}

/// TYPE A is 4 bytes, TYPE AAAA (RFC 3596) 16 bytes; any other length is
/// not an address.
fn address_from_rdata(rtype: RecordType, rdata: &[u8]) -> Option<Address> {
    if rtype.address_len() != Some(rdata.len()) {
        return None;
    }
    match rtype {
        RecordType::A => rdata.try_into().ok().map(Address::V4),
        RecordType::Aaaa => rdata.try_into().ok().map(Address::V6),
        RecordType::Other(_) => None,
    }
}
