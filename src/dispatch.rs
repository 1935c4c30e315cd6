use crate::dns::{DnsResult, parse_dns};
use crate::error::ParseError;
use crate::packet::{IPPROTO_UDP, parse_ip};

/// UDP Header: 8 bytes
/// [0-1]: Source Port
/// [2-3]: Destination Port
/// [4-5]: Length
/// [6-7]: Checksum
const UDP_HEADER_LEN: usize = 8;

/// Extract the question name and resolved addresses from a DNS response
/// carried in an IP/UDP packet.
///
/// `packet` must start at the IP header. Ports are not checked; the packet
/// source decides which traffic gets here.
pub fn parse_ip_dns(packet: &[u8]) -> Result<DnsResult, ParseError> {
    let transport = parse_ip(packet)?;
    if transport.protocol != IPPROTO_UDP {
        return Err(ParseError::NotUdp(transport.protocol));
    }

    let payload = transport.offset + UDP_HEADER_LEN;
    if payload >= packet.len() {
        return Err(ParseError::UdpTruncated);
    }

    parse_dns(&packet[payload..])
}
