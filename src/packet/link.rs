//! Link-layer framing in front of the IP header of captured frames.
//!
//! NFQUEUE hands over packets that already start at the IP header; pcap
//! frames carry whatever the capture device's data link type prescribes.

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_VLAN: u16 = 0x8100;

/// Data link types (tcpdump.org linktypes) we know how to strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    /// BSD loopback: 4 byte address family in host byte order.
    Null,
    /// Ethernet II, optionally with one 802.1Q tag.
    Ethernet,
    /// Bare IPv4 or IPv6 packets.
    Raw,
    /// Linux cooked capture v1 (the `any` device).
    LinuxSll,
}

impl LinkLayer {
    /// Map a pcap DLT/LINKTYPE value.
    pub fn from_linktype(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Null),
            1 => Some(Self::Ethernet),
            // DLT_RAW has two numeric values depending on the platform,
            // LINKTYPE_IPV4 and LINKTYPE_IPV6 carry the same framing.
            12 | 14 | 101 | 228 | 229 => Some(Self::Raw),
            113 => Some(Self::LinuxSll),
            _ => None,
        }
    }

    /// Return the IP packet inside `frame`, or `None` for non-IP frames.
    pub fn strip<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        match self {
            Self::Raw => Some(frame),
            Self::Null => {
                let family = frame.get(..4)?;
                // AF_INET is 2 everywhere; AF_INET6 differs per BSD.
                let family = u32::from_ne_bytes([family[0], family[1], family[2], family[3]]);
                match family {
                    2 | 10 | 24 | 28 | 30 => frame.get(4..),
                    _ => None,
                }
            }
            Self::Ethernet => strip_ethernet(frame),
            Self::LinuxSll => {
                // [0-13]: packet type, ARPHRD, address length, address
                // [14-15]: protocol (EtherType)
                let ether_type = read_u16(frame, 14)?;
                is_ip(ether_type).then(|| frame.get(16..)).flatten()
            }
        }
    }
}

/// Ethernet Frame: minimum 14 bytes
/// [0-5]: Destination MAC (6 bytes)
/// [6-11]: Source MAC (6 bytes)
/// [12-13]: EtherType (2 bytes), 0x8100 adds a 4 byte 802.1Q tag
fn strip_ethernet(frame: &[u8]) -> Option<&[u8]> {
    let mut ether_type = read_u16(frame, 12)?;
    let mut offset = 14;

    if ether_type == ETHERTYPE_VLAN {
        ether_type = read_u16(frame, 16)?;
        offset = 18;
    }

    if !is_ip(ether_type) {
        return None;
    }
    frame.get(offset..)
}

fn is_ip(ether_type: u16) -> bool {
    ether_type == ETHERTYPE_IPV4 || ether_type == ETHERTYPE_IPV6
}

fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP: [u8; 4] = [0x45, 0x00, 0x00, 0x1c];

    fn ethernet(ether_type: [u8; 2]) -> Vec<u8> {
        let mut frame = vec![0xaa; 12];
        frame.extend_from_slice(&ether_type);
        frame.extend_from_slice(&IP);
        frame
    }

    #[test]
    fn ethernet_ipv4_and_ipv6() {
        let frame = ethernet([0x08, 0x00]);
        assert_eq!(LinkLayer::Ethernet.strip(&frame), Some(&IP[..]));

        let frame = ethernet([0x86, 0xdd]);
        assert_eq!(LinkLayer::Ethernet.strip(&frame), Some(&IP[..]));
    }

    #[test]
    fn ethernet_skips_arp_and_short_frames() {
        let frame = ethernet([0x08, 0x06]);
        assert_eq!(LinkLayer::Ethernet.strip(&frame), None);
        assert_eq!(LinkLayer::Ethernet.strip(&[0u8; 13]), None);
    }

    #[test]
    fn ethernet_with_vlan_tag() {
        let mut frame = vec![0xaa; 12];
        frame.extend_from_slice(&[0x81, 0x00, 0x00, 0x2a, 0x08, 0x00]);
        frame.extend_from_slice(&IP);
        assert_eq!(LinkLayer::Ethernet.strip(&frame), Some(&IP[..]));
    }

    #[test]
    fn linux_cooked_capture() {
        let mut frame = vec![0u8; 14];
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(&IP);
        let link = LinkLayer::from_linktype(113).unwrap();
        assert_eq!(link.strip(&frame), Some(&IP[..]));
    }

    #[test]
    fn bsd_loopback() {
        let mut frame = 2u32.to_ne_bytes().to_vec();
        frame.extend_from_slice(&IP);
        assert_eq!(LinkLayer::Null.strip(&frame), Some(&IP[..]));

        let mut frame = 7u32.to_ne_bytes().to_vec();
        frame.extend_from_slice(&IP);
        assert_eq!(LinkLayer::Null.strip(&frame), None);
    }

    #[test]
    fn raw_and_unknown_linktypes() {
        assert_eq!(LinkLayer::from_linktype(101), Some(LinkLayer::Raw));
        assert_eq!(LinkLayer::Raw.strip(&IP), Some(&IP[..]));
        assert_eq!(LinkLayer::from_linktype(105), None);
    }
}
