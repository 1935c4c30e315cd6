use std::fmt;

/// TYPE of a resource record. Only the address types are told apart; any
/// other value is kept as is for trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Other(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::A,
            28 => Self::Aaaa,
            n => Self::Other(n),
        }
    }

    /// RDLENGTH an address record must have.
    pub fn address_len(self) -> Option<usize> {
        match self {
            Self::A => Some(4),
            Self::Aaaa => Some(16),
            Self::Other(_) => None,
        }
    }
}

/// Mnemonic for the common types, RFC 3597 `TYPEnn` otherwise.
impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::Aaaa => f.write_str("AAAA"),
            Self::Other(5) => f.write_str("CNAME"),
            Self::Other(n) => write!(f, "TYPE{n}"),
        }
    }
}

/// DNS Classes (RFC 1035 Section 3.2.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsClass {
    /// IN: the Internet
    In,
    /// CH: Chaos
    Chaos,
    /// HS: Hesiod
    Hesiod,
    Unknown(u16),
}

impl DnsClass {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::In,
            3 => Self::Chaos,
            4 => Self::Hesiod,
            n => Self::Unknown(n),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::In => 1,
            Self::Chaos => 3,
            Self::Hesiod => 4,
            Self::Unknown(n) => n,
        }
    }
}
