use thiserror::Error;

/// Failures of the IP layer parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IpError {
    #[error("empty packet")]
    Empty,
    #[error("unsupported IP version {0}")]
    UnsupportedVersion(u8),
    #[error("IPv4 header length {header_len} invalid for {packet_len} byte packet")]
    BadHeaderLength { header_len: usize, packet_len: usize },
    #[error("IPv6 packet too short: {0} bytes")]
    Ipv6TooShort(usize),
    #[error("IPv6 extension header truncated at offset {offset}")]
    ExtensionTruncated { offset: usize },
    #[error("IPv6 extension header at offset {offset} claims {len} bytes")]
    ExtensionOverrun { offset: usize, len: usize },
}

/// Failures of the DNS name decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name runs past end of message at offset {offset}")]
    Truncated { offset: usize },
    #[error("label at offset {offset} runs past end of message")]
    LabelOverrun { offset: usize },
    #[error("compression pointer at offset {offset} is truncated")]
    PointerTruncated { offset: usize },
    #[error("compression pointer to {target} not below {limit}")]
    ForwardPointer { target: usize, limit: usize },
    #[error("name longer than 255 bytes")]
    TooLong,
    #[error("name contains a NUL byte")]
    EmbeddedNul,
    #[error("name is the bare root")]
    Empty,
}

/// Coarse classification of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Truncated or internally inconsistent bytes.
    Malformed,
    /// Well-formed, but nothing this system can act on.
    Unusable,
}

/// Failures of the IP/UDP/DNS pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Ip(#[from] IpError),
    #[error("transport protocol {0} is not UDP")]
    NotUdp(u8),
    #[error("UDP datagram carries no payload")]
    UdpTruncated,
    #[error("DNS message too short: {0} bytes")]
    MessageTooShort(usize),
    #[error("expected exactly one question, found {0}")]
    QuestionCount(u16),
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("type and class missing after name at offset {offset}")]
    EntryTruncated { offset: usize },
    #[error("question class {0} is not IN")]
    QuestionClass(u16),
    #[error("question name is empty")]
    EmptyName,
    #[error("no A or AAAA records among {answers} answers")]
    NoAddresses { answers: u16 },
}

impl ParseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotUdp(_)
            | Self::QuestionCount(_)
            | Self::QuestionClass(_)
            | Self::EmptyName
            | Self::NoAddresses { .. } => FailureKind::Unusable,
            Self::Ip(IpError::UnsupportedVersion(_)) => FailureKind::Unusable,
            Self::Ip(_)
            | Self::UdpTruncated
            | Self::MessageTooShort(_)
            | Self::Name(_)
            | Self::EntryTruncated { .. } => FailureKind::Malformed,
        }
    }
}
