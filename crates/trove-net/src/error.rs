use alloc::string::String;
use core::net::Ipv6Addr;
use trove_io::IoError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("'{0}' is not an IP string literal")]
    NotAnIpLiteral(String),

    #[error("not a valid URI host address: \"{0}\"")]
    InvalidUriHost(String),

    #[error("host string is empty")]
    EmptyHost,

    #[error("byte array has invalid length for an IP address: {0}")]
    InvalidLength(usize),

    #[error("address '{0}' is not IPv4-compatible")]
    NotCompat(Ipv6Addr),

    #[error("address '{0}' is not a 6to4 address")]
    Not6to4(Ipv6Addr),

    #[error("address '{0}' is not a Teredo address")]
    NotTeredo(Ipv6Addr),

    #[error("address '{0}' is not an ISATAP address")]
    NotIsatap(Ipv6Addr),

    #[error("'{0}' has no embedded IPv4 address")]
    NoEmbeddedIpv4(Ipv6Addr),

    #[error("port '{0}' is out of range (0 <= port <= 0xffff)")]
    PortOutOfRange(u32),

    #[error("flags '{0}' is out of range (0 <= flags <= 0xffff)")]
    FlagsOutOfRange(u32),

    #[error("read error: {0}")]
    Io(#[from] IoError),
}
