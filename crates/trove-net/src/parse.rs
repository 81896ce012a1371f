use crate::embedded::compat_address;
use crate::error::NetError;
use core::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use log::trace;

pub const IPV4_PART_COUNT: usize = 4;
pub const IPV6_PART_COUNT: usize = 8;

const MAPPED_PREFIX: &str = "::ffff:";

/// Parses an IPv4 or IPv6 address literal.
///
/// No name resolution is attempted. A literal naming an IPv4-mapped IPv6
/// address (`::ffff:a.b.c.d`, in any spelling) yields the IPv4 address.
pub fn for_string(text: &str) -> Result<IpAddr, NetError> {
    if let Some(addr) = text_to_v4(text) {
        return Ok(addr);
    }
    if let Some(addr) = text_to_v6(text) {
        return Ok(unmap(addr));
    }
    trace!("'{}' is neither a dotted-quad nor a colon-hex literal", text);
    Err(NetError::NotAnIpLiteral(text.into()))
}

pub fn is_inet_address(text: &str) -> bool {
    for_string(text).is_ok()
}

/// Builds an address from its network-order bytes: 4 for IPv4, 16 for IPv6.
pub fn from_bytes(bytes: &[u8]) -> Result<IpAddr, NetError> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Ok(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        return Ok(unmap(Ipv6Addr::from(octets)));
    }
    Err(NetError::InvalidLength(bytes.len()))
}

/// Interprets `address` as a big-endian IPv4 address.
pub fn from_integer(address: u32) -> Ipv4Addr {
    Ipv4Addr::from(address)
}

/// Builds an address from little-endian bytes, as some platform APIs hand
/// them out.
pub fn from_little_endian_byte_array(bytes: &[u8]) -> Result<IpAddr, NetError> {
    let mut reversed = [0u8; 16];
    let len = bytes.len();
    if len != 4 && len != 16 {
        return Err(NetError::InvalidLength(len));
    }
    for (dst, src) in reversed.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    from_bytes(&reversed[..len])
}

pub(crate) fn unmap(addr: Ipv6Addr) -> IpAddr {
    match addr.to_ipv4_mapped() {
        Some(v4) => IpAddr::V4(v4),
        None => IpAddr::V6(addr),
    }
}

// Dotted-quad path, including the `::ffff:` and `::` prefixed spellings.
fn text_to_v4(text: &str) -> Option<IpAddr> {
    let mapped = text
        .get(..MAPPED_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(MAPPED_PREFIX));
    if mapped.is_some() {
        let octets = parse_v4_octets(&text[MAPPED_PREFIX.len()..])?;
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Some(rest) = text.strip_prefix("::") {
        let octets = parse_v4_octets(rest)?;
        return Some(IpAddr::V6(compat_address(Ipv4Addr::from(octets))));
    }
    parse_v4_octets(text).map(|octets| IpAddr::V4(Ipv4Addr::from(octets)))
}

fn parse_v4_octets(text: &str) -> Option<[u8; IPV4_PART_COUNT]> {
    let mut octets = [0u8; IPV4_PART_COUNT];
    let mut parts = text.split('.');
    for octet in octets.iter_mut() {
        *octet = parse_octet(parts.next()?)?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Leading zeroes are ambiguous (octal on some platforms).
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse::<u16>()
        .ok()
        .and_then(|value| u8::try_from(value).ok())
}

fn text_to_v6(text: &str) -> Option<Ipv6Addr> {
    if !text.contains(':') || text.contains(":::") {
        return None;
    }

    let mut groups = [0u16; IPV6_PART_COUNT];
    match text.split_once("::") {
        None => {
            let (head, count) = parse_section(text, true)?;
            if count != IPV6_PART_COUNT {
                return None;
            }
            groups = head;
        }
        Some((head, tail)) => {
            if tail.contains("::") {
                return None;
            }
            let (head, head_count) = parse_section(head, false)?;
            let (tail, tail_count) = parse_section(tail, true)?;
            // `::` stands for at least one zero group.
            if head_count + tail_count >= IPV6_PART_COUNT {
                return None;
            }
            groups[..head_count].copy_from_slice(&head[..head_count]);
            groups[IPV6_PART_COUNT - tail_count..].copy_from_slice(&tail[..tail_count]);
        }
    }
    Some(Ipv6Addr::from(groups))
}

// Parses colon-separated groups. Only the final section may end with a
// dotted quad, which counts as two groups.
fn parse_section(section: &str, last: bool) -> Option<([u16; IPV6_PART_COUNT], usize)> {
    let mut groups = [0u16; IPV6_PART_COUNT];
    let mut count = 0;
    if section.is_empty() {
        return Some((groups, count));
    }

    let mut pieces = section.split(':').peekable();
    while let Some(piece) = pieces.next() {
        if last && pieces.peek().is_none() && piece.contains('.') {
            let [a, b, c, d] = parse_v4_octets(piece)?;
            for group in [u16::from_be_bytes([a, b]), u16::from_be_bytes([c, d])] {
                *groups.get_mut(count)? = group;
                count += 1;
            }
        } else {
            *groups.get_mut(count)? = parse_hex_group(piece)?;
            count += 1;
        }
    }
    Some((groups, count))
}

fn parse_hex_group(piece: &str) -> Option<u16> {
    if piece.is_empty() || piece.len() > 4 || !piece.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(piece, 16).ok()
}
