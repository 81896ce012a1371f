use crate::error::NetError;
use crate::parse::{for_string, IPV6_PART_COUNT};
use alloc::string::{String, ToString};
use core::fmt::Write;
use core::net::{IpAddr, Ipv6Addr};

/// Renders `ip` as text that [`for_string`] parses back to the same bytes.
///
/// IPv6 follows RFC 5952: lowercase hex without leading zeroes, and the
/// longest run of two or more zero groups (the first, on a tie) written as
/// `::`. Unlike `Display`, no form is written as a dotted quad.
pub fn to_addr_string(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => v6_to_string(&v6),
    }
}

/// Like [`to_addr_string`], with IPv6 addresses in brackets for use as the
/// host part of a URI (RFC 3986).
pub fn to_uri_string(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(_) => to_addr_string(ip),
        IpAddr::V6(v6) => {
            let mut out = String::with_capacity(41);
            out.push('[');
            out.push_str(&v6_to_string(&v6));
            out.push(']');
            out
        }
    }
}

/// Parses a URI host: a bare IPv4 literal or a bracketed IPv6 literal.
pub fn for_uri_string(host: &str) -> Result<IpAddr, NetError> {
    if host.is_empty() {
        return Err(NetError::EmptyHost);
    }

    if let Ok(addr @ IpAddr::V4(_)) = for_string(host) {
        return Ok(addr);
    }

    let inner = host
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| NetError::InvalidUriHost(host.into()))?;
    match for_string(inner) {
        Ok(addr @ IpAddr::V6(_)) => Ok(addr),
        _ => Err(NetError::InvalidUriHost(host.into())),
    }
}

pub fn is_uri_inet_address(host: &str) -> bool {
    for_uri_string(host).is_ok()
}

fn v6_to_string(ip: &Ipv6Addr) -> String {
    let groups = ip.segments();
    let (start, len) = longest_zero_run(&groups);

    let mut out = String::with_capacity(39);
    if len < 2 {
        write_groups(&mut out, &groups);
    } else {
        write_groups(&mut out, &groups[..start]);
        out.push_str("::");
        write_groups(&mut out, &groups[start + len..]);
    }
    out
}

fn longest_zero_run(groups: &[u16; IPV6_PART_COUNT]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut run_start = 0;
    let mut run_len = 0;
    for (i, &group) in groups.iter().enumerate() {
        if group == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len > best.1 {
                best = (run_start, run_len);
            }
        } else {
            run_len = 0;
        }
    }
    best
}

fn write_groups(out: &mut String, groups: &[u16]) {
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "{:x}", group);
    }
}
