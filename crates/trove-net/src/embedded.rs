use crate::error::NetError;
use crate::teredo::{get_teredo_info, is_teredo_address};
use core::net::{Ipv4Addr, Ipv6Addr};

const SIXTOFOUR_PREFIX: [u8; 2] = [0x20, 0x02];
const ISATAP_MARKER: [u8; 3] = [0x00, 0x5e, 0xfe];

fn ipv4_at(bytes: &[u8; 16], start: usize) -> Ipv4Addr {
    Ipv4Addr::new(
        bytes[start],
        bytes[start + 1],
        bytes[start + 2],
        bytes[start + 3],
    )
}

/// True for `::a.b.c.d`, excluding `::` and `::1`.
pub fn is_compat_ipv4_address(ip: &Ipv6Addr) -> bool {
    let bytes = ip.octets();
    if bytes[..12].iter().any(|&b| b != 0) {
        return false;
    }
    !matches!(&bytes[12..], [0, 0, 0, 0] | [0, 0, 0, 1])
}

pub fn get_compat_ipv4_address(ip: &Ipv6Addr) -> Result<Ipv4Addr, NetError> {
    if !is_compat_ipv4_address(ip) {
        return Err(NetError::NotCompat(*ip));
    }
    Ok(ipv4_at(&ip.octets(), 12))
}

/// Embeds `ip` in the low 32 bits of an otherwise zero address.
pub fn compat_address(ip: Ipv4Addr) -> Ipv6Addr {
    let mut bytes = [0u8; 16];
    bytes[12..].copy_from_slice(&ip.octets());
    Ipv6Addr::from(bytes)
}

/// True for addresses in `2002::/16` (RFC 3056).
pub fn is_6to4_address(ip: &Ipv6Addr) -> bool {
    ip.octets()[..2] == SIXTOFOUR_PREFIX
}

pub fn get_6to4_ipv4_address(ip: &Ipv6Addr) -> Result<Ipv4Addr, NetError> {
    if !is_6to4_address(ip) {
        return Err(NetError::Not6to4(*ip));
    }
    Ok(ipv4_at(&ip.octets(), 2))
}

/// The `2002:v4::` site prefix of the 6to4 router at `ip`, with zero subnet
/// and interface identifier.
pub fn sixtofour_address(ip: Ipv4Addr) -> Ipv6Addr {
    let mut bytes = [0u8; 16];
    bytes[..2].copy_from_slice(&SIXTOFOUR_PREFIX);
    bytes[2..6].copy_from_slice(&ip.octets());
    Ipv6Addr::from(bytes)
}

/// True for ISATAP interface identifiers (RFC 5214): `::0:5efe:a.b.c.d` with
/// any prefix, ignoring the U/L and G bits.
///
/// A Teredo address whose obfuscated port happens to read `5efe` is not
/// ISATAP.
pub fn is_isatap_address(ip: &Ipv6Addr) -> bool {
    if is_teredo_address(ip) {
        return false;
    }
    let bytes = ip.octets();
    if bytes[8] | 0x03 != 0x03 {
        return false;
    }
    bytes[9..12] == ISATAP_MARKER
}

pub fn get_isatap_ipv4_address(ip: &Ipv6Addr) -> Result<Ipv4Addr, NetError> {
    if !is_isatap_address(ip) {
        return Err(NetError::NotIsatap(*ip));
    }
    Ok(ipv4_at(&ip.octets(), 12))
}

/// The IPv4 address of the client behind `ip`, checking compat, 6to4 and
/// Teredo in that order. ISATAP is not consulted: its embedded address
/// belongs to the tunnel endpoint, not the client.
pub fn get_embedded_ipv4_client_address(ip: &Ipv6Addr) -> Result<Ipv4Addr, NetError> {
    if is_compat_ipv4_address(ip) {
        return get_compat_ipv4_address(ip);
    }
    if is_6to4_address(ip) {
        return get_6to4_ipv4_address(ip);
    }
    if is_teredo_address(ip) {
        return Ok(get_teredo_info(ip)?.client());
    }
    Err(NetError::NoEmbeddedIpv4(*ip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::for_string;
    use core::net::IpAddr;
    use proptest::prelude::*;

    fn v6(text: &str) -> Ipv6Addr {
        match for_string(text) {
            Ok(IpAddr::V6(addr)) => addr,
            other => panic!("{} parsed as {:?}", text, other),
        }
    }

    #[test]
    fn compat_classification() {
        let ip = v6("::192.168.0.1");
        assert!(is_compat_ipv4_address(&ip));
        assert_eq!(
            get_compat_ipv4_address(&ip).unwrap(),
            Ipv4Addr::new(192, 168, 0, 1)
        );

        for not_compat in ["::", "::1", "::1:0:0:1", "1::1.2.3.4", "2002:c0a8:101::1"] {
            assert!(!is_compat_ipv4_address(&v6(not_compat)), "{}", not_compat);
        }
        assert_eq!(
            get_compat_ipv4_address(&Ipv6Addr::LOCALHOST).unwrap_err(),
            NetError::NotCompat(Ipv6Addr::LOCALHOST)
        );
    }

    #[test]
    fn sixtofour_classification() {
        let ip = v6("2002:c0a8:0101::1");
        assert!(is_6to4_address(&ip));
        assert_eq!(
            get_6to4_ipv4_address(&ip).unwrap(),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        assert!(!is_6to4_address(&v6("2001:c0a8:0101::1")));
        assert!(get_6to4_ipv4_address(&v6("2003::")).is_err());
    }

    #[test]
    fn isatap_classification() {
        for ok in [
            "2001:db8::5efe:102:304",
            "2001:db8::100:5efe:102:304",
            "2001:db8::200:5efe:102:304",
            "2001:db8::300:5efe:102:304",
        ] {
            let ip = v6(ok);
            assert!(is_isatap_address(&ip), "{}", ok);
            assert_eq!(
                get_isatap_ipv4_address(&ip).unwrap(),
                Ipv4Addr::new(1, 2, 3, 4)
            );
        }

        for not_isatap in [
            "::1",
            "2001:db8::0400:5efe:102:304",
            "2001:db8::5efd:102:304",
            // Teredo with port 41217 obfuscates to 5efe
            "2001:0:4136:e378:0:5efe:3f57:fefe",
        ] {
            let ip = v6(not_isatap);
            assert!(!is_isatap_address(&ip), "{}", not_isatap);
            assert_eq!(
                get_isatap_ipv4_address(&ip).unwrap_err(),
                NetError::NotIsatap(ip)
            );
        }
    }

    #[test]
    fn embedded_client_address() {
        assert_eq!(
            get_embedded_ipv4_client_address(&v6("::1.2.3.4")).unwrap(),
            Ipv4Addr::new(1, 2, 3, 4)
        );
        assert_eq!(
            get_embedded_ipv4_client_address(&v6("2002:0102:0304::1")).unwrap(),
            Ipv4Addr::new(1, 2, 3, 4)
        );
        assert_eq!(
            get_embedded_ipv4_client_address(&v6("2001:0000:4136:e378:8000:63bf:3fff:fdd2"))
                .unwrap(),
            Ipv4Addr::new(192, 0, 2, 45)
        );

        let isatap = v6("2001:db8::5efe:102:304");
        assert_eq!(
            get_embedded_ipv4_client_address(&isatap).unwrap_err(),
            NetError::NoEmbeddedIpv4(isatap)
        );
    }

    proptest! {
        #[test]
        fn compat_extract_then_embed(octets in any::<[u8; 4]>()) {
            let v4 = Ipv4Addr::from(octets);
            let ip = compat_address(v4);
            prop_assume!(is_compat_ipv4_address(&ip));
            let extracted = get_compat_ipv4_address(&ip).unwrap();
            prop_assert_eq!(compat_address(extracted), ip);
        }

        #[test]
        fn sixtofour_extract_then_embed(octets in any::<[u8; 4]>()) {
            let v4 = Ipv4Addr::from(octets);
            let ip = sixtofour_address(v4);
            prop_assert!(is_6to4_address(&ip));
            prop_assert_eq!(get_6to4_ipv4_address(&ip).unwrap(), v4);
            prop_assert_eq!(get_embedded_ipv4_client_address(&ip).unwrap(), v4);
        }

        #[test]
        fn extraction_requires_classification(octets in any::<[u8; 16]>()) {
            let ip = Ipv6Addr::from(octets);
            prop_assert_eq!(is_compat_ipv4_address(&ip), get_compat_ipv4_address(&ip).is_ok());
            prop_assert_eq!(is_6to4_address(&ip), get_6to4_ipv4_address(&ip).is_ok());
            prop_assert_eq!(is_isatap_address(&ip), get_isatap_ipv4_address(&ip).is_ok());
            prop_assert_eq!(is_teredo_address(&ip), get_teredo_info(&ip).is_ok());
        }
    }
}
