use crate::error::NetError;
use bitflags::bitflags;
use core::net::{Ipv4Addr, Ipv6Addr};
use trove_io::{new_data_input, ByteArrayDataInput};

const TEREDO_PREFIX: [u8; 4] = [0x20, 0x01, 0x00, 0x00];

bitflags! {
    /// The 16-bit flags field of a Teredo address (RFC 4380 section 4).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TeredoFlags: u16 {
        /// The client is behind a cone NAT.
        const CONE = 0x8000;

        const _ = !0;
    }
}

/// The fields packed into a Teredo address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeredoInfo {
    server: Ipv4Addr,
    client: Ipv4Addr,
    port: u16,
    flags: TeredoFlags,
}

impl TeredoInfo {
    /// Missing server or client addresses default to `0.0.0.0`.
    pub fn new(
        server: Option<Ipv4Addr>,
        client: Option<Ipv4Addr>,
        port: u32,
        flags: u32,
    ) -> Result<Self, NetError> {
        let port = u16::try_from(port).map_err(|_| NetError::PortOutOfRange(port))?;
        let flags = u16::try_from(flags).map_err(|_| NetError::FlagsOutOfRange(flags))?;
        Ok(Self {
            server: server.unwrap_or(Ipv4Addr::UNSPECIFIED),
            client: client.unwrap_or(Ipv4Addr::UNSPECIFIED),
            port,
            flags: TeredoFlags::from_bits_retain(flags),
        })
    }

    pub fn server(&self) -> Ipv4Addr {
        self.server
    }

    pub fn client(&self) -> Ipv4Addr {
        self.client
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn flags(&self) -> TeredoFlags {
        self.flags
    }

    /// Packs the fields back into a `2001:0::/32` address, obfuscating the
    /// client port and address.
    pub fn to_address(&self) -> Ipv6Addr {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&TEREDO_PREFIX);
        bytes[4..8].copy_from_slice(&self.server.octets());
        bytes[8..10].copy_from_slice(&self.flags.bits().to_be_bytes());
        bytes[10..12].copy_from_slice(&(!self.port).to_be_bytes());
        bytes[12..].copy_from_slice(&(!u32::from(self.client)).to_be_bytes());
        Ipv6Addr::from(bytes)
    }
}

/// True for addresses in `2001:0000::/32`.
pub fn is_teredo_address(ip: &Ipv6Addr) -> bool {
    ip.octets()[..4] == TEREDO_PREFIX
}

pub fn get_teredo_info(ip: &Ipv6Addr) -> Result<TeredoInfo, NetError> {
    if !is_teredo_address(ip) {
        return Err(NetError::NotTeredo(*ip));
    }

    let bytes = ip.octets();
    let mut input = new_data_input(&bytes, TEREDO_PREFIX.len())?;
    let server = Ipv4Addr::from(input.read_i32()? as u32);
    let flags = input.read_u16()?;
    // The client port and address are stored bit-inverted.
    let port = !input.read_u16()?;
    let client = Ipv4Addr::from(!(input.read_i32()? as u32));

    Ok(TeredoInfo {
        server,
        client,
        port,
        flags: TeredoFlags::from_bits_retain(flags),
    })
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
    fn decodes_rfc_example() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ip = v6("2001:0000:4136:e378:8000:63bf:3fff:fdd2");
        assert!(is_teredo_address(&ip));

        let info = get_teredo_info(&ip).unwrap();
        assert_eq!(info.server(), Ipv4Addr::new(65, 54, 227, 120));
        assert_eq!(info.client(), Ipv4Addr::new(192, 0, 2, 45));
        assert_eq!(info.port(), 40000);
        assert_eq!(info.flags(), TeredoFlags::CONE);
        assert_eq!(info.to_address(), ip);
    }

    #[test]
    fn rejects_non_teredo() {
        for text in ["2001:db8::1", "2002::1", "::1"] {
            let ip = v6(text);
            assert!(!is_teredo_address(&ip));
            assert_eq!(get_teredo_info(&ip).unwrap_err(), NetError::NotTeredo(ip));
        }
    }

    #[test]
    fn new_defaults_and_range_checks() {
        let info = TeredoInfo::new(None, None, 0xffff, 0).unwrap();
        assert_eq!(info.server(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(info.client(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(info.port(), 0xffff);
        assert!(info.flags().is_empty());

        assert_eq!(
            TeredoInfo::new(None, None, 0x1_0000, 0).unwrap_err(),
            NetError::PortOutOfRange(0x1_0000)
        );
        assert_eq!(
            TeredoInfo::new(None, None, 0, 0x1_0000).unwrap_err(),
            NetError::FlagsOutOfRange(0x1_0000)
        );
    }

    #[test]
    fn unknown_flag_bits_are_kept() {
        let info = TeredoInfo::new(None, None, 1, 0x8123).unwrap();
        assert!(info.flags().contains(TeredoFlags::CONE));
        assert_eq!(info.flags().bits(), 0x8123);
        assert_eq!(get_teredo_info(&info.to_address()).unwrap(), info);
    }

    proptest! {
        #[test]
        fn embed_then_extract(
            server in any::<[u8; 4]>(),
            client in any::<[u8; 4]>(),
            port in any::<u16>(),
            flags in any::<u16>(),
        ) {
            let info = TeredoInfo::new(
                Some(Ipv4Addr::from(server)),
                Some(Ipv4Addr::from(client)),
                port.into(),
                flags.into(),
            ).unwrap();
            let ip = info.to_address();
            prop_assert!(is_teredo_address(&ip));
            prop_assert_eq!(get_teredo_info(&ip).unwrap(), info);
            prop_assert_eq!(get_teredo_info(&ip).unwrap().to_address(), ip);
        }
    }
}
