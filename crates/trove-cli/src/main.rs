use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use std::io::{self, Write};
use std::net::{IpAddr, Ipv6Addr};
use trove_net::{
    for_string, for_uri_string, get_6to4_ipv4_address, get_compat_ipv4_address,
    get_embedded_ipv4_client_address, get_isatap_ipv4_address, get_teredo_info,
    to_addr_string, to_uri_string,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse address literals and print their canonical forms
    Parse {
        /// IPv4 or IPv6 literals
        #[arg(required = true)]
        addrs: Vec<String>,
    },

    /// Report which IPv4 transition schemes an IPv6 address uses
    Classify {
        /// IPv6 literal
        addr: String,
    },

    /// Parse a URI host, e.g. `[::1]` or `10.0.0.1`
    Uri {
        host: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Parse { addrs } => {
            for text in &addrs {
                let ip = for_string(text).with_context(|| format!("parsing {:?}", text))?;
                describe(&mut out, ip)?;
            }
        }
        Commands::Classify { addr } => {
            let ip = for_string(&addr).with_context(|| format!("parsing {:?}", addr))?;
            match ip {
                IpAddr::V4(v4) => bail!("{} is an IPv4 address; nothing is embedded", v4),
                IpAddr::V6(v6) => classify(&mut out, &v6)?,
            }
        }
        Commands::Uri { host } => {
            let ip = for_uri_string(&host).with_context(|| format!("parsing URI host {:?}", host))?;
            describe(&mut out, ip)?;
        }
    }

    Ok(())
}

fn describe(out: &mut impl Write, ip: IpAddr) -> io::Result<()> {
    let (family, bytes) = match ip {
        IpAddr::V4(v4) => ("IPv4", v4.octets().to_vec()),
        IpAddr::V6(v6) => ("IPv6", v6.octets().to_vec()),
    };
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();

    writeln!(out, "{}", to_addr_string(ip))?;
    writeln!(out, "  family: {}", family)?;
    writeln!(out, "  bytes:  {}", hex.join(" "))?;
    writeln!(out, "  uri:    {}", to_uri_string(ip))
}

fn classify(out: &mut impl Write, ip: &Ipv6Addr) -> io::Result<()> {
    debug!("classifying {:?}", ip);
    writeln!(out, "{}", to_addr_string(IpAddr::V6(*ip)))?;

    if let Ok(v4) = get_compat_ipv4_address(ip) {
        writeln!(out, "  compat:  {}", v4)?;
    }
    if let Ok(v4) = get_6to4_ipv4_address(ip) {
        writeln!(out, "  6to4:    {}", v4)?;
    }
    if let Ok(info) = get_teredo_info(ip) {
        writeln!(out, "  teredo:  server {}", info.server())?;
        writeln!(out, "           client {}", info.client())?;
        writeln!(out, "           port   {}", info.port())?;
        writeln!(out, "           flags  {:#06x}", info.flags().bits())?;
    }
    if let Ok(v4) = get_isatap_ipv4_address(ip) {
        writeln!(out, "  isatap:  {}", v4)?;
    }

    match get_embedded_ipv4_client_address(ip) {
        Ok(client) => writeln!(out, "  client:  {}", client),
        Err(_) => writeln!(out, "  client:  none"),
    }
}
