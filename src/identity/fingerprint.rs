//! Device and application id derivation.
//!
//! `device_id = prefix + hex(SHA1(seed "-" hostname "-" os "-" arch))` and
//! `app_id = "mcp-" + hex(MD5("mcp-" + device_id))`. The prefix tells the
//! cloud service whether the seed was a MAC address or a generated UUID.

use std::process::Command;

use md5::Md5;
use sha1::{Digest, Sha1};

use crate::identity::interfaces::{first_usable_mac, NetInterface};

pub const MAC_PREFIX: &str = "mcp0.";
pub const GENERATED_PREFIX: &str = "mcp1.";
pub const APP_ID_PREFIX: &str = "mcp-";

/// Seed material for the device id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSeed {
    Mac(String),
    Generated(String),
}

impl DeviceSeed {
    /// MAC of the first usable interface, or a fresh random UUID.
    pub fn from_interfaces(interfaces: &[NetInterface]) -> Self {
        match first_usable_mac(interfaces) {
            Some(mac) => DeviceSeed::Mac(mac.to_string()),
            None => DeviceSeed::Generated(uuid::Uuid::new_v4().to_string()),
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            DeviceSeed::Mac(_) => MAC_PREFIX,
            DeviceSeed::Generated(_) => GENERATED_PREFIX,
        }
    }

    pub fn material(&self) -> &str {
        match self {
            DeviceSeed::Mac(s) | DeviceSeed::Generated(s) => s,
        }
    }
}

pub fn device_id(seed: &DeviceSeed, hostname: &str, platform: &str) -> String {
    let base = [seed.material(), hostname, platform].join("-");
    format!("{}{}", seed.prefix(), hex::encode(Sha1::digest(base.as_bytes())))
}

pub fn app_id(device_id: &str) -> String {
    let digest = Md5::digest(format!("{}{}", APP_ID_PREFIX, device_id).as_bytes());
    format!("{}{}", APP_ID_PREFIX, hex::encode(digest))
}

/// `os-arch` using the platform names the cloud service already knows
/// (`linux-amd64`, `darwin-arm64`, ...).
pub fn host_platform() -> String {
    platform_name(std::env::consts::OS, std::env::consts::ARCH)
}

pub fn platform_name(os: &str, arch: &str) -> String {
    let os = match os {
        "macos" => "darwin",
        other => other,
    };
    let arch = match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    };
    format!("{}-{}", os, arch)
}

/// Kernel hostname, empty when it cannot be determined.
pub fn hostname() -> String {
    if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    Command::new("hostname")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, index: u32, up: bool, mac: &str) -> NetInterface {
        NetInterface { name: name.into(), index, up, mac: mac.into() }
    }

    #[test]
    fn test_device_id_known_value() {
        let seed = DeviceSeed::Mac("aa:bb:cc:dd:ee:ff".into());
        let id = device_id(&seed, "host", "linux-amd64");
        let expected = hex::encode(Sha1::digest(b"aa:bb:cc:dd:ee:ff-host-linux-amd64"));
        assert_eq!(id, format!("mcp0.{}", expected));
        assert_eq!(id.len(), MAC_PREFIX.len() + 40);
    }

    #[test]
    fn test_device_id_is_stable() {
        let ifaces = vec![
            iface("lo", 1, true, "00:00:00:00:00:00"),
            iface("eth0", 2, true, "aa:bb:cc:dd:ee:ff"),
        ];
        let a = device_id(&DeviceSeed::from_interfaces(&ifaces), "box", "linux-arm64");
        let b = device_id(&DeviceSeed::from_interfaces(&ifaces), "box", "linux-arm64");
        assert_eq!(a, b);
        assert!(a.starts_with(MAC_PREFIX));
    }

    #[test]
    fn test_fallback_seed_uses_generated_prefix() {
        let ifaces = vec![
            iface("lo", 1, true, "00:00:00:00:00:00"),
            iface("eth0", 2, false, "aa:bb:cc:dd:ee:ff"),
        ];
        let seed = DeviceSeed::from_interfaces(&ifaces);
        assert!(matches!(seed, DeviceSeed::Generated(_)));

        let id = device_id(&seed, "", "linux-amd64");
        assert!(id.starts_with(GENERATED_PREFIX));
        let digest = &id[GENERATED_PREFIX.len()..];
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

        let seed = DeviceSeed::from_interfaces(&[]);
        assert_eq!(seed.prefix(), GENERATED_PREFIX);
    }

    #[test]
    fn test_app_id_derivation() {
        let id = app_id("mcp0.abc");
        let expected = hex::encode(Md5::digest(b"mcp-mcp0.abc"));
        assert_eq!(id, format!("mcp-{}", expected));
        assert_eq!(app_id("mcp0.abc"), id);
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(platform_name("linux", "x86_64"), "linux-amd64");
        assert_eq!(platform_name("macos", "aarch64"), "darwin-arm64");
        assert_eq!(platform_name("windows", "x86"), "windows-386");
        assert_eq!(platform_name("linux", "riscv64"), "linux-riscv64");
    }
}
