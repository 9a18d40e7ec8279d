//! Network interface enumeration used to seed the device fingerprint.
//!
//! On Linux the kernel's view under `/sys/class/net` is read directly, which
//! carries the IFF_UP flag. Elsewhere, or when sysfs is unreadable, the OS
//! interface table is queried through `network-interface`; there an interface
//! counts as up when it has at least one address.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use tracing::{debug, warn};

pub const SYSFS_NET: &str = "/sys/class/net";

/// IFF_UP from <net/if.h>
const IFF_UP: u32 = 0x1;

const ZERO_MAC: &str = "00:00:00:00:00:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetInterface {
    pub name: String,
    pub index: u32,
    pub up: bool,
    /// Lower-case, colon separated. Empty when the interface has no hardware address.
    pub mac: String,
}

impl NetInterface {
    /// Up, not loopback, and carrying a hardware address.
    pub fn usable(&self) -> bool {
        self.up && !self.name.starts_with("lo") && !self.mac.is_empty()
    }
}

/// One row of the OS interface table. Some platforms report a row per address.
#[derive(Debug, Clone)]
pub struct SystemEntry {
    pub name: String,
    pub index: u32,
    pub has_addr: bool,
    pub mac: Option<String>,
}

/// Interfaces of this host ordered by index. Errors read as "no interfaces".
pub fn list_interfaces() -> Vec<NetInterface> {
    let sysfs = cfg!(target_os = "linux").then(|| Path::new(SYSFS_NET));
    list_interfaces_from(sysfs)
}

fn list_interfaces_from(sysfs: Option<&Path>) -> Vec<NetInterface> {
    if let Some(root) = sysfs {
        match list_interfaces_in(root) {
            Ok(found) if !found.is_empty() => return found,
            Ok(_) => debug!(root = %root.display(), "no interfaces under sysfs"),
            Err(e) => debug!(root = %root.display(), err = %e, "sysfs unreadable"),
        }
    }
    list_system_interfaces()
}

/// Interfaces from the OS interface table, ordered by index.
pub fn list_system_interfaces() -> Vec<NetInterface> {
    match NetworkInterface::show() {
        Ok(found) => merge_entries(found.into_iter().map(|i| SystemEntry {
            has_addr: !i.addr.is_empty(),
            name: i.name,
            index: i.index,
            mac: i.mac_addr,
        })),
        Err(e) => {
            warn!(err = ?e, "listing network interfaces failed");
            Vec::new()
        }
    }
}

/// Fold table rows into one interface per name. An all-zero MAC counts as none.
pub fn merge_entries(entries: impl IntoIterator<Item = SystemEntry>) -> Vec<NetInterface> {
    let mut by_name: BTreeMap<String, NetInterface> = BTreeMap::new();
    for entry in entries {
        let mac = entry
            .mac
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty() && m != ZERO_MAC)
            .unwrap_or_default();
        let iface = by_name.entry(entry.name.clone()).or_insert_with(|| NetInterface {
            name: entry.name,
            index: entry.index,
            up: false,
            mac: String::new(),
        });
        iface.up |= entry.has_addr;
        if iface.mac.is_empty() {
            iface.mac = mac;
        }
    }
    let mut out: Vec<_> = by_name.into_values().collect();
    out.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Interfaces found under a sysfs-style directory, ordered by index.
pub fn list_interfaces_in(root: &Path) -> io::Result<Vec<NetInterface>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let dir = entry.path();

        let index = read_attr(&dir, "ifindex")
            .and_then(|s| s.parse().ok())
            .unwrap_or(u32::MAX);
        let flags = read_attr(&dir, "flags")
            .and_then(|s| u32::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .unwrap_or(0);
        let mac = read_attr(&dir, "address").unwrap_or_default().to_ascii_lowercase();

        out.push(NetInterface { name, index, up: flags & IFF_UP != 0, mac });
    }
    out.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));
    Ok(out)
}

/// MAC of the first usable interface.
pub fn first_usable_mac(interfaces: &[NetInterface]) -> Option<&str> {
    interfaces.iter().find(|i| i.usable()).map(|i| i.mac.as_str())
}

fn read_attr(dir: &Path, attr: &str) -> Option<String> {
    fs::read_to_string(dir.join(attr))
        .ok()
        .map(|s| s.trim().to_string())
}
