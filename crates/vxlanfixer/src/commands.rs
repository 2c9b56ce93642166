//! Shell command builders for forwarding-table operations

use std::net::IpAddr;
use vxlanfix_common::shell;
use vxlanfix_types::MacAddress;

/// Build forwarding-table listing command for a bridge
pub fn build_fdb_show_cmd(bridge: &str) -> String {
    format!(
        "{} fdb show br {}",
        shell::BRIDGE_CMD,
        shell::shellquote(bridge)
    )
}

/// Build forwarding-table replace command
///
/// Points `mac` on `device` at the remote VTEP `dst`, creating the entry if
/// the kernel no longer has it.
pub fn build_fdb_replace_cmd(mac: &MacAddress, device: &str, dst: &IpAddr) -> String {
    format!(
        "{} fdb replace {} dev {} dst {}",
        shell::BRIDGE_CMD,
        mac,
        shell::shellquote(device),
        dst
    )
}

/// Build forwarding-table delete command
pub fn build_fdb_delete_cmd(mac: &MacAddress, device: &str) -> String {
    format!(
        "{} fdb delete {} dev {}",
        shell::BRIDGE_CMD,
        mac,
        shell::shellquote(device)
    )
}
