//! Value types shared by the VXLAN forwarding-table reconciler.
//!
//! - [`MacAddress`]: 48-bit Ethernet hardware addresses
//! - [`Endpoint`]: a hardware address paired with the locator (host IP)
//!   where it is reachable through the overlay
//! - [`EndpointSet`]: an ordered snapshot of endpoints from one source

mod endpoint;
mod mac;

pub use endpoint::{Endpoint, EndpointSet};
pub use mac::MacAddress;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid locator address: {0}")]
    InvalidLocator(String),
}
