//! MAC address type with safe parsing and formatting.

use crate::ParseError;
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// Comparison is on the raw octets, so textual case differences between
/// sources (`02:42:AC:...` from one, `02:42:ac:...` from another) collapse
/// to the same key.
///
/// # Examples
///
/// ```
/// use vxlanfix_types::MacAddress;
///
/// let mac: MacAddress = "02:42:0A:00:00:03".parse().unwrap();
/// assert_eq!(mac.to_string(), "02:42:0a:00:00:03");
///
/// let mac2: MacAddress = "02-42-0a-00-00-03".parse().unwrap();
/// assert_eq!(mac, mac2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());
        let separator = if s.contains(':') { ':' } else { '-' };

        let mut bytes = [0u8; 6];
        let mut count = 0;
        for part in s.trim().split(separator) {
            if count == 6 || part.is_empty() || part.len() > 2 {
                return Err(invalid());
            }
            if !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            bytes[count] = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            count += 1;
        }

        if count != 6 {
            return Err(invalid());
        }
        Ok(MacAddress(bytes))
    }
}
