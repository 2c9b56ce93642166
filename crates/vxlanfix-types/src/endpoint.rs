//! Endpoints and endpoint snapshots.

use crate::{MacAddress, ParseError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;

/// A hardware address and the overlay locator it is reachable through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    /// Hardware address of the participant's virtual interface.
    pub mac: MacAddress,
    /// Host address that currently carries the hardware address.
    pub locator: IpAddr,
}

impl Endpoint {
    pub fn new(mac: MacAddress, locator: IpAddr) -> Self {
        Self { mac, locator }
    }

    /// Parses an endpoint from its textual hardware address and locator.
    pub fn parse(mac: &str, locator: &str) -> Result<Self, ParseError> {
        let mac = mac.parse()?;
        let locator = locator
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidLocator(locator.to_string()))?;
        Ok(Self { mac, locator })
    }

    /// Returns true if the locator is a loopback address (127.0.0.0/8 or ::1).
    pub fn is_loopback(&self) -> bool {
        self.locator.is_loopback()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.mac, self.locator)
    }
}

/// An immutable, ordered snapshot of endpoints taken from one source.
///
/// Source order is preserved and exact duplicates are collapsed. The same
/// hardware address may still appear with several locators; lookups by
/// hardware address return the first one inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSet {
    entries: Vec<Endpoint>,
    first_locator: HashMap<MacAddress, IpAddr>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an endpoint. Returns false if the exact pair was already present.
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        if self.entries.contains(&endpoint) {
            return false;
        }
        self.first_locator
            .entry(endpoint.mac)
            .or_insert(endpoint.locator);
        self.entries.push(endpoint);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.entries.iter()
    }

    /// Locator of the first entry carrying `mac`, if any.
    pub fn locator_of(&self, mac: &MacAddress) -> Option<IpAddr> {
        self.first_locator.get(mac).copied()
    }

    /// Hardware addresses that appear with more than one locator, in first-seen order.
    pub fn conflicting_macs(&self) -> Vec<MacAddress> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut conflicts = Vec::new();
        for ep in &self.entries {
            if !seen.insert(ep.mac) && reported.insert(ep.mac) {
                conflicts.push(ep.mac);
            }
        }
        conflicts
    }
}

impl FromIterator<Endpoint> for EndpointSet {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        let mut set = EndpointSet::new();
        for ep in iter {
            set.insert(ep);
        }
        set
    }
}

impl<'a> IntoIterator for &'a EndpointSet {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
