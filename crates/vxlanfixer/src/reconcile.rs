//! Reconciler - diffs the canonical and observed endpoint sets
//!
//! Two rules produce the correction plan:
//!
//! 1. **Replace**: an observed entry whose hardware address is known to the
//!    directory but points at a different locator is redirected to the
//!    directory's locator. Entries pointing at loopback are left alone.
//! 2. **Delete**: an observed entry whose hardware address the directory
//!    does not know is removed. Loopback entries are not exempt here.
//!
//! Entries present in the directory but missing from the kernel table are
//! never added. The two lists are disjoint on hardware address, so the
//! order in which they are applied does not change the final table.

use std::net::IpAddr;
use vxlanfix_types::{EndpointSet, MacAddress};

/// Redirect `mac` from the locator the kernel holds to the canonical one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    pub mac: MacAddress,
    pub from: IpAddr,
    pub to: IpAddr,
}

/// Remove the stale entry for `mac`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub mac: MacAddress,
}

/// Correction plan for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub replace: Vec<Replacement>,
    pub delete: Vec<Deletion>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.replace.is_empty() && self.delete.is_empty()
    }

    /// Number of mutations needed to apply the plan
    pub fn len(&self) -> usize {
        self.replace.len() + self.delete.len()
    }
}

/// Compute the correction plan that brings `observed` in line with `canonical`.
///
/// When the directory lists one hardware address with several locators the
/// first one listed is authoritative. Plan entries follow the order of
/// `observed`.
pub fn compute_plan(canonical: &EndpointSet, observed: &EndpointSet) -> Plan {
    let mut plan = Plan::default();

    for entry in observed {
        match canonical.locator_of(&entry.mac) {
            Some(wanted) => {
                if entry.locator != wanted && !entry.is_loopback() {
                    plan.replace.push(Replacement {
                        mac: entry.mac,
                        from: entry.locator,
                        to: wanted,
                    });
                }
            }
            None => {
                if !plan.delete.iter().any(|d| d.mac == entry.mac) {
                    plan.delete.push(Deletion { mac: entry.mac });
                }
            }
        }
    }

    plan
}
