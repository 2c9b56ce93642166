//! Human-readable output printed on stdout

use std::fmt;
use vxlanfix_types::EndpointSet;

use crate::fdb::ApplyResult;
use crate::reconcile::Plan;

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub plan: Plan,
    pub outcome: ApplyResult,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Messy entries ---")?;

        if self.plan.replace.is_empty() {
            writeln!(f, "Nothing to replace")?;
        } else {
            writeln!(f, "--- To replace ---")?;
            for r in &self.plan.replace {
                writeln!(f, "{} from {} to {}", r.mac, r.from, r.to)?;
            }
        }

        if self.plan.delete.is_empty() {
            writeln!(f, "Nothing to delete")?;
        } else {
            writeln!(f)?;
            writeln!(f, "--- To remove ---")?;
            for d in &self.plan.delete {
                writeln!(f, "{}", d.mac)?;
            }
        }

        if self.outcome.dry_run {
            writeln!(
                f,
                "This is a dry run, no modifications will be made to your system"
            )?;
        } else if self.outcome.attempted > 0 {
            writeln!(
                f,
                "Applied {} of {} mutations",
                self.outcome.applied, self.outcome.attempted
            )?;
            for w in &self.outcome.warnings {
                writeln!(f, "warning: {}", w)?;
            }
        }

        Ok(())
    }
}

/// Render an endpoint set as a `mac locator` table
pub fn render_endpoints(title: &str, endpoints: &EndpointSet) -> String {
    let mut out = format!("--- {} ---\n{:17} {:10}\n", title, "mac", "locator");
    for ep in endpoints {
        out.push_str(&format!("{:17} {:10}\n", ep.mac.to_string(), ep.locator.to_string()));
    }
    out
}
