use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Finding, FindingGroup};

/// Snapshot of one audit run, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub scanned_at: DateTime<Utc>,
    pub modules: Vec<String>,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn new(modules: Vec<String>, findings: Vec<Finding>) -> Self {
        Self {
            scanned_at: Utc::now(),
            modules,
            findings,
        }
    }

    pub fn count_for_group(&self, group: FindingGroup) -> usize {
        self.findings.iter().filter(|f| f.group == group).count()
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}
