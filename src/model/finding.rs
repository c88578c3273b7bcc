use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingGroup {
    MissingDependency,
    UnnecessaryDependency,
    WildcardVersion,
    UnmetRequirement,
    DeprecatedUsage,
}

impl FindingGroup {
    pub const ALL: [FindingGroup; 5] = [
        FindingGroup::MissingDependency,
        FindingGroup::UnnecessaryDependency,
        FindingGroup::WildcardVersion,
        FindingGroup::UnmetRequirement,
        FindingGroup::DeprecatedUsage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingGroup::MissingDependency => "missing_dependency",
            FindingGroup::UnnecessaryDependency => "unnecessary_dependency",
            FindingGroup::WildcardVersion => "wildcard_version",
            FindingGroup::UnmetRequirement => "unmet_requirement",
            FindingGroup::DeprecatedUsage => "deprecated_usage",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FindingGroup::MissingDependency => "Missing dependency",
            FindingGroup::UnnecessaryDependency => "Unnecessary dependency",
            FindingGroup::WildcardVersion => "Wildcard version",
            FindingGroup::UnmetRequirement => "Unmet requirement",
            FindingGroup::DeprecatedUsage => "Deprecated usage",
        }
    }
}

impl std::fmt::Display for FindingGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single diagnostic produced by one of the checkers. Write-once: the
/// bucket never mutates or removes findings after they are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub module: String,
    pub group: FindingGroup,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Append-only sink shared by all checkers in a run.
///
/// Internally locked so the host can scan modules on parallel tasks and
/// append findings without further coordination. Within one module,
/// findings keep the order in which the checks produced them.
#[derive(Debug, Default)]
pub struct MessageBucket {
    findings: Mutex<Vec<Finding>>,
}

impl MessageBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finding. Never fails.
    pub fn add(
        &self,
        message: impl Into<String>,
        group: FindingGroup,
        suggestion: Option<String>,
        module: impl Into<String>,
    ) {
        let finding = Finding {
            module: module.into(),
            group,
            message: message.into(),
            suggestion,
        };
        self.lock().push(finding);
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.lock().clone()
    }

    pub fn findings_for_module(&self, module: &str) -> Vec<Finding> {
        self.lock()
            .iter()
            .filter(|f| f.module == module)
            .cloned()
            .collect()
    }

    pub fn count_for_group(&self, group: FindingGroup) -> usize {
        self.lock().iter().filter(|f| f.group == group).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Finding>> {
        // A poisoned lock only means another scan panicked mid-append;
        // the vector itself is still valid.
        self.findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let bucket = MessageBucket::new();
        bucket.add("first", FindingGroup::MissingDependency, None, "Acme_Widget");
        bucket.add("second", FindingGroup::WildcardVersion, None, "Acme_Widget");

        let findings = bucket.findings();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "first");
        assert_eq!(findings[1].message, "second");
    }

    #[test]
    fn test_findings_for_module_filters() {
        let bucket = MessageBucket::new();
        bucket.add("a", FindingGroup::DeprecatedUsage, None, "Acme_Widget");
        bucket.add("b", FindingGroup::DeprecatedUsage, None, "Acme_Other");

        let findings = bucket.findings_for_module("Acme_Other");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "b");
    }

    #[test]
    fn test_concurrent_append() {
        use std::sync::Arc;

        let bucket = Arc::new(MessageBucket::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let bucket = Arc::clone(&bucket);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        bucket.add(
                            format!("finding {i}"),
                            FindingGroup::MissingDependency,
                            None,
                            "Acme_Widget",
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(bucket.len(), 800);
    }

    #[test]
    fn test_group_serializes_snake_case() {
        let json = serde_json::to_string(&FindingGroup::MissingDependency).unwrap();
        assert_eq!(json, "\"missing_dependency\"");
    }
}
