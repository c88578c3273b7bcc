//! Deprecated-class usage checks.

use crate::error::Result;
use crate::model::{FindingGroup, MessageBucket};
use crate::source::{ClassInspector, ClassLookup, ComponentSource};

/// Reports classes whose definitions are marked deprecated.
///
/// Runs over every class name belonging to a module. Names that do not
/// resolve to an inspectable class are expected (generated factories,
/// proxies, virtual types) and are skipped without comment; real lookup
/// failures propagate.
pub struct DeprecationChecker<'a> {
    components: &'a dyn ComponentSource,
    inspector: &'a dyn ClassInspector,
    bucket: &'a MessageBucket,
}

impl<'a> DeprecationChecker<'a> {
    pub fn new(
        components: &'a dyn ComponentSource,
        inspector: &'a dyn ClassInspector,
        bucket: &'a MessageBucket,
    ) -> Self {
        Self {
            components,
            inspector,
            bucket,
        }
    }

    pub fn scan(&self, module_name: &str) -> Result<()> {
        let class_names = self.components.class_names_for_module(module_name)?;
        tracing::debug!(
            module = module_name,
            classes = class_names.len(),
            "Scanning for deprecated class usage"
        );

        for class_name in &class_names {
            let metadata = match self.inspector.inspect(class_name)? {
                ClassLookup::Resolved(metadata) => metadata,
                ClassLookup::NotAClass => continue,
            };

            if !metadata.deprecated {
                continue;
            }

            self.bucket.add(
                format!("Usage of class \"{class_name}\" is deprecated"),
                FindingGroup::DeprecatedUsage,
                None,
                module_name,
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::model::Component;
    use crate::source::ClassMetadata;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeClasses {
        class_names: Vec<String>,
    }

    impl FakeClasses {
        fn with(names: &[&str]) -> Self {
            Self {
                class_names: names.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl ComponentSource for FakeClasses {
        fn components_for_module(&self, _module_name: &str) -> Result<Vec<Component>> {
            Ok(Vec::new())
        }

        fn class_names_for_module(&self, _module_name: &str) -> Result<Vec<String>> {
            Ok(self.class_names.clone())
        }
    }

    #[derive(Default)]
    struct FakeInspector {
        // name -> None means NotAClass
        classes: HashMap<String, Option<bool>>,
        fail_on: Option<String>,
    }

    impl FakeInspector {
        fn resolved(mut self, name: &str, deprecated: bool) -> Self {
            self.classes.insert(name.to_string(), Some(deprecated));
            self
        }

        fn not_a_class(mut self, name: &str) -> Self {
            self.classes.insert(name.to_string(), None);
            self
        }

        fn failing_on(mut self, name: &str) -> Self {
            self.fail_on = Some(name.to_string());
            self
        }
    }

    impl ClassInspector for FakeInspector {
        fn inspect(&self, class_name: &str) -> Result<ClassLookup> {
            if self.fail_on.as_deref() == Some(class_name) {
                return Err(AuditError::io(
                    class_name,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ));
            }
            match self.classes.get(class_name) {
                Some(Some(deprecated)) => Ok(ClassLookup::Resolved(ClassMetadata {
                    deprecated: *deprecated,
                })),
                _ => Ok(ClassLookup::NotAClass),
            }
        }
    }

    const MODULE: &str = "Acme_Widget";

    #[test]
    fn test_deprecated_class_reported() {
        let classes = FakeClasses::with(&["Acme\\Widget\\Block\\Legacy"]);
        let inspector = FakeInspector::default().resolved("Acme\\Widget\\Block\\Legacy", true);
        let bucket = MessageBucket::new();
        let checker = DeprecationChecker::new(&classes, &inspector, &bucket);

        checker.scan(MODULE).unwrap();

        let findings = bucket.findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].group, FindingGroup::DeprecatedUsage);
        assert_eq!(
            findings[0].message,
            "Usage of class \"Acme\\Widget\\Block\\Legacy\" is deprecated"
        );
        assert_eq!(findings[0].suggestion, None);
        assert_eq!(findings[0].module, MODULE);
    }

    #[test]
    fn test_current_class_not_reported() {
        let classes = FakeClasses::with(&["Acme\\Widget\\Block\\Current"]);
        let inspector = FakeInspector::default().resolved("Acme\\Widget\\Block\\Current", false);
        let bucket = MessageBucket::new();
        let checker = DeprecationChecker::new(&classes, &inspector, &bucket);

        checker.scan(MODULE).unwrap();
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_unresolvable_name_skipped_scan_continues() {
        let classes = FakeClasses::with(&[
            "Acme\\Widget\\Model\\WidgetFactory",
            "Acme\\Widget\\Block\\Legacy",
        ]);
        let inspector = FakeInspector::default()
            .not_a_class("Acme\\Widget\\Model\\WidgetFactory")
            .resolved("Acme\\Widget\\Block\\Legacy", true);
        let bucket = MessageBucket::new();
        let checker = DeprecationChecker::new(&classes, &inspector, &bucket);

        checker.scan(MODULE).unwrap();

        // The factory produced nothing; the scan still reached the next name.
        let findings = bucket.findings();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Legacy"));
    }

    #[test]
    fn test_inspector_failure_propagates() {
        let classes = FakeClasses::with(&["Acme\\Widget\\Block\\Broken"]);
        let inspector = FakeInspector::default().failing_on("Acme\\Widget\\Block\\Broken");
        let bucket = MessageBucket::new();
        let checker = DeprecationChecker::new(&classes, &inspector, &bucket);

        let err = checker.scan(MODULE).unwrap_err();
        assert!(matches!(err, AuditError::Io { .. }));
        assert!(bucket.is_empty());
    }
}
