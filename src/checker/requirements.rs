//! Consistency checks between a module's composer manifest and the
//! components its source actually uses.

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::model::{Component, FindingGroup, MessageBucket};
use crate::source::{ManifestSource, RequirementMap, VersionOracle};

use super::version;

/// Requirement name reserved for the platform runtime itself.
pub const PLATFORM_PACKAGE: &str = "php";

/// Prefix marking native extension capabilities (`ext-json`, `ext-intl`).
pub const EXTENSION_PREFIX: &str = "ext-";

/// The framework core package; declaring it is never unnecessary.
pub const FRAMEWORK_PACKAGE: &str = "magento/framework";

/// Pulled in transitively by the framework everywhere, so its absence
/// from a manifest is never reported. A hardcoded special case, not part
/// of the whitelist.
pub const CONSOLE_PACKAGE: &str = "symfony/console";

/// Tooling and installer packages that are legitimately declared without
/// ever being imported by module code.
pub const TOOLING_PACKAGES: [&str; 4] = [
    "magento/magento-composer-installer",
    "phpstan/phpstan",
    "bitexpert/phpstan-magento",
    "yireo/magento2-integration-test-helper",
];

/// Cross-references declared requirements against observed components.
///
/// One scan runs two phases: every component is checked for a matching
/// manifest entry (missing dependencies), then every manifest entry is
/// checked against the component list (unnecessary dependencies, wildcard
/// constraints, unmet platform version). All findings go to the shared
/// bucket; only a missing or unreadable manifest makes `scan` fail.
pub struct RequirementsChecker<'a> {
    manifests: &'a dyn ManifestSource,
    oracle: &'a dyn VersionOracle,
    config: &'a RuntimeConfig,
    bucket: &'a MessageBucket,
    platform_version: String,
}

impl<'a> RequirementsChecker<'a> {
    pub fn new(
        manifests: &'a dyn ManifestSource,
        oracle: &'a dyn VersionOracle,
        config: &'a RuntimeConfig,
        bucket: &'a MessageBucket,
        platform_version: impl Into<String>,
    ) -> Self {
        Self {
            manifests,
            oracle,
            config,
            bucket,
            platform_version: platform_version.into(),
        }
    }

    pub fn scan(&self, module_name: &str, components: &[Component]) -> Result<()> {
        let requirements = self.manifests.requirements_for_module(module_name)?;
        tracing::debug!(
            module = module_name,
            requirements = requirements.len(),
            components = components.len(),
            "Scanning composer requirements"
        );

        for component in components {
            self.check_component_declared(component, &requirements, module_name);
        }

        for (requirement, constraint) in &requirements {
            self.check_requirement_needed(requirement, components, module_name);
            self.check_wildcard_constraint(requirement, constraint, module_name);
            self.check_platform_version(requirement, constraint, module_name)?;
        }

        Ok(())
    }

    fn check_component_declared(
        &self,
        component: &Component,
        requirements: &RequirementMap,
        module_name: &str,
    ) {
        if component.soft {
            return;
        }

        if component
            .package_name
            .as_deref()
            .is_some_and(|name| requirements.contains_key(name))
        {
            return;
        }

        if component.package_name.as_deref() == Some(CONSOLE_PACKAGE) {
            return;
        }

        let package_name = component.display_name();
        let mut suggestion = format!("Current version is {}. ", component.version);
        if self.oracle.should_suggest_version(package_name) {
            // The hint derives from the component's own resolved version,
            // not whatever the oracle has on record for the name.
            suggestion.push_str(&format!(
                "Perhaps use {}?",
                self.oracle.suggested_version(&component.version)
            ));
        }

        self.bucket.add(
            format!("No composer dependency found for \"{package_name}\""),
            FindingGroup::MissingDependency,
            Some(suggestion),
            module_name,
        );
    }

    fn check_requirement_needed(
        &self,
        requirement: &str,
        components: &[Component],
        module_name: &str,
    ) {
        if self.config.hide_needless() {
            return;
        }

        if self.is_requirement_needed(requirement, components) {
            return;
        }

        if self.config.is_whitelisted(requirement) {
            return;
        }

        self.bucket.add(
            format!("Composer requirement \"{requirement}\" possibly not needed"),
            FindingGroup::UnnecessaryDependency,
            None,
            module_name,
        );
    }

    fn is_requirement_needed(&self, requirement: &str, components: &[Component]) -> bool {
        if components
            .iter()
            .any(|c| c.package_name.as_deref() == Some(requirement))
        {
            return true;
        }

        requirement == PLATFORM_PACKAGE
            || TOOLING_PACKAGES.contains(&requirement)
            || requirement == FRAMEWORK_PACKAGE
            || requirement.starts_with(EXTENSION_PREFIX)
    }

    fn check_wildcard_constraint(&self, requirement: &str, constraint: &str, module_name: &str) {
        if requirement.starts_with(EXTENSION_PREFIX) {
            return;
        }

        if constraint != "*" {
            return;
        }

        // Unlike the missing-dependency path, the current version is only
        // known through the oracle here.
        let current = self.oracle.version_by_name(requirement);
        let mut suggestion = String::from("Current version is set to *. ");
        if self.oracle.should_suggest_version(requirement) {
            suggestion.push_str(&format!(
                "Perhaps use {}?",
                self.oracle.suggested_version(&current)
            ));
        }

        self.bucket.add(
            format!("Composer requirement \"{requirement}\" set to wildcard version"),
            FindingGroup::WildcardVersion,
            Some(suggestion),
            module_name,
        );
    }

    fn check_platform_version(
        &self,
        requirement: &str,
        constraint: &str,
        module_name: &str,
    ) -> Result<()> {
        if requirement != PLATFORM_PACKAGE {
            return Ok(());
        }

        let current = version::parse_loose(&self.platform_version)?;
        if version::satisfies(&current, constraint)? {
            return Ok(());
        }

        self.bucket.add(
            format!(
                "Required PHP version \"{constraint}\" does not match your current PHP version {}",
                self.platform_version
            ),
            FindingGroup::UnmetRequirement,
            None,
            module_name,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::model::Finding;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeManifests {
        manifests: HashMap<String, RequirementMap>,
    }

    impl FakeManifests {
        fn with(mut self, module: &str, requirements: &[(&str, &str)]) -> Self {
            let map = requirements
                .iter()
                .map(|(name, constraint)| (name.to_string(), constraint.to_string()))
                .collect();
            self.manifests.insert(module.to_string(), map);
            self
        }
    }

    impl ManifestSource for FakeManifests {
        fn requirements_for_module(&self, module_name: &str) -> Result<RequirementMap> {
            self.manifests
                .get(module_name)
                .cloned()
                .ok_or_else(|| AuditError::ManifestNotFound {
                    module: module_name.to_string(),
                })
        }
    }

    #[derive(Default)]
    struct FakeOracle {
        versions: HashMap<String, String>,
        suggest_for: HashSet<String>,
    }

    impl FakeOracle {
        fn with_version(mut self, name: &str, version: &str) -> Self {
            self.versions.insert(name.to_string(), version.to_string());
            self
        }

        fn suggesting(mut self, name: &str) -> Self {
            self.suggest_for.insert(name.to_string());
            self
        }
    }

    impl VersionOracle for FakeOracle {
        fn should_suggest_version(&self, package_name: &str) -> bool {
            self.suggest_for.contains(package_name)
        }

        fn suggested_version(&self, version: &str) -> String {
            format!("^{version}")
        }

        fn version_by_name(&self, package_name: &str) -> String {
            self.versions.get(package_name).cloned().unwrap_or_default()
        }
    }

    const MODULE: &str = "Acme_Widget";

    fn scan(
        manifests: &FakeManifests,
        oracle: &FakeOracle,
        config: &RuntimeConfig,
        components: &[Component],
        platform: &str,
    ) -> Vec<Finding> {
        let bucket = MessageBucket::new();
        let checker = RequirementsChecker::new(manifests, oracle, config, &bucket, platform);
        checker.scan(MODULE, components).unwrap();
        bucket.findings()
    }

    #[test]
    fn test_missing_dependency_reported() {
        let manifests = FakeManifests::default().with(MODULE, &[("php", "^8.1")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components =
            vec![Component::new("Vendor_A", "1.2.3").with_package_name("vendor/module-a")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].group, FindingGroup::MissingDependency);
        assert_eq!(
            findings[0].message,
            "No composer dependency found for \"vendor/module-a\""
        );
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("Current version is 1.2.3. ")
        );
    }

    #[test]
    fn test_missing_dependency_hint_uses_component_version() {
        // The oracle knows a different version for the package; the hint
        // must still be built from the component's own version.
        let manifests = FakeManifests::default().with(MODULE, &[]);
        let oracle = FakeOracle::default()
            .with_version("vendor/module-a", "9.9.9")
            .suggesting("vendor/module-a");
        let config = RuntimeConfig::default();
        let components =
            vec![Component::new("Vendor_A", "1.2.3").with_package_name("vendor/module-a")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("Current version is 1.2.3. Perhaps use ^1.2.3?")
        );
    }

    #[test]
    fn test_soft_component_skipped() {
        let manifests = FakeManifests::default().with(MODULE, &[]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components = vec![Component::new("Vendor_A", "1.2.3")
            .with_package_name("vendor/module-a")
            .with_soft(true)];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_declared_component_skipped() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/module-a", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components =
            vec![Component::new("Vendor_A", "1.2.3").with_package_name("vendor/module-a")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_console_package_exempt() {
        let manifests = FakeManifests::default().with(MODULE, &[]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components =
            vec![Component::new("Symfony_Console", "6.4.0").with_package_name("symfony/console")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_component_without_package_name_uses_component_name() {
        let manifests = FakeManifests::default().with(MODULE, &[]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components = vec![Component::new("Acme_Lib", "0.9.0")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "No composer dependency found for \"Acme_Lib\""
        );
    }

    #[test]
    fn test_unnecessary_dependency_reported() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/unused", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].group, FindingGroup::UnnecessaryDependency);
        assert_eq!(
            findings[0].message,
            "Composer requirement \"vendor/unused\" possibly not needed"
        );
        assert_eq!(findings[0].suggestion, None);
    }

    #[test]
    fn test_used_requirement_not_reported() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/module-a", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components =
            vec![Component::new("Vendor_A", "1.2.3").with_package_name("vendor/module-a")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_fixed_whitelist_never_unnecessary() {
        let manifests = FakeManifests::default().with(
            MODULE,
            &[
                ("php", "^8.1"),
                ("magento/framework", "^103.0"),
                ("ext-json", "^1.0"),
                ("phpstan/phpstan", "^1.10"),
                ("magento/magento-composer-installer", "^0.4"),
            ],
        );
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_user_whitelist_suppresses_unnecessary() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/unused", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::new(false, vec!["vendor/unused".to_string()]);

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_hide_needless_suppresses_unnecessary() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/unused", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::new(true, Vec::new());

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_wildcard_hint_chains_oracle_lookups() {
        let manifests = FakeManifests::default().with(MODULE, &[("vendor/module-a", "*")]);
        let oracle = FakeOracle::default()
            .with_version("vendor/module-a", "2.0.0")
            .suggesting("vendor/module-a");
        let config = RuntimeConfig::default();
        // The requirement is used, so only the wildcard check fires.
        let components =
            vec![Component::new("Vendor_A", "2.0.0").with_package_name("vendor/module-a")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.1.5");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].group, FindingGroup::WildcardVersion);
        assert_eq!(
            findings[0].message,
            "Composer requirement \"vendor/module-a\" set to wildcard version"
        );
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("Current version is set to *. Perhaps use ^2.0.0?")
        );
    }

    #[test]
    fn test_wildcard_without_oracle_suggestion_has_no_hint() {
        let manifests = FakeManifests::default().with(MODULE, &[("some/pkg", "*")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::new(true, Vec::new());

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].group, FindingGroup::WildcardVersion);
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("Current version is set to *. ")
        );
        assert!(!findings[0].suggestion.as_deref().unwrap().contains("Perhaps"));
    }

    #[test]
    fn test_concrete_constraint_not_wildcard() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/module-a", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::new(true, Vec::new());

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_ext_requirement_skips_wildcard_check() {
        let manifests = FakeManifests::default().with(MODULE, &[("ext-json", "*")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.5");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_unmet_platform_requirement() {
        let manifests = FakeManifests::default().with(MODULE, &[("php", "^8.1")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();

        let findings = scan(&manifests, &oracle, &config, &[], "7.4.0");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].group, FindingGroup::UnmetRequirement);
        assert_eq!(
            findings[0].message,
            "Required PHP version \"^8.1\" does not match your current PHP version 7.4.0"
        );
        assert_eq!(findings[0].suggestion, None);
    }

    #[test]
    fn test_satisfied_platform_requirement() {
        let manifests = FakeManifests::default().with(MODULE, &[("php", ">=7.4 <8.3")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();

        let findings = scan(&manifests, &oracle, &config, &[], "8.1.2");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_finding_order_within_module() {
        let manifests = FakeManifests::default()
            .with(MODULE, &[("php", "^9.0"), ("vendor/unused", "*")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let components =
            vec![Component::new("Vendor_B", "3.1.0").with_package_name("vendor/module-b")];

        let findings = scan(&manifests, &oracle, &config, &components, "8.0.0");
        let groups: Vec<FindingGroup> = findings.iter().map(|f| f.group).collect();
        // Component findings first, then per-requirement sub-checks in
        // order: neediness, wildcard, platform version.
        assert_eq!(
            groups,
            vec![
                FindingGroup::MissingDependency,
                FindingGroup::UnmetRequirement,
                FindingGroup::UnnecessaryDependency,
                FindingGroup::WildcardVersion,
            ]
        );
    }

    #[test]
    fn test_scan_twice_doubles_findings() {
        let manifests =
            FakeManifests::default().with(MODULE, &[("vendor/unused", "^1.0")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let bucket = MessageBucket::new();
        let checker = RequirementsChecker::new(&manifests, &oracle, &config, &bucket, "8.1.5");

        checker.scan(MODULE, &[]).unwrap();
        checker.scan(MODULE, &[]).unwrap();

        let findings = bucket.findings();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0], findings[1]);
    }

    #[test]
    fn test_missing_manifest_is_hard_failure() {
        let manifests = FakeManifests::default();
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let bucket = MessageBucket::new();
        let checker = RequirementsChecker::new(&manifests, &oracle, &config, &bucket, "8.1.5");

        let err = checker.scan(MODULE, &[]).unwrap_err();
        assert!(matches!(err, AuditError::ManifestNotFound { .. }));
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_unparseable_platform_constraint_is_hard_failure() {
        let manifests = FakeManifests::default().with(MODULE, &[("php", "banana")]);
        let oracle = FakeOracle::default();
        let config = RuntimeConfig::default();
        let bucket = MessageBucket::new();
        let checker = RequirementsChecker::new(&manifests, &oracle, &config, &bucket, "8.1.5");

        let err = checker.scan(MODULE, &[]).unwrap_err();
        assert!(matches!(err, AuditError::Constraint { .. }));
    }
}
