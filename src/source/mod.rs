//! Data sources feeding the checkers.
//!
//! This module defines the boundary traits the checkers depend on and one
//! filesystem-backed production implementation of each:
//!
//! | Trait | Implementation | Backed by |
//! |-------|----------------|-----------|
//! | [`ManifestSource`] | [`ComposerManifestSource`] | the module's `composer.json` |
//! | [`ComponentSource`] | [`FileComponentSource`] | `use` imports in the module's PHP files |
//! | [`ClassInspector`] | [`FileClassInspector`] | PSR-4 lookup + docblock parsing |
//! | [`VersionOracle`] | [`InstalledVersionOracle`] | `vendor/composer/installed.json` |
//!
//! All implementations share a [`ProjectLayout`], which discovers the
//! project's modules and installed packages once per run.
//!
//! # Example
//!
//! ```no_run
//! use extaudit::source::{ComposerManifestSource, ManifestSource, ProjectLayout};
//!
//! fn main() -> anyhow::Result<()> {
//!     let layout = ProjectLayout::discover("/var/www/magento".as_ref())?;
//!     let manifests = ComposerManifestSource::new(&layout);
//!
//!     let requirements = manifests.requirements_for_module("Acme_Widget")?;
//!     for (name, constraint) in &requirements {
//!         println!("{name}: {constraint}");
//!     }
//!     Ok(())
//! }
//! ```

mod classes;
mod components;
mod manifest;
mod oracle;
mod registry;

pub use classes::FileClassInspector;
pub use components::FileComponentSource;
pub use manifest::ComposerManifestSource;
pub use oracle::InstalledVersionOracle;
pub use registry::{InstalledPackage, ModuleEntry, ProjectLayout};

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::Component;

/// Requirement name to version constraint, as declared in a manifest.
/// Map semantics keep requirement names unique; iteration is sorted.
pub type RequirementMap = BTreeMap<String, String>;

/// Access to a module's declared requirements.
pub trait ManifestSource: Send + Sync {
    /// Loads the requirement map for a module.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ManifestNotFound`](crate::AuditError::ManifestNotFound)
    /// when the module has no manifest, and an I/O or parse error when the
    /// manifest exists but cannot be read.
    fn requirements_for_module(&self, module_name: &str) -> Result<RequirementMap>;
}

/// Access to the components and class names observed in a module's source.
pub trait ComponentSource: Send + Sync {
    /// Returns the external components the module's source refers to.
    fn components_for_module(&self, module_name: &str) -> Result<Vec<Component>>;

    /// Returns the fully qualified names of the classes the module defines.
    fn class_names_for_module(&self, module_name: &str) -> Result<Vec<String>>;
}

/// Per-class facts consumed by the deprecation checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMetadata {
    pub deprecated: bool,
}

/// Outcome of a class metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassLookup {
    Resolved(ClassMetadata),
    /// The name does not resolve to an inspectable class: generated
    /// factories and proxies, virtual types, plain functions. Callers
    /// skip these and move on.
    NotAClass,
}

/// Metadata lookup for fully qualified class names.
pub trait ClassInspector: Send + Sync {
    /// Looks up a class by its fully qualified name.
    ///
    /// # Errors
    ///
    /// Returns an error only for real failures (unreadable files); an
    /// unresolvable name is the [`ClassLookup::NotAClass`] variant, not
    /// an error.
    fn inspect(&self, class_name: &str) -> Result<ClassLookup>;
}

/// Version knowledge about installed packages.
pub trait VersionOracle: Send + Sync {
    /// Whether suggesting a version for this package name makes sense.
    fn should_suggest_version(&self, package_name: &str) -> bool;

    /// The constraint to suggest for a resolved version, e.g. `^1.2`.
    fn suggested_version(&self, version: &str) -> String;

    /// The currently resolved version for a package name; empty when the
    /// package is not installed.
    fn version_by_name(&self, package_name: &str) -> String;
}
