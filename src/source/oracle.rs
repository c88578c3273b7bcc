use crate::checker::{parse_loose, EXTENSION_PREFIX, PLATFORM_PACKAGE};

use super::{ProjectLayout, VersionOracle};

/// Prefix for system library requirements (`lib-curl`); like platform and
/// extension names, these have no installable package to suggest from.
const LIBRARY_PREFIX: &str = "lib-";

/// Production [`VersionOracle`] backed by the installed-package registry.
///
/// Suggestions are caret constraints derived from the resolved version,
/// `^major.minor`, mirroring what `composer require` would write.
pub struct InstalledVersionOracle<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> InstalledVersionOracle<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }
}

impl VersionOracle for InstalledVersionOracle<'_> {
    fn should_suggest_version(&self, package_name: &str) -> bool {
        if package_name == PLATFORM_PACKAGE
            || package_name.starts_with(EXTENSION_PREFIX)
            || package_name.starts_with(LIBRARY_PREFIX)
        {
            return false;
        }
        self.layout
            .package_version(package_name)
            .is_some_and(|version| parse_loose(version).is_ok())
    }

    fn suggested_version(&self, version: &str) -> String {
        match parse_loose(version) {
            Ok(parsed) => format!("^{}.{}", parsed.major, parsed.minor),
            Err(_) => format!("^{version}"),
        }
    }

    fn version_by_name(&self, package_name: &str) -> String {
        self.layout
            .package_version(package_name)
            .unwrap_or_default()
            .to_string()
    }
}
