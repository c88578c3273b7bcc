mod deprecation;
mod requirements;
mod version;

pub use deprecation::DeprecationChecker;
pub use requirements::{
    RequirementsChecker, CONSOLE_PACKAGE, EXTENSION_PREFIX, FRAMEWORK_PACKAGE, PLATFORM_PACKAGE,
    TOOLING_PACKAGES,
};
pub use version::{parse_loose, satisfies};
