use serde::{Deserialize, Serialize};

/// An external component observed in a module's source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Composer package providing the component, when it could be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    pub component_name: String,
    /// Resolved version of the providing package; empty when unknown.
    pub version: String,
    /// True when the component is only referenced from test code and is
    /// therefore exempt from mandatory-declaration checks.
    pub soft: bool,
}

impl Component {
    pub fn new(component_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: None,
            component_name: component_name.into(),
            version: version.into(),
            soft: false,
        }
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    pub fn with_soft(mut self, soft: bool) -> Self {
        self.soft = soft;
        self
    }

    /// Identifier shown in findings: the package name when known, the
    /// component name otherwise.
    pub fn display_name(&self) -> &str {
        self.package_name
            .as_deref()
            .unwrap_or(&self.component_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_package_name() {
        let component = Component::new("Magento_Store", "103.0.5")
            .with_package_name("magento/module-store");
        assert_eq!(component.display_name(), "magento/module-store");
    }

    #[test]
    fn test_display_name_falls_back_to_component_name() {
        let component = Component::new("Magento_Store", "103.0.5");
        assert_eq!(component.display_name(), "Magento_Store");
    }
}
