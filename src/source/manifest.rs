use std::fs;

use serde::Deserialize;

use crate::error::{AuditError, Result};

use super::{ManifestSource, ProjectLayout, RequirementMap};

/// Production [`ManifestSource`] reading each module's `composer.json`.
pub struct ComposerManifestSource<'a> {
    layout: &'a ProjectLayout,
}

#[derive(Deserialize)]
struct RequireSection {
    #[serde(default)]
    require: RequirementMap,
}

impl<'a> ComposerManifestSource<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }
}

impl ManifestSource for ComposerManifestSource<'_> {
    fn requirements_for_module(&self, module_name: &str) -> Result<RequirementMap> {
        let Some(module) = self.layout.module(module_name) else {
            return Err(AuditError::ManifestNotFound {
                module: module_name.to_string(),
            });
        };

        let path = module.path.join("composer.json");
        if !path.exists() {
            return Err(AuditError::ManifestNotFound {
                module: module_name.to_string(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| AuditError::io(&path, e))?;
        let manifest: RequireSection =
            serde_json::from_str(&content).map_err(|e| AuditError::manifest_parse(&path, e))?;
        Ok(manifest.require)
    }
}
