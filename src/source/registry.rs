use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{AuditError, Result};

/// A module found in the project.
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    /// Module identifier, e.g. `Acme_Widget`. Falls back to the composer
    /// package name when the module has no `registration.php`.
    pub name: String,
    /// Directory containing the module's `composer.json`.
    pub path: PathBuf,
    /// Composer package name declared in the module's manifest.
    pub package_name: String,
}

/// One entry from `vendor/composer/installed.json`.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub name: String,
    /// Version with any `v` prefix stripped.
    pub version: String,
}

#[derive(Debug, Clone)]
struct Psr4Entry {
    /// Namespace prefix, always with a trailing backslash.
    prefix: String,
    dir: PathBuf,
    package_name: String,
    version: String,
}

/// Everything the data sources need to know about a project: its modules,
/// the installed package registry, and a PSR-4 index spanning both.
///
/// Built once per run by walking the project root.
#[derive(Debug)]
pub struct ProjectLayout {
    root: PathBuf,
    modules: Vec<ModuleEntry>,
    installed: Vec<InstalledPackage>,
    psr4: Vec<Psr4Entry>,
}

#[derive(Deserialize)]
struct ComposerManifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    autoload: AutoloadSection,
}

#[derive(Deserialize, Default)]
struct AutoloadSection {
    #[serde(rename = "psr-4", default)]
    psr4: BTreeMap<String, Psr4Dirs>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Psr4Dirs {
    One(String),
    Many(Vec<String>),
}

impl Psr4Dirs {
    fn dirs(&self) -> Vec<&str> {
        match self {
            Psr4Dirs::One(dir) => vec![dir.as_str()],
            Psr4Dirs::Many(dirs) => dirs.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InstalledJson {
    /// Composer 2 layout: `{"packages": [...]}`.
    Modern { packages: Vec<InstalledJsonPackage> },
    /// Composer 1 layout: a bare array.
    Legacy(Vec<InstalledJsonPackage>),
}

#[derive(Deserialize)]
struct InstalledJsonPackage {
    name: String,
    version: Option<String>,
    #[serde(rename = "install-path")]
    install_path: Option<String>,
    #[serde(default)]
    autoload: AutoloadSection,
}

impl ProjectLayout {
    /// Walks the project root, collecting modules (any directory with a
    /// `composer.json` outside `vendor/`) and the installed package
    /// registry from `vendor/composer/installed.json`.
    pub fn discover(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(AuditError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "project root not found"),
            ));
        }

        let mut layout = Self {
            root: root.to_path_buf(),
            modules: Vec::new(),
            installed: Vec::new(),
            psr4: Vec::new(),
        };
        layout.load_installed()?;
        layout.find_modules();

        tracing::debug!(
            root = %root.display(),
            modules = layout.modules.len(),
            installed = layout.installed.len(),
            "Discovered project layout"
        );
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    /// Looks a module up by its identifier or its composer package name.
    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules
            .iter()
            .find(|m| m.name == name || m.package_name == name)
    }

    pub fn installed(&self) -> &[InstalledPackage] {
        &self.installed
    }

    /// Resolved version for a package name, checking installed packages
    /// first and local modules second.
    pub fn package_version(&self, name: &str) -> Option<&str> {
        if let Some(pkg) = self.installed.iter().find(|p| p.name == name) {
            return Some(pkg.version.as_str());
        }
        self.psr4
            .iter()
            .find(|e| e.package_name == name)
            .map(|e| e.version.as_str())
    }

    /// The package providing a class, via longest PSR-4 prefix match.
    /// Returns the package name and its resolved version.
    pub fn package_for_class(&self, class_name: &str) -> Option<(&str, &str)> {
        self.best_psr4_match(class_name)
            .map(|e| (e.package_name.as_str(), e.version.as_str()))
    }

    /// The file that should define a class, via PSR-4.
    pub fn file_for_class(&self, class_name: &str) -> Option<PathBuf> {
        let entry = self.best_psr4_match(class_name)?;
        let relative = class_name.strip_prefix(entry.prefix.as_str())?;
        if relative.is_empty() {
            return None;
        }
        let mut path = entry.dir.clone();
        for part in relative.split('\\') {
            path.push(part);
        }
        path.set_extension("php");
        Some(path)
    }

    fn best_psr4_match(&self, class_name: &str) -> Option<&Psr4Entry> {
        self.psr4
            .iter()
            .filter(|e| class_name.starts_with(e.prefix.as_str()))
            .max_by_key(|e| e.prefix.len())
    }

    fn load_installed(&mut self) -> Result<()> {
        let composer_dir = self.root.join("vendor").join("composer");
        let path = composer_dir.join("installed.json");
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path).map_err(|e| AuditError::io(&path, e))?;
        let parsed: InstalledJson =
            serde_json::from_str(&content).map_err(|e| AuditError::manifest_parse(&path, e))?;
        let packages = match parsed {
            InstalledJson::Modern { packages } => packages,
            InstalledJson::Legacy(packages) => packages,
        };

        for package in packages {
            let version = normalize_version(package.version.as_deref().unwrap_or(""));
            let install_dir = match &package.install_path {
                // Composer 2 records paths relative to vendor/composer.
                Some(rel) => composer_dir.join(rel),
                None => self.root.join("vendor").join(&package.name),
            };
            self.index_psr4(&package.autoload, &install_dir, &package.name, &version);
            self.installed.push(InstalledPackage {
                name: package.name,
                version,
            });
        }

        Ok(())
    }

    fn find_modules(&mut self) {
        let root = self.root.clone();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e.path(), &root));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if entry.file_name() != "composer.json" {
                continue;
            }

            let manifest_path = entry.path();
            let Some(module_dir) = manifest_path.parent() else {
                continue;
            };

            let content = match fs::read_to_string(manifest_path) {
                Ok(c) => c,
                Err(_) => continue,
            };
            let manifest: ComposerManifest = match serde_json::from_str(&content) {
                Ok(m) => m,
                Err(_) => {
                    tracing::debug!(
                        path = %manifest_path.display(),
                        "Skipping unparseable composer.json"
                    );
                    continue;
                }
            };
            let Some(package_name) = manifest.name else {
                continue;
            };

            let name = registration_module_name(module_dir).unwrap_or_else(|| package_name.clone());
            let version = normalize_version(manifest.version.as_deref().unwrap_or(""));
            self.index_psr4(&manifest.autoload, module_dir, &package_name, &version);
            self.modules.push(ModuleEntry {
                name,
                path: module_dir.to_path_buf(),
                package_name,
            });
        }

        self.modules.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn index_psr4(&mut self, autoload: &AutoloadSection, base: &Path, package: &str, version: &str) {
        for (prefix, dirs) in &autoload.psr4 {
            let mut prefix = prefix.clone();
            if !prefix.ends_with('\\') {
                prefix.push('\\');
            }
            for dir in dirs.dirs() {
                let dir = dir.trim_matches('/');
                let full = if dir.is_empty() {
                    base.to_path_buf()
                } else {
                    base.join(dir)
                };
                self.psr4.push(Psr4Entry {
                    prefix: prefix.clone(),
                    dir: full,
                    package_name: package.to_string(),
                    version: version.to_string(),
                });
            }
        }
    }
}

fn normalize_version(version: &str) -> String {
    version.trim().trim_start_matches('v').to_string()
}

fn is_skipped_dir(path: &Path, root: &Path) -> bool {
    if path == root {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !path.is_dir() {
        return false;
    }
    name.starts_with('.')
        || name == "vendor"
        || name == "generated"
        || name == "var"
        || name == "node_modules"
}

/// Pulls the module identifier out of `registration.php`, which registers
/// the module as `ComponentRegistrar::register(..., 'Vendor_Module', ...)`.
fn registration_module_name(module_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(module_dir.join("registration.php")).ok()?;
    quoted_strings(&content)
        .into_iter()
        .find(|s| looks_like_module_name(s))
        .map(str::to_string)
}

fn quoted_strings(content: &str) -> Vec<&str> {
    let mut strings = Vec::new();
    for quote in ['\'', '"'] {
        let mut parts = content.split(quote);
        // Odd-numbered segments sit between quotes. Registration files
        // contain no escaped quotes, so this split is good enough.
        parts.next();
        while let (Some(inner), next) = (parts.next(), parts.next()) {
            strings.push(inner);
            if next.is_none() {
                break;
            }
        }
    }
    strings
}

fn looks_like_module_name(s: &str) -> bool {
    let mut parts = s.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(vendor), Some(module), None) => {
            starts_uppercase(vendor)
                && starts_uppercase(module)
                && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
