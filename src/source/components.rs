use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{AuditError, Result};
use crate::model::Component;

use super::{ComponentSource, ProjectLayout};

/// Production [`ComponentSource`] walking a module's PHP files.
///
/// Components are the distinct packages behind the module's `use`
/// imports, resolved through the PSR-4 index. Imports of the module's own
/// classes and of global (namespace-less) names are not components. A
/// component referenced only from test directories is marked soft.
pub struct FileComponentSource<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> FileComponentSource<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    fn module_php_files(&self, module_path: &Path) -> Vec<(std::path::PathBuf, bool)> {
        let mut files = Vec::new();
        for entry in WalkDir::new(module_path).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("php") {
                continue;
            }
            let in_tests = path
                .strip_prefix(module_path)
                .ok()
                .map(is_test_path)
                .unwrap_or(false);
            files.push((path.to_path_buf(), in_tests));
        }
        files.sort();
        files
    }
}

impl ComponentSource for FileComponentSource<'_> {
    fn components_for_module(&self, module_name: &str) -> Result<Vec<Component>> {
        let module = self
            .layout
            .module(module_name)
            .ok_or_else(|| AuditError::UnknownModule(module_name.to_string()))?;

        // Keyed by package name (or component name when unresolved);
        // the flag records whether any usage sits outside test code.
        let mut found: BTreeMap<String, (Component, bool)> = BTreeMap::new();

        for (path, in_tests) in self.module_php_files(&module.path) {
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(_) => continue,
            };

            for import in imports_from_php(&content) {
                if !import.contains('\\') {
                    // Global classes like `use Exception;` are not components.
                    continue;
                }

                let (key, component) = match self.layout.package_for_class(&import) {
                    Some((package, _)) if package == module.package_name => continue,
                    Some((package, version)) => (
                        package.to_string(),
                        Component::new(component_name_for(&import), version)
                            .with_package_name(package),
                    ),
                    None => {
                        let name = component_name_for(&import);
                        (name.clone(), Component::new(name, ""))
                    }
                };

                let entry = found.entry(key).or_insert((component, false));
                entry.1 |= !in_tests;
            }
        }

        Ok(found
            .into_values()
            .map(|(mut component, used_outside_tests)| {
                component.soft = !used_outside_tests;
                component
            })
            .collect())
    }

    fn class_names_for_module(&self, module_name: &str) -> Result<Vec<String>> {
        let module = self
            .layout
            .module(module_name)
            .ok_or_else(|| AuditError::UnknownModule(module_name.to_string()))?;

        let mut names = Vec::new();
        for (path, _) in self.module_php_files(&module.path) {
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(_) => continue,
            };
            if let Some(name) = class_name_from_php(&content) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

fn is_test_path(relative: &Path) -> bool {
    relative.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("Test") | Some("Tests") | Some("tests")
        )
    })
}

/// Component identifier derived from a class name: its first two
/// namespace segments, e.g. `Magento\Store\Model\Store` -> `Magento_Store`.
fn component_name_for(class_name: &str) -> String {
    let mut segments = class_name.split('\\');
    match (segments.next(), segments.next()) {
        (Some(vendor), Some(module)) => format!("{vendor}_{module}"),
        _ => class_name.to_string(),
    }
}

/// Collects the class imports of a PHP file: plain, aliased, grouped and
/// comma-separated `use` statements up to the first type declaration.
/// Function/const imports and closure captures are ignored.
fn imports_from_php(content: &str) -> Vec<String> {
    let mut imports = Vec::new();
    let mut lines = content.lines();

    while let Some(raw) = lines.next() {
        let trimmed = raw.trim();
        if is_type_declaration(trimmed) {
            break;
        }
        if !trimmed.starts_with("use ") {
            continue;
        }

        // Group imports may span lines; pull them together first.
        let mut statement = trimmed.to_string();
        if statement.contains('{') && !statement.contains('}') {
            for continuation in lines.by_ref() {
                statement.push(' ');
                statement.push_str(continuation.trim());
                if continuation.contains('}') {
                    break;
                }
            }
        }

        let Some(rest) = statement.strip_prefix("use ") else {
            continue;
        };
        let rest = rest.trim();
        if rest.starts_with('(') || rest.starts_with("function ") || rest.starts_with("const ") {
            continue;
        }
        let Some(stmt) = rest.split(';').next() else {
            continue;
        };

        if let Some((prefix, group)) = stmt.split_once('{') {
            let prefix = prefix.trim().trim_end_matches('\\');
            for item in group.split(',') {
                let item = item.trim().trim_end_matches('}').trim();
                if item.is_empty() {
                    continue;
                }
                imports.push(format!("{prefix}\\{}", strip_alias(item)));
            }
        } else {
            for item in stmt.split(',') {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                imports.push(strip_alias(item).trim_start_matches('\\').to_string());
            }
        }
    }

    imports
}

fn strip_alias(import: &str) -> &str {
    match import.split_once(" as ") {
        Some((name, _)) => name.trim(),
        None => import.trim(),
    }
}

/// Fully qualified name of the type a PHP file declares, if any.
fn class_name_from_php(content: &str) -> Option<String> {
    let mut namespace: Option<String> = None;
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("namespace ") {
            namespace = rest.split(';').next().map(|s| s.trim().to_string());
            continue;
        }
        if let Some(name) = declared_type_name(line) {
            return Some(match &namespace {
                Some(ns) => format!("{ns}\\{name}"),
                None => name.to_string(),
            });
        }
    }
    None
}

fn declared_type_name(line: &str) -> Option<&str> {
    let stripped = line
        .trim_start_matches("final ")
        .trim_start_matches("abstract ")
        .trim_start_matches("readonly ");
    for keyword in ["class ", "interface ", "trait ", "enum "] {
        if let Some(rest) = stripped.strip_prefix(keyword) {
            let name = rest
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .next()?;
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

fn is_type_declaration(line: &str) -> bool {
    declared_type_name(line).is_some()
}
