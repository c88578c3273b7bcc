use std::fs;

use crate::error::{AuditError, Result};

use super::{ClassInspector, ClassLookup, ClassMetadata, ProjectLayout};

/// Production [`ClassInspector`] resolving class names through PSR-4.
///
/// Names with no PSR-4 mapping, names whose mapped file is absent
/// (generated factories, proxies, virtual types) and files declaring no
/// type all resolve to [`ClassLookup::NotAClass`]. A class counts as
/// deprecated when the docblock directly above its declaration carries
/// `@deprecated`.
pub struct FileClassInspector<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> FileClassInspector<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }
}

impl ClassInspector for FileClassInspector<'_> {
    fn inspect(&self, class_name: &str) -> Result<ClassLookup> {
        let Some(path) = self.layout.file_for_class(class_name) else {
            return Ok(ClassLookup::NotAClass);
        };
        if !path.is_file() {
            // Generated code maps to files that are never on disk.
            return Ok(ClassLookup::NotAClass);
        }

        let content = fs::read_to_string(&path).map_err(|e| AuditError::io(&path, e))?;
        Ok(match deprecation_from_php(&content) {
            Some(deprecated) => ClassLookup::Resolved(ClassMetadata { deprecated }),
            None => ClassLookup::NotAClass,
        })
    }
}

/// Deprecation flag of the type a PHP file declares, or `None` when the
/// file declares no type. Only the docblock attached to the declaration
/// counts; file-level docblocks are detached by the code between them.
fn deprecation_from_php(content: &str) -> Option<bool> {
    let mut in_docblock = false;
    let mut docblock_deprecated = false;

    for raw in content.lines() {
        let line = raw.trim();

        if in_docblock {
            if line.contains("@deprecated") {
                docblock_deprecated = true;
            }
            if line.contains("*/") {
                in_docblock = false;
            }
            continue;
        }

        if line.starts_with("/**") {
            docblock_deprecated = line.contains("@deprecated");
            in_docblock = !line.contains("*/");
            continue;
        }

        if is_type_declaration(line) {
            return Some(docblock_deprecated);
        }

        // Blank lines and attributes sit between a docblock and its
        // declaration; any other code detaches the docblock.
        if !line.is_empty() && !line.starts_with("#[") && !line.starts_with("//") {
            docblock_deprecated = false;
        }
    }

    None
}

fn is_type_declaration(line: &str) -> bool {
    let stripped = line
        .trim_start_matches("final ")
        .trim_start_matches("abstract ")
        .trim_start_matches("readonly ");
    ["class ", "interface ", "trait ", "enum "]
        .iter()
        .any(|keyword| stripped.starts_with(keyword))
}
