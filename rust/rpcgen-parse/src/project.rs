//! A set of parsed schema files and module resolution between them.

use std::collections::BTreeMap;

use crate::ast::SourceFile;
use crate::error::ParseError;
use crate::extract::BUILTIN_MODULE;
use crate::parser::parse_file;

/// Every schema file of a project, keyed by project-relative path.
///
/// Files that fail to parse are kept as [`ParseError`]s so that one broken
/// file does not hide diagnostics for the others.
#[derive(Debug, Clone, Default)]
pub struct Project {
    files: BTreeMap<String, SourceFile>,
    failures: Vec<ParseError>,
}

/// Where an import specifier points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleResolution<'a> {
    /// The built-in types module.
    Builtin,
    File(&'a SourceFile),
    /// Well-formed relative path with no file behind it.
    NotFound,
    /// Not `./x`, `./dir/x` or `../x`.
    Invalid,
}

impl Project {
    /// Parse `(path, source)` pairs. Paths use `/` separators.
    pub fn parse<I, P, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: AsRef<str>,
    {
        let mut project = Project::default();
        for (path, source) in sources {
            let path = path.into();
            match parse_file(&path, source.as_ref()) {
                Ok(file) => {
                    project.files.insert(path, file);
                }
                Err(err) => {
                    tracing::debug!(%err, "schema file failed to parse");
                    project.failures.push(err);
                }
            }
        }
        project.failures.sort_by(|a, b| a.path.cmp(&b.path));
        project
    }

    /// Successfully parsed files, ordered by path.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn file(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn failures(&self) -> &[ParseError] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.failures.is_empty()
    }

    /// Resolve `specifier` as imported from the file at `from`.
    pub fn resolve_module(&self, from: &str, specifier: &str) -> ModuleResolution<'_> {
        if specifier == BUILTIN_MODULE {
            return ModuleResolution::Builtin;
        }
        let Some(target) = relative_target(from, specifier) else {
            return ModuleResolution::Invalid;
        };
        match self.files.get(&target) {
            Some(file) => ModuleResolution::File(file),
            None => ModuleResolution::NotFound,
        }
    }
}

/// Project path that `specifier` names, or `None` if it is not one of the
/// permitted shapes or climbs out of the project.
fn relative_target(from: &str, specifier: &str) -> Option<String> {
    let specifier = specifier.strip_suffix(".ts").unwrap_or(specifier);

    let (up, rest) = if let Some(rest) = specifier.strip_prefix("./") {
        (false, rest)
    } else if let Some(rest) = specifier.strip_prefix("../") {
        (true, rest)
    } else {
        return None;
    };

    let segments: Vec<&str> = rest.split('/').collect();
    let max_segments = if up { 1 } else { 2 };
    if segments.len() > max_segments
        || segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return None;
    }

    let mut dir: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    if up {
        dir.pop()?;
    }
    dir.extend(segments);
    Some(format!("{}.ts", dir.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::parse([
            ("users.ts", "type A = Msg<{ a: int8 }>"),
            ("shared/address.ts", "export type Address = Msg<{ street: string }>"),
            ("shared/geo.ts", "export type Point = Msg<{ x: float64 }>"),
            ("broken.ts", "type A = Msg<{"),
        ])
    }

    #[test]
    fn keeps_failures_apart() {
        let p = project();
        assert_eq!(p.files().count(), 3);
        assert_eq!(p.failures().len(), 1);
        assert_eq!(p.failures()[0].path, "broken.ts");
    }

    #[test]
    fn resolves_permitted_shapes() {
        let p = project();
        assert_eq!(
            p.resolve_module("users.ts", BUILTIN_MODULE),
            ModuleResolution::Builtin
        );
        assert!(matches!(
            p.resolve_module("users.ts", "./shared/address"),
            ModuleResolution::File(f) if f.path == "shared/address.ts"
        ));
        assert!(matches!(
            p.resolve_module("shared/address.ts", "./geo"),
            ModuleResolution::File(f) if f.path == "shared/geo.ts"
        ));
        assert!(matches!(
            p.resolve_module("shared/geo.ts", "../users"),
            ModuleResolution::File(f) if f.path == "users.ts"
        ));
    }

    #[test]
    fn rejects_other_shapes() {
        let p = project();
        assert_eq!(
            p.resolve_module("users.ts", "lodash"),
            ModuleResolution::Invalid
        );
        assert_eq!(
            p.resolve_module("users.ts", "./a/b/c"),
            ModuleResolution::Invalid
        );
        assert_eq!(
            p.resolve_module("shared/geo.ts", "../../users"),
            ModuleResolution::Invalid
        );
        assert_eq!(
            p.resolve_module("users.ts", "./missing"),
            ModuleResolution::NotFound
        );
        // `..` from the project root leaves the project.
        assert_eq!(
            p.resolve_module("users.ts", "../users"),
            ModuleResolution::Invalid
        );
    }
}
