//! Reading schema files from disk.

use std::path::Path;

use rpcgen_parse::Project;

use crate::DriverError;

/// Project-relative path with `/` separators, or `None` for files under a
/// `node_modules` directory.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component.as_os_str().to_string_lossy();
        if part == "node_modules" {
            return None;
        }
        if part != "." {
            parts.push(part.into_owned());
        }
    }
    Some(parts.join("/"))
}

/// Read and parse every `*.ts` file below `root`.
pub fn load_project(root: &Path) -> Result<Project, DriverError> {
    let pattern = root.join("**").join("*.ts");
    let pattern = pattern.to_string_lossy();

    let mut sources = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            DriverError::io(path, e.into_error())
        })?;
        let Some(rel) = relative_path(root, &path) else {
            continue;
        };
        let source = std::fs::read_to_string(&path).map_err(|e| DriverError::io(&path, e))?;
        tracing::trace!(file = %rel, bytes = source.len(), "read schema file");
        sources.push((rel, source));
    }

    tracing::debug!(root = %root.display(), files = sources.len(), "loaded schema files");
    Ok(Project::parse(sources))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_relative_with_slashes() {
        let root = Path::new("schemas");
        assert_eq!(
            relative_path(root, &root.join("shared").join("geo.ts")).as_deref(),
            Some("shared/geo.ts")
        );
        assert_eq!(
            relative_path(root, &root.join("node_modules").join("x.ts")),
            None
        );
    }

    #[test]
    fn loads_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shared")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(
            dir.path().join("shared/geo.ts"),
            "export type Point = Msg<{ x: t.float64 }>\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/index.ts"), "garbage {").unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a schema").unwrap();

        let project = load_project(dir.path()).unwrap();
        assert!(project.failures().is_empty());
        assert!(project.file("shared/geo.ts").is_some());
        assert_eq!(project.files().count(), 1);
    }
}
