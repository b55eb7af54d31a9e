use std::path::Path;

use rpcgen_codegen::Code;

use crate::DriverError;

/// Write every file under `out`, creating directories as needed.
pub fn write_codes(out: &Path, codes: &[Code]) -> Result<(), DriverError> {
    for code in codes {
        let path = out.join(&code.file_name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| DriverError::io(dir, e))?;
        }
        std::fs::write(&path, &code.source).map_err(|e| DriverError::io(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = code.source.len(), "wrote file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen/go");
        let codes = [Code {
            file_name: "rpc.go".to_string(),
            source: "package api\n".to_string(),
        }];
        write_codes(&out, &codes).unwrap();
        assert_eq!(std::fs::read_to_string(out.join("rpc.go")).unwrap(), "package api\n");
    }

    #[test]
    fn overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let code = |source: &str| Code {
            file_name: "mod.rs".to_string(),
            source: source.to_string(),
        };
        write_codes(dir.path(), &[code("old")]).unwrap();
        write_codes(dir.path(), &[code("new")]).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("mod.rs")).unwrap(), "new");
    }
}
