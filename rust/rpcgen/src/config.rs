//! `rpcgen.json`.

use std::path::{Path, PathBuf};

use facet::Facet;

use crate::DriverError;

pub const DEFAULT_CONFIG: &str = "rpcgen.json";
pub const DEFAULT_PACKAGE: &str = "api";

#[derive(Debug, Clone, Facet)]
pub struct Config {
    /// Directory scanned for `*.ts` schema files, relative to the config file.
    #[facet(default)]
    pub schemas: Option<String>,
    #[facet(default)]
    pub targets: Vec<TargetConfig>,
}

/// One builder run.
#[derive(Debug, Clone, Facet)]
pub struct TargetConfig {
    /// Output directory, relative to the config file.
    pub out: String,
    /// Registered builder name, e.g. `go.chi-server`.
    pub builder: String,
    /// Package name for targets that have one.
    #[facet(default)]
    pub package: Option<String>,
    /// Formatter command run in `out` after writing, e.g. `gofmt -w`.
    #[facet(default)]
    pub format: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path).map_err(|e| DriverError::io(path, e))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, DriverError> {
        facet_json::from_str::<Config>(text).map_err(|e| DriverError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A [`Config`] with every path resolved against the config file's directory.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schemas: PathBuf,
    pub targets: Vec<ResolvedTarget>,
}

#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub out: PathBuf,
    pub builder: String,
    pub package: String,
    pub format: Option<String>,
}

impl ResolvedConfig {
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        Ok(Self::resolve(path, Config::load(path)?))
    }

    pub fn resolve(path: &Path, config: Config) -> Self {
        let base = path.parent().unwrap_or(Path::new(""));
        let schemas = base.join(config.schemas.as_deref().unwrap_or("."));
        let targets = config
            .targets
            .into_iter()
            .map(|t| ResolvedTarget {
                out: base.join(&t.out),
                builder: t.builder,
                package: t.package.unwrap_or_else(|| DEFAULT_PACKAGE.to_string()),
                format: t.format.filter(|f| !f.trim().is_empty()),
            })
            .collect();
        Self { schemas, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in() {
        let path = Path::new("proj/rpcgen.json");
        let config = Config::parse(
            path,
            r#"{ "targets": [{ "out": "gen/go", "builder": "go.chi-server" }] }"#,
        )
        .unwrap();
        let resolved = ResolvedConfig::resolve(path, config);
        assert_eq!(resolved.schemas, Path::new("proj/."));
        assert_eq!(resolved.targets.len(), 1);
        assert_eq!(resolved.targets[0].out, Path::new("proj/gen/go"));
        assert_eq!(resolved.targets[0].package, "api");
        assert_eq!(resolved.targets[0].format, None);
    }

    #[test]
    fn every_field() {
        let path = Path::new("rpcgen.json");
        let config = Config::parse(
            path,
            r#"{
                "schemas": "schemas",
                "targets": [{
                    "out": "gen/ts",
                    "builder": "ts.fetch-client",
                    "package": "store",
                    "format": "npx prettier --write"
                }]
            }"#,
        )
        .unwrap();
        let resolved = ResolvedConfig::resolve(path, config);
        assert_eq!(resolved.schemas, Path::new("schemas"));
        let target = &resolved.targets[0];
        assert_eq!(target.builder, "ts.fetch-client");
        assert_eq!(target.package, "store");
        assert_eq!(target.format.as_deref(), Some("npx prettier --write"));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let err = Config::parse(Path::new("bad.json"), "{ \"targets\": 3 }").unwrap_err();
        assert!(err.to_string().starts_with("invalid config bad.json: "));
    }
}
