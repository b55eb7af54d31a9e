//! parse → validate → lower → build → write.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rayon::prelude::*;
use rpcgen_codegen::{Builder, BuilderRegistry, Code};
use rpcgen_parse::Project;
use rpcgen_schema::{Schema, lower_project};
use rpcgen_validate::Diagnostic;

use crate::config::{ResolvedConfig, ResolvedTarget};
use crate::{DriverError, format, load_project, writer};

/// Validate `project`. An empty result means it may be generated.
pub fn check(project: &Project) -> Vec<Diagnostic> {
    let _span = tracing::info_span!("validate").entered();
    let diagnostics = rpcgen_validate::validate(project);
    tracing::info!(
        files = project.files().count() + project.failures().len(),
        errors = diagnostics.len(),
        "validated schemas"
    );
    diagnostics
}

/// Files produced for one configured target.
#[derive(Debug)]
pub struct Generated {
    pub target: ResolvedTarget,
    pub codes: Vec<Code>,
}

/// Run every target's builder over `project`. Nothing is built unless the
/// project validates cleanly.
pub fn generate(
    project: &Project,
    targets: &[ResolvedTarget],
    registry: &BuilderRegistry,
) -> Result<Vec<Generated>, DriverError> {
    let diagnostics = check(project);
    if !diagnostics.is_empty() {
        return Err(DriverError::Invalid { diagnostics });
    }

    let mut jobs: Vec<(&ResolvedTarget, &dyn Builder)> = Vec::new();
    for target in targets {
        let builder = registry
            .get(&target.builder)
            .ok_or_else(|| DriverError::UnknownBuilder {
                name: target.builder.clone(),
                known: registry.names(),
            })?;
        jobs.push((target, builder));
    }

    let schemas: BTreeMap<&str, Vec<Schema>> = {
        let _span = tracing::info_span!("lower").entered();
        let packages: BTreeSet<&str> = targets.iter().map(|t| t.package.as_str()).collect();
        packages
            .into_iter()
            .map(|package| (package, lower_project(project, package)))
            .collect()
    };

    let _span = tracing::info_span!("build", targets = jobs.len()).entered();
    jobs.par_iter()
        .map(|(target, builder)| {
            let schemas = schemas.get(target.package.as_str()).map_or(&[][..], Vec::as_slice);
            let codes = builder.build(schemas).map_err(|source| DriverError::Codegen {
                builder: builder.name().to_string(),
                source,
            })?;
            tracing::debug!(builder = builder.name(), files = codes.len(), "built target");
            Ok(Generated {
                target: (*target).clone(),
                codes,
            })
        })
        .collect()
}

/// What `rpcgen gen` did.
#[derive(Debug, Default)]
pub struct Summary {
    pub targets: usize,
    pub files: usize,
}

/// The whole pipeline for one config file.
pub fn run(config_path: &Path) -> Result<Summary, DriverError> {
    let config = ResolvedConfig::load(config_path)?;
    let project = load_project(&config.schemas)?;
    let generated = generate(&project, &config.targets, &BuilderRegistry::with_defaults())?;

    let _span = tracing::info_span!("write").entered();
    let mut summary = Summary::default();
    for output in &generated {
        writer::write_codes(&output.target.out, &output.codes)?;
        if let Some(command) = &output.target.format {
            format::run_formatter(command, &output.target.out);
        }
        summary.targets += 1;
        summary.files += output.codes.len();
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const SCHEMA: &str = "import { t, Msg, QuerySvc } from '@rpcgen/types'\n\
        export type Point = Msg<{ x: t.float64; y: t.float64 }>\n\
        type Geo = QuerySvc<{ origin(): Point }>\n";

    fn target(builder: &str, package: &str) -> ResolvedTarget {
        ResolvedTarget {
            out: PathBuf::from("out"),
            builder: builder.to_string(),
            package: package.to_string(),
            format: None,
        }
    }

    #[test]
    fn builds_each_target() {
        let project = Project::parse([("geo.ts", SCHEMA)]);
        let targets = [target("go.chi-server", "geo"), target("ts.fetch-client", "api")];
        let generated =
            generate(&project, &targets, &BuilderRegistry::with_defaults()).unwrap();
        assert_eq!(generated.len(), 2);
        assert_eq!(generated[0].target.builder, "go.chi-server");
        assert!(generated[0].codes.iter().any(|c| c.file_name == "geo.go"));
        assert!(
            generated[0]
                .codes
                .iter()
                .any(|c| c.source.contains("package geo\n"))
        );
        assert!(generated[1].codes.iter().any(|c| c.file_name == "geo.ts"));
    }

    #[test]
    fn invalid_project_builds_nothing() {
        let project = Project::parse([("geo.ts", "type A = Msg<{ a: t.nope }>\n")]);
        let err = generate(
            &project,
            &[target("go.chi-server", "api")],
            &BuilderRegistry::with_defaults(),
        )
        .unwrap_err();
        match err {
            DriverError::Invalid { diagnostics } => assert!(!diagnostics.is_empty()),
            other => panic!("expected validation failure, got {other}"),
        }
    }

    #[test]
    fn unknown_builder_is_reported() {
        let project = Project::parse([("geo.ts", SCHEMA)]);
        let err = generate(
            &project,
            &[target("java.spring", "api")],
            &BuilderRegistry::with_defaults(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("unknown builder `java.spring` (known: ts.fetch-client, "));
    }

    #[test]
    fn run_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("schemas")).unwrap();
        std::fs::write(dir.path().join("schemas/geo.ts"), SCHEMA).unwrap();
        let config = dir.path().join("rpcgen.json");
        std::fs::write(
            &config,
            r#"{ "schemas": "schemas", "targets": [{ "out": "gen/rs", "builder": "rust.axum-server" }] }"#,
        )
        .unwrap();

        let summary = run(&config).unwrap();
        assert_eq!(summary.targets, 1);
        assert_eq!(summary.files, 4);
        for name in ["rpc.rs", "rpc_server.rs", "geo.rs", "mod.rs"] {
            assert!(dir.path().join("gen/rs").join(name).is_file(), "{name}");
        }
    }
}
