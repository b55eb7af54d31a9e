//! Every schema file must generate files of its own.

use std::collections::BTreeMap;

use rpcgen_parse::{Project, Span};
use rpcgen_schema::{RUNTIME_FILE_NAMES, schema_file_name};

use crate::Diagnostic;

pub(crate) fn check(project: &Project, out: &mut Vec<Diagnostic>) {
    let paths = project
        .files()
        .map(|f| f.path.as_str())
        .chain(project.failures().iter().map(|e| e.path.as_str()));

    let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for path in paths {
        owners.entry(schema_file_name(path)).or_default().push(path);
    }

    for (name, mut paths) in owners {
        paths.sort_unstable();
        if RUNTIME_FILE_NAMES.contains(&name.as_str()) {
            for path in &paths {
                out.push(Diagnostic {
                    file: path.to_string(),
                    span: Span::new(1, 1),
                    message: format!(
                        "generated files for `{path}` would be named `{name}`, which is reserved for the runtime files; rename the file"
                    ),
                });
            }
            continue;
        }
        let Some((first, rest)) = paths.split_first() else {
            continue;
        };
        for path in rest {
            out.push(Diagnostic {
                file: path.to_string(),
                span: Span::new(1, 1),
                message: format!(
                    "`{path}` and `{first}` would both generate files named `{name}`; rename one of them"
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use rpcgen_parse::Project;

    use crate::validate;

    const POINT: &str = "export type Point = Msg<{ x: float64 }>\n";

    #[test]
    fn flattened_names_must_not_collide() {
        let project = Project::parse([("shared/geo.ts", POINT), ("shared_geo.ts", POINT)]);
        let diags = validate(&project);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].file, "shared_geo.ts");
        assert_eq!(
            diags[0].message,
            "`shared_geo.ts` and `shared/geo.ts` would both generate files named `shared_geo`; rename one of them"
        );
    }

    #[test]
    fn runtime_names_are_reserved() {
        let project = Project::parse([("rpc.ts", POINT), ("rpc_client.ts", POINT), ("geo.ts", POINT)]);
        let files: Vec<String> = validate(&project).into_iter().map(|d| d.file).collect();
        assert_eq!(files, ["rpc.ts", "rpc_client.ts"]);
    }

    #[test]
    fn distinct_names_pass() {
        let project = Project::parse([("shared/geo.ts", POINT), ("geo.ts", POINT)]);
        assert!(validate(&project).is_empty());
    }
}
