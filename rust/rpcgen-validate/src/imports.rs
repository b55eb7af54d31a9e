//! Import rules: plain named imports of messages from nearby files.

use rpcgen_parse::{BUILTIN_MODULE, DeclTag, ModuleResolution, TYPES_NAMESPACE};

use crate::FileCx;

/// Names `@rpcgen/types` exports.
fn is_builtin_export(name: &str) -> bool {
    name == TYPES_NAMESPACE || DeclTag::from_name(name).is_some()
}

pub(crate) fn check(cx: &mut FileCx<'_>) {
    let file = cx.file;
    for import in file.imports() {
        if import.side_effect {
            cx.error(
                import.span,
                format!("side-effect import of `{}` is not allowed", import.module),
            );
        }
        if let Some(name) = &import.default {
            cx.error(
                import.span,
                format!("default import `{name}` is not allowed; use `import {{ {name} }}`"),
            );
        }
        if let Some(name) = &import.namespace {
            cx.error(
                import.span,
                format!("namespace import `* as {name}` is not allowed; import names directly"),
            );
        }
        for spec in &import.named {
            if let Some(alias) = &spec.alias {
                cx.error(
                    spec.span,
                    format!("aliased import `{} as {alias}` is not allowed", spec.name),
                );
            }
        }

        match cx.project.resolve_module(&file.path, &import.module) {
            ModuleResolution::Builtin => {
                for spec in &import.named {
                    if !is_builtin_export(&spec.name) {
                        cx.error(
                            spec.span,
                            format!("`{}` is not exported by `{BUILTIN_MODULE}`", spec.name),
                        );
                    }
                }
            }
            ModuleResolution::File(target) => {
                for spec in &import.named {
                    let exported = target
                        .message(&spec.name)
                        .is_some_and(|decl| decl.alias.exported);
                    if !exported {
                        cx.error(
                            spec.span,
                            format!(
                                "`{}` is not an exported message of `{}`",
                                spec.name, import.module
                            ),
                        );
                    }
                }
            }
            ModuleResolution::NotFound => cx.error(
                import.span,
                format!("cannot resolve module `{}`", import.module),
            ),
            ModuleResolution::Invalid => cx.error(
                import.span,
                format!(
                    "import path `{}` must be `./name`, `./dir/name` or `../name`",
                    import.module
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use rpcgen_parse::Project;

    use crate::test_util::*;
    use crate::validate;

    #[test]
    fn forbidden_import_forms() {
        let msgs = messages(
            "import X from '@rpcgen/types'\nimport * as ns from '@rpcgen/types'\nimport { Msg as M } from '@rpcgen/types'\nimport '@rpcgen/types'\n",
        );
        assert_eq!(msgs.len(), 4, "{msgs:?}");
        assert!(msgs[0].starts_with("default import"));
        assert!(msgs[1].starts_with("namespace import"));
        assert!(msgs[2].starts_with("aliased import"));
        assert!(msgs[3].starts_with("side-effect import"));
    }

    #[test]
    fn unknown_builtin_name() {
        let msgs = messages("import { t, Msg, Record } from '@rpcgen/types'\n");
        assert_eq!(msgs, ["`Record` is not exported by `@rpcgen/types`"]);
    }

    #[test]
    fn paths_and_imported_names() {
        let project = Project::parse([
            (
                "main.ts",
                "import { Point, Hidden, Svc } from './geo/point'\nimport { A } from './x/y/z'\nimport { B } from 'pkg'\nimport { C } from './missing'\n",
            ),
            (
                "geo/point.ts",
                "export type Point = Msg<{ x: float64 }>\ntype Hidden = Msg<{ y: float64 }>\ntype Svc = QuerySvc<{ f(): Point }>\n",
            ),
        ]);
        let msgs: Vec<_> = validate(&project)
            .into_iter()
            .filter(|d| d.file == "main.ts")
            .map(|d| d.message)
            .collect();
        assert_eq!(
            msgs,
            [
                "`Hidden` is not an exported message of `./geo/point`",
                "`Svc` is not an exported message of `./geo/point`",
                "import path `./x/y/z` must be `./name`, `./dir/name` or `../name`",
                "import path `pkg` must be `./name`, `./dir/name` or `../name`",
                "cannot resolve module `./missing`",
            ]
        );
    }

    #[test]
    fn parent_directory_import() {
        let project = Project::parse([
            ("common.ts", "export type Id = Msg<{ v: string }>\n"),
            (
                "users/user.ts",
                "import { Id } from '../common'\nexport type User = Msg<{ id: Id }>\n",
            ),
        ]);
        assert!(validate(&project).is_empty());
    }
}
