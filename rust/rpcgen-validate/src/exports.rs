//! Only messages are exported, and only as `export type X = Msg<..>`.

use rpcgen_parse::{DeclTag, ExportKind, Statement};

use crate::FileCx;

pub(crate) fn check(cx: &mut FileCx<'_>) {
    for statement in &cx.file.statements {
        match statement {
            Statement::Export(export) => {
                let message = match export.kind {
                    ExportKind::Default => "default exports are not allowed",
                    ExportKind::Assignment => "export assignments are not allowed",
                    ExportKind::List => {
                        "export lists are not allowed; export message declarations directly"
                    }
                };
                cx.error(export.span, message);
            }
            Statement::TypeAlias(alias) if alias.exported && alias.tag() != Some(DeclTag::Msg) => {
                cx.error(
                    alias.span,
                    format!("only messages may be exported; `{}` is not a message", alias.name),
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;

    #[test]
    fn export_statement_forms() {
        let msgs = messages("export default 1\nexport = 2\nexport { A }\nexport * from './a'\n");
        assert_eq!(
            msgs,
            [
                "default exports are not allowed",
                "export assignments are not allowed",
                "export lists are not allowed; export message declarations directly",
                "export lists are not allowed; export message declarations directly",
            ]
        );
    }

    #[test]
    fn exported_service_is_rejected() {
        let msgs = messages(
            "export type A = Msg<{ a: int8 }>\nexport type S = QuerySvc<{ f(): A }>\n",
        );
        assert_eq!(msgs, ["only messages may be exported; `S` is not a message"]);
    }
}
