//! Only imports and type declarations may appear in a schema file.

use rpcgen_parse::Statement;

use crate::FileCx;

pub(crate) fn check(cx: &mut FileCx<'_>) {
    for statement in &cx.file.statements {
        let Statement::Other(other) = statement else {
            continue;
        };
        cx.error(
            other.span,
            format!(
                "{} is not allowed; schema files may only contain imports and type declarations",
                other.kind.describe()
            ),
        );
        for construct in &other.constructs {
            cx.error(
                construct.span,
                format!("{} is not allowed", construct.kind.describe()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;

    #[test]
    fn one_error_per_statement_and_construct() {
        let msgs = messages(
            "function f() {}\nlet x = 1\nclass C {}\ninterface I {}\nenum E { A }\nnamespace N {}\n",
        );
        assert_eq!(msgs.len(), 6);
        assert!(msgs[0].starts_with("function declaration"));
        assert!(msgs[1].starts_with("variable declaration"));
        assert!(msgs[2].starts_with("class declaration"));
        assert!(msgs[3].starts_with("interface declaration"));
        assert!(msgs[4].starts_with("enum declaration"));
        assert!(msgs[5].starts_with("namespace declaration"));
    }

    #[test]
    fn nested_constructs_are_reported() {
        let msgs = messages("const f = async (xs) => { for (const x of xs) { await g(...x) } }\n");
        assert_eq!(
            msgs,
            [
                "variable declaration is not allowed; schema files may only contain imports and type declarations",
                "arrow function is not allowed",
                "loop is not allowed",
                "await expression is not allowed",
                "spread operator is not allowed",
            ]
        );
    }

    #[test]
    fn top_level_control_flow() {
        let msgs = messages("for (;;) {}\nwhile (true) {}\nswitch (x) {}\nif (x) {}\nfoo`bar`\n");
        assert_eq!(msgs.len(), 6);
        assert!(msgs[0].starts_with("loop statement"));
        assert!(msgs[1].starts_with("loop statement"));
        assert!(msgs[2].starts_with("switch statement"));
        assert!(msgs[3].starts_with("if statement"));
        assert!(msgs[4].starts_with("expression statement"));
        assert_eq!(msgs[5], "tagged template is not allowed");
    }
}
