//! End-to-end parsing of a realistic schema file.

use rpcgen_parse::{DeclTag, Member, Statement, TypeNode, parse_file};

const USERS: &str = r#"
import { t, Msg, QuerySvc, MutationSvc } from '@rpcgen/types'
import { Address } from './address'

/** A registered user. */
export type User = Msg<{
  id: t.int64
  name: t.string
  nick?: t.string
  tags: t.List<t.string>
  scores: t.Dict<t.string, t.float64>
  pair: t.Tuple2<t.int8, t.bool>
  home: Address
  meta: { created: t.timestamp; note?: t.string }
  either: [t.int32, t.string]
}>

/**
 * Read side.
 * @kind cbor
 */
type Users = QuerySvc<{
  /**
   * Look up one user.
   * @throws 404
   */
  getUser(id: t.int64): User
  listUsers(ids: t.List<t.int64>, limit?: t.int32): t.List<User>
}>

type UserWrites = MutationSvc<{
  /** @access internal */
  purge(): t.unit
  rename(id: t.int64, name: t.string): User
}>
"#;

#[test]
fn parses_full_schema() {
    let file = parse_file("users.ts", USERS).unwrap();
    assert_eq!(file.statements.len(), 5);
    assert_eq!(file.imports().count(), 2);

    let decls: Vec<_> = file.declarations().map(|d| (d.name(), d.tag)).collect();
    assert_eq!(
        decls,
        [
            ("User", DeclTag::Msg),
            ("Users", DeclTag::QuerySvc),
            ("UserWrites", DeclTag::MutationSvc),
        ]
    );
}

#[test]
fn message_fields_keep_order_and_optionality() {
    let file = parse_file("users.ts", USERS).unwrap();
    let user = file.message("User").unwrap();
    let fields: Vec<_> = user
        .body
        .properties()
        .map(|p| (p.name.as_str(), p.optional))
        .collect();
    assert_eq!(
        fields,
        [
            ("id", false),
            ("name", false),
            ("nick", true),
            ("tags", false),
            ("scores", false),
            ("pair", false),
            ("home", false),
            ("meta", false),
            ("either", false),
        ]
    );
    assert_eq!(user.docs().map(|d| d.text.as_str()), Some("A registered user."));
}

#[test]
fn service_docs_and_tags() {
    let file = parse_file("users.ts", USERS).unwrap();
    let users = file.services().find(|d| d.name() == "Users").unwrap();
    assert_eq!(
        users
            .docs()
            .and_then(|d| d.tag("kind"))
            .map(|t| t.value.as_str()),
        Some("cbor")
    );

    let get_user = match &users.body.members[0] {
        Member::Method(m) => m,
        other => panic!("expected method, got {other:?}"),
    };
    let docs = get_user.docs.as_ref().unwrap();
    assert_eq!(docs.text, "Look up one user.");
    assert_eq!(docs.tag("throws").map(|t| t.value.as_str()), Some("404"));
    assert!(matches!(
        get_user.return_type,
        Some(TypeNode::Reference(ref r)) if r.name == "User"
    ));
}

#[test]
fn spans_point_at_declarations() {
    let file = parse_file("users.ts", USERS).unwrap();
    let Statement::TypeAlias(user) = &file.statements[2] else {
        panic!("expected alias");
    };
    // The alias span starts at `export`, after its doc comment.
    assert_eq!(user.span.line, 6);
    assert_eq!(user.span.column, 1);
}

#[test]
fn crlf_sources_parse() {
    let crlf = USERS.replace('\n', "\r\n");
    let file = parse_file("users.ts", &crlf).unwrap();
    assert_eq!(file.declarations().count(), 3);
}
