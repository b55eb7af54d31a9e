//! Lowering parsed declarations into the IR.
//!
//! The builder trusts its input: it runs only after validation came back
//! clean, and it never fails. Anything it cannot classify becomes
//! [`Scalar::Dynamic`].

use std::collections::{BTreeMap, HashMap};

use rpcgen_parse::{
    ContainerKind, DeclTag, Declaration, Docs, MethodSig, ModuleResolution, Project, SourceFile,
    TypeNode, is_namespaced, strip_types_namespace,
};

use crate::data_type::{DataType, Property, Scalar};
use crate::schema::{
    Access, DEFAULT_ERROR_CODE, DEFAULT_RESPONSE_CODE, Encoding, Import, Message, Method, Schema,
    Service, ServiceKind, is_valid_status_code, schema_file_name,
};

/// Build one [`Schema`] per parsed file, ordered by file path.
pub fn lower_project(project: &Project, package_name: &str) -> Vec<Schema> {
    project
        .files()
        .map(|file| lower_file(project, file, package_name))
        .collect()
}

/// Build the [`Schema`] for a single file of `project`.
pub fn lower_file(project: &Project, file: &SourceFile, package_name: &str) -> Schema {
    let scope = Scope::new(project, file);

    let mut messages: Vec<Message> = Vec::new();
    for decl in file.messages() {
        let message = Message {
            name: decl.name().to_string(),
            is_exported: decl.alias.exported,
            properties: decl
                .body
                .properties()
                .map(|p| Property {
                    name: p.name.clone(),
                    ty: scope.make_data_type(&p.ty),
                    optional: p.optional,
                })
                .collect(),
            doc: doc_text(decl.docs()),
        };
        let duplicate = messages
            .iter()
            .any(|m| m.name == message.name && m.properties == message.properties);
        if duplicate {
            tracing::debug!(file = %file.path, message = %message.name, "dropping duplicate message");
            continue;
        }
        messages.push(message);
    }

    let mut query_services = Vec::new();
    let mut mutation_services = Vec::new();
    for decl in file.services() {
        let service = scope.make_service(&decl);
        match service.kind {
            ServiceKind::Query => query_services.push(service),
            ServiceKind::Mutation => mutation_services.push(service),
        }
    }

    let has_cbor = query_services
        .iter()
        .chain(&mutation_services)
        .flat_map(|s| &s.methods)
        .any(|m| m.has_cbor_params || m.has_cbor_return);

    Schema {
        package_name: package_name.to_string(),
        file_name: schema_file_name(&file.path),
        imports: collect_imports(project, file),
        messages,
        query_services,
        mutation_services,
        has_cbor,
    }
}

fn collect_imports(project: &Project, file: &SourceFile) -> Vec<Import> {
    let mut by_file: BTreeMap<String, Import> = BTreeMap::new();
    for import in file.imports() {
        let ModuleResolution::File(target) = project.resolve_module(&file.path, &import.module)
        else {
            continue;
        };
        let file_name = schema_file_name(&target.path);
        let entry = by_file.entry(file_name.clone()).or_insert_with(|| Import {
            message_names: Default::default(),
            file_name,
        });
        entry
            .message_names
            .extend(import.named.iter().map(|spec| spec.name.clone()));
    }
    by_file.into_values().collect()
}

fn encoding_of(docs: Option<&Docs>) -> Option<Encoding> {
    docs.and_then(|d| d.tag("kind"))
        .and_then(|t| Encoding::from_tag(&t.value))
}

fn doc_text(docs: Option<&Docs>) -> Option<String> {
    docs.map(|d| d.text.clone()).filter(|t| !t.is_empty())
}

/// Status code from a `@returns` / `@throws` tag, falling back to `default`.
fn status_code(method: &MethodSig, tag: &str, default: u16) -> u16 {
    let Some(value) = method.docs.as_ref().and_then(|d| d.tag(tag)) else {
        return default;
    };
    match value.value.trim().parse::<u16>() {
        Ok(code) if is_valid_status_code(code) => code,
        _ => {
            tracing::warn!(
                method = %method.name,
                tag,
                value = %value.value,
                default,
                "ignoring invalid status code"
            );
            default
        }
    }
}

/// Message names visible from one file, with their `@kind cbor` flag.
struct Scope {
    cbor: HashMap<String, bool>,
}

impl Scope {
    fn new(project: &Project, file: &SourceFile) -> Self {
        let mut cbor = HashMap::new();

        for (import, spec) in file.imported_names() {
            if let ModuleResolution::File(target) =
                project.resolve_module(&file.path, &import.module)
                && let Some(decl) = target.message(&spec.name)
            {
                cbor.insert(spec.name.clone(), is_cbor(&decl));
            }
        }
        // Local declarations shadow imports.
        for decl in file.messages() {
            cbor.insert(decl.name().to_string(), is_cbor(&decl));
        }

        Self { cbor }
    }

    fn struct_ref(&self, name: &str) -> DataType {
        DataType::Struct {
            name: name.to_string(),
            use_cbor: self.cbor.get(name).copied().unwrap_or(false),
        }
    }

    fn make_data_type(&self, node: &TypeNode) -> DataType {
        match node {
            TypeNode::Record(record) => DataType::StructLiteral(
                record
                    .properties()
                    .map(|p| Property {
                        name: p.name.clone(),
                        ty: self.make_data_type(&p.ty),
                        optional: p.optional,
                    })
                    .collect(),
            ),
            TypeNode::Tuple(tuple) => DataType::Union(
                tuple
                    .elements
                    .iter()
                    .map(|e| self.make_data_type(e))
                    .collect(),
            ),
            TypeNode::Reference(reference) => {
                if reference.name.is_empty() {
                    return DataType::DYNAMIC;
                }
                if let Some(scalar) = Scalar::from_keyword(strip_types_namespace(&reference.name))
                {
                    return DataType::Scalar(scalar);
                }
                if let Some(variants) = node.union_variants() {
                    return DataType::Union(
                        variants.iter().map(|v| self.make_data_type(v)).collect(),
                    );
                }
                if let Some(container) = ContainerKind::from_reference_name(&reference.name) {
                    return self.make_container(container, &reference.args);
                }
                if is_namespaced(&reference.name) {
                    return DataType::DYNAMIC;
                }
                self.struct_ref(&reference.name)
            }
            TypeNode::Unsupported { .. } => DataType::DYNAMIC,
        }
    }

    fn make_container(&self, container: ContainerKind, args: &[TypeNode]) -> DataType {
        let arg = |i: usize| {
            args.get(i)
                .map(|a| self.make_data_type(a))
                .unwrap_or(DataType::DYNAMIC)
        };
        match container {
            ContainerKind::List => DataType::list(arg(0)),
            ContainerKind::Dict => {
                let key = arg(0)
                    .as_scalar()
                    .filter(|s| s.is_comparable())
                    .unwrap_or(Scalar::Dynamic);
                DataType::map(key, arg(1))
            }
            ContainerKind::Tuple(n) => {
                DataType::tuple((0..n).map(arg).collect()).unwrap_or(DataType::DYNAMIC)
            }
        }
    }

    fn uses_cbor(ty: &DataType) -> bool {
        matches!(ty, DataType::Struct { use_cbor: true, .. })
    }

    fn make_method(&self, sig: &MethodSig, kind: ServiceKind, service_cbor: bool) -> Method {
        let params: Vec<Property> = sig
            .params
            .iter()
            .map(|p| Property {
                name: p.name.clone(),
                ty: p
                    .ty
                    .as_ref()
                    .map(|t| self.make_data_type(t))
                    .unwrap_or(DataType::DYNAMIC),
                optional: p.optional,
            })
            .collect();
        let return_type = sig
            .return_type
            .as_ref()
            .map(|t| self.make_data_type(t))
            .unwrap_or(DataType::DYNAMIC);

        let method_cbor = encoding_of(sig.docs.as_ref()) == Some(Encoding::Cbor);
        let has_cbor_params =
            method_cbor || service_cbor || params.iter().any(|p| Self::uses_cbor(&p.ty));
        let has_cbor_return = method_cbor || service_cbor || Self::uses_cbor(&return_type);

        let access = sig
            .docs
            .as_ref()
            .and_then(|d| d.tag("access"))
            .and_then(|t| Access::from_tag(&t.value))
            .unwrap_or_default();

        Method {
            name: sig.name.clone(),
            has_params: !params.is_empty(),
            is_void_return: return_type.is_void(),
            params,
            return_type,
            http_method: kind.http_method(),
            response_code: status_code(sig, "returns", DEFAULT_RESPONSE_CODE),
            error_code: status_code(sig, "throws", DEFAULT_ERROR_CODE),
            has_cbor_params,
            has_cbor_return,
            access,
            doc: doc_text(sig.docs.as_ref()),
        }
    }

    fn make_service(&self, decl: &Declaration<'_>) -> Service {
        let kind = match decl.tag {
            DeclTag::MutationSvc => ServiceKind::Mutation,
            _ => ServiceKind::Query,
        };
        let use_cbor = is_cbor(decl);
        Service {
            kind,
            name: decl.name().to_string(),
            methods: decl
                .body
                .methods()
                .map(|m| self.make_method(m, kind, use_cbor))
                .collect(),
            use_cbor,
            doc: doc_text(decl.docs()),
        }
    }
}

fn is_cbor(decl: &Declaration<'_>) -> bool {
    encoding_of(decl.docs()) == Some(Encoding::Cbor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HttpMethod;

    fn lower(sources: &[(&str, &str)]) -> Vec<Schema> {
        lower_project(&Project::parse(sources.iter().copied()), "api")
    }

    fn lower_one(source: &str) -> Schema {
        lower(&[("svc.ts", source)]).remove(0)
    }

    #[test]
    fn minimal_message_and_query_service() {
        let schema = lower_one(
            "type User = Msg<{ id: int8; name: string }>\ntype Svc = QuerySvc<{ getUser(id: int8): User }>",
        );
        assert_eq!(schema.package_name, "api");
        assert_eq!(schema.file_name, "svc");
        assert_eq!(schema.messages.len(), 1);
        assert_eq!(schema.messages[0].properties.len(), 2);
        assert_eq!(schema.query_services.len(), 1);

        let method = &schema.query_services[0].methods[0];
        assert_eq!(method.name, "getUser");
        assert_eq!(method.http_method, HttpMethod::Get);
        assert_eq!(method.response_code, 200);
        assert_eq!(method.error_code, 500);
        assert!(method.has_params);
        assert!(!method.is_void_return);
        assert!(!schema.has_cbor);
        assert_eq!(
            method.return_type,
            DataType::Struct {
                name: "User".into(),
                use_cbor: false
            }
        );
    }

    #[test]
    fn out_of_range_status_falls_back() {
        let schema = lower_one(
            "type S = MutationSvc<{\n/** @throws 550\n @returns 201 */\nf(): unit\n/** @throws nope */\ng(): unit\n/** @throws 404 */\nh(): unit }>",
        );
        let methods = &schema.mutation_services[0].methods;
        assert_eq!(methods[0].error_code, 500);
        assert_eq!(methods[0].response_code, 201);
        assert_eq!(methods[1].error_code, 500);
        assert_eq!(methods[2].error_code, 404);
        assert!(methods[0].is_void_return);
        assert_eq!(methods[0].http_method, HttpMethod::Post);
    }

    #[test]
    fn duplicate_messages_collapse() {
        let schema = lower_one("type A = Msg<{ a: int8 }>\ntype A = Msg<{ a: int8 }>");
        assert_eq!(schema.messages.len(), 1);
    }

    #[test]
    fn cbor_flag_is_an_or_across_levels() {
        let schema = lower_one(
            r#"
/** @kind cbor */
type Blobby = Msg<{ data: blob }>
type Plain = Msg<{ a: int8 }>

type Q = QuerySvc<{
  plain(a: int8): Plain
  viaReturn(a: int8): Blobby
  /** @kind cbor */
  viaMethod(): Plain
}>

/** @kind cbor */
type M = MutationSvc<{
  viaService(p: Plain): Plain
  /** @kind json */
  stillCbor(): Plain
}>

type M2 = MutationSvc<{
  viaParam(b: Blobby): Plain
}>
"#,
        );
        let q = &schema.query_services[0].methods;
        assert!(!q[0].has_cbor_params && !q[0].has_cbor_return);
        assert!(!q[1].has_cbor_params && q[1].has_cbor_return);
        assert!(q[2].has_cbor_params && q[2].has_cbor_return);

        let m = &schema.mutation_services[0];
        assert!(m.use_cbor);
        assert!(m.methods[0].has_cbor_params && m.methods[0].has_cbor_return);
        // A method-level json tag cannot switch off the service-level flag.
        assert!(m.methods[1].has_cbor_params && m.methods[1].has_cbor_return);

        let m2 = &schema.mutation_services[1].methods[0];
        assert!(m2.has_cbor_params && !m2.has_cbor_return);
        assert!(schema.has_cbor);
    }

    #[test]
    fn builds_nested_types() {
        let schema = lower_one(
            "type A = Msg<{\n l: t.List<t.string>\n d: t.Dict<string, t.List<A>>\n p: t.Tuple3<int8, bool, string>\n u: [int8, string]\n w: Union<[A, null]>\n s: { x?: float64 }\n}>",
        );
        let props = &schema.messages[0].properties;
        assert_eq!(props[0].ty, DataType::list(DataType::Scalar(Scalar::String)));
        assert_eq!(
            props[1].ty,
            DataType::map(
                Scalar::String,
                DataType::list(DataType::Struct {
                    name: "A".into(),
                    use_cbor: false
                })
            )
        );
        assert!(props[2].ty.is_tuple3());
        assert_eq!(
            props[3].ty,
            DataType::Union(vec![
                DataType::Scalar(Scalar::Int8),
                DataType::Scalar(Scalar::String)
            ])
        );
        assert!(matches!(&props[4].ty, DataType::Union(v) if v.len() == 2));
        assert_eq!(
            props[5].ty,
            DataType::StructLiteral(vec![Property {
                name: "x".into(),
                ty: DataType::Scalar(Scalar::Float64),
                optional: true
            }])
        );
    }

    #[test]
    fn malformed_input_defaults_to_dynamic() {
        let schema = lower_one(
            "type A = Msg<{ a: string[]; b: t.Nope; c: t.Dict<float64, int8>; d: t.List }>\ntype S = QuerySvc<{ f(x) }>",
        );
        let props = &schema.messages[0].properties;
        assert_eq!(props[0].ty, DataType::DYNAMIC);
        assert_eq!(props[1].ty, DataType::DYNAMIC);
        assert_eq!(props[2].ty, DataType::map(Scalar::Dynamic, DataType::Scalar(Scalar::Int8)));
        assert_eq!(props[3].ty, DataType::list(DataType::DYNAMIC));

        let f = &schema.query_services[0].methods[0];
        assert_eq!(f.params[0].ty, DataType::DYNAMIC);
        assert_eq!(f.return_type, DataType::DYNAMIC);
    }

    #[test]
    fn imports_and_cross_file_cbor() {
        let schemas = lower(&[
            (
                "shared/geo.ts",
                "/** @kind cbor */\nexport type Point = Msg<{ x: float64 }>\nexport type Area = Msg<{ a: float64 }>",
            ),
            (
                "map.ts",
                "import { Point, Area } from './shared/geo'\ntype S = MutationSvc<{ f(p: Point): Area }>",
            ),
        ]);
        assert_eq!(schemas[0].file_name, "map");
        assert_eq!(schemas[1].file_name, "shared_geo");

        let map = &schemas[0];
        assert_eq!(map.imports.len(), 1);
        assert_eq!(map.imports[0].file_name, "shared_geo");
        assert_eq!(
            map.imports[0].message_names.iter().collect::<Vec<_>>(),
            ["Area", "Point"]
        );
        let f = &map.mutation_services[0].methods[0];
        assert!(f.has_cbor_params);
        assert!(!f.has_cbor_return);
    }

    #[test]
    fn access_and_docs() {
        let schema = lower_one(
            "/** Reads. */\ntype S = QuerySvc<{\n/**\n * Hidden.\n * @access internal\n */\nf(): unit\ng(): unit }>",
        );
        let service = &schema.query_services[0];
        assert_eq!(service.doc.as_deref(), Some("Reads."));
        assert_eq!(service.methods[0].access, Access::Internal);
        assert_eq!(service.methods[0].doc.as_deref(), Some("Hidden."));
        assert_eq!(service.methods[1].access, Access::Public);
        assert_eq!(service.public_methods().count(), 1);
    }
}
