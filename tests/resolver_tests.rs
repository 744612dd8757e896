// Integration tests for the resolver: whole headers in, resolved graph out

use pretty_assertions::assert_eq;
use wrapmeta::config::Config;
use wrapmeta::metadata::{MetadataGraph, PointerKind, TypeClass};
use wrapmeta::parser::parse_source;
use wrapmeta::resolver::resolve;
use wrapmeta::{ResolveError, SourceErrorKind, Warning};

fn resolve_source(source: &str) -> Result<(MetadataGraph, Vec<Warning>), ResolveError> {
    let parsed = parse_source("sdk.h", source, &Config::default()).expect("Parsing failed");
    resolve(parsed.declarations)
}

fn source_error(source: &str) -> SourceErrorKind {
    match resolve_source(source) {
        Err(ResolveError::Source(err)) => err.kind,
        other => panic!("expected a source error, got {other:?}"),
    }
}

const COLLECTIONS: &str = r#"
namespace common {
/// Ordered collection.
template <typename T>
class WRAP_API List {
public:
    int Count() const;
    T Get(int index) const;
};

template <typename K, typename V>
class WRAP_API Map {
public:
    List<K> Keys() const;
    List<V> Values() const;
};
}
"#;

#[test]
fn test_overloads_have_distinct_unique_names() {
    let (graph, warnings) = resolve_source(
        r#"
namespace app {
struct WRAP_API Item { int id; };

class WRAP_API Bag {
public:
    void Add(int value);
    void Add(const Item& item);
    void Add(Item* item);
    void Add(Optional<Item> item);
    int Count() const;
    int Count();
};
}
"#,
    )
    .unwrap();

    let bag = graph.classes().get("app::Bag").unwrap();
    let mut names: Vec<_> = bag.methods.iter().map(|m| m.unique_name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), bag.methods.len());
    assert!(names.contains(&"app_Bag_Add_void_ItemRC"));
    assert!(names.contains(&"app_Bag_Add_void_ItemO"));
    assert!(names.contains(&"app_Bag_CountC_int"));
    assert!(warnings.is_empty());
}

#[test]
fn test_typedef_collisions_are_suffixed() {
    let (graph, warnings) = resolve_source(
        "typedef unsigned int Id;\nWRAP_API void Put(Id id);\nWRAP_API void Put(unsigned int raw);",
    )
    .unwrap();

    let keys: Vec<_> = graph.functions().keys().collect();
    assert_eq!(keys, vec!["Put_void_unsigned_int", "Put_void_unsigned_int_2"]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].location.line, 3);
}

#[test]
fn test_overloads_across_namespaces_are_kept() {
    let (graph, warnings) = resolve_source(
        r#"
namespace gfx { struct WRAP_API Shape { int a; }; }
namespace ui { struct WRAP_API Shape { int b; }; }
WRAP_API void Draw(gfx::Shape s);
WRAP_API void Draw(ui::Shape s);
"#,
    )
    .unwrap();

    let keys: Vec<_> = graph.functions().keys().collect();
    assert_eq!(keys, vec!["Draw_void_Shape", "Draw_void_Shape_2"]);
    let params: Vec<_> = graph
        .functions()
        .values()
        .map(|f| f.parameters[0].ty.key())
        .collect();
    assert_eq!(params, vec!["gfx::Shape", "ui::Shape"]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].location.line, 5);
}

#[test]
fn test_typedef_chain_spans_files() {
    let config = Config::default();
    let mut all = parse_source(
        "a.h",
        "namespace n {\ntypedef Id Handle;\nWRAP_API void Use(Handle h);\n}",
        &config,
    )
    .unwrap()
    .declarations;
    let later = parse_source("b.h", "namespace n {\ntypedef unsigned int Id;\n}", &config)
        .unwrap()
        .declarations;
    all.merge(later).unwrap();

    let (graph, _) = resolve(all).unwrap();
    let function = graph.functions().values().next().unwrap();
    let ty = &function.parameters[0].ty;
    assert_eq!(ty.name, "unsigned int");
    assert!(ty.namespace.is_empty());
    assert_eq!(ty.class, Some(TypeClass::Primitive));
    assert_eq!(function.unique_name, "n_Use_void_unsigned_int");
}

#[test]
fn test_relative_qualified_names_resolve_outward() {
    let (graph, _) = resolve_source(
        r#"
namespace eggs {
namespace and {
struct WRAP_API bacon { int strips; };
}
namespace breakfast {
WRAP_API and::bacon Serve();
}
}
"#,
    )
    .unwrap();

    let serve = graph.functions().values().next().unwrap();
    let ret = serve.return_type.as_ref().unwrap();
    assert_eq!(ret.key(), "eggs::and::bacon");
    assert_eq!(ret.class, Some(TypeClass::Struct));
    assert_eq!(serve.unique_name, "eggs_breakfast_Serve_bacon");
}

#[test]
fn test_template_instances_and_safe_names() {
    let source = format!(
        "{COLLECTIONS}\nnamespace app {{\nWRAP_API common::Map<int, String> Index();\nWRAP_API common::List<common::List<int>> Grid();\n}}"
    );
    let (graph, _) = resolve_source(&source).unwrap();

    let list = graph.templates().get("common::List").unwrap();
    let mut names: Vec<_> = list
        .instances
        .iter()
        .map(|i| i.full_safe_type_name.clone().unwrap())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["common_List_Int32", "common_List_String", "common_List_common_List_Int32"]
    );

    let map = graph.templates().get("common::Map").unwrap();
    assert_eq!(map.instances.len(), 1);
    let instance = &map.instances[0];
    assert_eq!(instance.parent_namespace.to_string(), "app");
    assert_eq!(instance.arguments[0].parameter_name.as_deref(), Some("K"));
    assert_eq!(instance.arguments[1].parameter_name.as_deref(), Some("V"));
    assert!(instance.arguments[1].is_last);

    let index = graph.functions().get("app_Index_Map__int_String__").unwrap();
    let ret = index.return_type.as_ref().unwrap();
    assert_eq!(ret.class, Some(TypeClass::Template));
    assert_eq!(ret.template_safe_type_name.as_deref(), Some("common_Map"));
    assert_eq!(ret.template_arguments[0].safe_type_name.as_deref(), Some("Int32"));
    assert_eq!(ret.template_arguments[1].ty.class, Some(TypeClass::String));
}

#[test]
fn test_template_parameters_are_marked() {
    let (graph, _) = resolve_source(COLLECTIONS).unwrap();

    let list = graph.templates().get("common::List").unwrap();
    let get = list.definition.methods.iter().find(|m| m.name == "Get").unwrap();
    let ret = get.return_type.as_ref().unwrap();
    assert!(ret.is_template_argument);
    assert_eq!(ret.class, None);

    let map = graph.templates().get("common::Map").unwrap();
    let keys = map.definition.methods.iter().find(|m| m.name == "Keys").unwrap();
    let ret = keys.return_type.as_ref().unwrap();
    assert_eq!(ret.key(), "common::List");
    assert!(ret.template_arguments[0].ty.is_template_argument);
    assert!(list.instances.is_empty());
}

#[test]
fn test_undeclared_template_is_rejected() {
    let kind = source_error("WRAP_API std::vector<int> Values();");
    assert!(matches!(kind, SourceErrorKind::UndeclaredTemplate { ref name } if name == "std::vector"));
}

#[test]
fn test_template_arity_is_checked() {
    let kind = source_error(&format!("{COLLECTIONS}\nWRAP_API common::Map<int> Broken();"));
    assert!(matches!(
        kind,
        SourceErrorKind::TemplateArity {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn test_typedefs_are_transparent() {
    let (graph, _) = resolve_source(
        r#"
namespace net {
typedef unsigned short Port;
/// Called on connect.
using ConnectHandler = function<void(Port port)>;

class WRAP_API Server {
public:
    void Listen(const Port& port);
    void OnConnect(ConnectHandler handler);
};
}
"#,
    )
    .unwrap();

    let server = graph.classes().get("net::Server").unwrap();
    let listen = &server.methods.iter().find(|m| m.name == "Listen").unwrap();
    let port = &listen.parameters[0].ty;
    assert_eq!(port.name, "unsigned short");
    assert_eq!(port.pointer, PointerKind::Reference);
    assert!(port.is_const);
    assert_eq!(port.class, Some(TypeClass::Primitive));

    let on_connect = server.methods.iter().find(|m| m.name == "OnConnect").unwrap();
    let handler = &on_connect.parameters[0].ty;
    assert_eq!(handler.class, Some(TypeClass::FunctionSignature));
    let signature = handler.signature.as_ref().unwrap();
    assert_eq!(signature.docs, vec!["Called on connect."]);
    assert_eq!(signature.parameters[0].ty.name, "unsigned short");
}

#[test]
fn test_template_typedef_is_inlined_and_dropped() {
    let source = format!("{COLLECTIONS}\nusing Names = common::List<String>;\nWRAP_API Names AllNames();");
    let (graph, _) = resolve_source(&source).unwrap();

    assert!(graph.typedefs().is_empty());
    let all = graph.functions().values().next().unwrap();
    assert_eq!(all.return_type.as_ref().unwrap().key(), "common::List");
    let list = graph.templates().get("common::List").unwrap();
    assert_eq!(list.instances.len(), 1);
}

#[test]
fn test_class_hierarchy() {
    let (graph, _) = resolve_source(
        r#"
namespace ui {
WRAP_INTERFACE class IDrawable {
public:
    virtual ~IDrawable() = default;
    virtual void Draw() const = 0;
};

WRAP_INTERFACE class IWidget : public IDrawable {
public:
    virtual ~IWidget() = default;
    virtual int Id() const = 0;
};

class WRAP_API Control {
public:
    Control();
};

class WRAP_API Button : public Control, public IWidget {
public:
    void Draw() const;
    int Id() const;
    void Click();
};
}
"#,
    )
    .unwrap();

    let button = graph.classes().get("ui::Button").unwrap();
    assert_eq!(button.base.as_ref().unwrap().key(), "ui::Control");
    assert!(button.has_interfaces);
    assert_eq!(button.interfaces.len(), 1);

    let implemented: Vec<_> = button
        .methods
        .iter()
        .filter(|m| m.is_interface_implementation)
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(implemented, vec!["Draw", "Id"]);

    assert!(graph.derives_from("ui::Button", "ui::Control"));
    assert!(graph.derives_from("ui::Button", "ui::IDrawable"));
    assert!(!graph.derives_from("ui::Control", "ui::IDrawable"));
}

#[test]
fn test_multiple_class_bases_are_rejected() {
    let kind = source_error(
        "class WRAP_API A {};\nclass WRAP_API B {};\nclass WRAP_API C : public A, public B {};",
    );
    assert!(matches!(kind, SourceErrorKind::MultipleBaseClasses { ref name, .. } if name == "C"));
}

#[test]
fn test_resolution_is_idempotent() {
    let source = format!(
        r#"{COLLECTIONS}
namespace app {{
typedef int Id;
WRAP_INTERFACE class INamed {{
public:
    virtual ~INamed() = default;
    virtual String Name() const = 0;
}};
class WRAP_API User : public INamed {{
public:
    String Name() const;
    common::Map<Id, common::List<String>> Groups() const;
    void Rename(const String& name);
}};
WRAP_API void Rename(User* user, Optional<String> name);
}}
"#
    );
    let (graph, _) = resolve_source(&source).unwrap();

    let (again, warnings) = resolve(graph.clone().into_declarations()).unwrap();
    assert_eq!(again, graph);
    assert!(warnings.is_empty());
}

#[test]
fn test_graph_serializes_to_json() {
    let (graph, _) = resolve_source(
        "namespace gfx {\nenum class WRAP_FLAGS Mode { Read = 1, Write = 2 };\nWRAP_API void Open(Mode mode);\n}",
    )
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&graph.to_json(false).unwrap()).unwrap();
    assert_eq!(json["enums"]["gfx::Mode"]["is_flags"], true);
    let open = &json["functions"]["gfx_Open_void_Mode"];
    assert_eq!(open["parameters"][0]["type"]["class"], "enum");
    assert_eq!(open["parameters"][0]["type"]["namespace"], "gfx");
}
