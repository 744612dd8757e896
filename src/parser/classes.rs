//! Class, struct and interface parsing
//!
//! A record body is a sequence of members. Each member is classified by a
//! raw lookahead over the unread text (function, field or nested type) and
//! then handed to the matching parser. Only public members are exported,
//! except constructors and destructors which are always kept so the
//! generated wrappers know whether an instance may be created or destroyed.

use crate::error::{SourceError, SourceErrorKind};
use crate::metadata::{
    ClassDescriptor, Deprecation, FieldDescriptor, FunctionDescriptor, InterfaceDescriptor,
    OwnerKind, OwnerRef, SourceLocation, StructDescriptor, TypeDescriptor,
};
use crate::parser::parse::{ParseContext, Parser};
use crate::parser::reader::is_identifier_char;
use crate::resolver::naming::function_unique_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Function,
    Field,
    NestedType,
}

#[derive(Debug, Default)]
struct RecordBody {
    fields: Vec<FieldDescriptor>,
    methods: Vec<FunctionDescriptor>,
    member_count: usize,
    static_count: usize,
    function_count: usize,
    virtual_count: usize,
    field_count: usize,
    has_nested_types: bool,
    end_line: usize,
}

impl RecordBody {
    /// Every declared member is a virtual function.
    fn is_pure_virtual(&self) -> bool {
        self.function_count > 0 && self.field_count == 0 && self.virtual_count == self.function_count
    }

    /// Every declared member is static.
    fn is_static(&self) -> bool {
        self.member_count > 0 && self.static_count == self.member_count
    }
}

/// Leading `static`, `explicit` and friends in front of a member.
#[derive(Debug, Default)]
struct MemberModifiers {
    no_export: bool,
    is_static: bool,
    is_explicit: bool,
}

fn is_interface_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

fn synthesized_member(owner: &OwnerRef, location: &SourceLocation, destructor: bool) -> FunctionDescriptor {
    let mut function = FunctionDescriptor {
        location: location.clone(),
        end_line: location.line,
        namespace: owner.namespace.clone(),
        name: if destructor {
            format!("~{}", owner.name)
        } else {
            owner.name.clone()
        },
        owner: Some(owner.clone()),
        is_constructor: !destructor,
        is_destructor: destructor,
        is_synthesized: true,
        ..FunctionDescriptor::default()
    };
    function.unique_name = function_unique_name(&function);
    function
}

impl Parser<'_> {
    /// After `class`.
    pub(crate) fn parse_class(
        &mut self,
        ctx: &mut ParseContext,
        nested: bool,
    ) -> Result<Option<ClassDescriptor>, SourceError> {
        self.parse_class_with(ctx, nested, !nested, OwnerKind::Class, Access::Private)
    }

    /// After `template <...> class`.
    pub(crate) fn parse_template_class(
        &mut self,
        ctx: &mut ParseContext,
        access: Access,
    ) -> Result<Option<ClassDescriptor>, SourceError> {
        self.parse_class_with(ctx, false, true, OwnerKind::Template, access)
    }

    fn parse_class_with(
        &mut self,
        ctx: &mut ParseContext,
        nested: bool,
        require_export: bool,
        kind: OwnerKind,
        access: Access,
    ) -> Result<Option<ClassDescriptor>, SourceError> {
        let Some(header) = self.parse_record_header(require_export)? else {
            return Ok(None);
        };
        let owner = OwnerRef {
            namespace: ctx.namespace.clone(),
            name: header.name.clone(),
            kind,
        };
        let _span = tracing::debug_span!("class", name = %owner.key()).entered();

        let body = self.parse_record_body(ctx, &owner, access)?;
        self.skip_optional_semicolon();

        let is_pure_virtual = body.is_pure_virtual();
        let is_static = body.is_static();
        let mut methods = body.methods;
        if kind != OwnerKind::Interface && !is_pure_virtual && !is_static {
            if !methods.iter().any(|m| m.is_constructor) {
                methods.push(synthesized_member(&owner, &header.location, false));
            }
            if !methods.iter().any(|m| m.is_destructor) {
                methods.push(synthesized_member(&owner, &header.location, true));
            }
        }
        let has_private_destructor = methods.iter().any(|m| m.is_destructor && m.is_private);

        tracing::debug!(methods = methods.len(), fields = body.fields.len(), "found class");
        Ok(Some(ClassDescriptor {
            location: header.location,
            end_line: body.end_line,
            namespace: owner.namespace.clone(),
            full_safe_type_name: owner.namespace.prefix_underscored(&owner.name),
            name: header.name,
            inherits: header.inherits,
            base: None,
            interfaces: Vec::new(),
            has_interfaces: false,
            fields: body.fields,
            methods,
            should_dispose: header.should_dispose && !is_static && !has_private_destructor,
            is_pure_virtual,
            is_static,
            is_nested_type: nested,
            has_nested_types: body.has_nested_types,
            docs: Vec::new(),
        }))
    }

    /// After `struct`. Structs keep their fields and at most one base;
    /// member functions are parsed but not exported.
    pub(crate) fn parse_struct(
        &mut self,
        ctx: &mut ParseContext,
        nested: bool,
    ) -> Result<Option<StructDescriptor>, SourceError> {
        let Some(header) = self.parse_record_header(!nested)? else {
            return Ok(None);
        };
        let owner = OwnerRef {
            namespace: ctx.namespace.clone(),
            name: header.name.clone(),
            kind: OwnerKind::Struct,
        };
        let _span = tracing::debug_span!("struct", name = %owner.key()).entered();

        let body = self.parse_record_body(ctx, &owner, Access::Public)?;
        self.skip_optional_semicolon();

        tracing::debug!(fields = body.fields.len(), "found struct");
        Ok(Some(StructDescriptor {
            location: header.location,
            end_line: body.end_line,
            namespace: owner.namespace.clone(),
            full_safe_type_name: owner.namespace.prefix_underscored(&owner.name),
            name: header.name,
            base: header.inherits.into_iter().next(),
            fields: body.fields,
            is_nested_type: nested,
            has_nested_types: body.has_nested_types,
            docs: Vec::new(),
        }))
    }

    /// After the interface marker: `class IName { ... };` holding only pure
    /// virtual methods and a virtual destructor.
    pub(crate) fn parse_interface(
        &mut self,
        ctx: &mut ParseContext,
        nested: bool,
    ) -> Result<Option<InterfaceDescriptor>, SourceError> {
        let word = self.expect_next("'class' after interface marker")?;
        if word != "class" {
            return Err(self.unexpected("'class' after interface marker", &word));
        }
        let Some(class) =
            self.parse_class_with(ctx, nested, false, OwnerKind::Interface, Access::Private)?
        else {
            return Ok(None);
        };

        let name = class.name.clone();
        let fail = |kind| Err(SourceError::new(class.location.clone(), kind));

        if !class.fields.is_empty() {
            return fail(SourceErrorKind::InterfaceHasFields { name });
        }
        if let Some(method) = class
            .methods
            .iter()
            .find(|m| !m.is_constructor && !m.is_destructor && !m.is_pure)
        {
            return fail(SourceErrorKind::InterfaceNotPureVirtual {
                name,
                method: method.name.clone(),
            });
        }
        if class.methods.iter().any(|m| m.is_constructor) {
            return fail(SourceErrorKind::InterfaceHasConstructor { name });
        }
        let destructors: Vec<_> = class.methods.iter().filter(|m| m.is_destructor).collect();
        match destructors.as_slice() {
            [] => return fail(SourceErrorKind::InterfaceMissingDestructor { name }),
            [destructor] if !destructor.is_virtual => {
                return fail(SourceErrorKind::InterfaceDestructorNotVirtual { name })
            }
            [_] => {}
            _ => return fail(SourceErrorKind::InterfaceMultipleDestructors { name }),
        }

        if !is_interface_name(&name) {
            ctx.warn(
                class.location.clone(),
                format!("interface '{name}' should follow the naming pattern 'IName'"),
            );
        }

        Ok(Some(InterfaceDescriptor {
            location: class.location,
            end_line: class.end_line,
            namespace: class.namespace,
            name: class.name,
            full_safe_type_name: class.full_safe_type_name,
            inherits: class.inherits,
            interfaces: Vec::new(),
            has_interfaces: false,
            methods: class.methods,
            is_nested_type: nested,
            docs: Vec::new(),
        }))
    }

    /// After `{`: members through the closing `}`.
    fn parse_record_body(
        &mut self,
        ctx: &mut ParseContext,
        owner: &OwnerRef,
        default_access: Access,
    ) -> Result<RecordBody, SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let closing = format!("'}}' to close '{}'", owner.name);

        let mut body = RecordBody::default();
        let mut access = default_access;
        let mut pending_deprecation: Option<Deprecation> = None;

        loop {
            let word = self.expect_next(&closing)?;
            let deprecation = pending_deprecation.take();

            match word.as_str() {
                "}" => break,
                ";" => {}
                "[" => pending_deprecation = self.parse_attribute()?.or(deprecation),
                "public" | "protected" | "private" => {
                    self.clear_docs();
                    access = match word.as_str() {
                        "public" => Access::Public,
                        "protected" => Access::Protected,
                        _ => Access::Private,
                    };
                    self.expect(":", "':' after access specifier")?;
                }
                "friend" | "static_assert" => {
                    self.clear_docs();
                    self.skip_declaration(&word)?;
                }
                "template" => {
                    self.clear_docs();
                    self.expect("<", "'<' after 'template'")?;
                    self.skip_balanced("<")?;
                    let next = self.expect_next("member declaration")?;
                    self.skip_declaration(&next)?;
                }
                "typedef" | "using" => {
                    let register = access == Access::Public;
                    ctx.namespace.push(owner.name.clone());
                    let result = if word == "typedef" {
                        self.parse_typedef(ctx, register)
                    } else {
                        self.parse_using(ctx, register)
                    };
                    ctx.namespace.pop();
                    result?;
                }
                w if w == markers.ignore_start => {
                    self.clear_docs();
                    self.skip_ignore_block()?;
                }
                _ => self.parse_member(ctx, owner, word, access, deprecation, &mut body)?,
            }
        }

        body.end_line = self.reader.current_line();
        Ok(body)
    }

    fn parse_member(
        &mut self,
        ctx: &mut ParseContext,
        owner: &OwnerRef,
        word: String,
        access: Access,
        deprecation: Option<Deprecation>,
        body: &mut RecordBody,
    ) -> Result<(), SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let docs = self.take_docs();

        let mut modifiers = MemberModifiers::default();
        let mut word = word;
        loop {
            match word.as_str() {
                w if w == markers.no_export => modifiers.no_export = true,
                "static" => modifiers.is_static = true,
                "explicit" => modifiers.is_explicit = true,
                "inline" | "constexpr" | "mutable" => {}
                _ => break,
            }
            word = self.expect_next("member declaration")?;
        }

        let public = access == Access::Public;
        body.member_count += 1;
        if modifiers.is_static {
            body.static_count += 1;
        }

        match self.member_kind(&word) {
            MemberKind::Function => {
                let mut function = self.parse_function(ctx, word, Some(owner))?;
                body.function_count += 1;
                if function.is_virtual {
                    body.virtual_count += 1;
                }

                let special = function.is_constructor || function.is_destructor;
                if modifiers.no_export || !(public || special) {
                    return Ok(());
                }
                if body.methods.iter().any(|m| m.same_signature(&function)) {
                    tracing::trace!(name = %function.name, "skipping repeated signature");
                    return Ok(());
                }

                function.is_static |= modifiers.is_static;
                function.is_explicit_converter = modifiers.is_explicit
                    && function.operator == Some(crate::metadata::OperatorKind::Conversion);
                function.is_private |= !public;
                function.docs = docs;
                function.deprecation = deprecation;
                function.unique_name = function_unique_name(&function);
                tracing::trace!(method = %function.unique_name, "found method");
                body.methods.push(function);
            }
            MemberKind::NestedType => {
                body.has_nested_types = true;
                ctx.namespace.push(owner.name.clone());
                let result = self.parse_nested_type(ctx, &word, public, docs);
                ctx.namespace.pop();
                result?;
            }
            MemberKind::Field => {
                let fields = self.parse_fields(ctx, owner, word, modifiers.is_static)?;
                body.field_count += fields.len();
                if public && !modifiers.no_export {
                    body.fields.extend(fields.into_iter().map(|mut f| {
                        f.docs = docs.clone();
                        f
                    }));
                }
            }
        }
        Ok(())
    }

    /// Classifies the member starting at `word` by scanning ahead for the
    /// first of `(`, `;`, `{` or `=` outside template brackets.
    fn member_kind(&self, word: &str) -> MemberKind {
        let config = self.config;
        let is_operator = |w: &str| {
            w.strip_prefix("operator")
                .is_some_and(|rest| !rest.starts_with(is_identifier_char))
        };
        if is_operator(word) {
            return MemberKind::Function;
        }
        let is_type_keyword =
            matches!(word, "enum" | "struct" | "class" | "union") || word == config.markers.interface;

        let text = self.reader.remaining();
        let mut last = word.chars().last().unwrap_or(' ');
        let mut identifier = String::new();
        let mut angle = 0usize;
        let mut i = 0;

        while i < text.len() {
            let c = text[i];
            if is_identifier_char(c) {
                identifier.push(c);
                last = c;
                i += 1;
                continue;
            }
            if identifier == "operator" {
                return MemberKind::Function;
            }
            identifier.clear();

            match c {
                '/' if text.get(i + 1) == Some(&'/') => {
                    while i < text.len() && text[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '/' if text.get(i + 1) == Some(&'*') => {
                    i += 2;
                    while i + 1 < text.len() && !(text[i] == '*' && text[i + 1] == '/') {
                        i += 1;
                    }
                    i += 2;
                    continue;
                }
                '"' | '\'' => {
                    i += 1;
                    while i < text.len() && text[i] != c {
                        if text[i] == '\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                '<' if is_identifier_char(last) => angle += 1,
                '>' if angle > 0 => angle -= 1,
                '(' if angle == 0 => return MemberKind::Function,
                ';' | '=' if angle == 0 => return MemberKind::Field,
                '{' if angle == 0 => {
                    return if is_type_keyword {
                        MemberKind::NestedType
                    } else {
                        MemberKind::Field
                    }
                }
                _ => {}
            }
            if !c.is_whitespace() {
                last = c;
            }
            i += 1;
        }
        MemberKind::Field
    }

    /// Nested enum, struct, class or interface. `ctx.namespace` already
    /// includes the owner's name.
    fn parse_nested_type(
        &mut self,
        ctx: &mut ParseContext,
        word: &str,
        public: bool,
        docs: Vec<String>,
    ) -> Result<(), SourceError> {
        let config = self.config;
        match word {
            "enum" => {
                if let Some(mut e) = self.parse_enum(ctx, true)? {
                    if public {
                        e.docs = docs;
                        ctx.declarations.add_enum(e)?;
                    }
                }
            }
            "struct" => {
                if let Some(mut s) = self.parse_struct(ctx, true)? {
                    if public {
                        s.docs = docs;
                        ctx.declarations.add_struct(s)?;
                    }
                }
            }
            "class" => {
                if let Some(mut c) = self.parse_class(ctx, true)? {
                    if public {
                        c.docs = docs;
                        ctx.declarations.add_class(c)?;
                    }
                }
            }
            w if w == config.markers.interface => {
                if let Some(mut i) = self.parse_interface(ctx, true)? {
                    if public {
                        i.docs = docs;
                        ctx.declarations.add_interface(i)?;
                    }
                }
            }
            _ => self.skip_declaration(word)?,
        }
        Ok(())
    }

    /// One field declaration, possibly declaring several names:
    /// `int x = 1, y[4], z : 3;`. A forward declaration yields nothing.
    fn parse_fields(
        &mut self,
        ctx: &mut ParseContext,
        owner: &OwnerRef,
        word: String,
        is_static: bool,
    ) -> Result<Vec<FieldDescriptor>, SourceError> {
        let location = self.location();
        let (ty, mut word) = self.parse_type(word)?;
        if word == ";" {
            return Ok(Vec::new());
        }
        let Some(ty) = ty else {
            return Err(self.unexpected("field type", "void"));
        };

        let mut fields = Vec::new();
        loop {
            let name = word;
            if !name.starts_with(is_identifier_char) {
                return Err(self.unexpected("field name", &name));
            }

            let mut next = self.expect_next("';' after field")?;
            while next == "[" {
                self.skip_balanced("[")?;
                next = self.expect_next("';' after field")?;
            }
            if next == ":" {
                self.expect_next("bit-field width")?;
                next = self.expect_next("';' after field")?;
            }
            if next == "=" {
                self.reader.take_balanced_until(&[',', ';']);
                next = self.expect_next("';' after field")?;
            } else if next == "{" {
                self.skip_balanced("{")?;
                next = self.expect_next("';' after field")?;
            }

            fields.push(field_descriptor(ctx, owner, &location, name, &ty, is_static));

            match next.as_str() {
                ";" => break,
                "," => word = self.expect_next("field name")?,
                _ => return Err(self.unexpected("';' after field", &next)),
            }
        }
        Ok(fields)
    }
}

fn field_descriptor(
    ctx: &ParseContext,
    owner: &OwnerRef,
    location: &SourceLocation,
    name: String,
    ty: &TypeDescriptor,
    is_static: bool,
) -> FieldDescriptor {
    let accessor = |verb: &str| {
        owner
            .namespace
            .prefix_underscored(&format!("{}__{verb}_{name}", owner.name))
    };
    FieldDescriptor {
        location: location.clone(),
        owner: owner.clone(),
        namespace: ctx.namespace.clone(),
        unique_getter_name: accessor("Get"),
        unique_setter_name: accessor("Set"),
        name,
        ty: ty.clone(),
        is_static,
        docs: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::{SourceError, SourceErrorKind};
    use crate::metadata::PointerKind;
    use crate::parser::parse::{ParseContext, ParseOutput, Parser};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<ParseOutput, SourceError> {
        let config = Config::default();
        let mut parser = Parser::new("test.h", source, &config);
        let mut ctx = ParseContext::new();
        parser.parse_into(&mut ctx)?;
        Ok(ctx.into_output())
    }

    fn parse_err(source: &str) -> SourceErrorKind {
        parse(source).unwrap_err().kind
    }

    #[test]
    fn test_class_members_and_access() {
        let output = parse(
            r#"
namespace ui {
/// A widget.
class WRAP_API Widget : public Base {
public:
    Widget();
    /// Show it.
    void Show(bool animate = true);
    int width = 0, height;
    static const int kMax;
private:
    void Hidden();
    int secret_;
};
}
"#,
        )
        .unwrap();
        let widget = output.declarations.classes.get("ui::Widget").unwrap();
        assert_eq!(widget.docs, vec!["A widget."]);
        assert_eq!(widget.inherits[0].name, "Base");

        let methods: Vec<_> = widget.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["Widget", "Show", "~Widget"]);
        assert!(widget.methods[2].is_synthesized);
        assert_eq!(widget.methods[1].docs, vec!["Show it."]);
        assert_eq!(widget.methods[1].parameters[0].name, "animate");

        let fields: Vec<_> = widget.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["width", "height", "kMax"]);
        assert!(widget.fields[2].is_static);
        assert_eq!(widget.fields[0].unique_getter_name, "ui_Widget__Get_width");
        assert_eq!(widget.fields[0].unique_setter_name, "ui_Widget__Set_width");
        assert!(widget.should_dispose);
        assert!(!widget.is_static);
    }

    #[test]
    fn test_private_destructor_disables_dispose() {
        let output = parse(
            "class WRAP_API Singleton {\npublic:\n  static Singleton& Get();\nprivate:\n  ~Singleton();\n};",
        )
        .unwrap();
        let singleton = output.declarations.classes.get("Singleton").unwrap();
        let destructor = singleton.methods.iter().find(|m| m.is_destructor).unwrap();
        assert!(destructor.is_private);
        assert!(!singleton.should_dispose);
        assert!(singleton.methods.iter().any(|m| m.is_constructor && m.is_synthesized));
    }

    #[test]
    fn test_static_class_has_no_synthesized_members() {
        let output = parse(
            "class WRAP_API Math {\npublic:\n  static int Abs(int v);\n  static const double Pi;\n};",
        )
        .unwrap();
        let math = output.declarations.classes.get("Math").unwrap();
        assert!(math.is_static);
        assert!(!math.should_dispose);
        assert_eq!(math.methods.len(), 1);
        assert!(math.methods[0].is_static);
    }

    #[test]
    fn test_no_dispose_marker() {
        let output = parse("class WRAP_API WRAP_NO_DISPOSE Handle {\npublic:\n  int id;\n};").unwrap();
        assert!(!output.declarations.classes.get("Handle").unwrap().should_dispose);
    }

    #[test]
    fn test_nested_types_take_owner_namespace() {
        let output = parse(
            r#"
namespace app {
class WRAP_API Window {
public:
    enum class State { Open, Closed };
    struct Bounds { int x; int y; };
    State GetState() const;
    Bounds bounds;
private:
    struct Impl { int handle; };
};
}
"#,
        )
        .unwrap();
        let declarations = &output.declarations;
        let state = declarations.enums.get("app::Window::State").unwrap();
        assert!(state.is_nested_type);
        assert_eq!(state.full_safe_type_name, "app_Window_State");
        let bounds = declarations.structs.get("app::Window::Bounds").unwrap();
        assert_eq!(bounds.fields.len(), 2);
        assert!(!declarations.structs.contains_key("app::Window::Impl"));

        let window = declarations.classes.get("app::Window").unwrap();
        assert!(window.has_nested_types);
        assert_eq!(window.fields[0].ty.name, "Bounds");
    }

    #[test]
    fn test_struct_keeps_fields_and_first_base() {
        let output = parse(
            "struct WRAP_API Point3 : Point2 {\n  float z = 0.0f;\n  float Length() const;\n};",
        )
        .unwrap();
        let point = output.declarations.structs.get("Point3").unwrap();
        assert_eq!(point.base.as_ref().unwrap().name, "Point2");
        assert_eq!(point.fields.len(), 1);
        assert_eq!(point.fields[0].ty.name, "float");
    }

    #[test]
    fn test_member_kind_lookahead() {
        let output = parse(
            r#"
class WRAP_API Holder {
public:
    function<void(int)> callback;
    Optional<List<String>> names;
    Map<int, String> lookup{};
    char buffer[16];
    bool operator==(const Holder& other) const;
};
"#,
        )
        .unwrap();
        let holder = output.declarations.classes.get("Holder").unwrap();
        let fields: Vec<_> = holder.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["callback", "names", "lookup", "buffer"]);
        assert!(holder.fields[1].ty.is_optional);
        assert!(holder.methods.iter().any(|m| m.name == "operator=="));
    }

    #[test]
    fn test_deprecated_method() {
        let output = parse(
            "class WRAP_API Old {\npublic:\n  [[deprecated(\"use New\")]] void Run();\n  [[deprecated]] void Walk();\n};",
        )
        .unwrap();
        let old = output.declarations.classes.get("Old").unwrap();
        assert_eq!(
            old.methods[0].deprecation.as_ref().unwrap().message.as_deref(),
            Some("use New")
        );
        assert!(old.methods[1].is_deprecated());
        assert_eq!(old.methods[1].deprecation.as_ref().unwrap().message, None);
    }

    #[test]
    fn test_malformed_deprecation() {
        let kind = parse_err("class WRAP_API Old {\npublic:\n  [[deprecated(42)]] void Run();\n};");
        assert!(matches!(kind, SourceErrorKind::MalformedDeprecation));
    }

    #[test]
    fn test_interface_is_parsed() {
        let output = parse(
            "WRAP_INTERFACE class IListener {\npublic:\n  virtual ~IListener() = default;\n  virtual void OnEvent(int code) = 0;\n};",
        )
        .unwrap();
        let listener = output.declarations.interfaces.get("IListener").unwrap();
        assert_eq!(listener.methods.len(), 2);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_interface_name_warning() {
        let output = parse(
            "WRAP_INTERFACE class Listener {\npublic:\n  virtual ~Listener() {}\n  virtual void OnEvent() = 0;\n};",
        )
        .unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("IName"));
    }

    #[test]
    fn test_interface_errors() {
        let body = |members: &str| format!("WRAP_INTERFACE class IThing {{\npublic:\n{members}\n}};");

        assert!(matches!(
            parse_err(&body("virtual ~IThing();\nint value;")),
            SourceErrorKind::InterfaceHasFields { .. }
        ));
        assert!(matches!(
            parse_err(&body("virtual ~IThing();\nvirtual void Run();")),
            SourceErrorKind::InterfaceNotPureVirtual { ref method, .. } if method == "Run"
        ));
        assert!(matches!(
            parse_err(&body("IThing();\nvirtual ~IThing();\nvirtual void Run() = 0;")),
            SourceErrorKind::InterfaceHasConstructor { .. }
        ));
        assert!(matches!(
            parse_err(&body("virtual void Run() = 0;")),
            SourceErrorKind::InterfaceMissingDestructor { .. }
        ));
        assert!(matches!(
            parse_err(&body("~IThing();\nvirtual void Run() = 0;")),
            SourceErrorKind::InterfaceDestructorNotVirtual { .. }
        ));
    }

    #[test]
    fn test_friend_and_member_templates_are_skipped() {
        let output = parse(
            r#"
class WRAP_API Box {
public:
    friend class Factory;
    template <typename T> T As() const { return T(); }
    using Base::Base;
    typedef int Size;
    int* data;
};
"#,
        )
        .unwrap();
        let b = output.declarations.classes.get("Box").unwrap();
        assert_eq!(b.fields.len(), 1);
        assert_eq!(b.fields[0].ty.pointer, PointerKind::Pointer);
        assert!(output.declarations.typedefs.contains_key("Box::Size"));
        assert!(!b.methods.iter().any(|m| m.name == "As"));
    }
}
