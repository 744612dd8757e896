//! Metadata graph
//!
//! [`Declarations`] is the mutable set of tables the parser fills and the
//! resolver annotates. [`MetadataGraph`] is the finished, read-only snapshot
//! handed to renderers.

mod decls;
mod table;
mod types;

pub use decls::*;
pub use table::Table;
pub use types::*;

use crate::error::{SourceError, SourceErrorKind};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Global declaration tables, keyed by `"namespace::name"`.
///
/// Free functions are keyed by their unique name so overloads coexist. Two
/// overloads whose parse-time names coincide (parameter types with the same
/// name in different namespaces) are kept under `name#2`, `name#3`, ... until
/// the resolver assigns the final names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Declarations {
    pub enums: Table<EnumDescriptor>,
    pub structs: Table<StructDescriptor>,
    pub functions: Table<FunctionDescriptor>,
    pub classes: Table<ClassDescriptor>,
    pub templates: Table<TemplateDescriptor>,
    pub interfaces: Table<InterfaceDescriptor>,
    pub typedefs: Table<TypedefDescriptor>,
}

fn duplicate(name: String, location: &SourceLocation, previous: &SourceLocation) -> SourceError {
    SourceError::new(
        location.clone(),
        SourceErrorKind::DuplicateDeclaration {
            name,
            previous: previous.clone(),
        },
    )
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of whatever type-like declaration already owns `key`.
    fn type_location(&self, key: &str) -> Option<&SourceLocation> {
        self.enums
            .get(key)
            .map(|e| &e.location)
            .or_else(|| self.structs.get(key).map(|s| &s.location))
            .or_else(|| self.classes.get(key).map(|c| &c.location))
            .or_else(|| self.interfaces.get(key).map(|i| &i.location))
            .or_else(|| self.templates.get(key).map(|t| &t.definition.location))
    }

    fn check_type_key(&self, key: &str, location: &SourceLocation) -> Result<(), SourceError> {
        match self.type_location(key) {
            Some(previous) => Err(duplicate(key.to_string(), location, previous)),
            None => Ok(()),
        }
    }

    /// Error for an insert the table refused although the key check passed.
    fn rejected(&self, key: String, location: &SourceLocation) -> SourceError {
        let previous = self
            .type_location(&key)
            .or_else(|| self.typedefs.get(&key).map(|t| &t.location))
            .or_else(|| self.functions.get(&key).map(|f| &f.location))
            .cloned()
            .unwrap_or_default();
        duplicate(key, location, &previous)
    }

    pub fn add_enum(&mut self, value: EnumDescriptor) -> Result<(), SourceError> {
        let key = value.namespace.qualify(&value.name);
        self.check_type_key(&key, &value.location)?;
        self.enums
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.location))
    }

    pub fn add_struct(&mut self, value: StructDescriptor) -> Result<(), SourceError> {
        let key = value.namespace.qualify(&value.name);
        self.check_type_key(&key, &value.location)?;
        self.structs
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.location))
    }

    pub fn add_class(&mut self, value: ClassDescriptor) -> Result<(), SourceError> {
        let key = value.key();
        self.check_type_key(&key, &value.location)?;
        self.classes
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.location))
    }

    pub fn add_interface(&mut self, value: InterfaceDescriptor) -> Result<(), SourceError> {
        let key = value.namespace.qualify(&value.name);
        self.check_type_key(&key, &value.location)?;
        self.interfaces
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.location))
    }

    pub fn add_template(&mut self, value: TemplateDescriptor) -> Result<(), SourceError> {
        let key = value.definition.key();
        self.check_type_key(&key, &value.definition.location)?;
        self.templates
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.definition.location))
    }

    /// A redeclaration with the identical target is accepted and ignored.
    pub fn add_typedef(&mut self, value: TypedefDescriptor) -> Result<(), SourceError> {
        let key = value.key();
        if let Some(existing) = self.typedefs.get(&key) {
            if existing.ty == value.ty {
                return Ok(());
            }
            return Err(duplicate(key, &value.location, &existing.location));
        }
        self.typedefs
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.location))
    }

    /// Free functions are keyed by unique name. A redeclaration of the same
    /// signature keeps the first one; a different overload that happens to
    /// produce the same name is kept under the next free `name#N` key.
    pub fn add_function(&mut self, value: FunctionDescriptor) -> Result<(), SourceError> {
        let base = value.unique_name.clone();
        let mut key = base.clone();
        let mut suffix = 2;
        while let Some(existing) = self.functions.get(&key) {
            if existing.namespace == value.namespace && existing.same_signature(&value) {
                tracing::trace!(function = %base, "skipping repeated declaration");
                return Ok(());
            }
            key = format!("{base}#{suffix}");
            suffix += 1;
        }
        self.functions
            .try_insert(key.clone(), value)
            .map_err(|v| self.rejected(key, &v.location))
    }

    /// Folds another file's declarations into this set, in order.
    pub fn merge(&mut self, other: Declarations) -> Result<(), SourceError> {
        let Declarations {
            enums,
            structs,
            functions,
            classes,
            templates,
            interfaces,
            typedefs,
        } = other;

        for (_, value) in enums.into_entries() {
            self.add_enum(value)?;
        }
        for (_, value) in structs.into_entries() {
            self.add_struct(value)?;
        }
        for (_, value) in functions.into_entries() {
            self.add_function(value)?;
        }
        for (_, value) in classes.into_entries() {
            self.add_class(value)?;
        }
        for (_, value) in templates.into_entries() {
            self.add_template(value)?;
        }
        for (_, value) in interfaces.into_entries() {
            self.add_interface(value)?;
        }
        for (_, value) in typedefs.into_entries() {
            self.add_typedef(value)?;
        }
        Ok(())
    }
}

/// Fully resolved metadata. Read-only; renderers take their own copies
/// when they need to rewrite anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataGraph {
    declarations: Declarations,
}

impl MetadataGraph {
    pub(crate) fn new(declarations: Declarations) -> Self {
        Self { declarations }
    }

    pub fn enums(&self) -> &Table<EnumDescriptor> {
        &self.declarations.enums
    }

    pub fn structs(&self) -> &Table<StructDescriptor> {
        &self.declarations.structs
    }

    pub fn functions(&self) -> &Table<FunctionDescriptor> {
        &self.declarations.functions
    }

    pub fn classes(&self) -> &Table<ClassDescriptor> {
        &self.declarations.classes
    }

    pub fn templates(&self) -> &Table<TemplateDescriptor> {
        &self.declarations.templates
    }

    pub fn interfaces(&self) -> &Table<InterfaceDescriptor> {
        &self.declarations.interfaces
    }

    pub fn typedefs(&self) -> &Table<TypedefDescriptor> {
        &self.declarations.typedefs
    }

    /// Hands the tables back, e.g. to run the resolver again.
    pub fn into_declarations(self) -> Declarations {
        self.declarations
    }

    /// Whether `class_key` has `base_key` anywhere among its bases or
    /// implemented interfaces.
    pub fn derives_from(&self, class_key: &str, base_key: &str) -> bool {
        let mut visited = FxHashSet::default();
        let mut pending = vec![class_key.to_string()];

        while let Some(key) = pending.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let parents: Vec<String> = if let Some(class) = self.declarations.classes.get(&key) {
                class
                    .base
                    .iter()
                    .map(TypeDescriptor::key)
                    .chain(class.interfaces.iter().map(|i| i.ty.key()))
                    .collect()
            } else if let Some(interface) = self.declarations.interfaces.get(&key) {
                interface.interfaces.iter().map(|i| i.ty.key()).collect()
            } else {
                Vec::new()
            };

            if parents.iter().any(|p| p == base_key) {
                return true;
            }
            pending.extend(parents);
        }
        false
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser::parse_source;

    fn declarations(file: &str, source: &str) -> Declarations {
        parse_source(file, source, &Config::default())
            .expect("Parsing failed")
            .declarations
    }

    #[test]
    fn test_merge_rejects_second_definition() {
        let mut all = declarations("a.h", "namespace geo { struct WRAP_API Point { int x; }; }");
        let err = all
            .merge(declarations("b.h", "namespace geo {\nenum Point { X };\n}"))
            .unwrap_err();

        assert_eq!(err.location, SourceLocation::new("b.h", 2));
        match err.kind {
            SourceErrorKind::DuplicateDeclaration { name, previous } => {
                assert_eq!(name, "geo::Point");
                assert_eq!(previous.file, "a.h");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_merge_tolerates_repeated_typedefs_and_prototypes() {
        let mut all = declarations("a.h", "typedef int Id;\nWRAP_API void Touch(Id id);");
        all.merge(declarations("b.h", "typedef int Id;\nWRAP_API void Touch(Id id);"))
            .unwrap();

        assert_eq!(all.typedefs.len(), 1);
        assert_eq!(all.functions.len(), 1);
        assert_eq!(all.functions.values().next().unwrap().location.file, "a.h");

        let err = all.merge(declarations("c.h", "typedef long Id;")).unwrap_err();
        assert!(matches!(err.kind, SourceErrorKind::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_colliding_overload_names_are_kept_apart() {
        let all = declarations(
            "h.h",
            "namespace gfx { struct WRAP_API Shape { int a; }; }\nnamespace ui { struct WRAP_API Shape { int b; }; }\nWRAP_API void Draw(gfx::Shape s);\nWRAP_API void Draw(ui::Shape s);\nWRAP_API void Draw(ui::Shape s);",
        );

        let keys: Vec<&str> = all.functions.keys().collect();
        assert_eq!(keys, vec!["Draw_void_Shape", "Draw_void_Shape#2"]);
        let namespaces: Vec<String> = all
            .functions
            .values()
            .map(|f| f.parameters[0].ty.namespace.to_string())
            .collect();
        assert_eq!(namespaces, vec!["gfx", "ui"]);
    }

    #[test]
    fn test_insert_refusal_reports_previous_location() {
        let mut all = declarations("a.h", "WRAP_API void Ping(int n);");
        let mut other = all.functions.values().next().unwrap().clone();
        other.location = SourceLocation::new("b.h", 7);

        let taken = all.functions.keys().next().unwrap().to_string();
        let err = all.rejected(taken, &other.location);
        assert_eq!(err.location, SourceLocation::new("b.h", 7));
        match err.kind {
            SourceErrorKind::DuplicateDeclaration { name, previous } => {
                assert_eq!(name, "Ping_void_int");
                assert_eq!(previous.file, "a.h");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_derives_from_follows_bases_and_interfaces() {
        let source = r#"
WRAP_INTERFACE class IBase {
public:
    virtual ~IBase() = default;
};
WRAP_INTERFACE class IChild : public IBase {
public:
    virtual ~IChild() = default;
};
class WRAP_API Root {};
class WRAP_API Leaf : public Root, public IChild {};
"#;
        let (graph, _) = crate::resolver::resolve(declarations("h.h", source)).unwrap();

        assert!(graph.derives_from("Leaf", "Root"));
        assert!(graph.derives_from("Leaf", "IBase"));
        assert!(graph.derives_from("IChild", "IBase"));
        assert!(!graph.derives_from("Root", "Leaf"));
        assert!(!graph.derives_from("Missing", "Root"));
    }
}
