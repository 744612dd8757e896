//! Name lookup, typedef substitution and classification.

use super::{walk_declarations, walk_type, Site};
use crate::error::{ResolveError, SourceError, SourceErrorKind};
use crate::metadata::{
    mark_last, signature_with_docs, ClassDescriptor, Declarations, FunctionDescriptor,
    InterfaceDescriptor, InterfaceRef, NamespacePath, Table, TypeClass, TypeDescriptor,
    TypedefDescriptor,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

struct TypedefTarget {
    ty: TypeDescriptor,
    docs: Vec<String>,
}

/// Every name a type reference can resolve to, by qualified key.
pub(crate) struct TypeIndex {
    types: FxHashMap<String, TypeClass>,
    templates: FxHashMap<String, usize>,
    /// Every declared typedef key, collapsed or not.
    typedef_keys: FxHashSet<String>,
    /// Collapsed typedef targets.
    typedefs: FxHashMap<String, TypedefTarget>,
}

impl TypeIndex {
    pub fn build(declarations: &Declarations) -> Self {
        let mut types = FxHashMap::default();
        types.extend(declarations.enums.keys().map(|k| (k.to_string(), TypeClass::Enum)));
        types.extend(declarations.structs.keys().map(|k| (k.to_string(), TypeClass::Struct)));
        types.extend(declarations.classes.keys().map(|k| (k.to_string(), TypeClass::Class)));
        types.extend(declarations.interfaces.keys().map(|k| (k.to_string(), TypeClass::Interface)));

        let templates = declarations
            .templates
            .iter()
            .map(|(k, t)| (k.to_string(), t.parameters.len()))
            .collect();

        let mut index = Self {
            types,
            templates,
            typedef_keys: declarations.typedefs.keys().map(str::to_string).collect(),
            typedefs: FxHashMap::default(),
        };

        // A target may name a typedef declared anywhere, even in a later
        // file, so each one collapses its dependencies first.
        let mut pending: FxHashMap<String, &TypedefDescriptor> = declarations
            .typedefs
            .iter()
            .map(|(key, typedef)| (key.to_string(), typedef))
            .collect();
        for key in declarations.typedefs.keys() {
            index.collapse_typedef(key, &mut pending);
        }
        index
    }

    /// Resolves the target of typedef `key` after the typedefs it names.
    ///
    /// Removing the entry from `pending` before recursing marks it as in
    /// progress, so a cycle stops at the typedef that closes it and leaves
    /// that reference unresolved.
    fn collapse_typedef(&mut self, key: &str, pending: &mut FxHashMap<String, &TypedefDescriptor>) {
        let Some(typedef) = pending.remove(key) else {
            return;
        };
        let site = Site::new(typedef.namespace.clone(), &[], &typedef.location);

        let mut dependencies = Vec::new();
        self.typedef_references(&typedef.ty, &site, &mut dependencies);
        for dependency in dependencies {
            if pending.contains_key(&dependency) {
                self.collapse_typedef(&dependency, pending);
            } else if !self.typedefs.contains_key(&dependency) {
                tracing::debug!(typedef = key, through = %dependency, "typedef cycle");
            }
        }

        let mut ty = typedef.ty.clone();
        self.resolve_tree(&mut ty, &site);
        self.typedefs.insert(
            key.to_string(),
            TypedefTarget {
                ty,
                docs: typedef.docs.clone(),
            },
        );
    }

    /// Keys of the typedefs `ty` and its nested types refer to.
    fn typedef_references(&self, ty: &TypeDescriptor, site: &Site, out: &mut Vec<String>) {
        if !ty.is_resolved && ty.signature.is_none() && !site.is_template_param(ty) {
            if let Some(key) = self.find(&site.scope, &ty.namespace, &ty.name) {
                if self.is_typedef(&key) {
                    out.push(key);
                }
            }
        }
        for arg in &ty.template_arguments {
            self.typedef_references(&arg.ty, site, out);
        }
        if let Some(signature) = ty.signature.as_deref() {
            if let Some(ret) = signature.return_type.as_ref() {
                self.typedef_references(ret, site, out);
            }
            for param in &signature.parameters {
                self.typedef_references(&param.ty, site, out);
            }
        }
    }

    /// Typedef keys that no real type or template shadows.
    fn is_typedef(&self, key: &str) -> bool {
        self.typedef_keys.contains(key)
            && !self.types.contains_key(key)
            && !self.templates.contains_key(key)
    }

    pub fn class_of(&self, key: &str) -> Option<TypeClass> {
        self.types.get(key).copied().or_else(|| {
            self.templates
                .contains_key(key)
                .then_some(TypeClass::Template)
        })
    }

    pub fn template_arity(&self, key: &str) -> Option<usize> {
        self.templates.get(key).copied()
    }

    fn is_known(&self, key: &str) -> bool {
        self.types.contains_key(key)
            || self.typedef_keys.contains(key)
            || self.templates.contains_key(key)
    }

    /// Innermost-scope-first search for the key `written` refers to.
    fn find(&self, scope: &NamespacePath, written: &NamespacePath, name: &str) -> Option<String> {
        let mut current = Some(scope.clone());
        while let Some(ns) = current {
            let key = ns.join(written).qualify(name);
            if self.is_known(&key) {
                return Some(key);
            }
            current = ns.parent();
        }
        None
    }

    /// Qualifies one reference in place and substitutes typedefs.
    ///
    /// Already resolved references and template parameters are left alone.
    pub fn resolve(&self, ty: &mut TypeDescriptor, site: &Site) {
        if ty.is_resolved || ty.signature.is_some() || site.is_template_param(ty) {
            return;
        }
        let Some(key) = self.find(&site.scope, &ty.namespace, &ty.name) else {
            return;
        };

        if self.is_typedef(&key) {
            match self.typedefs.get(&key) {
                Some(target) => substitute_typedef(ty, target),
                None => tracing::debug!(typedef = %key, "cyclic typedef left unresolved"),
            }
            return;
        }

        let mut parts = NamespacePath::parse(&key);
        parts.pop();
        tracing::trace!(from = %ty.key(), to = %key, "resolved");
        ty.namespace = parts;
        ty.is_resolved = true;
    }

    pub fn resolve_tree(&self, ty: &mut TypeDescriptor, site: &Site) {
        let _ = walk_type(ty, site, &mut |node, site| {
            self.resolve(node, site);
            Ok(())
        });
    }
}

/// Replaces a typedef reference with its target, keeping the qualifiers
/// written at the use site.
fn substitute_typedef(ty: &mut TypeDescriptor, target: &TypedefTarget) {
    let mut replacement = target.ty.clone();
    replacement.pointer = target.ty.pointer.compose(ty.pointer);
    replacement.is_const |= ty.is_const;
    replacement.is_optional |= ty.is_optional;
    if let Some(signature) = replacement.signature.as_deref() {
        replacement.signature = Some(Box::new(signature_with_docs(signature, &target.docs)));
    }
    // Unresolvable targets must not be looked up again from the use site.
    replacement.is_resolved = true;
    *ty = replacement;
}

/// Pass 2: fully qualifies every reference and drops typedefs to templates.
pub(super) fn resolve_namespaces(
    declarations: &mut Declarations,
    index: &TypeIndex,
) -> Result<(), ResolveError> {
    walk_declarations(declarations, &mut |ty, site| {
        index.resolve(ty, site);
        Ok(())
    })?;

    declarations.typedefs.retain(|key, typedef| {
        let keep = !typedef.ty.is_template();
        if !keep {
            tracing::debug!(typedef = key, "dropping template typedef");
        }
        keep
    });
    Ok(())
}

/// Pass 3: assigns a [`TypeClass`] to every reference, then splits class
/// inheritance into the base class and implemented interfaces.
pub(super) fn classify(declarations: &mut Declarations, index: &TypeIndex) -> Result<(), ResolveError> {
    walk_declarations(declarations, &mut |ty, site| {
        ty.class = classify_reference(ty, site, index);
        Ok(())
    })?;

    for class in declarations.classes.values_mut() {
        split_inheritance(class)?;
    }
    for template in declarations.templates.values_mut() {
        split_inheritance(&mut template.definition)?;
    }

    let bases = interface_bases(&mut declarations.interfaces)?;

    for class in declarations.classes.values_mut() {
        mark_implementations(class, &bases, &declarations.interfaces)?;
    }
    for template in declarations.templates.values_mut() {
        mark_implementations(&mut template.definition, &bases, &declarations.interfaces)?;
    }
    Ok(())
}

fn classify_reference(ty: &TypeDescriptor, site: &Site, index: &TypeIndex) -> Option<TypeClass> {
    if ty.is_template_argument || site.is_template_param(ty) {
        return None;
    }
    if ty.signature.is_some() {
        return Some(TypeClass::FunctionSignature);
    }
    if ty.is_string {
        return Some(TypeClass::String);
    }
    if ty.is_resolved {
        if let Some(class) = index.class_of(&ty.key()) {
            return Some(class);
        }
    }
    if ty.is_template() {
        Some(TypeClass::Template)
    } else {
        Some(TypeClass::Primitive)
    }
}

fn split_inheritance(class: &mut ClassDescriptor) -> Result<(), ResolveError> {
    let mut base: Option<TypeDescriptor> = None;
    let mut interfaces = Vec::new();

    for ty in &class.inherits {
        match ty.class {
            Some(TypeClass::Class | TypeClass::Template) => {
                if let Some(first) = &base {
                    return Err(SourceError::new(
                        class.location.clone(),
                        SourceErrorKind::MultipleBaseClasses {
                            name: class.name.clone(),
                            first: first.key(),
                            second: ty.key(),
                        },
                    )
                    .into());
                }
                base = Some(ty.clone());
            }
            Some(TypeClass::Interface) => interfaces.push(InterfaceRef {
                name: ty.name.clone(),
                ty: ty.clone(),
                is_last: false,
            }),
            _ => tracing::debug!(class = %class.key(), base = %ty.key(), "ignoring unknown base"),
        }
    }

    mark_last(&mut interfaces, |i, last| i.is_last = last);
    class.has_interfaces = !interfaces.is_empty();
    class.interfaces = interfaces;
    class.base = base;
    Ok(())
}

/// Validates interface bases and returns, per interface key, the keys of
/// the interfaces it directly extends.
fn interface_bases(
    interfaces: &mut Table<InterfaceDescriptor>,
) -> Result<FxHashMap<String, Vec<String>>, ResolveError> {
    let mut bases = FxHashMap::default();
    for interface in interfaces.values_mut() {
        let mut refs = Vec::new();
        for ty in &interface.inherits {
            if ty.class != Some(TypeClass::Interface) {
                return Err(SourceError::new(
                    interface.location.clone(),
                    SourceErrorKind::InterfaceNonInterfaceBase {
                        name: interface.name.clone(),
                        base: ty.key(),
                    },
                )
                .into());
            }
            refs.push(InterfaceRef {
                name: ty.name.clone(),
                ty: ty.clone(),
                is_last: false,
            });
        }
        mark_last(&mut refs, |i, last| i.is_last = last);
        interface.has_interfaces = !refs.is_empty();
        bases.insert(
            interface.namespace.qualify(&interface.name),
            refs.iter().map(|r| r.ty.key()).collect(),
        );
        interface.interfaces = refs;
    }
    Ok(bases)
}

/// Flags every method that implements a method of one of the class's
/// interfaces, directly or through interface inheritance.
fn mark_implementations(
    class: &mut ClassDescriptor,
    bases: &FxHashMap<String, Vec<String>>,
    interfaces: &Table<InterfaceDescriptor>,
) -> Result<(), ResolveError> {
    if class.interfaces.is_empty() {
        return Ok(());
    }

    let mut queue: VecDeque<String> = class.interfaces.iter().map(|i| i.ty.key()).collect();
    let mut visited = FxHashSet::default();
    let mut inherited: Vec<&FunctionDescriptor> = Vec::new();

    while let Some(key) = queue.pop_front() {
        if !visited.insert(key.clone()) {
            continue;
        }
        let interface = interfaces.get(&key).ok_or_else(|| {
            ResolveError::Internal(format!(
                "'{}' implements '{key}', which is classified as an interface but not declared",
                class.key()
            ))
        })?;
        inherited.extend(interface.methods.iter().filter(|m| !m.is_destructor));
        if let Some(next) = bases.get(&key) {
            queue.extend(next.iter().cloned());
        }
    }

    for method in &mut class.methods {
        if method.is_constructor || method.is_destructor {
            continue;
        }
        method.is_interface_implementation = inherited.iter().any(|m| m.same_signature(method));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::metadata::PointerKind;
    use crate::parser::parse_source;
    use pretty_assertions::assert_eq;

    fn declarations(source: &str) -> Declarations {
        parse_source("test.h", source, &Config::default())
            .unwrap()
            .declarations
    }

    fn resolved(source: &str) -> Result<Declarations, ResolveError> {
        let mut decls = declarations(source);
        let index = TypeIndex::build(&decls);
        resolve_namespaces(&mut decls, &index)?;
        classify(&mut decls, &index)?;
        Ok(decls)
    }

    #[test]
    fn test_lookup_searches_outward() {
        let decls = resolved(
            "namespace eggs {\nnamespace and {\nstruct WRAP_API bacon { int x; };\n}\n\
             namespace and { namespace more {\nWRAP_API and::bacon Fry(bacon b);\n}}\n}",
        )
        .unwrap();

        let fry = decls.functions.values().next().unwrap();
        let ret = fry.return_type.as_ref().unwrap();
        assert_eq!(ret.key(), "eggs::and::bacon");
        assert!(ret.is_resolved);
        assert_eq!(ret.class, Some(TypeClass::Struct));
        assert_eq!(fry.parameters[0].ty.key(), "eggs::and::bacon");
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let decls = resolved(
            "enum class WRAP_API Mode { A };\nnamespace ui {\nenum class WRAP_API Mode { B };\nWRAP_API void Set(Mode m);\n}",
        )
        .unwrap();

        let set = decls.functions.values().next().unwrap();
        assert_eq!(set.parameters[0].ty.key(), "ui::Mode");
        assert_eq!(set.parameters[0].ty.class, Some(TypeClass::Enum));
    }

    #[test]
    fn test_typedef_is_transparent() {
        let decls = resolved(
            "namespace net {\n/// Port number\ntypedef unsigned int Port;\nWRAP_API void Listen(const Port& port);\n}",
        )
        .unwrap();

        let listen = decls.functions.values().next().unwrap();
        let ty = &listen.parameters[0].ty;
        assert_eq!(ty.name, "unsigned int");
        assert!(ty.namespace.is_empty());
        assert!(ty.is_const);
        assert_eq!(ty.pointer, PointerKind::Reference);
        assert_eq!(ty.class, Some(TypeClass::Primitive));
    }

    #[test]
    fn test_typedef_chain_declared_out_of_order() {
        let decls = resolved(
            "namespace n {\ntypedef Id Handle;\nWRAP_API void Use(Handle h);\ntypedef unsigned int Id;\n}",
        )
        .unwrap();

        let ty = &decls.functions.values().next().unwrap().parameters[0].ty;
        assert_eq!(ty.name, "unsigned int");
        assert!(ty.namespace.is_empty());
        assert_eq!(ty.class, Some(TypeClass::Primitive));
        assert_eq!(decls.typedefs.get("n::Handle").unwrap().ty.name, "unsigned int");
    }

    #[test]
    fn test_typedef_cycle_terminates() {
        let decls = resolved("typedef B A;\ntypedef A B;\nWRAP_API void Loop(A a);").unwrap();
        let ty = &decls.functions.values().next().unwrap().parameters[0].ty;
        assert!(ty.is_resolved);
    }

    #[test]
    fn test_typedef_pointer_levels_combine() {
        let decls = resolved(
            "struct WRAP_API Foo { int x; };\ntypedef Foo* FooPtr;\nWRAP_API void Take(FooPtr& p);\nWRAP_API void Give(const FooPtr p);",
        )
        .unwrap();

        let param = |name: &str| {
            let function = decls.functions.values().find(|f| f.name == name).unwrap();
            function.parameters[0].ty.clone()
        };
        let take = param("Take");
        assert_eq!(take.key(), "Foo");
        assert_eq!(take.pointer, PointerKind::PointerPointer);
        assert_eq!(take.class, Some(TypeClass::Struct));

        let give = param("Give");
        assert_eq!(give.pointer, PointerKind::Pointer);
        assert!(give.is_const);
    }

    #[test]
    fn test_callback_typedef_carries_docs() {
        let decls = resolved(
            "/// Called when done\nusing Done = function<void(int code)>;\nWRAP_API void Run(Done done);",
        )
        .unwrap();

        let run = decls.functions.values().next().unwrap();
        let ty = &run.parameters[0].ty;
        assert_eq!(ty.class, Some(TypeClass::FunctionSignature));
        assert_eq!(ty.signature.as_ref().unwrap().docs, vec!["Called when done"]);
    }

    #[test]
    fn test_template_typedefs_are_dropped() {
        let decls = resolved(
            "template <typename T>\nclass WRAP_API List {\npublic:\n  T Get();\n};\nusing Ints = List<int>;\nusing Id = int;",
        )
        .unwrap();

        assert!(decls.typedefs.get("Ints").is_none());
        assert!(decls.typedefs.get("Id").is_some());
    }

    #[test]
    fn test_unknown_names_become_primitive() {
        let decls = resolved("WRAP_API std::string Name(String s);").unwrap();
        let name = decls.functions.values().next().unwrap();
        assert_eq!(name.return_type.as_ref().unwrap().class, Some(TypeClass::Primitive));
        assert_eq!(name.parameters[0].ty.class, Some(TypeClass::String));
    }

    #[test]
    fn test_inheritance_is_split() {
        let decls = resolved(
            "WRAP_INTERFACE class IShape {\npublic:\n  virtual ~IShape() = default;\n  virtual double Area() const = 0;\n};\n\
             WRAP_INTERFACE class INamed {\npublic:\n  virtual ~INamed() = default;\n};\n\
             class WRAP_API Node {\npublic:\n  Node();\n};\n\
             class WRAP_API Circle : public Node, public IShape, public INamed {\npublic:\n  double Area() const;\n  double Radius() const;\n};",
        )
        .unwrap();

        let circle = decls.classes.get("Circle").unwrap();
        assert_eq!(circle.base.as_ref().unwrap().key(), "Node");
        let names: Vec<_> = circle.interfaces.iter().map(|i| (i.name.as_str(), i.is_last)).collect();
        assert_eq!(names, vec![("IShape", false), ("INamed", true)]);
        assert!(circle.has_interfaces);

        let area = circle.methods.iter().find(|m| m.name == "Area").unwrap();
        let radius = circle.methods.iter().find(|m| m.name == "Radius").unwrap();
        assert!(area.is_interface_implementation);
        assert!(!radius.is_interface_implementation);
    }

    #[test]
    fn test_inherited_interface_methods_are_found() {
        let decls = resolved(
            "WRAP_INTERFACE class IBase {\npublic:\n  virtual ~IBase() = default;\n  virtual void Reset() = 0;\n};\n\
             WRAP_INTERFACE class IDerived : public IBase {\npublic:\n  virtual ~IDerived() = default;\n};\n\
             class WRAP_API Impl : public IDerived {\npublic:\n  void Reset();\n};",
        )
        .unwrap();

        assert!(decls.interfaces.get("IDerived").unwrap().has_interfaces);
        let reset = &decls.classes.get("Impl").unwrap().methods[0];
        assert_eq!(reset.name, "Reset");
        assert!(reset.is_interface_implementation);
    }

    #[test]
    fn test_two_base_classes_are_rejected() {
        let err = resolved(
            "class WRAP_API A {};\nclass WRAP_API B {};\nclass WRAP_API C : public A, public B {};",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Source(SourceError {
                kind: SourceErrorKind::MultipleBaseClasses { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_interface_with_class_base_is_rejected() {
        let err = resolved(
            "class WRAP_API A {};\nWRAP_INTERFACE class IThing : public A {\npublic:\n  virtual ~IThing() = default;\n};",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Source(SourceError {
                kind: SourceErrorKind::InterfaceNonInterfaceBase { .. },
                ..
            })
        ));
    }
}
