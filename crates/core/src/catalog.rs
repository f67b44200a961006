//! Host-supplied class hierarchy and field metadata
//!
//! The migration engine never hard-codes the domain's class tree. The host
//! answers hierarchy and field questions through the TypeCatalog trait; the
//! store uses it to build subtype-closure indices and some steps use it to
//! synthesize missing default-valued properties.

use crate::types::TypeName;
use std::collections::HashMap;

/// One field of a class, as described by the host's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Property name as it appears in the serialized form.
    pub name: String,
    /// Basic (value-typed) as opposed to an object pointer property.
    pub basic: bool,
    /// Dynamically-added field, serialized through a `Custom` tag.
    pub custom: bool,
}

/// Class hierarchy and field metadata consulted by the engine.
///
/// Unknown class names answer "nothing" (empty lists, false) rather than
/// erroring; obsolete classes routinely outlive the catalog.
pub trait TypeCatalog {
    /// Names of every class in the catalog.
    fn class_names(&self) -> Vec<TypeName>;

    /// Whether the class is abstract (never instantiated directly).
    fn is_abstract(&self, name: &TypeName) -> bool;

    /// Direct subclasses of the class.
    fn direct_subclasses(&self, name: &TypeName) -> Vec<TypeName>;

    /// Fields of the class (excluding inherited ones).
    fn fields(&self, name: &TypeName) -> Vec<FieldSpec>;

    /// The class and all transitive subclasses, depth-first.
    ///
    /// Includes `name` itself even when the catalog does not know it, so
    /// exact-class queries on obsolete names still work.
    fn with_subclasses(&self, name: &TypeName) -> Vec<TypeName> {
        let mut out = Vec::new();
        let mut work = vec![name.clone()];
        while let Some(current) = work.pop() {
            work.extend(self.direct_subclasses(&current));
            out.push(current);
        }
        out
    }
}

/// One class definition for StaticCatalog.
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Class name.
    pub name: TypeName,
    /// Base class, None for the root.
    pub base: Option<TypeName>,
    /// Abstract classes are never instantiated directly.
    pub is_abstract: bool,
    /// Fields declared on this class.
    pub fields: Vec<FieldSpec>,
}

impl ClassDef {
    /// Concrete class with no fields.
    pub fn concrete(name: &str, base: Option<&str>) -> Self {
        Self {
            name: TypeName::from(name),
            base: base.map(TypeName::from),
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    /// Abstract class with no fields.
    pub fn abstract_class(name: &str, base: Option<&str>) -> Self {
        Self {
            is_abstract: true,
            ..Self::concrete(name, base)
        }
    }

    /// Attach fields.
    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }
}

/// A hierarchy table supplied at construction time.
///
/// Suits hosts whose class tree is known up front (and every test); hosts
/// with a live metadata service implement TypeCatalog directly instead.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    classes: HashMap<TypeName, ClassDef>,
    subclasses: HashMap<TypeName, Vec<TypeName>>,
}

impl StaticCatalog {
    /// Build a catalog from class definitions.
    pub fn new(defs: Vec<ClassDef>) -> Self {
        let mut subclasses: HashMap<TypeName, Vec<TypeName>> = HashMap::new();
        for def in &defs {
            if let Some(base) = &def.base {
                subclasses.entry(base.clone()).or_default().push(def.name.clone());
            }
        }
        let classes = defs.into_iter().map(|d| (d.name.clone(), d)).collect();
        Self {
            classes,
            subclasses,
        }
    }
}

impl TypeCatalog for StaticCatalog {
    fn class_names(&self) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }

    fn is_abstract(&self, name: &TypeName) -> bool {
        self.classes.get(name).map(|d| d.is_abstract).unwrap_or(false)
    }

    fn direct_subclasses(&self, name: &TypeName) -> Vec<TypeName> {
        self.subclasses.get(name).cloned().unwrap_or_default()
    }

    fn fields(&self, name: &TypeName) -> Vec<FieldSpec> {
        self.classes
            .get(name)
            .map(|d| d.fields.clone())
            .unwrap_or_default()
    }
}
