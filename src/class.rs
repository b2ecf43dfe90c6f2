//! Method tables and ordered lookup over cached linearizations.
//!
//! Linearization answers *where to search*; this module does the searching.
//! Each class owns a flat method table, and [`MethodResolver`] walks the
//! class's cached linearization checking each table in order. The split
//! keeps the ordering algorithm (`mro`) separate from the trivial part
//! (table lookup).
//!
//! Lookup flavors:
//!
//! - [`MethodResolver::resolve`] - normal dispatch, most-derived class wins
//! - [`MethodResolver::resolve_after`] - cooperative dispatch, searching
//!   only *after* a given class in the linearization (what `super()` does)
//!
//! The resolver also tracks abstract methods: a class is effectively
//! abstract while any abstract method in its linearization lacks a
//! concrete override.

use crate::hierarchy::Hierarchy;
use crate::intern::{InternedString, intern};
use crate::mro::{ClassId, MroError};
use rustc_hash::FxHashMap;
use std::sync::Arc;

// =============================================================================
// Method Definitions
// =============================================================================

bitflags::bitflags! {
    /// Flags describing how a method was defined.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u32 {
        /// Declared abstract; subclasses must provide a concrete override.
        const ABSTRACT = 1 << 0;
        /// Bound to the class rather than the instance.
        const CLASS_METHOD = 1 << 1;
        /// Not bound at all.
        const STATIC_METHOD = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Class-level flags derived from a class's own definitions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClassFlags: u32 {
        /// The class itself declares at least one abstract method.
        ///
        /// Distinct from being *effectively* abstract: a class that only
        /// inherits unimplemented abstract methods does not carry this
        /// flag (see [`MethodResolver::is_abstract`]).
        const ABSTRACT = 1 << 0;
    }
}

/// One method definition in a class's table.
///
/// `B` is the caller's body representation - a function pointer, an index
/// into a code store, a string in tests. The resolver never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef<B> {
    /// Definition flags.
    pub flags: MethodFlags,
    /// The method body, as supplied at definition time.
    pub body: B,
}

impl<B> MethodDef<B> {
    /// A plain concrete method.
    pub fn concrete(body: B) -> Self {
        Self {
            flags: MethodFlags::empty(),
            body,
        }
    }

    /// An abstract method. The body typically carries a placeholder.
    pub fn abstract_def(body: B) -> Self {
        Self {
            flags: MethodFlags::ABSTRACT,
            body,
        }
    }

    /// Check the abstract flag.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }
}

/// Per-class method table: name to definition, plus class-level flags.
#[derive(Debug, Clone)]
pub struct MethodTable<B> {
    methods: FxHashMap<InternedString, MethodDef<B>>,
    flags: ClassFlags,
}

impl<B> Default for MethodTable<B> {
    fn default() -> Self {
        Self {
            methods: FxHashMap::default(),
            flags: ClassFlags::empty(),
        }
    }
}

impl<B> MethodTable<B> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a definition by name.
    #[inline]
    pub fn get(&self, name: &InternedString) -> Option<&MethodDef<B>> {
        self.methods.get(name)
    }

    /// Insert a definition, replacing any previous one for the name.
    ///
    /// Keeps [`ClassFlags::ABSTRACT`] in sync with the table contents, so
    /// redefining the last abstract method concretely clears the flag.
    pub fn insert(&mut self, name: InternedString, def: MethodDef<B>) {
        self.methods.insert(name, def);
        self.flags = if self.methods.values().any(MethodDef::is_abstract) {
            ClassFlags::ABSTRACT
        } else {
            ClassFlags::empty()
        };
    }

    /// Class-level flags.
    #[inline]
    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Iterate over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = (&InternedString, &MethodDef<B>)> {
        self.methods.iter()
    }
}

// =============================================================================
// Resolution Result
// =============================================================================

/// Result of a successful method resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSlot<B> {
    /// The definition that was found.
    pub def: MethodDef<B>,
    /// Class whose table defined the method.
    pub defining_class: ClassId,
    /// Position in the linearization where it was found.
    pub mro_index: u16,
}

// =============================================================================
// Method Resolver
// =============================================================================

/// Resolves method names against a hierarchy's linearizations.
///
/// Owns one [`MethodTable`] per class. Resolution is a plain ordered
/// search: walk the cached linearization, check each class's own table,
/// return the first hit.
#[derive(Debug)]
pub struct MethodResolver<B> {
    hierarchy: Arc<Hierarchy>,
    tables: FxHashMap<ClassId, MethodTable<B>>,
}

impl<B: Clone> MethodResolver<B> {
    /// Create a resolver with empty tables.
    pub fn new(hierarchy: Arc<Hierarchy>) -> Self {
        Self {
            hierarchy,
            tables: FxHashMap::default(),
        }
    }

    /// The hierarchy this resolver dispatches over.
    #[inline]
    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }

    /// Define a concrete method on a class.
    pub fn define(&mut self, class: ClassId, name: &str, body: B) {
        self.tables
            .entry(class)
            .or_default()
            .insert(intern(name), MethodDef::concrete(body));
    }

    /// Define an abstract method on a class.
    pub fn define_abstract(&mut self, class: ClassId, name: &str, body: B) {
        self.tables
            .entry(class)
            .or_default()
            .insert(intern(name), MethodDef::abstract_def(body));
    }

    /// Define a method with explicit flags.
    pub fn define_with_flags(&mut self, class: ClassId, name: &str, flags: MethodFlags, body: B) {
        self.tables
            .entry(class)
            .or_default()
            .insert(intern(name), MethodDef { flags, body });
    }

    /// A class's own table, if it has defined any methods.
    pub fn table(&self, class: ClassId) -> Option<&MethodTable<B>> {
        self.tables.get(&class)
    }

    /// Class-level flags for `class`. Empty when it has no table.
    pub fn class_flags(&self, class: ClassId) -> ClassFlags {
        self.tables
            .get(&class)
            .map(MethodTable::flags)
            .unwrap_or_else(ClassFlags::empty)
    }

    /// Check whether `class` declares an abstract method of its own.
    ///
    /// Unlike [`is_abstract`](Self::is_abstract) this looks only at the
    /// class's own table, not at what it inherits or overrides.
    #[inline]
    pub fn declares_abstract(&self, class: ClassId) -> bool {
        self.class_flags(class).contains(ClassFlags::ABSTRACT)
    }

    /// Resolve a method by walking the class's linearization in order.
    ///
    /// Each class's own table is checked before advancing, so the most
    /// derived definition wins.
    pub fn resolve(
        &self,
        class: ClassId,
        name: &InternedString,
    ) -> Result<Option<MethodSlot<B>>, MroError> {
        let mro = self.hierarchy.linearize(class)?;
        Ok(self.search(&mro, 0, name))
    }

    /// Resolve a method starting *after* `start` in the linearization of
    /// `class`.
    ///
    /// This is cooperative dispatch: a method defined on `start` delegates
    /// to the next definition along `class`'s linearization, which in a
    /// diamond may be a sibling rather than a parent. Returns `None` when
    /// `start` does not appear in the linearization.
    pub fn resolve_after(
        &self,
        class: ClassId,
        start: ClassId,
        name: &InternedString,
    ) -> Result<Option<MethodSlot<B>>, MroError> {
        let mro = self.hierarchy.linearize(class)?;
        let Some(position) = mro.iter().position(|&id| id == start) else {
            return Ok(None);
        };
        Ok(self.search(&mro, position + 1, name))
    }

    /// Ordered search over `mro[from..]`.
    fn search(&self, mro: &[ClassId], from: usize, name: &InternedString) -> Option<MethodSlot<B>> {
        for (offset, &id) in mro[from..].iter().enumerate() {
            if let Some(def) = self.tables.get(&id).and_then(|table| table.get(name)) {
                return Some(MethodSlot {
                    def: def.clone(),
                    defining_class: id,
                    mro_index: (from + offset) as u16,
                });
            }
        }
        None
    }

    // =========================================================================
    // Abstract-Method Bookkeeping
    // =========================================================================

    /// Names of abstract methods that `class` has not overridden.
    ///
    /// A name counts as missing when its *first* definition along the
    /// linearization is abstract - a concrete override anywhere earlier
    /// satisfies it, and an abstract redeclaration does not. Sorted by
    /// name for stable reporting.
    pub fn missing_abstract(&self, class: ClassId) -> Result<Vec<InternedString>, MroError> {
        let mro = self.hierarchy.linearize(class)?;
        let mut first_seen: FxHashMap<InternedString, bool> = FxHashMap::default();
        for &id in mro.iter() {
            if let Some(table) = self.tables.get(&id) {
                for (name, def) in table.iter() {
                    first_seen
                        .entry(name.clone())
                        .or_insert_with(|| def.is_abstract());
                }
            }
        }
        let mut missing: Vec<InternedString> = first_seen
            .into_iter()
            .filter(|(_, is_abstract)| *is_abstract)
            .map(|(name, _)| name)
            .collect();
        missing.sort();
        Ok(missing)
    }

    /// Check whether `class` still carries unimplemented abstract methods.
    pub fn is_abstract(&self, class: ClassId) -> Result<bool, MroError> {
        Ok(!self.missing_abstract(class)?.is_empty())
    }
}

// =============================================================================
// Private-Name Mangling
// =============================================================================

/// Apply private-name mangling to an attribute referenced inside a class
/// body: `__x` inside class `C` becomes `_C__x`.
///
/// Dunder names (`__x__`) and single-underscore names are left alone, and
/// leading underscores are stripped from the class name, matching the
/// mangling rule class-based languages use for name privacy.
pub fn mangle_private(class_name: &str, attr: &str) -> String {
    let is_private = attr.starts_with("__") && !attr.ends_with("__");
    if !is_private {
        return attr.to_string();
    }
    let class_name = class_name.trim_start_matches('_');
    if class_name.is_empty() {
        return attr.to_string();
    }
    format!("_{}{}", class_name, attr)
}

// =============================================================================
// Tests
// =============================================================================
