//! Class hierarchy declaration and the linearization cache.
//!
//! A hierarchy is declared up front as a set of named classes with ordered
//! parent lists, then frozen into an immutable [`Hierarchy`] snapshot.
//! Linearizations are computed on demand against that snapshot and cached;
//! redefining a hierarchy means building a new snapshot.
//!
//! # Architecture
//!
//! ```text
//! HierarchyBuilder ── build() ──> Hierarchy
//! ├── declarations (name + parent names)   ├── nodes: Vec<ClassNode>
//! └── declaration-order ids                ├── by_name: FxHashMap
//!                                          └── cache: RwLock<FxHashMap<ClassId, Arc<Mro>>>
//! ```
//!
//! The root class `object` is pre-declared as [`ClassId::ROOT`]. Listing it
//! explicitly as a parent means the same thing as omitting parents.
//!
//! # Thread Safety
//!
//! `Hierarchy` is immutable apart from the read-through cache, which is
//! guarded by an `RwLock`; it can be shared freely across threads.

use crate::intern::{InternedString, intern};
use crate::mro::{ClassId, Mro, MroError, c3_linearize};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Name of the pre-declared universal root.
pub const ROOT_NAME: &str = "object";

/// Stack-allocated parent list. Most classes have one or two parents.
pub type Parents = SmallVec<[ClassId; 2]>;

// =============================================================================
// Class Node
// =============================================================================

/// One class in the hierarchy: a name plus an ordered parent list.
#[derive(Debug, Clone)]
pub struct ClassNode {
    name: InternedString,
    id: ClassId,
    parents: Parents,
}

impl ClassNode {
    /// Class name.
    #[inline]
    pub fn name(&self) -> &InternedString {
        &self.name
    }

    /// Class id.
    #[inline]
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Direct parents, in declaration order. Empty means the class
    /// derives only from the root.
    #[inline]
    pub fn parents(&self) -> &[ClassId] {
        &self.parents
    }
}

// =============================================================================
// Declaration Errors
// =============================================================================

/// Error while freezing declarations into a hierarchy.
///
/// These are rejected before a [`Hierarchy`] exists; linearization itself
/// can only fail with [`MroError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclareError {
    /// The same class name was declared twice.
    DuplicateClass { name: String },

    /// A parent list names a class that was never declared.
    UnknownParent { class: String, parent: String },

    /// A parent list names the same class twice.
    DuplicateParent { class: String, parent: String },
}

impl fmt::Display for DeclareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclareError::DuplicateClass { name } => {
                write!(f, "duplicate class name '{}'", name)
            }
            DeclareError::UnknownParent { class, parent } => {
                write!(f, "class '{}' names unknown parent '{}'", class, parent)
            }
            DeclareError::DuplicateParent { class, parent } => {
                write!(f, "class '{}' lists duplicate parent '{}'", class, parent)
            }
        }
    }
}

impl std::error::Error for DeclareError {}

// =============================================================================
// Builder
// =============================================================================

/// Collects class declarations and freezes them into a [`Hierarchy`].
///
/// Parents may be declared after the classes that reference them; name
/// resolution happens in [`build`](Self::build). Cycles are *not* rejected
/// here — they surface from [`Hierarchy::linearize`] so that unrelated
/// classes in the same hierarchy stay usable.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    declarations: Vec<(InternedString, Vec<InternedString>)>,
}

impl HierarchyBuilder {
    /// Create an empty builder. The root is always present implicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class with its parents in priority order.
    pub fn declare(&mut self, name: &str, parents: &[&str]) -> &mut Self {
        let parent_names = parents.iter().map(|p| intern(p)).collect();
        self.declarations.push((intern(name), parent_names));
        self
    }

    /// Resolve names and freeze the declarations into an immutable snapshot.
    pub fn build(&self) -> Result<Hierarchy, DeclareError> {
        let root_name = intern(ROOT_NAME);

        // Assign dense ids in declaration order, root first.
        let mut by_name: FxHashMap<InternedString, ClassId> = FxHashMap::default();
        by_name.insert(root_name.clone(), ClassId::ROOT);
        for (i, (name, _)) in self.declarations.iter().enumerate() {
            let id = ClassId(i as u32 + 1);
            if by_name.insert(name.clone(), id).is_some() {
                return Err(DeclareError::DuplicateClass {
                    name: name.as_str().to_string(),
                });
            }
        }

        // Resolve parent lists.
        let mut nodes = Vec::with_capacity(self.declarations.len() + 1);
        nodes.push(ClassNode {
            name: root_name,
            id: ClassId::ROOT,
            parents: Parents::new(),
        });
        for (i, (name, parent_names)) in self.declarations.iter().enumerate() {
            let id = ClassId(i as u32 + 1);
            let mut parents = Parents::new();
            for parent_name in parent_names {
                let parent =
                    *by_name
                        .get(parent_name)
                        .ok_or_else(|| DeclareError::UnknownParent {
                            class: name.as_str().to_string(),
                            parent: parent_name.as_str().to_string(),
                        })?;
                if parents.contains(&parent) {
                    return Err(DeclareError::DuplicateParent {
                        class: name.as_str().to_string(),
                        parent: parent_name.as_str().to_string(),
                    });
                }
                parents.push(parent);
            }
            nodes.push(ClassNode {
                name: name.clone(),
                id,
                parents,
            });
        }

        Ok(Hierarchy {
            nodes,
            by_name,
            cache: RwLock::new(FxHashMap::default()),
        })
    }
}

// =============================================================================
// Hierarchy Snapshot
// =============================================================================

/// Visited-set colors for the cycle pre-walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitColor {
    /// Not yet visited.
    White,
    /// On the current descent path.
    Gray,
    /// Fully explored, known acyclic.
    Black,
}

/// An immutable class hierarchy with a read-through linearization cache.
#[derive(Debug)]
pub struct Hierarchy {
    /// All nodes, indexed by `ClassId`.
    nodes: Vec<ClassNode>,

    /// Name index.
    by_name: FxHashMap<InternedString, ClassId>,

    /// Cached linearizations. Populated on demand, never invalidated:
    /// the snapshot itself cannot change.
    cache: RwLock<FxHashMap<ClassId, Arc<Mro>>>,
}

impl Hierarchy {
    /// Number of classes, including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A hierarchy always contains at least the root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Look up a class node by id.
    #[inline]
    pub fn node(&self, id: ClassId) -> Option<&ClassNode> {
        self.nodes.get(id.index())
    }

    /// Look up a class id by name.
    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(&intern(name)).copied()
    }

    /// Name of a class.
    pub fn name_of(&self, id: ClassId) -> Option<&InternedString> {
        self.nodes.get(id.index()).map(ClassNode::name)
    }

    /// Iterate over all classes in id order, root first.
    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.nodes.iter()
    }

    /// Compute (or fetch) the linearization of `id`.
    ///
    /// The cycle pre-walk runs before any merge, so a cyclic declaration
    /// fails with [`MroError::CyclicHierarchy`] without touching the cache.
    /// Results are cached per class; repeated calls return the same
    /// sequence.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a class of this hierarchy.
    pub fn linearize(&self, id: ClassId) -> Result<Arc<Mro>, MroError> {
        assert!(id.index() < self.nodes.len(), "unknown class {:?}", id);

        if let Some(mro) = self.cache.read().get(&id) {
            return Ok(mro.clone());
        }

        if let Some(cycle) = self.find_cycle(id) {
            return Err(MroError::CyclicHierarchy { cycle });
        }

        // The ancestor graph of `id` is acyclic; resolve ancestors
        // bottom-up with an explicit stack so deep chains cannot overflow.
        let mut stack: Vec<ClassId> = vec![id];
        let mut result: Option<Arc<Mro>> = None;
        while let Some(&top) = stack.last() {
            if self.cache.read().contains_key(&top) {
                stack.pop();
                continue;
            }

            let node = &self.nodes[top.index()];
            let mut unresolved = None;
            for &parent in node.parents() {
                if !self.cache.read().contains_key(&parent) {
                    unresolved = Some(parent);
                    break;
                }
            }
            if let Some(parent) = unresolved {
                stack.push(parent);
                continue;
            }

            let parent_mros: Vec<Mro> = {
                let cache = self.cache.read();
                node.parents()
                    .iter()
                    .map(|p| Mro::clone(&cache[p]))
                    .collect()
            };
            let mro = Arc::new(c3_linearize(top, node.parents(), &parent_mros)?);
            if top == id {
                result = Some(mro.clone());
            }
            self.cache.write().insert(top, mro);
            stack.pop();
        }

        match result {
            Some(mro) => Ok(mro),
            // `id` was already resolved as an ancestor of itself earlier
            // in the walk; impossible in an acyclic graph, but the cache
            // read covers the race where another thread computed it first.
            None => Ok(self
                .cache
                .read()
                .get(&id)
                .cloned()
                .unwrap_or_else(|| unreachable!("linearize left {:?} uncached", id))),
        }
    }

    /// Render a linearization error with class names instead of raw ids.
    ///
    /// [`MroError`] carries only ids; the hierarchy owns the name table,
    /// so user-facing messages go through here.
    pub fn describe_error(&self, err: &MroError) -> String {
        match err {
            MroError::CyclicHierarchy { cycle } => {
                let mut out = String::from("cyclic hierarchy: ");
                for (i, &id) in cycle.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" -> ");
                    }
                    out.push_str(self.display_name(id));
                }
                out
            }
            MroError::InconsistentHierarchy { class, conflicting } => {
                let mut out = format!(
                    "cannot create a consistent method resolution order for {} among:",
                    self.display_name(*class)
                );
                for &id in conflicting {
                    out.push(' ');
                    out.push_str(self.display_name(id));
                }
                out
            }
        }
    }

    /// Name for error rendering; errors may cite ids from another
    /// hierarchy, so fall back instead of panicking.
    fn display_name(&self, id: ClassId) -> &str {
        self.name_of(id)
            .map(InternedString::as_str)
            .unwrap_or("<unknown>")
    }

    /// Walk the ancestor graph of `start` looking for a cycle.
    ///
    /// Returns the cycle path (first and last element equal) if one exists.
    fn find_cycle(&self, start: ClassId) -> Option<Vec<ClassId>> {
        let mut colors = vec![VisitColor::White; self.nodes.len()];
        let mut path: Vec<ClassId> = vec![start];
        // (class, index of next parent to visit)
        let mut frames: Vec<(ClassId, usize)> = vec![(start, 0)];
        colors[start.index()] = VisitColor::Gray;

        while !frames.is_empty() {
            let last = frames.len() - 1;
            let (id, cursor) = frames[last];
            let node = &self.nodes[id.index()];

            if cursor < node.parents().len() {
                frames[last].1 = cursor + 1;
                let parent = node.parents()[cursor];
                match colors[parent.index()] {
                    VisitColor::White => {
                        colors[parent.index()] = VisitColor::Gray;
                        path.push(parent);
                        frames.push((parent, 0));
                    }
                    VisitColor::Gray => {
                        // Gray means `parent` is on the current path.
                        let pos = path.iter().position(|&c| c == parent).unwrap_or(0);
                        let mut cycle = path[pos..].to_vec();
                        cycle.push(parent);
                        return Some(cycle);
                    }
                    VisitColor::Black => {}
                }
            } else {
                colors[id.index()] = VisitColor::Black;
                path.pop();
                frames.pop();
            }
        }

        None
    }
}

// =============================================================================
// Tests
// =============================================================================
