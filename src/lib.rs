//! Class-hierarchy linearization and method resolution.
//!
//! This crate models statically declared class hierarchies with multiple
//! inheritance and computes their Method Resolution Order via C3
//! linearization, then consumes that order for method dispatch:
//!
//! - [`mro`] - the C3 merge itself, plus the two failure modes
//!   (cyclic declarations, contradictory parent orders)
//! - [`hierarchy`] - declaration builder, immutable snapshot, and the
//!   read-through linearization cache
//! - [`class`] - per-class method tables, ordered lookup, cooperative
//!   (`super`-style) lookup, abstract-method bookkeeping
//! - [`subclass`] - precomputed O(1) subclass testing
//! - [`intern`] - shared string handles for class and method names
//!
//! # Example
//!
//! ```
//! use c3mro::HierarchyBuilder;
//!
//! let mut builder = HierarchyBuilder::new();
//! builder
//!     .declare("A", &[])
//!     .declare("B", &["A"])
//!     .declare("C", &["A"])
//!     .declare("D", &["B", "C"]);
//! let hierarchy = builder.build()?;
//!
//! let d = hierarchy.id_of("D").unwrap();
//! let mro = hierarchy.linearize(d)?;
//! let order: Vec<&str> = mro
//!     .iter()
//!     .map(|&id| hierarchy.name_of(id).unwrap().as_str())
//!     .collect();
//! assert_eq!(order, ["D", "B", "C", "A", "object"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod class;
pub mod hierarchy;
pub mod intern;
pub mod mro;
pub mod subclass;

pub use class::{
    ClassFlags, MethodDef, MethodFlags, MethodResolver, MethodSlot, MethodTable, mangle_private,
};
pub use hierarchy::{ClassNode, DeclareError, Hierarchy, HierarchyBuilder, ROOT_NAME};
pub use intern::{InternedString, intern};
pub use mro::{ClassId, Mro, MroError, c3_linearize};
pub use subclass::{AncestorBitmap, SubclassTable};
