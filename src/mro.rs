//! C3 linearization of class hierarchies.
//!
//! Given a class and the linearizations of its direct parents, [`c3_linearize`]
//! computes the Method Resolution Order: the single, duplicate-free search
//! order used for every attribute lookup on that class.
//!
//! # Algorithm
//!
//! ```text
//! L[C] = [C] + merge(L[P1], ..., L[Pn], [P1, ..., Pn])
//! ```
//!
//! The merge repeatedly selects the earliest input list whose head does not
//! appear in the *tail* (any non-head position) of another list, emits that
//! head, and pops it from every list where it sits at the front. Preferring
//! the earliest list preserves left-to-right parent priority; the tail check
//! guarantees a class is never emitted before one of its subclasses.
//!
//! # Example
//!
//! ```text
//!       A              L[D] = [D] + merge(L[B], L[C], [B, C])
//!      / \                  = [D, B, C, A, object]
//!     B   C
//!      \ /
//!       D(B, C)
//! ```
//!
//! When two parents disagree on the relative order of a shared ancestor the
//! merge gets stuck with every head blocked, and the hierarchy is rejected
//! with [`MroError::InconsistentHierarchy`].

use smallvec::SmallVec;
use smallvec::smallvec;
use std::fmt;

// =============================================================================
// Class Identity
// =============================================================================

/// Identifier of a class within one hierarchy.
///
/// Ids are dense and allocated in declaration order, so they double as
/// indexes into per-class side tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    /// The universal root (`object`). Every linearization ends here.
    pub const ROOT: ClassId = ClassId(0);

    /// Raw id value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this is the universal root.
    #[inline]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }

    /// Index into dense per-class tables.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Method Resolution Order for one class.
///
/// Stack-allocated up to 8 entries; hierarchies deeper than that spill to
/// the heap.
pub type Mro = SmallVec<[ClassId; 8]>;

// =============================================================================
// Errors
// =============================================================================

/// Failure to linearize a class.
///
/// Both kinds are fatal to the requesting class only; unrelated classes in
/// the same hierarchy remain linearizable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MroError {
    /// The declared parent graph contains a cycle.
    ///
    /// Detected by a visited-set walk before any merge is attempted. The
    /// cycle path starts and ends at the same class.
    CyclicHierarchy { cycle: Vec<ClassId> },

    /// No merge order satisfies all parent linearizations.
    ///
    /// `conflicting` holds the candidate heads whose relative order could
    /// not be resolved.
    InconsistentHierarchy {
        class: ClassId,
        conflicting: Vec<ClassId>,
    },
}

impl fmt::Display for MroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MroError::CyclicHierarchy { cycle } => {
                write!(f, "cyclic hierarchy: ")?;
                for (i, id) in cycle.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "#{}", id.raw())?;
                }
                Ok(())
            }
            MroError::InconsistentHierarchy { class, conflicting } => {
                write!(
                    f,
                    "cannot create a consistent method resolution order for #{} among:",
                    class.raw()
                )?;
                for id in conflicting {
                    write!(f, " #{}", id.raw())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MroError {}

// =============================================================================
// C3 Linearization
// =============================================================================

/// Compute the C3 linearization of `node`.
///
/// # Arguments
///
/// * `node` - The class being linearized
/// * `bases` - Direct parents, in declaration order
/// * `base_mros` - Each parent's own linearization, in the same order
///
/// # Returns
///
/// The full linearization `[node, ..., ROOT]`, or
/// [`MroError::InconsistentHierarchy`] when the parent orders contradict
/// each other. Cycle detection is the caller's responsibility and must
/// happen before the parent linearizations are resolved.
pub fn c3_linearize(node: ClassId, bases: &[ClassId], base_mros: &[Mro]) -> Result<Mro, MroError> {
    debug_assert_eq!(bases.len(), base_mros.len());

    if bases.is_empty() {
        // A parentless class derives directly from the root.
        return Ok(if node.is_root() {
            smallvec![node]
        } else {
            smallvec![node, ClassId::ROOT]
        });
    }

    // Merge inputs: every parent linearization, then the literal parent
    // list. The parent list keeps declaration order binding even between
    // parents that share no ancestors.
    let mut sequences: Vec<Vec<ClassId>> = Vec::with_capacity(base_mros.len() + 1);
    for mro in base_mros {
        sequences.push(mro.to_vec());
    }
    sequences.push(bases.to_vec());

    let mut result = Mro::new();
    result.push(node);
    merge(node, sequences, &mut result)?;
    Ok(result)
}

/// The C3 merge step. Appends to `out` until every sequence is exhausted.
fn merge(node: ClassId, sequences: Vec<Vec<ClassId>>, out: &mut Mro) -> Result<(), MroError> {
    let mut heads = vec![0usize; sequences.len()];

    loop {
        // Done when every sequence has been consumed.
        if sequences
            .iter()
            .zip(&heads)
            .all(|(seq, &head)| head >= seq.len())
        {
            return Ok(());
        }

        match select_head(&sequences, &heads) {
            Some(candidate) => {
                out.push(candidate);
                // Pop the candidate wherever it sits at the front.
                for (seq, head) in sequences.iter().zip(heads.iter_mut()) {
                    if *head < seq.len() && seq[*head] == candidate {
                        *head += 1;
                    }
                }
            }
            None => {
                // Every remaining head is blocked: the declared orders
                // contradict each other.
                let mut conflicting = Vec::new();
                for (seq, &head) in sequences.iter().zip(&heads) {
                    if head < seq.len() && !conflicting.contains(&seq[head]) {
                        conflicting.push(seq[head]);
                    }
                }
                return Err(MroError::InconsistentHierarchy {
                    class: node,
                    conflicting,
                });
            }
        }
    }
}

/// Find the earliest head that appears in no sequence's tail.
fn select_head(sequences: &[Vec<ClassId>], heads: &[usize]) -> Option<ClassId> {
    'candidates: for (seq, &head) in sequences.iter().zip(heads) {
        if head >= seq.len() {
            continue;
        }
        let candidate = seq[head];
        for (other, &other_head) in sequences.iter().zip(heads) {
            if other_head < other.len() && other[other_head + 1..].contains(&candidate) {
                continue 'candidates;
            }
        }
        return Some(candidate);
    }
    None
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: ClassId = ClassId::ROOT;

    fn mro(ids: &[u32]) -> Mro {
        ids.iter().map(|&i| ClassId(i)).collect()
    }

    #[test]
    fn test_root_linearizes_to_itself() {
        let result = c3_linearize(ROOT, &[], &[]).unwrap();
        assert_eq!(result, mro(&[0]));
    }

    #[test]
    fn test_parentless_class() {
        let result = c3_linearize(ClassId(1), &[], &[]).unwrap();
        assert_eq!(result, mro(&[1, 0]));
    }

    #[test]
    fn test_single_inheritance_chain() {
        // C(1) <- B(2) <- A(3)
        let c = c3_linearize(ClassId(1), &[], &[]).unwrap();
        let b = c3_linearize(ClassId(2), &[ClassId(1)], &[c.clone()]).unwrap();
        let a = c3_linearize(ClassId(3), &[ClassId(2)], &[b.clone()]).unwrap();

        assert_eq!(b, mro(&[2, 1, 0]));
        assert_eq!(a, mro(&[3, 2, 1, 0]));
    }

    #[test]
    fn test_diamond() {
        // A(1); B(2) and C(3) derive from A; D(4) derives from (B, C).
        let a = c3_linearize(ClassId(1), &[], &[]).unwrap();
        let b = c3_linearize(ClassId(2), &[ClassId(1)], &[a.clone()]).unwrap();
        let c = c3_linearize(ClassId(3), &[ClassId(1)], &[a.clone()]).unwrap();
        let d = c3_linearize(ClassId(4), &[ClassId(2), ClassId(3)], &[b, c]).unwrap();

        assert_eq!(d, mro(&[4, 2, 3, 1, 0]));
    }

    #[test]
    fn test_node_first_root_last() {
        let a = c3_linearize(ClassId(1), &[], &[]).unwrap();
        let b = c3_linearize(ClassId(2), &[ClassId(1)], &[a]).unwrap();
        assert_eq!(b[0], ClassId(2));
        assert_eq!(*b.last().unwrap(), ROOT);
    }

    #[test]
    fn test_each_ancestor_appears_once() {
        let a = c3_linearize(ClassId(1), &[], &[]).unwrap();
        let b = c3_linearize(ClassId(2), &[ClassId(1)], &[a.clone()]).unwrap();
        let c = c3_linearize(ClassId(3), &[ClassId(1)], &[a]).unwrap();
        let d = c3_linearize(ClassId(4), &[ClassId(2), ClassId(3)], &[b, c]).unwrap();

        for (i, id) in d.iter().enumerate() {
            assert!(!d[i + 1..].contains(id), "duplicate entry {:?}", id);
        }
    }

    #[test]
    fn test_conflicting_orders_rejected() {
        // X(A, B) and Y(B, A) disagree on the order of A and B, so
        // Z(X, Y) cannot be linearized.
        let a = c3_linearize(ClassId(1), &[], &[]).unwrap();
        let b = c3_linearize(ClassId(2), &[], &[]).unwrap();
        let x = c3_linearize(ClassId(3), &[ClassId(1), ClassId(2)], &[a.clone(), b.clone()])
            .unwrap();
        let y = c3_linearize(ClassId(4), &[ClassId(2), ClassId(1)], &[b, a]).unwrap();

        assert_eq!(x, mro(&[3, 1, 2, 0]));
        assert_eq!(y, mro(&[4, 2, 1, 0]));

        let err = c3_linearize(ClassId(5), &[ClassId(3), ClassId(4)], &[x, y]).unwrap_err();
        match err {
            MroError::InconsistentHierarchy { class, conflicting } => {
                assert_eq!(class, ClassId(5));
                assert!(conflicting.contains(&ClassId(1)));
                assert!(conflicting.contains(&ClassId(2)));
            }
            other => panic!("expected InconsistentHierarchy, got {:?}", other),
        }
    }

    #[test]
    fn test_left_to_right_priority_without_shared_ancestors() {
        // B(2) derives from P(1), C(4) derives from Q(3); E(5) derives
        // from (B, C). All of B's branch precedes all of C's branch.
        let p = c3_linearize(ClassId(1), &[], &[]).unwrap();
        let b = c3_linearize(ClassId(2), &[ClassId(1)], &[p]).unwrap();
        let q = c3_linearize(ClassId(3), &[], &[]).unwrap();
        let c = c3_linearize(ClassId(4), &[ClassId(3)], &[q]).unwrap();
        let e = c3_linearize(ClassId(5), &[ClassId(2), ClassId(4)], &[b, c]).unwrap();

        assert_eq!(e, mro(&[5, 2, 1, 4, 3, 0]));
    }

    #[test]
    fn test_explicit_root_parent_matches_implicit() {
        let root_mro: Mro = smallvec![ROOT];
        let explicit = c3_linearize(ClassId(1), &[ROOT], &[root_mro]).unwrap();
        let implicit = c3_linearize(ClassId(1), &[], &[]).unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_error_display_names_participants() {
        let err = MroError::InconsistentHierarchy {
            class: ClassId(5),
            conflicting: vec![ClassId(1), ClassId(2)],
        };
        let text = err.to_string();
        assert!(text.contains("#5"));
        assert!(text.contains("#1"));
        assert!(text.contains("#2"));
    }
}
