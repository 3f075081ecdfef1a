//! The position-indexed candidate lattice (§3, §8 Invariants).

use super::node::Node;

/// A position-indexed set of candidate nodes produced by the lattice builder and threaded
/// through the filter stack, address resolver, and path evaluator.
///
/// Invariants (§8): every position is non-empty; every non-`Address` candidate at a position
/// shares that position's `surface`; an `Address` candidate's `surface` is the concatenation of
/// the surfaces spanned by its `inner_morphemes`, and other candidates at the same starting
/// position still cover only that one position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lattice {
  positions: Vec<Vec<Node>>,
}

impl Lattice {
  /// Builds an empty lattice.
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a lattice from already-populated positions. Panics if any position is empty or if a
  /// non-`Address` candidate disagrees with its position's surface; callers that cannot
  /// guarantee this should build incrementally with [`push`](Self::push) instead.
  pub fn from_positions(positions: Vec<Vec<Node>>) -> Self {
    let lattice = Self { positions };
    debug_assert!(lattice.check_invariants().is_ok());
    lattice
  }

  /// Appends a new position holding `candidates`. `candidates` must be non-empty.
  pub fn push(&mut self, candidates: Vec<Node>) {
    debug_assert!(!candidates.is_empty(), "lattice position must not be empty");
    self.positions.push(candidates);
  }

  /// The number of positions.
  pub fn len(&self) -> usize {
    self.positions.len()
  }

  /// `true` when the lattice has no positions.
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  /// The candidates at position `p`, if it exists.
  pub fn position(&self, p: usize) -> Option<&[Node]> {
    self.positions.get(p).map(Vec::as_slice)
  }

  /// A mutable view onto position `p`'s candidates, if it exists.
  pub fn position_mut(&mut self, p: usize) -> Option<&mut Vec<Node>> {
    self.positions.get_mut(p)
  }

  /// Replaces the candidates at position `p` wholesale.
  pub fn set_position(&mut self, p: usize, candidates: Vec<Node>) {
    debug_assert!(!candidates.is_empty(), "lattice position must not be empty");
    self.positions[p] = candidates;
  }

  /// Iterates positions in index order.
  pub fn positions(&self) -> impl Iterator<Item = &[Node]> {
    self.positions.iter().map(Vec::as_slice)
  }

  /// Consumes the lattice, yielding its positions in index order.
  pub fn into_positions(self) -> Vec<Vec<Node>> {
    self.positions
  }

  /// How far the path evaluator's position cursor advances after choosing `candidate_index` at
  /// position `p`. An `Address` candidate's own `span()` only applies when position `p` also
  /// holds a non-`Address` alternative (the resolver's `CollapsePolicy::Keep` left the spanned
  /// positions in place, so they still need skipping); when every candidate at `p` is an
  /// `Address` (`CollapsePolicy::Replace` already collapsed the span into this one slot), the
  /// cursor only advances by 1.
  pub fn advance_width_at(&self, p: usize, candidate_index: usize) -> usize {
    let candidates = &self.positions[p];
    let Node::Address { inner_morphemes, .. } = &candidates[candidate_index] else {
      return 1;
    };
    let has_non_address = candidates.iter().any(|n| !matches!(n, Node::Address { .. }));
    if has_non_address {
      inner_morphemes.len()
    } else {
      1
    }
  }

  /// Checks the §8 invariants. Returns the index of the first offending position on failure.
  pub fn check_invariants(&self) -> Result<(), usize> {
    for (p, candidates) in self.positions.iter().enumerate() {
      if candidates.is_empty() {
        return Err(p);
      }
      let non_address_surface = candidates.iter().find_map(|n| match n {
        Node::Address { .. } => None,
        other => Some(other.surface()),
      });
      if let Some(expected) = non_address_surface {
        let all_match = candidates
          .iter()
          .filter(|n| !matches!(n, Node::Address { .. }))
          .all(|n| n.surface() == expected);
        if !all_match {
          return Err(p);
        }
      }
    }
    Ok(())
  }
}
