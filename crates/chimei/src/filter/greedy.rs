//! `GreedySearchFilter` (§4.4.2): a pile-compacted port of `GreedySearchFilter.apply()`/
//! `_get_best()` (`pygeonlp/api/filter.py`). Builds a compacted list of the lattice positions
//! that actually hold a Geoword candidate (skipping positions entirely spanned by an Address
//! candidate), then widens outward over *that* compacted list — not over raw lattice positions —
//! scoring against one hint position at a time rather than an accumulated window.

use super::Filter;
use crate::errors::GeoparserResult;
use crate::model::{Lattice, Node};
use crate::scorer::Scorer;

/// Narrows multi-candidate positions by scoring each candidate's affinity to a single
/// neighboring geoword "hint" position, widening outward until a unique winner is found. Never
/// empties a position, so there is no fallback policy to configure.
pub struct GreedySearchFilter<'a> {
  scorer: &'a dyn Scorer,
}

impl<'a> GreedySearchFilter<'a> {
  /// Builds the filter against `scorer`.
  pub fn new(scorer: &'a dyn Scorer) -> Self {
    Self { scorer }
  }

  /// Builds the compacted pile: `(position, geowords-at-that-position)` pairs, in lattice order,
  /// skipping positions fully consumed by an Address candidate.
  fn build_pile(positions: &[&[Node]]) -> Vec<(usize, Vec<Node>)> {
    let mut pile = Vec::new();
    let mut n = 0usize;
    while n < positions.len() {
      let mut geowords: Vec<Node> = Vec::new();
      let mut skip = 0usize;
      for node in positions[n] {
        if let Node::Address { inner_morphemes, .. } = node {
          geowords.clear();
          skip = inner_morphemes.len().saturating_sub(1);
          break;
        } else if matches!(node, Node::Geoword { .. }) {
          geowords.push(node.clone());
        }
      }
      if !geowords.is_empty() {
        pile.push((n, geowords));
      }
      n += 1 + skip;
    }
    pile
  }

  /// The reference `_get_best`: scores every candidate against every hint in `hint_geowords` and
  /// returns every candidate sharing the maximum score (a tie of 1 is a unique winner, a tie of
  /// more than 1 means the hint window didn't disambiguate).
  fn get_best(&self, nodes: &[Node], hint_geowords: &[Node]) -> Vec<Node> {
    let mut results: Vec<Node> = Vec::new();
    let mut max_score = 0i64;
    for node in nodes {
      let score: i64 = hint_geowords.iter().map(|hint| self.scorer.node_relation_score(node, hint)).sum();
      if score > max_score {
        max_score = score;
        results = vec![node.clone()];
      } else if score == max_score {
        results.push(node.clone());
      }
    }
    results
  }
}

impl Filter for GreedySearchFilter<'_> {
  fn apply(&self, lattice: &Lattice) -> GeoparserResult<Lattice> {
    let positions: Vec<&[Node]> = lattice.positions().collect();
    let pile = Self::build_pile(&positions);

    let mut output: Vec<Vec<Node>> = Vec::with_capacity(positions.len());
    let mut pile_index = 0usize;
    for (i, candidates) in positions.iter().enumerate() {
      if pile_index == pile.len() || i < pile[pile_index].0 {
        output.push(candidates.to_vec());
        continue;
      }

      if candidates.len() == 1 {
        output.push(candidates.to_vec());
        pile_index += 1;
        continue;
      }

      let mut best_nodes = candidates.to_vec();
      let mut dt: usize = 1;
      while dt < pile.len() {
        let mut resolved = false;

        if dt <= pile_index {
          let k = pile_index - dt;
          best_nodes = self.get_best(candidates, &pile[k].1);
          if best_nodes.len() == 1 {
            resolved = true;
          }
        }

        if !resolved {
          let k = pile_index + dt;
          if k < pile.len() {
            best_nodes = self.get_best(candidates, &pile[k].1);
            if best_nodes.len() == 1 {
              resolved = true;
            }
          }
        }

        if resolved {
          break;
        }
        dt += 1;
      }

      output.push(best_nodes);
      pile_index += 1;
    }

    Ok(Lattice::from_positions(output))
  }
}
