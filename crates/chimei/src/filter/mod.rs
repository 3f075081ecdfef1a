//! Candidate filter stack (§4.4): entity-class, greedy co-occurrence, spatial, temporal.

mod entity_class;
mod greedy;
mod spatial;
mod temporal;

pub use entity_class::EntityClassFilter;
pub use greedy::GreedySearchFilter;
pub use spatial::{GeoContainsFilter, GeoDisjointFilter};
pub use temporal::{TemporalFilter, TemporalRelation};

use crate::errors::GeoparserResult;
use crate::model::{Lattice, Node};

/// What a filter does when narrowing a position's candidates would leave it empty (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
  /// Restore the position's original candidates.
  ReturnAll,
  /// Keep the position's existing `Normal` candidate if there is one, else synthesize one.
  ConvertToNormal,
}

/// A stage in the candidate filter stack.
pub trait Filter {
  /// Applies the filter to `lattice`, returning a new lattice (§3 Ownership: filters are
  /// functional).
  fn apply(&self, lattice: &Lattice) -> GeoparserResult<Lattice>;
}

/// Runs `keep` over each position's candidates, applying `policy` when a position would
/// otherwise empty out (§4.4 default per-position behavior).
fn filter_positions(lattice: &Lattice, policy: FallbackPolicy, keep: impl Fn(&Node) -> bool) -> Lattice {
  let positions = lattice
    .positions()
    .map(|candidates| {
      let kept: Vec<Node> = candidates.iter().filter(|n| keep(n)).cloned().collect();
      if !kept.is_empty() {
        return kept;
      }
      match policy {
        FallbackPolicy::ReturnAll => candidates.to_vec(),
        FallbackPolicy::ConvertToNormal => vec![convert_to_normal(candidates)],
      }
    })
    .collect();
  Lattice::from_positions(positions)
}

fn convert_to_normal(candidates: &[Node]) -> Node {
  if let Some(normal) = candidates.iter().find(|n| matches!(n, Node::Normal { .. })) {
    return normal.clone();
  }
  let surface = candidates[0].surface().to_string();
  Node::Normal {
    surface: surface.clone(),
    morpheme: crate::model::Morpheme {
      surface,
      original_form: String::new(),
      reading: String::new(),
      pronunciation: String::new(),
      pos: "名詞".to_string(),
      subclass1: "固有名詞".to_string(),
      subclass2: "地域".to_string(),
      subclass3: "一般".to_string(),
      conjugation_type: "*".to_string(),
      conjugated_form: "*".to_string(),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::node::Point;
  use crate::model::Morpheme;

  fn morpheme(surface: &str) -> Morpheme {
    Morpheme {
      surface: surface.to_string(),
      original_form: surface.to_string(),
      reading: String::new(),
      pronunciation: String::new(),
      pos: "名詞".to_string(),
      subclass1: "*".to_string(),
      subclass2: "*".to_string(),
      subclass3: "*".to_string(),
      conjugation_type: "*".to_string(),
      conjugated_form: "*".to_string(),
    }
  }

  fn normal(surface: &str) -> Node {
    Node::Normal {
      surface: surface.to_string(),
      morpheme: morpheme(surface),
    }
  }

  #[test]
  fn filter_positions_return_all_restores_original_when_empty() {
    let lattice = Lattice::from_positions(vec![vec![normal("a")]]);
    let filtered = filter_positions(&lattice, FallbackPolicy::ReturnAll, |_| false);
    assert_eq!(filtered.position(0).unwrap().len(), 1);
  }

  #[test]
  fn filter_positions_convert_to_normal_keeps_existing_normal() {
    let lattice = Lattice::from_positions(vec![vec![normal("a")]]);
    let filtered = filter_positions(&lattice, FallbackPolicy::ConvertToNormal, |_| false);
    assert!(matches!(filtered.position(0).unwrap()[0], Node::Normal { .. }));
  }

  #[test]
  fn filter_positions_convert_to_normal_synthesizes_when_no_normal_present() {
    use crate::model::node::GeowordProps;
    let geoword = Node::Geoword {
      surface: "府中".to_string(),
      morpheme: morpheme("府中"),
      geometry: Point::new(139.0, 35.0),
      props: GeowordProps {
        geolod_id: "a".to_string(),
        body: "府中".to_string(),
        prefix: vec![],
        suffix: vec![],
        ne_class: "鉄道施設/鉄道駅".to_string(),
        hypernym: vec![],
        latitude: 35.0,
        longitude: 139.0,
        dictionary_id: 1,
        dictionary_identifier: "geonlp:fixture".to_string(),
        valid_from: None,
        valid_to: None,
      },
    };
    let lattice = Lattice::from_positions(vec![vec![geoword]]);
    let filtered = filter_positions(&lattice, FallbackPolicy::ConvertToNormal, |_| false);
    let synthesized = &filtered.position(0).unwrap()[0];
    assert!(matches!(synthesized, Node::Normal { .. }));
    assert_eq!(synthesized.surface(), "府中");
  }
}
