//! Path and pairwise node-relation scoring (§4.6), pluggable via the [`Scorer`] trait.

use std::collections::HashMap;

use geo::{Distance, Geodesic};

use crate::config::ScoringConfig;
use crate::model::{Node, Path};

const CLOSE_DISTANCE_METERS: f64 = 10_000.0;
const CLOSE_DISTANCE_BONUS: i64 = 5;
const FAR_DISTANCE_NUMERATOR: f64 = 50_000.0;

/// Scores paths and node pairs. The evaluator holds its scorer by reference (§9 Dynamic scorer
/// dispatch), so custom scorers can carry their own options.
pub trait Scorer {
  /// Total score for a complete path (§4.6 `path_score`).
  fn path_score(&self, path: &Path) -> i64;

  /// Pairwise affinity between two nodes (§4.6 `node_relation_score`).
  fn node_relation_score(&self, a: &Node, b: &Node) -> i64;
}

/// Distance-only affinity between two nodes: `+5` within [`CLOSE_DISTANCE_METERS`], otherwise
/// `floor(FAR_DISTANCE_NUMERATOR / distance)`, `0` if either node lacks geometry. This is the
/// narrower formula the address resolver's per-level binding uses (`_calc_node_score_by_distance`
/// in the reference parser), distinct from [`Scorer::node_relation_score`]'s full relation score.
pub fn distance_score(a: &Node, b: &Node) -> i64 {
  match a.distance(b) {
    Some(d) if d < CLOSE_DISTANCE_METERS => CLOSE_DISTANCE_BONUS,
    Some(d) => (FAR_DISTANCE_NUMERATOR / d).floor() as i64,
    None => 0,
  }
}

/// The default scorer, configured by [`ScoringConfig`] (§4.6).
#[derive(Debug, Clone, Copy)]
pub struct DefaultScorer {
  nlookup: i64,
}

impl DefaultScorer {
  /// Builds a scorer from `config`.
  pub fn new(config: ScoringConfig) -> Self {
    Self { nlookup: config.nlookup }
  }
}

impl Scorer for DefaultScorer {
  fn path_score(&self, path: &Path) -> i64 {
    let mut score = path.iter().filter(|n| matches!(n, Node::Normal { .. })).count() as i64;

    for node in path {
      if let Node::Address { inner_morphemes, .. } = node {
        score += 10 * inner_morphemes.len() as i64;
      }
    }

    let mut ne_class_counts: HashMap<&str, i64> = HashMap::new();
    for node in path {
      if let Some(ne_class) = node.ne_class() {
        *ne_class_counts.entry(ne_class).or_default() += 1;
      }
    }
    for count in ne_class_counts.values() {
      if *count > 1 {
        score += 10 * count;
      }
    }

    // `nlookup` is a single budget shared across the whole double loop below, not a per-n0
    // window: once it hits zero, no further pair anywhere in this call scores (§4.6).
    let non_normal: Vec<&Node> = path.iter().filter(|n| !matches!(n, Node::Normal { .. })).collect();
    let mut budget = self.nlookup;
    for (oi, n0) in non_normal.iter().enumerate() {
      for n1 in &non_normal[oi + 1..] {
        if budget <= 0 {
          break;
        }
        score += self.node_relation_score(n0, n1);
        budget -= 1;
      }
    }

    score
  }

  fn node_relation_score(&self, a: &Node, b: &Node) -> i64 {
    if matches!(a, Node::Normal { .. }) || matches!(b, Node::Normal { .. }) {
      return 0;
    }

    let mut score = 0;

    if let (Some(a_class), Some(b_class)) = (a.ne_class(), b.ne_class()) {
      if a_class == b_class {
        score += 10;
      }
    }

    let b_notations = b.notations();
    if a.hypernym().iter().any(|h| b_notations.contains(h)) {
      score += 5;
    }
    let a_notations = a.notations();
    if b.hypernym().iter().any(|h| a_notations.contains(h)) {
      score += 5;
    }
    if a.hypernym().iter().any(|h| b.hypernym().contains(h)) {
      score += 5;
    }

    if let (Some((alon, alat)), Some((blon, blat))) = (a.lonlat(), b.lonlat()) {
      let d = Geodesic.distance(geo::Point::new(alon, alat), geo::Point::new(blon, blat));
      score += if d < CLOSE_DISTANCE_METERS {
        CLOSE_DISTANCE_BONUS
      } else {
        (FAR_DISTANCE_NUMERATOR / d).floor() as i64
      };
    }

    score
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::node::{AddressProps, GeowordProps, Point};
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

  fn geoword(body: &str, ne_class: &str, hypernym: Vec<&str>, lon: f64, lat: f64) -> Node {
    Node::Geoword {
      surface: body.to_string(),
      morpheme: morpheme(body),
      geometry: Point::new(lon, lat),
      props: GeowordProps {
        geolod_id: format!("{body}-id"),
        body: body.to_string(),
        prefix: vec![],
        suffix: vec![],
        ne_class: ne_class.to_string(),
        hypernym: hypernym.into_iter().map(String::from).collect(),
        latitude: lat,
        longitude: lon,
        dictionary_id: 1,
        dictionary_identifier: "geonlp:fixture".to_string(),
        valid_from: None,
        valid_to: None,
      },
    }
  }

  fn address(inner: Vec<Node>) -> Node {
    let surface: String = inner.iter().map(Node::surface).collect();
    Node::Address {
      surface,
      inner_morphemes: inner,
      geometry: Point::new(139.0, 35.0),
      props: AddressProps {
        level: 2,
        fullname: vec!["東京都".to_string()],
        x: 139.0,
        y: 35.0,
      },
    }
  }

  fn scorer() -> DefaultScorer {
    DefaultScorer::new(ScoringConfig { nlookup: 5 })
  }

  #[test]
  fn node_relation_score_between_normals_is_zero() {
    let s = scorer();
    assert_eq!(s.node_relation_score(&normal("a"), &normal("b")), 0);
  }

  #[test]
  fn node_relation_score_same_ne_class_scores_ten_plus_distance() {
    let s = scorer();
    let a = geoword("府中", "鉄道施設/鉄道駅", vec![], 139.0, 35.0);
    let b = geoword("国分寺", "鉄道施設/鉄道駅", vec![], 139.0, 35.0);
    assert_eq!(s.node_relation_score(&a, &b), 15);
  }

  #[test]
  fn node_relation_score_child_of_hypernym() {
    let s = scorer();
    let child = geoword("国会議事堂前", "鉄道施設/鉄道駅", vec!["東京地下鉄"], 139.0, 35.0);
    let parent = geoword("東京地下鉄", "鉄道事業者/地下鉄", vec![], 139.0, 35.0);
    assert!(s.node_relation_score(&child, &parent) >= 5);
  }

  #[test]
  fn node_relation_score_distance_bonus_far_uses_inverse_falloff() {
    let s = scorer();
    let a = geoword("a", "x", vec![], 0.0, 0.0);
    let b = geoword("b", "y", vec![], 10.0, 10.0);
    let score = s.node_relation_score(&a, &b);
    assert!(score >= 0 && score < CLOSE_DISTANCE_BONUS);
  }

  #[test]
  fn distance_score_ignores_ne_class_and_hypernym_unlike_node_relation_score() {
    let near = geoword("府中", "鉄道施設/鉄道駅", vec![], 139.0, 35.0);
    let same_spot_different_class = geoword("府中市役所", "市区町村/行政区画", vec![], 139.0, 35.0);
    assert_eq!(distance_score(&near, &same_spot_different_class), CLOSE_DISTANCE_BONUS);
  }

  #[test]
  fn distance_score_is_zero_without_geometry() {
    assert_eq!(distance_score(&normal("a"), &normal("b")), 0);
  }

  #[test]
  fn path_score_counts_normals_and_address_bonus() {
    let s = scorer();
    let path = vec![normal("a"), normal("b"), address(vec![normal("c"), normal("d")])];
    assert_eq!(s.path_score(&path), 2 + 10 * 2);
  }

  #[test]
  fn path_score_adds_duplicate_ne_class_bonus() {
    let s = scorer();
    let path = vec![
      geoword("a", "市区町村/行政区画", vec![], 0.0, 0.0),
      geoword("b", "市区町村/行政区画", vec![], 0.0, 0.0),
    ];
    let score = s.path_score(&path);
    assert!(score >= 10 * 2);
  }

  #[test]
  fn path_score_respects_shared_nlookup_budget_across_outer_loop() {
    let config = ScoringConfig { nlookup: 1 };
    let s = DefaultScorer::new(config);
    let path = vec![
      geoword("a", "x", vec![], 0.0, 0.0),
      geoword("b", "y", vec![], 0.0, 0.0),
      geoword("c", "z", vec![], 0.0, 0.0),
    ];
    let full_budget = DefaultScorer::new(ScoringConfig { nlookup: 10 }).path_score(&path);
    let limited = s.path_score(&path);
    assert!(limited < full_budget);
  }

  #[test]
  fn path_score_is_at_least_normal_count() {
    let s = scorer();
    let path = vec![normal("a"), normal("b"), normal("c")];
    assert!(s.path_score(&path) >= 3);
  }
}
