//! `EntityClassFilter` (§4.4.1).

use regex::Regex;

use super::{filter_positions, FallbackPolicy, Filter};
use crate::errors::{ConfigError, GeoparserResult};
use crate::model::{Lattice, Node};

/// Keeps only candidates whose `ne_class` matches a regex. Non-geoword candidates (no
/// `ne_class`) never pass. Falls back to `ConvertToNormal` when a position would empty.
pub struct EntityClassFilter {
  pattern: Regex,
}

impl EntityClassFilter {
  /// Compiles `pattern` against `ne_class`.
  pub fn new(pattern: &str) -> GeoparserResult<Self> {
    let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
      pattern: pattern.to_string(),
      source: std::sync::Arc::new(e),
    })?;
    Ok(Self { pattern })
  }
}

impl Filter for EntityClassFilter {
  fn apply(&self, lattice: &Lattice) -> GeoparserResult<Lattice> {
    Ok(filter_positions(lattice, FallbackPolicy::ConvertToNormal, |node| {
      node.ne_class().is_some_and(|class| self.pattern.is_match(class))
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::node::{GeowordProps, Point};
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

  fn geoword(body: &str, ne_class: &str) -> Node {
    Node::Geoword {
      surface: body.to_string(),
      morpheme: morpheme(body),
      geometry: Point::new(139.0, 35.0),
      props: GeowordProps {
        geolod_id: format!("{body}-id"),
        body: body.to_string(),
        prefix: vec![],
        suffix: vec![],
        ne_class: ne_class.to_string(),
        hypernym: vec![],
        latitude: 35.0,
        longitude: 139.0,
        dictionary_id: 1,
        dictionary_identifier: "geonlp:fixture".to_string(),
        valid_from: None,
        valid_to: None,
      },
    }
  }

  #[test]
  fn keeps_matching_geoword_and_drops_others() {
    let filter = EntityClassFilter::new(r"^都道府県").unwrap();
    let lattice = Lattice::from_positions(vec![vec![
      geoword("東京都", "都道府県"),
      geoword("国会議事堂前", "鉄道施設/鉄道駅"),
    ]]);
    let filtered = filter.apply(&lattice).unwrap();
    let candidates = filtered.position(0).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].surface(), "東京都");
  }

  #[test]
  fn falls_back_to_synthesized_normal_when_nothing_matches() {
    let filter = EntityClassFilter::new(r"^都道府県").unwrap();
    let lattice = Lattice::from_positions(vec![vec![geoword("国会議事堂前", "鉄道施設/鉄道駅")]]);
    let filtered = filter.apply(&lattice).unwrap();
    let candidates = filtered.position(0).unwrap();
    assert_eq!(candidates.len(), 1);
    assert!(matches!(candidates[0], Node::Normal { .. }));
  }

  #[test]
  fn rejects_invalid_pattern() {
    assert!(EntityClassFilter::new("(unterminated").is_err());
  }
}
