//! Path evaluator (§4.5): lazy path enumeration over a lattice, a combinatorial guard, and
//! top-K ranking by [`Scorer::path_score`].

use crate::errors::{GeoparserResult, LinkerError};
use crate::model::{Lattice, Path};
use crate::scorer::Scorer;

/// `∏ |candidates[p]|` over every lattice position, saturating rather than overflowing (the
/// guard only cares whether this exceeds the configured bound).
fn combination_count(lattice: &Lattice) -> u64 {
  lattice
    .positions()
    .fold(1u64, |acc, candidates| acc.saturating_mul(candidates.len() as u64))
}

/// Pull-based iterator over every path through a lattice (§4.5 "Lazy iteration with shared
/// state", §9). Holds one counter per lattice position; advancing re-walks the lattice from
/// position 0 using the current counters, then carries the last *contributing* position (the
/// last one actually selected from, since a chosen candidate's span may skip over several
/// positions) left on overflow.
pub struct PathIterator<'a> {
  lattice: &'a Lattice,
  counters: Vec<usize>,
  done: bool,
}

impl<'a> PathIterator<'a> {
  fn new(lattice: &'a Lattice) -> Self {
    Self {
      done: lattice.is_empty(),
      counters: vec![0; lattice.len()],
      lattice,
    }
  }
}

impl Iterator for PathIterator<'_> {
  type Item = Path;

  fn next(&mut self) -> Option<Path> {
    if self.done {
      return None;
    }

    let mut path = Vec::new();
    let mut contributing = Vec::new();
    let mut p = 0;
    while p < self.lattice.len() {
      let candidates = self.lattice.position(p).expect("p < lattice.len()");
      let index = self.counters[p];
      path.push(candidates[index].clone());
      contributing.push(p);
      p += self.lattice.advance_width_at(p, index);
    }

    // Carry: increment the last contributing position; on overflow reset it to 0 and carry to
    // the previous contributing position. Exhausting the leftmost contributing position ends
    // the sequence.
    loop {
      let Some(pos) = contributing.pop() else {
        self.done = true;
        break;
      };
      self.counters[pos] += 1;
      if self.counters[pos] < self.lattice.position(pos).expect("pos < lattice.len()").len() {
        break;
      }
      self.counters[pos] = 0;
    }

    Some(path)
  }
}

/// One ranked result from [`Linker::top_k`].
#[derive(Debug, Clone)]
pub struct RankedPath {
  /// The selected path.
  pub path: Path,
  /// Its `path_score`.
  pub score: i64,
}

/// Enumerates and ranks paths through a lattice, guarded by a combination-count bound.
pub struct Linker<'a> {
  scorer: &'a dyn Scorer,
  max_combinations: usize,
}

impl<'a> Linker<'a> {
  /// Builds a linker against `scorer`, rejecting lattices whose combination count exceeds
  /// `max_combinations` (§4.5 Guard; Workflow recovers by chunking, §4.7).
  pub fn new(scorer: &'a dyn Scorer, max_combinations: usize) -> Self {
    Self { scorer, max_combinations }
  }

  fn check_guard(&self, lattice: &Lattice) -> GeoparserResult<()> {
    let actual = combination_count(lattice);
    if actual > self.max_combinations as u64 {
      return Err(
        LinkerError::TooManyCombinations {
          actual,
          bound: self.max_combinations,
        }
        .into(),
      );
    }
    Ok(())
  }

  /// A lazy iterator over every path through `lattice`, after checking the combinatorial guard.
  pub fn paths<'l>(&self, lattice: &'l Lattice) -> GeoparserResult<PathIterator<'l>> {
    self.check_guard(lattice)?;
    Ok(PathIterator::new(lattice))
  }

  /// Enumerates every path, scores each with the linker's scorer, and returns the top `k` by
  /// score descending, ties retained in encounter order (§4.5 Top-K).
  pub fn top_k(&self, lattice: &Lattice, k: usize) -> GeoparserResult<Vec<RankedPath>> {
    self.check_guard(lattice)?;
    let mut results: Vec<RankedPath> = Vec::new();
    for path in PathIterator::new(lattice) {
      let score = self.scorer.path_score(&path);
      let insert_at = results.iter().position(|r| r.score < score).unwrap_or(results.len());
      results.insert(insert_at, RankedPath { path, score });
      if results.len() > k {
        results.truncate(k);
      }
    }
    Ok(results)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ScoringConfig;
  use crate::model::node::{AddressProps, GeowordProps, Point};
  use crate::model::Morpheme;
  use crate::model::Node;
  use crate::scorer::DefaultScorer;

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

  fn geoword(body: &str, ne_class: &str, lon: f64, lat: f64) -> Node {
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
        hypernym: vec![],
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
  fn empty_lattice_yields_no_paths() {
    let lattice = Lattice::new();
    let paths: Vec<_> = PathIterator::new(&lattice).collect();
    assert!(paths.is_empty());
  }

  #[test]
  fn single_candidate_positions_yield_exactly_one_path() {
    let lattice = Lattice::from_positions(vec![vec![normal("a")], vec![normal("b")]]);
    let paths: Vec<_> = PathIterator::new(&lattice).collect();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 2);
  }

  #[test]
  fn enumerates_every_combination_in_order() {
    let lattice = Lattice::from_positions(vec![
      vec![normal("a1"), normal("a2")],
      vec![normal("b1"), normal("b2"), normal("b3")],
    ]);
    let paths: Vec<_> = PathIterator::new(&lattice).collect();
    assert_eq!(paths.len(), 6);
    let surfaces: Vec<(String, String)> = paths
      .iter()
      .map(|p| (p[0].surface().to_string(), p[1].surface().to_string()))
      .collect();
    assert_eq!(
      surfaces,
      vec![
        ("a1".to_string(), "b1".to_string()),
        ("a1".to_string(), "b2".to_string()),
        ("a1".to_string(), "b3".to_string()),
        ("a2".to_string(), "b1".to_string()),
        ("a2".to_string(), "b2".to_string()),
        ("a2".to_string(), "b3".to_string()),
      ]
    );
  }

  #[test]
  fn address_span_advances_past_consumed_positions() {
    let addr = address(vec![normal("chiyoda"), normal("hitotsubashi")]);
    let lattice = Lattice::from_positions(vec![
      vec![addr.clone(), normal("chiyoda")],
      vec![normal("hitotsubashi")],
      vec![normal("tail")],
    ]);
    let paths: Vec<_> = PathIterator::new(&lattice).collect();
    // First candidate at position 0 is the 2-position Address: the path it produces has only
    // two nodes (Address, tail), skipping position 1 entirely.
    assert_eq!(paths[0].len(), 2);
    assert!(matches!(paths[0][0], Node::Address { .. }));
    // Second candidate at position 0 is a plain Normal spanning 1: the path visits all three.
    assert_eq!(paths[1].len(), 3);
  }

  #[test]
  fn guard_rejects_lattice_exceeding_bound() {
    let lattice = Lattice::from_positions(vec![
      vec![normal("a1"), normal("a2"), normal("a3")],
      vec![normal("b1"), normal("b2"), normal("b3")],
    ]);
    let scorer = scorer();
    let linker = Linker::new(&scorer, 4);
    let err = linker.top_k(&lattice, 3).unwrap_err();
    assert!(matches!(
      err,
      crate::errors::GeoparserError::Linker(crate::errors::LinkerError::TooManyCombinations { actual: 9, bound: 4 })
    ));
  }

  #[test]
  fn top_k_is_sorted_descending_and_capped() {
    let lattice = Lattice::from_positions(vec![
      vec![
        geoword("近い", "鉄道施設/鉄道駅", 139.74, 35.68),
        geoword("遠い", "鉄道施設/鉄道駅", 0.0, 0.0),
      ],
      vec![geoword("hint", "鉄道施設/鉄道駅", 139.745, 35.675)],
    ]);
    let scorer = scorer();
    let linker = Linker::new(&scorer, 256);
    let ranked = linker.top_k(&lattice, 1).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].path[0].surface(), "近い");
  }

  #[test]
  fn ties_keep_encounter_order() {
    let lattice = Lattice::from_positions(vec![vec![normal("a"), normal("b")]]);
    let scorer = scorer();
    let linker = Linker::new(&scorer, 256);
    let ranked = linker.top_k(&lattice, 2).unwrap();
    assert_eq!(ranked[0].path[0].surface(), "a");
    assert_eq!(ranked[1].path[0].surface(), "b");
  }
}
