//! Address resolver (§4.3): prefix detection, span extraction, address-tree alignment, and
//! per-level binding of matched spans to `Address` nodes.

use regex::Regex;

use crate::collab::{AddressNode, AddressTree, Gazetteer};
use crate::config::GeoparserConfig;
use crate::errors::{ConfigError, GeoparserResult};
use crate::model::node::{AddressProps, Point};
use crate::model::{Lattice, Morpheme, Node};
use crate::scorer::{distance_score, Scorer};

const SPAN_CHAR_LIMIT: usize = 50;

/// Whether address-span collapse replaces the spanned lattice positions or keeps the originals
/// alongside the new `Address` candidates (SPEC_FULL §4.3 SUPPLEMENT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapsePolicy {
  /// Replace positions `i..i+k` with a single position holding the address candidates.
  Replace,
  /// Append the address candidates to position `i` and advance by `k` without deleting the
  /// originals at `i+1..i+k-1`.
  Keep,
}

/// Detects address-prefix positions, consults an [`AddressTree`], and collapses matched spans.
pub struct Resolver<'a> {
  address_class: Regex,
  address_tree: &'a dyn AddressTree,
  gazetteer: &'a dyn Gazetteer,
  scorer: &'a dyn Scorer,
  collapse_policy: CollapsePolicy,
}

impl<'a> Resolver<'a> {
  /// Builds a resolver. `config.address_class` must already have been validated by
  /// [`GeoparserConfig::validate`](crate::config::GeoparserConfig::validate).
  pub fn new(
    config: &GeoparserConfig,
    address_tree: &'a dyn AddressTree,
    gazetteer: &'a dyn Gazetteer,
    scorer: &'a dyn Scorer,
    collapse_policy: CollapsePolicy,
  ) -> GeoparserResult<Self> {
    let address_class = Regex::new(&config.address_class).map_err(|e| ConfigError::InvalidRegex {
      pattern: config.address_class.clone(),
      source: std::sync::Arc::new(e),
    })?;
    Ok(Self {
      address_class,
      address_tree,
      gazetteer,
      scorer,
      collapse_policy,
    })
  }

  /// Runs resolution over `lattice`, producing a new lattice with matched spans collapsed into
  /// `Address` nodes per [`CollapsePolicy`].
  pub fn resolve(&self, lattice: &Lattice) -> GeoparserResult<Lattice> {
    let original: Vec<Vec<Node>> = lattice.positions().map(<[Node]>::to_vec).collect();
    let mut out: Vec<Vec<Node>> = Vec::new();
    let mut i = 0;
    while i < original.len() {
      if self.is_address_start(&original[i]) {
        if let Some((span_len, address_candidates)) = self.try_resolve_span(&original, i) {
          match self.collapse_policy {
            CollapsePolicy::Replace => out.push(address_candidates),
            CollapsePolicy::Keep => {
              let mut merged = original[i].clone();
              merged.extend(address_candidates);
              out.push(merged);
              for position in &original[i + 1..i + span_len] {
                out.push(position.clone());
              }
            }
          }
          i += span_len;
          continue;
        }
      }
      out.push(original[i].clone());
      i += 1;
    }
    Ok(Lattice::from_positions(out))
  }

  fn is_address_start(&self, candidates: &[Node]) -> bool {
    candidates.iter().any(|n| match n {
      Node::Geoword { props, .. } => self.address_class.is_match(&props.ne_class),
      Node::Normal { surface, morpheme } => {
        morpheme.pos == "名詞"
          && matches!(morpheme.subclass1.as_str(), "固有名詞" | "地域" | "一般")
          && self.address_tree_recognizes(surface)
      }
      Node::Address { .. } => false,
    })
  }

  fn address_tree_recognizes(&self, surface: &str) -> bool {
    self
      .address_tree
      .trie_common_prefixes(surface)
      .iter()
      .any(|prefix| {
        self
          .gazetteer
          .search_word(prefix)
          .values()
          .any(|record| self.address_class.is_match(&record.ne_class))
      })
  }

  /// Span extraction + alignment (§4.3). Returns the number of original positions consumed and
  /// the resolved `Address` candidates, or `None` if the tree found no usable match.
  fn try_resolve_span(&self, positions: &[Vec<Node>], start: usize) -> Option<(usize, Vec<Node>)> {
    let mut probe_end = start;
    let mut probe = String::new();
    while probe_end < positions.len() {
      let candidate_surface = span_surface(&positions[probe_end]);
      if probe.chars().count() + candidate_surface.chars().count() > SPAN_CHAR_LIMIT {
        break;
      }
      probe.push_str(&candidate_surface);
      probe_end += 1;
    }
    if probe_end == start {
      return None;
    }

    let mut search_end = probe_end;
    loop {
      let search_text: String = positions[start..search_end].iter().map(span_surface).collect();
      let hits = self.address_tree.search(&search_text);
      if hits.is_empty() {
        if search_end == start + 1 {
          return None;
        }
        search_end -= 1;
        continue;
      }

      let mut span_len = None;
      let mut candidates = Vec::new();
      for (address_node, matched_substring) in hits {
        let matched_len = matched_substring.chars().count();
        let mut acc = 0usize;
        let mut j = start;
        while j < search_end && acc < matched_len {
          acc += span_surface(&positions[j]).chars().count();
          j += 1;
        }
        if acc != matched_len {
          continue;
        }
        let k = j - start;
        if k == 1 && positions[start].iter().any(|n| matches!(n, Node::Geoword { .. })) {
          continue;
        }
        span_len = Some(span_len.map_or(k, |existing: usize| existing.max(k)));
        candidates.push(self.bind_levels(&positions[start..j], &address_node, &matched_substring));
      }
      return span_len.map(|len| (len, candidates));
    }
  }

  /// Per-level binding (§4.3): walks the spanned positions, choosing the Geoword whose
  /// `ne_class` matches the address class and sits closest to the running parent point
  /// (`distance_score`, not the full relation score — matches `_calc_node_score_by_distance`
  /// in the reference parser, a narrower formula than `Scorer::node_relation_score`).
  fn bind_levels(&self, spanned: &[Vec<Node>], address_node: &AddressNode, matched_substring: &str) -> Node {
    let mut inner_morphemes = Vec::with_capacity(spanned.len());
    let mut parent = parent_placeholder(address_node);

    for position in spanned {
      let surface = span_surface(position);
      let geowords: Vec<&Node> = position.iter().filter(|n| matches!(n, Node::Geoword { .. })).collect();

      let chosen = if geowords.is_empty() {
        position[0].clone()
      } else if address_node.fullname.iter().any(|label| label == &surface) {
        let matching: Vec<&Node> = geowords
          .into_iter()
          .filter(|n| n.ne_class().is_some_and(|c| self.address_class.is_match(c)))
          .collect();
        matching
          .into_iter()
          .max_by_key(|candidate| distance_score(candidate, &parent))
          .cloned()
          .unwrap_or_else(|| synthesize_address_normal(&surface))
      } else {
        synthesize_address_normal(&surface)
      };

      if matches!(chosen, Node::Geoword { .. }) {
        parent = chosen.clone();
      }
      inner_morphemes.push(chosen);
    }

    let fullname = address_node.fullname.clone();
    Node::Address {
      surface: matched_substring.to_string(),
      inner_morphemes,
      geometry: Point::new(address_node.x, address_node.y),
      props: AddressProps {
        level: address_node.level,
        fullname,
        x: address_node.x,
        y: address_node.y,
      },
    }
  }
}

fn span_surface(position: &[Node]) -> String {
  position
    .first()
    .map(|n| match n {
      Node::Normal { morpheme, .. } | Node::Geoword { morpheme, .. } => morpheme.address_span_surface().to_string(),
      Node::Address { surface, .. } => surface.clone(),
    })
    .unwrap_or_default()
}

fn parent_placeholder(address_node: &AddressNode) -> Node {
  Node::Geoword {
    surface: address_node.name.clone(),
    morpheme: Morpheme {
      surface: address_node.name.clone(),
      original_form: address_node.name.clone(),
      reading: String::new(),
      pronunciation: String::new(),
      pos: "名詞".to_string(),
      subclass1: "固有名詞".to_string(),
      subclass2: "地域".to_string(),
      subclass3: "一般".to_string(),
      conjugation_type: "*".to_string(),
      conjugated_form: "*".to_string(),
    },
    geometry: Point::new(address_node.x, address_node.y),
    props: crate::model::node::GeowordProps {
      geolod_id: format!("address-tree:{}", address_node.id),
      body: address_node.name.clone(),
      prefix: vec![],
      suffix: vec![],
      ne_class: "市区町村/行政区画".to_string(),
      hypernym: address_node.fullname.clone(),
      latitude: address_node.y,
      longitude: address_node.x,
      dictionary_id: -1,
      dictionary_identifier: "address-tree".to_string(),
      valid_from: None,
      valid_to: None,
    },
  }
}

fn synthesize_address_normal(surface: &str) -> Node {
  Node::Normal {
    surface: surface.to_string(),
    morpheme: Morpheme {
      surface: surface.to_string(),
      original_form: surface.to_string(),
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
