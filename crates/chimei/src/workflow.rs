//! Workflow (§4.7, C7): statistics-driven filter choice, lattice chunking, and result
//! concatenation, tying the lattice builder, filter stack, address resolver, and path evaluator
//! together into one `geoparse()` call.

use std::collections::BTreeSet;

use tracing::debug;

use crate::collab::{AddressTree, Gazetteer, Tokenizer};
use crate::config::GeoparserConfig;
use crate::errors::GeoparserResult;
use crate::filter::{EntityClassFilter, Filter, GreedySearchFilter};
use crate::linker::Linker;
use crate::model::{Lattice, Morpheme, Node, Path};
use crate::parser::Parser;
use crate::resolver::{CollapsePolicy, Resolver};
use crate::scorer::Scorer;

const DOMINANCE_THRESHOLD: f64 = 0.75;
const DOMINANCE_MIN_GEOWORDS: usize = 5;

const SENTENCE_END_SUBCLASS1: &str = "句点";
const COMMA_SUBCLASS1: &str = "読点";
const CONTROL_CODE_POS: &str = "記号";
const CONTROL_CODE_SUBCLASS1: &str = "制御コード";
const CONTROL_CODE_SUBCLASS2: &str = "改行";
const DECORATIVE_SYMBOL_POS: &str = "記号";
const DECORATIVE_SYMBOL_SUBCLASS1: &str = "一般";
const DECORATIVE_SYMBOLS: &str = "／/★●○◎■□◇";

/// Lattice statistics computed before filter selection (§4.7 step 2).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
  /// Positions holding ≥1 `Geoword` candidate.
  pub num_geowords: usize,
  /// Positions holding ≥1 `Address` candidate.
  pub num_addresses: usize,
  /// Histogram over `ne_class`, both the full class and (when it contains `/`) the top-level
  /// label before the slash, each counted at most once per position.
  pub ne_classes: std::collections::BTreeMap<String, usize>,
}

impl Statistics {
  /// Computes statistics over `lattice` (§4.7 step 2).
  pub fn compute(lattice: &Lattice) -> Self {
    let mut stats = Statistics::default();
    for candidates in lattice.positions() {
      if candidates.iter().any(|n| matches!(n, Node::Geoword { .. })) {
        stats.num_geowords += 1;
      }
      if candidates.iter().any(|n| matches!(n, Node::Address { .. })) {
        stats.num_addresses += 1;
      }
      let mut seen: BTreeSet<&str> = BTreeSet::new();
      for candidate in candidates {
        if let Some(class) = candidate.ne_class() {
          seen.insert(class);
        }
      }
      for class in seen {
        *stats.ne_classes.entry(class.to_string()).or_default() += 1;
        if let Some((top, _)) = class.split_once('/') {
          *stats.ne_classes.entry(top.to_string()).or_default() += 1;
        }
      }
    }
    stats
  }

  fn dominance_ratio(&self, class: &str) -> f64 {
    if self.num_geowords == 0 {
      return 0.0;
    }
    let count = self.ne_classes.get(class).copied().unwrap_or(0);
    count as f64 / self.num_geowords as f64
  }
}

/// The dominant-class `EntityClassFilter` pattern chosen for a statistics snapshot, if any
/// (§4.7 step 3).
fn dominant_class_pattern(stats: &Statistics) -> Option<&'static str> {
  if stats.num_geowords < DOMINANCE_MIN_GEOWORDS {
    return None;
  }
  if stats.dominance_ratio("都道府県") >= DOMINANCE_THRESHOLD {
    Some(r"都道府県/?.*")
  } else if stats.dominance_ratio("市区町村") >= DOMINANCE_THRESHOLD {
    Some(r"(都道府県|市区町村)/?.*")
  } else if stats.dominance_ratio("鉄道施設") >= DOMINANCE_THRESHOLD {
    Some(r"(市区町村|鉄道施設)/?.*")
  } else {
    None
  }
}

/// Chunks `lattice` into pieces whose combination count each fits under `max_combinations`
/// (§4.7 step 6). Each returned chunk is itself a `Lattice` built from a contiguous slice of
/// positions.
fn chunk_lattice(lattice: &Lattice, max_combinations: usize) -> Vec<Lattice> {
  let positions: Vec<Vec<Node>> = lattice.positions().map(<[Node]>::to_vec).collect();
  if positions.is_empty() {
    return Vec::new();
  }
  let mut chunks = Vec::new();
  split_range(&positions, 0, positions.len(), max_combinations, &mut chunks);
  chunks
}

fn combination_count(positions: &[Vec<Node>]) -> u64 {
  positions.iter().fold(1u64, |acc, c| acc.saturating_mul(c.len() as u64))
}

/// Width of position `p`, in "lattice position units", for the purposes of midpoint halving: 1,
/// unless `p` also holds a non-`Address` alternative alongside an `Address` candidate (the
/// resolver's `CollapsePolicy::Keep` left the spanned positions physically in place) — in which
/// case the width is that `Address` candidate's inner-morpheme count, so a midpoint split steps
/// over the whole still-present span instead of landing inside it. A position where every
/// candidate is `Address` (`CollapsePolicy::Replace` already collapsed the span into this one
/// slot) has nothing left to step over, so its width is 1.
fn node_width(candidates: &[Node]) -> usize {
  let has_non_address = candidates.iter().any(|n| !matches!(n, Node::Address { .. }));
  if !has_non_address {
    return 1;
  }
  candidates
    .iter()
    .find_map(|n| match n {
      Node::Address { inner_morphemes, .. } => Some(inner_morphemes.len()),
      _ => None,
    })
    .unwrap_or(1)
}

fn first_candidate_morpheme(candidates: &[Node]) -> Option<&Morpheme> {
  match &candidates[0] {
    Node::Normal { morpheme, .. } | Node::Geoword { morpheme, .. } => Some(morpheme),
    Node::Address { .. } => None,
  }
}

/// Finds the first split position in `start..end` matching `predicate`, considering only
/// positions whose first candidate is non-`Address` (§4.7 step 6).
fn find_split(positions: &[Vec<Node>], start: usize, end: usize, predicate: impl Fn(&Morpheme) -> bool) -> Option<usize> {
  (start..end).find(|&p| first_candidate_morpheme(&positions[p]).is_some_and(&predicate))
}

fn is_decorative_symbol(morpheme: &Morpheme) -> bool {
  morpheme.pos == DECORATIVE_SYMBOL_POS
    && morpheme.subclass1 == DECORATIVE_SYMBOL_SUBCLASS1
    && DECORATIVE_SYMBOLS.contains(morpheme.surface.as_str())
}

fn is_newline_control_code(morpheme: &Morpheme) -> bool {
  morpheme.pos == CONTROL_CODE_POS
    && morpheme.subclass1 == CONTROL_CODE_SUBCLASS1
    && morpheme.subclass2 == CONTROL_CODE_SUBCLASS2
}

/// Recursively splits `positions[start..end]` until every piece's combination count fits under
/// `max_combinations`, appending finished pieces to `out` (§4.7 step 6).
fn split_range(positions: &[Vec<Node>], start: usize, end: usize, max_combinations: usize, out: &mut Vec<Lattice>) {
  let window = &positions[start..end];
  if combination_count(window) <= max_combinations as u64 {
    out.push(Lattice::from_positions(window.to_vec()));
    return;
  }

  let split_at = find_split(positions, start, end, |m| m.subclass1 == SENTENCE_END_SUBCLASS1)
    .or_else(|| find_split(positions, start, end, is_newline_control_code))
    .or_else(|| find_split(positions, start, end, is_decorative_symbol))
    .or_else(|| find_split(positions, start, end, |m| m.subclass1 == COMMA_SUBCLASS1))
    .map(|p| p + 1)
    .unwrap_or_else(|| midpoint(positions, start, end));

  if split_at <= start || split_at >= end {
    // Nothing left to split on (e.g. a single oversized Address span): emit as one piece and let
    // the evaluator's guard report it, since chunking cannot shrink it further.
    out.push(Lattice::from_positions(window.to_vec()));
    return;
  }

  split_range(positions, start, split_at, max_combinations, out);
  split_range(positions, split_at, end, max_combinations, out);
}

/// Splits `start..end` at the first position reached, stepping by [`node_width`], once the
/// halfway mark is reached or passed (§4.7 step 6, "midpoint halving, but never inside an
/// Address span"). Stepping by `node_width` rather than 1 is what keeps a `CollapsePolicy::Keep`
/// span's positions together: landing inside one jumps straight past it.
fn midpoint(positions: &[Vec<Node>], start: usize, end: usize) -> usize {
  let half = start + (end - start) / 2;
  let mut p = start;
  while p < end {
    if p >= half {
      return p;
    }
    p += node_width(&positions[p]);
  }
  end
}

/// Statistics-driven filter choice, lattice chunking, and concatenation over the full
/// `Tokenizer`/`Gazetteer`/`AddressTree` collaborator set (§4.7).
pub struct Workflow<'a> {
  config: &'a GeoparserConfig,
  tokenizer: &'a dyn Tokenizer,
  gazetteer: &'a dyn Gazetteer,
  address_tree: Option<&'a dyn AddressTree>,
  scorer: &'a dyn Scorer,
}

impl<'a> Workflow<'a> {
  /// Builds a workflow. `address_tree` is optional: when absent, address resolution is skipped
  /// (§4.7 step 5, §7 `AddressTreeUnavailable` policy — silently skipped here, not an error).
  pub fn new(
    config: &'a GeoparserConfig,
    tokenizer: &'a dyn Tokenizer,
    gazetteer: &'a dyn Gazetteer,
    address_tree: Option<&'a dyn AddressTree>,
    scorer: &'a dyn Scorer,
  ) -> Self {
    Self {
      config,
      tokenizer,
      gazetteer,
      address_tree,
      scorer,
    }
  }

  /// Runs the full pipeline over `text`, applying `user_filters` after any dominant-class filter
  /// prepend and before the `GreedySearchFilter` append (§4.7 step 3), returning the concatenated
  /// winning path.
  pub fn geoparse(&self, text: &str, user_filters: &[&dyn Filter]) -> GeoparserResult<Path> {
    let morphemes = self.tokenizer.tokenize(text)?;
    let parser = Parser::new(self.config, self.gazetteer);
    let lattice = parser.build(&morphemes)?;
    debug!(positions = lattice.len(), "Built lattice");

    let stats = Statistics::compute(&lattice);
    debug!(
      num_geowords = stats.num_geowords,
      num_addresses = stats.num_addresses,
      "Computed lattice statistics"
    );

    let dominant_pattern = dominant_class_pattern(&stats);
    let dominant_filter = dominant_pattern.map(EntityClassFilter::new).transpose()?;
    let greedy_filter = dominant_pattern.map(|_| GreedySearchFilter::new(self.scorer));
    if let Some(pattern) = dominant_pattern {
      debug!(pattern, "Selected dominant entity-class filter");
    }

    let mut filtered = lattice;
    if let Some(filter) = &dominant_filter {
      filtered = filter.apply(&filtered)?;
    }
    for filter in user_filters {
      filtered = filter.apply(&filtered)?;
    }
    if let Some(filter) = &greedy_filter {
      filtered = filter.apply(&filtered)?;
    }

    if let Some(address_tree) = self.address_tree {
      let resolver = Resolver::new(self.config, address_tree, self.gazetteer, self.scorer, CollapsePolicy::Replace)?;
      filtered = resolver.resolve(&filtered)?;
    }

    let chunks = chunk_lattice(&filtered, self.config.max_combinations);
    debug!(chunk_count = chunks.len(), "Chunked lattice for evaluation");

    let linker = Linker::new(self.scorer, self.config.max_combinations);
    let mut result = Vec::new();
    for chunk in &chunks {
      let mut ranked = linker.top_k(chunk, 1)?;
      if let Some(top) = ranked.pop() {
        result.extend(top.path);
      }
    }
    Ok(result)
  }

  /// Currently active dictionaries (§6, passthrough to the attached gazetteer).
  pub fn active_dictionaries(&self) -> Vec<crate::collab::DictionaryMetadata> {
    self.gazetteer.active_dictionaries()
  }

  /// Replaces the active-dictionary set wholesale (§6, passthrough).
  pub fn set_active_dictionaries(&self, selector: crate::collab::DictionarySelector) {
    self.gazetteer.set_active_dictionaries(selector);
  }

  /// Deactivates dictionaries matched by `selector` (§6, passthrough).
  pub fn disactivate_dictionaries(&self, selector: crate::collab::DictionarySelector) {
    self.gazetteer.disactivate_dictionaries(selector);
  }

  /// Activates dictionaries matched by `selector` (§6, passthrough).
  pub fn activate_dictionaries(&self, selector: crate::collab::DictionarySelector) {
    self.gazetteer.activate_dictionaries(selector);
  }

  /// Currently active `ne_class` pattern list (§6, passthrough).
  pub fn active_classes(&self) -> Vec<String> {
    self.gazetteer.active_classes()
  }

  /// Replaces the active-class pattern list (§6, passthrough).
  pub fn set_active_classes(&self, patterns: Vec<String>) {
    self.gazetteer.set_active_classes(patterns);
  }
}
