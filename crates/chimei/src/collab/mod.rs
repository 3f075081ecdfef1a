//! External collaborator contracts (§6): tokenizer, gazetteer, address tree.
//!
//! The core never performs I/O itself; it consumes these traits as typed records. Production
//! implementations (dictionary loading, SQLite/JSON-LD-backed gazetteers, an on-disk address
//! trie) live outside this crate. [`testutil`] ships in-memory fixtures for the crate's own
//! tests.

pub mod testutil;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::GeoparserResult;
use crate::model::Morpheme;

/// Morphological analysis, external to this crate (§6 Tokenizer contract).
pub trait Tokenizer {
  /// Tokenizes `text` into a morpheme stream. Implementations may include BOS/EOS markers (empty
  /// `surface`); the lattice builder skips them.
  fn tokenize(&self, text: &str) -> GeoparseResult<Vec<Morpheme>>;
}

/// Alias kept distinct from the crate's own `GeoparserResult` name in the trait signature to
/// mirror §6's wording precisely; it is the same alias.
pub type GeoparseResult<T> = GeoparserResult<T>;

/// One gazetteer entry as returned by [`Gazetteer::word_info`]/[`Gazetteer::search_word`]
/// (§3 SUPPLEMENT, §6 Gazetteer contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeowordRecord {
  /// Opaque gazetteer entry id, same value as `Geoword.props.geolod_id`.
  pub geolod_id: String,
  /// Canonical body text.
  pub body: String,
  /// Entry id local to its dictionary (distinct from `geolod_id`, which is globally unique).
  pub entry_id: String,
  /// Numeric id of the owning dictionary.
  pub dictionary_id: i64,
  /// Stable identifier of the owning dictionary, e.g. `"geonlp:ksj-station-N02"`.
  pub dictionary_identifier: String,
  /// Slash-delimited hierarchical entity class.
  pub ne_class: String,
  /// Ancestor labels.
  #[serde(default)]
  pub hypernym: Vec<String>,
  /// Latitude, degrees.
  pub latitude: f64,
  /// Longitude, degrees.
  pub longitude: f64,
  /// Recognized prefixes.
  #[serde(default)]
  pub prefix: Vec<String>,
  /// Recognized suffixes.
  #[serde(default)]
  pub suffix: Vec<String>,
  /// ISO date from which this entry is valid.
  #[serde(default)]
  pub valid_from: Option<String>,
  /// ISO date until which this entry is valid.
  #[serde(default)]
  pub valid_to: Option<String>,
  /// Pass-through metadata fields not otherwise modeled (e.g. `institution_type`,
  /// `railway_class`), kept as a map per the original's untyped extension fields.
  #[serde(default)]
  pub tags: BTreeMap<String, String>,
}

/// Summary record for one loaded dictionary (§6 `active_dictionaries`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryMetadata {
  /// Numeric dictionary id.
  pub id: i64,
  /// Stable identifier, e.g. `"geonlp:ksj-station-N02"`.
  pub identifier: String,
  /// Display name.
  pub name: String,
  /// `true` when entries from this dictionary are currently visible to lookups.
  pub active: bool,
}

/// Selects a subset of loaded dictionaries by identifier pattern or numeric id (§6
/// `set_active_dictionaries(pattern|ids)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DictionarySelector {
  /// A regex matched against `DictionaryMetadata::identifier`.
  Pattern(String),
  /// A literal set of dictionary ids.
  Ids(Vec<i64>),
}

/// The gazetteer capability (§6 Gazetteer contract).
pub trait Gazetteer {
  /// Looks up a single entry by its `geolod_id`.
  fn word_info(&self, id: &str) -> Option<GeowordRecord>;

  /// Looks up every entry whose surface or reading matches `key`, keyed by `geolod_id`.
  fn search_word(&self, key: &str) -> BTreeMap<String, GeowordRecord>;

  /// Currently loaded dictionaries and their active/inactive state.
  fn active_dictionaries(&self) -> Vec<DictionaryMetadata>;

  /// Replaces the active-dictionary set wholesale.
  fn set_active_dictionaries(&self, selector: DictionarySelector);

  /// Deactivates the dictionaries matched by `selector`, leaving others untouched.
  fn disactivate_dictionaries(&self, selector: DictionarySelector);

  /// Activates the dictionaries matched by `selector`, leaving others untouched.
  fn activate_dictionaries(&self, selector: DictionarySelector);

  /// The currently active `ne_class` regex pattern list (§6 active-class fold).
  fn active_classes(&self) -> Vec<String>;

  /// Replaces the active-class pattern list. An empty list resets to `[".*"]`.
  fn set_active_classes(&self, patterns: Vec<String>);
}

/// Evaluates the §6 active-class fold: patterns are applied left to right as a boolean fold
/// starting from `false`; a plain pattern flips the decision to `true` on match, a `-`-prefixed
/// pattern flips it to `false` on match.
pub fn class_is_active(ne_class: &str, patterns: &[String]) -> bool {
  let mut included = false;
  for pattern in patterns {
    let (negate, raw) = match pattern.strip_prefix('-') {
      Some(rest) => (true, rest),
      None => (false, pattern.as_str()),
    };
    let Ok(re) = regex::Regex::new(raw) else {
      continue;
    };
    if re.is_match(ne_class) {
      included = !negate;
    }
  }
  included
}

/// One node returned by an address-tree search (§6 AddressNode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressNode {
  /// Opaque address-tree node id.
  pub id: String,
  /// Own label at this level, e.g. `"一ツ橋"`.
  pub name: String,
  /// Projected x coordinate (longitude).
  pub x: f64,
  /// Projected y coordinate (latitude).
  pub y: f64,
  /// Hierarchy level, 1 (prefecture) through 8 (building).
  pub level: u8,
  /// Hierarchy labels from the top level down to this node's own label.
  pub fullname: Vec<String>,
}

/// The address-hierarchy capability (§6 Address-tree contract).
pub trait AddressTree {
  /// Searches `text` for address matches starting at its first character. Returns pairs of the
  /// matched node and the substring of `text` it consumed.
  fn search(&self, text: &str) -> Vec<(AddressNode, String)>;

  /// Common prefixes of `normalized_surface` recognized by the tree's prefix trie. Used only by
  /// the Normal-noun branch of address-prefix detection (§4.3).
  fn trie_common_prefixes(&self, normalized_surface: &str) -> BTreeSet<String>;
}
