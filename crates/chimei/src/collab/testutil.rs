//! In-memory collaborator fixtures for this crate's own test suite (§4.9 SUPPLEMENT).
//!
//! These are not meant to be realistic implementations — a real tokenizer, gazetteer, and
//! address tree are external collaborators per §6. They exist so unit and integration tests can
//! exercise the lattice builder, resolver, filter stack, and workflow against literal fixture
//! tables instead of a live dictionary deployment.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use crate::collab::{
  AddressNode, AddressTree, DictionaryMetadata, DictionarySelector, GeoparseResult, Gazetteer,
  GeowordRecord, Tokenizer,
};
use crate::model::Morpheme;

/// A [`Tokenizer`] that replays a pre-registered morpheme stream for each exact input text.
///
/// Unregistered inputs tokenize to a single catch-all `Normal` morpheme per run of non-space
/// characters, split on ASCII/Japanese punctuation, which is enough for tests that only care
/// about the geoword/address positions they explicitly registered.
#[derive(Debug, Default)]
pub struct FixedTokenizer {
  fixtures: HashMap<String, Vec<Morpheme>>,
}

impl FixedTokenizer {
  /// Builds an empty fixture tokenizer.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers the morpheme stream to return for an exact input text.
  pub fn register(mut self, text: &str, morphemes: Vec<Morpheme>) -> Self {
    self.fixtures.insert(text.to_string(), morphemes);
    self
  }
}

impl Tokenizer for FixedTokenizer {
  fn tokenize(&self, text: &str) -> GeoparseResult<Vec<Morpheme>> {
    if let Some(morphemes) = self.fixtures.get(text) {
      return Ok(morphemes.clone());
    }
    Ok(fallback_tokenize(text))
  }
}

fn fallback_tokenize(text: &str) -> Vec<Morpheme> {
  const PUNCTUATION: &[char] = &['。', '、', '・', '.', ',', ' ', '\n'];
  text
    .split(|c: char| PUNCTUATION.contains(&c))
    .filter(|s| !s.is_empty())
    .map(|surface| Morpheme {
      surface: surface.to_string(),
      original_form: surface.to_string(),
      reading: String::new(),
      pronunciation: String::new(),
      pos: "名詞".to_string(),
      subclass1: "一般".to_string(),
      subclass2: "*".to_string(),
      subclass3: "*".to_string(),
      conjugation_type: "*".to_string(),
      conjugated_form: "*".to_string(),
    })
    .collect()
}

/// A [`Gazetteer`] backed by an in-memory entry table, an active-dictionary set, and an
/// active-class pattern list, all behind interior mutability (real gazetteers are process-level
/// shared state per §5).
#[derive(Debug)]
pub struct InMemoryGazetteer {
  entries: HashMap<String, GeowordRecord>,
  dictionaries: Mutex<Vec<DictionaryMetadata>>,
  active_classes: Mutex<Vec<String>>,
}

impl InMemoryGazetteer {
  /// Builds a gazetteer from a literal entry table and dictionary list, all active and with the
  /// default `[".*"]` class pattern.
  pub fn new(entries: Vec<GeowordRecord>, dictionaries: Vec<DictionaryMetadata>) -> Self {
    Self {
      entries: entries.into_iter().map(|e| (e.geolod_id.clone(), e)).collect(),
      dictionaries: Mutex::new(dictionaries),
      active_classes: Mutex::new(vec![".*".to_string()]),
    }
  }

  fn is_dictionary_active(&self, dictionary_id: i64) -> bool {
    self
      .dictionaries
      .lock()
      .unwrap()
      .iter()
      .find(|d| d.id == dictionary_id)
      .is_some_and(|d| d.active)
  }

  fn selector_matches(dict: &DictionaryMetadata, selector: &DictionarySelector) -> bool {
    match selector {
      DictionarySelector::Ids(ids) => ids.contains(&dict.id),
      DictionarySelector::Pattern(pattern) => regex::Regex::new(pattern)
        .map(|re| re.is_match(&dict.identifier))
        .unwrap_or(false),
    }
  }
}

impl Gazetteer for InMemoryGazetteer {
  fn word_info(&self, id: &str) -> Option<GeowordRecord> {
    let record = self.entries.get(id)?;
    if !self.is_dictionary_active(record.dictionary_id) {
      return None;
    }
    if !super::class_is_active(&record.ne_class, &self.active_classes.lock().unwrap()) {
      return None;
    }
    Some(record.clone())
  }

  fn search_word(&self, key: &str) -> BTreeMap<String, GeowordRecord> {
    self
      .entries
      .values()
      .filter(|record| record.body == key)
      .filter(|record| self.is_dictionary_active(record.dictionary_id))
      .filter(|record| super::class_is_active(&record.ne_class, &self.active_classes.lock().unwrap()))
      .map(|record| (record.geolod_id.clone(), record.clone()))
      .collect()
  }

  fn active_dictionaries(&self) -> Vec<DictionaryMetadata> {
    self.dictionaries.lock().unwrap().clone()
  }

  fn set_active_dictionaries(&self, selector: DictionarySelector) {
    let mut dictionaries = self.dictionaries.lock().unwrap();
    for dict in dictionaries.iter_mut() {
      dict.active = Self::selector_matches(dict, &selector);
    }
  }

  fn disactivate_dictionaries(&self, selector: DictionarySelector) {
    let mut dictionaries = self.dictionaries.lock().unwrap();
    for dict in dictionaries.iter_mut() {
      if Self::selector_matches(dict, &selector) {
        dict.active = false;
      }
    }
  }

  fn activate_dictionaries(&self, selector: DictionarySelector) {
    let mut dictionaries = self.dictionaries.lock().unwrap();
    for dict in dictionaries.iter_mut() {
      if Self::selector_matches(dict, &selector) {
        dict.active = true;
      }
    }
  }

  fn active_classes(&self) -> Vec<String> {
    self.active_classes.lock().unwrap().clone()
  }

  fn set_active_classes(&self, patterns: Vec<String>) {
    let mut active = self.active_classes.lock().unwrap();
    *active = if patterns.is_empty() { vec![".*".to_string()] } else { patterns };
  }
}

/// An [`AddressTree`] backed by a literal list of `(matched_prefix, AddressNode)` entries, tried
/// longest-prefix-first against the query text.
#[derive(Debug, Default)]
pub struct InMemoryAddressTree {
  entries: Vec<(String, AddressNode)>,
}

impl InMemoryAddressTree {
  /// Builds an empty address tree fixture.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a node reachable by the literal prefix `matched_surface`.
  pub fn register(mut self, matched_surface: &str, node: AddressNode) -> Self {
    self.entries.push((matched_surface.to_string(), node));
    self
  }
}

impl AddressTree for InMemoryAddressTree {
  fn search(&self, text: &str) -> Vec<(AddressNode, String)> {
    let mut hits: Vec<(AddressNode, String)> = self
      .entries
      .iter()
      .filter(|(prefix, _)| text.starts_with(prefix.as_str()))
      .map(|(prefix, node)| (node.clone(), prefix.clone()))
      .collect();
    hits.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));
    hits
  }

  fn trie_common_prefixes(&self, normalized_surface: &str) -> BTreeSet<String> {
    self
      .entries
      .iter()
      .map(|(prefix, _)| prefix)
      .filter(|prefix| normalized_surface.starts_with(prefix.as_str()) || prefix.starts_with(normalized_surface))
      .cloned()
      .collect()
  }
}
