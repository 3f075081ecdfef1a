//! The morpheme record produced by the external tokenizer (§3, §6 Tokenizer contract).

use serde::{Deserialize, Serialize};

/// One morpheme as emitted by the tokenizer. BOS/EOS markers (empty `surface`) are skipped by
/// the lattice builder before this type is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morpheme {
  /// Surface form as it appears in the input text.
  pub surface: String,
  /// Dictionary form before the user-dictionary geoword layer rewrote it; also the form used by
  /// the address resolver's prefix-trie lookup (§4.3, §9 Open Question 3).
  pub original_form: String,
  /// Reading (`yomi`), typically katakana.
  pub reading: String,
  /// Pronunciation, typically katakana with sound changes applied.
  pub pronunciation: String,
  /// Primary part of speech, e.g. `"名詞"`.
  pub pos: String,
  /// First POS subclass.
  pub subclass1: String,
  /// Second POS subclass. `"地名語"` marks a geoword candidate (§4.2 rule 5).
  pub subclass2: String,
  /// Third POS subclass. On a geoword token this holds the gazetteer candidate list
  /// `"id1:label1/id2:label2/..."` (§3).
  pub subclass3: String,
  /// Inflection type (活用型).
  pub conjugation_type: String,
  /// Inflection form (活用形). On a geoword token, before expansion, this instead carries the
  /// alternative POS to restore if the geoword layer is disabled, formatted
  /// `"pos-sub1-sub2-sub3"` (§4.2 A2).
  pub conjugated_form: String,
}

impl Morpheme {
  /// `true` when the morpheme is marked by the user-dictionary layer as a geoword candidate
  /// (subclass2 = `地名語`) and is not itself a suffix entry (§4.2 rule 5).
  pub fn is_geoword_candidate(&self) -> bool {
    self.subclass2 == "地名語" && self.subclass1 != "接尾"
  }

  /// The `"pos-sub1-sub2-sub3"` alternative-POS field, if present and not the empty/`*`
  /// placeholder (§4.2 A2).
  pub fn alternative_pos(&self) -> Option<&str> {
    match self.conjugated_form.as_str() {
      "" | "*" => None,
      other => Some(other),
    }
  }

  /// Splits `id:label(/id:label)*` out of `subclass3` (§4.2 rule 5).
  pub fn geoword_candidate_ids(&self) -> Vec<(&str, &str)> {
    self
      .subclass3
      .split('/')
      .filter_map(|entry| entry.split_once(':'))
      .collect()
  }

  /// `true` when tagged as a noun (§4.2 person-name rules B/C).
  pub fn is_noun(&self) -> bool {
    self.pos == "名詞"
  }

  /// `true` when tagged as a person's family name, either by the full inflection tag
  /// `名詞-固有名詞-人名-姓` or by the generic person-name subclass (§4.2 rule A). The generic
  /// check subsumes the full-tag one, so both are folded into a single condition.
  pub fn is_family_name(&self) -> bool {
    self.subclass2 == "人名"
  }

  /// `true` when tagged as any person-name token, family or given (§4.2 rule A).
  pub fn is_person_name(&self) -> bool {
    self.subclass2 == "人名"
  }

  /// `true` when tagged as a suffix noun used to close out a person's name, e.g. `"氏"`, `"さん"`
  /// (§4.2 rules B/C).
  pub fn is_suffix_person_name(&self) -> bool {
    self.subclass1 == "接尾" && self.subclass2 == "人名"
  }

  /// `true` when tagged as a numeral (§4.2 era rule).
  pub fn is_numeral(&self) -> bool {
    self.subclass1 == "数"
  }

  /// The surface form preferred for address-span concatenation: `original_form` for multi-char
  /// nouns, `surface` otherwise (§4.3 Span extraction).
  pub fn address_span_surface(&self) -> &str {
    if self.pos == "名詞"
      && self.original_form.chars().count() > 1
      && self.original_form != "*"
      && !self.original_form.is_empty()
    {
      &self.original_form
    } else {
      &self.surface
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn morpheme(pos: &str, sub1: &str, sub2: &str, sub3: &str, conjugated_form: &str) -> Morpheme {
    Morpheme {
      surface: "x".to_string(),
      original_form: "x".to_string(),
      reading: String::new(),
      pronunciation: String::new(),
      pos: pos.to_string(),
      subclass1: sub1.to_string(),
      subclass2: sub2.to_string(),
      subclass3: sub3.to_string(),
      conjugation_type: "*".to_string(),
      conjugated_form: conjugated_form.to_string(),
    }
  }

  #[test]
  fn geoword_candidate_requires_subclass2_and_rejects_suffix() {
    assert!(morpheme("名詞", "固有名詞", "地名語", "", "*").is_geoword_candidate());
    assert!(!morpheme("名詞", "接尾", "地名語", "", "*").is_geoword_candidate());
    assert!(!morpheme("名詞", "固有名詞", "一般", "", "*").is_geoword_candidate());
  }

  #[test]
  fn alternative_pos_ignores_placeholder_values() {
    assert_eq!(morpheme("名詞", "固有名詞", "地名語", "", "*").alternative_pos(), None);
    assert_eq!(morpheme("名詞", "固有名詞", "地名語", "", "").alternative_pos(), None);
    assert_eq!(
      morpheme("名詞", "固有名詞", "地名語", "", "名詞-固有名詞-地名語").alternative_pos(),
      Some("名詞-固有名詞-地名語")
    );
  }

  #[test]
  fn geoword_candidate_ids_splits_multiple_entries() {
    let m = morpheme("名詞", "固有名詞", "地名語", "Bn4q6d:国会議事堂前駅/cE8W4w:国会議事堂前駅", "*");
    assert_eq!(
      m.geoword_candidate_ids(),
      vec![("Bn4q6d", "国会議事堂前駅"), ("cE8W4w", "国会議事堂前駅")]
    );
  }

  #[test]
  fn address_span_surface_prefers_original_form_for_multichar_nouns() {
    let mut m = morpheme("名詞", "固有名詞", "地域", "一般", "*");
    m.surface = "せたがやく".to_string();
    m.original_form = "世田谷区".to_string();
    assert_eq!(m.address_span_surface(), "世田谷区");
  }

  #[test]
  fn person_name_predicates() {
    let family = morpheme("名詞", "固有名詞", "人名", "姓", "*");
    assert!(family.is_family_name());
    assert!(family.is_person_name());
    let suffix = morpheme("名詞", "接尾", "人名", "*", "*");
    assert!(suffix.is_suffix_person_name());
    assert!(!morpheme("名詞", "一般", "*", "*", "*").is_suffix_person_name());
  }

  #[test]
  fn address_span_surface_falls_back_to_surface_for_non_nouns() {
    let mut m = morpheme("助詞", "*", "*", "*", "*");
    m.surface = "は".to_string();
    m.original_form = "は".to_string();
    assert_eq!(m.address_span_surface(), "は");
  }
}
