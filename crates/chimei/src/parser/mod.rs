//! Lattice builder (§4.2): fuses the tokenizer's morpheme stream with gazetteer lookups into a
//! position-indexed [`Lattice`].

use crate::collab::Gazetteer;
use crate::config::GeoparserConfig;
use crate::errors::{GeoparserResult, LatticeError};
use crate::model::node::Point;
use crate::model::{Lattice, Morpheme, Node};

const ERA_NAMES: &[&str] = &["明治", "大正", "昭和", "平成", "令和", "西暦"];
const ERA_TERMINATORS: &[&str] = &["年", "年度", "年代", "元年"];

/// Builds a [`Lattice`] from a morpheme stream and a gazetteer (§4.2).
pub struct Parser<'a> {
  config: &'a GeoparserConfig,
  gazetteer: &'a dyn Gazetteer,
}

impl<'a> Parser<'a> {
  /// Builds a parser against `config` and `gazetteer`.
  pub fn new(config: &'a GeoparserConfig, gazetteer: &'a dyn Gazetteer) -> Self {
    Self { config, gazetteer }
  }

  /// Builds the lattice. BOS/EOS markers (empty `surface`) are skipped first.
  pub fn build(&self, morphemes: &[Morpheme]) -> GeoparserResult<Lattice> {
    let tokens: Vec<&Morpheme> = morphemes.iter().filter(|m| !m.surface.is_empty()).collect();
    let mut lattice = Lattice::new();
    let mut i = 0;
    while i < tokens.len() {
      let advance = self.apply_rules(&tokens, i, &mut lattice)?;
      i += advance;
    }
    Ok(lattice)
  }

  fn apply_rules(&self, tokens: &[&Morpheme], i: usize, lattice: &mut Lattice) -> GeoparserResult<usize> {
    if let Some(n) = self.try_person_name_rule_a(tokens, i, lattice) {
      return Ok(n);
    }
    if let Some(n) = self.try_person_name_rule_b(tokens, i, lattice) {
      return Ok(n);
    }
    if let Some(n) = self.try_person_name_rule_c(tokens, i, lattice) {
      return Ok(n);
    }
    if let Some(n) = self.try_era_rule(tokens, i, lattice) {
      return Ok(n);
    }
    if self.is_geoword_token(tokens[i]) {
      self.apply_geoword_rule(tokens[i], lattice)?;
      return Ok(1);
    }
    lattice.push(vec![normal_node(tokens[i])]);
    Ok(1)
  }

  /// Rule 1: family-name followed by given-name/person-name.
  fn try_person_name_rule_a(&self, tokens: &[&Morpheme], i: usize, lattice: &mut Lattice) -> Option<usize> {
    let next = tokens.get(i + 1)?;
    if tokens[i].is_family_name() && next.is_person_name() {
      lattice.push(vec![normal_node(tokens[i])]);
      lattice.push(vec![normal_node(next)]);
      return Some(2);
    }
    None
  }

  /// Rule 2: noun followed by a suffix person-name noun.
  fn try_person_name_rule_b(&self, tokens: &[&Morpheme], i: usize, lattice: &mut Lattice) -> Option<usize> {
    let next = tokens.get(i + 1)?;
    if tokens[i].is_noun() && next.is_suffix_person_name() {
      lattice.push(vec![normal_node(tokens[i])]);
      lattice.push(vec![normal_node(next)]);
      return Some(2);
    }
    None
  }

  /// Rule 3: two nouns followed by a suffix person-name noun.
  fn try_person_name_rule_c(&self, tokens: &[&Morpheme], i: usize, lattice: &mut Lattice) -> Option<usize> {
    let second = tokens.get(i + 1)?;
    let third = tokens.get(i + 2)?;
    if tokens[i].is_noun() && second.is_noun() && third.is_suffix_person_name() {
      lattice.push(vec![normal_node(tokens[i])]);
      lattice.push(vec![normal_node(second)]);
      lattice.push(vec![normal_node(third)]);
      return Some(3);
    }
    None
  }

  /// Rule 4: era expression (e.g. `平成31年`). Only fires when a terminator is actually found;
  /// otherwise falls through to the remaining rules for position `i` (§4.2).
  fn try_era_rule(&self, tokens: &[&Morpheme], i: usize, lattice: &mut Lattice) -> Option<usize> {
    if !ERA_NAMES.contains(&tokens[i].surface.as_str()) {
      return None;
    }
    let mut j = i + 1;
    while j < tokens.len() {
      let t = tokens[j];
      if ERA_TERMINATORS.contains(&t.surface.as_str()) || t.pos == "記号" {
        for token in &tokens[i..=j] {
          lattice.push(vec![normal_node(token)]);
        }
        return Some(j - i + 1);
      }
      if t.is_numeral() {
        j += 1;
        continue;
      }
      break;
    }
    None
  }

  fn is_geoword_token(&self, m: &Morpheme) -> bool {
    m.is_geoword_candidate() && !self.config.geoword_rules.excluded_word.iter().any(|w| w == &m.surface)
  }

  /// Rule 5: geoword candidate expansion, including the A2 alternative-POS restore.
  fn apply_geoword_rule(&self, m: &Morpheme, lattice: &mut Lattice) -> GeoparserResult<()> {
    let mut candidates = Vec::new();
    if let Some(alt) = m.alternative_pos() {
      candidates.push(normal_node(&rebuild_alternative_morpheme(m, alt)));
    }
    for (id, label) in m.geoword_candidate_ids() {
      let record = self
        .gazetteer
        .word_info(id)
        .ok_or_else(|| LatticeError::UnresolvedGeowordId { id: id.to_string() })?;
      let mut narrowed = m.clone();
      narrowed.subclass3 = format!("{id}:{label}");
      candidates.push(Node::Geoword {
        surface: m.surface.clone(),
        morpheme: narrowed,
        geometry: Point::new(record.longitude, record.latitude),
        props: crate::model::node::GeowordProps {
          geolod_id: record.geolod_id,
          body: record.body,
          prefix: record.prefix,
          suffix: record.suffix,
          ne_class: record.ne_class,
          hypernym: record.hypernym,
          latitude: record.latitude,
          longitude: record.longitude,
          dictionary_id: record.dictionary_id,
          dictionary_identifier: record.dictionary_identifier,
          valid_from: record.valid_from,
          valid_to: record.valid_to,
        },
      });
    }
    lattice.push(candidates);
    Ok(())
  }
}

fn normal_node(m: &Morpheme) -> Node {
  let morpheme = if m.subclass2 == "地名語" {
    match m.alternative_pos() {
      Some(alt) => rebuild_alternative_morpheme(m, alt),
      None => m.clone(),
    }
  } else {
    m.clone()
  };
  Node::Normal {
    surface: m.surface.clone(),
    morpheme,
  }
}

fn rebuild_alternative_morpheme(m: &Morpheme, alt: &str) -> Morpheme {
  let mut parts = alt.split('-');
  Morpheme {
    surface: m.surface.clone(),
    original_form: m.original_form.clone(),
    reading: m.reading.clone(),
    pronunciation: m.pronunciation.clone(),
    pos: parts.next().unwrap_or("*").to_string(),
    subclass1: parts.next().unwrap_or("*").to_string(),
    subclass2: parts.next().unwrap_or("*").to_string(),
    subclass3: parts.next().unwrap_or("*").to_string(),
    conjugation_type: "*".to_string(),
    conjugated_form: "*".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collab::testutil::InMemoryGazetteer;
  use crate::collab::{DictionaryMetadata, GeowordRecord};
  use std::collections::BTreeMap;

  fn plain(surface: &str, pos: &str, sub1: &str, sub2: &str, sub3: &str) -> Morpheme {
    Morpheme {
      surface: surface.to_string(),
      original_form: surface.to_string(),
      reading: String::new(),
      pronunciation: String::new(),
      pos: pos.to_string(),
      subclass1: sub1.to_string(),
      subclass2: sub2.to_string(),
      subclass3: sub3.to_string(),
      conjugation_type: "*".to_string(),
      conjugated_form: "*".to_string(),
    }
  }

  fn gazetteer_with(entries: Vec<GeowordRecord>) -> InMemoryGazetteer {
    InMemoryGazetteer::new(
      entries,
      vec![DictionaryMetadata {
        id: 1,
        identifier: "geonlp:fixture".to_string(),
        name: "fixture".to_string(),
        active: true,
      }],
    )
  }

  fn station(id: &str, body: &str) -> GeowordRecord {
    GeowordRecord {
      geolod_id: id.to_string(),
      body: body.to_string(),
      entry_id: format!("{id}-entry"),
      dictionary_id: 1,
      dictionary_identifier: "geonlp:fixture".to_string(),
      ne_class: "鉄道施設/鉄道駅".to_string(),
      hypernym: vec!["東京地下鉄".to_string()],
      latitude: 35.674845,
      longitude: 139.745341,
      prefix: vec![],
      suffix: vec![],
      valid_from: None,
      valid_to: None,
      tags: BTreeMap::new(),
    }
  }

  #[test]
  fn default_rule_emits_single_normal_node() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let tokens = vec![plain("今日", "名詞", "副詞可能", "*", "*")];
    let lattice = parser.build(&tokens).unwrap();
    assert_eq!(lattice.len(), 1);
    assert!(matches!(lattice.position(0).unwrap()[0], Node::Normal { .. }));
  }

  #[test]
  fn bos_eos_markers_are_skipped() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let tokens = vec![
      plain("", "BOS/EOS", "*", "*", "*"),
      plain("今日", "名詞", "副詞可能", "*", "*"),
      plain("", "BOS/EOS", "*", "*", "*"),
    ];
    let lattice = parser.build(&tokens).unwrap();
    assert_eq!(lattice.len(), 1);
  }

  #[test]
  fn person_name_rule_a_consumes_two_tokens() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let tokens = vec![
      plain("山田", "名詞", "固有名詞", "人名", "姓"),
      plain("太郎", "名詞", "固有名詞", "人名", "名"),
      plain("さん", "名詞", "接尾", "人名", "*"),
    ];
    let lattice = parser.build(&tokens).unwrap();
    assert_eq!(lattice.len(), 3);
    for p in 0..3 {
      assert!(matches!(lattice.position(p).unwrap()[0], Node::Normal { .. }));
    }
  }

  #[test]
  fn era_rule_consumes_whole_span_through_terminator() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let tokens = vec![
      plain("平成", "名詞", "*", "*", "*"),
      plain("31", "名詞", "数", "*", "*"),
      plain("年", "名詞", "接尾", "*", "*"),
      plain("に", "助詞", "*", "*", "*"),
    ];
    let lattice = parser.build(&tokens).unwrap();
    assert_eq!(lattice.len(), 4);
    assert_eq!(lattice.position(2).unwrap()[0].surface(), "年");
  }

  #[test]
  fn era_rule_does_not_fire_without_terminator() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let tokens = vec![plain("昭和", "名詞", "*", "*", "*"), plain("は", "助詞", "*", "*", "*")];
    let lattice = parser.build(&tokens).unwrap();
    assert_eq!(lattice.len(), 2);
  }

  #[test]
  fn era_rule_treats_a_symbol_token_as_a_terminator_not_continuable_content() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let tokens = vec![
      plain("平成", "名詞", "*", "*", "*"),
      plain("31", "名詞", "数", "*", "*"),
      plain("、", "記号", "読点", "*", "*"),
      plain("に", "助詞", "*", "*", "*"),
    ];
    let lattice = parser.build(&tokens).unwrap();
    // The span ends at the symbol (span = 平成/31/、), not continuing past it.
    assert_eq!(lattice.len(), 4);
    assert_eq!(lattice.position(2).unwrap()[0].surface(), "、");
  }

  #[test]
  fn geoword_rule_expands_single_candidate() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![station("Bn4q6d", "国会議事堂前")]);
    let parser = Parser::new(&config, &gazetteer);
    let mut m = plain("国会議事堂前", "名詞", "固有名詞", "地名語", "Bn4q6d:国会議事堂前駅");
    m.conjugated_form = "*".to_string();
    let lattice = parser.build(&[m]).unwrap();
    assert_eq!(lattice.len(), 1);
    let candidates = lattice.position(0).unwrap();
    assert_eq!(candidates.len(), 1);
    assert!(matches!(candidates[0], Node::Geoword { .. }));
  }

  #[test]
  fn geoword_rule_prepends_alternative_pos_candidate() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![station("Bn4q6d", "国会議事堂前")]);
    let parser = Parser::new(&config, &gazetteer);
    let mut m = plain("国会議事堂前", "名詞", "固有名詞", "地名語", "Bn4q6d:国会議事堂前駅");
    m.conjugated_form = "名詞-一般-*-*".to_string();
    let lattice = parser.build(&[m]).unwrap();
    let candidates = lattice.position(0).unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(matches!(candidates[0], Node::Normal { .. }));
    assert!(matches!(candidates[1], Node::Geoword { .. }));
  }

  #[test]
  fn geoword_rule_errors_on_unresolved_id() {
    let config = GeoparserConfig::default();
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let m = plain("国会議事堂前", "名詞", "固有名詞", "地名語", "Bn4q6d:国会議事堂前駅");
    let err = parser.build(&[m]).unwrap_err();
    assert!(matches!(
      err,
      crate::errors::GeoparserError::Lattice(LatticeError::UnresolvedGeowordId { .. })
    ));
  }

  #[test]
  fn excluded_word_forces_default_normal_rule() {
    let mut config = GeoparserConfig::default();
    config.geoword_rules.excluded_word = vec!["本部".to_string()];
    let gazetteer = gazetteer_with(vec![]);
    let parser = Parser::new(&config, &gazetteer);
    let m = plain("本部", "名詞", "固有名詞", "地名語", "xxxxxx:本部");
    let lattice = parser.build(&[m]).unwrap();
    assert_eq!(lattice.position(0).unwrap().len(), 1);
    assert!(matches!(lattice.position(0).unwrap()[0], Node::Normal { .. }));
  }
}
