// crates/chimei/src/config.rs

use serde::Deserialize;

use crate::errors::ConfigError;

/// Top-level configuration for the geoparser.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoparserConfig {
  /// `[geoword_rules]` section
  #[serde(default)]
  pub geoword_rules: GeowordRulesConfig,
  /// Regex matched against a candidate's `ne_class` to decide whether it can seed an address
  /// span. Default: `^(都道府県|市区町村|行政地域|居住地名)(/.+|)`.
  #[serde(default = "default_address_class")]
  pub address_class: String,
  /// `[scoring]` section
  #[serde(default)]
  pub scoring: ScoringConfig,
  /// Combinatorial guard on the path evaluator. Default 256.
  #[serde(default = "default_max_combinations")]
  pub max_combinations: usize,
}

impl Default for GeoparserConfig {
  fn default() -> Self {
    Self {
      geoword_rules: GeowordRulesConfig::default(),
      address_class: default_address_class(),
      scoring: ScoringConfig::default(),
      max_combinations: default_max_combinations(),
    }
  }
}

fn default_address_class() -> String {
  "^(都道府県|市区町村|行政地域|居住地名)(/.+|)".to_string()
}

fn default_max_combinations() -> usize {
  256
}

/// `[geoword_rules]` section configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeowordRulesConfig {
  /// Suffix entries recognized when expanding geoword candidates (§4.2 A2 / suffix field of
  /// `Geoword.props`).
  #[serde(default = "default_suffixes")]
  pub suffix: Vec<SuffixEntry>,
  /// Surfaces that are never treated as geowords, even when the tokenizer's user-dictionary
  /// layer marks them as one.
  #[serde(default = "default_excluded_words")]
  pub excluded_word: Vec<String>,
}

impl Default for GeowordRulesConfig {
  fn default() -> Self {
    Self {
      suffix: default_suffixes(),
      excluded_word: default_excluded_words(),
    }
  }
}

/// One configured suffix recognized by the geoword expansion rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuffixEntry {
  /// Surface form, e.g. `"前"`
  pub surface: String,
  /// Reading, e.g. `"マエ"`
  pub reading: String,
  /// Pronunciation, e.g. `"マエ"`
  pub pronunciation: String,
}

fn default_suffixes() -> Vec<SuffixEntry> {
  [
    ("前", "マエ", "マエ"),
    ("内", "ウチ", "ウチ"),
    ("立", "タツ", "タツ"),
    ("境", "サカイ", "サカイ"),
    ("東", "ヒガシ", "ヒガシ"),
    ("西", "ニシ", "ニシ"),
    ("南", "ミナミ", "ミナミ"),
    ("北", "キタ", "キタ"),
  ]
  .into_iter()
  .map(|(surface, reading, pronunciation)| SuffixEntry {
    surface: surface.to_string(),
    reading: reading.to_string(),
    pronunciation: pronunciation.to_string(),
  })
  .collect()
}

fn default_excluded_words() -> Vec<String> {
  vec!["本部".to_string(), "一部".to_string(), "月".to_string()]
}

/// `[scoring]` section configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoringConfig {
  /// How many non-Normal nodes ahead `path_score` grants pairwise-relation budget to. Default 5.
  #[serde(default = "default_nlookup")]
  pub nlookup: i64,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      nlookup: default_nlookup(),
    }
  }
}

fn default_nlookup() -> i64 {
  5
}

impl GeoparserConfig {
  /// Validates the configuration.
  ///
  /// # Validation items
  /// - `address_class` compiles as a regex
  /// - `scoring.nlookup` >= 1
  /// - `max_combinations` >= 1
  ///
  /// # Errors
  /// Returns the corresponding `ConfigError` if validation fails.
  pub fn validate(&self) -> Result<(), ConfigError> {
    regex::Regex::new(&self.address_class).map_err(|e| ConfigError::InvalidRegex {
      pattern: self.address_class.clone(),
      source: std::sync::Arc::new(e),
    })?;

    if self.scoring.nlookup < 1 {
      return Err(ConfigError::InvalidNlookup {
        actual: self.scoring.nlookup,
      });
    }

    if self.max_combinations < 1 {
      return Err(ConfigError::InvalidMaxCombinations {
        actual: self.max_combinations,
      });
    }

    Ok(())
  }
}
