//! Error Definitions

use std::sync::Arc;
use thiserror::Error;

/// Configuration related errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ConfigError {
  /// A configured regex pattern failed to compile (`address_class`, filter patterns, active
  /// class patterns, ...).
  #[error("invalid regex pattern {pattern:?}: {source}")]
  InvalidRegex {
    /// The offending pattern text
    pattern: String,
    /// Underlying compile error
    #[source]
    source: Arc<regex::Error>,
  },

  /// `scoring.nlookup` must be at least 1
  #[error("scoring.nlookup must be 1 or greater: actual={actual}")]
  InvalidNlookup {
    /// Actually specified value
    actual: i64,
  },

  /// `max_combinations` must be at least 1
  #[error("max_combinations must be 1 or greater: actual={actual}")]
  InvalidMaxCombinations {
    /// Actually specified value
    actual: usize,
  },

  /// The caller rejected an empty active-dictionary set
  #[error("active dictionary set must not be empty")]
  EmptyActiveDictionaries,
}

/// Lattice-builder related errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum LatticeError {
  /// A geoword token declared a gazetteer id in subclass3 that the gazetteer does not resolve.
  /// This is a data-integrity failure, not a recoverable parse ambiguity.
  #[error("gazetteer id {id:?} declared by a geoword token does not resolve")]
  UnresolvedGeowordId {
    /// The unresolved id
    id: String,
  },
}

/// Address-resolver related errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ResolverError {
  /// The resolver was invoked but no address-tree capability was attached. Workflow treats this
  /// as "skip resolution"; this variant exists for callers that invoke the resolver directly.
  #[error("address resolution requested but no address tree is attached")]
  AddressTreeUnavailable,

  /// A returned address candidate referenced a gazetteer id that does not resolve.
  #[error(transparent)]
  Lattice(#[from] LatticeError),
}

/// Filter-stack related errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum FilterError {
  /// Bad filter construction argument (regex compile failure, etc.)
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// A temporal filter was constructed from a string that does not parse as a date
  #[error("temporal filter date {text:?} does not parse: {reason}")]
  TemporalParse {
    /// The offending text
    text: String,
    /// Why it failed to parse
    reason: String,
  },

  /// A spatial filter was constructed from text that does not parse as GeoJSON, or whose
  /// geometry is not one this crate evaluates `Contains`/`Disjoint` against.
  #[error("spatial filter geometry is invalid: {reason}")]
  InvalidGeometry {
    /// Why it failed to parse
    reason: String,
  },

  /// Reserved for a spatial filter backed by a fetched (rather than inline) geometry. The
  /// bundled `GeoContainsFilter`/`GeoDisjointFilter` only accept pre-resolved GeoJSON and never
  /// construct this variant; it is kept so external collaborators that do perform such a fetch
  /// have a matching error to surface through `GeoparserError`.
  #[error("failed to fetch external geometry from {url}: {reason}")]
  ExternalFetch {
    /// The URL that could not be fetched
    url: String,
    /// Failure reason
    reason: String,
  },
}

/// Path-evaluator related errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum LinkerError {
  /// The lattice's combination count exceeds the configured `max_combinations` bound. Workflow
  /// recovers from this by chunking the lattice and re-evaluating each piece.
  #[error("lattice has {actual} candidate combinations, exceeding the bound of {bound}")]
  TooManyCombinations {
    /// The computed combination count (saturates at `i32::MAX` per the original algorithm)
    actual: u64,
    /// The configured bound
    bound: usize,
  },
}

/// Unified error type returned by the crate's public API.
///
/// Use as `GeoparserResult<T>` = `Result<T, GeoparserError>`.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum GeoparserError {
  /// Lookup attempted before a required collaborator (gazetteer, address tree) was attached.
  #[error("geoparser used before required collaborator was attached")]
  Uninitialized,

  /// Configuration related error
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// Lattice-builder related error
  #[error(transparent)]
  Lattice(#[from] LatticeError),

  /// Address-resolver related error
  #[error(transparent)]
  Resolver(#[from] ResolverError),

  /// Filter-stack related error
  #[error(transparent)]
  Filter(#[from] FilterError),

  /// Path-evaluator related error
  #[error(transparent)]
  Linker(#[from] LinkerError),
}

/// Standard Result type alias for the chimei crate
pub type GeoparserResult<T> = Result<T, GeoparserError>;
