//! chimei: a geoword-lattice Japanese geoparser.
//!
//! Resolves place names, addresses, and date-scoped entity references in Japanese text to
//! geographic coordinates, given an external tokenizer, gazetteer, and (optionally) an
//! address-hierarchy tree.

/// External collaborator contracts (§6): tokenizer, gazetteer, address tree.
pub mod collab;

/// Configuration surface: `GeoparserConfig` and its nested sections.
pub mod config;

/// Encoders (§4.8): plain-object and GeoJSON `Feature` conversion.
pub mod encode;

/// Error module - Defines `GeoparserError`/`GeoparserResult` and the per-stage error enums.
pub mod errors;

/// Candidate filter stack (§4.4): entity-class, greedy co-occurrence, spatial, temporal.
pub mod filter;

/// Path evaluator (§4.5): lazy path enumeration, combinatorial guard, top-K ranking.
pub mod linker;

/// Core data model: morphemes, lattice nodes, and the lattice itself.
pub mod model;

/// Lattice builder (§4.2): fuses the tokenizer's morpheme stream with gazetteer lookups.
pub mod parser;

/// Address resolver (§4.3): prefix detection, span extraction, address-tree alignment.
pub mod resolver;

/// Path and pairwise node-relation scoring (§4.6).
pub mod scorer;

/// Workflow (§4.7): statistics-driven filter choice, lattice chunking, result concatenation.
pub mod workflow;

/// Re-exports
pub use collab::{
  AddressNode, AddressTree, DictionaryMetadata, DictionarySelector, Gazetteer, GeowordRecord, Tokenizer,
};
pub use config::{GeoparserConfig, GeowordRulesConfig, ScoringConfig, SuffixEntry};
pub use errors::{
  ConfigError, FilterError, GeoparserError, GeoparserResult, LatticeError, LinkerError, ResolverError,
};
pub use filter::{EntityClassFilter, Filter, GeoContainsFilter, GeoDisjointFilter, GreedySearchFilter, TemporalFilter, TemporalRelation};
pub use linker::{Linker, RankedPath};
pub use model::{AddressProps, GeowordProps, Lattice, Morpheme, Node, NodeType, Path, Point};
pub use parser::Parser;
pub use resolver::{CollapsePolicy, Resolver};
pub use scorer::{DefaultScorer, Scorer};
pub use workflow::{Statistics, Workflow};
