//! Core data model: morphemes, lattice nodes, and the lattice itself.

pub mod lattice;
pub mod morpheme;
pub mod node;

pub use lattice::Lattice;
pub use morpheme::Morpheme;
pub use node::{AddressProps, GeowordProps, Node, NodeType, Point};

/// A linearization of the lattice: one chosen candidate per covered position, in left-to-right
/// order (§3 Path, GLOSSARY).
pub type Path = Vec<Node>;
