//! Lattice node variants, notation expansion, and geometry (§3, §4.1).

use std::collections::BTreeSet;

use geo::{Distance, Geodesic};
use serde::{Deserialize, Serialize};

use super::morpheme::Morpheme;

/// A WGS84 longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
  /// Longitude in degrees.
  pub lon: f64,
  /// Latitude in degrees.
  pub lat: f64,
}

impl Point {
  /// Builds a point from `(longitude, latitude)`, matching GeoJSON coordinate order.
  pub fn new(lon: f64, lat: f64) -> Self {
    Self { lon, lat }
  }

  fn as_geo_point(self) -> geo::Point<f64> {
    geo::Point::new(self.lon, self.lat)
  }
}

/// Properties carried by a `Geoword` node (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeowordProps {
  /// Opaque gazetteer entry id.
  pub geolod_id: String,
  /// Canonical body text of the entry, e.g. `"国会議事堂前"`.
  pub body: String,
  /// Optional recognized prefixes, e.g. `["東"]`.
  #[serde(default)]
  pub prefix: Vec<String>,
  /// Optional recognized suffixes, e.g. `["駅"]`.
  #[serde(default)]
  pub suffix: Vec<String>,
  /// Slash-delimited hierarchical entity class, e.g. `"鉄道施設/鉄道駅"`.
  pub ne_class: String,
  /// Ancestor labels (operator/line for a station, etc.), used for parent/sibling scoring.
  #[serde(default)]
  pub hypernym: Vec<String>,
  /// Latitude, degrees.
  pub latitude: f64,
  /// Longitude, degrees.
  pub longitude: f64,
  /// Numeric id of the owning dictionary.
  pub dictionary_id: i64,
  /// Stable identifier of the owning dictionary, e.g. `"geonlp:ksj-station-N02"`.
  pub dictionary_identifier: String,
  /// ISO date from which this entry is valid, if the gazetteer tracks validity.
  #[serde(default)]
  pub valid_from: Option<String>,
  /// ISO date until which this entry is valid, if the gazetteer tracks validity.
  #[serde(default)]
  pub valid_to: Option<String>,
}

/// Properties carried by an `Address` node (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressProps {
  /// Hierarchy level, 1 (prefecture) through 8 (building).
  pub level: u8,
  /// Hierarchy labels from the top level down to this address's own label.
  pub fullname: Vec<String>,
  /// Projected x coordinate (longitude).
  pub x: f64,
  /// Projected y coordinate (latitude).
  pub y: f64,
}

/// The node-type discriminant, surfaced separately for encoders (§4.8) and filters that only
/// need to branch on kind without matching the whole `Node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
  /// An ordinary, non-geographic token.
  Normal,
  /// A token resolved to a single gazetteer entry.
  Geoword,
  /// A collapsed multi-morpheme address expression.
  Address,
}

/// A lattice candidate: an ordinary token, a geoword, or a collapsed address span (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type")]
pub enum Node {
  /// An ordinary, non-geographic token.
  #[serde(rename = "NORMAL")]
  Normal {
    /// Surface form.
    surface: String,
    /// The underlying morpheme.
    morpheme: Morpheme,
  },
  /// A token resolved to a single gazetteer entry.
  #[serde(rename = "GEOWORD")]
  Geoword {
    /// Surface form.
    surface: String,
    /// The underlying morpheme, narrowed to the chosen gazetteer id (§4.2 rule 5).
    morpheme: Morpheme,
    /// Resolved geometry.
    geometry: Point,
    /// Gazetteer-derived properties.
    props: GeowordProps,
  },
  /// A collapsed multi-morpheme address expression.
  #[serde(rename = "ADDRESS")]
  Address {
    /// Surface form, the concatenation of the spanned positions' surfaces.
    surface: String,
    /// The spanned positions' chosen nodes, each `Geoword` or `Normal` (§3 invariant).
    inner_morphemes: Vec<Node>,
    /// Resolved geometry.
    geometry: Point,
    /// Address-tree-derived properties.
    props: AddressProps,
  },
}

impl Node {
  /// The node's discriminant (§4.8 `node_type`).
  pub fn node_type(&self) -> NodeType {
    match self {
      Node::Normal { .. } => NodeType::Normal,
      Node::Geoword { .. } => NodeType::Geoword,
      Node::Address { .. } => NodeType::Address,
    }
  }

  /// Surface form (§3).
  pub fn surface(&self) -> &str {
    match self {
      Node::Normal { surface, .. } | Node::Geoword { surface, .. } | Node::Address { surface, .. } => surface,
    }
  }

  /// How many lattice positions this node spans when selected by the path evaluator: 1 for
  /// `Normal`/`Geoword`, `inner_morphemes.len()` for `Address` (§3 Path, §4.5).
  pub fn span(&self) -> usize {
    match self {
      Node::Normal { .. } | Node::Geoword { .. } => 1,
      Node::Address { inner_morphemes, .. } => inner_morphemes.len(),
    }
  }

  /// The node's resolved geometry, if any (§4.1 `lonlat`).
  pub fn lonlat(&self) -> Option<(f64, f64)> {
    match self {
      Node::Normal { .. } => None,
      Node::Geoword { geometry, .. } | Node::Address { geometry, .. } => Some((geometry.lon, geometry.lat)),
    }
  }

  fn geometry(&self) -> Option<Point> {
    match self {
      Node::Normal { .. } => None,
      Node::Geoword { geometry, .. } | Node::Address { geometry, .. } => Some(*geometry),
    }
  }

  /// The `ne_class` of this node's geographic properties, if it has one. `Address` nodes do not
  /// carry an `ne_class`, so this is only `Some` for `Geoword`.
  pub fn ne_class(&self) -> Option<&str> {
    match self {
      Node::Geoword { props, .. } => Some(props.ne_class.as_str()),
      Node::Normal { .. } | Node::Address { .. } => None,
    }
  }

  /// Ancestor labels used for parent/sibling scoring (§4.6). Empty for non-geowords.
  pub fn hypernym(&self) -> &[String] {
    match self {
      Node::Geoword { props, .. } => &props.hypernym,
      Node::Normal { .. } | Node::Address { .. } => &[],
    }
  }

  /// All surface strings this node could plausibly be referred to by: for a geoword, the body
  /// combined with every configured prefix/suffix; for everything else, just `surface` (§4.1).
  pub fn notations(&self) -> BTreeSet<String> {
    let Node::Geoword { props, .. } = self else {
      return BTreeSet::from([self.surface().to_string()]);
    };

    let mut notations = BTreeSet::new();
    notations.insert(props.body.clone());
    for prefix in &props.prefix {
      notations.insert(format!("{prefix}{}", props.body));
    }
    for suffix in &props.suffix {
      notations.insert(format!("{}{suffix}", props.body));
    }
    for prefix in &props.prefix {
      for suffix in &props.suffix {
        notations.insert(format!("{prefix}{}{suffix}", props.body));
      }
    }
    notations
  }

  /// Geodesic distance in meters to `other`, using the WGS84 ellipsoid. `None` when either side
  /// lacks a resolved point (§4.1).
  pub fn distance(&self, other: &Node) -> Option<f64> {
    let a = self.geometry()?.as_geo_point();
    let b = other.geometry()?.as_geo_point();
    Some(Geodesic.distance(a, b))
  }
}
