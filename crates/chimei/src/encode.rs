//! Encoders (§4.8): convert a resolved [`Node`] into the canonical plain object or a GeoJSON
//! `Feature`.

use geojson::{Feature, Geometry, JsonObject, Value as GeoJsonValue};
use serde_json::{json, Value};

use crate::model::{Node, NodeType};

fn node_type_label(node_type: NodeType) -> &'static str {
  match node_type {
    NodeType::Normal => "NORMAL",
    NodeType::Geoword => "GEOWORD",
    NodeType::Address => "ADDRESS",
  }
}

fn morphemes_value(node: &Node) -> Value {
  match node {
    Node::Normal { morpheme, .. } | Node::Geoword { morpheme, .. } => {
      serde_json::to_value(morpheme).unwrap_or(Value::Null)
    }
    Node::Address { inner_morphemes, .. } => {
      Value::Array(inner_morphemes.iter().map(as_dict).collect())
    }
  }
}

fn geometry_value(node: &Node) -> Value {
  match node.lonlat() {
    None => Value::Null,
    Some((lon, lat)) => json!({"type": "Point", "coordinates": [lon, lat]}),
  }
}

fn prop_value(node: &Node) -> Value {
  match node {
    Node::Normal { .. } => Value::Null,
    Node::Geoword { props, .. } => serde_json::to_value(props).unwrap_or(Value::Null),
    Node::Address { props, .. } => serde_json::to_value(props).unwrap_or(Value::Null),
  }
}

/// The canonical plain-object encoding of `node` (§4.8 `as_dict`): `surface`, `node_type`,
/// `morphemes`, `geometry`, `prop`.
pub fn as_dict(node: &Node) -> Value {
  json!({
    "surface": node.surface(),
    "node_type": node_type_label(node.node_type()),
    "morphemes": morphemes_value(node),
    "geometry": geometry_value(node),
    "prop": prop_value(node),
  })
}

/// `node` as a GeoJSON `Feature` (§4.8 `as_geojson`): geometry is `None` for `Normal` nodes,
/// a `Point` otherwise; properties carry `geoword_properties` or `address_properties` keyed by
/// node type, omitted entirely for `Normal`.
pub fn as_geojson(node: &Node) -> Feature {
  let geometry = node.lonlat().map(|(lon, lat)| Geometry::new(GeoJsonValue::Point(vec![lon, lat])));

  let mut properties = JsonObject::new();
  properties.insert("surface".to_string(), Value::String(node.surface().to_string()));
  properties.insert(
    "node_type".to_string(),
    Value::String(node_type_label(node.node_type()).to_string()),
  );
  properties.insert("morphemes".to_string(), morphemes_value(node));

  match node {
    Node::Normal { .. } => {}
    Node::Geoword { props, .. } => {
      properties.insert(
        "geoword_properties".to_string(),
        serde_json::to_value(props).unwrap_or(Value::Null),
      );
    }
    Node::Address { props, .. } => {
      properties.insert(
        "address_properties".to_string(),
        serde_json::to_value(props).unwrap_or(Value::Null),
      );
    }
  }

  Feature {
    bbox: None,
    geometry,
    id: None,
    properties: Some(properties),
    foreign_members: None,
  }
}

/// `nodes` encoded as a GeoJSON `FeatureCollection`, the top-level shape `geoparse()` returns
/// (§4.8, §4.7 step 7).
pub fn as_feature_collection(nodes: &[Node]) -> geojson::FeatureCollection {
  geojson::FeatureCollection {
    bbox: None,
    features: nodes.iter().map(as_geojson).collect(),
    foreign_members: None,
  }
}
