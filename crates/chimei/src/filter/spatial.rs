//! Spatial filters (§4.4.3): `GeoContainsFilter`/`GeoDisjointFilter`.
//!
//! Per the Non-goal "no network I/O in the core", these only accept a pre-resolved GeoJSON
//! string or `geo_types::Geometry`; dereferencing a URL is a concern for the caller, not this
//! crate (the bundled `FilterError::ExternalFetch` variant exists for callers that do perform
//! such a fetch and want to surface the failure through the same error type).

use geo::{Contains, Geometry};

use super::{filter_positions, FallbackPolicy, Filter};
use crate::errors::{FilterError, GeoparserResult};
use crate::model::{Lattice, Node};

fn parse_geometry(geojson_text: &str) -> Result<Geometry<f64>, FilterError> {
  let value: geojson::GeoJson = geojson_text.parse().map_err(|e| FilterError::InvalidGeometry {
    reason: format!("{e}"),
  })?;
  let geometry = match value {
    geojson::GeoJson::Geometry(g) => g,
    geojson::GeoJson::Feature(f) => f.geometry.ok_or(FilterError::InvalidGeometry {
      reason: "feature has no geometry".to_string(),
    })?,
    geojson::GeoJson::FeatureCollection(_) => {
      return Err(FilterError::InvalidGeometry {
        reason: "expected a single geometry, got a feature collection".to_string(),
      })
    }
  };
  Geometry::<f64>::try_from(geometry).map_err(|e| FilterError::InvalidGeometry {
    reason: format!("{e}"),
  })
}

/// Keeps candidates whose point lies inside a fixed geometry. Candidates without a point always
/// pass. Falls back to `ConvertToNormal`.
pub struct GeoContainsFilter {
  geometry: Geometry<f64>,
}

impl GeoContainsFilter {
  /// Parses `geojson_text` (a single Geometry or a Feature wrapping one) once at construction.
  pub fn new(geojson_text: &str) -> GeoparserResult<Self> {
    Ok(Self {
      geometry: parse_geometry(geojson_text)?,
    })
  }

  /// Builds directly from an already-parsed geometry.
  pub fn from_geometry(geometry: Geometry<f64>) -> Self {
    Self { geometry }
  }

  fn passes(&self, node: &Node) -> bool {
    match node.lonlat() {
      None => true,
      Some((lon, lat)) => self.geometry.contains(&geo::Point::new(lon, lat)),
    }
  }
}

impl Filter for GeoContainsFilter {
  fn apply(&self, lattice: &Lattice) -> GeoparserResult<Lattice> {
    Ok(filter_positions(lattice, FallbackPolicy::ConvertToNormal, |n| self.passes(n)))
  }
}

/// The negation of [`GeoContainsFilter`]: keeps candidates whose point lies outside the
/// geometry. Candidates without a point always pass. Falls back to `ConvertToNormal`.
pub struct GeoDisjointFilter {
  inner: GeoContainsFilter,
}

impl GeoDisjointFilter {
  /// Parses `geojson_text` once at construction.
  pub fn new(geojson_text: &str) -> GeoparserResult<Self> {
    Ok(Self {
      inner: GeoContainsFilter::new(geojson_text)?,
    })
  }

  /// Builds directly from an already-parsed geometry.
  pub fn from_geometry(geometry: Geometry<f64>) -> Self {
    Self {
      inner: GeoContainsFilter::from_geometry(geometry),
    }
  }
}

impl Filter for GeoDisjointFilter {
  fn apply(&self, lattice: &Lattice) -> GeoparserResult<Lattice> {
    Ok(filter_positions(lattice, FallbackPolicy::ConvertToNormal, |n| {
      match n.lonlat() {
        None => true,
        Some(_) => !self.inner.passes(n),
      }
    }))
  }
}
