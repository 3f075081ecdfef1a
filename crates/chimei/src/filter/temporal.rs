//! Temporal filters (§4.4.4): five interval relations over a geoword's `valid_from`/`valid_to`.

use chrono::NaiveDate;

use super::{filter_positions, FallbackPolicy, Filter};
use crate::errors::{FilterError, GeoparserResult};
use crate::model::{Lattice, Node};

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Which interval relation a [`TemporalFilter`] evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalRelation {
  /// Candidate's interval intersects the filter's.
  Exists,
  /// Candidate started at or before the filter's start.
  Before,
  /// Candidate ended at or after the filter's end.
  After,
  /// Same test as `Exists`, named for interval-vs-interval overlap.
  Overlaps,
  /// The filter's interval lies entirely inside the candidate's.
  Covers,
  /// The candidate's interval lies entirely inside the filter's; both candidate endpoints must
  /// be present.
  Contains,
}

/// A fixed `(from, to)` interval evaluated against each geoword candidate's validity interval
/// (§4.4.4). Candidates without temporal properties (`Normal`, `Address`) always pass.
pub struct TemporalFilter {
  relation: TemporalRelation,
  from: NaiveDate,
  to: NaiveDate,
}

impl TemporalFilter {
  /// Builds a filter over `[from, to]`, each an ISO `YYYY-MM-DD` date.
  pub fn new(relation: TemporalRelation, from: &str, to: &str) -> GeoparserResult<Self> {
    let from = parse_date(from)?;
    let to = parse_date(to)?;
    Ok(Self { relation, from, to })
  }

  /// Builds a filter over a single date (`from == to`).
  pub fn single_date(relation: TemporalRelation, date: &str) -> GeoparserResult<Self> {
    let date = parse_date(date)?;
    Ok(Self { relation, from: date, to: date })
  }

  fn passes(&self, node: &Node) -> bool {
    let Node::Geoword { props, .. } = node else {
      return true;
    };
    let candidate_from = props.valid_from.as_deref().and_then(|d| parse_date(d).ok());
    let candidate_to = props.valid_to.as_deref().and_then(|d| parse_date(d).ok());

    match self.relation {
      TemporalRelation::Exists | TemporalRelation::Overlaps => {
        candidate_from.is_none_or(|cf| cf <= self.to) && candidate_to.is_none_or(|ct| ct >= self.from)
      }
      TemporalRelation::Before => candidate_from.is_none_or(|cf| cf <= self.from),
      TemporalRelation::After => candidate_to.is_none_or(|ct| ct >= self.to),
      TemporalRelation::Covers => {
        candidate_from.is_none_or(|cf| cf <= self.from) && candidate_to.is_none_or(|ct| ct >= self.to)
      }
      TemporalRelation::Contains => match (candidate_from, candidate_to) {
        (Some(cf), Some(ct)) => self.from <= cf && ct <= self.to,
        _ => false,
      },
    }
  }
}

fn parse_date(text: &str) -> Result<NaiveDate, FilterError> {
  NaiveDate::parse_from_str(text, ISO_DATE_FORMAT).map_err(|e| FilterError::TemporalParse {
    text: text.to_string(),
    reason: e.to_string(),
  })
}

impl Filter for TemporalFilter {
  fn apply(&self, lattice: &Lattice) -> GeoparserResult<Lattice> {
    Ok(filter_positions(lattice, FallbackPolicy::ConvertToNormal, |n| self.passes(n)))
  }
}
