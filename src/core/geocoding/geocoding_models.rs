use serde::Deserialize;
use serde_json::Value;

/// Placeholder written to both coordinate cells when an address can't be resolved.
pub const SENTINEL: &str = "Error";

/// A resolved position. Pelias (like GeoJSON) orders the pair longitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Terminal outcome of geocoding one address.
///
/// Every address in a batch ends up as exactly one of these, so a failure is a
/// value the batch can write back rather than a hole in the result list.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Matched(Coordinates),
    /// No candidate for the address, or the address cell was blank.
    NoMatch,
    /// The request or its response was unusable.
    Failed(String),
}

impl GeocodeOutcome {
    /// The `[longitude, latitude]` cells for this outcome, or the sentinel pair.
    pub fn coordinate_cells(&self) -> [Value; 2] {
        match self {
            GeocodeOutcome::Matched(c) => [Value::from(c.longitude), Value::from(c.latitude)],
            _ => [Value::from(SENTINEL), Value::from(SENTINEL)],
        }
    }

    /// Text for the optional error column. Empty for a match.
    pub fn error_cell(&self) -> Value {
        match self {
            GeocodeOutcome::Matched(_) => Value::from(""),
            GeocodeOutcome::NoMatch => Value::from("No match"),
            GeocodeOutcome::Failed(reason) => Value::from(reason.as_str()),
        }
    }
}

// =============================================================================
// PELIAS SEARCH RESPONSE
// =============================================================================
//
// Only the parts of the GeoJSON FeatureCollection we read. Everything else the
// provider sends back (properties, bbox, geocoding metadata) is ignored.

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl SearchResponse {
    /// Coordinates of the provider's top-ranked candidate.
    ///
    /// `Ok(None)` means there were no candidates at all; `Err` means there was a
    /// candidate but its geometry wasn't a `[lon, lat]` pair.
    pub fn first_coordinates(&self) -> Result<Option<Coordinates>, String> {
        let Some(feature) = self.features.first() else {
            return Ok(None);
        };

        match feature.geometry.as_ref().map(|g| g.coordinates.as_slice()) {
            Some([longitude, latitude, ..]) => Ok(Some(Coordinates {
                longitude: *longitude,
                latitude: *latitude,
            })),
            _ => Err("first feature has no coordinate pair".to_string()),
        }
    }
}
