//! Static geography: land mass outlines, mountain zones, color ramp and city
//! locations for the British Isles, plus loading a replacement catalog from
//! JSON.
//!
//! Outlines are deliberately coarse; they are smoothed once when a renderer
//! is created.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elevation::ElevationZone;
use crate::error::{RenderError, Result};
use crate::land_mask::LandMassId;
use crate::palette::ColorRamp;
use crate::projection::{GeoBounds, GeoPoint};

/// A named closed outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandMass {
    pub id: LandMassId,
    pub name: String,
    pub outline: Vec<GeoPoint>,
}

/// A city the dashboard reports results for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub location: GeoPoint,
}

/// Everything the renderer needs to know about the mapped region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeographyCatalog {
    pub bounds: GeoBounds,
    pub land_masses: Vec<LandMass>,
    pub zones: Vec<ElevationZone>,
    pub ramp: ColorRamp,
    #[serde(default)]
    pub cities: Vec<City>,
}

impl Default for GeographyCatalog {
    fn default() -> Self {
        Self::british_isles()
    }
}

impl GeographyCatalog {
    /// Load and validate a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let catalog: GeographyCatalog = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks that span several fields. Per-field invariants are enforced by
    /// the field types themselves.
    pub fn validate(&self) -> Result<()> {
        for (i, mass) in self.land_masses.iter().enumerate() {
            if self.land_masses[..i].iter().any(|other| other.id == mass.id) {
                return Err(RenderError::InvalidConfig(format!(
                    "land mass id {} used more than once",
                    mass.id.0
                )));
            }
            if mass.outline.iter().any(|p| !(p.lat.is_finite() && p.lng.is_finite())) {
                return Err(RenderError::InvalidConfig(format!(
                    "land mass '{}' has a non-finite point",
                    mass.name
                )));
            }
        }
        Ok(())
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Great Britain, Ireland and the Isle of Man.
    pub fn british_isles() -> Self {
        Self {
            bounds: GeoBounds::fixed(49.6, 59.2, -11.0, 2.2),
            land_masses: vec![
                LandMass {
                    id: LandMassId(1),
                    name: "Great Britain".into(),
                    outline: points(GREAT_BRITAIN),
                },
                LandMass {
                    id: LandMassId(2),
                    name: "Ireland".into(),
                    outline: points(IRELAND),
                },
                LandMass {
                    id: LandMassId(3),
                    name: "Isle of Man".into(),
                    outline: points(ISLE_OF_MAN),
                },
            ],
            zones: ZONES
                .iter()
                .map(|&(name, lat, lng, boost, sigma_lat, sigma_lng)| {
                    ElevationZone::fixed(name, lat, lng, boost, sigma_lat, sigma_lng)
                })
                .collect(),
            ramp: ColorRamp::relief(),
            cities: CITIES
                .iter()
                .map(|&(name, lat, lng)| City {
                    name: name.into(),
                    location: GeoPoint::new(lat, lng),
                })
                .collect(),
        }
    }
}

fn points(raw: &[(f64, f64)]) -> Vec<GeoPoint> {
    raw.iter().map(|&(lat, lng)| GeoPoint::new(lat, lng)).collect()
}

// =============================================================================
// OUTLINES (lat, lng)
// =============================================================================

// Counter-clockwise from Land's End: south coast east, east coast north,
// round Caithness, then down the west coast.
const GREAT_BRITAIN: &[(f64, f64)] = &[
    (50.07, -5.71), (50.03, -5.20), (50.35, -4.50), (50.22, -3.65),
    (50.60, -3.40), (50.70, -2.45), (50.72, -1.90), (50.78, -1.10),
    (50.76, -0.20), (50.74, 0.25), (50.91, 0.97), (51.13, 1.38),
    (51.38, 1.42), (51.50, 0.60), (51.80, 1.15), (52.08, 1.60),
    (52.48, 1.75), (52.93, 1.30), (52.95, 0.50), (52.80, 0.20),
    (53.15, 0.35), (53.58, 0.15), (54.10, -0.10), (54.50, -0.60),
    (54.95, -1.40), (55.60, -1.65), (56.00, -2.50), (56.05, -3.00),
    (56.30, -2.60), (56.70, -2.45), (57.15, -2.05), (57.50, -1.78),
    (57.68, -2.50), (57.65, -3.60), (57.55, -4.20), (57.85, -3.75),
    (58.30, -3.10), (58.64, -3.05), (58.60, -3.50), (58.55, -4.70),
    (58.62, -5.00), (58.20, -5.35), (57.90, -5.70), (57.40, -5.80),
    (56.90, -5.90), (56.70, -6.20), (56.40, -5.50), (55.90, -5.60),
    (55.30, -5.80), (55.70, -4.90), (55.30, -4.80), (54.65, -4.85),
    (54.85, -4.00), (54.95, -3.30), (54.50, -3.60), (54.05, -3.20),
    (53.80, -3.05), (53.40, -3.10), (53.30, -3.80), (53.40, -4.40),
    (53.20, -4.70), (52.80, -4.75), (52.40, -4.10), (52.05, -4.80),
    (51.75, -5.25), (51.60, -4.50), (51.50, -3.20), (51.20, -3.50),
    (51.20, -4.20), (50.85, -4.55), (50.50, -5.05), (50.20, -5.50),
];

const IRELAND: &[(f64, f64)] = &[
    (51.45, -9.80), (51.60, -8.50), (51.85, -8.00), (52.15, -6.95),
    (52.17, -6.36), (52.65, -6.20), (53.35, -6.10), (53.75, -6.25),
    (54.05, -6.05), (54.40, -5.50), (54.70, -5.60), (55.20, -6.10),
    (55.25, -7.00), (55.38, -7.40), (55.20, -8.20), (54.65, -8.75),
    (54.30, -8.60), (54.25, -9.90), (53.80, -9.90), (53.40, -10.15),
    (53.10, -9.20), (52.70, -9.70), (52.25, -10.35), (51.80, -10.30),
    (51.55, -9.90),
];

const ISLE_OF_MAN: &[(f64, f64)] = &[
    (54.06, -4.80), (54.10, -4.55), (54.22, -4.35), (54.41, -4.36),
    (54.38, -4.55), (54.24, -4.72),
];

// =============================================================================
// MOUNTAIN ZONES (name, lat, lng, boost, sigma_lat, sigma_lng)
// =============================================================================

const ZONES: &[(&str, f64, f64, f64, f64, f64)] = &[
    ("Northwest Highlands", 57.9, -5.0, 0.30, 0.45, 0.45),
    ("Grampians", 56.85, -4.5, 0.35, 0.35, 0.9),
    ("Cairngorms", 57.08, -3.65, 0.30, 0.25, 0.35),
    ("Southern Uplands", 55.4, -3.5, 0.18, 0.35, 0.8),
    ("Lake District", 54.5, -3.1, 0.25, 0.2, 0.25),
    ("Pennines", 54.2, -2.1, 0.18, 0.7, 0.25),
    ("Snowdonia", 53.07, -3.95, 0.28, 0.25, 0.25),
    ("Cambrian Mountains", 52.35, -3.75, 0.16, 0.35, 0.3),
    ("Brecon Beacons", 51.88, -3.45, 0.18, 0.15, 0.4),
    ("Dartmoor", 50.57, -3.92, 0.14, 0.12, 0.18),
    ("Wicklow Mountains", 53.0, -6.4, 0.2, 0.2, 0.2),
    ("Mourne Mountains", 54.18, -6.0, 0.18, 0.1, 0.15),
    ("MacGillycuddy's Reeks", 51.98, -9.75, 0.25, 0.15, 0.3),
    ("Twelve Bens", 53.55, -9.7, 0.16, 0.2, 0.2),
    ("Derryveagh Mountains", 54.95, -8.0, 0.16, 0.25, 0.3),
    ("Snaefell", 54.26, -4.46, 0.12, 0.06, 0.08),
];

const CITIES: &[(&str, f64, f64)] = &[
    ("London", 51.507, -0.128),
    ("Edinburgh", 55.953, -3.188),
    ("Dublin", 53.349, -6.260),
];
