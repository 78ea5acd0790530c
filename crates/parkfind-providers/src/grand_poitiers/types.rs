//! Wire types for the Grand Poitiers open-data parking dataset.
//!
//! ## Observed shape (`data-fair` `lines` endpoint)
//!
//! ```json
//! { "total": 8, "results": [ { "_geopoint": "46.5838, 0.3377", "Capacite": 320,
//!   "Nom": "THEATRE", "Places": 46, "Id": 3, ... } ] }
//! ```
//!
//! - `_geopoint` is a single `"lat, lng"` string and is absent on some
//!   facilities.
//! - `Capacite` is total capacity, `Places` the currently free places.
//! - Many more fields are present (`_rand`, `_i`, `taux_doccupation`, update
//!   timestamps); they are ignored.

use serde::Deserialize;

/// Top-level response from the `lines` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct GrandPoitiersResponse {
    pub total: Option<i64>,
    pub results: Option<Vec<GrandPoitiersRecord>>,
}

/// A single parking facility as published by Grand Poitiers.
#[derive(Debug, Clone, Deserialize)]
pub struct GrandPoitiersRecord {
    /// Combined `"lat, lng"` position.
    #[serde(rename = "_geopoint")]
    pub geopoint: Option<String>,

    #[serde(rename = "Capacite")]
    pub capacity: Option<i32>,

    #[serde(rename = "Nom")]
    pub name: Option<String>,

    #[serde(rename = "Places")]
    pub available_places: Option<i32>,

    #[serde(rename = "Id")]
    pub id: Option<i64>,
}
