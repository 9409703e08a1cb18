//! Maps response models
//!
//! Public types are what the client returns and caches. The `Raw*` types
//! mirror the Google-shaped JSON the proxy forwards and are only used for
//! parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use trip_planner_core::GeoPoint;

use crate::{ApiStatus, MapsError};

/// A geocoded address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    pub place_id: Option<String>,
}

impl GeocodeResult {
    pub fn to_geo_point(&self, name: impl Into<String>) -> GeoPoint {
        GeoPoint::new(name, self.lat, self.lng)
    }
}

/// One entry of a text search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// First place type reported upstream (e.g., "museum")
    pub category: Option<String>,
    pub rating: Option<f32>,
}

impl PlaceSummary {
    pub fn to_geo_point(&self) -> GeoPoint {
        let point = GeoPoint::new(self.name.clone(), self.lat, self.lng);
        match &self.category {
            Some(category) => point.with_category(category.clone()),
            None => point,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub rating: Option<f32>,
    pub website: Option<String>,
    pub phone: Option<String>,
    /// Human-readable weekly hours, one line per day
    #[serde(default)]
    pub opening_hours: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
}

/// First route returned by a directions request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsSummary {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    /// Encoded overview polyline
    pub polyline: Option<String>,
    pub legs: Vec<RouteLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----- wire shapes -----

#[derive(Debug, Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: RawLatLng,
}

#[derive(Debug, Deserialize)]
struct RawGeocode {
    formatted_address: String,
    place_id: Option<String>,
    geometry: RawGeometry,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    place_id: String,
    name: String,
    formatted_address: Option<String>,
    vicinity: Option<String>,
    geometry: RawGeometry,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<f32>,
    website: Option<String>,
    formatted_phone_number: Option<String>,
    opening_hours: Option<RawOpeningHours>,
}

#[derive(Debug, Deserialize)]
struct RawOpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    distance: RawValue,
    duration: RawValue,
    start_address: Option<String>,
    end_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    #[serde(default)]
    legs: Vec<RawLeg>,
    overview_polyline: Option<RawPolyline>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    description: String,
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct ResultsBody<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DetailsBody {
    result: Option<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct DirectionsBody {
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct PredictionsBody {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

/// Read the `status` field of a proxy response
pub fn response_status(body: &Value) -> Result<ApiStatus, MapsError> {
    body.get("status")
        .and_then(Value::as_str)
        .map(ApiStatus::from)
        .ok_or(MapsError::MissingStatus)
}

/// An OK response with nothing in it is answered like `ZERO_RESULTS`
fn zero_results() -> MapsError {
    MapsError::Status(ApiStatus::ZeroResults)
}

fn non_empty<T>(items: Vec<T>) -> Result<Vec<T>, MapsError> {
    if items.is_empty() {
        Err(zero_results())
    } else {
        Ok(items)
    }
}

pub(crate) fn parse_geocode(body: Value) -> Result<Option<GeocodeResult>, MapsError> {
    let body: ResultsBody<RawGeocode> = serde_json::from_value(body)?;
    let r = body.results.into_iter().next().ok_or_else(zero_results)?;
    Ok(Some(GeocodeResult {
        lat: r.geometry.location.lat,
        lng: r.geometry.location.lng,
        formatted_address: r.formatted_address,
        place_id: r.place_id,
    }))
}

pub(crate) fn parse_places(body: Value) -> Result<Vec<PlaceSummary>, MapsError> {
    let body: ResultsBody<RawPlace> = serde_json::from_value(body)?;
    non_empty(
        body.results
            .into_iter()
            .map(|p| PlaceSummary {
                category: p.types.first().cloned(),
                address: p.formatted_address.or(p.vicinity),
                place_id: p.place_id,
                name: p.name,
                lat: p.geometry.location.lat,
                lng: p.geometry.location.lng,
                rating: p.rating,
            })
            .collect(),
    )
}

pub(crate) fn parse_details(body: Value) -> Result<Option<PlaceDetails>, MapsError> {
    let body: DetailsBody = serde_json::from_value(body)?;
    let p = body.result.ok_or_else(zero_results)?;
    Ok(Some(PlaceDetails {
        address: p.formatted_address.or(p.vicinity),
        place_id: p.place_id,
        name: p.name,
        lat: p.geometry.location.lat,
        lng: p.geometry.location.lng,
        rating: p.rating,
        website: p.website,
        phone: p.formatted_phone_number,
        opening_hours: p.opening_hours.map(|h| h.weekday_text).unwrap_or_default(),
        types: p.types,
    }))
}

pub(crate) fn parse_directions(body: Value) -> Result<Option<DirectionsSummary>, MapsError> {
    let body: DirectionsBody = serde_json::from_value(body)?;
    let route = body.routes.into_iter().next().ok_or_else(zero_results)?;
    let legs: Vec<RouteLeg> = route
        .legs
        .into_iter()
        .map(|leg| RouteLeg {
            distance_meters: leg.distance.value,
            duration_seconds: leg.duration.value,
            start_address: leg.start_address,
            end_address: leg.end_address,
        })
        .collect();

    Ok(Some(DirectionsSummary {
        distance_meters: legs.iter().map(|l| l.distance_meters).sum(),
        duration_seconds: legs.iter().map(|l| l.duration_seconds).sum(),
        polyline: route.overview_polyline.map(|p| p.points),
        legs,
    }))
}

pub(crate) fn parse_predictions(body: Value) -> Result<Vec<Prediction>, MapsError> {
    let body: PredictionsBody = serde_json::from_value(body)?;
    non_empty(
        body.predictions
            .into_iter()
            .map(|p| Prediction {
                description: p.description,
                place_id: p.place_id,
            })
            .collect(),
    )
}
