use bson::{Bson, DateTime, Document, doc};
use candystore::{
    collection::CollectionRef,
    document::document_to_json,
    envelope::{Outcome, ResultEnvelope},
    query::{Criteria, Filter, Projection, SortDirection},
};
use chrono::Utc;
use serde_json::Value;

use crate::{error::ApiError, models::LocationReport};

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

fn coordinate(document: &Document, key: &str) -> Option<f64> {
    match document.get(key)? {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

fn validate(latitude: f64, longitude: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::bad_request("Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::bad_request("Longitude must be between -180 and 180"));
    }
    Ok(())
}

/// Last known user positions, one document per email.
pub struct Locations {
    locations: CollectionRef,
}

impl Locations {
    pub fn new(locations: CollectionRef) -> Self {
        Self { locations }
    }

    /// Records a position, replacing any earlier one for the same email.
    pub async fn post(&self, report: LocationReport) -> Result<Outcome, ApiError> {
        validate(report.latitude, report.longitude)?;
        let timestamp = DateTime::from_chrono(report.timestamp.unwrap_or_else(Utc::now));

        let outcome = self
            .locations
            .update(
                Some(Filter::eq("email", report.email.as_str())),
                doc! {
                    "email": report.email.as_str(),
                    "latitude": report.latitude,
                    "longitude": report.longitude,
                    "timestamp": timestamp,
                },
                true,
            )
            .await;

        if outcome.success {
            Ok(outcome)
        } else {
            Err(ApiError::internal_server_error(
                outcome.message.unwrap_or_else(|| "location upsert failed".into()),
            ))
        }
    }

    /// The most recent position reported for `email`.
    pub async fn latest(&self, email: &str) -> Result<Option<Value>, ApiError> {
        let envelope = self
            .locations
            .get(
                Criteria::builder()
                    .filter(Filter::eq("email", email))
                    .projection(Projection::exclude(["_id"]))
                    .sort("timestamp", SortDirection::Desc)
                    .limit(1)
                    .build(),
            )
            .await;

        Self::checked(envelope).map(|data| data.into_iter().next())
    }

    pub async fn list(&self) -> Result<Vec<Value>, ApiError> {
        Self::checked(self.locations.get(Criteria::all()).await)
    }

    /// Every location within `radius_km` of the given point, nearest first, each
    /// annotated with `distance_km`.
    pub async fn within_radius(&self, latitude: f64, longitude: f64, radius_km: f64) -> Result<Vec<Value>, ApiError> {
        validate(latitude, longitude)?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ApiError::bad_request("Radius must be a non-negative number"));
        }

        let mut hits: Vec<(f64, Document)> = self
            .locations
            .find(&Criteria::all())
            .await?
            .into_iter()
            .filter_map(|document| {
                let lat = coordinate(&document, "latitude")?;
                let lon = coordinate(&document, "longitude")?;
                let distance = haversine_km(latitude, longitude, lat, lon);
                (distance <= radius_km).then_some((distance, document))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(hits
            .into_iter()
            .map(|(distance, mut document)| {
                document.insert("distance_km", distance);
                document_to_json(document)
            })
            .collect())
    }

    fn checked(envelope: ResultEnvelope) -> Result<Vec<Value>, ApiError> {
        if envelope.success {
            Ok(envelope.data)
        } else {
            Err(ApiError::internal_server_error(envelope.error.unwrap_or_default()))
        }
    }
}
