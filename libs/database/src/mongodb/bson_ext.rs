//! Conversions between application types and their BSON storage form.
//!
//! Documents keep ids as binary UUIDs (subtype 4) and timestamps as BSON
//! dates, so both stay indexable and readable from the mongo shell.

use chrono::{DateTime, Utc};
use mongodb::bson;

pub fn uuid_to_bson(id: uuid::Uuid) -> bson::Uuid {
    bson::Uuid::from_bytes(id.into_bytes())
}

pub fn uuid_from_bson(id: bson::Uuid) -> uuid::Uuid {
    uuid::Uuid::from_bytes(id.bytes())
}

/// `bson::Bson` value for use inside `doc!` filters.
pub fn uuid_bson(id: uuid::Uuid) -> bson::Bson {
    bson::Bson::from(uuid_to_bson(id))
}

pub fn datetime_to_bson(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

/// BSON dates carry millisecond precision; out-of-range values clamp to the epoch.
pub fn datetime_from_bson(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}
