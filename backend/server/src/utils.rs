use axum::body::Bytes;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Decoded query string in request order, repeats included.
pub type QueryPairs = Vec<(String, String)>;

/// A repeated parameter resolves to its first occurrence.
pub fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Unparseable ids become the all-zero id, which no stored record carries.
pub fn parse_object_id(raw: &str) -> ObjectId {
    ObjectId::parse_str(raw.trim()).unwrap_or_else(|_| ObjectId::from_bytes([0; 12]))
}

pub fn parse_object_ids(raw: &str) -> Vec<ObjectId> {
    split_csv(raw).map(parse_object_id).collect()
}

pub fn split_csv(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn get_payload<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| AppError::MalformedPayload)
}
