//! # Influencer documents
//!
//! One collection, one document per influencer.
//!
//! | field         | type                  | notes                                   |
//! |---------------|-----------------------|-----------------------------------------|
//! | `_id`         | ObjectId              | assigned on insert, never changes       |
//! | `name`        | string \| null        | searched case-insensitively             |
//! | `bio`         | string \| null        |                                         |
//! | `avatar`      | string \| null        | url                                     |
//! | `nationality` | string \| null        |                                         |
//! | `gender`      | `"m"` \| `"f"` \| null |                                         |
//! | `socials`     | {platform: string}    |                                         |
//! | `label`       | [string]              | treated as a set                        |
//! | `visits`      | int                   | starts at 1, only ever incremented      |
//! | `updated_on`  | int                   | unix millis, stamped by the server      |
//!
//! Over HTTP `_id` is rendered as `id`, a 24 character hex string.
//!
//! Older documents may hold any `gender` value; anything but `m`/`f` reads back as null.
use std::collections::{BTreeSet, HashMap};

use mongodb::bson::{oid::ObjectId, serde_helpers::serialize_object_id_as_hex_string};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::IgnoredAny,
};

pub const ID: &str = "_id";
pub const NAME: &str = "name";
pub const AVATAR: &str = "avatar";
pub const GENDER: &str = "gender";
pub const LABEL: &str = "label";
pub const VISITS: &str = "visits";
pub const UPDATED_ON: &str = "updated_on";

pub const QUICK_FIND_LIMIT: i64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl Gender {
    /// Anything other than exactly `m` or `f` means "no gender filter".
    pub fn from_filter(raw: &str) -> Option<Self> {
        match raw {
            "m" => Some(Gender::Male),
            "f" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredGender {
    Known(Gender),
    Other(IgnoredAny),
}

fn stored_gender<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Gender>, D::Error> {
    Ok(match Option::<StoredGender>::deserialize(deserializer)? {
        Some(StoredGender::Known(gender)) => Some(gender),
        _ => None,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Influencer {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default, deserialize_with = "stored_gender")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub socials: Option<HashMap<String, String>>,
    #[serde(default)]
    pub label: Option<BTreeSet<String>>,
    #[serde(default)]
    pub visits: i64,
    #[serde(default)]
    pub updated_on: i64,
}

impl Influencer {
    pub fn new(id: ObjectId, payload: InfluencerPayload, updated_on: i64) -> Self {
        Self {
            id,
            name: payload.name,
            bio: payload.bio,
            avatar: payload.avatar,
            nationality: payload.nationality,
            gender: payload.gender,
            socials: payload.socials,
            label: payload.label,
            visits: 1,
            updated_on,
        }
    }

    /// Overwrites every client-writable field. `visits` is left alone.
    pub fn replace_fields(&mut self, payload: InfluencerPayload, updated_on: i64) {
        self.name = payload.name;
        self.bio = payload.bio;
        self.avatar = payload.avatar;
        self.nationality = payload.nationality;
        self.gender = payload.gender;
        self.socials = payload.socials;
        self.label = payload.label;
        self.updated_on = updated_on;
    }

    pub fn summary(&self) -> InfluencerSummary {
        InfluencerSummary {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Projection used by quick-find.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfluencerSummary {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl InfluencerSummary {
    pub const FIELDS: [&'static str; 3] = [ID, NAME, AVATAR];
}

/// Client-writable fields of a record, as accepted by create and update.
///
/// Omitted fields deserialize to `None` and are stored as null, so an update
/// always replaces the whole set. Unknown fields are dropped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InfluencerPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub socials: Option<HashMap<String, String>>,
    #[serde(default)]
    pub label: Option<BTreeSet<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Bson, doc, from_document};
    use serde_json::json;

    #[test]
    fn test_gender_filter() {
        assert_eq!(Gender::from_filter("m"), Some(Gender::Male));
        assert_eq!(Gender::from_filter("f"), Some(Gender::Female));
        assert_eq!(Gender::from_filter("M"), None);
        assert_eq!(Gender::from_filter("x"), None);
        assert_eq!(Gender::from_filter(""), None);
    }

    #[test]
    fn test_payload_drops_unknown_fields() {
        let payload: InfluencerPayload = serde_json::from_value(json!({
            "name": "Ana",
            "visits": 900,
            "updated_on": 1,
            "whatever": true
        }))
        .unwrap();

        assert_eq!(payload.name.as_deref(), Some("Ana"));
        assert_eq!(payload.bio, None);
        assert_eq!(payload.label, None);
    }

    #[test]
    fn test_payload_label_is_a_set() {
        let payload: InfluencerPayload =
            serde_json::from_value(json!({ "label": ["tech", "music", "tech"] })).unwrap();

        assert_eq!(payload.label.unwrap().len(), 2);
    }

    #[test]
    fn test_payload_rejects_unknown_gender() {
        let payload = serde_json::from_value::<InfluencerPayload>(json!({ "gender": "x" }));
        assert!(payload.is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let id = ObjectId::new();
        let record = Influencer::new(
            id,
            InfluencerPayload {
                name: Some("Ana".into()),
                gender: Some(Gender::Female),
                ..Default::default()
            },
            42,
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], json!(id.to_hex()));
        assert_eq!(value["gender"], json!("f"));
        assert_eq!(value["visits"], json!(1));
        assert_eq!(value["updated_on"], json!(42));
        assert_eq!(value["bio"], json!(null));
    }

    #[test]
    fn test_stored_gender_is_lenient() {
        let id = ObjectId::new();

        for (stored, expected) in [
            (Bson::String("f".into()), Some(Gender::Female)),
            (Bson::String("M".into()), None),
            (Bson::String(String::new()), None),
            (Bson::Int32(3), None),
            (Bson::Null, None),
        ] {
            let record: Influencer =
                from_document(doc! { "_id": id, "name": "Ana", "gender": stored }).unwrap();

            assert_eq!(record.gender, expected);
            assert_eq!(record.name.as_deref(), Some("Ana"));
        }

        let record: Influencer = from_document(doc! { "_id": id }).unwrap();
        assert_eq!(record.gender, None);
    }

    #[test]
    fn test_replace_fields_keeps_visits() {
        let mut record = Influencer::new(
            ObjectId::new(),
            InfluencerPayload {
                name: Some("Ana".into()),
                label: Some(BTreeSet::from(["tech".to_string()])),
                ..Default::default()
            },
            1,
        );
        record.visits = 7;

        record.replace_fields(
            InfluencerPayload {
                name: Some("Bea".into()),
                ..Default::default()
            },
            2,
        );

        assert_eq!(record.name.as_deref(), Some("Bea"));
        assert_eq!(record.label, None);
        assert_eq!(record.visits, 7);
        assert_eq!(record.updated_on, 2);
    }
}
