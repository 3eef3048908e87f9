//! User document schema
//!
//! One document per user in the `Ratings` collection:
//! `{ _id, Username, Ratings: [{ Date, Description, Feeling, Tags }], Tags }`.

use bson::{doc, oid::ObjectId, Document};
use mongodb::{options::IndexOptions, IndexModel};
use serde::{Deserialize, Serialize};

use crate::models::rating::{null_as_default, Rating};
use crate::models::rating_date::{self, DateFormatError};
use crate::models::user_record::UserRecord;

/// Collection holding user documents
pub const RATINGS_COLLECTION: &str = "Ratings";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UserDoc {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub username: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ratings: Vec<RatingDoc>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RatingDoc {
    pub date: bson::DateTime,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub feeling: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl From<&Rating> for RatingDoc {
    fn from(rating: &Rating) -> Self {
        Self {
            date: rating_date::encode_storage(rating.date),
            description: rating.description.clone(),
            feeling: rating.feeling.clone(),
            tags: rating.tags.clone(),
        }
    }
}

impl TryFrom<RatingDoc> for Rating {
    type Error = DateFormatError;

    fn try_from(doc: RatingDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            date: rating_date::decode_storage(doc.date)?,
            description: doc.description,
            feeling: doc.feeling,
            tags: doc.tags,
        })
    }
}

impl From<&UserRecord> for UserDoc {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.identity.object_id(),
            username: record.username.clone(),
            ratings: record.ratings.iter().map(RatingDoc::from).collect(),
            tags: record.tags.clone(),
        }
    }
}

impl TryFrom<UserDoc> for UserRecord {
    type Error = DateFormatError;

    fn try_from(doc: UserDoc) -> Result<Self, Self::Error> {
        let ratings = doc
            .ratings
            .into_iter()
            .map(Rating::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            identity: doc.id.into(),
            username: doc.username,
            ratings,
            tags: doc.tags,
        })
    }
}

/// Decode a raw stored document. Failures are logged and reported as absent.
pub fn decode_user(document: Document, username: &str) -> Option<UserRecord> {
    let user_doc: UserDoc = match bson::from_document(document) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(username, error = %e, "Stored user data failed to decode");
            return None;
        }
    };

    match UserRecord::try_from(user_doc) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(username, error = %e, "Stored rating date is unusable");
            None
        }
    }
}

/// Unique index on `Username`, so a racing duplicate insert is refused.
pub fn username_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "Username": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name("username_unique".to_string())
                .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rating_date::RatingDate;
    use crate::models::user_record::Identity;

    fn sample_record() -> UserRecord {
        let mut record = UserRecord::new("alice");
        record.identity = Identity::Assigned(ObjectId::new());
        record.push_rating(Rating {
            date: RatingDate::from_ymd(2024, 1, 1).unwrap(),
            description: "long day".into(),
            feeling: "Good".into(),
            tags: vec!["work".into()],
        });
        record
    }

    #[test]
    fn test_document_field_names() {
        let record = sample_record();
        let document = bson::to_document(&UserDoc::from(&record)).unwrap();

        assert!(document.get_object_id("_id").is_ok());
        assert_eq!(document.get_str("Username").unwrap(), "alice");
        assert_eq!(document.get_array("Tags").unwrap().len(), 1);

        let ratings = document.get_array("Ratings").unwrap();
        let first = ratings[0].as_document().unwrap();
        assert_eq!(
            first.get_datetime("Date").unwrap().timestamp_millis(),
            1_704_067_200_000
        );
        assert_eq!(first.get_str("Description").unwrap(), "long day");
        assert_eq!(first.get_str("Feeling").unwrap(), "Good");
        assert_eq!(first.get_array("Tags").unwrap().len(), 1);
    }

    #[test]
    fn test_unassigned_identity_omits_id() {
        let document = bson::to_document(&UserDoc::from(&UserRecord::new("bob"))).unwrap();
        assert!(!document.contains_key("_id"));
        assert!(document.get_array("Ratings").unwrap().is_empty());
    }

    #[test]
    fn test_decode_restores_record() {
        let record = sample_record();
        let document = bson::to_document(&UserDoc::from(&record)).unwrap();
        assert_eq!(decode_user(document, "alice"), Some(record));
    }

    #[test]
    fn test_decode_tolerates_null_fields() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "Username": "carol",
            "Ratings": [{
                "Date": bson::DateTime::from_millis(0),
                "Description": bson::Bson::Null,
                "Feeling": "Sad",
                "Tags": bson::Bson::Null,
            }],
            "Tags": bson::Bson::Null,
        };
        let record = decode_user(document, "carol").unwrap();
        assert_eq!(record.identity, Identity::Assigned(id));
        assert!(record.tags.is_empty());
        assert!(record.ratings[0].tags.is_empty());
        assert_eq!(record.ratings[0].description, "");
    }

    #[test]
    fn test_decode_failure_reads_as_absent() {
        let document = doc! { "_id": ObjectId::new(), "Username": 42 };
        assert!(decode_user(document, "dave").is_none());
    }
}
