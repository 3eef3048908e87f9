use bson::oid::ObjectId;

use crate::models::rating::Rating;
use crate::models::tags;

/// Store-assigned identity of a user record.
///
/// `Unassigned` records may only be inserted; `Assigned` ones may only be
/// replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Unassigned,
    Assigned(ObjectId),
}

impl Identity {
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Identity::Unassigned => None,
            Identity::Assigned(id) => Some(*id),
        }
    }
}

impl From<Option<ObjectId>> for Identity {
    fn from(id: Option<ObjectId>) -> Self {
        id.map_or(Identity::Unassigned, Identity::Assigned)
    }
}

/// The per-user aggregate: every rating ever submitted plus the tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub identity: Identity,
    pub username: String,
    pub ratings: Vec<Rating>,
    pub tags: Vec<String>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            identity: Identity::Unassigned,
            username: username.into(),
            ratings: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn push_rating(&mut self, rating: Rating) {
        tags::merge_into(&mut self.tags, &rating.tags);
        self.ratings.push(rating);
    }
}
