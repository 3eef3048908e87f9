use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::rating_date::{self, RatingDate};

/// Feelings a rating may carry. Matching is exact and case-sensitive.
pub const VALID_FEELINGS: [&str; 6] = ["Angry", "Bored", "Great", "Good", "Normal", "Sad"];

/// One journal entry, in its wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(with = "rating_date::wire")]
    pub date: RatingDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub feeling: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Reads an explicit `null` as the field's empty value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Rating {
    pub fn validate(&self) -> AppResult<()> {
        if is_valid(self) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Feeling must be one of {}",
                VALID_FEELINGS.join(", ")
            )))
        }
    }
}

pub fn is_valid_feeling(feeling: &str) -> bool {
    VALID_FEELINGS.contains(&feeling)
}

/// Only the feeling is checked; description, date and tags are accepted as-is.
pub fn is_valid(rating: &Rating) -> bool {
    !rating.feeling.is_empty() && is_valid_feeling(&rating.feeling)
}
