//! Ratings
//!
//! A placed order can be rated once with a score from one to five stars and
//! an optional comment.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::OrderId;

/// Errors from building a rating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    /// The score is outside `1..=5`.
    #[error("score must be between 1 and 5, got {0}")]
    ScoreOutOfRange(i64),
}

/// Star score, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// Lowest score.
    pub const MIN: u8 = 1;

    /// Highest score.
    pub const MAX: u8 = 5;

    /// Validate a score.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::ScoreOutOfRange`] outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|score| (Self::MIN..=Self::MAX).contains(score))
            .map(Self)
            .ok_or(RatingError::ScoreOutOfRange(value))
    }

    /// Number of stars.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// Rating to submit for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRating {
    /// Rated order.
    #[serde(rename = "pedido_id")]
    pub order_id: OrderId,

    /// Star score.
    #[serde(rename = "nota")]
    pub score: Score,

    /// Free-text comment, empty when none was given.
    #[serde(rename = "comentario")]
    pub comment: String,
}

impl NewRating {
    /// Rating for `order`. A blank comment is sent empty.
    pub fn new(order_id: OrderId, score: Score, comment: Option<&str>) -> Self {
        Self {
            order_id,
            score,
            comment: comment.map(str::trim).unwrap_or_default().to_string(),
        }
    }
}

/// Rating the backend already holds for an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rating {
    /// Star score as stored.
    #[serde(rename = "nota")]
    pub score: u8,

    /// Comment as stored.
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn accepts_one_to_five_stars() -> TestResult {
        assert_eq!(Score::new(1)?.get(), 1);
        assert_eq!(Score::new(5)?.get(), 5);

        Ok(())
    }

    #[test]
    fn rejects_scores_outside_range() {
        assert_eq!(Score::new(0), Err(RatingError::ScoreOutOfRange(0)));
        assert_eq!(Score::new(6), Err(RatingError::ScoreOutOfRange(6)));
        assert_eq!(Score::new(-3), Err(RatingError::ScoreOutOfRange(-3)));
        assert_eq!(Score::new(300), Err(RatingError::ScoreOutOfRange(300)));
    }

    #[test]
    fn new_rating_uses_backend_field_names() -> TestResult {
        let rating = NewRating::new(OrderId::new(42), Score::new(4)?, Some("  quentinha "));

        assert_eq!(
            serde_json::to_value(&rating)?,
            serde_json::json!({"pedido_id": 42, "nota": 4, "comentario": "quentinha"})
        );

        Ok(())
    }

    #[test]
    fn stored_rating_comment_is_optional() -> TestResult {
        let rating: Rating = serde_json::from_str(r#"{"id": 1, "pedido_id": 42, "nota": 5}"#)?;

        assert_eq!(rating.score, 5);
        assert_eq!(rating.comment, None);

        Ok(())
    }
}
