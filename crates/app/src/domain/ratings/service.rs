//! Ratings service.

use async_trait::async_trait;
use mockall::automock;
use sacola::{
    ids::OrderId,
    rating::{NewRating, Rating},
};
use serde::de::IgnoredAny;
use tracing::{info, warn};

use crate::http::{ApiClient, ApiError};

#[derive(Debug, Clone)]
pub struct HttpRatingsApi {
    client: ApiClient,
}

impl HttpRatingsApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RatingsApi for HttpRatingsApi {
    async fn fetch_rating(&self, order: OrderId) -> Result<Rating, ApiError> {
        self.client.get(&format!("avaliacoes/pedido/{order}")).await
    }

    async fn submit_rating(&self, rating: &NewRating) -> Result<(), ApiError> {
        let _: IgnoredAny = self.client.post("avaliacoes/", rating).await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait RatingsApi: Send + Sync {
    /// Retrieve the rating stored for an order.
    ///
    /// An order that was never rated yields [`ApiError::NotFound`].
    async fn fetch_rating(&self, order: OrderId) -> Result<Rating, ApiError>;

    /// Store a rating.
    async fn submit_rating(&self, rating: &NewRating) -> Result<(), ApiError>;
}

/// Whether an order has been rated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingStatus {
    Unrated,
    Rated(Rating),
}

/// What [`rate_order`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    /// The rating was stored.
    Submitted,

    /// The order already had a rating; nothing was stored.
    AlreadyRated,
}

/// Look up whether `order` has been rated.
///
/// # Errors
///
/// Returns the [`ApiError`] of a failed lookup other than `NotFound`.
pub async fn rating_status(api: &dyn RatingsApi, order: OrderId) -> Result<RatingStatus, ApiError> {
    match api.fetch_rating(order).await {
        Ok(rating) => Ok(RatingStatus::Rated(rating)),
        Err(error) if error.is_not_found() => Ok(RatingStatus::Unrated),
        Err(error) => Err(error),
    }
}

/// Rate an order once.
///
/// An existing rating is never overwritten. When the existing-rating check
/// itself fails the rating is still sent, and a backend answer of 409 counts
/// as already rated.
///
/// # Errors
///
/// Returns the [`ApiError`] that failed the submission.
pub async fn rate_order(api: &dyn RatingsApi, rating: &NewRating) -> Result<RatingOutcome, ApiError> {
    let order = rating.order_id;

    match rating_status(api, order).await {
        Ok(RatingStatus::Rated(_)) => {
            info!(%order, "order already rated");

            return Ok(RatingOutcome::AlreadyRated);
        }
        Ok(RatingStatus::Unrated) => {}
        Err(error) => warn!(%order, %error, "could not check existing rating"),
    }

    match api.submit_rating(rating).await {
        Ok(()) => {
            info!(%order, score = rating.score.get(), "order rated");

            Ok(RatingOutcome::Submitted)
        }
        Err(error) if is_already_rated(&error) => {
            info!(%order, "backend reports order already rated");

            Ok(RatingOutcome::AlreadyRated)
        }
        Err(error) => Err(error),
    }
}

fn is_already_rated(error: &ApiError) -> bool {
    match error {
        ApiError::UnexpectedStatus { status: 409, .. } => true,
        ApiError::UnexpectedStatus { body, .. } => body.to_lowercase().contains("já avaliado"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use sacola::rating::Score;
    use testresult::TestResult;

    use super::*;
    use crate::test::fixtures::server_error;

    const ORDER: OrderId = OrderId::new(42);

    fn rating() -> TestResult<NewRating> {
        Ok(NewRating::new(ORDER, Score::new(5)?, Some("chegou quentinha")))
    }

    fn conflict(body: &str) -> ApiError {
        ApiError::UnexpectedStatus {
            status: 409,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn unrated_order_is_submitted() -> TestResult {
        let mut api = MockRatingsApi::new();
        api.expect_fetch_rating()
            .with(eq(ORDER))
            .times(1)
            .returning(|_| Err(ApiError::NotFound));
        api.expect_submit_rating()
            .withf(|rating| rating.score.get() == 5 && rating.comment == "chegou quentinha")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = rate_order(&api, &rating()?).await?;

        assert_eq!(outcome, RatingOutcome::Submitted);

        Ok(())
    }

    #[tokio::test]
    async fn existing_rating_is_not_overwritten() -> TestResult {
        let mut api = MockRatingsApi::new();
        api.expect_fetch_rating().returning(|_| {
            Ok(Rating {
                score: 3,
                comment: None,
            })
        });
        api.expect_submit_rating().never();

        let outcome = rate_order(&api, &rating()?).await?;

        assert_eq!(outcome, RatingOutcome::AlreadyRated);

        Ok(())
    }

    #[tokio::test]
    async fn conflict_on_submit_counts_as_already_rated() -> TestResult {
        let mut api = MockRatingsApi::new();
        api.expect_fetch_rating().returning(|_| Err(ApiError::NotFound));
        api.expect_submit_rating()
            .times(1)
            .returning(|_| Err(conflict(r#"{"detail": "Pedido já avaliado"}"#)));

        let outcome = rate_order(&api, &rating()?).await?;

        assert_eq!(outcome, RatingOutcome::AlreadyRated);

        Ok(())
    }

    #[tokio::test]
    async fn failed_check_still_submits() -> TestResult {
        let mut api = MockRatingsApi::new();
        api.expect_fetch_rating().returning(|_| Err(server_error()));
        api.expect_submit_rating().times(1).returning(|_| Ok(()));

        let outcome = rate_order(&api, &rating()?).await?;

        assert_eq!(outcome, RatingOutcome::Submitted);

        Ok(())
    }

    #[tokio::test]
    async fn failed_submission_is_returned() -> TestResult {
        let mut api = MockRatingsApi::new();
        api.expect_fetch_rating().returning(|_| Err(ApiError::NotFound));
        api.expect_submit_rating().returning(|_| Err(server_error()));

        let result = rate_order(&api, &rating()?).await;

        assert!(
            matches!(result, Err(ApiError::UnexpectedStatus { status: 500, .. })),
            "expected UnexpectedStatus, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn status_maps_not_found_to_unrated() -> TestResult {
        let mut api = MockRatingsApi::new();
        api.expect_fetch_rating().returning(|_| Err(ApiError::NotFound));

        assert_eq!(rating_status(&api, ORDER).await?, RatingStatus::Unrated);

        Ok(())
    }
}
