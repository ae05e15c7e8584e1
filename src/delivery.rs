//! Delivery Choice

use jiff::Timestamp;
use thiserror::Error;

/// How the order should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryChoice {
    /// Regular delivery.
    #[default]
    Standard,

    /// Faster delivery for an extra fee (centavos).
    Express {
        /// Surcharge added to the order total.
        extra_fee: i64,
    },

    /// Delivery at a chosen time. The time must be set before submission.
    Scheduled {
        /// Requested delivery time.
        at: Option<Timestamp>,
    },
}

/// Reasons a delivery choice cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryIssue {
    /// Scheduled delivery without a time.
    #[error("scheduled delivery requires a time")]
    MissingSchedule,

    /// Scheduled delivery at a time that is not in the future.
    #[error("scheduled delivery time must be in the future")]
    ScheduleInPast,
}

impl DeliveryChoice {
    /// Wire name of the delivery type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Express { .. } => "EXPRESS",
            Self::Scheduled { .. } => "SCHEDULED",
        }
    }

    /// Extra charge this choice adds to the order total.
    pub fn surcharge(&self) -> i64 {
        match self {
            Self::Express { extra_fee } => *extra_fee,
            Self::Standard | Self::Scheduled { .. } => 0,
        }
    }

    /// Requested delivery time, when scheduled.
    pub fn scheduled_for(&self) -> Option<Timestamp> {
        match self {
            Self::Scheduled { at } => *at,
            Self::Standard | Self::Express { .. } => None,
        }
    }

    /// Check the choice can be submitted at `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryIssue`] for a scheduled delivery with no time or a
    /// time that is not after `now`.
    pub fn validate(&self, now: Timestamp) -> Result<(), DeliveryIssue> {
        match self {
            Self::Scheduled { at: None } => Err(DeliveryIssue::MissingSchedule),
            Self::Scheduled { at: Some(at) } if *at <= now => Err(DeliveryIssue::ScheduleInPast),
            Self::Standard | Self::Express { .. } | Self::Scheduled { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn express_adds_surcharge() {
        assert_eq!(DeliveryChoice::Express { extra_fee: 5_00 }.surcharge(), 5_00);
        assert_eq!(DeliveryChoice::Standard.surcharge(), 0);
    }

    #[test]
    fn scheduled_without_time_is_invalid() {
        let choice = DeliveryChoice::Scheduled { at: None };

        assert_eq!(
            choice.validate(Timestamp::now()),
            Err(DeliveryIssue::MissingSchedule)
        );
    }

    #[test]
    fn scheduled_in_past_is_invalid() -> TestResult {
        let now = Timestamp::now();
        let choice = DeliveryChoice::Scheduled {
            at: Some(now.checked_sub(SignedDuration::from_mins(5))?),
        };

        assert_eq!(choice.validate(now), Err(DeliveryIssue::ScheduleInPast));

        Ok(())
    }

    #[test]
    fn scheduled_in_future_is_valid() -> TestResult {
        let now = Timestamp::now();
        let choice = DeliveryChoice::Scheduled {
            at: Some(now.checked_add(SignedDuration::from_hours(1))?),
        };

        assert_eq!(choice.validate(now), Ok(()));
        assert_eq!(choice.kind(), "SCHEDULED");

        Ok(())
    }
}
