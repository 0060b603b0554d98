use thiserror::Error;

/// Every failure of a core operation is an expected business-rule outcome.
/// Callers match on the variant to pick a user-facing message or status code;
/// the display text is never meant to be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TripError {
    #[error("not authorized to perform this action")]
    Unauthorized,
    #[error("trip not found")]
    TripNotFound,
    #[error("place not found")]
    PlaceNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("the trip owner already holds full rights and cannot be added to another list")]
    InvalidTarget,
    #[error("user is already in the requested list")]
    AlreadyPresent,
    #[error("{0}")]
    Validation(String),
}
