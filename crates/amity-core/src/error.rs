use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Domain errors. Everything except `Storage` is an expected, user-facing
/// outcome; `Storage` wraps unanticipated store faults and is the only
/// variant the HTTP layer maps to a 5xx.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    /// Actor is not the authorized party for an object-level action.
    #[error("You do not have permission to perform this action.")]
    Forbidden,

    /// The receiver has blocked the sender (or either direction under
    /// symmetric visibility).
    #[error("You can't contact this user.")]
    Blocked,

    #[error("Already requested")]
    DuplicateRequest,

    #[error("Already friends")]
    AlreadyFriends,

    #[error("Cool down time is not over")]
    CooldownActive,

    #[error("Already blocked")]
    AlreadyBlocked,

    #[error("User not blocked")]
    NotBlocked,

    /// Holds the attempted outcome label ("accepted" / "rejected").
    #[error("Request can't be {0}")]
    InvalidTransition(&'static str),

    #[error("Can't send more than {limit} requests per minute.")]
    RateLimited { limit: u32 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
