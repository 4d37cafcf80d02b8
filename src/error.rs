//! Error types for the store seam.

/// Failure talking to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejections from the simulator's control operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("simulation interval must be greater than zero")]
    ZeroInterval,

    #[error("backfill needs at least one day")]
    ZeroDays,

    #[error("backfill of {days} days exceeds the limit of {max}")]
    TooManyDays { days: u32, max: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
