use thiserror::Error;

/// Errors raised by the scoring engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// No catalog track matches the seed identifier.
    #[error("Seed track not found: {0}")]
    NotFound(String),

    /// Input rejected at the engine boundary.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scoring a single candidate failed. Never fatal to a ranking pass.
    #[error("Scoring failed for track {track_id}: {reason}")]
    ComputationFailure { track_id: String, reason: String },
}
