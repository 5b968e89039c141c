/// Convenience result type used across tracksim.
pub type TrackSimResult<T> = Result<T, TrackSimError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TrackSimError {
    /// Invalid caller-provided input (polygons, sizes, options).
    #[error("validation error: {0}")]
    Validation(String),

    /// Violated geometric precondition (singular matrix, degenerate path, step out of range).
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Malformed or unusable trajectory model.
    #[error("trajectory model error: {0}")]
    Model(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackSimError {
    /// Build a [`TrackSimError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TrackSimError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`TrackSimError::Model`] value.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Build a [`TrackSimError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
