use crate::foundation::core::Rect;

/// Convenience result type used across tilefx.
pub type TileFxResult<T> = Result<T, TileFxError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Cancellation and zero-area requests are not errors: they surface as
/// [`RenderOutcome::Aborted`](crate::RenderOutcome::Aborted) and as empty, default-valued
/// results respectively.
#[derive(thiserror::Error, Debug)]
pub enum TileFxError {
    /// The requested pixel format combination has no specialized code path.
    ///
    /// Raised before any tile runs; the destination is left untouched.
    #[error("unsupported pixel format: {0}")]
    FormatUnsupported(String),

    /// A per-tile operation faulted. Remaining tiles were not dispatched.
    #[error("tile {tile} failed: {reason}")]
    TileProcessingFailed {
        /// Rect of the failing tile (or row, for row-polled tiles).
        tile: Rect,
        /// Failure description.
        reason: String,
    },

    /// Invalid caller-provided views, rects, tiles or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing configuration or statistics.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from collaborators or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TileFxError {
    /// Build a [`TileFxError::FormatUnsupported`] value.
    pub fn format_unsupported(msg: impl Into<String>) -> Self {
        Self::FormatUnsupported(msg.into())
    }

    /// Build a [`TileFxError::TileProcessingFailed`] value.
    pub fn tile_failed(tile: Rect, reason: impl Into<String>) -> Self {
        Self::TileProcessingFailed {
            tile,
            reason: reason.into(),
        }
    }

    /// Build a [`TileFxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TileFxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
