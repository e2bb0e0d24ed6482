use crate::scene::asset::AssetId;

/// Convenience result type used across easyanim.
pub type EasyAnimResult<T> = Result<T, EasyAnimError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum EasyAnimError {
    /// Invalid user-provided or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while storing or sampling keyframes.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while rendering or encoding a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// No acceptable video encoder is available on this platform.
    #[error("unsupported encoder: {0}")]
    UnsupportedEncoder(String),

    /// Export was requested but no asset has a single keyframe.
    #[error("nothing to export: add keyframes first")]
    EmptyAnimation,

    /// One asset's payload could not be loaded.
    #[error("failed to load asset '{asset}': {reason}")]
    AssetLoad {
        /// Asset whose payload failed.
        asset: AssetId,
        /// Human-readable cause.
        reason: String,
    },

    /// The timeline is exclusively owned by another writer (an export in progress).
    #[error("timeline busy: {0}")]
    Busy(String),

    /// Asset id not present in the scene.
    #[error("unknown asset '{0}'")]
    UnknownAsset(AssetId),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EasyAnimError {
    /// Build a [`EasyAnimError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EasyAnimError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`EasyAnimError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`EasyAnimError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`EasyAnimError::UnsupportedEncoder`] value.
    pub fn unsupported_encoder(msg: impl Into<String>) -> Self {
        Self::UnsupportedEncoder(msg.into())
    }

    /// Build a [`EasyAnimError::Busy`] value.
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Build a [`EasyAnimError::AssetLoad`] value.
    pub fn asset_load(asset: AssetId, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            asset,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
