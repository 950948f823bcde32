use crate::types::ResourceKind;

pub type Result<T> = std::result::Result<T, LeaseError>;

/// Failures surfaced by stores and lease backends.
///
/// `VersionConflict` and `AlreadyExists` are the expected outcomes of losing a
/// race against another candidate. Nothing in this crate retries them: the caller
/// re-fetches and decides again.
#[derive(Debug, thiserror::Error)]
pub enum LeaseError {
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} changed since version {expected} was read")]
    VersionConflict {
        kind: ResourceKind,
        namespace: String,
        name: String,
        expected: String,
    },

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("expected a {expected} record, got a {found} record")]
    RecordKindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("record {name} carries no version token")]
    MissingVersionToken { name: String },

    #[error("invalid lock configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "sqlite")]
    #[error("sqlite storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error("failed to encode record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("store transport error: {0}")]
    Transport(String),
}

impl LeaseError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, LeaseError::VersionConflict { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, LeaseError::AlreadyExists { .. })
    }

    /// Stable label for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            LeaseError::AlreadyExists { .. } => "already_exists",
            LeaseError::VersionConflict { .. } => "version_conflict",
            LeaseError::NotFound { .. } => "not_found",
            LeaseError::RecordKindMismatch { .. } => "record_kind_mismatch",
            LeaseError::MissingVersionToken { .. } => "missing_version_token",
            LeaseError::InvalidConfig(_) => "invalid_config",
            #[cfg(feature = "sqlite")]
            LeaseError::Storage(_) => "storage",
            #[cfg(feature = "sqlite")]
            LeaseError::Codec(_) => "codec",
            LeaseError::Transport(_) => "transport",
        }
    }
}

/// A timestamp field that could not be parsed.
///
/// Decoders log this and treat the field as absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed timestamp {value:?}")]
pub struct MalformedTimestamp {
    pub value: String,
}

impl MalformedTimestamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}
