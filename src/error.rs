//! Error type shared by the chase engine and its host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChaseError {
    #[error("unknown chase strategy '{0}'")]
    UnknownStrategy(String),

    #[error("position history is empty at follower dequeue")]
    EmptyHistory,

    #[error("ghost '{ghost}' has no resolvable {link} agent")]
    MissingLink { ghost: String, link: &'static str },

    #[error("related strategy needs a related agent")]
    MissingRelatedAgent,

    #[error("ghost '{ghost}' references unknown ghost '{related}'")]
    UnknownRelated { ghost: String, related: String },

    #[error("ghost '{ghost}' retreats toward unknown ghost '{agent}'")]
    UnknownScatterAgent { ghost: String, agent: String },

    #[error("config setting '{field}' is out of range: {value}")]
    InvalidSetting { field: String, value: f64 },
}
