use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("malformed payload for game {game}: {reason}")]
    MalformedPayload { game: String, reason: String },

    #[error("malformed event #{index} in game {game}: {reason}")]
    MalformedEvent {
        game: String,
        index: usize,
        reason: String,
    },
}

impl FeatureError {
    pub fn malformed_payload(game: impl Into<String>, reason: impl Into<String>) -> Self {
        FeatureError::MalformedPayload {
            game: game.into(),
            reason: reason.into(),
        }
    }

    pub fn is_game_fatal(&self) -> bool {
        matches!(self, FeatureError::MalformedPayload { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureError::MalformedPayload { .. } => "MalformedPayload",
            FeatureError::MalformedEvent { .. } => "MalformedEvent",
        }
    }
}
