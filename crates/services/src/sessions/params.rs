use crossword_core::model::{CrosswordId, Difficulty, Topic};

use crate::error::SessionError;

/// Validated route parameters of the play page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub crossword_id: CrosswordId,
}

impl SessionParams {
    #[must_use]
    pub fn new(topic: Topic, difficulty: Difficulty, crossword_id: CrosswordId) -> Self {
        Self {
            topic,
            difficulty,
            crossword_id,
        }
    }

    /// Parse raw route segments.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RouteNotFound` if any segment is missing or
    /// does not parse.
    pub fn from_route(
        topic: Option<&str>,
        difficulty: Option<&str>,
        crossword_id: Option<&str>,
    ) -> Result<Self, SessionError> {
        let (Some(topic), Some(difficulty), Some(id)) = (topic, difficulty, crossword_id) else {
            return Err(SessionError::RouteNotFound);
        };
        let topic = topic.parse().map_err(|_| SessionError::RouteNotFound)?;
        let difficulty = difficulty.parse().map_err(|_| SessionError::RouteNotFound)?;
        let crossword_id = id.parse().map_err(|_| SessionError::RouteNotFound)?;
        Ok(Self::new(topic, difficulty, crossword_id))
    }
}
