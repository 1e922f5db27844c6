use chrono::{DateTime, Utc};

use crate::model::crossword::{Difficulty, Topic};
use crate::model::ids::{LearningProgressId, ProfileId};

/// Marks the learning tutorial of a topic/difficulty pair as read.
///
/// Levels of that pair stay locked until one of these exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningProgress {
    pub id: LearningProgressId,
    pub profile_id: ProfileId,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}
