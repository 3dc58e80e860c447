use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five stages of the method, in curriculum order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageId {
    K,
    L,
    A,
    R,
    E,
}

impl StageId {
    pub const ALL: [StageId; 5] = [StageId::K, StageId::L, StageId::A, StageId::R, StageId::E];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::K => "K",
            StageId::L => "L",
            StageId::A => "A",
            StageId::R => "R",
            StageId::E => "E",
        }
    }

    /// The stage after this one, or `None` for the final stage.
    pub fn next(&self) -> Option<StageId> {
        let idx = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub onboarding_completed: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

/// One spoke of the life wheel. `current_value` and `target_value` live
/// on a 1..=10 scale; out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeWheelArea {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub current_value: u8,
    pub target_value: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection_data: Option<ReflectionData>,
    pub updated_at: DateTime<Utc>,
}

impl LifeWheelArea {
    pub fn new(user_id: &str, name: &str, current_value: u8, target_value: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            current_value: clamp_rating(current_value),
            target_value: clamp_rating(target_value),
            reflection_data: None,
            updated_at: Utc::now(),
        }
    }
}

pub fn clamp_rating(value: u8) -> u8 {
    value.clamp(1, 10)
}

/// Side data embedded in the `reflection_data` column of a life wheel
/// area. `previous_answers` is append-only: records are never edited or
/// removed, so already-asked coaching questions stay on record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionData {
    #[serde(default)]
    pub previous_answers: Vec<ReflectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionRecord {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(user_id: &str, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title,
            content,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionBoardItem {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub position_x: f32,
    pub position_y: f32,
    pub scale: f32,
}

impl VisionBoardItem {
    pub fn new(user_id: &str, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title,
            image_url: None,
            position_x: 0.0,
            position_y: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Coach,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_and_next() {
        assert_eq!(StageId::K.next(), Some(StageId::L));
        assert_eq!(StageId::R.next(), Some(StageId::E));
        assert_eq!(StageId::E.next(), None);
    }

    #[test]
    fn area_values_are_clamped() {
        let area = LifeWheelArea::new("u1", "Health", 0, 14);
        assert_eq!(area.current_value, 1);
        assert_eq!(area.target_value, 10);
    }
}
