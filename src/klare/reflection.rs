//! Reflection history for the life wheel coaching flow.
//!
//! Each area row carries a `reflection_data` JSON column holding an
//! append-only `previous_answers` list. Appending instead of replacing
//! lets the prompt generation step exclude questions it already asked
//! for that area. Only exact question strings are tracked; there is no
//! near-duplicate detection.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::{KlareError, Result};
use crate::model::{ReflectionData, ReflectionRecord};
use crate::remote::{Filter, RemoteStore};

const TABLE: &str = "life_wheel_areas";

fn area_filters(user_id: &str, area_id: Uuid) -> [Filter; 2] {
    [
        Filter::eq("user_id", user_id),
        Filter::eq("id", &area_id.to_string()),
    ]
}

fn load_reflection_data<R: RemoteStore>(
    remote: &R,
    user_id: &str,
    area_id: Uuid,
) -> Result<Option<ReflectionData>> {
    let rows = remote.select(TABLE, &area_filters(user_id, area_id))?;
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };
    let data = match row.get("reflection_data") {
        None | Some(serde_json::Value::Null) => ReflectionData::default(),
        Some(value) => serde_json::from_value(value.clone())?,
    };
    Ok(Some(data))
}

/// Append one question/answer record to the area's reflection history
/// and write the whole column back. The row must exist and belong to
/// `user_id`; there is no cross-user access.
pub fn save_reflection_answer<R: RemoteStore>(
    remote: &R,
    user_id: &str,
    area_id: Uuid,
    question: &str,
    answer: &str,
    session_id: &str,
) -> Result<()> {
    let mut data = load_reflection_data(remote, user_id, area_id)?
        .ok_or_else(|| KlareError::RowNotFound(format!("life wheel area {area_id}")))?;

    data.previous_answers.push(ReflectionRecord {
        question: question.to_string(),
        answer: answer.to_string(),
        timestamp: Utc::now(),
        session_id: session_id.to_string(),
    });

    remote.update(
        TABLE,
        &area_filters(user_id, area_id),
        json!({ "reflection_data": serde_json::to_value(&data)? }),
    )?;
    Ok(())
}

/// Every question already asked for this area, in the order asked. An
/// unknown area yields an empty history.
pub fn previous_questions<R: RemoteStore>(
    remote: &R,
    user_id: &str,
    area_id: Uuid,
) -> Result<Vec<String>> {
    let data = load_reflection_data(remote, user_id, area_id)?.unwrap_or_default();
    Ok(data
        .previous_answers
        .into_iter()
        .map(|record| record.question)
        .collect())
}
