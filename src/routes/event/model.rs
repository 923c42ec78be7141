use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::{coerce_string_list, decode_string_list, encode_string_list, normalize_time};

pub const ALLOWED_SKILLS: [&str; 7] = [
    "Communication",
    "Teamwork",
    "Organized",
    "Adaptability",
    "Driving",
    "English",
    "Spanish",
];

pub const ALLOWED_URGENCIES: [&str; 4] = ["low", "medium", "high", "critical"];

/// Row shape; `required_skills` stays JSON-encoded until it crosses the API
/// boundary as an `EventInfo`.
#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub required_skills: String,
    pub urgency: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub id: Uuid,
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub required_skills: Vec<String>,
    pub urgency: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventInfo {
    fn from(event: Event) -> Self {
        Self {
            required_skills: decode_string_list(&event.required_skills),
            id: event.id,
            event_name: event.event_name,
            event_description: event.event_description,
            event_location: event.event_location,
            urgency: event.urgency,
            event_date: event.event_date,
            start_time: event.start_time,
            end_time: event.end_time,
            created_at: event.created_at,
        }
    }
}

/// Everything optional so a half-filled form still gets the full list of
/// problems back in one response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub event_name: Option<String>,
    pub event_description: Option<String>,
    pub event_location: Option<String>,
    pub required_skills: Option<Value>,
    pub urgency: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug)]
pub struct ValidatedEvent {
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub required_skills: Vec<String>,
    pub urgency: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

pub fn validate_event_payload(payload: &EventPayload) -> Result<ValidatedEvent, AppError> {
    let mut errors = Vec::new();

    let event_name = payload.event_name.as_deref().unwrap_or("");
    if event_name.trim().is_empty() {
        errors.push("Event name is required.".to_string());
    } else if event_name.chars().count() > 100 {
        errors.push("Event name must be under 100 characters.".to_string());
    }

    let event_description = payload.event_description.as_deref().unwrap_or("");
    if event_description.trim().is_empty() {
        errors.push("Event description is required.".to_string());
    }

    let event_location = payload.event_location.as_deref().unwrap_or("");
    if event_location.trim().is_empty() {
        errors.push("Event location is required.".to_string());
    }

    let required_skills = coerce_string_list(payload.required_skills.as_ref());
    if required_skills.is_empty() {
        errors.push("At least one skill must be selected.".to_string());
    } else {
        for skill in &required_skills {
            if !ALLOWED_SKILLS.contains(&skill.as_str()) {
                errors.push(format!("Invalid skill: {}", skill));
            }
        }
    }

    let urgency = payload.urgency.as_deref().unwrap_or("");
    if !ALLOWED_URGENCIES.contains(&urgency) {
        errors.push("Invalid urgency level.".to_string());
    }

    let mut event_date = None;
    match payload.event_date.as_deref().map(str::trim) {
        None | Some("") => errors.push("Event date is required.".to_string()),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => {
                if date < Utc::now().date_naive() {
                    errors.push("Event date cannot be in the past.".to_string());
                }
                event_date = Some(date);
            }
            Err(_) => errors.push("Event date must be a valid date.".to_string()),
        },
    }

    let mut start_time = None;
    let mut end_time = None;
    let raw_start = payload.start_time.as_deref().unwrap_or("").trim();
    let raw_end = payload.end_time.as_deref().unwrap_or("").trim();
    if raw_start.is_empty() || raw_end.is_empty() {
        errors.push("Start and end times are required.".to_string());
    } else {
        match (normalize_time(raw_start), normalize_time(raw_end)) {
            (Some(start), Some(end)) => {
                // canonical HH:MM:SS is zero-padded, so string order is time order
                if start >= end {
                    errors.push("End time must be after start time.".to_string());
                }
                start_time = Some(start);
                end_time = Some(end);
            }
            _ => errors.push("Invalid time format.".to_string()),
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let (Some(event_date), Some(start_time), Some(end_time)) = (event_date, start_time, end_time)
    else {
        return Err(AppError::internal("event validation produced no value"));
    };

    Ok(ValidatedEvent {
        event_name: event_name.to_string(),
        event_description: event_description.to_string(),
        event_location: event_location.to_string(),
        required_skills,
        urgency: urgency.to_string(),
        event_date,
        start_time,
        end_time,
    })
}

impl Event {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, event_name, event_description, event_location, required_skills,
                   urgency, event_date, start_time, end_time, created_at
            FROM events
            ORDER BY event_date ASC, start_time ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, event_name, event_description, event_location, required_skills,
                   urgency, event_date, start_time, end_time, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, event: &ValidatedEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                id, event_name, event_description, event_location, required_skills,
                urgency, event_date, start_time, end_time, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING id, event_name, event_description, event_location, required_skills,
                      urgency, event_date, start_time, end_time, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&event.event_name)
        .bind(&event.event_description)
        .bind(&event.event_location)
        .bind(encode_string_list(&event.required_skills))
        .bind(&event.urgency)
        .bind(event.event_date)
        .bind(&event.start_time)
        .bind(&event.end_time)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        event: &ValidatedEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET event_name = $1, event_description = $2, event_location = $3,
                required_skills = $4, urgency = $5, event_date = $6,
                start_time = $7, end_time = $8
            WHERE id = $9
            RETURNING id, event_name, event_description, event_location, required_skills,
                      urgency, event_date, start_time, end_time, created_at
            "#,
        )
        .bind(&event.event_name)
        .bind(&event.event_description)
        .bind(&event.event_location)
        .bind(encode_string_list(&event.required_skills))
        .bind(&event.urgency)
        .bind(event.event_date)
        .bind(&event.start_time)
        .bind(&event.end_time)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
