use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::{
    coerce_string_list, decode_string_list, encode_string_list, normalize_time, normalize_urgency,
    parse_uuid, truncate_chars,
};

pub const ALLOWED_STATUSES: [&str; 4] = ["upcoming", "completed", "cancelled", "in-progress"];

/// One participation record. Event fields are the snapshot taken when
/// the record was written, not a live view of the event.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub required_skills: String,
    pub urgency: String,
    pub event_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub required_skills: Vec<String>,
    pub urgency: String,
    pub event_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryInfo {
    fn from(record: HistoryRecord) -> Self {
        Self {
            required_skills: decode_string_list(&record.required_skills),
            id: record.id,
            user_id: record.user_id,
            event_id: record.event_id,
            event_name: record.event_name,
            event_description: record.event_description,
            event_location: record.event_location,
            urgency: record.urgency,
            event_date: record.event_date,
            start_time: record.start_time,
            end_time: record.end_time,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: Option<String>,
}

/// Manual participation log entry; only the identifying fields are
/// mandatory, the rest defaults like an assignment snapshot would.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPayload {
    pub user_id: Option<String>,
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub event_description: Option<String>,
    pub event_location: Option<String>,
    pub required_skills: Option<Value>,
    pub urgency: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug)]
pub struct ValidatedHistory {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub required_skills: Vec<String>,
    pub urgency: String,
    pub event_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: String,
}

pub fn validate_history_payload(
    user_id: Uuid,
    payload: &HistoryPayload,
) -> Result<ValidatedHistory, AppError> {
    let event_name = payload.event_name.as_deref().unwrap_or("");
    let event_id = match parse_uuid(payload.event_id.as_deref()) {
        Some(id) if !event_name.is_empty() => id,
        _ => {
            return Err(AppError::bad_request(
                "User ID, Event ID, and Event Name are required",
            ));
        }
    };

    let event_date = match payload.event_date.as_deref().map(str::trim) {
        None | Some("") => return Err(AppError::bad_request("Event date is required.")),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::bad_request("Event date must be a valid date."))?,
    };

    let status = payload.status.as_deref().unwrap_or("");
    let status = if status.is_empty() { "upcoming" } else { status };
    if !ALLOWED_STATUSES.contains(&status) {
        return Err(AppError::bad_request("Invalid status value"));
    }

    Ok(ValidatedHistory {
        user_id,
        event_id,
        event_name: truncate_chars(event_name.trim(), 100),
        event_description: payload
            .event_description
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string(),
        event_location: truncate_chars(
            payload.event_location.as_deref().unwrap_or("").trim(),
            255,
        ),
        required_skills: coerce_string_list(payload.required_skills.as_ref()),
        urgency: normalize_urgency(payload.urgency.as_deref().unwrap_or("")),
        event_date,
        start_time: payload.start_time.as_deref().and_then(normalize_time),
        end_time: payload.end_time.as_deref().and_then(normalize_time),
        status: status.to_string(),
    })
}

impl HistoryRecord {
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT id, user_id, event_id, event_name, event_description, event_location,
                   required_skills, urgency, event_date, start_time, end_time, status, created_at
            FROM volunteer_history
            WHERE user_id = $1
            ORDER BY event_date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT id, user_id, event_id, event_name, event_description, event_location,
                   required_skills, urgency, event_date, start_time, end_time, status, created_at
            FROM volunteer_history
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, record: &ValidatedHistory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, HistoryRecord>(
            r#"
            INSERT INTO volunteer_history (
                id, user_id, event_id, event_name, event_description, event_location,
                required_skills, urgency, event_date, start_time, end_time, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            RETURNING id, user_id, event_id, event_name, event_description, event_location,
                      required_skills, urgency, event_date, start_time, end_time, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(record.event_id)
        .bind(&record.event_name)
        .bind(&record.event_description)
        .bind(&record.event_location)
        .bind(encode_string_list(&record.required_skills))
        .bind(&record.urgency)
        .bind(record.event_date)
        .bind(&record.start_time)
        .bind(&record.end_time)
        .bind(&record.status)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRecord>(
            r#"
            UPDATE volunteer_history
            SET status = $1
            WHERE id = $2
            RETURNING id, user_id, event_id, event_name, event_description, event_location,
                      required_skills, urgency, event_date, start_time, end_time, status, created_at
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> HistoryPayload {
        HistoryPayload {
            user_id: Some(Uuid::new_v4().to_string()),
            event_id: Some(Uuid::new_v4().to_string()),
            event_name: Some("Food Drive".to_string()),
            event_description: Some("Sorting donations".to_string()),
            event_location: Some("Warehouse 4".to_string()),
            required_skills: Some(serde_json::json!(["Organized"])),
            urgency: Some("high".to_string()),
            event_date: Some("2025-06-15".to_string()),
            start_time: Some("9:00".to_string()),
            end_time: Some("12:00".to_string()),
            status: Some("completed".to_string()),
        }
    }

    fn message_of(result: Result<ValidatedHistory, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(message)) => message,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_complete_manual_entry() {
        let user_id = Uuid::new_v4();
        let validated = validate_history_payload(user_id, &valid_payload()).unwrap();
        assert_eq!(validated.user_id, user_id);
        assert_eq!(validated.event_name, "Food Drive");
        assert_eq!(validated.status, "completed");
        assert_eq!(validated.start_time, Some("09:00:00".to_string()));
    }

    #[test]
    fn missing_identifiers_collapse_to_one_message() {
        let payload = HistoryPayload {
            event_id: None,
            ..valid_payload()
        };
        assert_eq!(
            message_of(validate_history_payload(Uuid::new_v4(), &payload)),
            "User ID, Event ID, and Event Name are required"
        );

        let payload = HistoryPayload {
            event_name: Some(String::new()),
            ..valid_payload()
        };
        assert_eq!(
            message_of(validate_history_payload(Uuid::new_v4(), &payload)),
            "User ID, Event ID, and Event Name are required"
        );
    }

    #[test]
    fn event_date_is_mandatory_and_must_parse() {
        let payload = HistoryPayload {
            event_date: None,
            ..valid_payload()
        };
        assert_eq!(
            message_of(validate_history_payload(Uuid::new_v4(), &payload)),
            "Event date is required."
        );

        let payload = HistoryPayload {
            event_date: Some("June 15th".to_string()),
            ..valid_payload()
        };
        assert_eq!(
            message_of(validate_history_payload(Uuid::new_v4(), &payload)),
            "Event date must be a valid date."
        );
    }

    #[test]
    fn past_dates_are_fine_for_manual_logs() {
        let payload = HistoryPayload {
            event_date: Some("2001-01-01".to_string()),
            ..valid_payload()
        };
        assert!(validate_history_payload(Uuid::new_v4(), &payload).is_ok());
    }

    #[test]
    fn status_defaults_to_upcoming_and_rejects_unknown_values() {
        let payload = HistoryPayload {
            status: None,
            ..valid_payload()
        };
        let validated = validate_history_payload(Uuid::new_v4(), &payload).unwrap();
        assert_eq!(validated.status, "upcoming");

        let payload = HistoryPayload {
            status: Some("done".to_string()),
            ..valid_payload()
        };
        assert_eq!(
            message_of(validate_history_payload(Uuid::new_v4(), &payload)),
            "Invalid status value"
        );
    }

    #[test]
    fn fields_are_capped_like_assignment_snapshots() {
        let payload = HistoryPayload {
            event_name: Some("n".repeat(150)),
            event_location: Some("l".repeat(300)),
            urgency: Some("CRITICAL".to_string()),
            ..valid_payload()
        };
        let validated = validate_history_payload(Uuid::new_v4(), &payload).unwrap();
        assert_eq!(validated.event_name.chars().count(), 100);
        assert_eq!(validated.event_location.chars().count(), 255);
        assert_eq!(validated.urgency, "critical");
    }

    #[test]
    fn optional_fields_default_rather_than_fail() {
        let payload = HistoryPayload {
            event_description: None,
            event_location: None,
            required_skills: None,
            urgency: None,
            start_time: Some("whenever".to_string()),
            end_time: None,
            ..valid_payload()
        };
        let validated = validate_history_payload(Uuid::new_v4(), &payload).unwrap();
        assert_eq!(validated.event_description, "");
        assert_eq!(validated.event_location, "");
        assert!(validated.required_skills.is_empty());
        assert_eq!(validated.urgency, "medium");
        assert_eq!(validated.start_time, None);
        assert_eq!(validated.end_time, None);
    }

    #[test]
    fn bare_string_skills_are_coerced() {
        let payload = HistoryPayload {
            required_skills: Some(serde_json::json!("Driving")),
            ..valid_payload()
        };
        let validated = validate_history_payload(Uuid::new_v4(), &payload).unwrap();
        assert_eq!(validated.required_skills, vec!["Driving".to_string()]);
    }
}
