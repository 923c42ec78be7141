use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::truncate_chars;

pub const ALLOWED_TYPES: [&str; 4] = ["assignment", "update", "reminder", "cancellation"];

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub event_name: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub event_name: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationInfo {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            message: notification.message,
            kind: notification.kind,
            event_name: notification.event_name,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub user_id: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub event_name: Option<String>,
}

#[derive(Debug)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub kind: String,
    pub event_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadAllResult {
    pub updated: usize,
}

pub fn validate_notification_payload(
    user_id: Uuid,
    payload: &NotificationPayload,
) -> Result<NewNotification, AppError> {
    let message = payload.message.as_deref().unwrap_or("");
    let kind = payload.kind.as_deref().unwrap_or("");
    if message.is_empty() || kind.is_empty() {
        return Err(AppError::bad_request(
            "User ID, message, and type are required",
        ));
    }
    if !ALLOWED_TYPES.contains(&kind) {
        return Err(AppError::bad_request("Invalid notification type"));
    }

    Ok(NewNotification {
        user_id,
        message: message.to_string(),
        kind: kind.to_string(),
        event_name: payload
            .event_name
            .as_deref()
            .map(|name| truncate_chars(name, 100)),
    })
}

impl Notification {
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, message, type, event_name, read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, message, type, event_name, read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, new: &NewNotification) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, message, type, event_name, read, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, NOW())
            RETURNING id, user_id, message, type, event_name, read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.message)
        .bind(&new.kind)
        .bind(&new.event_name)
        .fetch_one(pool)
        .await
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1
            RETURNING id, user_id, message, type, event_name, read, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn unread_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM notifications
            WHERE user_id = $1 AND read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
