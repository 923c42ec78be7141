use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::{
    decode_string_list, encode_string_list, format_long_date, format_time_12h, normalize_time,
    normalize_urgency, truncate_chars,
};

/// Profile row as the matcher reads it; skills and availability stay
/// JSON-encoded until scoring needs them.
#[derive(Debug, Clone, FromRow)]
pub struct VolunteerRow {
    pub user_id: Uuid,
    pub full_name: String,
    pub city: String,
    pub state: String,
    pub skills: String,
    pub availability: String,
    pub preferences: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub city: String,
    pub state: String,
    pub skills: Vec<String>,
    pub availability: Vec<String>,
    pub preferences: Option<String>,
}

impl From<VolunteerRow> for VolunteerProfile {
    fn from(row: VolunteerRow) -> Self {
        Self {
            skills: decode_string_list(&row.skills),
            availability: decode_string_list(&row.availability),
            user_id: row.user_id,
            full_name: row.full_name,
            city: row.city,
            state: row.state,
            preferences: row.preferences,
        }
    }
}

/// IDs arrive as strings so a malformed body still gets the documented
/// 400 instead of a deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub volunteer_id: Option<String>,
    pub event_id: Option<String>,
}

/// A volunteer scored against one event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerMatch {
    pub user_id: Uuid,
    pub full_name: String,
    pub city: String,
    pub state: String,
    pub skills: Vec<String>,
    pub availability: Vec<String>,
    pub preferences: Option<String>,
    pub match_score: f64,
    pub is_available: bool,
    pub assigned: bool,
}

#[derive(Debug, FromRow)]
struct EventRow {
    event_name: String,
    event_description: String,
    event_location: String,
    required_skills: String,
    urgency: String,
    event_date: NaiveDate,
    start_time: String,
    end_time: String,
}

/// Event fields frozen into a history record at assignment time, so the
/// record survives later edits or deletion of the event itself.
#[derive(Debug)]
struct EventSnapshot {
    event_name: String,
    event_description: String,
    event_location: String,
    required_skills: Vec<String>,
    urgency: String,
    event_date: NaiveDate,
    start_time: Option<String>,
    end_time: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct AssignmentRow {
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
pub struct AssignmentInfo {
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

impl From<AssignmentRow> for AssignmentInfo {
    fn from(row: AssignmentRow) -> Self {
        Self {
            required_skills: decode_string_list(&row.required_skills),
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            event_name: row.event_name,
            event_description: row.event_description,
            event_location: row.event_location,
            urgency: row.urgency,
            event_date: row.event_date,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Percentage of the event's required skills the volunteer covers.
/// Both sides are treated as sets, so repeated entries count once.
/// An event that requires nothing scores everyone at zero.
pub fn match_score(volunteer_skills: &[String], event_skills: &[String]) -> f64 {
    let required: HashSet<&str> = event_skills.iter().map(String::as_str).collect();
    if required.is_empty() {
        return 0.0;
    }
    let offered: HashSet<&str> = volunteer_skills.iter().map(String::as_str).collect();
    let matching = required.intersection(&offered).count();
    (matching as f64 / required.len() as f64) * 100.0
}

/// True when any availability entry names the event's calendar date.
/// Entries that do not parse as dates are skipped.
pub fn is_available_on(availability: &[String], event_date: NaiveDate) -> bool {
    availability.iter().any(|raw| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(|date| date == event_date)
            .unwrap_or(false)
    })
}

/// Score every volunteer against the event, keep the ones with either a
/// skill overlap or a matching availability date, best score first.
pub fn build_suggestions(
    volunteers: Vec<VolunteerRow>,
    event_skills: &[String],
    event_date: NaiveDate,
    assigned: &[Uuid],
) -> Vec<VolunteerMatch> {
    let mut matches: Vec<VolunteerMatch> = volunteers
        .into_iter()
        .map(|row| {
            let skills = decode_string_list(&row.skills);
            let availability = decode_string_list(&row.availability);
            let score = match_score(&skills, event_skills);
            let is_available = is_available_on(&availability, event_date);
            VolunteerMatch {
                assigned: assigned.contains(&row.user_id),
                match_score: score,
                is_available,
                skills,
                availability,
                user_id: row.user_id,
                full_name: row.full_name,
                city: row.city,
                state: row.state,
                preferences: row.preferences,
            }
        })
        .filter(|candidate| candidate.match_score > 0.0 || candidate.is_available)
        .collect();

    matches.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    matches
}

/// Freeze the event's current fields for the history record. The event
/// must still be complete and within column limits; stored values are
/// trimmed and capped, unreadable times become NULL.
fn snapshot_event(event: &EventRow) -> Result<EventSnapshot, AppError> {
    if event.event_name.is_empty()
        || event.event_description.is_empty()
        || event.event_location.is_empty()
    {
        return Err(AppError::bad_request("Event is missing required fields"));
    }
    if event.event_name.chars().count() > 100 {
        return Err(AppError::bad_request(
            "Event name is too long (max 100 characters)",
        ));
    }

    Ok(EventSnapshot {
        event_name: truncate_chars(event.event_name.trim(), 100),
        event_description: event.event_description.trim().to_string(),
        event_location: truncate_chars(event.event_location.trim(), 255),
        required_skills: decode_string_list(&event.required_skills),
        urgency: normalize_urgency(&event.urgency),
        event_date: event.event_date,
        start_time: normalize_time(&event.start_time),
        end_time: normalize_time(&event.end_time),
    })
}

/// Notification copy for a fresh assignment. The time clause is dropped
/// when the stored start time is not readable.
fn assignment_message(
    event_name: &str,
    event_date: NaiveDate,
    raw_start_time: &str,
    event_location: &str,
) -> String {
    let time_text = format_time_12h(raw_start_time)
        .map(|time| format!(" at {}", time))
        .unwrap_or_default();
    format!(
        "You have an event coming up! \"{}\" on {}{} at {}.",
        event_name,
        format_long_date(event_date),
        time_text,
        event_location
    )
}

pub struct Matching;

impl Matching {
    pub async fn volunteers(pool: &PgPool) -> Result<Vec<VolunteerRow>, sqlx::Error> {
        sqlx::query_as::<_, VolunteerRow>(
            r#"
            SELECT user_id, full_name, city, state, skills, availability, preferences
            FROM user_profiles
            ORDER BY full_name ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn suggestions(
        pool: &PgPool,
        event_id: Uuid,
    ) -> Result<Vec<VolunteerMatch>, AppError> {
        let event = Self::find_event(pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let volunteers = Self::volunteers(pool).await?;
        let assigned = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM volunteer_history WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        let event_skills = decode_string_list(&event.required_skills);
        Ok(build_suggestions(
            volunteers,
            &event_skills,
            event.event_date,
            &assigned,
        ))
    }

    pub async fn assign(
        pool: &PgPool,
        volunteer_id: Uuid,
        event_id: Uuid,
    ) -> Result<AssignmentInfo, AppError> {
        let already_assigned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM volunteer_history WHERE user_id = $1 AND event_id = $2)",
        )
        .bind(volunteer_id)
        .bind(event_id)
        .fetch_one(pool)
        .await?;
        if already_assigned {
            return Err(AppError::Conflict(
                "Volunteer already assigned to this event".to_string(),
            ));
        }

        let volunteer_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(volunteer_id)
                .fetch_one(pool)
                .await?;
        if !volunteer_exists {
            return Err(AppError::NotFound("Volunteer not found".to_string()));
        }

        let event = Self::find_event(pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let snapshot = snapshot_event(&event)?;
        // Notification copy keeps the event fields as entered, not the
        // trimmed versions stored on the history record.
        let message = assignment_message(
            &event.event_name,
            event.event_date,
            &event.start_time,
            &event.event_location,
        );

        let mut tx = pool.begin().await?;

        let record = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO volunteer_history (
                id, user_id, event_id, event_name, event_description, event_location,
                required_skills, urgency, event_date, start_time, end_time, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'upcoming', NOW())
            RETURNING id, user_id, event_id, event_name, event_description, event_location,
                      required_skills, urgency, event_date, start_time, end_time, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(volunteer_id)
        .bind(event_id)
        .bind(&snapshot.event_name)
        .bind(&snapshot.event_description)
        .bind(&snapshot.event_location)
        .bind(encode_string_list(&snapshot.required_skills))
        .bind(&snapshot.urgency)
        .bind(snapshot.event_date)
        .bind(&snapshot.start_time)
        .bind(&snapshot.end_time)
        .fetch_one(&mut *tx)
        .await
        // The unique index backs up the pre-check under concurrent assignment.
        .map_err(|err| match AppError::from(err) {
            AppError::Conflict(_) => {
                AppError::Conflict("Volunteer already assigned to this event".to_string())
            }
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, message, type, event_name, read, created_at)
            VALUES ($1, $2, $3, 'assignment', $4, FALSE, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(volunteer_id)
        .bind(&message)
        .bind(&event.event_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AssignmentInfo::from(record))
    }

    async fn find_event(pool: &PgPool, event_id: Uuid) -> Result<Option<EventRow>, sqlx::Error> {
        sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_name, event_description, event_location, required_skills,
                   urgency, event_date, start_time, end_time
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn volunteer(name: &str, skills: &[&str], availability: &[&str]) -> VolunteerRow {
        VolunteerRow {
            user_id: Uuid::new_v4(),
            full_name: name.to_string(),
            city: "Houston".to_string(),
            state: "TX".to_string(),
            skills: serde_json::to_string(skills).unwrap(),
            availability: serde_json::to_string(availability).unwrap(),
            preferences: None,
        }
    }

    fn event_row() -> EventRow {
        EventRow {
            event_name: "Beach Cleanup".to_string(),
            event_description: "Cleaning up the shoreline".to_string(),
            event_location: "Houston Community Center".to_string(),
            required_skills: r#"["Teamwork","Organized"]"#.to_string(),
            urgency: "medium".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            start_time: "09:00:00".to_string(),
            end_time: "17:00:00".to_string(),
        }
    }

    #[test]
    fn score_is_matched_fraction_of_event_skills() {
        let event = strings(&["Teamwork", "Driving"]);
        assert_eq!(match_score(&strings(&["Teamwork", "Driving"]), &event), 100.0);
        assert_eq!(match_score(&strings(&["Teamwork"]), &event), 50.0);
        assert_eq!(match_score(&strings(&["Spanish"]), &event), 0.0);
        assert_eq!(match_score(&[], &event), 0.0);
    }

    #[test]
    fn extra_volunteer_skills_never_lower_the_score() {
        let event = strings(&["Teamwork"]);
        let volunteer = strings(&["Teamwork", "Driving", "Spanish", "English"]);
        assert_eq!(match_score(&volunteer, &event), 100.0);
    }

    #[test]
    fn duplicate_skill_entries_count_once() {
        let volunteer = strings(&["Driving", "Driving"]);
        assert_eq!(match_score(&volunteer, &strings(&["Driving"])), 100.0);
        assert_eq!(
            match_score(&strings(&["Driving"]), &strings(&["Driving", "Driving"])),
            100.0
        );
        assert_eq!(
            match_score(&volunteer, &strings(&["Driving", "Teamwork"])),
            50.0
        );
    }

    #[test]
    fn event_requiring_nothing_scores_zero() {
        assert_eq!(match_score(&strings(&["Teamwork"]), &[]), 0.0);
    }

    #[test]
    fn availability_is_exact_date_equality() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert!(is_available_on(&strings(&["2025-12-01"]), date));
        assert!(is_available_on(&strings(&["2025-11-30", "2025-12-01"]), date));
        assert!(!is_available_on(&strings(&["2025-12-02"]), date));
        assert!(!is_available_on(&strings(&["soon", ""]), date));
        assert!(!is_available_on(&[], date));
    }

    #[test]
    fn suggestions_keep_skill_matches_and_available_volunteers_only() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let event_skills = strings(&["Teamwork", "Organized"]);
        let full = volunteer("Full Match", &["Teamwork", "Organized"], &[]);
        let available_only = volunteer("Available Only", &["Driving"], &["2025-12-01"]);
        let no_match = volunteer("No Match", &["Driving"], &["2025-12-25"]);

        let matches = build_suggestions(
            vec![no_match, available_only, full],
            &event_skills,
            date,
            &[],
        );

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].full_name, "Full Match");
        assert_eq!(matches[0].match_score, 100.0);
        assert!(!matches[0].is_available);
        assert_eq!(matches[1].full_name, "Available Only");
        assert_eq!(matches[1].match_score, 0.0);
        assert!(matches[1].is_available);
    }

    #[test]
    fn suggestions_flag_already_assigned_volunteers() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let taken = volunteer("Taken", &["Teamwork"], &[]);
        let free = volunteer("Free", &["Teamwork"], &[]);
        let taken_id = taken.user_id;

        let matches =
            build_suggestions(vec![taken, free], &strings(&["Teamwork"]), date, &[taken_id]);

        let by_name = |name: &str| matches.iter().find(|m| m.full_name == name).unwrap();
        assert!(by_name("Taken").assigned);
        assert!(!by_name("Free").assigned);
    }

    #[test]
    fn equal_scores_order_by_user_id() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let a = volunteer("A", &["Teamwork"], &[]);
        let b = volunteer("B", &["Teamwork"], &[]);
        let (first_id, second_id) = if a.user_id < b.user_id {
            (a.user_id, b.user_id)
        } else {
            (b.user_id, a.user_id)
        };

        let matches = build_suggestions(vec![a, b], &strings(&["Teamwork"]), date, &[]);

        assert_eq!(matches[0].user_id, first_id);
        assert_eq!(matches[1].user_id, second_id);
    }

    #[test]
    fn snapshot_rejects_incomplete_events() {
        let mut event = event_row();
        event.event_location = String::new();
        match snapshot_event(&event) {
            Err(AppError::BadRequest(message)) => {
                assert_eq!(message, "Event is missing required fields");
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_rejects_oversized_names() {
        let mut event = event_row();
        event.event_name = "x".repeat(101);
        match snapshot_event(&event) {
            Err(AppError::BadRequest(message)) => {
                assert_eq!(message, "Event name is too long (max 100 characters)");
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_trims_caps_and_normalizes() {
        let mut event = event_row();
        event.event_name = "  Beach Cleanup  ".to_string();
        event.event_location = "p".repeat(300);
        event.urgency = "HIGH".to_string();
        event.start_time = "9:00".to_string();
        event.end_time = "bogus".to_string();

        let snapshot = snapshot_event(&event).unwrap();
        assert_eq!(snapshot.event_name, "Beach Cleanup");
        assert_eq!(snapshot.event_location.chars().count(), 255);
        assert_eq!(snapshot.urgency, "high");
        assert_eq!(snapshot.start_time, Some("09:00:00".to_string()));
        assert_eq!(snapshot.end_time, None);
        assert_eq!(snapshot.required_skills, strings(&["Teamwork", "Organized"]));
    }

    #[test]
    fn snapshot_defaults_missing_urgency_to_medium() {
        let mut event = event_row();
        event.urgency = String::new();
        assert_eq!(snapshot_event(&event).unwrap().urgency, "medium");
    }

    #[test]
    fn assignment_message_reads_naturally() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(
            assignment_message("Beach Cleanup", date, "9:00", "Houston Community Center"),
            "You have an event coming up! \"Beach Cleanup\" on Monday, December 1, 2025 at 9:00 AM at Houston Community Center."
        );
    }

    #[test]
    fn assignment_message_drops_unreadable_start_times() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(
            assignment_message("Beach Cleanup", date, "", "The Park"),
            "You have an event coming up! \"Beach Cleanup\" on Monday, December 1, 2025 at The Park."
        );
        assert_eq!(
            assignment_message("Beach Cleanup", date, "whenever", "The Park"),
            "You have an event coming up! \"Beach Cleanup\" on Monday, December 1, 2025 at The Park."
        );
    }
}
