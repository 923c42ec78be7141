use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::{coerce_string_list, decode_string_list, encode_string_list};

pub const STATE_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub skills: String,
    pub preferences: Option<String>,
    pub availability: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    pub user_id: Uuid,
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub skills: Vec<String>,
    pub preferences: Option<String>,
    pub availability: Vec<String>,
}

impl From<Profile> for ProfileInfo {
    fn from(profile: Profile) -> Self {
        Self {
            skills: decode_string_list(&profile.skills),
            availability: decode_string_list(&profile.availability),
            user_id: profile.user_id,
            full_name: profile.full_name,
            address1: profile.address1,
            address2: profile.address2,
            city: profile.city,
            state: profile.state,
            zip: profile.zip,
            preferences: profile.preferences,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    pub full_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub skills: Option<Value>,
    pub preferences: Option<String>,
    pub availability: Option<Value>,
}

#[derive(Debug)]
pub struct ValidatedProfile {
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub skills: Vec<String>,
    pub preferences: Option<String>,
    pub availability: Vec<String>,
}

fn is_valid_zip(zip: &str) -> bool {
    (zip.len() == 5 || zip.len() == 9) && zip.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn check_required_string(
    value: Option<&str>,
    field: &str,
    max: usize,
    errors: &mut Vec<String>,
) -> String {
    let value = value.unwrap_or("");
    if value.is_empty() {
        errors.push(format!("{} is a required field", field));
    } else if value.chars().count() > max {
        errors.push(format!("{} must be at most {} characters", field, max));
    }
    value.to_string()
}

pub fn validate_profile_payload(payload: &ProfilePayload) -> Result<ValidatedProfile, AppError> {
    let mut errors = Vec::new();

    let full_name = check_required_string(payload.full_name.as_deref(), "fullName", 50, &mut errors);
    let address1 = check_required_string(payload.address1.as_deref(), "address1", 100, &mut errors);

    // empty strings collapse to null before validation
    let address2 = payload.address2.as_deref().filter(|s| !s.is_empty());
    if let Some(address2) = address2 {
        if address2.chars().count() > 100 {
            errors.push("address2 must be at most 100 characters".to_string());
        }
    }

    let city = check_required_string(payload.city.as_deref(), "city", 100, &mut errors);

    let state = payload.state.as_deref().unwrap_or("");
    if state.is_empty() {
        errors.push("state is a required field".to_string());
    } else if !STATE_CODES.contains(&state) {
        errors.push(format!(
            "state must be one of the following values: {}",
            STATE_CODES.join(", ")
        ));
    }

    let zip = payload.zip.as_deref().unwrap_or("");
    if zip.is_empty() {
        errors.push("zip is a required field".to_string());
    } else if !is_valid_zip(zip) {
        errors.push("Zip code must be 5 or 9 digits".to_string());
    }

    let skills: Vec<String> = coerce_string_list(payload.skills.as_ref())
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        errors.push("skills field must have at least 1 items".to_string());
    }
    for (idx, skill) in skills.iter().enumerate() {
        if skill.chars().count() > 100 {
            errors.push(format!("skills[{}] must be at most 100 characters", idx));
        }
    }

    let preferences = payload.preferences.as_deref().filter(|s| !s.is_empty());
    if let Some(preferences) = preferences {
        if preferences.chars().count() > 1000 {
            errors.push("preferences must be at most 1000 characters".to_string());
        }
    }

    let availability: Vec<String> = coerce_string_list(payload.availability.as_ref())
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if availability.is_empty() {
        errors.push("availability field must have at least 1 items".to_string());
    }
    for date in &availability {
        if !is_valid_date(date) {
            errors.push("Availability dates must be valid dates".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(ValidatedProfile {
        full_name,
        address1,
        address2: address2.map(str::to_string),
        city,
        state: state.to_string(),
        zip: zip.to_string(),
        skills,
        preferences: preferences.map(str::to_string),
        availability,
    })
}

impl Profile {
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, full_name, address1, address2, city, state, zip,
                   skills, preferences, availability
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Full replacement of the stored profile, creating it on first save.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        profile: &ValidatedProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO user_profiles (
                user_id, full_name, address1, address2, city, state, zip,
                skills, preferences, availability
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                address1 = EXCLUDED.address1,
                address2 = EXCLUDED.address2,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                zip = EXCLUDED.zip,
                skills = EXCLUDED.skills,
                preferences = EXCLUDED.preferences,
                availability = EXCLUDED.availability
            RETURNING user_id, full_name, address1, address2, city, state, zip,
                      skills, preferences, availability
            "#,
        )
        .bind(user_id)
        .bind(&profile.full_name)
        .bind(&profile.address1)
        .bind(&profile.address2)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.zip)
        .bind(encode_string_list(&profile.skills))
        .bind(&profile.preferences)
        .bind(encode_string_list(&profile.availability))
        .fetch_one(pool)
        .await
    }
}
