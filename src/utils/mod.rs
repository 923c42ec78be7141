use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Admins may touch any record; everyone else only their own.
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || self.sub == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You can only access your own resources".to_string(),
            ))
        }
    }
}

pub fn generate_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(config.jwt_expiration().as_secs() as i64))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.to_string(),
        exp: expiration,
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: true,
        data: Some(data),
        message: None,
        error: None,
        errors: None,
    })
}

pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: true,
        data: Some(data),
        message: Some(message.to_string()),
        error: None,
        errors: None,
    })
}

pub fn message_to_api_response(message: &str) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        ok: true,
        data: None,
        message: Some(message.to_string()),
        error: None,
        errors: None,
    })
}

pub fn error_to_api_response<T>(error: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: false,
        data: None,
        message: None,
        error: Some(error),
        errors: None,
    })
}

pub fn errors_to_api_response<T>(errors: Vec<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: false,
        data: None,
        message: None,
        error: None,
        errors: Some(errors),
    })
}

fn string_items(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode a TEXT column expected to hold a JSON array of strings.
/// Tolerates double-encoded payloads; anything unreadable decodes to
/// an empty list rather than an error.
pub fn decode_string_list(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner)
            .map(string_items)
            .unwrap_or_default(),
        Ok(value) => string_items(value),
        Err(_) => Vec::new(),
    }
}

/// Request payloads may send a list or a single bare string.
pub fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

pub fn encode_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

pub fn parse_uuid(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|s| Uuid::parse_str(s.trim()).ok())
}

pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Urgency as stored on history records: lowercased, capped at the
/// column width, defaulting to `medium` when absent.
pub fn normalize_urgency(raw: &str) -> String {
    if raw.is_empty() {
        "medium".to_string()
    } else {
        truncate_chars(&raw.to_lowercase(), 20)
    }
}

/// Canonicalize a time-of-day string to `HH:MM:SS`. Accepts `HH:MM` or
/// `HH:MM:SS` with unpadded components; returns None for anything that
/// does not describe a real time.
pub fn normalize_time(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split(':');
    let hour = parts.next()?.trim();
    let minute = parts.next()?.trim();
    let second = parts.next().unwrap_or("00").trim();
    if parts.next().is_some() {
        return None;
    }
    let formatted = format!("{:0>2}:{:0>2}:{:0>2}", hour, minute, second);
    NaiveTime::parse_from_str(&formatted, "%H:%M:%S").ok()?;
    Some(formatted)
}

/// `Monday, December 1, 2025` -- the shape used in notification copy.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// 12-hour clock like `9:00 AM`, built from a raw `HH:MM[:SS]` string.
/// Returns None when the input is not a readable time.
pub fn format_time_12h(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    Some(format!("{}:{:02} {}", display_hour, minute, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_secs: 24 * 3600,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = hash_password("Volunteer123!").unwrap();
        assert!(verify_password("Volunteer123!", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let config = test_config();
        let id = Uuid::new_v4();
        let token = generate_token(id, "vol@example.com", "volunteer", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "vol@example.com");
        assert_eq!(claims.role, "volunteer");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let config = test_config();
        let mut other = test_config();
        other.jwt_secret = "different".to_string();
        let token = generate_token(Uuid::new_v4(), "a@b.co", "admin", &config).unwrap();
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.co".to_string(),
            role: "volunteer".to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(26)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn admin_gate() {
        let admin = Claims {
            sub: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role: "admin".to_string(),
            exp: 0,
            iat: 0,
        };
        let volunteer = Claims {
            role: "volunteer".to_string(),
            ..admin.clone()
        };
        assert!(admin.require_admin().is_ok());
        assert!(volunteer.require_admin().is_err());
    }

    #[test]
    fn owner_or_admin_gate() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let volunteer = Claims {
            sub: owner,
            email: "vol@example.com".to_string(),
            role: "volunteer".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(volunteer.require_owner_or_admin(owner).is_ok());
        assert!(volunteer.require_owner_or_admin(stranger).is_err());

        let admin = Claims {
            role: "admin".to_string(),
            ..volunteer
        };
        assert!(admin.require_owner_or_admin(stranger).is_ok());
    }

    #[test]
    fn decode_handles_plain_arrays() {
        assert_eq!(
            decode_string_list(r#"["Driving","English"]"#),
            vec!["Driving".to_string(), "English".to_string()]
        );
    }

    #[test]
    fn decode_handles_double_encoded_arrays() {
        assert_eq!(
            decode_string_list(r#""[\"Driving\"]""#),
            vec!["Driving".to_string()]
        );
    }

    #[test]
    fn decode_defaults_to_empty_on_garbage() {
        assert!(decode_string_list("not json").is_empty());
        assert!(decode_string_list("42").is_empty());
        assert!(decode_string_list(r#""just a string""#).is_empty());
    }

    #[test]
    fn coerce_accepts_bare_strings() {
        let single = serde_json::json!("Driving");
        assert_eq!(coerce_string_list(Some(&single)), vec!["Driving".to_string()]);
        let list = serde_json::json!(["a", "b"]);
        assert_eq!(
            coerce_string_list(Some(&list)),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(coerce_string_list(None).is_empty());
    }

    #[test]
    fn parse_uuid_tolerates_padding_and_rejects_junk() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(Some(&format!(" {} ", id))), Some(id));
        assert_eq!(parse_uuid(Some("not-a-uuid")), None);
        assert_eq!(parse_uuid(None), None);
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn urgency_is_lowercased_capped_and_defaulted() {
        assert_eq!(normalize_urgency("HIGH"), "high");
        assert_eq!(normalize_urgency(""), "medium");
        assert_eq!(normalize_urgency(&"x".repeat(30)), "x".repeat(20));
    }

    #[test]
    fn normalize_time_pads_and_validates() {
        assert_eq!(normalize_time("9:00"), Some("09:00:00".to_string()));
        assert_eq!(normalize_time("09:00:00"), Some("09:00:00".to_string()));
        assert_eq!(normalize_time("23:59:59"), Some("23:59:59".to_string()));
        assert_eq!(normalize_time("7:5"), Some("07:05:00".to_string()));
        assert_eq!(normalize_time("25:00"), None);
        assert_eq!(normalize_time("9"), None);
        assert_eq!(normalize_time(""), None);
        assert_eq!(normalize_time("noon"), None);
    }

    #[test]
    fn long_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(format_long_date(date), "Monday, December 1, 2025");
    }

    #[test]
    fn twelve_hour_format() {
        assert_eq!(format_time_12h("00:30"), Some("12:30 AM".to_string()));
        assert_eq!(format_time_12h("09:00:00"), Some("9:00 AM".to_string()));
        assert_eq!(format_time_12h("12:15"), Some("12:15 PM".to_string()));
        assert_eq!(format_time_12h("13:05"), Some("1:05 PM".to_string()));
        assert_eq!(format_time_12h("garbage"), None);
        assert_eq!(format_time_12h("99:00"), None);
    }
}
