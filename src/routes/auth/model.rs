use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Same shape the frontend enforces: something@something.tld with no
/// whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rfind('.') {
        Some(idx) => idx > 0 && idx + 1 < domain.len(),
        None => false,
    }
}

fn is_valid_password(password: &str) -> bool {
    (8..=128).contains(&password.len())
}

/// Collects every violated rule; the email comes back lowercased and the
/// role reduced to a known value (anything unrecognized means volunteer).
pub fn validate_registration(req: &RegisterRequest) -> Result<(String, String, String), AppError> {
    let mut errors = Vec::new();

    let email = req.email.as_deref().unwrap_or("");
    if !is_valid_email(email) {
        errors.push("Invalid email format".to_string());
    }

    let password = req.password.as_deref().unwrap_or("");
    if !is_valid_password(password) {
        errors.push("Password must be between 8 and 128 characters".to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let role = match req.role.as_deref() {
        Some(role) if role == "volunteer" || role == "admin" => role.to_string(),
        _ => "volunteer".to_string(),
    };

    Ok((email.to_lowercase(), password.to_string(), role))
}

pub fn validate_login(req: &LoginRequest) -> Result<(String, String), AppError> {
    let mut errors = Vec::new();

    let email = req.email.as_deref().unwrap_or("");
    if !is_valid_email(email) {
        errors.push("Invalid email format".to_string());
    }

    let password = req.password.as_deref().unwrap_or("");
    if !is_valid_password(password) {
        errors.push("Invalid password".to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok((email.to_lowercase(), password.to_string()))
}

impl User {
    pub async fn create(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_req(email: &str, password: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "",
            "plain",
            "no@dot",
            "trailing@dot.",
            "@missing.local",
            "two@@ats.com",
            "sp ace@mail.com",
            "space@ma il.com",
        ] {
            assert!(!is_valid_email(email), "{email:?} should be invalid");
        }
    }

    #[test]
    fn password_bounds_are_inclusive() {
        assert!(!is_valid_password(&"x".repeat(7)));
        assert!(is_valid_password(&"x".repeat(8)));
        assert!(is_valid_password(&"x".repeat(128)));
        assert!(!is_valid_password(&"x".repeat(129)));
    }

    #[test]
    fn registration_lowercases_email() {
        let (email, _, _) =
            validate_registration(&register_req("Admin@Volunteer.COM", "Admin123!", None))
                .unwrap();
        assert_eq!(email, "admin@volunteer.com");
    }

    #[test]
    fn registration_collects_every_error() {
        let err = validate_registration(&register_req("nope", "short", None)).unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(
                    errors,
                    vec![
                        "Invalid email format".to_string(),
                        "Password must be between 8 and 128 characters".to_string(),
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_fail_validation() {
        let err = validate_registration(&RegisterRequest {
            email: None,
            password: None,
            role: None,
        })
        .unwrap_err();
        match err {
            AppError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_roles_fall_back_to_volunteer() {
        let (_, _, role) =
            validate_registration(&register_req("a@b.co", "longenough", Some("superuser")))
                .unwrap();
        assert_eq!(role, "volunteer");

        let (_, _, role) =
            validate_registration(&register_req("a@b.co", "longenough", Some("admin"))).unwrap();
        assert_eq!(role, "admin");
    }

    #[test]
    fn login_uses_its_own_password_message() {
        let err = validate_login(&LoginRequest {
            email: Some("a@b.co".to_string()),
            password: Some("short".to_string()),
        })
        .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors, vec!["Invalid password".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
