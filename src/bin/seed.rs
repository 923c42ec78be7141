use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;
use volunteer_backend::config::Config;
use volunteer_backend::utils::{encode_string_list, hash_password};

/// Seeds the demo accounts. Safe to run repeatedly; existing rows are
/// left untouched.
#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let admin_hash = hash_password("Admin123!").expect("Failed to hash password");
    let (_, admin_created) = ensure_user(&pool, "admin@volunteer.com", &admin_hash, "admin")
        .await
        .expect("Failed to seed admin user");
    if admin_created {
        println!("Created admin user admin@volunteer.com");
    } else {
        println!("Admin user already exists");
    }

    let volunteer_hash = hash_password("Volunteer123!").expect("Failed to hash password");
    let (volunteer_id, volunteer_created) =
        ensure_user(&pool, "volunteer@volunteer.com", &volunteer_hash, "volunteer")
            .await
            .expect("Failed to seed volunteer user");
    if volunteer_created {
        println!("Created volunteer user volunteer@volunteer.com");
        seed_profile(&pool, volunteer_id)
            .await
            .expect("Failed to seed volunteer profile");
        println!("Created sample profile for the volunteer");
    } else {
        println!("Volunteer user already exists");
    }

    println!();
    println!("Test credentials:");
    println!("  admin:     admin@volunteer.com / Admin123!");
    println!("  volunteer: volunteer@volunteer.com / Volunteer123!");
}

async fn ensure_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<(Uuid, bool), sqlx::Error> {
    let inserted = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (id, email, password_hash, role, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(id) => Ok((id, true)),
        None => {
            let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            Ok((id, false))
        }
    }
}

async fn seed_profile(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    let today = Utc::now().date_naive();
    let availability: Vec<String> = [7, 14, 21]
        .iter()
        .map(|days| (today + Duration::days(*days)).format("%Y-%m-%d").to_string())
        .collect();
    let skills: Vec<String> = ["Communication", "Teamwork", "Organized"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    sqlx::query(
        r#"
        INSERT INTO user_profiles (
            user_id, full_name, address1, address2, city, state, zip,
            skills, preferences, availability
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind("John Volunteer")
    .bind("123 Main St")
    .bind("Apt 4B")
    .bind("Houston")
    .bind("TX")
    .bind("77001")
    .bind(encode_string_list(&skills))
    .bind("Available on weekends")
    .bind(encode_string_list(&availability))
    .execute(pool)
    .await?;

    Ok(())
}
