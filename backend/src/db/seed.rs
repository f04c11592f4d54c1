//! Sample schema and seed data.
//!
//! Creates the `users`, `cities`, `roles` and `users_roles` tables and fills
//! them with a small fixed data set. Uses `CREATE TABLE IF NOT EXISTS` and
//! `INSERT OR IGNORE` so re-runs are idempotent (existing rows are preserved).

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::Database;

/// Result of running the bootstrap.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub tables_seeded: Vec<String>,
    pub rows_inserted: u64,
}

const SCHEMA: &[(&str, &str)] = &[
    (
        "cities",
        "CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
    ),
    (
        "roles",
        "CREATE TABLE IF NOT EXISTS roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
    ),
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            id_city INTEGER REFERENCES cities (id)
        )",
    ),
    (
        "users_roles",
        "CREATE TABLE IF NOT EXISTS users_roles (
            id_user INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            id_role INTEGER NOT NULL REFERENCES roles (id),
            PRIMARY KEY (id_user, id_role)
        )",
    ),
];

/// Tables created by [`bootstrap`], parents first.
pub fn tables() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().map(|(table, _)| *table)
}

const ROLES: &[(i64, &str)] = &[(1, "Master"), (2, "User")];

const CITIES: &[(i64, &str)] = &[(1, "New York"), (2, "Miami"), (3, "Chicago")];

const USERS: &[(i64, &str, &str, i64)] = &[
    (1, "Rafel", "rafael@turtleninja.com", 1),
    (2, "Michelangelo", "michelangelo@turtleninja.com", 2),
    (3, "Leonardo", "leonardo@turtleninja.com", 2),
    (4, "Donatello", "donatello@turtleninja.com", 1),
];

const USERS_ROLES: &[(i64, i64)] = &[(1, 2), (2, 1), (2, 2), (3, 1), (3, 2), (4, 2)];

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    for (table, sql) in SCHEMA {
        debug!(table, "Creating table");
        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {table}"))?;
    }
    Ok(())
}

async fn seed_named(pool: &SqlitePool, table: &str, rows: &[(i64, &str)]) -> Result<u64> {
    let sql = format!("INSERT OR IGNORE INTO {table} (id, name) VALUES (?, ?)");
    let mut inserted = 0;
    for (id, name) in rows {
        inserted += sqlx::query(&sql)
            .bind(id)
            .bind(name)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to seed {table} #{id}"))?
            .rows_affected();
    }
    Ok(inserted)
}

async fn seed_users(pool: &SqlitePool) -> Result<u64> {
    let mut inserted = 0;
    for (id, name, email, id_city) in USERS {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO users (id, name, email, id_city) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(id_city)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to seed users #{id}"))?
        .rows_affected();
    }
    Ok(inserted)
}

async fn seed_users_roles(pool: &SqlitePool) -> Result<u64> {
    let mut inserted = 0;
    for (id_user, id_role) in USERS_ROLES {
        inserted += sqlx::query("INSERT OR IGNORE INTO users_roles (id_user, id_role) VALUES (?, ?)")
            .bind(id_user)
            .bind(id_role)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to link user #{id_user} to role #{id_role}"))?
            .rows_affected();
    }
    Ok(inserted)
}

/// Create the sample schema and insert the seed rows.
pub async fn bootstrap(db: &Database) -> Result<SeedResult> {
    let pool = db.pool();
    let mut result = SeedResult::default();

    create_tables(pool).await?;

    // Parents before children so foreign keys hold
    let counts = [
        ("roles", seed_named(pool, "roles", ROLES).await?),
        ("cities", seed_named(pool, "cities", CITIES).await?),
        ("users", seed_users(pool).await?),
        ("users_roles", seed_users_roles(pool).await?),
    ];

    for (table, inserted) in counts {
        if inserted > 0 {
            result.tables_seeded.push(table.to_string());
        }
        result.rows_inserted += inserted;
    }

    info!(
        tables = ?result.tables_seeded,
        rows = result.rows_inserted,
        "Database bootstrap complete"
    );
    Ok(result)
}
