use std::env;

use crate::error::AppError;

/// Which database the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbProfile {
    /// `DATABASE_URL`
    Prod,
    /// `TEST_DATABASE_URL`; the database name must end in `_test`
    Test,
    /// Private `sqlite::memory:` database, migrated on connect
    InMemory,
}

impl DbProfile {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Prod),
            "test" => Ok(Self::Test),
            "memory" | "in-memory" | "inmemory" => Ok(Self::InMemory),
            other => Err(AppError::config(format!(
                "DB_PROFILE must be one of prod | test | memory, got '{other}'"
            ))),
        }
    }

    /// `DB_PROFILE`, defaulting to `prod`.
    pub fn from_env() -> Result<Self, AppError> {
        match env::var("DB_PROFILE") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::Prod),
        }
    }

    /// Whether pending migrations are applied automatically on connect.
    pub fn auto_migrate(self) -> bool {
        matches!(self, Self::Test | Self::InMemory)
    }
}

/// Resolve the connection URL for a profile from the environment.
pub fn db_url(profile: DbProfile) -> Result<String, AppError> {
    match profile {
        DbProfile::Prod => must_var("DATABASE_URL"),
        DbProfile::Test => {
            let url = must_var("TEST_DATABASE_URL")?;
            let name = database_name(&url);
            // Enforce safety: test DB must end with "_test"
            if !name.ends_with("_test") {
                return Err(AppError::config(format!(
                    "Test profile requires database name to end with '_test', but got: '{name}'"
                )));
            }
            Ok(url)
        }
        DbProfile::InMemory => Ok("sqlite::memory:".to_string()),
    }
}

/// Last path segment without query string or `.db`/`.sqlite` suffix.
fn database_name(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    last.trim_end_matches(".sqlite")
        .trim_end_matches(".db")
}

fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("Required environment variable '{name}' is not set")))
}
