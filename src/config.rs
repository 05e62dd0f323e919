use std::env;

/// Process configuration, sourced from environment variables (a `.env` file is
/// honoured in development via `dotenv`).
#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    /// Optional GitHub token. Raises the GitHub Releases rate limit and is
    /// required for the GHCR package API.
    pub github_token: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(ServerConfig {
            database_url,
            github_token,
        })
    }
}
