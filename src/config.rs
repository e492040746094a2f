use anyhow::{Context, Result};

/// Secrets for the destination store, read from the environment.
pub struct Config {
    pub notion_token: String,
    pub database_id: String,
}

pub fn from_env() -> Result<Config> {
    let notion_token = std::env::var("NOTION_API_KEY")
        .context("NOTION_API_KEY environment variable must be set")?;
    let database_id =
        std::env::var("DATABASE_ID").context("DATABASE_ID environment variable must be set")?;
    Ok(Config {
        notion_token,
        database_id,
    })
}
