use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::info;

use crate::mention::ResolveError;
use crate::resolver::{CachingResolver, ResolverSetupError, UserLookup, caching_resolver};

pub const DISCORD_API: &str = "https://discord.com/api/v10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct DiscordUser {
    username: String,
}

/// Looks up Discord users by id with a bot token.
pub struct DiscordLookup {
    client: Client,
    token: String,
}

impl DiscordLookup {
    pub fn new(token: impl Into<String>) -> Result<Self, ResolverSetupError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ResolverSetupError::EmptyToken);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("almanac/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, token })
    }
}

impl UserLookup for DiscordLookup {
    fn lookup(&self, id: &str) -> Result<String, ResolveError> {
        info!(user_id = %id, "Resolving user...");

        let response = self
            .client
            .get(format!("{DISCORD_API}/users/{id}"))
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .send()?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::UnknownUser(id.to_string()));
        }
        if !status.is_success() {
            return Err(ResolveError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let user: DiscordUser = response.json()?;
        Ok(user.username)
    }
}

/// A cached Discord resolver, the way the wiki is usually configured.
pub fn discord_resolver(
    token: &str,
    cache_path: Option<&Path>,
    ttl: Option<TimeDelta>,
) -> Result<CachingResolver<DiscordLookup>, ResolverSetupError> {
    caching_resolver(DiscordLookup::new(token)?, cache_path, ttl)
}
