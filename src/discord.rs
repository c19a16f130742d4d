//! Discord REST implementation of the platform contracts.
//!
//! Only the two endpoints the archiver needs are covered: channel message
//! history and the avatar CDN.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::platform::{
    AvatarFormat, ChannelMessage, ChannelUser, HistorySource, NativeAttachment, SourceError,
    UserDirectory,
};

/// How many consecutive 429 responses a single request tolerates.
const MAX_RATE_LIMIT_RETRIES: u32 = 5;

static USER_MENTION: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"<@!?(\d{15,21})>").unwrap());

static MASS_MENTION: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"@(everyone|here)").unwrap());

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    username: String,
    #[serde(default)]
    discriminator: String,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    nick: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMention {
    #[serde(flatten)]
    user: ApiUser,
    member: Option<ApiMember>,
}

#[derive(Debug, Deserialize)]
struct ApiAttachment {
    id: String,
    filename: String,
    proxy_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: String,
    author: ApiUser,
    #[serde(default)]
    content: String,
    timestamp: DateTime<Utc>,
    edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    attachments: Vec<ApiAttachment>,
    #[serde(default)]
    mentions: Vec<ApiMention>,
}

#[derive(Debug, Deserialize)]
struct RateLimited {
    retry_after: f64,
}

impl From<ApiUser> for ChannelUser {
    fn from(user: ApiUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            discriminator: user.discriminator,
            avatar: user.avatar,
        }
    }
}

impl From<ApiMessage> for ChannelMessage {
    fn from(msg: ApiMessage) -> Self {
        let names: Vec<(String, String)> = msg
            .mentions
            .iter()
            .map(|m| {
                let shown = m
                    .member
                    .as_ref()
                    .and_then(|member| member.nick.clone())
                    .unwrap_or_else(|| m.user.username.clone());
                (m.user.id.clone(), shown)
            })
            .collect();
        let clean_content = clean_content(&msg.content, &names);

        Self {
            id: msg.id,
            author: msg.author.into(),
            content: msg.content,
            clean_content,
            created_at: msg.timestamp,
            edited_at: msg.edited_timestamp,
            attachments: msg
                .attachments
                .into_iter()
                .map(|a| NativeAttachment {
                    id: a.id,
                    filename: a.filename,
                    proxy_url: a.proxy_url,
                })
                .collect(),
            mentions: msg.mentions.into_iter().map(|m| m.user.into()).collect(),
        }
    }
}

/// Render message text for display: user mentions become `@name` and mass
/// mentions are defused with a zero-width space.
///
/// `names` maps user id to the name to show. Unknown ids are left as markup.
#[must_use]
pub fn clean_content(content: &str, names: &[(String, String)]) -> String {
    let resolved = USER_MENTION.replace_all(content, |caps: &regex::Captures<'_>| {
        let id = &caps[1];
        names
            .iter()
            .find(|(user_id, _)| user_id == id)
            .map_or_else(|| caps[0].to_string(), |(_, name)| format!("@{name}"))
    });
    MASS_MENTION
        .replace_all(&resolved, "@\u{200b}$1")
        .into_owned()
}

/// Index of the built-in avatar shown for users without a custom one.
fn default_avatar_index(user: &ChannelUser) -> u64 {
    match user.discriminator.parse::<u64>() {
        Ok(discriminator) if discriminator != 0 => discriminator % 5,
        _ => user.id.parse::<u64>().map_or(0, |id| (id >> 22) % 6),
    }
}

/// Authenticated Discord REST client.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_url: String,
    cdn_url: String,
    token: String,
}

impl DiscordClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!(
                "DiscordBot (https://github.com/channel-archiver, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            http,
            api_url: config.discord_api_url.trim_end_matches('/').to_string(),
            cdn_url: config.discord_cdn_url.trim_end_matches('/').to_string(),
            token: config.discord_token.clone(),
        })
    }

    /// History of one channel.
    #[must_use]
    pub fn channel(&self, channel_id: &str) -> ChannelHistory<'_> {
        ChannelHistory {
            client: self,
            channel_id: channel_id.to_string(),
        }
    }

    async fn get_messages(
        &self,
        channel_id: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ApiMessage>, SourceError> {
        let url = format!("{}/channels/{channel_id}/messages", self.api_url);
        let mut query = vec![("limit", limit.to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }

        let mut attempts = 0;
        loop {
            let response = self
                .http
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if status.as_u16() == 429 {
                attempts += 1;
                if attempts > MAX_RATE_LIMIT_RETRIES {
                    return Err(SourceError::RateLimited { attempts });
                }
                let wait = response
                    .json::<RateLimited>()
                    .await
                    .map_or(1.0, |r| r.retry_after);
                warn!(channel_id, retry_after = wait, "Rate limited by Discord, waiting");
                tokio::time::sleep(Duration::from_secs_f64(wait.clamp(0.0, 60.0))).await;
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()));
        }
    }
}

impl UserDirectory for DiscordClient {
    fn avatar_url(&self, user: &ChannelUser, size: u32, format: AvatarFormat) -> String {
        match &user.avatar {
            Some(hash) => format!(
                "{}/avatars/{}/{hash}.{}?size={size}",
                self.cdn_url,
                user.id,
                format.as_str()
            ),
            // Built-in avatars are only served as PNG.
            None => format!(
                "{}/embed/avatars/{}.png",
                self.cdn_url,
                default_avatar_index(user)
            ),
        }
    }
}

/// [`HistorySource`] for a single channel.
pub struct ChannelHistory<'a> {
    client: &'a DiscordClient,
    channel_id: String,
}

#[async_trait]
impl<'a> HistorySource for ChannelHistory<'a> {
    async fn fetch_page(
        &self,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>, SourceError> {
        let messages = self
            .client
            .get_messages(&self.channel_id, before, limit)
            .await?;
        debug!(channel_id = %self.channel_id, count = messages.len(), "Received messages");
        Ok(messages.into_iter().map(ChannelMessage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, discriminator: &str, avatar: Option<&str>) -> ChannelUser {
        ChannelUser {
            id: id.to_string(),
            username: "someone".to_string(),
            discriminator: discriminator.to_string(),
            avatar: avatar.map(String::from),
        }
    }

    fn client() -> DiscordClient {
        DiscordClient {
            http: reqwest::Client::new(),
            api_url: "https://discord.test/api".to_string(),
            cdn_url: "https://cdn.test".to_string(),
            token: "t".to_string(),
        }
    }

    #[test]
    fn test_clean_content_resolves_mentions() {
        let names = vec![("123456789012345678".to_string(), "alice".to_string())];
        assert_eq!(
            clean_content("hi <@123456789012345678> and <@!123456789012345678>", &names),
            "hi @alice and @alice"
        );
    }

    #[test]
    fn test_clean_content_leaves_unknown_mentions() {
        assert_eq!(
            clean_content("hi <@999999999999999999>", &[]),
            "hi <@999999999999999999>"
        );
    }

    #[test]
    fn test_clean_content_defuses_mass_mentions() {
        assert_eq!(clean_content("@everyone look", &[]), "@\u{200b}everyone look");
        assert_eq!(clean_content("@here", &[]), "@\u{200b}here");
    }

    #[test]
    fn test_custom_avatar_url() {
        let url = client().avatar_url(&user("42", "0001", Some("abc")), 4096, AvatarFormat::Webp);
        assert_eq!(url, "https://cdn.test/avatars/42/abc.webp?size=4096");
    }

    #[test]
    fn test_default_avatar_legacy_discriminator() {
        let url = client().avatar_url(&user("42", "0007", None), 4096, AvatarFormat::Webp);
        assert_eq!(url, "https://cdn.test/embed/avatars/2.png");
    }

    #[test]
    fn test_default_avatar_new_username() {
        // (id >> 22) % 6 with id = 5 << 22
        let id = (5u64 << 22).to_string();
        let url = client().avatar_url(&user(&id, "0", None), 4096, AvatarFormat::Webp);
        assert_eq!(url, "https://cdn.test/embed/avatars/5.png");
    }

    #[test]
    fn test_message_conversion() {
        let raw = r#"{
            "id": "200",
            "author": {"id": "1", "username": "alice", "discriminator": "0001", "avatar": "hash"},
            "content": "hey <@222222222222222222> https://example.com/x.png",
            "timestamp": "2021-05-01T12:00:00.000000+00:00",
            "edited_timestamp": null,
            "attachments": [
                {"id": "300", "filename": "cat.jpg", "proxy_url": "https://media.test/cat.jpg", "size": 10, "url": "https://cdn.test/cat.jpg"}
            ],
            "mentions": [
                {"id": "222222222222222222", "username": "bob", "discriminator": "0002", "avatar": null, "member": {"nick": "bobby"}}
            ]
        }"#;

        let api: ApiMessage = serde_json::from_str(raw).unwrap();
        let msg = ChannelMessage::from(api);

        assert_eq!(msg.id, "200");
        assert_eq!(msg.author.username, "alice");
        assert_eq!(msg.clean_content, "hey @bobby https://example.com/x.png");
        assert_eq!(msg.attachments[0].proxy_url, "https://media.test/cat.jpg");
        assert_eq!(msg.mentions[0].id, "222222222222222222");
        assert!(msg.edited_at.is_none());
        assert_eq!(msg.created_at.timestamp(), 1_619_870_400);
    }
}
