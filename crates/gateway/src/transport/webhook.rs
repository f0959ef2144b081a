//! Connector webhook transport.
//!
//! Every outbound action is a JSON `POST` to the connector's webhook URL:
//!
//! - `{"action": "move_user", "user_id", "community_id", "space": {id, name}}`
//!   answered with the user's resulting location `{"id", "name"}`.
//! - `{"action": "notify", "target": {...}, "notice": {...}, "text"}`
//!   where `text` is the rendered notice for connectors that only relay text.

use std::time::Duration;

use serde::Serialize;

use sb_domain::error::{Error, Result};
use sb_domain::notice::Notice;
use sb_domain::transport::{Location, MonitoredSpace, NoticeTarget, Transport};
use sb_domain::{CommunityId, UserId};

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Envelope<'a> {
    MoveUser {
        user_id: &'a UserId,
        community_id: &'a CommunityId,
        space: &'a MonitoredSpace,
    },
    Notify {
        target: &'a NoticeTarget,
        notice: &'a Notice,
        text: String,
    },
}

pub struct WebhookTransport {
    url: String,
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new(url: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    async fn post(&self, envelope: &Envelope<'_>) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(&self.url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "connector returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl Transport for WebhookTransport {
    async fn move_user_to(
        &self,
        user: &UserId,
        community: &CommunityId,
        space: &MonitoredSpace,
    ) -> Result<Location> {
        let resp = self
            .post(&Envelope::MoveUser {
                user_id: user,
                community_id: community,
                space,
            })
            .await?;
        resp.json::<Location>()
            .await
            .map_err(|e| Error::Transport(format!("invalid move response: {e}")))
    }

    async fn notify(&self, target: &NoticeTarget, notice: &Notice) -> Result<()> {
        self.post(&Envelope::Notify {
            target,
            notice,
            text: notice.to_string(),
        })
        .await?;
        Ok(())
    }
}
