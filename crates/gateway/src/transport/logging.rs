use sb_domain::error::Result;
use sb_domain::notice::Notice;
use sb_domain::transport::{Location, MonitoredSpace, NoticeTarget, Transport};
use sb_domain::{CommunityId, UserId};

/// Writes notices to the log. Moves always "succeed" and report the user
/// as inside the requested space.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait::async_trait]
impl Transport for LogTransport {
    async fn move_user_to(
        &self,
        user: &UserId,
        community: &CommunityId,
        space: &MonitoredSpace,
    ) -> Result<Location> {
        tracing::info!(user_id = %user, community_id = %community, space = %space.name, "move requested");
        Ok(Location {
            id: space.id.clone().unwrap_or_else(|| space.name.clone()),
            name: space.name.clone(),
        })
    }

    async fn notify(&self, target: &NoticeTarget, notice: &Notice) -> Result<()> {
        tracing::info!(
            user_id = %target.user_id,
            community_id = %target.community_id,
            channel_id = %target.channel_id,
            notice = %notice,
            "notice"
        );
        Ok(())
    }
}
