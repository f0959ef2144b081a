use std::io::Write;

use sb_domain::error::Result;
use sb_domain::notice::Notice;
use sb_domain::transport::{Location, MonitoredSpace, NoticeTarget, Transport};
use sb_domain::{CommunityId, UserId};

/// Prints notices to stdout for the local console.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait::async_trait]
impl Transport for ConsoleTransport {
    async fn move_user_to(
        &self,
        _user: &UserId,
        _community: &CommunityId,
        space: &MonitoredSpace,
    ) -> Result<Location> {
        println!("\n\x1B[2m(moved to #{})\x1B[0m", space.name);
        Ok(Location {
            id: space.id.clone().unwrap_or_else(|| space.name.clone()),
            name: space.name.clone(),
        })
    }

    async fn notify(&self, _target: &NoticeTarget, notice: &Notice) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "\n\x1B[36m{}\x1B[0m", notice.to_string().trim_end())?;
        out.flush()?;
        Ok(())
    }
}
