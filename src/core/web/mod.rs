pub mod news;
pub mod status;

pub use news::{Announcement, NewsClient};
pub use status::{parse_players_online, StatusClient};

use std::time::Duration;

/// Site lookups are cosmetic; never let them hang the launcher.
pub const WEB_TIMEOUT: Duration = Duration::from_secs(10);
