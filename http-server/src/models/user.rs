use cards::types::UserAccount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// User as returned to web clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub twitch_id: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub currency: i64,
    pub last_pack_claimed: Option<DateTime<Utc>>,
}

impl From<UserAccount> for AuthenticatedUser {
    fn from(user: UserAccount) -> Self {
        Self {
            twitch_id: user.twitch_id,
            display_name: user.display_name,
            profile_image_url: user.profile_image_url,
            currency: user.currency,
            last_pack_claimed: user.last_pack_claimed,
        }
    }
}
