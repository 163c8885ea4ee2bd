//! Site-wide contact and social settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_SITE_NAME: &str = "Vitrine";

/// Singleton settings row. When the table is empty, [`Default`] is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub site_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub linkedin_url: Option<String>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            contact_email: None,
            contact_phone: None,
            address: None,
            linkedin_url: None,
            instagram_url: None,
            facebook_url: None,
            twitter_url: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettingsInput {
    #[validate(length(min = 1, max = 200))]
    #[serde(default)]
    pub site_name: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 40))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(url)]
    pub instagram_url: Option<String>,
    #[validate(url)]
    pub facebook_url: Option<String>,
    #[validate(url)]
    pub twitter_url: Option<String>,
}
