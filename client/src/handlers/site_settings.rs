//! Public site settings.

use crate::ApiClient;
use estate_api_core::{RequestExecutor, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Endpoint paths.
pub mod paths {
    /// Legal and office contact details.
    pub const CONTACTS: &str = "/site-settings/contacts";

    /// Main company information shown in the site header and footer.
    pub const MAIN_INFO: &str = "/site-settings/main-info";
}

/// Legal and office contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteContacts {
    /// Primary state registration number
    pub ogrn: String,
    /// Registered legal address
    pub legal_address: String,
    /// Map coordinates; currently always `null`
    #[serde(default)]
    pub coordinates: Option<Value>,
    /// Sales office address
    pub sales_center_address: String,
}

/// Main company information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Phone number in dialable form
    pub phone: String,
    /// Phone number formatted for display
    pub display_phone: String,
    /// Contact email
    pub email: String,
    /// WhatsApp chat link
    pub whatsapp_link: String,
    /// Telegram chat link
    pub telegram_link: String,
    /// Company description
    pub description: String,
    /// Taxpayer identification number
    pub inn: String,
    /// Organization name
    pub org_name: String,
}

impl<E> ApiClient<E>
where
    E: RequestExecutor + 'static,
{
    /// Fetch the contact details.
    ///
    /// # Errors
    ///
    /// Returns the normalized error.
    pub async fn site_contacts(&self) -> Result<SiteContacts> {
        self.get(paths::CONTACTS).call(()).await
    }

    /// Fetch the main company information.
    ///
    /// # Errors
    ///
    /// Returns the normalized error.
    pub async fn site_info(&self) -> Result<SiteInfo> {
        self.get(paths::MAIN_INFO).call(()).await
    }
}
