use std::time::Duration;

use config::ConfigError;
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};
use url::Url;

use crate::services::{NotionClient, NotionDatabases, NotionError};

pub const PLACEHOLDER_API_KEY: &str = "YOUR_NOTION_API_KEY";
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub notion: NotionSettings,
    #[serde(default)]
    pub webhook: WebhookSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    /// Largest request body the webhook reads before answering 413.
    #[serde(
        default = "default_max_body_bytes",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub max_body_bytes: usize,
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct NotionSettings {
    pub api_key: String,
    pub base_url: String,
    pub version: String,
    pub leads_database_id: String,
    pub batches_database_id: String,
    pub parent_page_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub timeout_milliseconds: Option<u64>,
}

impl NotionSettings {
    /// Base url with a trailing slash, so relative endpoints keep the version
    /// segment when joined.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        if self.base_url.ends_with('/') {
            Url::parse(&self.base_url)
        } else {
            Url::parse(&format!("{}/", self.base_url))
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_milliseconds.map(Duration::from_millis)
    }

    pub fn has_placeholder_key(&self) -> bool {
        self.api_key.is_empty() || self.api_key == PLACEHOLDER_API_KEY
    }

    pub fn client(&self) -> Result<NotionClient, NotionError> {
        NotionClient::new(
            self.base_url()?,
            self.api_key.clone(),
            self.version.clone(),
            self.timeout(),
        )
    }

    pub fn databases(&self) -> NotionDatabases {
        NotionDatabases {
            leads: self.leads_database_id.clone(),
            batches: self.batches_database_id.clone(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct WebhookSettings {
    pub token: Option<String>,
}

impl WebhookSettings {
    /// Bearer token callers must present, if one is configured.
    pub fn required_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("notion.api_key", std::env::var("NOTION_API_KEY").ok())?
        .set_override_option("webhook.token", std::env::var("WEBHOOK_TOKEN").ok())?
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notion_settings(base_url: &str) -> NotionSettings {
        NotionSettings {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            base_url: base_url.to_string(),
            version: "2022-06-28".to_string(),
            leads_database_id: "leads".to_string(),
            batches_database_id: "batches".to_string(),
            parent_page_id: None,
            timeout_milliseconds: Some(1500),
        }
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let with = notion_settings("https://api.notion.com/v1/").base_url().unwrap();
        let without = notion_settings("https://api.notion.com/v1").base_url().unwrap();

        assert_eq!(with, without);
        assert_eq!(
            without.join("pages").unwrap().as_str(),
            "https://api.notion.com/v1/pages"
        );
    }

    #[test]
    fn placeholder_key_is_detected() {
        let mut settings = notion_settings("https://api.notion.com/v1/");
        assert!(settings.has_placeholder_key());

        settings.api_key = "ntn_live_key".to_string();
        assert!(!settings.has_placeholder_key());
        assert_eq!(settings.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn empty_webhook_token_disables_auth() {
        let settings = WebhookSettings {
            token: Some(String::new()),
        };
        assert_eq!(settings.required_token(), None);

        let settings = WebhookSettings {
            token: Some("s3cret".to_string()),
        };
        assert_eq!(settings.required_token(), Some("s3cret"));
    }

    #[test]
    fn environment_names_are_case_insensitive() {
        assert!(matches!(
            Environment::try_from("Production".to_string()),
            Ok(Environment::Production)
        ));
        assert!(Environment::try_from("staging".to_string()).is_err());
    }
}
