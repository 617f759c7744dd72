use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::domain::property::Properties;

const NOTION_VERSION_HEADER: &str = "Notion-Version";

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Notion API returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Failed to decode Notion response: {0}")]
    Decode(String),
    #[error("Invalid Notion endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub name: Option<String>,
}

/// Body of a database query filtering on an exact title match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseQuery {
    pub filter: TitleFilter,
    pub page_size: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleFilter {
    pub property: String,
    pub title: TextCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextCondition {
    pub equals: String,
}

impl DatabaseQuery {
    /// First page whose title property equals `value` exactly.
    pub fn title_equals(property: &str, value: &str) -> Self {
        DatabaseQuery {
            filter: TitleFilter {
                property: property.to_string(),
                title: TextCondition {
                    equals: value.to_string(),
                },
            },
            page_size: 1,
        }
    }
}

/// Record operations the ingestion needs from the remote database.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
    ) -> Result<Page, NotionError>;

    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<Vec<Page>, NotionError>;

    async fn update_page(
        &self,
        page_id: &str,
        properties: &Properties,
    ) -> Result<Page, NotionError>;
}

#[derive(Serialize)]
struct DatabaseParent<'a> {
    database_id: &'a str,
}

#[derive(Serialize)]
struct CreatePageRequest<'a> {
    parent: DatabaseParent<'a>,
    properties: &'a Properties,
}

#[derive(Serialize)]
struct UpdatePageRequest<'a> {
    properties: &'a Properties,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

pub struct NotionClient {
    http_client: Client,
    base_url: Url,
    api_key: String,
    version: String,
}

impl NotionClient {
    pub fn new(
        base_url: Url,
        api_key: String,
        version: String,
        timeout: Option<Duration>,
    ) -> Result<Self, NotionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(NotionClient {
            http_client: builder.build()?,
            base_url,
            api_key,
            version,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, NotionError> {
        let url = self.base_url.join(path)?;

        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(NOTION_VERSION_HEADER, &self.version))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, NotionError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NotionError::Decode(e.to_string()))
    }

    /// Checks the credential by fetching the integration's own bot user.
    pub async fn me(&self) -> Result<BotUser, NotionError> {
        Self::send(self.request(Method::GET, "users/me")?).await
    }

    /// Creates a database under a page; `properties` is the raw schema map.
    pub async fn create_database(
        &self,
        parent_page_id: &str,
        title: &str,
        icon: &str,
        properties: Value,
    ) -> Result<Page, NotionError> {
        let body = create_database_body(parent_page_id, title, icon, properties);
        Self::send(self.request(Method::POST, "databases")?.json(&body)).await
    }
}

#[async_trait]
impl PageStore for NotionClient {
    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
    ) -> Result<Page, NotionError> {
        let body = CreatePageRequest {
            parent: DatabaseParent { database_id },
            properties,
        };
        Self::send(self.request(Method::POST, "pages")?.json(&body)).await
    }

    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<Vec<Page>, NotionError> {
        let path = format!("databases/{}/query", database_id);
        let response: QueryResponse =
            Self::send(self.request(Method::POST, &path)?.json(query)).await?;

        Ok(response.results)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: &Properties,
    ) -> Result<Page, NotionError> {
        let path = format!("pages/{}", page_id);
        let body = UpdatePageRequest { properties };
        Self::send(self.request(Method::PATCH, &path)?.json(&body)).await
    }
}

fn create_database_body(
    parent_page_id: &str,
    title: &str,
    icon: &str,
    properties: Value,
) -> Value {
    json!({
        "parent": {"type": "page_id", "page_id": parent_page_id},
        "icon": {"type": "emoji", "emoji": icon},
        "title": [{"type": "text", "text": {"content": title}}],
        "properties": properties,
    })
}

fn api_error(status: StatusCode, body: &str) -> NotionError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => NotionError::Api {
            status: status.as_u16(),
            code: error.code,
            message: error.message,
        },
        Err(_) => NotionError::Api {
            status: status.as_u16(),
            code: "unknown".to_string(),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body.to_string()
            },
        },
    }
}
