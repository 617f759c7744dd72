use std::{
    net::TcpListener,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use intake::{
    configuration::{WebhookSettings, DEFAULT_MAX_BODY_BYTES},
    domain::property::{Properties, PropertyValue},
    services::{DatabaseQuery, NotionDatabases, NotionError, Page, PageStore},
    startup::run,
};

/// In-memory stand-in for the Notion API.
#[derive(Default)]
pub struct MemoryStore {
    pub pages: Mutex<Vec<(String, String, Properties)>>,
    pub calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn titles_in(&self, database_id: &str) -> Vec<String> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .filter(|(db, _, _)| db == database_id)
            .filter_map(|(_, _, properties)| {
                properties.values().find_map(|value| match value {
                    PropertyValue::Title(_) => value.plain_text(),
                    _ => None,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
    ) -> Result<Page, NotionError> {
        *self.calls.lock().unwrap() += 1;
        let mut pages = self.pages.lock().unwrap();
        let id = format!("page-{}", pages.len() + 1);
        pages.push((database_id.to_string(), id.clone(), properties.clone()));
        Ok(Page { id })
    }

    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<Vec<Page>, NotionError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|(db, _, properties)| {
                db == database_id
                    && properties
                        .get(&query.filter.property)
                        .and_then(|value| value.plain_text())
                        .as_deref()
                        == Some(query.filter.title.equals.as_str())
            })
            .take(query.page_size as usize)
            .map(|(_, id, _)| Page { id: id.clone() })
            .collect())
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: &Properties,
    ) -> Result<Page, NotionError> {
        *self.calls.lock().unwrap() += 1;
        let mut pages = self.pages.lock().unwrap();
        if let Some((_, _, existing)) = pages.iter_mut().find(|(_, id, _)| id == page_id) {
            existing.extend(properties.clone());
        }
        Ok(Page {
            id: page_id.to_string(),
        })
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_leads(&self, body: String, token: Option<&str>) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(format!("{}/webhook/lead-ingestion", self.address))
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }
}

pub fn databases() -> NotionDatabases {
    NotionDatabases {
        leads: "leads-db".to_string(),
        batches: "batches-db".to_string(),
    }
}

pub async fn spawn_app(token: Option<&str>) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let store = Arc::new(MemoryStore::default());

    let server = run(
        listener,
        store.clone(),
        databases(),
        WebhookSettings {
            token: token.map(str::to_string),
        },
        DEFAULT_MAX_BODY_BYTES,
    )
    .expect("Failed to bind address");
    tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        api_client: reqwest::Client::new(),
    }
}
