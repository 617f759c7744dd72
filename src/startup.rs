use std::{net::TcpListener, sync::Arc};

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::WebhookSettings,
    routes::{default_route, ingestion_route},
    services::{NotionDatabases, PageStore},
};

pub fn run(
    listener: TcpListener,
    store: Arc<dyn PageStore>,
    databases: NotionDatabases,
    webhook: WebhookSettings,
    max_body_bytes: usize,
) -> Result<Server, std::io::Error> {
    let store: web::Data<dyn PageStore> = web::Data::from(store);
    let databases = web::Data::new(databases);
    let webhook = web::Data::new(webhook);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::health)
            .service(web::scope("/webhook").service(ingestion_route::ingest_lead_batch))
            .app_data(store.clone())
            .app_data(databases.clone())
            .app_data(webhook.clone())
            .app_data(web::PayloadConfig::new(max_body_bytes))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
