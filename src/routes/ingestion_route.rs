use actix_web::{http::header, post, web, HttpRequest, HttpResponse};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::{
    configuration::WebhookSettings,
    domain::batch::IngestionOutcome,
    services::{ingest_leads, NotionDatabases, PageStore},
};

#[post("/lead-ingestion")]
async fn ingest_lead_batch(
    request: HttpRequest,
    body: web::Bytes,
    store: web::Data<dyn PageStore>,
    databases: web::Data<NotionDatabases>,
    webhook: web::Data<WebhookSettings>,
) -> HttpResponse {
    if let Some(token) = webhook.required_token() {
        if !is_authorized(&request, token) {
            log::warn!("Rejected lead ingestion request without a valid bearer token");
            return HttpResponse::Unauthorized().finish();
        }
    }

    // Anything that is not JSON falls through to the same rejection as an
    // empty batch.
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let outcome: IngestionOutcome = ingest_leads(store.get_ref(), &databases, &payload).await;

    HttpResponse::Ok().json(outcome)
}

type HmacSha256 = Hmac<Sha256>;

fn is_authorized(request: &HttpRequest, token: &str) -> bool {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .is_some_and(|presented| tokens_match(presented, token))
}

/// Credentials of an `Authorization` value using the bearer scheme, whose
/// name is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, credentials) = value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then_some(credentials.trim())
}

/// Compares MACs of both tokens keyed by the expected one, so the check
/// takes the same time wherever the first differing byte is.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let Ok(mut expected_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let expected_tag = expected_mac.finalize().into_bytes();

    let Ok(mut presented_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    presented_mac.update(presented.as_bytes());
    presented_mac.verify_slice(&expected_tag).is_ok()
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer s3cret"), Some("s3cret"));
        assert_eq!(bearer_token("bearer s3cret"), Some("s3cret"));
        assert_eq!(bearer_token("BEARER  s3cret "), Some("s3cret"));
        assert_eq!(bearer_token("Basic czNjcmV0"), None);
        assert_eq!(bearer_token("s3cret"), None);
    }

    #[test]
    fn tokens_must_match_exactly() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cre", "s3cret"));
        assert!(!tokens_match("s3cret!", "s3cret"));
        assert!(!tokens_match("", "s3cret"));
    }

    #[test]
    fn authorization_header_is_checked() {
        let lowercase = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer s3cret"))
            .to_http_request();
        let wrong = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer guess"))
            .to_http_request();
        let missing = TestRequest::default().to_http_request();

        assert!(is_authorized(&lowercase, "s3cret"));
        assert!(!is_authorized(&wrong, "s3cret"));
        assert!(!is_authorized(&missing, "s3cret"));
    }
}
