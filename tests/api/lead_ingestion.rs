use serde_json::{json, Value};

use crate::helpers::spawn_app;

#[tokio::test]
async fn ingesting_a_batch_returns_summary_and_writes_records() {
    let app = spawn_app(None).await;
    let body = json!({
        "batch_id": "BATCH-2025-02-01-TEST",
        "leads": [
            {"company_name": "Gauteng Express Logistics (Pty) Ltd", "province": "Gauteng", "fleet_likelihood": 9},
            {"company_name": "Durban QuickFix Plumbing", "website": null, "tracking_need": 0},
        ]
    });

    let response = app.post_leads(body.to_string(), None).await;

    assert_eq!(200, response.status().as_u16());
    let summary: Value = response.json().await.unwrap();
    assert_eq!(
        summary,
        json!({
            "status": "success",
            "batch_id": "BATCH-2025-02-01-TEST",
            "leads_found": 2,
            "leads_created": 2,
            "duplicates_skipped": 0,
            "errors": [],
        })
    );
    assert_eq!(
        app.store.titles_in("leads-db"),
        vec![
            "Gauteng Express Logistics (Pty) Ltd".to_string(),
            "Durban QuickFix Plumbing".to_string()
        ]
    );
    assert_eq!(app.store.titles_in("batches-db").len(), 1);
}

#[tokio::test]
async fn resending_a_batch_skips_known_companies() {
    let app = spawn_app(None).await;
    let body = json!({
        "batch_id": "BATCH-1",
        "leads": [{"company_name": "Acme"}]
    })
    .to_string();

    app.post_leads(body.clone(), None).await;
    let summary: Value = app.post_leads(body, None).await.json().await.unwrap();

    assert_eq!(summary["status"], "success");
    assert_eq!(summary["leads_created"], 0);
    assert_eq!(summary["duplicates_skipped"], 1);
    assert_eq!(app.store.titles_in("leads-db").len(), 1);
    assert_eq!(app.store.titles_in("batches-db").len(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_rejected_without_calls() {
    let app = spawn_app(None).await;
    let bodies = [
        json!({"batch_id": "BATCH-1", "leads": []}).to_string(),
        json!({"leads": [{"company_name": "Acme"}]}).to_string(),
        "not json at all".to_string(),
    ];

    for body in bodies {
        let response = app.post_leads(body.clone(), None).await;

        assert_eq!(200, response.status().as_u16(), "{}", body);
        let outcome: Value = response.json().await.unwrap();
        assert_eq!(
            outcome,
            json!({"status": "error", "message": "Invalid payload"}),
            "{}",
            body
        );
    }
    assert_eq!(*app.store.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn configured_token_is_required() {
    let app = spawn_app(Some("s3cret")).await;
    let body = json!({"batch_id": "BATCH-1", "leads": [{"company_name": "Acme"}]}).to_string();

    let missing = app.post_leads(body.clone(), None).await;
    let wrong = app.post_leads(body.clone(), Some("guess")).await;

    assert_eq!(401, missing.status().as_u16());
    assert_eq!(401, wrong.status().as_u16());
    assert_eq!(*app.store.calls.lock().unwrap(), 0);

    let accepted = app.post_leads(body, Some("s3cret")).await;
    assert_eq!(200, accepted.status().as_u16());
    assert_eq!(app.store.titles_in("leads-db"), vec!["Acme".to_string()]);
}

#[tokio::test]
async fn large_batches_get_a_summary() {
    let app = spawn_app(None).await;
    let summary_text = "Operates refrigerated panel vans across Gauteng. ".repeat(40);
    let leads: Vec<Value> = (0..150)
        .map(|i| {
            json!({
                "company_name": format!("Fleet Operator {}", i),
                "prospect_summary": summary_text,
                "fleet_assessment": summary_text,
            })
        })
        .collect();
    let body = json!({"batch_id": "BATCH-LARGE", "leads": leads}).to_string();
    assert!(body.len() > 256 * 1024);

    let response = app.post_leads(body, None).await;

    assert_eq!(200, response.status().as_u16());
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["status"], "success");
    assert_eq!(summary["leads_found"], 150);
    assert_eq!(summary["leads_created"], 150);
}

#[tokio::test]
async fn bearer_scheme_name_is_case_insensitive() {
    let app = spawn_app(Some("s3cret")).await;
    let body = json!({"batch_id": "BATCH-1", "leads": [{"company_name": "Acme"}]}).to_string();

    let response = app
        .api_client
        .post(format!("{}/webhook/lead-ingestion", app.address))
        .header("Content-Type", "application/json")
        .header("Authorization", "bearer s3cret")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    assert_eq!(app.store.titles_in("leads-db"), vec!["Acme".to_string()]);
}
