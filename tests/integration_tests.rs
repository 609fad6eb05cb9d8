use anyhow::Result;
use httpmock::prelude::*;
use prozorro_tenders::core::retry::RetryPolicy;
use prozorro_tenders::{AppConfig, EtlEngine, EtlError, LocalStorage, TenderPipeline};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn test_config(endpoint: String, output_path: &str) -> AppConfig {
    AppConfig {
        api_endpoint: endpoint,
        output_path: output_path.to_string(),
        page_delay: Duration::ZERO,
        retry: RetryPolicy {
            max_attempts: 2,
            rate_limit_delay: Duration::ZERO,
            error_delay: Duration::ZERO,
        },
        ..AppConfig::default()
    }
}

fn read_csv_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    assert!(bytes.starts_with(UTF8_BOM), "missing BOM in {:?}", path);
    Ok(String::from_utf8(bytes[UTF8_BOM.len()..].to_vec())?)
}

#[tokio::test]
async fn test_end_to_end_writes_both_tables() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/2.5/tenders")
            .query_param("buyer_identifier", "00034074")
            .query_param("date_modified_from", "2025-01-01")
            .query_param("date_modified_to", "2025-12-31T23:59:59")
            .query_param("descending", "true");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "data": [
                    {
                        "id": "a1",
                        "tenderID": "UA-2025-01-10-000001-a",
                        "title": "Дизельне паливо",
                        "value": {"amount": 100, "currency": "UAH"},
                        "items": [{"classification": {"id": "09130000-9", "description": "Нафта і дистиляти"}}],
                        "dateModified": "2025-01-10T09:00:00+02:00",
                        "status": "complete"
                    },
                    {
                        "id": "a2",
                        "tenderID": "UA-2025-02-11-000002-b",
                        "title": "Бензин А-95",
                        "value": {"amount": 200, "currency": "UAH"},
                        "items": [{"classification": {"id": "09130000-9", "description": "Нафта і дистиляти"}}],
                        "dateModified": "2025-02-11T09:00:00+02:00",
                        "status": "active"
                    },
                    {
                        "id": "a3",
                        "tenderID": "UA-2025-03-12-000003-c",
                        "value": {"amount": null},
                        "items": [],
                        "dateModified": "2025-03-12T09:00:00+02:00",
                        "status": "cancelled"
                    }
                ]
            }));
    });

    let config = test_config(server.url("/api/2.5/tenders"), &output_path);
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = TenderPipeline::new(storage, config)?;
    let engine = EtlEngine::new(pipeline);

    let written = engine.run().await?.expect("tenders should have been found");

    api_mock.assert();
    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("tenders_00034074_2025.csv"));
    assert!(written[1].ends_with("analytics_summary_00034074_2025.csv"));

    let tenders = read_csv_text(&temp_dir.path().join("tenders_00034074_2025.csv"))?;
    let lines: Vec<&str> = tenders.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "tenderID,id,title,value_amount,currency,category_code,category_desc,dateModified,status"
    );
    assert!(lines[1].starts_with("UA-2025-01-10-000001-a,a1,Дизельне паливо,100,UAH,09130000-9"));
    assert_eq!(
        lines[3],
        "UA-2025-03-12-000003-c,a3,Без назви,0,UAH,N/A,N/A,2025-03-12T09:00:00+02:00,cancelled"
    );

    let summary = read_csv_text(&temp_dir.path().join("analytics_summary_00034074_2025.csv"))?;
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(
        lines,
        vec![
            "category_code,category_desc,Кількість_тендерів,Загальна_сума,Середня_сума",
            "09130000-9,Нафта і дистиляти,2,300,150",
            "N/A,N/A,1,0,0",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_end_to_end_without_tenders_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/tenders");
        then.status(200).json_body(serde_json::json!({"data": []}));
    });

    let config = test_config(server.url("/tenders"), &output_path);
    let pipeline = TenderPipeline::new(LocalStorage::new(output_path.clone()), config)?;

    let outcome = EtlEngine::new(pipeline).run().await?;

    api_mock.assert();
    assert!(outcome.is_none());
    assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_rate_limited_until_budget_spent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/tenders");
        then.status(429).body("Too Many Requests");
    });

    let config = test_config(server.url("/tenders"), &output_path);
    let pipeline = TenderPipeline::new(LocalStorage::new(output_path.clone()), config)?;

    let outcome = EtlEngine::new(pipeline).run().await?;

    api_mock.assert_hits(2);
    assert!(outcome.is_none());
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_missing_date_modified_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/tenders");
        then.status(200).json_body(serde_json::json!({
            "data": [{"id": "x1", "tenderID": "UA-X", "value": {"amount": 10}}]
        }));
    });

    let config = test_config(server.url("/tenders"), &output_path);
    let pipeline = TenderPipeline::new(LocalStorage::new(output_path.clone()), config)?;

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::MissingFieldError { .. }));
    assert!(!temp_dir.path().join("tenders_00034074_2025.csv").exists());
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_malformed_json_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/tenders");
        then.status(200).body("not json");
    });

    let config = test_config(server.url("/tenders"), &output_path);
    let pipeline = TenderPipeline::new(LocalStorage::new(output_path.clone()), config)?;

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::SerializationError(_)));
    Ok(())
}
