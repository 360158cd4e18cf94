// ABOUTME: Spreadsheet CSV export with rate-limit retries
// ABOUTME: Exports one CSV per sheet, skipping sheets that keep failing

use crate::api::{truncate_str, ApiClient};
use crate::model::Spreadsheet;
use crate::retry::{AttemptError, RetryPolicy};
use crate::util::sanitize_filename;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pause inserted between sheet exports (not part of retry backoff).
pub const DEFAULT_SHEET_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SheetInfo {
    pub id: i64,
    pub title: String,
    pub index: i64,
}

/// Sheets of a spreadsheet in ascending index order.
pub fn sheet_infos(spreadsheet: &Spreadsheet) -> Vec<SheetInfo> {
    let mut sheets: Vec<SheetInfo> = spreadsheet
        .sheets
        .iter()
        .enumerate()
        .map(|(position, sheet)| {
            let props = sheet.properties.as_ref();
            SheetInfo {
                id: props.and_then(|p| p.sheet_id).unwrap_or_default(),
                title: props
                    .and_then(|p| p.title.clone())
                    .unwrap_or_else(|| "Untitled".into()),
                index: props.and_then(|p| p.index).unwrap_or(position as i64),
            }
        })
        .collect();
    sheets.sort_by_key(|s| s.index);
    sheets
}

/// Export a single sheet as CSV, retrying on rate limits and transient
/// failures. The backoff schedule doubles from one second per attempt.
pub fn export_sheet_csv(
    client: &ApiClient,
    spreadsheet_id: &str,
    sheet_id: i64,
    policy: &RetryPolicy,
) -> Result<String> {
    export_sheet_csv_with_sleep(client, spreadsheet_id, sheet_id, policy, &mut |d| {
        std::thread::sleep(d)
    })
}

fn export_sheet_csv_with_sleep(
    client: &ApiClient,
    spreadsheet_id: &str,
    sheet_id: i64,
    policy: &RetryPolicy,
    sleep: &mut dyn FnMut(Duration),
) -> Result<String> {
    let url = client.sheet_export_url(spreadsheet_id, sheet_id);

    let outcome = policy.run_with_sleep(
        |_attempt| match client.http_get(&url) {
            Ok((200, body)) => match String::from_utf8(body) {
                Ok(text) => Ok(text),
                Err(e) => Err(AttemptError::Transient(Error::InvalidInput(format!(
                    "sheet export returned invalid UTF-8: {e}"
                )))),
            },
            Ok((429, _)) => Err(AttemptError::RateLimited(Error::Api {
                endpoint: "spreadsheet export".into(),
                status: 429,
                message: "rate limited".into(),
            })),
            Ok((status, body)) => Err(AttemptError::Transient(Error::Api {
                endpoint: "spreadsheet export".into(),
                status,
                message: truncate_str(&String::from_utf8_lossy(&body), 100),
            })),
            Err(e) => Err(AttemptError::Transient(e)),
        },
        |err, delay| {
            if err.is_rate_limited() {
                eprintln!("Rate limited, retrying in {}s...", delay.as_secs());
            }
        },
        &mut *sleep,
    );

    outcome.map_err(|exhausted| Error::Exhausted {
        operation: "Sheet CSV export".into(),
        attempts: exhausted.attempts,
        last_error: Box::new(exhausted.last_error),
    })
}

/// Export every sheet of a spreadsheet to
/// `<output_dir>/<spreadsheet title>/<sheet title>.csv`. A sheet that keeps
/// failing is logged and skipped; the paths written successfully are
/// returned in sheet order.
pub fn export_spreadsheet_csv(
    client: &ApiClient,
    spreadsheet_id: &str,
    output_dir: &Path,
    policy: &RetryPolicy,
    sheet_delay: Duration,
) -> Result<Vec<PathBuf>> {
    export_spreadsheet_with_sleep(
        client,
        spreadsheet_id,
        output_dir,
        policy,
        sheet_delay,
        &mut |d| std::thread::sleep(d),
    )
}

fn export_spreadsheet_with_sleep(
    client: &ApiClient,
    spreadsheet_id: &str,
    output_dir: &Path,
    policy: &RetryPolicy,
    sheet_delay: Duration,
    sleep: &mut dyn FnMut(Duration),
) -> Result<Vec<PathBuf>> {
    let spreadsheet = client.get_spreadsheet(spreadsheet_id)?;
    let sheets = sheet_infos(&spreadsheet);

    let target_dir = output_dir.join(sanitize_filename(spreadsheet.title()));
    fs::create_dir_all(&target_dir)?;

    let total = sheets.len();
    let mut exported = Vec::new();

    for (position, sheet) in sheets.iter().enumerate() {
        // Steady-state pacing between sheets, separate from retry backoff.
        if position > 0 && !sheet_delay.is_zero() {
            sleep(sheet_delay);
        }

        eprintln!(
            "Exporting sheet {}/{}: {}...",
            position + 1,
            total,
            sheet.title
        );

        let path = target_dir.join(format!("{}.csv", sanitize_filename(&sheet.title)));
        let result = export_sheet_csv_with_sleep(client, spreadsheet_id, sheet.id, policy, &mut *sleep)
            .and_then(|csv| {
                fs::write(&path, csv)?;
                Ok(())
            });

        match result {
            Ok(()) => exported.push(path),
            Err(e) => eprintln!("Warning: Failed to export sheet '{}': {}", sheet.title, e),
        }
    }

    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spreadsheet(value: serde_json::Value) -> Spreadsheet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sheet_infos_sorted_by_index() {
        let spreadsheet = spreadsheet(json!({
            "sheets": [
                {"properties": {"sheetId": 2, "title": "Later", "index": 1}},
                {"properties": {"sheetId": 1, "title": "First", "index": 0}}
            ]
        }));
        let sheets = sheet_infos(&spreadsheet);
        assert_eq!(sheets[0].title, "First");
        assert_eq!(sheets[1].title, "Later");
    }

    #[test]
    fn test_sheet_infos_defaults() {
        let spreadsheet = spreadsheet(json!({"sheets": [{"properties": {"sheetId": 7}}]}));
        let sheets = sheet_infos(&spreadsheet);
        assert_eq!(sheets[0].title, "Untitled");
        assert_eq!(sheets[0].id, 7);
    }

    #[tokio::test]
    async fn test_export_sheet_retries_on_rate_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/s1/export"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/s1/export"))
            .and(query_param("format", "csv"))
            .and(query_param("gid", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let (result, slept) = tokio::task::spawn_blocking(move || {
            let client = ApiClient::new("token".into()).unwrap().with_base_url(uri);
            let mut slept = Vec::new();
            let result = export_sheet_csv_with_sleep(
                &client,
                "s1",
                0,
                &RetryPolicy::default(),
                &mut |d| slept.push(d),
            );
            (result, slept)
        })
        .await
        .unwrap();

        assert_eq!(result.unwrap(), "a,b\n1,2\n");
        assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_export_sheet_exhausts_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/s1/export"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            let client = ApiClient::new("token".into()).unwrap().with_base_url(uri);
            export_sheet_csv_with_sleep(&client, "s1", 0, &RetryPolicy::default(), &mut |_| {})
        })
        .await
        .unwrap();

        match result.unwrap_err() {
            Error::Exhausted { attempts, last_error, .. } => {
                assert_eq!(attempts, 5);
                assert!(last_error.to_string().contains("500"));
            }
            other => panic!("expected exhaustion, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_batch_export_skips_failing_sheet() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/book1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "book1",
                "properties": {"title": "Report: 2025"},
                "sheets": [
                    {"properties": {"sheetId": 10, "title": "A", "index": 0}},
                    {"properties": {"sheetId": 11, "title": "B", "index": 1}},
                    {"properties": {"sheetId": 12, "title": "C", "index": 2}}
                ]
            })))
            .mount(&server)
            .await;

        for (gid, template) in [
            ("10", ResponseTemplate::new(200).set_body_string("a\n")),
            ("11", ResponseTemplate::new(500)),
            ("12", ResponseTemplate::new(200).set_body_string("c\n")),
        ] {
            Mock::given(method("GET"))
                .and(path("/spreadsheets/d/book1/export"))
                .and(query_param("gid", gid))
                .respond_with(template)
                .mount(&server)
                .await;
        }

        let temp = TempDir::new().unwrap();
        let out_dir = temp.path().to_path_buf();
        let uri = server.uri();
        let exported = tokio::task::spawn_blocking(move || {
            let client = ApiClient::new("token".into()).unwrap().with_base_url(uri);
            export_spreadsheet_with_sleep(
                &client,
                "book1",
                &out_dir,
                &RetryPolicy::default(),
                DEFAULT_SHEET_DELAY,
                &mut |_| {},
            )
        })
        .await
        .unwrap()
        .unwrap();

        // Directory name sanitized, B skipped, order preserved.
        let expected_dir = temp.path().join("Report_ 2025");
        assert_eq!(
            exported,
            vec![expected_dir.join("A.csv"), expected_dir.join("C.csv")]
        );
        assert_eq!(fs::read_to_string(&exported[0]).unwrap(), "a\n");
        assert_eq!(fs::read_to_string(&exported[1]).unwrap(), "c\n");
        assert!(!expected_dir.join("B.csv").exists());
    }
}
