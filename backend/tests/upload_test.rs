//! End-to-end tests for `POST /masspay/api/upload` against an in-process service.

use actix_web::http::header::{
    HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE, IF_NONE_MATCH, RANGE,
};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{Duration, Local};
use common::model::upload::UploadResponse;
use masspay::services::masspay::configure_routes;
use masspay::AppConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

const BOUNDARY: &str = "----masspay-test-boundary";
const ACCOUNT: &str = "BG50FINV91501234567890";
const FILE_NAME: &str = "O123456p.dp7";

struct Upload<'a> {
    execution_date: &'a str,
    iban: &'a str,
    company_name: &'a str,
    file: Option<(&'a str, Vec<u8>)>,
}

impl<'a> Upload<'a> {
    fn with_file(content: &str) -> Self {
        Upload {
            execution_date: "20991231",
            iban: ACCOUNT,
            company_name: "Acme Ltd",
            file: Some((FILE_NAME, content.as_bytes().to_vec())),
        }
    }

    fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in [
            ("executionDate", self.execution_date),
            ("iban", self.iban),
            ("companyName", self.company_name),
        ] {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content)) = &self.file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}

fn config_in(root: &Path) -> AppConfig {
    AppConfig {
        temp_root: root.join("temp"),
        log_dir: None,
        ..AppConfig::default()
    }
}

async fn post(config: AppConfig, upload: &Upload<'_>) -> (StatusCode, Option<String>, Option<String>, Vec<u8>) {
    post_with_headers(config, upload, &[]).await
}

async fn post_with_headers(
    config: AppConfig,
    upload: &Upload<'_>,
    extra: &[(HeaderName, &str)],
) -> (StatusCode, Option<String>, Option<String>, Vec<u8>) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .service(configure_routes()),
    )
    .await;

    let mut req = test::TestRequest::post()
        .uri("/masspay/api/upload")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(upload.body());
    for (name, value) in extra {
        req = req.insert_header((name.clone(), *value));
    }

    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let header = |name: HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header(CONTENT_TYPE);
    let disposition = header(CONTENT_DISPOSITION);
    let body = test::read_body(resp).await.to_vec();
    (status, content_type, disposition, body)
}

fn json(body: &[u8]) -> UploadResponse {
    serde_json::from_slice(body).unwrap()
}

fn request_dirs(config: &AppConfig) -> Vec<PathBuf> {
    match fs::read_dir(&config.temp_root) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn record(reference: &str, amount: &str, tail: &str) -> String {
    format!("{reference}{amount:>13}{tail}")
}

#[actix_web::test]
async fn test_two_line_batch_produces_header_and_original_body() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());

    let l1 = record("PAY0000000000000000001A", "100.00", "BG80BNBG96611020345678");
    let l2 = record("PAY0000000000000000002B", "250.50", "JANE DOE");
    let content = format!("{l1}\r\n{l2}\r\n");

    let (status, content_type, disposition, body) =
        post(config.clone(), &Upload::with_file(&content)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    let disposition = disposition.unwrap();
    assert!(disposition.starts_with("attachment"), "{disposition}");
    assert!(disposition.contains(FILE_NAME), "{disposition}");

    let expected = format!(
        "OMPDP;31122099;{ACCOUNT};;ACME LTD;350.50;2;23A08358;\n{content}"
    );
    assert_eq!(String::from_utf8(body).unwrap(), expected);

    let dirs = request_dirs(&config);
    assert_eq!(dirs.len(), 1);
    assert!(dirs[0].join("input").join(FILE_NAME).is_file());
    assert!(dirs[0].join("output").join(FILE_NAME).is_file());
}

#[actix_web::test]
async fn test_overlong_lines_are_left_out_of_header_but_kept_in_body() {
    let root = tempfile::tempdir().unwrap();
    let long = record("PAY0000000000000000003C", "999.99", &"X".repeat(73));
    let short = record("PAY0000000000000000001A", "12.34", "");
    let content = format!("{short}\n{long}\n");

    let (status, _, _, body) = post(config_in(root.path()), &Upload::with_file(&content)).await;

    assert_eq!(status, StatusCode::OK);
    let body = String::from_utf8(body).unwrap();
    let (header, rest) = body.split_once('\n').unwrap();
    assert!(header.contains(";12.34;1;"), "{header}");
    assert_eq!(rest, content);
}

#[actix_web::test]
async fn test_range_and_conditional_headers_still_return_whole_artifact() {
    let root = tempfile::tempdir().unwrap();
    let content = format!("{}\n", record("PAY0000000000000000001A", "100.00", "TAIL"));
    let upload = Upload::with_file(&content);

    let (status, content_type, disposition, body) = post_with_headers(
        config_in(root.path()),
        &upload,
        &[
            (RANGE, "bytes=0-3"),
            (IF_NONE_MATCH, "*"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    assert!(disposition.unwrap().starts_with("attachment"));
    let body = String::from_utf8(body).unwrap();
    assert!(body.starts_with("OMPDP;31122099;"), "{body}");
    assert!(body.ends_with(&content), "{body}");
}

#[actix_web::test]
async fn test_today_is_accepted() {
    let root = tempfile::tempdir().unwrap();
    let today = Local::now().date_naive().format("%Y%m%d").to_string();
    let mut upload = Upload::with_file(&record("PAY0000000000000000001A", "1.00", ""));
    upload.execution_date = &today;

    let (status, _, _, _) = post(config_in(root.path()), &upload).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_past_date_is_rejected_without_side_effects() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    let yesterday = (Local::now().date_naive() - Duration::days(1))
        .format("%Y%m%d")
        .to_string();
    let mut upload = Upload::with_file("anything");
    upload.execution_date = &yesterday;

    let (status, content_type, _, body) = post(config.clone(), &upload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        json(&body),
        UploadResponse {
            success: false,
            msg: "The provided date is invalid or in the past".to_string(),
            file_url: None,
        }
    );
    assert!(!config.temp_root.exists());
}

#[actix_web::test]
async fn test_bad_account_id_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let mut upload = Upload::with_file("anything");
    upload.iban = "BG51FINV91501234567890";

    let (status, _, _, body) = post(config_in(root.path()), &upload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body).msg, "Invalid IBAN format");
}

#[actix_web::test]
async fn test_bad_file_name_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let mut upload = Upload::with_file("anything");
    upload.file = Some(("o123456p.dp7", b"anything".to_vec()));

    let (status, _, _, body) = post(config_in(root.path()), &upload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body).msg, "Invalid file name format");
}

#[actix_web::test]
async fn test_missing_file_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let mut upload = Upload::with_file("");
    upload.file = None;

    let (status, _, _, body) = post(config_in(root.path()), &upload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body).msg, "Invalid file");
}

#[actix_web::test]
async fn test_oversized_file_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let config = AppConfig {
        max_upload_bytes: 16,
        ..config_in(root.path())
    };
    let upload = Upload::with_file(&"1".repeat(64));

    let (status, _, _, body) = post(config, &upload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body).msg, "The uploaded file is too large");
}

#[actix_web::test]
async fn test_non_numeric_amount_fails_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    let content = format!(
        "{}\n{}\n",
        record("PAY0000000000000000001A", "100.00", ""),
        record("PAY0000000000000000002B", "ABC", "")
    );

    let (status, content_type, _, body) = post(config.clone(), &Upload::with_file(&content)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let response = json(&body);
    assert!(!response.success);
    assert_eq!(response.msg, "Failed to process file");
    assert!(request_dirs(&config).is_empty());
}

#[actix_web::test]
async fn test_unusable_temp_root_is_a_server_error() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    fs::write(&config.temp_root, b"not a directory").unwrap();

    let upload = Upload::with_file(&record("PAY0000000000000000001A", "1.00", ""));
    let (status, _, _, body) = post(config, &upload).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body).msg, "Failed to create directories");
}

#[actix_web::test]
async fn test_non_multipart_body_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config_in(root.path())))
            .service(configure_routes()),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/masspay/api/upload")
        .insert_header((CONTENT_TYPE, "text/plain"))
        .set_payload("hello")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = test::read_body(resp).await;
    assert_eq!(json(&body).msg, "Error parsing multipart form");
}
