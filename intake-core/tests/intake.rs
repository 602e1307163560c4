#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end pipeline tests: form in, page out, ledger on disk.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::TimeZone;
use contact_intake_core::Clock;
use contact_intake_core::FormFields;
use contact_intake_core::Intake;
use contact_intake_core::IntakeError;
use contact_intake_core::IntakeRequest;
use contact_intake_core::Ledger;
use contact_intake_core::Outcome;
use contact_intake_core::ledger::DEFAULT_LEDGER_FILE;
use contact_intake_core::ledger::LEDGER_HEADER;
use pretty_assertions::assert_eq;

struct FixedClock(DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

fn fixed_clock() -> FixedClock {
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    FixedClock(tokyo.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap())
}

fn intake_in(dir: &Path) -> Intake {
    Intake::new(Ledger::in_dir(dir.join("data"), DEFAULT_LEDGER_FILE))
}

fn form(pairs: &[(&str, &str)]) -> FormFields {
    pairs.iter().map(|&(k, v)| (k, v)).collect()
}

fn tanaka() -> FormFields {
    form(&[
        ("name", "田中"),
        ("email", "tanaka@example.com"),
        ("tel", ""),
        ("type", "相談"),
        ("message", "よろしくお願いします"),
        ("company", ""),
    ])
}

/// All rows including the header.
fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn header_row() -> Vec<String> {
    LEDGER_HEADER.iter().map(|h| (*h).to_string()).collect()
}

#[test]
fn tanaka_scenario_is_accepted_and_recorded() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path()).with_clock(fixed_clock());

    let request = IntakeRequest::post(tanaka())
        .with_remote_addr("192.0.2.10")
        .with_user_agent("Mozilla/5.0");
    let response = intake.handle(&request);

    assert_eq!(response.status, 200);
    assert!(response.body.contains("田中"));
    assert!(response.body.contains("tanaka@example.com"));
    assert!(response.body.contains("相談"));

    let rows = read_rows(intake.ledger().path());
    assert_eq!(
        rows,
        vec![
            header_row(),
            vec![
                "2026-10-18T09:30:00+09:00".to_string(),
                "田中".to_string(),
                "tanaka@example.com".to_string(),
                String::new(),
                "相談".to_string(),
                "よろしくお願いします".to_string(),
                "192.0.2.10".to_string(),
                "Mozilla/5.0".to_string(),
            ],
        ]
    );
}

#[test]
fn wall_clock_timestamp_is_iso8601_with_offset() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());

    assert_eq!(intake.handle(&IntakeRequest::post(tanaka())).status, 200);

    let rows = read_rows(intake.ledger().path());
    let created_at = &rows[1][0];
    assert!(!created_at.is_empty());
    let parsed = DateTime::parse_from_rfc3339(created_at).unwrap();
    assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
    assert!(created_at.ends_with("+09:00"));
}

#[test]
fn non_post_methods_are_rejected_without_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());

    for method in ["GET", "PUT", "DELETE", "HEAD", "post"] {
        let response = intake.handle(&IntakeRequest::new(method, tanaka()));
        assert_eq!(response.status, 400, "{method}");
        assert!(response.body.contains("不正なアクセスです。"), "{method}");
    }
    assert!(!intake.ledger().path().exists());
}

#[test]
fn honeypot_rejects_even_valid_submissions() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());
    let mut fields = tanaka();
    fields.insert("company", "Spam Inc.");

    let response = intake.handle(&IntakeRequest::post(fields));

    assert_eq!(response.status, 400);
    assert!(response.body.contains("送信に失敗しました。"));
    assert!(!intake.ledger().path().exists());
}

#[test]
fn honeypot_runs_before_field_validation() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());

    let outcome = intake.process(&IntakeRequest::post(form(&[("company", "x")])));
    assert!(matches!(
        outcome,
        Outcome::Rejected(IntakeError::BotSuspected)
    ));
}

#[test]
fn missing_required_fields_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());

    for key in ["name", "email", "type", "message"] {
        let mut fields = tanaka();
        fields.insert(key, "   ");
        let response = intake.handle(&IntakeRequest::post(fields));
        assert_eq!(response.status, 400, "{key}");
        assert!(response.body.contains("必須項目が未入力です。"), "{key}");
    }
    assert!(!intake.ledger().path().exists());
}

#[test]
fn invalid_email_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());
    let mut fields = tanaka();
    fields.insert("email", "not-an-email");

    let response = intake.handle(&IntakeRequest::post(fields));

    assert_eq!(response.status, 400);
    assert!(response.body.contains("メールアドレスの形式が正しくありません。"));
}

#[test]
fn long_fields_are_truncated_in_page_and_ledger() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());
    let mut fields = tanaka();
    fields.insert("name", "あ".repeat(200));
    fields.insert("message", "m".repeat(5000));

    let response = intake.handle(&IntakeRequest::post(fields));
    assert_eq!(response.status, 200);
    assert!(response.body.contains(&"あ".repeat(120)));
    assert!(!response.body.contains(&"あ".repeat(121)));

    let rows = read_rows(intake.ledger().path());
    assert_eq!(rows[1][1].chars().count(), 120);
    assert_eq!(rows[1][5].chars().count(), 4000);
}

#[test]
fn echoed_fields_are_html_escaped() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path());
    let mut fields = tanaka();
    fields.insert("name", "<script>alert(1)</script>");
    fields.insert("type", "\"quoted\" & 'single'");

    let response = intake.handle(&IntakeRequest::post(fields));

    assert_eq!(response.status, 200);
    assert!(!response.body.contains("<script>"));
    assert!(response.body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(response.body.contains("&quot;quoted&quot; &amp; &#039;single&#039;"));

    // The ledger keeps the raw text.
    let rows = read_rows(intake.ledger().path());
    assert_eq!(rows[1][1], "<script>alert(1)</script>");
}

#[test]
fn sequential_submissions_round_trip_through_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let intake = intake_in(tmp.path()).with_clock(fixed_clock());
    let messages = [
        "plain",
        "comma, separated",
        "line one\r\nline two",
        "\"quoted\"",
        "  padded  ",
    ];

    for (i, message) in messages.iter().enumerate() {
        let mut fields = tanaka();
        fields.insert("name", format!("user {i}"));
        fields.insert("tel", "03-1234-5678");
        fields.insert("message", *message);
        let response = intake.handle(&IntakeRequest::post(fields).with_remote_addr("::1"));
        assert_eq!(response.status, 200);
    }

    let rows = read_rows(intake.ledger().path());
    assert_eq!(rows.len(), messages.len() + 1);
    assert_eq!(rows[0], header_row());
    let expected_messages = [
        "plain",
        "comma, separated",
        "line one\nline two",
        "\"quoted\"",
        "padded",
    ];
    for (i, row) in rows[1..].iter().enumerate() {
        assert_eq!(row.len(), 8);
        assert_eq!(row[0], "2026-10-18T09:30:00+09:00");
        assert_eq!(row[1], format!("user {i}"));
        assert_eq!(row[2], "tanaka@example.com");
        assert_eq!(row[3], "03-1234-5678");
        assert_eq!(row[4], "相談");
        assert_eq!(row[5], expected_messages[i]);
        assert_eq!(row[6], "::1");
        assert_eq!(row[7], "");
    }
}

#[test]
fn concurrent_submissions_write_one_header_and_every_row() {
    const WRITERS: usize = 16;
    const PER_WRITER: usize = 8;

    let tmp = tempfile::tempdir().unwrap();
    let intake = Arc::new(intake_in(tmp.path()));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let intake = Arc::clone(&intake);
            thread::spawn(move || {
                for i in 0..PER_WRITER {
                    let mut fields = tanaka();
                    fields.insert("name", format!("writer-{w}-{i}"));
                    fields.insert("message", "x".repeat(3000));
                    let response = intake.handle(&IntakeRequest::post(fields));
                    assert_eq!(response.status, 200);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let rows = read_rows(intake.ledger().path());
    assert_eq!(rows[0], header_row());
    assert_eq!(rows.len(), WRITERS * PER_WRITER + 1);
    assert_eq!(rows.iter().filter(|r| r[0] == "created_at").count(), 1);

    let mut names: Vec<&str> = rows[1..].iter().map(|r| r[1].as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), WRITERS * PER_WRITER);
    assert!(rows[1..].iter().all(|r| r.len() == 8 && r[5].len() == 3000));
}

#[test]
fn storage_failure_is_reported_as_bad_request() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("data"), "blocker").unwrap();
    let intake = intake_in(tmp.path());

    let response = intake.handle(&IntakeRequest::post(tanaka()));

    assert_eq!(response.status, 400);
    assert!(response.body.contains("サーバ側で保存フォルダを作成できませんでした。"));
}
