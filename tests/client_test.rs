use chrono::{TimeZone, Utc};
use newswatch::client::decode_everything;
use newswatch::registry::normalize_keyword;
use newswatch::{ClientError, Error};

#[test]
fn decodes_a_successful_payload() {
    let body = r#"{
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": {"id": "bbc-news", "name": "BBC News"},
                "author": "A. Reporter",
                "title": "Election results are in",
                "description": "A long night of counting.",
                "url": "https://bbc.co.uk/elections",
                "publishedAt": "2024-01-15T10:30:00Z"
            },
            {
                "source": {"id": null, "name": "Wired"},
                "title": "Chips keep shrinking",
                "description": null,
                "url": "https://wired.com/chips",
                "publishedAt": "2024-01-14T08:00:00+01:00"
            }
        ]
    }"#;

    let records = decode_everything(body, "en").expect("payload should decode");
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].title, "Election results are in");
    assert_eq!(records[0].source_name, "BBC News");
    assert_eq!(records[0].language, "en");
    assert_eq!(
        records[0].published_at,
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    );

    // Offset timestamps are normalized to UTC.
    assert_eq!(
        records[1].published_at,
        Utc.with_ymd_and_hms(2024, 1, 14, 7, 0, 0).unwrap()
    );
    assert_eq!(records[1].description, None);
}

#[test]
fn drops_articles_with_missing_or_invalid_fields() {
    let body = r#"{
        "status": "ok",
        "articles": [
            {"source": {"name": "BBC News"}, "title": "Kept", "url": "https://x.test/a", "publishedAt": "2024-01-01T00:00:00Z"},
            {"source": {"name": "BBC News"}, "title": "", "url": "https://x.test/b", "publishedAt": "2024-01-01T00:00:00Z"},
            {"source": {"name": "BBC News"}, "title": "No url", "publishedAt": "2024-01-01T00:00:00Z"},
            {"source": {"name": "BBC News"}, "title": "Bad url", "url": "not-a-url", "publishedAt": "2024-01-01T00:00:00Z"},
            {"source": {"name": "BBC News"}, "title": "Bad date", "url": "https://x.test/c", "publishedAt": "yesterday"},
            {"source": {"name": "BBC News"}, "title": "No date", "url": "https://x.test/d"}
        ]
    }"#;

    let records = decode_everything(body, "en").expect("payload should decode");
    assert_eq!(records.len(), 1, "only the complete article survives");
    assert_eq!(records[0].title, "Kept");
}

#[test]
fn fills_defaults_for_source_and_language() {
    let body = r#"{
        "status": "ok",
        "articles": [
            {"title": "Anonymous piece", "url": "https://x.test/anon", "publishedAt": "2024-02-02T12:00:00Z"}
        ]
    }"#;

    let records = decode_everything(body, "de").expect("payload should decode");
    assert_eq!(records[0].source_name, "Unknown");
    assert_eq!(records[0].language, "de");
}

#[test]
fn provider_error_body_is_not_a_success() {
    let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"}"#;

    let err = decode_everything(body, "en").unwrap_err();
    match err {
        ClientError::Api { code, message } => {
            assert_eq!(code, "apiKeyInvalid");
            assert!(message.contains("invalid"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn malformed_json_is_a_bad_payload() {
    let err = decode_everything("<html>504</html>", "en").unwrap_err();
    assert!(
        matches!(err, ClientError::BadPayload(_)),
        "expected BadPayload, got {err:?}"
    );
}

#[test]
fn empty_article_list_is_a_success() {
    let body = r#"{"status": "ok", "totalResults": 0, "articles": []}"#;
    let records = decode_everything(body, "en").expect("empty result is not an error");
    assert!(records.is_empty());
}

#[test]
fn keywords_are_trimmed_and_validated() {
    assert_eq!(normalize_keyword("  Elections  ").unwrap(), "Elections");
    assert_eq!(
        normalize_keyword("rust programming").unwrap(),
        "rust programming"
    );

    assert!(matches!(normalize_keyword(""), Err(Error::InvalidKeyword)));
    assert!(matches!(normalize_keyword("   "), Err(Error::InvalidKeyword)));

    let max = "k".repeat(255);
    assert_eq!(normalize_keyword(&max).unwrap(), max);

    let too_long = "k".repeat(256);
    assert!(matches!(
        normalize_keyword(&too_long),
        Err(Error::InvalidKeyword)
    ));
}
