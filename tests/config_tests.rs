use std::io::Write;
use tagbind::{
    load_config, ContentKind, RecordedResponse, RequestBinder, RequestParts, ResponseWriter,
    Schema,
};
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[derive(Debug, Default, Schema)]
struct Search {
    #[tag(q = "term")]
    term: String,
    #[tag(hdr = "Accept-Language")]
    lang: Option<String>,
}

#[derive(Default, Schema)]
struct SearchResult {
    #[tag(hdr = "X-Total", status = "default")]
    total: u32,
    #[tag(payload = "text", status = "206")]
    partial: Option<String>,
    #[tag(payload)]
    hits: Vec<String>,
}

#[test]
fn test_load_config_renames_tags() {
    let file = write_config(
        r"
binder:
  tags:
    query: q
    header: hdr
writer:
  tags:
    header: hdr
    body: payload
    code: status
  default_content_kind: text
",
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.writer.default_content_kind, ContentKind::Text);

    let binder = RequestBinder::builder().config(config.binder).build();
    let mut search = Search::default();
    binder
        .bind(
            &mut RequestParts::new("/search?term=rust").header("accept-language", "nb"),
            "/search",
            &mut search,
        )
        .unwrap();
    assert_eq!(search.term, "rust");
    assert_eq!(search.lang.as_deref(), Some("nb"));

    let writer = ResponseWriter::builder().config(config.writer).build();
    let mut sink = RecordedResponse::new();
    writer.write(
        &mut sink,
        &SearchResult {
            total: 2,
            hits: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        },
    );
    assert_eq!(sink.status, Some(200));
    assert_eq!(sink.header("X-Total"), Some("2"));
    assert_eq!(sink.header("Content-Type"), Some("text/plain"));
}

#[test]
fn test_load_config_rejects_bad_status() {
    let file = write_config("writer:\n  success_status: 1000\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("success_status"));
}

#[test]
fn test_load_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
