use super::*;
use crate::config::{BinderConfig, TagNames};
use crate::convert::ConversionRegistry;
use crate::error::{BindError, ConversionFailure, PathError, SchemaError};
use crate::reflect::Value;
use crate::schema::Location;
use crate::{Record, Schema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Record)]
struct Pet {
    name: String,
    age: u8,
}

#[derive(Debug, Default, PartialEq, Schema)]
struct GetUser {
    #[tag(path = "id")]
    id: u64,
    #[tag(query)]
    verbose: bool,
    #[tag(query = "fields")]
    fields: Vec<String>,
    #[tag(header = "X-Request-Id")]
    request_id: String,
    #[tag(header = "X-Trace")]
    trace: Option<String>,
    untouched: i32,
}

#[derive(Debug, Default, PartialEq, Schema)]
struct CreatePet {
    #[tag(body = "json")]
    pet: Pet,
    #[tag(query = "dryRun")]
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Schema)]
struct Paging {
    #[tag(query)]
    limit: u32,
    #[tag(query)]
    offset: u32,
}

#[derive(Debug, Default, PartialEq, Schema)]
struct ListPets {
    #[tag(query)]
    kind: String,
    #[embed]
    paging: Paging,
}

fn binder() -> RequestBinder {
    RequestBinder::new()
}

#[test]
fn test_bind_all_locations() {
    let mut req = RequestParts::new("/users/42?verbose=true&fields=name&fields=email")
        .header("X-Request-Id", "abc-1");
    let mut dest = GetUser {
        untouched: 7,
        ..Default::default()
    };
    binder().bind(&mut req, "/users/{id}", &mut dest).unwrap();
    assert_eq!(
        dest,
        GetUser {
            id: 42,
            verbose: true,
            fields: vec!["name".to_string(), "email".to_string()],
            request_id: "abc-1".to_string(),
            trace: None,
            untouched: 7,
        }
    );
}

#[test]
fn test_absent_values_leave_fields_untouched() {
    let mut req = RequestParts::new("/users/1");
    let mut dest = GetUser {
        request_id: "keep".to_string(),
        trace: Some("keep".to_string()),
        ..Default::default()
    };
    binder().bind(&mut req, "/users/{id}", &mut dest).unwrap();
    assert_eq!(dest.id, 1);
    assert_eq!(dest.request_id, "keep");
    assert_eq!(dest.trace.as_deref(), Some("keep"));
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let mut req = RequestParts::new("/users/1").header("x-trace", "t-9");
    let mut dest = GetUser::default();
    binder().bind(&mut req, "/users/{id}", &mut dest).unwrap();
    assert_eq!(dest.trace.as_deref(), Some("t-9"));
}

#[test]
fn test_multiple_values_into_scalar() {
    let mut req = RequestParts::new("/users/1?verbose=true&verbose=false");
    let mut dest = GetUser::default();
    let err = binder().bind(&mut req, "/users/{id}", &mut dest).unwrap_err();
    match err {
        BindError::MultipleValues {
            location,
            key,
            count,
        } => {
            assert_eq!(location, Location::Query);
            assert_eq!(key, "verbose");
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(dest, GetUser::default());
}

#[test]
fn test_conversion_failure_leaves_destination_untouched() {
    // `fields` and the header bind fine, `id` does not parse
    let mut req = RequestParts::new("/users/abc?fields=x").header("X-Request-Id", "r");
    let mut dest = GetUser::default();
    let err = binder().bind(&mut req, "/users/{id}", &mut dest).unwrap_err();
    match err {
        BindError::Conversion {
            location,
            key,
            source,
        } => {
            assert_eq!(location, Location::Path);
            assert_eq!(key, "id");
            assert_eq!(source.to, "u64");
            assert!(matches!(source.reason, ConversionFailure::Parse(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(dest, GetUser::default());
}

#[test]
fn test_path_mismatch() {
    let mut req = RequestParts::new("/accounts/1");
    let mut dest = GetUser::default();
    let err = binder().bind(&mut req, "/users/{id}", &mut dest).unwrap_err();
    assert!(matches!(err, BindError::Path(PathError::Mismatch { .. })));
    assert_eq!(
        err.to_string(),
        "uri '/accounts/1' does not match pattern '/users/{id}'"
    );
}

#[test]
fn test_template_ignored_without_path_fields() {
    let mut req = RequestParts::new("/anything?kind=cat&limit=5");
    let mut dest = ListPets::default();
    binder().bind(&mut req, "", &mut dest).unwrap();
    assert_eq!(dest.kind, "cat");
    assert_eq!(dest.paging.limit, 5);
    assert_eq!(dest.paging.offset, 0);
}

#[test]
fn test_empty_template_with_path_fields() {
    let mut req = RequestParts::new("/users/1");
    let mut dest = GetUser::default();
    let err = binder().bind(&mut req, "", &mut dest).unwrap_err();
    assert!(matches!(err, BindError::Path(PathError::EmptyTemplate)));
}

#[test]
fn test_json_body() {
    let mut req = RequestParts::new("/pets?dryRun=1").body(r#"{"name":"rex","age":3}"#);
    let mut dest = CreatePet::default();
    binder().bind(&mut req, "/pets", &mut dest).unwrap();
    assert_eq!(
        dest.pet,
        Pet {
            name: "rex".to_string(),
            age: 3
        }
    );
    assert!(dest.dry_run);
}

#[test]
fn test_missing_or_empty_body_is_skipped() {
    let original = Pet {
        name: "keep".to_string(),
        age: 1,
    };
    for mut req in [RequestParts::new("/pets"), RequestParts::new("/pets").body("")] {
        let mut dest = CreatePet {
            pet: original.clone(),
            dry_run: false,
        };
        binder().bind(&mut req, "/pets", &mut dest).unwrap();
        assert_eq!(dest.pet, original);
    }
}

#[test]
fn test_malformed_json_body() {
    let mut req = RequestParts::new("/pets?dryRun=true").body("{not json");
    let mut dest = CreatePet::default();
    let err = binder().bind(&mut req, "/pets", &mut dest).unwrap_err();
    assert!(matches!(
        err,
        BindError::Body {
            kind: crate::ContentKind::Json,
            ..
        }
    ));
    assert!(!dest.dry_run);
}

#[derive(Debug, Default, PartialEq, Schema)]
struct XmlUpload {
    #[tag(body = "xml")]
    pet: Pet,
}

#[test]
fn test_xml_body() {
    let mut req = RequestParts::new("/pets").body("<Pet><name>tom</name><age>7</age></Pet>");
    let mut dest = XmlUpload::default();
    binder().bind(&mut req, "/pets", &mut dest).unwrap();
    assert_eq!(dest.pet.name, "tom");
    assert_eq!(dest.pet.age, 7);
}

#[derive(Debug, Default, PartialEq, Schema)]
struct FormUpload {
    #[tag(body = "form")]
    pet: Pet,
}

#[test]
fn test_form_body_not_implemented() {
    let mut req = RequestParts::new("/pets").body("name=rex");
    let mut dest = FormUpload::default();
    let err = binder().bind(&mut req, "/pets", &mut dest).unwrap_err();
    assert!(matches!(err, BindError::NotImplemented(crate::ContentKind::Form)));
}

#[derive(Debug, Default, PartialEq, Schema)]
struct Required {
    #[tag(query = "q,required")]
    q: String,
}

#[test]
fn test_required_value_missing() {
    let mut req = RequestParts::new("/search");
    let mut dest = Required::default();
    let err = binder().bind(&mut req, "/search", &mut dest).unwrap_err();
    assert!(matches!(
        err,
        BindError::Missing {
            location: Location::Query,
            ..
        }
    ));
    assert_eq!(err.to_string(), "required query key 'q' is missing");

    let mut req = RequestParts::new("/search?q=rust");
    binder().bind(&mut req, "/search", &mut dest).unwrap();
    assert_eq!(dest.q, "rust");
}

#[derive(Debug, Default, PartialEq, Schema)]
struct Ambiguous {
    #[tag(query = "a", header = "A")]
    a: String,
}

#[test]
fn test_schema_error_is_surfaced() {
    let mut req = RequestParts::new("/");
    let mut dest = Ambiguous::default();
    let err = binder().bind(&mut req, "/", &mut dest).unwrap_err();
    assert!(matches!(
        err,
        BindError::Schema(SchemaError::MultipleLocations { .. })
    ));
}

#[derive(Debug, Default, PartialEq, Schema)]
struct Collections {
    #[tag(query = "ids")]
    ids: [u16; 3],
    #[tag(query = "tags")]
    tags: Option<Vec<String>>,
    #[tag(query = "extra")]
    extra: Value,
}

#[test]
fn test_list_like_destinations_receive_every_value() {
    let mut req = RequestParts::new("/?ids=1&ids=2&tags=a&tags=b&extra=x");
    let mut dest = Collections::default();
    binder().bind(&mut req, "/", &mut dest).unwrap();
    assert_eq!(dest.ids, [1, 2, 0]);
    assert_eq!(
        dest.tags,
        Some(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(dest.extra, Value::Str("x".to_string()));
}

#[test]
fn test_array_capacity_exceeded() {
    let mut req = RequestParts::new("/?ids=1&ids=2&ids=3&ids=4");
    let mut dest = Collections::default();
    let err = binder().bind(&mut req, "/", &mut dest).unwrap_err();
    match err {
        BindError::Conversion { source, .. } => assert!(matches!(
            source.reason,
            ConversionFailure::Capacity {
                len: 4,
                capacity: 3
            }
        )),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_http_request_source() {
    let mut req = http::Request::builder()
        .uri("http://localhost/users/9?fields=a%20b")
        .header("X-Request-Id", "h1")
        .body(Vec::new())
        .unwrap();
    let mut dest = GetUser::default();
    binder().bind(&mut req, "/users/{id}", &mut dest).unwrap();
    assert_eq!(dest.id, 9);
    assert_eq!(dest.fields, vec!["a b".to_string()]);
    assert_eq!(dest.request_id, "h1");
}

#[test]
fn test_non_utf8_header_values_are_kept() {
    let invalid = http::HeaderValue::from_bytes(b"\xffA").unwrap();

    let mut req = http::Request::builder()
        .uri("/users/9")
        .header("X-Request-Id", "a")
        .header("X-Request-Id", invalid.clone())
        .body(Vec::new())
        .unwrap();
    let mut dest = GetUser::default();
    let err = binder().bind(&mut req, "/users/{id}", &mut dest).unwrap_err();
    assert!(matches!(
        err,
        BindError::MultipleValues { location: Location::Header, count: 2, .. }
    ));
    assert_eq!(dest, GetUser::default());

    let mut req = http::Request::builder()
        .uri("/users/9")
        .header("X-Request-Id", invalid)
        .body(Vec::new())
        .unwrap();
    binder().bind(&mut req, "/users/{id}", &mut dest).unwrap();
    assert_eq!(dest.request_id, "\u{FFFD}A");
}

#[test]
fn test_with_path_compiles_eagerly() {
    let binder = binder();
    let err = binder.with_path("/a/{}").unwrap_err();
    assert!(matches!(err, PathError::EmptyPlaceholder { .. }));

    let bound = binder.with_path("/users/{id}").unwrap();
    assert_eq!(bound.template(), "/users/{id}");
    assert_eq!(binder.cached_patterns(), 1);

    let mut req = RequestParts::new("/users/5");
    let mut dest = GetUser::default();
    bound.bind(&mut req, &mut dest).unwrap();
    assert_eq!(dest.id, 5);
    assert_eq!(binder.cached_patterns(), 1);
}

#[test]
fn test_caches_are_shared_between_clones() {
    let binder = binder();
    let clone = binder.clone();
    let mut dest = GetUser::default();
    binder
        .bind(&mut RequestParts::new("/users/1"), "/users/{id}", &mut dest)
        .unwrap();
    clone
        .bind(&mut RequestParts::new("/users/2"), "/users/{id}", &mut dest)
        .unwrap();
    assert_eq!(dest.id, 2);
    assert_eq!(clone.schemas().request_plans(), 1);
    assert_eq!(clone.cached_patterns(), 1);
}

#[test]
fn test_custom_tag_names() {
    let config = BinderConfig {
        tags: TagNames {
            query: "q".to_string(),
            ..TagNames::default()
        },
    };

    #[derive(Debug, Default, Schema)]
    struct Custom {
        #[tag(q = "term")]
        term: String,
        #[tag(query = "ignored")]
        ignored: String,
    }

    let binder = RequestBinder::builder().config(config).build();
    let mut req = RequestParts::new("/?term=x&ignored=y");
    let mut dest = Custom::default();
    binder.bind(&mut req, "/", &mut dest).unwrap();
    assert_eq!(dest.term, "x");
    assert_eq!(dest.ignored, "");
}

#[test]
fn test_custom_registry_is_used() {
    let registry = ConversionRegistry::builder()
        .rule_fn(
            "yes-no->bool",
            |from, to| from == &crate::Shape::Str && to == &crate::Shape::Bool,
            |_, value, _| match value {
                Value::Str(s) => Ok(Value::Bool(s == "yes")),
                other => Ok(other),
            },
        )
        .build();
    let binder = RequestBinder::builder().registry(registry).build();
    let mut req = RequestParts::new("/users/1?verbose=yes");
    let mut dest = GetUser::default();
    binder.bind(&mut req, "/users/{id}", &mut dest).unwrap();
    assert!(dest.verbose);
}
