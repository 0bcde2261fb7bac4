use super::*;
use crate::codec::ContentKind;
use crate::reflect::{Failure, RawJson};
use crate::Schema;
use std::sync::Barrier;
use std::thread;

#[derive(Default, Schema)]
struct Paging {
    #[tag(query)]
    limit: u32,
    #[tag(query = "start")]
    offset: u32,
}

#[derive(Default, Schema)]
struct ListUsers {
    #[tag(query)]
    user_name: String,
    #[tag(path)]
    group_id: u64,
    #[tag(header)]
    authorization: String,
    #[tag(header = "X-Trace,required")]
    trace: Option<String>,
    #[tag(body)]
    filter: RawJson,
    plain: bool,
    #[embed]
    paging: Paging,
}

fn keys<S: Schema>(plan: &RequestPlan<S>) -> Vec<(String, Location, String)> {
    plan.bindings()
        .iter()
        .map(|b| (b.field.display_path(), b.location, b.key.clone()))
        .collect()
}

#[test]
fn test_request_plan_keys_and_order() {
    let plan = RequestPlan::<ListUsers>::build(&TagNames::default()).unwrap();
    assert_eq!(
        keys(&plan),
        vec![
            ("user_name".to_string(), Location::Query, "userName".to_string()),
            ("group_id".to_string(), Location::Path, "groupId".to_string()),
            (
                "authorization".to_string(),
                Location::Header,
                "authorization".to_string()
            ),
            ("trace".to_string(), Location::Header, "X-Trace".to_string()),
            ("filter".to_string(), Location::Body, "json".to_string()),
            ("paging.limit".to_string(), Location::Query, "limit".to_string()),
            ("paging.offset".to_string(), Location::Query, "start".to_string()),
        ]
    );
    assert!(plan.uses_path());
    assert_eq!(plan.bindings()[4].content_kind, Some(ContentKind::Json));
    assert!(plan.bindings()[3].required);
    assert!(!plan.bindings()[0].required);
}

#[test]
fn test_plans_debug_as_binding_lists() {
    let plan = RequestPlan::<Paging>::build(&TagNames::default()).unwrap();
    assert_eq!(
        format!("{plan:?}"),
        r#"["limit <- query 'limit'", "offset <- query 'start'"]"#
    );
    let plan = ResponsePlan::<Reply>::build(&WriterConfig::default()).unwrap();
    assert!(format!("{plan:?}").contains(r#"total -> Header(\"X-Total\")"#));
}

#[derive(Default, Schema)]
struct TwoLocations {
    #[tag(query = "a", path = "a")]
    a: String,
}

#[test]
fn test_multiple_location_tags() {
    let err = RequestPlan::<TwoLocations>::build(&TagNames::default()).unwrap_err();
    assert!(matches!(err, SchemaError::MultipleLocations { ref field, .. } if field == "a"));
}

#[derive(Default, Schema)]
struct TextBody {
    #[tag(body = "text")]
    payload: String,
}

#[test]
fn test_request_body_kind_is_restricted() {
    let err = RequestPlan::<TextBody>::build(&TagNames::default()).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownBodyKind { ref kind, .. } if kind == "text"));
}

#[derive(Default, Schema)]
struct Inner {
    #[tag(query)]
    limit: u32,
}

#[derive(Default, Schema)]
struct Clashing {
    #[tag(query = "max")]
    limit: u32,
    #[embed]
    inner: Inner,
}

#[test]
fn test_embedded_name_collision() {
    let err = RequestPlan::<Clashing>::build(&TagNames::default()).unwrap_err();
    match err {
        SchemaError::DuplicateField {
            field,
            first,
            second,
            ..
        } => {
            assert_eq!(field, "limit");
            assert_eq!(first, "limit");
            assert_eq!(second, "inner.limit");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Default, Schema)]
struct Outer {
    #[embed]
    middle: Middle,
    #[tag(query)]
    top: u8,
}

#[derive(Default, Schema)]
struct Middle {
    #[embed]
    inner: Inner,
}

#[test]
fn test_nested_embedding_flattens_in_place() {
    let plan = RequestPlan::<Outer>::build(&TagNames::default()).unwrap();
    let paths: Vec<_> = plan.bindings().iter().map(|b| b.field.display_path()).collect();
    assert_eq!(paths, ["middle.inner.limit", "top"]);

    let mut value = Outer::default();
    let slot = plan.bindings()[0].field.slot_mut(&mut value).unwrap();
    let staged = slot.stage(crate::Value::Number(crate::reflect::Number::U32(9))).unwrap();
    slot.commit(staged);
    assert_eq!(value.middle.inner.limit, 9);
}

struct Handwritten {
    name: String,
}

impl Schema for Handwritten {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![FieldDescriptor::leaf(
            "name",
            "query:\"name",
            |s: &Self| &s.name,
            |s: &mut Self| &mut s.name,
        )]
    }
}

#[test]
fn test_malformed_tag_text() {
    let err = RequestPlan::<Handwritten>::build(&TagNames::default()).unwrap_err();
    assert!(matches!(err, SchemaError::MalformedTag { .. }));
    assert!(err.to_string().contains("unterminated"));
}

#[derive(Schema)]
struct Reply {
    #[tag(body = "json")]
    data: Option<Vec<u32>>,
    #[tag(body = "text", code = "404")]
    missing: String,
    #[tag(body)]
    error: Option<Failure>,
    #[tag(header = "X-Total", code = "default")]
    total: u64,
    #[tag(header)]
    etag: Option<String>,
}

#[test]
fn test_response_plan_targets_and_status() {
    let plan = ResponsePlan::<Reply>::build(&WriterConfig::default()).unwrap();
    let summary: Vec<_> = plan
        .bindings()
        .iter()
        .map(|b| (b.field.name(), b.target.clone(), b.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("data", Target::Body(ContentKind::Json), Status::Code(200)),
            ("missing", Target::Body(ContentKind::Text), Status::Code(404)),
            ("error", Target::Body(ContentKind::Json), Status::Code(400)),
            ("total", Target::Header("X-Total".to_string()), Status::AnyResponse),
            ("etag", Target::Header("etag".to_string()), Status::Code(200)),
        ]
    );
}

#[test]
fn test_response_defaults_follow_config() {
    let config = WriterConfig {
        default_content_kind: ContentKind::Xml,
        error_status: 500,
        success_status: 201,
        ..WriterConfig::default()
    };
    let plan = ResponsePlan::<Reply>::build(&config).unwrap();
    assert_eq!(plan.bindings()[0].status, Status::Code(201));
    assert_eq!(plan.bindings()[2].target, Target::Body(ContentKind::Xml));
    assert_eq!(plan.bindings()[2].status, Status::Code(500));
}

#[derive(Schema)]
struct BadCode {
    #[tag(body, code = "abc")]
    data: String,
}

#[derive(Schema)]
struct CodeOutOfRange {
    #[tag(body, code = "42")]
    data: String,
}

#[test]
fn test_invalid_status_code() {
    let err = ResponsePlan::<BadCode>::build(&WriterConfig::default()).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidStatusCode { ref code, .. } if code == "abc"));
    let err = ResponsePlan::<CodeOutOfRange>::build(&WriterConfig::default()).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidStatusCode { ref code, .. } if code == "42"));
}

#[derive(Schema)]
struct NoTarget {
    #[tag(code = "200")]
    data: String,
}

#[derive(Schema)]
struct BothTargets {
    #[tag(header, body)]
    data: String,
}

#[derive(Schema)]
struct ListHeader {
    #[tag(header = "X-Ids")]
    ids: Vec<u32>,
}

#[derive(Schema)]
struct FormReply {
    #[tag(body = "form")]
    data: String,
}

#[test]
fn test_response_location_errors() {
    let config = WriterConfig::default();
    assert!(matches!(
        ResponsePlan::<NoTarget>::build(&config).unwrap_err(),
        SchemaError::UndeterminedLocation { .. }
    ));
    assert!(matches!(
        ResponsePlan::<BothTargets>::build(&config).unwrap_err(),
        SchemaError::MultipleLocations { .. }
    ));
    let err = ResponsePlan::<ListHeader>::build(&config).unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedHeaderType { ref shape, .. } if shape == "Vec<u32>"));
    assert!(matches!(
        ResponsePlan::<FormReply>::build(&config).unwrap_err(),
        SchemaError::UnknownBodyKind { .. }
    ));
}

/// No `Reflect`, `Serialize` or `Deserialize`.
#[derive(Default)]
struct Opaque {
    _bytes: Vec<u8>,
}

#[derive(Default, Schema)]
struct WithOpaque {
    #[tag(query)]
    limit: u32,
    scratch: Opaque,
}

#[derive(Default, Schema)]
struct OpaqueReply {
    #[tag(body = "text")]
    message: String,
    scratch: Opaque,
}

#[test]
fn test_untagged_fields_need_no_reflect() {
    let fields = <WithOpaque as Schema>::fields();
    assert!(fields[1].shape().is_none());
    assert!(fields[1].slot(&WithOpaque::default()).is_none());

    let plan = RequestPlan::<WithOpaque>::build(&TagNames::default()).unwrap();
    let keys: Vec<_> = plan.bindings().iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, ["limit"]);

    let err = ResponsePlan::<OpaqueReply>::build(&WriterConfig::default()).unwrap_err();
    assert!(matches!(err, SchemaError::UndeterminedLocation { ref field, .. } if field == "scratch"));
}

#[test]
fn test_cache_returns_the_published_plan() {
    let cache = SchemaCache::new();
    let tags = TagNames::default();
    let first = cache.request::<ListUsers>(&tags).unwrap();
    let second = cache.request::<ListUsers>(&tags).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.request_plans(), 1);
    assert_eq!(cache.response_plans(), 0);

    let reply = cache.response::<Reply>(&WriterConfig::default()).unwrap();
    assert_eq!(reply.bindings().len(), 5);
    assert_eq!(cache.response_plans(), 1);
}

#[test]
fn test_cache_does_not_publish_failures() {
    let cache = SchemaCache::new();
    assert!(cache.request::<TwoLocations>(&TagNames::default()).is_err());
    assert!(cache.request::<TwoLocations>(&TagNames::default()).is_err());
    assert_eq!(cache.request_plans(), 0);
}

#[test]
fn test_concurrent_first_builds_converge() {
    let cache = Arc::new(SchemaCache::new());
    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.request::<ListUsers>(&TagNames::default()).unwrap()
            })
        })
        .collect();
    let plans: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for plan in &plans[1..] {
        assert!(Arc::ptr_eq(&plans[0], plan));
    }
    assert_eq!(cache.request_plans(), 1);
}

#[test]
fn test_struct_identity_keys_the_cache() {
    assert_ne!(
        <ListUsers as Schema>::shape().identity(),
        <Paging as Schema>::shape().identity()
    );
    assert!(<ListUsers as Schema>::shape()
        .identity()
        .ends_with("ListUsers"));
}
