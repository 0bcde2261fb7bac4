use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tagbind::{
    Endpoint, Failure, Record, RecordedResponse, RequestBinder, RequestParts, ResponseWriter,
    Schema,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Record)]
struct Item {
    id: u32,
    name: String,
}

#[derive(Debug, Default, Schema)]
struct GetItem {
    #[tag(path = "id")]
    id: u32,
    #[tag(header = "X-Request-Id")]
    request_id: String,
}

#[derive(Default, Schema)]
struct GetItemResponse {
    #[tag(header = "X-Request-Id", code = "default")]
    request_id: String,
    #[tag(body = "json")]
    item: Option<Item>,
    #[tag(body = "text", code = "404")]
    not_found: Option<String>,
}

#[derive(Debug, Default, Schema)]
struct PostItem {
    #[tag(body = "json,required")]
    item: Item,
}

#[derive(Default, Schema)]
struct PostItemResponse {
    #[tag(body = "json", code = "201")]
    created: Option<Item>,
    #[tag(body = "text")]
    rejected: Option<Failure>,
}

type Store = Arc<Mutex<HashMap<u32, Item>>>;

fn store() -> Store {
    let mut items = HashMap::new();
    items.insert(
        1,
        Item {
            id: 1,
            name: "lamp".to_string(),
        },
    );
    Arc::new(Mutex::new(items))
}

#[test]
fn test_get_and_post_share_binder_and_writer() {
    let binder = RequestBinder::new();
    let writer = ResponseWriter::new();
    let items = store();

    let read = Arc::clone(&items);
    let get = Endpoint::new(&binder, writer.clone(), "/items/{id}", move |req: GetItem| {
        let found = read.lock().unwrap().get(&req.id).cloned();
        GetItemResponse {
            request_id: req.request_id,
            not_found: found.is_none().then(|| format!("no item {}", req.id)),
            item: found,
        }
    })
    .unwrap();

    let write = Arc::clone(&items);
    let post = Endpoint::new(&binder, writer, "/items", move |req: PostItem| {
        let mut items = write.lock().unwrap();
        if items.contains_key(&req.item.id) {
            return PostItemResponse {
                rejected: Some(Failure::new(format!("item {} exists", req.item.id))),
                ..Default::default()
            };
        }
        items.insert(req.item.id, req.item.clone());
        PostItemResponse {
            created: Some(req.item),
            ..Default::default()
        }
    })
    .unwrap();

    let mut sink = RecordedResponse::new();
    get.serve(
        &mut RequestParts::new("/items/1").header("X-Request-Id", "a"),
        &mut sink,
    )
    .unwrap();
    assert_eq!(sink.status, Some(200));
    assert_eq!(sink.header("x-request-id"), Some("a"));
    assert_eq!(sink.text(), r#"{"id":1,"name":"lamp"}"#);

    let mut sink = RecordedResponse::new();
    get.serve(&mut RequestParts::new("/items/2"), &mut sink)
        .unwrap();
    assert_eq!(sink.status, Some(404));
    assert_eq!(sink.text(), "no item 2");

    let mut sink = RecordedResponse::new();
    post.serve(
        &mut RequestParts::new("/items").body(r#"{"id":2,"name":"desk"}"#),
        &mut sink,
    )
    .unwrap();
    assert_eq!(sink.status, Some(201));
    assert!(items.lock().unwrap().contains_key(&2));

    let mut sink = RecordedResponse::new();
    post.serve(
        &mut RequestParts::new("/items").body(r#"{"id":2,"name":"desk"}"#),
        &mut sink,
    )
    .unwrap();
    assert_eq!(sink.status, Some(400));
    assert_eq!(sink.text(), "item 2 exists");

    // one plan per struct, one pattern per template
    assert_eq!(binder.schemas().request_plans(), 2);
    assert_eq!(binder.cached_patterns(), 2);
}

#[test]
fn test_missing_required_body_is_rejected() {
    let post = Endpoint::new(
        &RequestBinder::new(),
        ResponseWriter::new(),
        "/items",
        |req: PostItem| PostItemResponse {
            created: Some(req.item),
            ..Default::default()
        },
    )
    .unwrap();
    let mut sink = RecordedResponse::new();
    let err = post
        .serve(&mut RequestParts::new("/items"), &mut sink)
        .unwrap_err();
    assert_eq!(sink.status, Some(400));
    assert_eq!(sink.text(), err.to_string());
    assert_eq!(sink.text(), "required body key 'json' is missing");
}

#[test]
fn test_bad_path_is_a_bind_error() {
    let get = Endpoint::new(
        &RequestBinder::new(),
        ResponseWriter::new(),
        "/items/{id}",
        |_: GetItem| GetItemResponse::default(),
    )
    .unwrap();
    let mut sink = RecordedResponse::new();
    assert!(get
        .serve(&mut RequestParts::new("/items/1/extra"), &mut sink)
        .is_err());
    assert_eq!(sink.status, Some(400));
}
