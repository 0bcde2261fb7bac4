use std::sync::{Arc, Barrier};
use std::thread;
use tagbind::{RecordedResponse, RequestBinder, RequestParts, ResponseWriter, Schema};

#[derive(Debug, Default, Schema)]
struct Lookup {
    #[tag(path = "shard")]
    shard: u8,
    #[tag(query = "key")]
    key: String,
}

#[derive(Default, Schema)]
struct LookupReply {
    #[tag(header = "X-Shard", code = "default")]
    shard: u8,
    #[tag(body = "text")]
    key: String,
}

const THREADS: usize = 8;
const ROUNDS: usize = 50;

#[test]
fn test_shared_binder_and_writer_across_threads() {
    let binder = RequestBinder::new();
    let writer = ResponseWriter::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let binder = binder.clone();
            let writer = writer.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let mut req = RequestParts::new(&format!("/shards/{t}?key=k{round}"));
                    let mut dest = Lookup::default();
                    binder.bind(&mut req, "/shards/{shard}", &mut dest).unwrap();
                    assert_eq!(usize::from(dest.shard), t);
                    assert_eq!(dest.key, format!("k{round}"));

                    let mut sink = RecordedResponse::new();
                    writer.write(
                        &mut sink,
                        &LookupReply {
                            shard: dest.shard,
                            key: dest.key,
                        },
                    );
                    assert_eq!(sink.text(), format!("k{round}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // every thread saw the same published plans
    assert_eq!(binder.schemas().request_plans(), 1);
    assert_eq!(writer.schemas().response_plans(), 1);
    assert_eq!(binder.cached_patterns(), 1);
}
