mod helpers;

use helpers::TABLE;
use kvdns_application::ports::{KvStore, RangeRequest, TxnOp, TxnRequest};
use kvdns_domain::KeyRange;
use kvdns_infrastructure::kv::MemoryKvStore;
use std::io::Write;
use std::sync::Arc;

#[tokio::test]
async fn test_txn_sees_one_snapshot_under_concurrent_writes() {
    let store = Arc::new(MemoryKvStore::new());
    store.put(TABLE, "/a", "0");
    store.put(TABLE, "/b", "0");

    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for i in 1..=500u32 {
                // Two puts publish two snapshots; readers may see either, never a mix
                // of a newer "/b" with an older "/a".
                store.put(TABLE, "/a", i.to_string());
                store.put(TABLE, "/b", i.to_string());
                tokio::task::yield_now().await;
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let response = store
                        .txn(TxnRequest {
                            table: Arc::from(TABLE),
                            ops: vec![TxnOp::get("/a"), TxnOp::get("/b")],
                        })
                        .await
                        .unwrap();
                    let a: u32 = String::from_utf8_lossy(&response.responses[0].kvs[0].value)
                        .parse()
                        .unwrap();
                    let b: u32 = String::from_utf8_lossy(&response.responses[1].kvs[0].value)
                        .parse()
                        .unwrap();
                    assert!(a == b || a == b + 1, "a={a} b={b}");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_seed_file_is_served() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"{TABLE}": {{"/com/example/api": {{"address": "10.0.0.1"}}, "/com/example/web#A": {{"host": "10.0.0.2", "ttl": 60}}}}}}"#
    )
    .unwrap();

    let store = MemoryKvStore::from_seed_file(file.path()).unwrap();
    let response = store
        .range(RangeRequest {
            table: Arc::from(TABLE),
            range: KeyRange::exact("/com/example/api"),
            limit: None,
            keys_only: false,
        })
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&response.kvs[0].value).unwrap();
    assert_eq!(value["address"], "10.0.0.1");
    assert_eq!(store.len(TABLE), 2);
}

#[test]
fn test_missing_seed_file_is_io_error() {
    let result = MemoryKvStore::from_seed_file("/nonexistent/kvdns-seed.json");

    assert!(matches!(result, Err(kvdns_domain::DomainError::IoError(_))));
}
