use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use socialid_kv::{ReadTx, RedbStore, WriteTx};

const BUCKETS: &[&str] = &["bench", "index"];

fn open(tmp: &TempDir) -> RedbStore {
    RedbStore::open(&tmp.path().join("bench.redb"), BUCKETS).unwrap()
}

fn populate(store: &RedbStore, n: usize) {
    store
        .update(|tx| {
            for i in 0..n {
                let key = format!("bench:key:{:04}", i);
                tx.put("bench", &key, b"hello world")?;
            }
            Ok::<_, socialid_kv::KVError>(())
        })
        .unwrap();
}

fn bench_put(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp);

    c.bench_function("redb_put", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("bench:key:{}", i);
            store
                .update(|tx| tx.put("bench", black_box(&key), black_box(b"hello world")))
                .unwrap();
            i += 1;
        });
    });
}

fn bench_get(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp);
    populate(&store, 1000);

    c.bench_function("redb_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("bench:key:{:04}", i % 1000);
            let _ = store.view(|tx| tx.get("bench", black_box(&key))).unwrap();
            i += 1;
        });
    });
}

fn bench_scan(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp);
    populate(&store, 1000);

    c.bench_function("redb_scan_1000", |b| {
        b.iter(|| {
            let results = store.view(|tx| tx.scan("bench", black_box("bench:key:"))).unwrap();
            assert_eq!(results.len(), 1000);
        });
    });
}

// Two buckets written in one transaction, the shape of an indexed insert.
fn bench_indexed_put(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp);

    c.bench_function("redb_indexed_put", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let id = format!("id-{}", i);
            let name = format!("name-{}", i);
            store
                .update(|tx| {
                    if tx.get("index", &name)?.is_none() {
                        tx.put("index", &name, id.as_bytes())?;
                    }
                    tx.put("bench", &id, b"{}")
                })
                .unwrap();
            i += 1;
        });
    });
}

criterion_group!(benches, bench_put, bench_get, bench_scan, bench_indexed_put);
criterion_main!(benches);
