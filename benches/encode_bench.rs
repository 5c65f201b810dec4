use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sectab::{Database, SchemaSet};

fn registry() -> SchemaSet {
    SchemaSet::from_json(
        r#"[
        {
            "name": "bench",
            "tables": [
                {
                    "name": "entries",
                    "id": 2,
                    "fields": [
                        { "name": "value", "id": 1, "type": "float" },
                        { "name": "label", "id": 2, "type": "text" },
                        { "name": "count", "id": 3, "type": "signed_long" }
                    ]
                }
            ]
        }
    ]"#,
    )
    .unwrap()
}

fn populated(set: &SchemaSet, rows: usize) -> Database {
    let mut db = Database::from_registry(set, "bench").unwrap();
    let entries = db.table_mut("entries").unwrap();
    for i in 0..rows {
        let mut row = entries.new_row();
        row.set("value", i as f32 * 0.5).unwrap();
        row.set("label", format!("entry_{i}")).unwrap();
        row.set("count", i as i32).unwrap();
        entries.push(row);
    }
    db
}

fn bench_save(c: &mut Criterion) {
    let set = registry();
    let db = populated(&set, 1000);

    c.bench_function("save_1k_rows", |b| {
        b.iter(|| black_box(&db).save_to_vec().unwrap())
    });
}

fn bench_load(c: &mut Criterion) {
    let set = registry();
    let bytes = populated(&set, 1000).save_to_vec().unwrap();

    c.bench_function("load_1k_rows", |b| {
        b.iter(|| {
            let mut db = Database::from_registry(&set, "bench").unwrap();
            db.load_from_slice(black_box(&bytes)).unwrap();
            db
        })
    });
}

criterion_group!(benches, bench_save, bench_load);
criterion_main!(benches);
