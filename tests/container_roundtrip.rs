use sectab::{
    CompositeValue, Database, FormatError, SchemaSet, Value, END_SENTINEL,
};
use std::fs::File;
use std::io::Write;
use tempfile::NamedTempFile;

fn registry() -> SchemaSet {
    SchemaSet::from_json(
        r#"[
        {
            "name": "garage",
            "types": [
                {
                    "name": "Shops",
                    "layout": {
                        "grouped": {
                            "names": ["tyres", "fuel", "paint", "parts", "tuning"],
                            "base": { "bits": { "count": 5 } }
                        }
                    }
                },
                {
                    "name": "Gear",
                    "layout": {
                        "fields": [
                            { "name": "ratio", "id": 1, "type": "float" },
                            { "name": "label", "id": 2, "type": "short_text" }
                        ]
                    }
                }
            ],
            "tables": [
                {
                    "name": "cars",
                    "id": 2,
                    "fields": [
                        { "name": "speed", "id": 1, "type": "float" },
                        { "name": "model", "id": 2, "type": "text" },
                        { "name": "shops", "id": 3, "type": { "named": { "name": "Shops" } } },
                        { "name": "gears", "id": 4, "type": { "named": { "name": "Gear[]" } } }
                    ]
                },
                {
                    "name": "laps",
                    "id": 3,
                    "fields": [
                        { "name": "time", "id": 1, "type": "float" },
                        { "name": "sectors", "id": 2, "type": { "list": { "elem": "float", "count": 3 } } }
                    ]
                }
            ]
        },
        {
            "name": "minimal",
            "tables": [
                {
                    "name": "entries",
                    "id": 2,
                    "fields": [
                        { "name": "f", "id": 1, "type": "float" },
                        { "name": "s", "id": 2, "type": "text" }
                    ]
                }
            ]
        }
    ]"#,
    )
    .unwrap()
}

fn populated_garage(set: &SchemaSet) -> Database {
    let mut db = Database::from_registry(set, "garage").unwrap();

    let shops_ty = db.ty().composite("Shops").unwrap().clone();
    let gear_ty = db.ty().composite("Gear").unwrap().clone();

    let cars = db.table_mut("cars").unwrap();
    let mut car = cars.new_row();
    car.set("speed", 241.5f32).unwrap();
    car.set("model", "Kestrel GT").unwrap();

    let mut shops = CompositeValue::new(&shops_ty);
    for (name, open) in [
        ("tyres", true),
        ("fuel", false),
        ("paint", false),
        ("parts", true),
        ("tuning", false),
    ] {
        shops.set(name, open).unwrap();
    }
    car.set("shops", Value::Composite(shops)).unwrap();

    let mut gears = Vec::new();
    for (ratio, label) in [(3.2f32, "1st"), (2.1, "2nd"), (1.4, "3rd")] {
        let mut gear = CompositeValue::new(&gear_ty);
        gear.set("ratio", ratio).unwrap();
        gear.set("label", label).unwrap();
        gears.push(Value::Composite(gear));
    }
    car.set("gears", gears).unwrap();
    cars.push(car);

    let laps = db.table_mut("laps").unwrap();
    for (time, sectors) in [
        (61.25f32, [20.5f32, 19.75, 21.0]),
        (f32::NAN, [20.0, 20.0, 20.0]),
    ] {
        let mut lap = laps.new_row();
        lap.set("time", time).unwrap();
        lap.set(
            "sectors",
            sectors.iter().map(|&s| Value::Float(s)).collect::<Vec<_>>(),
        )
        .unwrap();
        laps.push(lap);
    }

    db
}

#[test]
fn float_and_text_row_roundtrip() {
    let set = registry();
    let mut db = Database::from_registry(&set, "minimal").unwrap();

    let entries = db.table_mut("entries").unwrap();
    let mut row = entries.new_row();
    row.set("f", 3.5f32).unwrap();
    row.set("s", "hi").unwrap();
    entries.push(row);

    let bytes = db.save_to_vec().unwrap();

    let mut fresh = Database::from_registry(&set, "minimal").unwrap();
    fresh.load_from_slice(&bytes).unwrap();

    let loaded = &fresh.table("entries").unwrap().rows()[0];
    assert_eq!(loaded.get("f").unwrap().as_f32(), Some(3.5));
    assert_eq!(loaded.get("s").unwrap().as_str(), Some("hi"));
    assert_eq!(fresh, db);
}

#[test]
fn corrupted_sentinel_is_rejected() {
    let set = registry();
    let mut db = Database::from_registry(&set, "minimal").unwrap();
    let entries = db.table_mut("entries").unwrap();
    let mut row = entries.new_row();
    row.set("f", 1.0f32).unwrap();
    row.set("s", "ok").unwrap();
    entries.push(row);

    let mut bytes = db.save_to_vec().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let mut fresh = Database::from_registry(&set, "minimal").unwrap();
    let result = fresh.load_from_slice(&bytes);
    assert!(matches!(
        result,
        Err(FormatError::SentinelMismatch { .. })
    ));
}

#[test]
fn corrupted_root_id_is_rejected() {
    let set = registry();
    let db = Database::from_registry(&set, "minimal").unwrap();
    let mut bytes = db.save_to_vec().unwrap();
    bytes[0] = 0x7E;

    let mut fresh = Database::from_registry(&set, "minimal").unwrap();
    assert!(matches!(
        fresh.load_from_slice(&bytes),
        Err(FormatError::Section(_))
    ));
}

#[test]
fn shop_flags_roundtrip_exactly() {
    let set = registry();
    let db = populated_garage(&set);
    let bytes = db.save_to_vec().unwrap();

    let mut fresh = Database::from_registry(&set, "garage").unwrap();
    fresh.load_from_slice(&bytes).unwrap();

    let car = &fresh.table("cars").unwrap().rows()[0];
    let shops = car.get("shops").unwrap().as_composite().unwrap();
    let flags: Vec<bool> = ["tyres", "fuel", "paint", "parts", "tuning"]
        .iter()
        .map(|name| shops.get(name).unwrap().as_bool().unwrap())
        .collect();
    assert_eq!(flags, [true, false, false, true, false]);
}

#[test]
fn full_database_roundtrip_with_nan_equality() {
    let set = registry();
    let db = populated_garage(&set);
    let bytes = db.save_to_vec().unwrap();

    let mut fresh = Database::from_registry(&set, "garage").unwrap();
    fresh.load_from_slice(&bytes).unwrap();

    // The NaN lap time survives the round trip and still compares equal.
    assert!(fresh.table("laps").unwrap().rows()[1]
        .get("time")
        .unwrap()
        .as_f32()
        .unwrap()
        .is_nan());
    assert_eq!(fresh, db);
}

#[test]
fn file_backed_roundtrip() {
    let set = registry();
    let db = populated_garage(&set);

    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    {
        let mut file = File::create(&path).unwrap();
        db.save(&mut file).unwrap();
        file.flush().unwrap();
    }

    {
        let mut file = File::open(&path).unwrap();
        let mut fresh = Database::from_registry(&set, "garage").unwrap();
        fresh.load(&mut file).unwrap();
        assert_eq!(fresh, db);
    }
}

#[test]
fn file_ends_with_sentinel() {
    let set = registry();
    let db = populated_garage(&set);
    let bytes = db.save_to_vec().unwrap();
    assert_eq!(&bytes[bytes.len() - END_SENTINEL.len()..], &END_SENTINEL[..]);
}

#[test]
fn table_length_mismatch_is_unequal() {
    let set = registry();
    let a = populated_garage(&set);
    let mut b = populated_garage(&set);

    let laps = b.table_mut("laps").unwrap();
    let extra = {
        let mut lap = laps.new_row();
        lap.set("time", 60.0f32).unwrap();
        lap.set(
            "sectors",
            vec![Value::Float(20.0), Value::Float(20.0), Value::Float(20.0)],
        )
        .unwrap();
        lap
    };
    laps.push(extra);

    assert_ne!(a, b);
}

#[test]
fn unknown_database_name_fails_construction() {
    let set = registry();
    assert!(Database::from_registry(&set, "paddock").is_err());
}
