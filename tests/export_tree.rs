// End-to-end export assembly against the in-memory record store and an
// in-memory OpenDAL sink: full tree layout, current-hour exclusion,
// index/checksum verification, and run-to-run determinism.

use std::collections::BTreeMap;

use hourtree::{
    Category, Checksum, ExportDriver, HourBucket, MemoryRecordStore, OperatorSink, Record, Region,
};
use opendal::{services, EntryMode, Operator};

const NAMESPACE: &str = "export";

fn memory_operator() -> Operator {
    Operator::new(services::Memory::default()).unwrap().finish()
}

async fn published_tree(op: &Operator) -> BTreeMap<String, Vec<u8>> {
    let mut tree = BTreeMap::new();
    let entries = op.list_with("").recursive(true).await.unwrap();
    for entry in entries {
        if entry.metadata().mode() == EntryMode::FILE {
            let bytes = op.read(entry.path()).await.unwrap().to_vec();
            tree.insert(entry.path().to_string(), bytes);
        }
    }
    tree
}

struct Scenario {
    store: MemoryRecordStore,
    category: Category,
    current: HourBucket,
    oldest: HourBucket,
    latest: HourBucket,
}

/// Region DE with records in an old hour, the most recent complete hour,
/// and the still-open current hour.
fn scenario() -> Scenario {
    let category = Category::new("pcr");
    let current = HourBucket::current();
    let oldest = HourBucket::from_index(current.index() - 10);
    let latest = HourBucket::from_index(current.index() - 1);

    let store = MemoryRecordStore::new();
    for (bucket, payload) in [
        (oldest, b"oldest-records".to_vec()),
        (latest, b"latest-records".to_vec()),
        (current, b"open-records".to_vec()),
    ] {
        store.save_records(
            vec![Record::new(Region::new("DE"), payload)],
            bucket,
            &category,
        );
    }

    Scenario {
        store,
        category,
        current,
        oldest,
        latest,
    }
}

#[tokio::test]
async fn publishes_oldest_and_latest_but_never_the_current_hour() {
    let scenario = scenario();
    let op = memory_operator();
    let sink = OperatorSink::new(op.clone());

    let summary = ExportDriver::new(&scenario.store, &sink, NAMESPACE, scenario.category.clone())
        .run_at(scenario.current)
        .await
        .unwrap();

    assert_eq!(summary.regions, 1);
    assert_eq!(summary.leaves, 2);

    let tree = published_tree(&op).await;
    let paths: Vec<&String> = tree.keys().collect();

    let oldest_leaf = format!("{NAMESPACE}/country/DE/hour/{}", scenario.oldest);
    let latest_leaf = format!("{NAMESPACE}/country/DE/hour/{}", scenario.latest);
    let excluded_leaf = format!("{NAMESPACE}/country/DE/hour/{}", scenario.current);

    assert!(tree.contains_key(&oldest_leaf), "missing {oldest_leaf}");
    assert!(tree.contains_key(&latest_leaf), "missing {latest_leaf}");
    assert!(
        !tree.contains_key(&excluded_leaf),
        "current hour {excluded_leaf} must not be published"
    );

    // Index artifacts at exactly the country and hour levels
    assert!(tree.contains_key(&format!("{NAMESPACE}/country/index")));
    assert!(tree.contains_key(&format!("{NAMESPACE}/country/index.checksum")));
    assert!(tree.contains_key(&format!("{NAMESPACE}/country/DE/hour/index")));
    assert!(tree.contains_key(&format!("{NAMESPACE}/country/DE/hour/index.checksum")));
    assert!(!tree.contains_key(&format!("{NAMESPACE}/index")));
    assert!(!tree.contains_key(&format!("{NAMESPACE}/country/DE/index")));

    // No stray files beyond leaves + artifacts
    assert_eq!(paths.len(), 6);
}

#[tokio::test]
async fn index_contents_list_exactly_the_published_children() {
    let scenario = scenario();
    let op = memory_operator();
    let sink = OperatorSink::new(op.clone());

    ExportDriver::new(&scenario.store, &sink, NAMESPACE, scenario.category.clone())
        .run_at(scenario.current)
        .await
        .unwrap();

    let tree = published_tree(&op).await;

    let country_index = &tree[&format!("{NAMESPACE}/country/index")];
    assert_eq!(country_index, b"DE\n");

    let mut expected_hours = [scenario.oldest.to_string(), scenario.latest.to_string()];
    expected_hours.sort();
    let hour_index = &tree[&format!("{NAMESPACE}/country/DE/hour/index")];
    assert_eq!(
        hour_index,
        format!("{}\n{}\n", expected_hours[0], expected_hours[1]).as_bytes()
    );
}

#[tokio::test]
async fn published_checksums_verify_against_the_index_bytes() {
    let scenario = scenario();
    let op = memory_operator();
    let sink = OperatorSink::new(op.clone());

    ExportDriver::new(&scenario.store, &sink, NAMESPACE, scenario.category.clone())
        .run_at(scenario.current)
        .await
        .unwrap();

    let tree = published_tree(&op).await;

    for level in [
        format!("{NAMESPACE}/country"),
        format!("{NAMESPACE}/country/DE/hour"),
    ] {
        let index = &tree[&format!("{level}/index")];
        let checksum = &tree[&format!("{level}/index.checksum")];
        // Recompute from the materialized index file, as a downstream
        // consumer would
        assert_eq!(
            checksum,
            Checksum::of(index).to_hex().as_bytes(),
            "checksum mismatch at {level}"
        );
    }
}

#[tokio::test]
async fn region_without_eligible_buckets_is_absent() {
    let scenario = scenario();
    // FR holds records only in the still-open hour
    scenario.store.save_records(
        vec![Record::new(Region::new("FR"), b"open-only".to_vec())],
        scenario.current,
        &scenario.category,
    );

    let op = memory_operator();
    let sink = OperatorSink::new(op.clone());
    ExportDriver::new(&scenario.store, &sink, NAMESPACE, scenario.category.clone())
        .run_at(scenario.current)
        .await
        .unwrap();

    let tree = published_tree(&op).await;
    assert!(tree.keys().all(|path| !path.contains("/FR/")));
    assert_eq!(tree[&format!("{NAMESPACE}/country/index")], b"DE\n");
}

#[tokio::test]
async fn filesystem_backend_writes_the_same_layout_to_disk() {
    let scenario = scenario();
    let dir = tempfile::tempdir().unwrap();

    let fs = services::Fs::default().root(dir.path().to_str().unwrap());
    let op = Operator::new(fs).unwrap().finish();
    let sink = OperatorSink::new(op);

    ExportDriver::new(&scenario.store, &sink, NAMESPACE, scenario.category.clone())
        .run_at(scenario.current)
        .await
        .unwrap();

    let index_path = dir.path().join(NAMESPACE).join("country").join("index");
    assert_eq!(std::fs::read(index_path).unwrap(), b"DE\n");

    let leaf_path = dir
        .path()
        .join(NAMESPACE)
        .join("country")
        .join("DE")
        .join("hour")
        .join(scenario.latest.to_string());
    assert!(leaf_path.is_file());
    assert!(
        !leaf_path.with_file_name(scenario.current.to_string()).exists(),
        "current hour must not reach the filesystem"
    );
}

#[tokio::test]
async fn identical_data_and_current_bucket_yield_byte_identical_trees() {
    let scenario = scenario();

    let op_a = memory_operator();
    let op_b = memory_operator();

    for op in [&op_a, &op_b] {
        let sink = OperatorSink::new(op.clone());
        ExportDriver::new(&scenario.store, &sink, NAMESPACE, scenario.category.clone())
            .run_at(scenario.current)
            .await
            .unwrap();
    }

    let tree_a = published_tree(&op_a).await;
    let tree_b = published_tree(&op_b).await;
    assert_eq!(tree_a, tree_b);
    assert!(!tree_a.is_empty());
}
