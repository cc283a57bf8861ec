use lockin_ledger::{
    Database, Direction, FieldDelta, Filter, LedgerError, Query, MAX_BATCH_OPS,
};
use serde_json::json;

fn store() -> Database {
    Database::open_in_memory().expect("in-memory store")
}

#[tokio::test]
async fn set_is_a_full_overwrite() {
    let db = store();
    db.set("things", "t1", &json!({ "a": 1 })).await.unwrap();
    db.set("things", "t1", &json!({ "b": 2 })).await.unwrap();

    let doc = db.get("things", "t1").await.unwrap().unwrap();
    assert!(!doc.has_field("a"));
    assert_eq!(doc.i64_field("b"), 2);
}

#[tokio::test]
async fn get_returns_none_for_absent_documents() {
    let db = store();
    assert!(db.get("things", "nope").await.unwrap().is_none());
    assert!(db
        .get_as::<serde_json::Value>("things", "nope")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let db = store();
    db.set("things", "t1", &json!({ "a": 1 })).await.unwrap();
    db.delete("things", "t1").await.unwrap();
    db.delete("things", "t1").await.unwrap();
    assert!(db.get("things", "t1").await.unwrap().is_none());
}

#[tokio::test]
async fn update_on_a_missing_document_is_not_found() {
    let db = store();
    let result = db
        .update(
            "things",
            "nope",
            vec![("n".to_string(), FieldDelta::Increment(1))],
        )
        .await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
}

#[tokio::test]
async fn increment_treats_a_missing_field_as_zero() {
    let db = store();
    db.set("things", "t1", &json!({ "other": true })).await.unwrap();
    db.update(
        "things",
        "t1",
        vec![("n".to_string(), FieldDelta::Increment(5))],
    )
    .await
    .unwrap();
    db.update(
        "things",
        "t1",
        vec![("n".to_string(), FieldDelta::Increment(-2))],
    )
    .await
    .unwrap();

    let doc = db.get("things", "t1").await.unwrap().unwrap();
    assert_eq!(doc.i64_field("n"), 3);
}

#[tokio::test]
async fn queries_filter_order_and_limit() {
    let db = store();
    for (id, score) in [("a", 5), ("b", 20), ("c", 10), ("d", 1)] {
        db.set("scores", id, &json!({ "value": score })).await.unwrap();
    }

    let all = db.query("scores", Query::new()).await.unwrap();
    assert_eq!(all.len(), 4);

    let ordered = db
        .query(
            "scores",
            Query::new()
                .order_by("value", Direction::Descending)
                .limit(2),
        )
        .await
        .unwrap();
    assert_eq!(ordered.len(), 2);
    assert_eq!(ordered[0].id, "b");
    assert_eq!(ordered[1].id, "c");

    let above = db
        .query(
            "scores",
            Query::new().filter(Filter::GreaterThan("value".to_string(), 5)),
        )
        .await
        .unwrap();
    assert_eq!(above.len(), 2);
}

#[tokio::test]
async fn collections_are_isolated() {
    let db = store();
    db.set("left", "same-id", &json!({ "v": 1 })).await.unwrap();
    db.set("right", "same-id", &json!({ "v": 2 })).await.unwrap();

    assert_eq!(
        db.get("left", "same-id").await.unwrap().unwrap().i64_field("v"),
        1
    );
    assert_eq!(db.query("right", Query::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_transactions_leave_no_writes_behind() {
    let db = store();
    let result: Result<(), LedgerError> = db
        .transaction(|tx| {
            tx.set("things", "t1", &json!({ "a": 1 }))?;
            Err(LedgerError::NotFound("forced failure".to_string()))
        })
        .await;

    assert!(matches!(result, Err(LedgerError::NotFound(_))));
    assert!(db.get("things", "t1").await.unwrap().is_none());
}

#[tokio::test]
async fn transactions_commit_all_writes_together() {
    let db = store();
    db.set("things", "seed", &json!({ "n": 1 })).await.unwrap();

    db.transaction(|tx| {
        tx.set("things", "t1", &json!({ "a": 1 }))?;
        tx.update(
            "things",
            "seed",
            vec![("n".to_string(), FieldDelta::Increment(4))],
        )?;
        tx.delete("things", "absent")?;
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(
        db.get("things", "seed").await.unwrap().unwrap().i64_field("n"),
        5
    );
    assert!(db.get("things", "t1").await.unwrap().is_some());
}

#[tokio::test]
async fn batches_are_atomic() {
    let db = store();
    let mut batch = db.batch();
    batch.set("things", "t1", &json!({ "a": 1 })).unwrap();
    batch
        .update(
            "things",
            "missing",
            vec![("n".to_string(), FieldDelta::Increment(1))],
        )
        .unwrap();

    assert!(matches!(
        batch.commit().await,
        Err(LedgerError::NotFound(_))
    ));
    // The failing update rolled back the preceding set.
    assert!(db.get("things", "t1").await.unwrap().is_none());
}

#[tokio::test]
async fn batches_enforce_the_operation_ceiling() {
    let db = store();
    let mut batch = db.batch();
    for n in 0..MAX_BATCH_OPS {
        batch
            .set("things", &format!("t{n}"), &json!({ "n": n }))
            .unwrap();
    }
    assert!(batch.set("things", "overflow", &json!({})).is_err());

    batch.commit().await.unwrap();
    assert_eq!(
        db.query("things", Query::new()).await.unwrap().len(),
        MAX_BATCH_OPS
    );
}

#[tokio::test]
async fn empty_batches_commit_cleanly() {
    let db = store();
    let batch = db.batch();
    assert!(batch.is_empty());
    batch.commit().await.unwrap();
}
