use serde_json::{Value, json};
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toy_store::{
    ListQuery, SortDirection, SortSpec, StoreError, SurrealToyStore, Toy, ToyId, ToyStore,
};

async fn setup() -> SurrealToyStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    let store = SurrealToyStore::new(Arc::new(db));
    store.init().await.unwrap();
    store
}

fn toy(value: Value) -> Toy {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn prices(toys: &[Toy]) -> Vec<i64> {
    toys.iter()
        .map(|t| t.get("price").and_then(Value::as_i64).unwrap())
        .collect()
}

#[tokio::test]
async fn init_is_repeatable() {
    let store = setup().await;
    store.init().await.unwrap();
    store.ping().await.unwrap();
}

#[tokio::test]
async fn init_without_namespace_is_unavailable() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    let store = SurrealToyStore::new(Arc::new(db));

    let err = store.init().await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn insert_then_find_one_round_trips_fields() {
    let store = setup().await;

    let ack = store
        .insert_one(toy(json!({"name": "Dragon", "price": 20, "email": "a@x.com"})))
        .await
        .unwrap();
    assert!(ack.acknowledged);

    let found = store.find_one(&ack.inserted_id).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&json!("Dragon")));
    assert_eq!(found.get("price"), Some(&json!(20)));
    assert_eq!(found.get("email"), Some(&json!("a@x.com")));
    assert_eq!(found.get("id"), Some(&json!(ack.inserted_id.as_str())));
}

#[tokio::test]
async fn qualified_and_bare_ids_address_the_same_record() {
    let store = setup().await;
    let ack = store.insert_one(toy(json!({"name": "Robot"}))).await.unwrap();

    let qualified = ToyId::parse(&ack.inserted_id.qualified()).unwrap();
    let found = store.find_one(&qualified).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&json!("Robot")));
}

#[tokio::test]
async fn find_one_on_missing_id_is_none() {
    let store = setup().await;
    let id = ToyId::parse("doesnotexist").unwrap();
    assert!(store.find_one(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn find_filters_by_email() {
    let store = setup().await;
    for (name, email) in [("A", "a@x.com"), ("B", "b@x.com"), ("C", "a@x.com")] {
        store
            .insert_one(toy(json!({"name": name, "email": email})))
            .await
            .unwrap();
    }

    let all = store.find(&ListQuery::all()).await.unwrap();
    assert_eq!(all.len(), 3);

    let mine = store
        .find(&ListQuery::all().with_email("a@x.com"))
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|t| t.get("email") == Some(&json!("a@x.com"))));

    let nobody = store
        .find(&ListQuery::all().with_email("z@x.com"))
        .await
        .unwrap();
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn find_sorts_by_price_both_ways() {
    let store = setup().await;
    for price in [5, 20, 10] {
        store.insert_one(toy(json!({"price": price}))).await.unwrap();
    }

    let ascending = store
        .find(&ListQuery::all().sorted_by(SortSpec::new("price", SortDirection::Ascending).unwrap()))
        .await
        .unwrap();
    assert_eq!(prices(&ascending), vec![5, 10, 20]);

    let descending = store
        .find(&ListQuery::all().sorted_by(SortSpec::parse("price:-1").unwrap()))
        .await
        .unwrap();
    assert_eq!(prices(&descending), vec![20, 10, 5]);
}

#[tokio::test]
async fn update_merges_and_keeps_other_fields() {
    let store = setup().await;
    let ack = store
        .insert_one(toy(json!({"name": "Dragon", "price": 20, "email": "a@x.com"})))
        .await
        .unwrap();

    let update = store
        .update_one(&ack.inserted_id, toy(json!({"price": 5})))
        .await
        .unwrap();
    assert_eq!(update.matched_count, 1);

    let found = store.find_one(&ack.inserted_id).await.unwrap().unwrap();
    assert_eq!(found.get("price"), Some(&json!(5)));
    assert_eq!(found.get("name"), Some(&json!("Dragon")));
    assert_eq!(found.get("email"), Some(&json!("a@x.com")));
}

#[tokio::test]
async fn update_on_missing_id_matches_nothing_and_creates_nothing() {
    let store = setup().await;
    let id = ToyId::parse("ghost").unwrap();

    let update = store.update_one(&id, toy(json!({"price": 1}))).await.unwrap();
    assert_eq!(update.matched_count, 0);
    assert!(store.find_one(&id).await.unwrap().is_none());
    assert!(store.find(&ListQuery::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_once() {
    let store = setup().await;
    let ack = store.insert_one(toy(json!({"name": "Kite"}))).await.unwrap();

    let first = store.delete_one(&ack.inserted_id).await.unwrap();
    assert_eq!(first.deleted_count, 1);
    assert!(store.find_one(&ack.inserted_id).await.unwrap().is_none());

    let second = store.delete_one(&ack.inserted_id).await.unwrap();
    assert_eq!(second.deleted_count, 0);
}
