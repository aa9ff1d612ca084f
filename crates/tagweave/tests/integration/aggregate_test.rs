//! Integration tests for aggregate reads
//!
//! Tests most_common counting and similar_objects ranking with batched
//! object resolution.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstest::rstest;
use tagweave::{ContentObject, ObjectLoader, TagContext, TagError};

use crate::fixtures::{
	Food, Pet, Record, create_article, create_food, create_pet, food_loader, food_registry,
	insert_tagged_item_to_db, pet_loader, record_registry, taggit_db,
};

/// Wraps a loader and records the ids of every `load_many` call
struct CountingLoader<L> {
	inner: L,
	calls: Arc<Mutex<Vec<Vec<i64>>>>,
}

#[async_trait]
impl<L: ObjectLoader<Record>> ObjectLoader<Record> for CountingLoader<L> {
	async fn load_many(&self, ctx: &TagContext, ids: &[i64]) -> tagweave::Result<Vec<(i64, Record)>> {
		self.calls.lock().unwrap().push(ids.to_vec());
		self.inner.load_many(ctx, ids).await
	}
}

/// Test most_common orders tags by usage
///
/// x is used by five foods and y by two, so x comes first.
#[rstest]
#[tokio::test]
async fn test_most_common_orders_by_count(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	for i in 0..5 {
		let food = create_food(&ctx, &format!("food-{}", i)).await;
		let tags: &[&str] = if i < 2 { &["x", "y"] } else { &["x"] };
		food.tags(&ctx).add(tags.iter().copied()).await.unwrap();
	}

	// Act
	let counts = ctx.manager_for::<Food>().most_common().await.unwrap();

	// Assert
	let summary: Vec<(&str, i64)> = counts
		.iter()
		.map(|c| (c.tag.name.as_str(), c.num_times))
		.collect();
	assert_eq!(summary, vec![("x", 5), ("y", 2)]);
}

/// Test most_common ignores other content types and breaks ties by name
#[rstest]
#[tokio::test]
async fn test_most_common_scoped_to_relation(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let apple = create_food(&ctx, "apple").await;
	let rex = create_pet(&ctx, "rex").await;
	let fido = create_pet(&ctx, "fido").await;
	apple.tags(&ctx).add(["zesty", "crisp"]).await.unwrap();
	rex.tags(&ctx).add(["zesty"]).await.unwrap();
	fido.tags(&ctx).add(["zesty"]).await.unwrap();

	// Act
	let counts = ctx.manager_for::<Food>().most_common().await.unwrap();

	// Assert
	let summary: Vec<(&str, i64)> = counts
		.iter()
		.map(|c| (c.tag.name.as_str(), c.num_times))
		.collect();
	assert_eq!(summary, vec![("crisp", 1), ("zesty", 1)]);
}

/// Test most_common on a bound manager restricts to the record's tags
#[rstest]
#[tokio::test]
async fn test_most_common_bound_restricts_tags(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let apple = create_food(&ctx, "apple").await;
	let cherry = create_food(&ctx, "cherry").await;
	let banana = create_food(&ctx, "banana").await;
	apple.tags(&ctx).add(["red"]).await.unwrap();
	cherry.tags(&ctx).add(["red", "small"]).await.unwrap();
	banana.tags(&ctx).add(["yellow", "small"]).await.unwrap();

	// Act
	let counts = cherry.tags(&ctx).most_common().await.unwrap();
	let limited = ctx.manager_for::<Food>().most_common_limited(1).await.unwrap();

	// Assert
	let summary: Vec<(&str, i64)> = counts
		.iter()
		.map(|c| (c.tag.name.as_str(), c.num_times))
		.collect();
	assert_eq!(summary, vec![("red", 2), ("small", 2)]);
	assert_eq!(limited.len(), 1);
	assert_eq!(limited[0].tag.name, "red");
}

/// Test similar_objects ranks by shared tag count
///
/// P{a,b}, Q{b,c}, R{a,b,c}: R shares two tags with P, Q shares one, and
/// P never appears in its own result.
#[rstest]
#[tokio::test]
async fn test_similar_objects_ranking(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let p = create_food(&ctx, "p").await;
	let q = create_pet(&ctx, "q").await;
	let r = create_food(&ctx, "r").await;
	p.tags(&ctx).set(["a", "b"]).await.unwrap();
	q.tags(&ctx).set(["b", "c"]).await.unwrap();
	r.tags(&ctx).set(["a", "b", "c"]).await.unwrap();

	// Act
	let similar = p.tags(&ctx).similar_objects(&record_registry()).await.unwrap();

	// Assert
	let labels: Vec<(&str, i64)> = similar
		.iter()
		.map(|s| (s.object.label(), s.similar_tags))
		.collect();
	assert_eq!(labels, vec![("r", 2), ("q", 1)]);
	assert_eq!(similar[0].object, Record::Food(r.clone()));
	assert_eq!(similar[1].content_object, ContentObject::new("Pet", q.id.unwrap()));
}

/// Test ties are ordered by content type then object id
#[rstest]
#[tokio::test]
async fn test_similar_objects_tie_order(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let source = create_food(&ctx, "source").await;
	let rex = create_pet(&ctx, "rex").await;
	let apple = create_food(&ctx, "apple").await;
	let cherry = create_food(&ctx, "cherry").await;
	source.tags(&ctx).add(["shared"]).await.unwrap();
	rex.tags(&ctx).add(["shared"]).await.unwrap();
	cherry.tags(&ctx).add(["shared"]).await.unwrap();
	apple.tags(&ctx).add(["shared"]).await.unwrap();

	// Act
	let similar = source.tags(&ctx).similar_objects(&record_registry()).await.unwrap();

	// Assert
	let refs: Vec<String> = similar
		.iter()
		.map(|s| s.content_object.to_string())
		.collect();
	assert_eq!(
		refs,
		vec![
			format!("Food#{}", apple.id.unwrap()),
			format!("Food#{}", cherry.id.unwrap()),
			format!("Pet#{}", rex.id.unwrap()),
		]
	);
}

/// Test a record without tags has no similar objects
#[rstest]
#[tokio::test]
async fn test_similar_objects_without_tags(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let lonely = create_food(&ctx, "lonely").await;
	let other = create_food(&ctx, "other").await;
	other.tags(&ctx).add(["a"]).await.unwrap();

	// Act
	let similar = lonely.tags(&ctx).similar_objects(&food_registry()).await.unwrap();

	// Assert
	assert!(similar.is_empty());
}

/// Test references to deleted records are silently dropped
#[rstest]
#[tokio::test]
async fn test_similar_objects_skips_dangling_refs(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let apple = create_food(&ctx, "apple").await;
	let cherry = create_food(&ctx, "cherry").await;
	apple.tags(&ctx).add(["red"]).await.unwrap();
	cherry.tags(&ctx).add(["red"]).await.unwrap();
	let red = ctx.store().get("red").await.unwrap().unwrap();
	insert_tagged_item_to_db(&ctx, red.id.unwrap(), "Food", 9_999).await;

	// Act
	let similar = apple.tags(&ctx).similar_objects(&food_registry()).await.unwrap();

	// Assert
	assert_eq!(similar.len(), 1);
	assert_eq!(similar[0].object, Record::Food(cherry));
}

/// Test an unregistered content type is a configuration error
#[rstest]
#[tokio::test]
async fn test_similar_objects_unknown_content_type(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let apple = create_food(&ctx, "apple").await;
	let rex = create_pet(&ctx, "rex").await;
	apple.tags(&ctx).add(["red"]).await.unwrap();
	rex.tags(&ctx).add(["red"]).await.unwrap();

	// Act
	let result = apple.tags(&ctx).similar_objects(&food_registry()).await;

	// Assert
	assert!(matches!(result, Err(TagError::UnknownContentType(kind)) if kind == "Pet"));
}

/// Test similar_objects on a direct relation stays within that table
#[rstest]
#[tokio::test]
async fn test_similar_objects_direct_relation(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let intro = create_article(&ctx, "intro").await;
	let deep_dive = create_article(&ctx, "deep dive").await;
	let unrelated = create_article(&ctx, "unrelated").await;
	let apple = create_food(&ctx, "apple").await;
	intro.tags(&ctx).add(["rust", "async"]).await.unwrap();
	deep_dive.tags(&ctx).add(["async"]).await.unwrap();
	unrelated.tags(&ctx).add(["cooking"]).await.unwrap();
	apple.tags(&ctx).add(["rust"]).await.unwrap();

	// Act
	let similar = intro.tags(&ctx).similar_objects(&record_registry()).await.unwrap();

	// Assert
	assert_eq!(similar.len(), 1);
	assert_eq!(similar[0].object, Record::Article(deep_dive));
	assert_eq!(similar[0].similar_tags, 1);
}

/// Test object resolution issues one load per content type
#[rstest]
#[tokio::test]
async fn test_similar_objects_loads_once_per_content_type(#[future] taggit_db: TagContext) {
	// Arrange
	let ctx = taggit_db.await;
	let source = create_food(&ctx, "source").await;
	source.tags(&ctx).add(["shared"]).await.unwrap();
	for i in 0..5 {
		let food = create_food(&ctx, &format!("food-{}", i)).await;
		food.tags(&ctx).add(["shared"]).await.unwrap();
		let pet = create_pet(&ctx, &format!("pet-{}", i)).await;
		pet.tags(&ctx).add(["shared"]).await.unwrap();
	}
	let food_calls = Arc::new(Mutex::new(Vec::new()));
	let pet_calls = Arc::new(Mutex::new(Vec::new()));
	let registry = record_registry()
		.with::<Food>(CountingLoader {
			inner: food_loader(),
			calls: food_calls.clone(),
		})
		.with::<Pet>(CountingLoader {
			inner: pet_loader(),
			calls: pet_calls.clone(),
		});

	// Act
	let similar = source.tags(&ctx).similar_objects(&registry).await.unwrap();

	// Assert
	assert_eq!(similar.len(), 10);
	let food_calls = food_calls.lock().unwrap();
	let pet_calls = pet_calls.lock().unwrap();
	assert_eq!(food_calls.len(), 1);
	assert_eq!(pet_calls.len(), 1);
	assert_eq!(food_calls[0].len(), 5);
	assert_eq!(pet_calls[0].len(), 5);
}

