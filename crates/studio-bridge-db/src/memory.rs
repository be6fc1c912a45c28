//! In-memory content store
//!
//! Backs development servers and tests. Blocks are kept by their serialized
//! key; every successful `update_item` bumps a counter so callers can check
//! whether a write-back happened.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use studio_bridge_core::{AsideInstance, BlockUsageLocator, ContentBlock, UserId};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{DbError, DbResult};
use crate::store::{prepare_write, ContentStore};

/// Content store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    blocks: RwLock<HashMap<String, ContentBlock>>,
    updates: AtomicU64,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `update_item` calls
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    /// Number of stored blocks
    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get_item(&self, location: &BlockUsageLocator) -> DbResult<ContentBlock> {
        self.blocks
            .read()
            .await
            .get(&location.to_string())
            .cloned()
            .ok_or_else(|| DbError::NotFound(location.to_string()))
    }

    async fn has_item(&self, location: &BlockUsageLocator) -> DbResult<bool> {
        Ok(self.blocks.read().await.contains_key(&location.to_string()))
    }

    #[instrument(skip(self, block), fields(location = %block.location))]
    async fn insert_item(&self, block: ContentBlock, user: &UserId) -> DbResult<ContentBlock> {
        let key = block.location.to_string();
        let mut blocks = self.blocks.write().await;
        if blocks.contains_key(&key) {
            return Err(DbError::AlreadyExists(key));
        }

        let stored = prepare_write(&block, user, &[]);
        blocks.insert(key, stored.clone());
        debug!("Inserted block");
        Ok(stored)
    }

    #[instrument(skip(self, block), fields(parent = %parent, location = %block.location))]
    async fn create_child(
        &self,
        parent: &BlockUsageLocator,
        block: ContentBlock,
        user: &UserId,
    ) -> DbResult<ContentBlock> {
        let parent_key = parent.to_string();
        let child_key = block.location.to_string();
        let mut blocks = self.blocks.write().await;

        if blocks.contains_key(&child_key) {
            return Err(DbError::AlreadyExists(child_key));
        }
        let parent_block = blocks
            .get_mut(&parent_key)
            .ok_or_else(|| DbError::NotFound(parent_key.clone()))?;

        parent_block.add_child(block.location.clone());
        parent_block.record_edit(user);

        let mut child = prepare_write(&block, user, &[]);
        child.parent = Some(parent.clone());
        blocks.insert(child_key, child.clone());

        debug!("Created child block");
        Ok(child)
    }

    #[instrument(skip(self, block, asides), fields(location = %block.location, asides = asides.len()))]
    async fn update_item(
        &self,
        block: &ContentBlock,
        user: &UserId,
        asides: &[AsideInstance],
    ) -> DbResult<ContentBlock> {
        let key = block.location.to_string();
        let mut blocks = self.blocks.write().await;
        let slot = blocks
            .get_mut(&key)
            .ok_or_else(|| DbError::NotFound(key.clone()))?;

        let stored = prepare_write(block, user, asides);
        *slot = stored.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);

        debug!("Updated block");
        Ok(stored)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use studio_bridge_core::EditRuntime;

    fn key(s: &str) -> BlockUsageLocator {
        s.parse().unwrap()
    }

    async fn store_with_vertical() -> (InMemoryContentStore, BlockUsageLocator) {
        let store = InMemoryContentStore::new();
        let vertical = key("block-v1:Org+C+R+type@vertical+block@unit");
        store
            .insert_item(ContentBlock::new(vertical.clone()), &UserId::new("1"))
            .await
            .unwrap();
        (store, vertical)
    }

    #[tokio::test]
    async fn test_get_missing_item() {
        let store = InMemoryContentStore::new();
        let err = store
            .get_item(&key("block-v1:Org+C+R+type@html+block@nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let (store, vertical) = store_with_vertical().await;
        let err = store
            .insert_item(ContentBlock::new(vertical), &UserId::new("1"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_create_child_links_parent() {
        let (store, vertical) = store_with_vertical().await;
        let child_key = vertical.make_child("html", "h1").unwrap();

        let child = store
            .create_child(&vertical, ContentBlock::new(child_key.clone()), &UserId::new("2"))
            .await
            .unwrap();
        assert_eq!(child.parent.as_ref(), Some(&vertical));
        assert_eq!(child.edit_info.edited_by, Some(UserId::new("2")));

        let parent = store.get_item(&vertical).await.unwrap();
        assert_eq!(parent.children, vec![child_key.clone()]);
        assert!(store.has_item(&child_key).await.unwrap());
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_create_child_requires_parent() {
        let store = InMemoryContentStore::new();
        let parent = key("block-v1:Org+C+R+type@vertical+block@missing");
        let err = store
            .create_child(
                &parent,
                ContentBlock::new(parent.make_child("html", "h1").unwrap()),
                &UserId::new("2"),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_item_merges_asides_and_counts() {
        let (store, vertical) = store_with_vertical().await;
        let mut block = store.get_item(&vertical).await.unwrap();
        block.bind_runtime(EditRuntime::new(UserId::new("3")));
        block.set_field("display_name", json!("Unit 1"));

        let mut aside = AsideInstance::new("tagging_aside");
        aside.fields.insert("saved_tags".to_string(), json!({"x": 1}));

        store
            .update_item(&block, &UserId::new("3"), &[aside])
            .await
            .unwrap();
        assert_eq!(store.update_count(), 1);

        let stored = store.get_item(&vertical).await.unwrap();
        assert_eq!(stored.display_name(), Some("Unit 1"));
        assert!(stored.runtime().is_none());
        assert_eq!(stored.aside("tagging_aside").unwrap().fields["saved_tags"], json!({"x": 1}));
        assert_eq!(stored.edit_info.edited_by, Some(UserId::new("3")));
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let store = InMemoryContentStore::new();
        let block = ContentBlock::new(key("block-v1:Org+C+R+type@html+block@ghost"));
        let err = store
            .update_item(&block, &UserId::new("1"), &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.update_count(), 0);
    }
}
