//! Content store trait abstraction
//!
//! The store is the single seam between the services and persistence. It
//! loads blocks by key, creates children under existing parents, and
//! writes edited blocks back together with any aside state.

use async_trait::async_trait;
use studio_bridge_core::{AsideInstance, BlockUsageLocator, ContentBlock, UserId};

use crate::error::DbResult;

/// Persistence for course and library content
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Load a block; a missing key is [`DbError::NotFound`](crate::DbError::NotFound)
    async fn get_item(&self, location: &BlockUsageLocator) -> DbResult<ContentBlock>;

    /// Whether a block is stored under the key
    async fn has_item(&self, location: &BlockUsageLocator) -> DbResult<bool>;

    /// Store a root or detached block. Fails if the key is taken.
    async fn insert_item(&self, block: ContentBlock, user: &UserId) -> DbResult<ContentBlock>;

    /// Store `block` as the last child of `parent`.
    ///
    /// The parent must exist and the block's key must be unused. The parent
    /// link and the parent's child list are updated together.
    async fn create_child(
        &self,
        parent: &BlockUsageLocator,
        block: ContentBlock,
        user: &UserId,
    ) -> DbResult<ContentBlock>;

    /// Persist an edited block and merge the given aside state into it.
    ///
    /// The block must already exist. Edit info is stamped for `user`; any
    /// bound editing runtime is dropped before writing.
    async fn update_item(
        &self,
        block: &ContentBlock,
        user: &UserId,
        asides: &[AsideInstance],
    ) -> DbResult<ContentBlock>;

    /// Health check
    async fn ping(&self) -> DbResult<()>;
}

/// Prepare a block for persistence
pub(crate) fn prepare_write(
    block: &ContentBlock,
    user: &UserId,
    asides: &[AsideInstance],
) -> ContentBlock {
    let mut stored = block.clone();
    stored.unbind_runtime();
    stored.apply_asides(asides);
    stored.record_edit(user);
    stored
}
