//! Block creation service
//!
//! Creates a component under an existing course or library block, seeding
//! its fields from a boilerplate template and optionally updating its
//! grading classification afterwards.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use studio_bridge_core::{
    is_library_category, new_block_id, BlockRuntime, BlockUsageLocator, ContentBlock, UserId,
};
use studio_bridge_db::ContentStore;
use tracing::{debug, info, instrument, warn};

use crate::dto::{CreateBlockRequest, CreateBlockResponse};
use crate::error::{ServiceError, ServiceResult};
use crate::grading::GradingService;

/// Trait for block creation operations
#[async_trait]
pub trait BlockCreationService: Send + Sync {
    /// Create a block as the last child of the requested parent
    async fn create_block(
        &self,
        request: CreateBlockRequest,
        user: &UserId,
    ) -> ServiceResult<CreateBlockResponse>;
}

/// Default implementation of BlockCreationService
pub struct DefaultBlockCreationService {
    store: Arc<dyn ContentStore>,
    runtime: Arc<BlockRuntime>,
    grading: Arc<dyn GradingService>,
}

impl DefaultBlockCreationService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        runtime: Arc<BlockRuntime>,
        grading: Arc<dyn GradingService>,
    ) -> Self {
        Self {
            store,
            runtime,
            grading,
        }
    }

    /// Build the new block: template fields first, then the explicit name
    fn build_block(
        &self,
        parent: &BlockUsageLocator,
        category: &str,
        display_name: Option<String>,
        boilerplate: Option<&str>,
    ) -> ServiceResult<ContentBlock> {
        let location = parent.make_child(category, new_block_id())?;
        let mut block = ContentBlock::new(location).with_parent(parent.clone());

        if let Some(boilerplate) = boilerplate {
            match self.runtime.template(category, boilerplate) {
                Some(template) => block.apply_fields(&template.fields),
                None => debug!(category, boilerplate, "Unknown boilerplate, ignoring"),
            }
        }

        if let Some(name) = display_name {
            block.set_field("display_name", Value::String(name));
        }

        Ok(block)
    }

    /// Grade the freshly created block; `null` clears grading
    async fn apply_grader_type(
        &self,
        location: &BlockUsageLocator,
        grader_type: Value,
        user: &UserId,
    ) -> ServiceResult<()> {
        let grader_type = match grader_type {
            Value::Null => None,
            Value::String(name) => Some(name),
            other => {
                return Err(ServiceError::InvalidInput(format!(
                    "graderType must be a string or null, got {}",
                    other
                )))
            }
        };

        let block = self.store.get_item(location).await?;
        self.grading
            .update_section_grader_type(block, grader_type, user)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BlockCreationService for DefaultBlockCreationService {
    #[instrument(skip(self, request), fields(user = %user))]
    async fn create_block(
        &self,
        request: CreateBlockRequest,
        user: &UserId,
    ) -> ServiceResult<CreateBlockResponse> {
        if request.is_duplicate() {
            return Err(ServiceError::DuplicateNotImplemented);
        }

        let parent_locator = request
            .parent_locator
            .ok_or_else(|| ServiceError::InvalidInput("parent_locator is required".to_string()))?;
        let category = request
            .category
            .ok_or_else(|| ServiceError::InvalidInput("category is required".to_string()))?;

        let parent: BlockUsageLocator = parent_locator.parse()?;

        if parent.is_library() && !is_library_category(&category) {
            return Err(ServiceError::UnsupportedLibraryCategory { category });
        }

        // the parent must exist before anything is created under it
        self.store.get_item(&parent).await?;

        let block = self.build_block(
            &parent,
            &category,
            request.display_name,
            request.boilerplate.as_deref(),
        )?;
        let created = self.store.create_child(&parent, block, user).await?;
        let location = created.location.clone();

        info!(
            location = %location,
            category = %category,
            display_name = ?self.runtime.display_name(&created),
            "Created block"
        );

        if let Some(grader_type) = request.grader_type {
            if let Err(e) = self.apply_grader_type(&location, grader_type, user).await {
                warn!(location = %location, error = %e, "Failed to update grader type");
            }
        }

        Ok(CreateBlockResponse {
            locator: location.to_string(),
            course_key: location.context_key().to_string(),
        })
    }
}
