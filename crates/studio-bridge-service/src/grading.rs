//! Grading service
//!
//! Updates the grading classification of a section or subsection.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use studio_bridge_core::{ContentBlock, UserId};
use studio_bridge_db::ContentStore;
use tracing::{debug, instrument};

use crate::dto::GraderTypeUpdate;
use crate::error::ServiceResult;

/// Grader type meaning "not graded"
pub const NOT_GRADED: &str = "notgraded";

/// Field naming the assignment type of a graded section
pub const FORMAT_FIELD: &str = "format";

/// Field flagging a section as graded
pub const GRADED_FIELD: &str = "graded";

/// Trait for grading operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Set or clear the grader type of `block` and write it back
    async fn update_section_grader_type(
        &self,
        block: ContentBlock,
        grader_type: Option<String>,
        user: &UserId,
    ) -> ServiceResult<GraderTypeUpdate>;
}

/// Default implementation of GradingService
pub struct DefaultGradingService {
    store: Arc<dyn ContentStore>,
}

impl DefaultGradingService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GradingService for DefaultGradingService {
    #[instrument(skip(self, block), fields(location = %block.location, user = %user))]
    async fn update_section_grader_type(
        &self,
        mut block: ContentBlock,
        grader_type: Option<String>,
        user: &UserId,
    ) -> ServiceResult<GraderTypeUpdate> {
        let grader_type = match grader_type {
            Some(grader) if grader != NOT_GRADED => {
                block.set_field(FORMAT_FIELD, Value::String(grader.clone()));
                block.set_field(GRADED_FIELD, Value::Bool(true));
                grader
            }
            _ => {
                block.clear_field(FORMAT_FIELD);
                block.set_field(GRADED_FIELD, Value::Bool(false));
                NOT_GRADED.to_string()
            }
        };

        self.store.update_item(&block, user, &[]).await?;
        debug!(grader_type = %grader_type, "Updated grader type");

        Ok(GraderTypeUpdate { grader_type })
    }
}
