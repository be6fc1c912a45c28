//! Service layer for Studio Bridge
//!
//! This crate sits between the HTTP handlers and the content store:
//!
//! - **BlockCreationService**: creates components under course or library blocks
//! - **EditDispatchService**: routes Studio edits to a block or aside and persists them
//! - **GradingService**: updates the grading classification of a section
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use studio_bridge_core::BlockRuntime;
//! use studio_bridge_db::InMemoryContentStore;
//! use studio_bridge_service::ServiceRegistry;
//!
//! let services = ServiceRegistry::new(
//!     Arc::new(InMemoryContentStore::new()),
//!     Arc::new(BlockRuntime::with_defaults()),
//! );
//! ```

pub mod creation;
pub mod dispatch;
pub mod dto;
pub mod error;
pub mod grading;

// Re-export main types for convenience
pub use dto::*;
pub use error::{ServiceError, ServiceResult};

pub use creation::{BlockCreationService, DefaultBlockCreationService};
pub use dispatch::{DefaultEditDispatchService, EditDispatchService};
pub use grading::{DefaultGradingService, GradingService};

use std::sync::Arc;
use studio_bridge_core::BlockRuntime;
use studio_bridge_db::ContentStore;

/// Service registry that holds all service instances
#[derive(Clone)]
pub struct ServiceRegistry {
    pub creation: Arc<dyn BlockCreationService>,
    pub dispatch: Arc<dyn EditDispatchService>,
    pub grading: Arc<dyn GradingService>,
    /// Store shared by the services, exposed for health checks
    pub store: Arc<dyn ContentStore>,
}

impl ServiceRegistry {
    /// Create a registry with the default service implementations
    pub fn new(store: Arc<dyn ContentStore>, runtime: Arc<BlockRuntime>) -> Self {
        let grading: Arc<dyn GradingService> = Arc::new(DefaultGradingService::new(store.clone()));
        let creation = Arc::new(DefaultBlockCreationService::new(
            store.clone(),
            runtime.clone(),
            grading.clone(),
        ));
        let dispatch = Arc::new(DefaultEditDispatchService::new(store.clone(), runtime));

        Self {
            creation,
            dispatch,
            grading,
            store,
        }
    }

    pub fn creation(&self) -> &Arc<dyn BlockCreationService> {
        &self.creation
    }

    pub fn dispatch(&self) -> &Arc<dyn EditDispatchService> {
        &self.dispatch
    }

    pub fn grading(&self) -> &Arc<dyn GradingService> {
        &self.grading
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }
}

/// Builder for ServiceRegistry with custom implementations
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    store: Option<Arc<dyn ContentStore>>,
    runtime: Option<Arc<BlockRuntime>>,
    grading: Option<Arc<dyn GradingService>>,
    creation: Option<Arc<dyn BlockCreationService>>,
    dispatch: Option<Arc<dyn EditDispatchService>>,
}

impl ServiceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the block runtime; defaults to the standard catalogue
    pub fn runtime(mut self, runtime: Arc<BlockRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn grading_service(mut self, service: Arc<dyn GradingService>) -> Self {
        self.grading = Some(service);
        self
    }

    pub fn creation_service(mut self, service: Arc<dyn BlockCreationService>) -> Self {
        self.creation = Some(service);
        self
    }

    pub fn dispatch_service(mut self, service: Arc<dyn EditDispatchService>) -> Self {
        self.dispatch = Some(service);
        self
    }

    /// Build the registry, filling in default implementations
    pub fn build(self) -> Result<ServiceRegistry, String> {
        let store = self.store.ok_or("Content store is required")?;
        let runtime = self
            .runtime
            .unwrap_or_else(|| Arc::new(BlockRuntime::with_defaults()));

        let grading = self
            .grading
            .unwrap_or_else(|| Arc::new(DefaultGradingService::new(store.clone())));

        let creation = self.creation.unwrap_or_else(|| {
            Arc::new(DefaultBlockCreationService::new(
                store.clone(),
                runtime.clone(),
                grading.clone(),
            ))
        });

        let dispatch = self
            .dispatch
            .unwrap_or_else(|| Arc::new(DefaultEditDispatchService::new(store.clone(), runtime)));

        Ok(ServiceRegistry {
            creation,
            dispatch,
            grading,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_bridge_core::{HandlerRequest, UserId};
    use studio_bridge_db::{seed_demo_content, InMemoryContentStore};

    #[test]
    fn test_builder_requires_store() {
        assert!(ServiceRegistryBuilder::new().build().is_err());
    }

    #[tokio::test]
    async fn test_registry_wires_shared_store() {
        let store = Arc::new(InMemoryContentStore::new());
        seed_demo_content(store.as_ref()).await.unwrap();
        let services = ServiceRegistryBuilder::new()
            .store(store.clone())
            .build()
            .unwrap();

        let response = services
            .dispatch()
            .dispatch_studio_edits(
                "block-v1:Demo+Intro+2024+type@html+block@welcome",
                HandlerRequest::new("GET"),
                &UserId::new("1"),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 405);
        assert_eq!(store.update_count(), 1);
        assert!(services.store().ping().await.is_ok());
    }
}
