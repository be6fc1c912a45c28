//! Edit dispatch service
//!
//! Resolves a usage key to a block or an aside, runs the Studio edit
//! handler on it, and writes the result back to the store.

use async_trait::async_trait;
use std::sync::Arc;
use studio_bridge_core::{
    BlockRuntime, DispatchTarget, EditRuntime, HandlerRequest, HandlerResponse, UsageKey, UserId,
    STUDIO_EDIT_HANDLER,
};
use studio_bridge_db::ContentStore;
use tracing::{debug, instrument};

use crate::error::{ServiceError, ServiceResult};

/// Trait for dispatching Studio edits
#[async_trait]
pub trait EditDispatchService: Send + Sync {
    /// Run `submit_studio_edits` on the block or aside named by `usage_key`
    async fn dispatch_studio_edits(
        &self,
        usage_key: &str,
        request: HandlerRequest,
        user: &UserId,
    ) -> ServiceResult<HandlerResponse>;
}

/// Default implementation of EditDispatchService
pub struct DefaultEditDispatchService {
    store: Arc<dyn ContentStore>,
    runtime: Arc<BlockRuntime>,
}

impl DefaultEditDispatchService {
    pub fn new(store: Arc<dyn ContentStore>, runtime: Arc<BlockRuntime>) -> Self {
        Self { store, runtime }
    }

    /// Load the block or aside the key names
    async fn resolve(&self, usage_key: UsageKey, user: &UserId) -> ServiceResult<DispatchTarget> {
        match usage_key {
            UsageKey::Aside(aside_key) => {
                let host = self.store.get_item(aside_key.usage_key()).await?;
                let aside = self
                    .runtime
                    .aside_instance(&host, aside_key.aside_type())
                    .ok_or_else(|| ServiceError::AsideNotFound(aside_key.to_string()))?;
                Ok(DispatchTarget::Aside { host, aside })
            }
            UsageKey::Block(location) => {
                let mut block = self.store.get_item(&location).await?;
                block.bind_runtime(EditRuntime::new(user.clone()));
                Ok(DispatchTarget::Block(block))
            }
        }
    }
}

#[async_trait]
impl EditDispatchService for DefaultEditDispatchService {
    #[instrument(skip(self, request), fields(method = %request.method, user = %user))]
    async fn dispatch_studio_edits(
        &self,
        usage_key: &str,
        request: HandlerRequest,
        user: &UserId,
    ) -> ServiceResult<HandlerResponse> {
        let key: UsageKey = usage_key.parse()?;
        let mut target = self.resolve(key, user).await?;

        let response = target.handle(&self.runtime, STUDIO_EDIT_HANDLER, &request, "")?;
        let host = target.host();
        debug!(
            status = response.status,
            aside = target.is_aside(),
            display_name = ?self.runtime.display_name(host),
            bound_at = ?host.runtime().map(EditRuntime::bound_at),
            "Handler completed"
        );

        let (block, asides) = target.into_write_back();
        self.store.update_item(&block, user, &asides).await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use studio_bridge_core::runtime::{HandlerContext, SAVED_TAGS_FIELD, TAGGING_ASIDE};
    use studio_bridge_core::{BlockType, XBlockHandler};
    use studio_bridge_db::{seed_demo_content, InMemoryContentStore};

    const HTML: &str = "block-v1:Demo+Intro+2024+type@html+block@welcome";
    const UNIT: &str = "block-v1:Demo+Intro+2024+type@vertical+block@unit1";

    struct Noop;

    impl XBlockHandler for Noop {
        fn handle(
            &self,
            _ctx: HandlerContext<'_>,
            _request: &HandlerRequest,
            _suffix: &str,
        ) -> HandlerResponse {
            HandlerResponse::new(204, "text/plain", Vec::new())
        }
    }

    async fn setup(runtime: BlockRuntime) -> (Arc<InMemoryContentStore>, DefaultEditDispatchService) {
        let store = Arc::new(InMemoryContentStore::new());
        seed_demo_content(store.as_ref()).await.unwrap();
        let service = DefaultEditDispatchService::new(store.clone(), Arc::new(runtime));
        (store, service)
    }

    fn user() -> UserId {
        UserId::new("editor")
    }

    #[tokio::test]
    async fn test_block_edit_is_written_back() {
        let (store, service) = setup(BlockRuntime::with_defaults()).await;

        let response = service
            .dispatch_studio_edits(
                HTML,
                HandlerRequest::post_json(&json!({"values": {"display_name": "Hello"}})),
                &user(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(store.update_count(), 1);
        let stored = store.get_item(&HTML.parse().unwrap()).await.unwrap();
        assert_eq!(stored.display_name(), Some("Hello"));
        assert_eq!(stored.edit_info.edited_by, Some(user()));
    }

    #[tokio::test]
    async fn test_noop_handler_still_writes_back() {
        let runtime = BlockRuntime::new().register_block(BlockType::new("html").handler(STUDIO_EDIT_HANDLER, Noop));
        let (store, service) = setup(runtime).await;

        let response = service
            .dispatch_studio_edits(HTML, HandlerRequest::new("POST"), &user())
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn test_handler_error_response_still_writes_back() {
        let (store, service) = setup(BlockRuntime::with_defaults()).await;

        let response = service
            .dispatch_studio_edits(HTML, HandlerRequest::new("GET"), &user())
            .await
            .unwrap();

        assert_eq!(response.status, 405);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn test_block_without_handler_is_not_found() {
        let (store, service) = setup(BlockRuntime::with_defaults()).await;

        let err = service
            .dispatch_studio_edits(UNIT, HandlerRequest::new("POST"), &user())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NoSuchHandler { .. }));
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_aside_without_handler_is_not_found() {
        let (store, service) = setup(BlockRuntime::with_defaults()).await;
        let aside_key = format!(
            "aside-usage-v2:{}::{}",
            HTML.replace(':', "$:"),
            TAGGING_ASIDE
        );

        let err = service
            .dispatch_studio_edits(&aside_key, HandlerRequest::new("POST"), &user())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NoSuchHandler { .. }));
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_aside_edit_is_written_back_with_host() {
        let runtime = BlockRuntime::with_defaults().register_aside(
            BlockType::new(TAGGING_ASIDE)
                .field(studio_bridge_core::FieldSpec::editable(
                    SAVED_TAGS_FIELD,
                    studio_bridge_core::FieldKind::Dict,
                ))
                .studio_editable(),
        );
        let (store, service) = setup(runtime).await;
        let aside_key = format!("aside-usage-v1:{}::{}", HTML, TAGGING_ASIDE);

        let response = service
            .dispatch_studio_edits(
                &aside_key,
                HandlerRequest::post_json(&json!({"values": {"saved_tags": {"level": "intro"}}})),
                &user(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(store.update_count(), 1);
        let stored = store.get_item(&HTML.parse().unwrap()).await.unwrap();
        assert_eq!(
            stored.aside(TAGGING_ASIDE).unwrap().fields[SAVED_TAGS_FIELD],
            json!({"level": "intro"})
        );
    }

    #[tokio::test]
    async fn test_unknown_aside_is_not_found() {
        let (store, service) = setup(BlockRuntime::with_defaults()).await;
        let aside_key = format!("aside-usage-v1:{}::{}", HTML, "unregistered_aside");

        let err = service
            .dispatch_studio_edits(&aside_key, HandlerRequest::new("POST"), &user())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::AsideNotFound(_)));
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_block_and_bad_key() {
        let (_store, service) = setup(BlockRuntime::with_defaults()).await;

        let err = service
            .dispatch_studio_edits(
                "block-v1:Demo+Intro+2024+type@html+block@ghost",
                HandlerRequest::new("POST"),
                &user(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = service
            .dispatch_studio_edits("garbage", HandlerRequest::new("POST"), &user())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidKey(_)));
    }
}
