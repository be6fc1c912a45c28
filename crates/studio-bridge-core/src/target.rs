//! Resolved handler dispatch targets

use crate::block::{AsideInstance, ContentBlock};
use crate::error::Result;
use crate::runtime::{BlockRuntime, HandlerRequest, HandlerResponse};

/// The thing a handler call is addressed to: a block, or an aside on a block
#[derive(Debug, Clone)]
pub enum DispatchTarget {
    Block(ContentBlock),
    Aside {
        host: ContentBlock,
        aside: AsideInstance,
    },
}

impl DispatchTarget {
    /// Block that owns the target and is written back after dispatch
    pub fn host(&self) -> &ContentBlock {
        match self {
            DispatchTarget::Block(block) => block,
            DispatchTarget::Aside { host, .. } => host,
        }
    }

    pub fn is_aside(&self) -> bool {
        matches!(self, DispatchTarget::Aside { .. })
    }

    /// Invoke the named handler on the target
    pub fn handle(
        &mut self,
        runtime: &BlockRuntime,
        handler: &str,
        request: &HandlerRequest,
        suffix: &str,
    ) -> Result<HandlerResponse> {
        match self {
            DispatchTarget::Block(block) => runtime.handle_block(block, handler, request, suffix),
            DispatchTarget::Aside { host, aside } => {
                runtime.handle_aside(host, aside, handler, request, suffix)
            }
        }
    }

    /// The host block and the aside state to persist alongside it
    pub fn into_write_back(self) -> (ContentBlock, Vec<AsideInstance>) {
        match self {
            DispatchTarget::Block(block) => (block, Vec::new()),
            DispatchTarget::Aside { host, aside } => (host, vec![aside]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{SAVED_TAGS_FIELD, STUDIO_EDIT_HANDLER, TAGGING_ASIDE};
    use serde_json::json;

    fn host() -> ContentBlock {
        ContentBlock::new(
            "block-v1:Org+C+R+type@html+block@h1"
                .parse()
                .unwrap(),
        )
    }

    #[test]
    fn test_block_target_writes_back_without_asides() {
        let runtime = BlockRuntime::with_defaults();
        let mut target = DispatchTarget::Block(host());
        let response = target
            .handle(
                &runtime,
                STUDIO_EDIT_HANDLER,
                &HandlerRequest::post_json(&json!({"values": {"display_name": "Welcome"}})),
                "",
            )
            .unwrap();
        assert_eq!(response.status, 200);

        let (block, asides) = target.into_write_back();
        assert_eq!(block.display_name(), Some("Welcome"));
        assert!(asides.is_empty());
    }

    #[test]
    fn test_aside_target_writes_back_aside() {
        let runtime = BlockRuntime::with_defaults();
        let host = host();
        let aside = runtime.aside_instance(&host, TAGGING_ASIDE).unwrap();
        let mut target = DispatchTarget::Aside { host, aside };
        assert!(target.is_aside());

        target
            .handle(
                &runtime,
                "save_tags",
                &HandlerRequest::post_json(&json!({"topic": "algebra"})),
                "",
            )
            .unwrap();

        let (block, asides) = target.into_write_back();
        assert!(block.fields.is_empty());
        assert_eq!(asides.len(), 1);
        assert_eq!(asides[0].fields[SAVED_TAGS_FIELD], json!({"topic": "algebra"}));
    }

    #[test]
    fn test_host_is_the_written_back_block() {
        let block = DispatchTarget::Block(host());
        assert_eq!(block.host().location, host().location);

        let runtime = BlockRuntime::with_defaults();
        let aside = runtime.aside_instance(&host(), TAGGING_ASIDE).unwrap();
        let target = DispatchTarget::Aside { host: host(), aside };
        let location = target.host().location.clone();
        let (written, _) = target.into_write_back();
        assert_eq!(written.location, location);
    }

    #[test]
    fn test_aside_without_studio_handler() {
        let runtime = BlockRuntime::with_defaults();
        let host = host();
        let aside = runtime.aside_instance(&host, TAGGING_ASIDE).unwrap();
        let mut target = DispatchTarget::Aside { host, aside };
        assert!(target
            .handle(&runtime, STUDIO_EDIT_HANDLER, &HandlerRequest::new("POST"), "")
            .is_err());
    }
}
