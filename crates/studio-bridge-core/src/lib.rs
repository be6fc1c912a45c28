//! Core domain models for Studio Bridge
//!
//! This crate holds the opaque key formats that address courses, libraries,
//! blocks and asides, the content block model, and the block runtime that
//! dispatches named handlers such as Studio's field edit handler.

pub mod block;
pub mod error;
pub mod keys;
pub mod runtime;
pub mod target;
pub mod types;

// Re-exports for convenience
pub use block::{AsideInstance, ContentBlock, EditInfo, EditRuntime, FieldData};
pub use error::{KeyError, Result, StudioError};
pub use keys::{
    AsideKeyVersion, AsideUsageKey, BlockUsageLocator, ContextKey, CourseLocator, LibraryLocator,
    UsageKey,
};
pub use runtime::{
    BlockRuntime, BlockType, FieldKind, FieldSpec, HandlerContext, HandlerRequest,
    HandlerResponse, Template, XBlockHandler, STUDIO_EDIT_HANDLER,
};
pub use target::DispatchTarget;
pub use types::{is_library_category, new_block_id, UserId, LIBRARY_CATEGORIES};
