//! Demo content for development servers and tests

use serde_json::{json, Value};
use studio_bridge_core::{BlockUsageLocator, ContentBlock, UserId};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::store::ContentStore;

/// Root block of the demo course
pub const DEMO_COURSE_ROOT: &str = "block-v1:Demo+Intro+2024+type@course+block@course";
/// Unit inside the demo course that new components are added to
pub const DEMO_COURSE_UNIT: &str = "block-v1:Demo+Intro+2024+type@vertical+block@unit1";
/// Graded subsection of the demo course
pub const DEMO_COURSE_SEQUENTIAL: &str = "block-v1:Demo+Intro+2024+type@sequential+block@lesson1";
/// Editable html component of the demo course
pub const DEMO_COURSE_HTML: &str = "block-v1:Demo+Intro+2024+type@html+block@welcome";
/// Editable problem component of the demo course
pub const DEMO_COURSE_PROBLEM: &str = "block-v1:Demo+Intro+2024+type@problem+block@quiz1";
/// Root block of the demo library
pub const DEMO_LIBRARY_ROOT: &str = "lib-block-v1:Org+Lib+type@library+block@library";
/// Container inside the demo library
pub const DEMO_LIBRARY_VERTICAL: &str = "lib-block-v1:Org+Lib+type@vertical+block@abc";

const SEED_USER: &str = "seed";

/// Demo blocks in parent-first order: key, parent key, fields
fn demo_blocks() -> Vec<(&'static str, Option<&'static str>, Value)> {
    vec![
        (DEMO_COURSE_ROOT, None, json!({"display_name": "Introduction to Studio"})),
        (
            "block-v1:Demo+Intro+2024+type@chapter+block@week1",
            Some(DEMO_COURSE_ROOT),
            json!({"display_name": "Week 1"}),
        ),
        (
            DEMO_COURSE_SEQUENTIAL,
            Some("block-v1:Demo+Intro+2024+type@chapter+block@week1"),
            json!({"display_name": "Getting Started"}),
        ),
        (
            DEMO_COURSE_UNIT,
            Some(DEMO_COURSE_SEQUENTIAL),
            json!({"display_name": "Unit 1"}),
        ),
        (
            DEMO_COURSE_HTML,
            Some(DEMO_COURSE_UNIT),
            json!({"display_name": "Welcome", "data": "<p>Welcome to the course.</p>"}),
        ),
        (
            DEMO_COURSE_PROBLEM,
            Some(DEMO_COURSE_UNIT),
            json!({"display_name": "Check your understanding", "weight": 1.0}),
        ),
        (DEMO_LIBRARY_ROOT, None, json!({"display_name": "Demo Library"})),
        (
            DEMO_LIBRARY_VERTICAL,
            Some(DEMO_LIBRARY_ROOT),
            json!({"display_name": "Shared components"}),
        ),
    ]
}

/// Seed the demo course and library.
///
/// Blocks that already exist are left untouched, so seeding a persistent
/// store on every start is safe. Returns the keys that were created.
pub async fn seed_demo_content(store: &dyn ContentStore) -> DbResult<Vec<BlockUsageLocator>> {
    let user = UserId::new(SEED_USER);
    let mut created = Vec::new();

    for (key, parent, fields) in demo_blocks() {
        let location = parse(key)?;
        if store.has_item(&location).await? {
            debug!(location = %location, "Demo block already present");
            continue;
        }

        let mut block = ContentBlock::new(location.clone());
        if let Value::Object(fields) = fields {
            block.apply_fields(&fields);
        }

        match parent {
            Some(parent) => {
                store.create_child(&parse(parent)?, block, &user).await?;
            }
            None => {
                store.insert_item(block, &user).await?;
            }
        }
        created.push(location);
    }

    info!(created = created.len(), "Demo content seeded");
    Ok(created)
}

fn parse(key: &str) -> DbResult<BlockUsageLocator> {
    key.parse()
        .map_err(|e| DbError::InvalidData(format!("Invalid demo key '{}': {}", key, e)))
}
