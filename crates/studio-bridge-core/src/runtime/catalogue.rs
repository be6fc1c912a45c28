//! Standard block and aside types

use serde_json::json;

use super::fields::{FieldKind, FieldSpec};
use super::tagging::{SaveTagsHandler, SAVED_TAGS_FIELD, TAGGING_ASIDE};
use super::{BlockRuntime, BlockType, Template};

/// Containers that structure a course or library; none expose handlers
const STRUCTURAL_TYPES: [(&str, &str); 5] = [
    ("course", "Empty"),
    ("library", "Library"),
    ("chapter", "Section"),
    ("sequential", "Subsection"),
    ("vertical", "Unit"),
];

pub(super) fn default_runtime() -> BlockRuntime {
    let mut runtime = BlockRuntime::new()
        .register_block(html())
        .register_block(problem())
        .register_block(video())
        .register_block(discussion())
        .register_block(lti_consumer())
        .register_aside(
            BlockType::new(TAGGING_ASIDE)
                .field(FieldSpec::internal(SAVED_TAGS_FIELD, FieldKind::Dict).with_default(json!({})))
                .handler("save_tags", SaveTagsHandler),
        );

    for (name, title) in STRUCTURAL_TYPES {
        let mut block_type = BlockType::new(name).field(
            FieldSpec::internal("display_name", FieldKind::String).with_default(json!(title)),
        );
        if name == "sequential" {
            block_type = block_type
                .field(FieldSpec::internal("format", FieldKind::String))
                .field(FieldSpec::internal("graded", FieldKind::Boolean).with_default(json!(false)));
        }
        runtime = runtime.register_block(block_type);
    }

    runtime
}

fn display_name(default: &str) -> FieldSpec {
    FieldSpec::editable("display_name", FieldKind::String).with_default(json!(default))
}

fn html() -> BlockType {
    BlockType::new("html")
        .field(display_name("Text"))
        .field(FieldSpec::editable("data", FieldKind::String).with_default(json!("")))
        .field(FieldSpec::editable("editor", FieldKind::String).with_default(json!("visual")))
        .studio_editable()
        .template(
            Template::new("announcement.yaml")
                .field("display_name", json!("Announcement"))
                .field(
                    "data",
                    json!("<h3 class=\"hd hd-2\">Announcement</h3><p>Enter the announcement text here.</p>"),
                ),
        )
        .template(
            Template::new("raw.yaml")
                .field("display_name", json!("Raw HTML"))
                .field("editor", json!("raw"))
                .field("data", json!("")),
        )
}

fn problem() -> BlockType {
    BlockType::new("problem")
        .field(display_name("Blank Advanced Problem"))
        .field(FieldSpec::editable("data", FieldKind::String).with_default(json!("<problem></problem>")))
        .field(FieldSpec::editable("max_attempts", FieldKind::Integer))
        .field(FieldSpec::editable("weight", FieldKind::Float))
        .field(FieldSpec::editable("showanswer", FieldKind::String).with_default(json!("finished")))
        .field(FieldSpec::editable("rerandomize", FieldKind::String).with_default(json!("never")))
        .studio_editable()
        .template(
            Template::new("multiplechoice.yaml")
                .field("display_name", json!("Multiple Choice"))
                .field(
                    "data",
                    json!("<problem><multiplechoiceresponse><choicegroup type=\"MultipleChoice\"><choice correct=\"true\">Correct</choice><choice correct=\"false\">Incorrect</choice></choicegroup></multiplechoiceresponse></problem>"),
                ),
        )
        .template(
            Template::new("checkboxes_response.yaml")
                .field("display_name", json!("Checkboxes"))
                .field(
                    "data",
                    json!("<problem><choiceresponse><checkboxgroup><choice correct=\"true\">A</choice><choice correct=\"false\">B</choice></checkboxgroup></choiceresponse></problem>"),
                ),
        )
}

fn video() -> BlockType {
    BlockType::new("video")
        .field(display_name("Video"))
        .field(FieldSpec::editable("youtube_id_1_0", FieldKind::String).with_default(json!("")))
        .field(FieldSpec::editable("html5_sources", FieldKind::List).with_default(json!([])))
        .field(FieldSpec::editable("start_time", FieldKind::String).with_default(json!("00:00:00")))
        .field(FieldSpec::editable("end_time", FieldKind::String).with_default(json!("00:00:00")))
        .field(FieldSpec::editable("download_video", FieldKind::Boolean).with_default(json!(false)))
        .studio_editable()
}

fn discussion() -> BlockType {
    BlockType::new("discussion")
        .field(display_name("Discussion"))
        .field(FieldSpec::editable("discussion_category", FieldKind::String).with_default(json!("Week 1")))
        .field(
            FieldSpec::editable("discussion_target", FieldKind::String)
                .with_default(json!("Topic-Level Student-Visible Label")),
        )
        .studio_editable()
}

fn lti_consumer() -> BlockType {
    BlockType::new("lti_consumer")
        .field(display_name("LTI Consumer"))
        .field(FieldSpec::editable("description", FieldKind::String).with_default(json!("")))
        .field(FieldSpec::editable("lti_id", FieldKind::String).with_default(json!("")))
        .field(FieldSpec::editable("launch_url", FieldKind::String).with_default(json!("")))
        .field(FieldSpec::editable("custom_parameters", FieldKind::List).with_default(json!([])))
        .field(FieldSpec::editable("launch_target", FieldKind::String).with_default(json!("iframe")))
        .field(FieldSpec::editable("has_score", FieldKind::Boolean).with_default(json!(false)))
        .field(FieldSpec::editable("weight", FieldKind::Float).with_default(json!(1.0)))
        .field(FieldSpec::editable("button_text", FieldKind::String).with_default(json!("Launch")))
        .studio_editable()
}
