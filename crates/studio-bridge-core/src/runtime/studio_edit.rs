//! The Studio edit handler shared by every editable block type

use serde_json::{json, Value};
use tracing::debug;

use super::request::{HandlerRequest, HandlerResponse};
use super::{HandlerContext, XBlockHandler};

/// Applies `{"values": {...}, "defaults": [...]}` edits to a block's fields.
///
/// Values are checked against the declared field kinds before anything is
/// written; a single bad value rejects the whole edit. Names listed in
/// `defaults` are reset only when they are currently set and not also
/// present in `values`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StudioEditHandler;

impl XBlockHandler for StudioEditHandler {
    fn handle(
        &self,
        ctx: HandlerContext<'_>,
        request: &HandlerRequest,
        _suffix: &str,
    ) -> HandlerResponse {
        if !request.is_post() {
            return HandlerResponse::json_error(405, json!("Method must be POST"));
        }

        let data: Value = match request.json() {
            Ok(data) => data,
            Err(_) => return HandlerResponse::json_error(400, json!("Invalid JSON")),
        };

        let values = data
            .get("values")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let defaults: Vec<&str> = data
            .get("defaults")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut updates = Vec::new();
        let mut resets = Vec::new();
        let mut messages = Vec::new();

        for spec in ctx.field_specs.iter().filter(|spec| spec.editable) {
            if let Some(value) = values.get(&spec.name) {
                match spec.kind.check(value) {
                    Ok(()) => updates.push((spec.name.clone(), value.clone())),
                    Err(reason) => messages.push(json!({
                        "type": "error",
                        "text": format!("{}: {}", spec.name, reason),
                    })),
                }
            } else if defaults.contains(&spec.name.as_str()) && ctx.fields.contains_key(&spec.name) {
                resets.push(spec.name.clone());
            }
        }

        if !messages.is_empty() {
            return HandlerResponse::json_error(
                400,
                json!({
                    "xblock_id": ctx.usage_id,
                    "empty": false,
                    "messages": messages,
                }),
            );
        }

        debug!(
            usage_id = %ctx.usage_id,
            updated = updates.len(),
            reset = resets.len(),
            "Applying studio edits"
        );

        for (name, value) in updates {
            ctx.fields.insert(name, value);
        }
        for name in resets {
            ctx.fields.remove(&name);
        }

        HandlerResponse::success()
    }
}
