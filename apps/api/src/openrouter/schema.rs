//! Translation from a schemars-derived schema into the JSON-schema payload
//! OpenRouter accepts inside `response_format.json_schema.schema`.

use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// Produces the provider-facing JSON schema for `T`.
///
/// OpenRouter rejects JSON Schema meta-fields, so the top-level `$schema`
/// key emitted by schemars is stripped. Pure transformation, no state.
pub fn provider_schema<T: JsonSchema>() -> Value {
    let mut schema = schema_for!(T).to_value();
    if let Some(map) = schema.as_object_mut() {
        map.remove("$schema");
    }
    schema
}
