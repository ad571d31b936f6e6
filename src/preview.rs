//! JSON preview of a compiled query, for display and copy-to-clipboard.

use crate::config::PreviewConfig;
use crate::error::Result;
use crate::query::Query;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

/// Request body shape used when `wrap_in_query` is set
#[derive(Debug, Serialize, Deserialize)]
struct SearchBody<Q> {
    query: Q,
}

/// Render the compiled document. An absent document renders as `null`.
///
/// With `indent == 0` the output is compact.
pub fn render(query: Option<&Query>, config: &PreviewConfig) -> Result<String> {
    let Some(query) = query else {
        return Ok("null".to_string());
    };

    if config.wrap_in_query {
        write_json(&SearchBody { query }, config.indent)
    } else {
        write_json(query, config.indent)
    }
}

/// Parse a document previously produced by [`render`] with the same config.
pub fn parse(text: &str, config: &PreviewConfig) -> Result<Option<Query>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_null() {
        return Ok(None);
    }
    if config.wrap_in_query {
        let body: SearchBody<Query> = serde_json::from_value(value)?;
        Ok(Some(body.query))
    } else {
        Ok(Some(serde_json::from_value(value)?))
    }
}

fn write_json<T: Serialize>(value: &T, indent: usize) -> Result<String> {
    if indent == 0 {
        return Ok(serde_json::to_string(value)?);
    }

    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(out)?)
}
