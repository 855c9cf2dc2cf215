//! Parsing of the scoring service's highlight list.

use crate::error::{CorteError, Result};
use serde_json::{Map, Value};

/// One window as proposed by the scoring service, before range checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedWindow {
    pub start: f64,
    pub end: f64,
    pub reason: String,
    /// Duration stated by the service, if it sent one.
    pub stated_duration: Option<f64>,
}

/// Locate the JSON array inside a model response and validate every entry.
///
/// Markdown fences and surrounding chatter are tolerated, including chatter
/// that contains brackets of its own. Any structural problem in the chosen
/// array fails the whole response.
pub fn parse_windows(response: &str) -> Result<Vec<ProposedWindow>> {
    let entries = fenced_block(response)
        .and_then(find_array)
        .or_else(|| find_array(response))
        .ok_or_else(|| malformed("no JSON array found", response))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i, entry))
        .collect()
}

/// Body of the first closed markdown code fence.
fn fenced_block(response: &str) -> Option<&str> {
    let open = response.find("```")?;
    let after = &response[open + 3..];
    // Skip the info string (`json`) up to the end of the fence line.
    let body = &after[after.find('\n').map(|i| i + 1).unwrap_or(0)..];
    body.find("```").map(|close| &body[..close])
}

/// Pick among the JSON arrays that start at any `[` in `text`.
///
/// The first non-empty array of objects wins, then the first array of
/// objects, then the first array at all so its entries can be reported.
fn find_array(text: &str) -> Option<Vec<Value>> {
    let candidates: Vec<Vec<Value>> = text
        .match_indices('[')
        .filter_map(|(i, _)| {
            serde_json::Deserializer::from_str(&text[i..])
                .into_iter::<Value>()
                .next()
                .and_then(|parsed| parsed.ok())
        })
        .filter_map(|value| match value {
            Value::Array(entries) => Some(entries),
            _ => None,
        })
        .collect();

    let all_objects = |entries: &&Vec<Value>| entries.iter().all(Value::is_object);

    let chosen = candidates
        .iter()
        .filter(all_objects)
        .find(|entries| !entries.is_empty())
        .or_else(|| candidates.iter().find(all_objects))
        .or_else(|| candidates.first())?;
    Some(chosen.clone())
}

fn parse_entry(i: usize, entry: &Value) -> Result<ProposedWindow> {
    let obj = entry.as_object().ok_or_else(|| {
        CorteError::MalformedScoringResponse(format!("entry {i} is not an object"))
    })?;

    let start = time_field(i, obj, "start")?;
    let end = time_field(i, obj, "end")?;

    let reason = match obj.get("reason") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => {
            return Err(CorteError::MalformedScoringResponse(format!(
                "entry {i} has no reason"
            )))
        }
        Some(other) => other.to_string(),
    };

    if start >= end {
        return Err(CorteError::MalformedScoringResponse(format!(
            "entry {i} starts at {start} but ends at {end}"
        )));
    }

    let stated_duration = obj.get("duration").and_then(as_seconds);

    Ok(ProposedWindow {
        start,
        end,
        reason,
        stated_duration,
    })
}

fn time_field(i: usize, obj: &Map<String, Value>, key: &str) -> Result<f64> {
    let value = obj.get(key).ok_or_else(|| {
        CorteError::MalformedScoringResponse(format!("entry {i} is missing \"{key}\""))
    })?;

    as_seconds(value).ok_or_else(|| {
        CorteError::MalformedScoringResponse(format!(
            "entry {i} has a non-numeric \"{key}\": {value}"
        ))
    })
}

/// Numbers and numeric strings; anything else, or a non-finite value, is rejected.
fn as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('s').trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn malformed(what: &str, response: &str) -> CorteError {
    let preview: String = response.chars().take(300).collect();
    CorteError::MalformedScoringResponse(format!("{what}. Response was: {preview}"))
}
