use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static INTERNAL_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<internal>[\s\S]*?</internal>").unwrap());

static CODE_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?[ \t]*\n?([\s\S]*?)```").unwrap());

/// Removes reasoning blocks some models emit before the answer.
pub(crate) fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    let cleaned = INTERNAL_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Finds the JSON payload inside an oracle reply.
///
/// Accepts bare JSON, an OpenAI-style completion envelope, a fenced code
/// block, or a JSON array/object surrounded by prose.
pub(crate) fn extract_json_payload(output: &str) -> Option<Value> {
    let cleaned = clean_llm_response(output);

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        if let Some(content) = value
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            return extract_from_text(&clean_llm_response(content));
        }
        return Some(value);
    }

    extract_from_text(&cleaned)
}

fn extract_from_text(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    for captures in CODE_FENCE_PATTERN.captures_iter(text) {
        if let Some(body) = captures.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim()) {
                return Some(value);
            }
        }
    }

    locate_embedded_json(text)
}

/// Tries the outermost `[..]` and `{..}` spans, whichever opens first.
fn locate_embedded_json(text: &str) -> Option<Value> {
    let mut spans: Vec<(usize, char, char)> = [('[', ']'), ('{', '}')]
        .into_iter()
        .filter_map(|(open, close)| text.find(open).map(|start| (start, open, close)))
        .collect();
    spans.sort_by_key(|(start, _, _)| *start);

    spans.into_iter().find_map(|(start, _, close)| {
        let end = text.rfind(close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<Value>(&text[start..=end]).ok()
    })
}

/// First `max_chars` characters, for log lines and error messages.
pub(crate) fn preview_text(value: &str, max_chars: usize) -> String {
    let mut preview: String = value.chars().take(max_chars).collect();
    if value.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}
