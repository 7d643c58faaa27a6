use serde_json::Value;
use std::collections::HashMap;

/// Body of a fetched document, classified by what it looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Html(String),
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Json,
    Text,
}

impl RawContent {
    /// Classifies `body` using the `content-type` header when present and the
    /// leading characters of the body otherwise. JSON that fails to parse is
    /// kept as text.
    pub fn from_body(headers: &HashMap<String, String>, body: String) -> Self {
        match detect_content_type(headers, &body) {
            ContentType::Json => match serde_json::from_str(&body) {
                Ok(value) => RawContent::Json(value),
                Err(_) => RawContent::Text(body),
            },
            ContentType::Html => RawContent::Html(body),
            ContentType::Text => RawContent::Text(body),
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            RawContent::Html(_) => ContentType::Html,
            RawContent::Json(_) => ContentType::Json,
            RawContent::Text(_) => ContentType::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawContent::Html(body) | RawContent::Text(body) => body.len(),
            RawContent::Json(value) => value.to_string().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn detect_content_type(headers: &HashMap<String, String>, body: &str) -> ContentType {
    if let Some(content_type) = headers.get("content-type") {
        if content_type.contains("text/html") || content_type.contains("application/xhtml") {
            return ContentType::Html;
        } else if content_type.contains("json") {
            return ContentType::Json;
        }
    }

    let start = body.trim_start();
    if start.starts_with('{') || start.starts_with('[') {
        ContentType::Json
    } else if starts_with_ignore_case(start, "<!doctype") || starts_with_ignore_case(start, "<html") {
        ContentType::Html
    } else {
        ContentType::Text
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(content_type: &str) -> HashMap<String, String> {
        HashMap::from([("content-type".to_string(), content_type.to_string())])
    }

    #[test]
    fn test_header_takes_precedence() {
        let content = RawContent::from_body(&headers("text/html; charset=utf-8"), "{}".to_string());
        assert_eq!(content.content_type(), ContentType::Html);
    }

    #[test]
    fn test_sniffs_body_without_header() {
        let none = HashMap::new();
        assert_eq!(detect_content_type(&none, "  [1, 2]"), ContentType::Json);
        assert_eq!(detect_content_type(&none, "<!DOCTYPE html><html>"), ContentType::Html);
        assert_eq!(detect_content_type(&none, "plain words"), ContentType::Text);
    }

    #[test]
    fn test_invalid_json_falls_back_to_text() {
        let content = RawContent::from_body(&headers("application/json"), "{oops".to_string());
        assert_eq!(content, RawContent::Text("{oops".to_string()));
    }
}
