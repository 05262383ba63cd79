//! Response envelopes of the library information ("Naru") open API
//!
//! Every endpoint wraps its payload as
//! `{"response": {"<list>": [{"<item>": {field: value, ...}}, ...]}}`.
//! Items are flattened to string fields; scalar values are stringified and
//! nested values are ignored.

use serde_json::Value;

use crate::error::{Result, ShelfmarkError};
use crate::models::Fields;

/// List and item keys of the book search endpoint
pub const BOOK_LIST: (&str, &str) = ("docs", "doc");

/// List and item keys of the library-by-book endpoint
pub const LIBRARY_LIST: (&str, &str) = ("libs", "lib");

/// Extract the item field maps from a response body.
///
/// A body that is not JSON yields no items. An `error` string inside the
/// envelope is reported as an API error.
pub fn parse_items(body: &str, list_key: &str, item_key: &str) -> Result<Vec<Fields>> {
    let root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Could not decode API response: {}", e);
            return Ok(Vec::new());
        }
    };

    let envelope = root.get("response").unwrap_or(&root);

    if let Some(err) = envelope.get("error").and_then(Value::as_str) {
        return Err(ShelfmarkError::Api(err.to_string()));
    }

    let Some(list) = envelope.get(list_key).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let items = list
        .iter()
        .map(|entry| entry.get(item_key).unwrap_or(entry))
        .filter_map(flatten)
        .filter(|fields| !fields.is_empty())
        .collect();

    Ok(items)
}

/// Number of matches the server reports, if present
pub fn num_found(body: &str) -> Option<u64> {
    let root: Value = serde_json::from_str(body).ok()?;
    let envelope = root.get("response").unwrap_or(&root);
    match envelope.get("numFound")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flatten(item: &Value) -> Option<Fields> {
    let object = item.as_object()?;
    let mut fields = Fields::new();

    for (key, value) in object {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => continue,
        };
        fields.insert(key.clone(), text);
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS: &str = r#"{
        "response": {
            "request": {"keyword": "파이썬", "pageNo": 1, "pageSize": 2},
            "numFound": 2,
            "docs": [
                {"doc": {"bookname": " 파이썬 코딩의 기술 ", "isbn13": "9788966263370", "vol": ""}},
                {"doc": {"bookname": "혼자 공부하는 파이썬", "isbn13": 9791162241882}}
            ]
        }
    }"#;

    #[test]
    fn test_parse_book_items() {
        let (list, item) = BOOK_LIST;
        let items = parse_items(BOOKS, list, item).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["bookname"], "파이썬 코딩의 기술");
        assert_eq!(items[0]["vol"], "");
        assert_eq!(items[1]["isbn13"], "9791162241882");
        assert_eq!(num_found(BOOKS), Some(2));
    }

    #[test]
    fn test_unwrapped_items_and_missing_envelope() {
        let body = r#"{"libs": [{"libCode": "111017", "libName": "종로도서관"}, {"lib": {}}]}"#;
        let (list, item) = LIBRARY_LIST;
        let items = parse_items(body, list, item).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["libCode"], "111017");
    }

    #[test]
    fn test_nested_values_are_skipped() {
        let body = r#"{"response": {"libs": [{"lib": {"libCode": "1", "extra": {"a": 1}, "closed": null}}]}}"#;
        let items = parse_items(body, "libs", "lib").unwrap();
        assert!(!items[0].contains_key("extra"));
        assert_eq!(items[0]["closed"], "");
    }

    #[test]
    fn test_api_error_is_reported() {
        let body = r#"{"response": {"error": "API 인증키가 유효하지 않습니다."}}"#;
        let err = parse_items(body, "docs", "doc").unwrap_err();
        assert!(matches!(err, ShelfmarkError::Api(_)));
    }

    #[test]
    fn test_garbage_yields_no_items() {
        assert!(parse_items("<html>oops</html>", "docs", "doc").unwrap().is_empty());
        assert!(parse_items(r#"{"response": {}}"#, "docs", "doc").unwrap().is_empty());
        assert_eq!(num_found("nope"), None);
    }
}
