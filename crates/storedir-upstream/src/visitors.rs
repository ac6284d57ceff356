//! Visitor-summary normalization.
//!
//! Upstream versions report per-store visit counts in several layouts. The
//! browser always receives:
//!
//! ```json
//! { "total_visitors": 12, "by_store": [{ "store_id": "a", "store_name": "A", "count": 5 }] }
//! ```
//!
//! Shapes are detected structurally, first match wins:
//! 1. `perStore` array (entries mapped field by field)
//! 2. `by_store` / `byStore` / `stores` array (renamed only)
//! 3. `data` array (wrapped)
//! 4. anything else is returned unchanged

use serde_json::{json, Map, Number, Value};

/// Reshapes a visitor-summary payload into the canonical shape.
#[must_use]
pub fn normalize_visitor_summary(value: Value) -> Value {
    let object = match value {
        Value::Object(object) => object,
        other => return other,
    };

    if let Some(Value::Array(per_store)) = object.get("perStore") {
        let by_store: Vec<Value> = per_store.iter().filter_map(per_store_entry).collect();
        let total = coerce_number(first_field(&object, &["totalVisitors", "total"]));
        return json!({ "total_visitors": total, "by_store": by_store });
    }

    if let Some(by_store) = ["by_store", "byStore", "stores"]
        .iter()
        .find_map(|key| object.get(*key).filter(|v| v.is_array()))
    {
        let total = coerce_number(first_field(
            &object,
            &["total_visitors", "totalVisitors", "total"],
        ));
        return json!({ "total_visitors": total, "by_store": by_store });
    }

    if let Some(data) = object.get("data").filter(|v| v.is_array()) {
        let total = coerce_number(object.get("total"));
        return json!({ "total_visitors": total, "by_store": data });
    }

    Value::Object(object)
}

/// Maps one `perStore` entry; entries without a store id are dropped.
fn per_store_entry(entry: &Value) -> Option<Value> {
    let store = entry.get("store");
    let store_id = entry
        .get("storeId")
        .and_then(id_string)
        .or_else(|| entry.get("store_id").and_then(id_string))
        .or_else(|| store.and_then(|s| s.get("id")).and_then(id_string))
        .or_else(|| store.and_then(|s| s.get("_id")).and_then(id_string))?;

    let store_name = store
        .and_then(|s| s.get("name"))
        .or_else(|| entry.get("storeName"))
        .or_else(|| entry.get("store_name"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    let count = coerce_number(
        entry
            .get("total")
            .or_else(|| entry.get("count"))
            .or_else(|| entry.get("visits")),
    );

    Some(json!({ "store_id": store_id, "store_name": store_name, "count": count }))
}

fn first_field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers pass through, numeric strings are parsed, everything else is 0.
///
/// Integral values come back as integers so `5` never turns into `5.0`.
#[must_use]
pub fn coerce_number(value: Option<&Value>) -> Number {
    match value {
        Some(Value::Number(n)) => n.clone(),
        Some(Value::String(s)) => parse_number(s.trim()).unwrap_or_else(|| {
            tracing::debug!(value = %s, "non-numeric visitor count coerced to 0");
            Number::from(0)
        }),
        None | Some(Value::Null) => Number::from(0),
        Some(other) => {
            tracing::debug!(value = %other, "non-numeric visitor count coerced to 0");
            Number::from(0)
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Number::from(int));
    }
    let float = raw.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if float.fract() == 0.0 && float.abs() < 9.0e15 {
        return Some(Number::from(float as i64));
    }
    Number::from_f64(float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_store_shape_is_mapped() {
        let input = json!({
            "perStore": [{ "storeId": "a", "store": { "name": "A" }, "total": 5 }],
            "totalVisitors": 5
        });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({
                "total_visitors": 5,
                "by_store": [{ "store_id": "a", "store_name": "A", "count": 5 }]
            })
        );
    }

    #[test]
    fn per_store_entries_without_id_are_skipped() {
        let input = json!({
            "perStore": [
                { "store": { "name": "  Nameless  " }, "total": 3 },
                { "store": { "_id": "b", "name": "  Bakery " }, "total": "7" }
            ],
            "total": "10"
        });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({
                "total_visitors": 10,
                "by_store": [{ "store_id": "b", "store_name": "Bakery", "count": 7 }]
            })
        );
    }

    #[test]
    fn blank_or_null_store_id_falls_back_to_nested_store() {
        let input = json!({
            "perStore": [
                { "storeId": null, "store": { "id": "a", "name": "A" }, "total": 1 },
                { "storeId": "  ", "store_id": "", "store": { "_id": 9, "name": "B" }, "total": 2 }
            ],
            "totalVisitors": 3
        });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({
                "total_visitors": 3,
                "by_store": [
                    { "store_id": "a", "store_name": "A", "count": 1 },
                    { "store_id": "9", "store_name": "B", "count": 2 }
                ]
            })
        );
    }

    #[test]
    fn per_store_malformed_counts_coerce_to_zero() {
        let input = json!({
            "perStore": [{ "storeId": 42, "count": "lots" }],
            "totalVisitors": null
        });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({
                "total_visitors": 0,
                "by_store": [{ "store_id": "42", "store_name": "", "count": 0 }]
            })
        );
    }

    #[test]
    fn by_store_shape_is_passed_through_with_default_total() {
        let input = json!({ "by_store": [{ "store_id": "x", "count": 1 }] });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({ "total_visitors": 0, "by_store": [{ "store_id": "x", "count": 1 }] })
        );
    }

    #[test]
    fn camel_case_by_store_is_renamed() {
        let input = json!({ "byStore": [], "totalVisitors": 9 });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({ "total_visitors": 9, "by_store": [] })
        );
    }

    #[test]
    fn data_array_is_wrapped() {
        let input = json!({ "data": [{ "store_id": "s" }], "total": 2 });
        assert_eq!(
            normalize_visitor_summary(input),
            json!({ "total_visitors": 2, "by_store": [{ "store_id": "s" }] })
        );
    }

    #[test]
    fn unknown_shapes_are_unchanged() {
        let object = json!({ "message": "ok" });
        assert_eq!(normalize_visitor_summary(object.clone()), object);
        let array = json!([1, 2, 3]);
        assert_eq!(normalize_visitor_summary(array.clone()), array);
    }

    #[test]
    fn coerce_number_keeps_fractions() {
        assert_eq!(
            coerce_number(Some(&json!("2.5"))),
            Number::from_f64(2.5).expect("finite")
        );
        assert_eq!(coerce_number(Some(&json!("4.0"))), Number::from(4));
        assert_eq!(coerce_number(Some(&json!(true))), Number::from(0));
    }
}
