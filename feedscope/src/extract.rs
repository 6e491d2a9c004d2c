//! Nested value extraction over dotted attribute paths.
//!
//! [`extract`] is the list-aware resolver shared by the enumeration and pivot
//! aggregators: when a path crosses a sequence it fans out over every element
//! that is a mapping holding the next key. [`lookup`] is the plain variant
//! without fan-out, used wherever a single object is expected (pivot levels,
//! the grouping discriminator, record filters).

use crate::value::Value;

enum Cursor<'a> {
    One(&'a Value),
    Many(Vec<&'a Value>),
}

/// Resolves every value found at `path` inside `record`.
///
/// A trailing sequence is returned element by element, so multiplicity is
/// preserved; null resolves to nothing.
///
/// # Examples
///
/// ```rust
/// use feedscope::extract::extract;
/// use feedscope::value::Value;
///
/// let record = Value::from(serde_json::json!({"a": [{"b": 1}, {"b": 2}]}));
/// let values: Vec<String> = extract(&record, "a.b").iter().map(|v| v.to_string()).collect();
/// assert_eq!(values, vec!["1", "2"]);
/// ```
pub fn extract<'a>(record: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut cursor = Cursor::One(record);

    for segment in path.split('.') {
        cursor = match cursor {
            Cursor::One(Value::Mapping(map)) => match map.get(segment) {
                Some(next) => Cursor::One(next),
                None => return Vec::new(),
            },
            Cursor::One(Value::Sequence(items)) => match fan_out(items.iter(), segment) {
                Some(collected) => Cursor::Many(collected),
                None => return Vec::new(),
            },
            Cursor::Many(items) => match fan_out(items.into_iter(), segment) {
                Some(collected) => Cursor::Many(collected),
                None => return Vec::new(),
            },
            Cursor::One(_) => return Vec::new(),
        };
    }

    match cursor {
        Cursor::One(Value::Null) => Vec::new(),
        Cursor::One(Value::Sequence(items)) => items.iter().collect(),
        Cursor::One(value) => vec![value],
        Cursor::Many(items) => items,
    }
}

fn fan_out<'a>(items: impl Iterator<Item = &'a Value>, key: &str) -> Option<Vec<&'a Value>> {
    let collected: Vec<&Value> = items.filter_map(|item| item.get(key)).collect();
    (!collected.is_empty()).then_some(collected)
}

/// Resolves `path` through mappings only. Any non-mapping on the way, or a
/// missing key, yields `None`.
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.get(segment))
}
