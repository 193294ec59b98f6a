use serde_json::Value;

/// Shape of an array-like value: the length of each nesting level, following
/// the first element downwards. Scalars have no shape.
///
/// The value is never modified.
pub fn shape_of(value: &Value) -> Option<Vec<usize>> {
    match value {
        Value::Array(items) => Some(shape_of_rows(items)),
        _ => None,
    }
}

/// Shape of a sequence of rows: its length followed by the shape of the
/// first row, if that row is itself array-like.
pub(crate) fn shape_of_rows(rows: &[Value]) -> Vec<usize> {
    let mut shape = vec![rows.len()];
    if let Some(inner) = rows.first().and_then(shape_of) {
        shape.extend(inner);
    }
    shape
}
