//! Value codec - dynamic declarative values to typed values and back
//!
//! This is the only place dynamic-to-static coercion of primitive
//! containers happens. Bad shapes become [`Error`]s, never panics.

use crate::error::{Error, Result};
use crate::value::Value;

/// Convert a sequence of dynamic values into strings
///
/// Fails on the first element that is not a string, naming its index.
pub fn expand_string_list(values: &[Value]) -> Result<Vec<String>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(Error::NotAString {
                index,
                found: other.type_name(),
            }),
        })
        .collect()
}

/// Convert strings into a list value; total, order preserving
pub fn collapse_string_list(strings: &[String]) -> Value {
    Value::List(strings.iter().cloned().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_round_trip_from_strings() {
        for xs in [
            strings(&[]),
            strings(&["monitor"]),
            strings(&["b", "a", "b", ""]),
        ] {
            let collapsed = collapse_string_list(&xs);
            let items = collapsed.as_list().unwrap();
            assert_eq!(expand_string_list(items).unwrap(), xs);
        }
    }

    #[test]
    fn test_round_trip_from_values() {
        let values = vec![Value::from("manage"), Value::from("monitor")];
        let expanded = expand_string_list(&values).unwrap();
        assert_eq!(collapse_string_list(&expanded), Value::List(values));
    }

    #[test]
    fn test_expand_rejects_non_strings() {
        let values = vec![Value::from("ok"), Value::Bool(true)];
        let err = expand_string_list(&values).unwrap_err();
        assert_eq!(
            err,
            Error::NotAString {
                index: 1,
                found: "bool"
            }
        );
    }

    #[test]
    fn test_collapse_empty() {
        assert_eq!(collapse_string_list(&[]), Value::List(vec![]));
    }
}
