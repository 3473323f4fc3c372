//! Query and path parameter parsing

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("value required")]
    Missing,
    #[error("invalid integer {0:?}")]
    Malformed(String),
}

/// Parse a required decimal integer. An empty value counts as missing.
pub fn parse_int<T: FromStr>(raw: Option<&str>) -> Result<T, ParamError> {
    match raw {
        None | Some("") => Err(ParamError::Missing),
        Some(s) => s.parse().map_err(|_| ParamError::Malformed(s.to_string())),
    }
}

/// Like [`parse_int`], but a missing value is `Ok(None)`
pub fn parse_optional_int<T: FromStr>(raw: Option<&str>) -> Result<Option<T>, ParamError> {
    match parse_int(raw) {
        Ok(value) => Ok(Some(value)),
        Err(ParamError::Missing) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Query string pairs in request order
pub type QueryPairs = Vec<(String, String)>;

/// First value for `name`; later duplicates are ignored
pub fn query_value<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<i32>(Some("42")), Ok(42));
        assert_eq!(parse_int::<i32>(Some("-3")), Ok(-3));
        assert_eq!(parse_int::<i32>(Some("+7")), Ok(7));
        assert_eq!(parse_int::<i32>(None), Err(ParamError::Missing));
        assert_eq!(parse_int::<i32>(Some("")), Err(ParamError::Missing));
        assert_eq!(
            parse_int::<i32>(Some("1s")),
            Err(ParamError::Malformed("1s".to_string()))
        );
        assert!(parse_int::<i32>(Some(" 1")).is_err());
        assert!(parse_int::<i32>(Some("99999999999")).is_err());
    }

    #[test]
    fn test_query_value_first_wins() {
        let query: QueryPairs = vec![
            ("feature_id".to_string(), "1".to_string()),
            ("tag_id".to_string(), "2".to_string()),
            ("feature_id".to_string(), "x".to_string()),
        ];
        assert_eq!(query_value(&query, "feature_id"), Some("1"));
        assert_eq!(query_value(&query, "tag_id"), Some("2"));
        assert_eq!(query_value(&query, "limit"), None);
    }

    #[test]
    fn test_parse_optional_int() {
        assert_eq!(parse_optional_int::<i64>(None), Ok(None));
        assert_eq!(parse_optional_int::<i64>(Some("")), Ok(None));
        assert_eq!(parse_optional_int::<i64>(Some("10")), Ok(Some(10)));
        assert!(parse_optional_int::<i64>(Some("ten")).is_err());
    }
}
