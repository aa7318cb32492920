use bytes::Bytes;
use mime::Mime;
use serde_json::Value;
use url::form_urlencoded;

use crate::broker::Params;
use crate::config::BodyParsers;
use crate::errors::{GatewayError, Result};

/// Decode a request body per the mount's parser configuration.
///
/// Returns `Ok(None)` when nothing applies: parsing disabled, empty body,
/// missing/foreign content type, or a JSON body that is valid but not an
/// object. Only a decode *failure* on a matching content type produces
/// [`GatewayError::InvalidRequestBody`], which short-circuits resolution
/// before the broker is reached.
pub fn parse_body(
    parsers: Option<&BodyParsers>,
    content_type: Option<&Mime>,
    body: &Bytes,
) -> Result<Option<Params>> {
    let Some(parsers) = parsers else {
        return Ok(None);
    };
    if body.is_empty() {
        return Ok(None);
    }
    let Some(mime) = content_type else {
        return Ok(None);
    };

    if parsers.json.enabled() && mime.essence_str() == mime::APPLICATION_JSON.essence_str() {
        check_limit(parsers.json.limit(), body)?;
        return match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Ok(None),
            Err(err) => Err(GatewayError::InvalidRequestBody {
                body: String::from_utf8_lossy(body).into_owned(),
                error: err.to_string(),
            }),
        };
    }

    if parsers.urlencoded.enabled()
        && mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()
    {
        check_limit(parsers.urlencoded.limit(), body)?;
        let map = form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        return Ok(Some(map));
    }

    Ok(None)
}

fn check_limit(limit: Option<usize>, body: &Bytes) -> Result<()> {
    if let Some(limit) = limit {
        if body.len() > limit {
            return Err(GatewayError::InvalidRequestBody {
                body: String::from_utf8_lossy(body).into_owned(),
                error: format!("request body exceeds limit of {} bytes", limit),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParserOptions, ParserToggle};
    use serde_json::json;

    fn json_mime() -> Mime {
        "application/json".parse().unwrap()
    }

    fn form_mime() -> Mime {
        "application/x-www-form-urlencoded".parse().unwrap()
    }

    #[test]
    fn test_json_object_parses() {
        let parsers = BodyParsers::default();
        let body = Bytes::from_static(br#"{ "a": 5, "b": 8 }"#);
        let parsed = parse_body(Some(&parsers), Some(&json_mime()), &body).unwrap().unwrap();
        assert_eq!(parsed["a"], json!(5));
        assert_eq!(parsed["b"], json!(8));
    }

    #[test]
    fn test_json_failure_carries_body_and_error() {
        let parsers = BodyParsers::default();
        let body = Bytes::from_static(b"invalid");
        let err = parse_body(Some(&parsers), Some(&json_mime()), &body).unwrap_err();
        match err {
            GatewayError::InvalidRequestBody { body, error } => {
                assert_eq!(body, "invalid");
                assert!(!error.is_empty());
            }
            other => panic!("expected InvalidRequestBody, got {other:?}"),
        }
    }

    #[test]
    fn test_json_non_object_is_skipped() {
        let parsers = BodyParsers::default();
        let body = Bytes::from_static(b"42");
        assert!(parse_body(Some(&parsers), Some(&json_mime()), &body).unwrap().is_none());
    }

    #[test]
    fn test_disabled_parsers_skip_everything() {
        let body = Bytes::from_static(br#"{ "a": 5 }"#);
        assert!(parse_body(None, Some(&json_mime()), &body).unwrap().is_none());
    }

    #[test]
    fn test_foreign_content_type_is_skipped() {
        // JSON enabled, but the request is form-encoded: nothing is parsed
        // and the invocation proceeds with query params only.
        let parsers = BodyParsers::default();
        let body = Bytes::from_static(b"name=Ben");
        assert!(parse_body(Some(&parsers), Some(&form_mime()), &body).unwrap().is_none());
    }

    #[test]
    fn test_urlencoded_parses_when_enabled() {
        let parsers = BodyParsers {
            json: ParserToggle::Flag(true),
            urlencoded: ParserToggle::Flag(true),
        };
        let body = Bytes::from_static(b"name=Ben&city=X%20Y");
        let parsed = parse_body(Some(&parsers), Some(&form_mime()), &body).unwrap().unwrap();
        assert_eq!(parsed["name"], json!("Ben"));
        assert_eq!(parsed["city"], json!("X Y"));
    }

    #[test]
    fn test_content_type_with_charset_still_matches() {
        let parsers = BodyParsers::default();
        let mime: Mime = "application/json; charset=utf-8".parse().unwrap();
        let body = Bytes::from_static(br#"{ "a": 1 }"#);
        assert!(parse_body(Some(&parsers), Some(&mime), &body).unwrap().is_some());
    }

    #[test]
    fn test_limit_enforced() {
        let parsers = BodyParsers {
            json: ParserToggle::Options(ParserOptions { limit: Some(4), extended: None }),
            urlencoded: ParserToggle::Flag(false),
        };
        let body = Bytes::from_static(br#"{ "a": 1 }"#);
        let err = parse_body(Some(&parsers), Some(&json_mime()), &body).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequestBody { .. }));
    }
}
