//! Shareable-state tokens.
//!
//! Trait values serialize to a compact JSON object and then to URL-safe
//! base64 without padding, so the token can ride in a URL query parameter
//! untouched. Decoding is tolerant by contract: a malformed token fails
//! closed (the caller keeps its current state), unknown keys are ignored
//! and out-of-range values are clamped.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::SpecError;
use crate::values::TraitValues;

/// Encodes trait values as an opaque token.
///
/// Key order is stable (BTreeMap), so equal values always produce equal
/// tokens.
pub fn encode_token(values: &TraitValues) -> String {
    let json = serde_json::to_string(values.as_map())
        .expect("a map of finite floats serializes");
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// Decodes a token back into trait values.
///
/// # Errors
/// Returns [`SpecError::InvalidToken`] when the base64 or JSON layer is
/// malformed. Within a well-formed token, unknown keys and non-finite
/// values are silently dropped and finite values clamped into [-1, 1].
pub fn decode_token(token: &str) -> Result<TraitValues, SpecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| SpecError::invalid_token(format!("bad base64: {e}")))?;
    let json = std::str::from_utf8(&bytes)
        .map_err(|_| SpecError::invalid_token("token is not UTF-8"))?;
    let map: BTreeMap<String, f64> = serde_json::from_str(json)
        .map_err(|e| SpecError::invalid_token(format!("bad JSON: {e}")))?;
    Ok(TraitValues::from_map(&map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TRAITS;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_preserves_values() {
        let mut values = TraitValues::neutral();
        for (i, t) in TRAITS.iter().enumerate() {
            let v = -1.0 + 2.0 * i as f64 / (TRAITS.len() - 1) as f64;
            values.set(t.key, v).unwrap();
        }
        let decoded = decode_token(&encode_token(&values)).unwrap();
        for t in TRAITS {
            let a = values.score(t.key);
            let b = decoded.score(t.key);
            assert!((a - b).abs() < 1e-12, "{}: {a} vs {b}", t.key);
        }
    }

    #[test]
    fn test_token_is_url_safe() {
        let mut values = TraitValues::neutral();
        values.set("merry-serious", -0.731).unwrap();
        let token = encode_token(&values);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_malformed_tokens_fail_closed() {
        assert!(decode_token("!!!not base64!!!").is_err());
        // Valid base64, invalid JSON
        let garbage = URL_SAFE_NO_PAD.encode(b"{not json");
        assert!(decode_token(&garbage).is_err());
    }

    #[test]
    fn test_decode_clamps_and_ignores_unknown() {
        let json = r#"{"merry-serious": 9.0, "mystery": 0.4}"#;
        let token = URL_SAFE_NO_PAD.encode(json.as_bytes());
        let values = decode_token(&token).unwrap();
        assert_eq!(values.score("merry-serious"), 1.0);
        assert_eq!(values.score("mystery"), 0.0);
    }
}
