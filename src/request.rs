use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const EVENT_HEADER: &str = "x-github-event";

/// One delivery as handed to us by whatever invoked the handler.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub headers: HeaderMap,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl InboundRequest {
    /// Wraps a raw HTTP delivery. Bodies that aren't UTF-8 are carried as
    /// base64 so the signed bytes survive untouched.
    pub fn from_raw(headers: HeaderMap, body: &[u8]) -> Self {
        match std::str::from_utf8(body) {
            Ok(text) => InboundRequest {
                headers,
                body: text.to_string(),
                is_base64_encoded: false,
            },
            Err(_) => InboundRequest {
                headers,
                body: STANDARD.encode(body),
                is_base64_encoded: true,
            },
        }
    }

    pub fn event_type(&self) -> Option<&str> {
        self.headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok())
    }

    /// The bytes GitHub sent, with any transport base64 removed.
    pub fn decoded_body(&self) -> Result<Vec<u8>, Error> {
        if self.is_base64_encoded {
            STANDARD
                .decode(self.body.trim())
                .map_err(|e| Error::MalformedPayload(format!("body is not valid base64: {e}")))
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

/// Function-trigger style envelope: headers, body text and an encoding flag.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl TryFrom<Envelope> for InboundRequest {
    type Error = Error;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let mut headers = HeaderMap::with_capacity(envelope.headers.len());
        for (name, value) in envelope.headers {
            // HeaderName lowercases, which gives case-insensitive lookups.
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::MalformedPayload(format!("invalid header name `{name}`")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|_| Error::MalformedPayload(format!("invalid value for `{name}`")))?;
            headers.insert(name, value);
        }

        Ok(InboundRequest {
            headers,
            body: envelope.body.unwrap_or_default(),
            is_base64_encoded: envelope.is_base64_encoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_headers_are_case_insensitive() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"headers":{"X-GitHub-Event":"ping","X-Hub-Signature":"sha1=00"},"body":"{}","isBase64Encoded":false}"#,
        )
        .unwrap();
        let request = InboundRequest::try_from(envelope).unwrap();

        assert_eq!(request.event_type(), Some("ping"));
        assert_eq!(request.headers.get("x-hub-signature").unwrap(), "sha1=00");
        assert_eq!(request.decoded_body().unwrap(), b"{}");
    }

    #[test]
    fn base64_body_is_decoded() {
        let request = InboundRequest {
            headers: HeaderMap::new(),
            body: STANDARD.encode(r#"{"zen":"Keep it logically awesome."}"#),
            is_base64_encoded: true,
        };
        assert_eq!(
            request.decoded_body().unwrap(),
            br#"{"zen":"Keep it logically awesome."}"#
        );
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let request = InboundRequest {
            headers: HeaderMap::new(),
            body: "not base64!!".into(),
            is_base64_encoded: true,
        };
        assert!(matches!(request.decoded_body(), Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn non_utf8_raw_body_is_carried_as_base64() {
        let body = [0xffu8, 0x00, 0x7b];
        let request = InboundRequest::from_raw(HeaderMap::new(), &body);

        assert!(request.is_base64_encoded);
        assert_eq!(request.decoded_body().unwrap(), body);
    }

    #[test]
    fn missing_fields_default() {
        let envelope: Envelope = serde_json::from_str("{}").unwrap();
        let request = InboundRequest::try_from(envelope).unwrap();
        assert!(request.body.is_empty());
        assert!(!request.is_base64_encoded);
        assert_eq!(request.event_type(), None);
    }
}
