//! `data:<media>;base64,<payload>` helpers shared by the gateway and the client.

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// A parsed data URI. `media_type` is `None` when the input was bare base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: Option<String>,
    pub payload: &'a str,
}

/// Encodes bytes as a base64 data URI
pub fn encode(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Splits a data URI into its declared media type and base64 payload.
///
/// Anything that does not start with `data:` and carry a `;base64,` marker is
/// treated as a bare payload.
pub fn parse(input: &str) -> DataUri<'_> {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            if let Some(media) = header.strip_suffix(";base64") {
                let media = media.split(';').next().unwrap_or("").trim();
                return DataUri {
                    media_type: (!media.is_empty()).then(|| media.to_lowercase()),
                    payload,
                };
            }
        }
    }

    DataUri {
        media_type: None,
        payload: trimmed,
    }
}

/// Decodes a base64 payload, tolerating embedded whitespace and line breaks
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}
