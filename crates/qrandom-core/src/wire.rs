//! ANU QRNG JSON response envelope, shared by the HTTP client and the local server.
//!
//! ```json
//! {"type":"hex16","length":2,"size":4,"data":["0fa3","91c0"],"success":true}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::source::{DataKind, EntropyBatch, FetchRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnuResponse {
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default)]
    pub data: Value,
    pub success: bool,
    /// Present on failures from the local server; the ANU service uses `message`.
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnuResponse {
    /// Successful envelope for a batch answering `request`.
    pub fn from_batch(request: &FetchRequest, batch: &EntropyBatch) -> Self {
        Self {
            data_type: request.kind.to_string(),
            length: batch.len(),
            size: (request.kind == DataKind::Hex16).then_some(request.block_size),
            // Serializing plain vectors of integers/strings cannot fail.
            data: serde_json::to_value(batch).unwrap_or(Value::Null),
            success: true,
            error: None,
        }
    }

    /// Failure envelope.
    pub fn failure(data_type: &str, message: impl Into<String>) -> Self {
        Self {
            data_type: data_type.to_string(),
            length: 0,
            size: None,
            data: Value::Array(Vec::new()),
            success: false,
            error: Some(message.into()),
        }
    }

    /// Decode the payload as the kind `request` asked for, then validate its shape.
    ///
    /// `success: false` is reported as [`Error::SourceUnavailable`]; anything
    /// malformed is an [`Error::SourceProtocolError`].
    pub fn into_batch(self, request: &FetchRequest) -> Result<EntropyBatch> {
        if !self.success {
            let reason = self.error.unwrap_or_else(|| "no reason given".to_string());
            return Err(Error::SourceUnavailable(format!(
                "response reported success=false: {reason}"
            )));
        }
        let items = match self.data {
            Value::Array(items) => items,
            other => {
                return Err(Error::protocol(format!(
                    "data is not an array: {}",
                    json_kind(&other)
                )));
            }
        };

        let batch = match request.kind {
            DataKind::Uint8 => {
                EntropyBatch::Uint8(decode_ints(&items, |n| u8::try_from(n).ok())?)
            }
            DataKind::Uint16 => {
                EntropyBatch::Uint16(decode_ints(&items, |n| u16::try_from(n).ok())?)
            }
            DataKind::Hex16 => EntropyBatch::Hex16(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| match v {
                        Value::String(s) => Ok(s),
                        other => Err(Error::protocol(format!(
                            "element {i} is {}, expected string",
                            json_kind(&other)
                        ))),
                    })
                    .collect::<Result<_>>()?,
            ),
        };
        batch.check(request)?;
        Ok(batch)
    }
}

fn decode_ints<T>(items: &[Value], conv: impl Fn(u64) -> Option<T>) -> Result<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_u64()
                .and_then(&conv)
                .ok_or_else(|| Error::protocol(format!("element {i} is out of range: {v}")))
        })
        .collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AnuResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_hex16() {
        let req = FetchRequest::hex16(2, 4).unwrap();
        let resp = parse(r#"{"type":"hex16","length":2,"size":4,"data":["0fa3","91c0"],"success":true}"#);
        assert_eq!(
            resp.into_batch(&req).unwrap(),
            EntropyBatch::Hex16(vec!["0fa3".into(), "91c0".into()])
        );
    }

    #[test]
    fn test_decode_uint8_and_uint16() {
        let req = FetchRequest::new(DataKind::Uint8, 3, 1).unwrap();
        let resp = parse(r#"{"type":"uint8","length":3,"data":[0,128,255],"success":true}"#);
        assert_eq!(resp.into_batch(&req).unwrap(), EntropyBatch::Uint8(vec![0, 128, 255]));

        let req = FetchRequest::new(DataKind::Uint16, 1, 1).unwrap();
        let resp = parse(r#"{"type":"uint16","length":1,"data":[65535],"success":true}"#);
        assert_eq!(resp.into_batch(&req).unwrap(), EntropyBatch::Uint16(vec![65535]));
    }

    #[test]
    fn test_uint8_out_of_range_is_protocol_error() {
        let req = FetchRequest::new(DataKind::Uint8, 1, 1).unwrap();
        let resp = parse(r#"{"type":"uint8","length":1,"data":[256],"success":true}"#);
        assert!(matches!(resp.into_batch(&req), Err(Error::SourceProtocolError(_))));
    }

    #[test]
    fn test_success_false_is_unavailable() {
        let req = FetchRequest::hex16(1, 4).unwrap();
        let resp = parse(r#"{"success":false,"message":"rate limited"}"#);
        match resp.into_batch(&req) {
            Err(Error::SourceUnavailable(msg)) => assert!(msg.contains("rate limited")),
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_is_protocol_error() {
        let req = FetchRequest::hex16(1, 4).unwrap();
        let resp = parse(r#"{"type":"hex16","success":true}"#);
        assert!(matches!(resp.into_batch(&req), Err(Error::SourceProtocolError(_))));
    }

    #[test]
    fn test_number_in_hex_payload_is_protocol_error() {
        let req = FetchRequest::hex16(1, 4).unwrap();
        let resp = parse(r#"{"type":"hex16","length":1,"data":[1234],"success":true}"#);
        assert!(matches!(resp.into_batch(&req), Err(Error::SourceProtocolError(_))));
    }

    #[test]
    fn test_envelope_from_batch() {
        let req = FetchRequest::hex16(1, 2).unwrap();
        let resp = AnuResponse::from_batch(&req, &EntropyBatch::Hex16(vec!["ab".into()]));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["type"], "hex16");
        assert_eq!(json["length"], 1);
        assert_eq!(json["size"], 2);
        assert_eq!(json["data"][0], "ab");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }
}
