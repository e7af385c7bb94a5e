// SPDX-License-Identifier: GPL-3.0-or-later
//! Decoding the two payload formats a thermal source can send.
use serde_json::{Map, Value};

use crate::error::PayloadError;

use super::record::{FrameRecord, ScalarKind};
use super::settings::FieldMap;

/// Convert a raw 16-bit sensor reading into degrees Celsius.
pub fn raw_to_celsius(raw: u16) -> f32 {
    raw as f32 / 128.0 - 64.0
}

/// Parse a JSON document from a poll request into a [`FrameRecord`].
///
/// Missing scalar fields are read as 0, and a missing frame field results in an empty record.
/// The frame may be either a flat array or an array of row arrays.
pub fn parse_json_frame(
    body: &[u8],
    fields: &FieldMap,
    rows: usize,
    cols: usize,
) -> Result<FrameRecord, PayloadError> {
    let document: Value = serde_json::from_slice(body)?;
    let object = document
        .as_object()
        .ok_or(PayloadError::Shape("a JSON object"))?;
    let values = match object.get(&fields.frame) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => flatten_numbers(items)?,
        Some(_) => return Err(PayloadError::NonNumeric),
    };
    Ok(FrameRecord {
        values,
        min_value: scalar(object, fields.scalar_key(ScalarKind::Lowest)),
        max_value: scalar(object, fields.scalar_key(ScalarKind::Highest)),
        avg_value: scalar(object, fields.scalar_key(ScalarKind::Average)),
        rows,
        cols,
    })
}

fn scalar(object: &Map<String, Value>, key: &str) -> f32 {
    object.get(key).and_then(Value::as_f64).unwrap_or(0.0) as f32
}

fn flatten_numbers(items: &[Value]) -> Result<Vec<f32>, PayloadError> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(n) => values.push(n.as_f64().ok_or(PayloadError::NonNumeric)? as f32),
            Value::Array(row) => {
                for cell in row {
                    let cell = cell.as_f64().ok_or(PayloadError::NonNumeric)?;
                    values.push(cell as f32);
                }
            }
            _ => return Err(PayloadError::NonNumeric),
        }
    }
    Ok(values)
}

/// Decode one length-delimited payload from a frame stream.
///
/// The formats are tried in order: a JSON array of numbers, big-endian `f32`s, then big-endian
/// raw `u16` sensor readings.
pub fn decode_stream_payload(payload: &[u8]) -> Result<Vec<f32>, PayloadError> {
    if let Ok(values) = serde_json::from_slice::<Vec<f32>>(payload) {
        return Ok(values);
    }
    if payload.len() % 4 == 0 {
        let values = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(values)
    } else if payload.len() % 2 == 0 {
        let values = payload
            .chunks_exact(2)
            .map(|chunk| raw_to_celsius(u16::from_be_bytes([chunk[0], chunk[1]])))
            .collect();
        Ok(values)
    } else {
        Err(PayloadError::Unrecognized(payload.len()))
    }
}

#[cfg(test)]
mod test {
    use super::{decode_stream_payload, parse_json_frame, raw_to_celsius};
    use crate::error::PayloadError;
    use crate::source::FieldMap;

    #[test]
    fn json_all_fields() {
        let body = br#"{"frame": [1, 2.5, 3, 4], "lowest": 1, "highest": 4, "average": 2.6}"#;
        let record = parse_json_frame(body, &FieldMap::default(), 2, 2).unwrap();
        assert_eq!(record.values, vec![1.0, 2.5, 3.0, 4.0]);
        assert_eq!(record.min_value, 1.0);
        assert_eq!(record.max_value, 4.0);
        assert_eq!(record.avg_value, 2.6);
        assert_eq!((record.rows, record.cols), (2, 2));
    }

    #[test]
    fn json_missing_scalars_are_zero() {
        let body = br#"{"frame": [1, 2]}"#;
        let record = parse_json_frame(body, &FieldMap::default(), 1, 2).unwrap();
        assert_eq!(record.min_value, 0.0);
        assert_eq!(record.max_value, 0.0);
        assert_eq!(record.avg_value, 0.0);
    }

    #[test]
    fn json_missing_frame_is_empty() {
        let body = br#"{"highest": 30.0}"#;
        let record = parse_json_frame(body, &FieldMap::default(), 24, 32).unwrap();
        assert!(record.is_empty());
        assert_eq!(record.max_value, 30.0);
    }

    #[test]
    fn json_custom_fields() {
        let fields = FieldMap {
            frame: "data".to_string(),
            highest: "hot".to_string(),
            ..FieldMap::default()
        };
        let body = br#"{"data": [5], "hot": 5, "frame": [1]}"#;
        let record = parse_json_frame(body, &fields, 1, 1).unwrap();
        assert_eq!(record.values, vec![5.0]);
        assert_eq!(record.max_value, 5.0);
    }

    #[test]
    fn json_nested_rows() {
        let body = br#"{"frame": [[1, 2], [3, 4]]}"#;
        let record = parse_json_frame(body, &FieldMap::default(), 2, 2).unwrap();
        assert_eq!(record.values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn json_not_an_object() {
        let parsed = parse_json_frame(b"[1, 2, 3]", &FieldMap::default(), 1, 3);
        assert!(matches!(parsed, Err(PayloadError::Shape(_))));
    }

    #[test]
    fn json_garbage() {
        let parsed = parse_json_frame(b"<html>", &FieldMap::default(), 1, 3);
        assert!(matches!(parsed, Err(PayloadError::Json(_))));
    }

    #[test]
    fn json_non_numeric_frame() {
        let parsed = parse_json_frame(br#"{"frame": ["hot"]}"#, &FieldMap::default(), 1, 1);
        assert!(matches!(parsed, Err(PayloadError::NonNumeric)));
        let parsed = parse_json_frame(br#"{"frame": "hot"}"#, &FieldMap::default(), 1, 1);
        assert!(matches!(parsed, Err(PayloadError::NonNumeric)));
    }

    #[test]
    fn stream_json_array() {
        let values = decode_stream_payload(b"[20.5, 21, 22.25]").unwrap();
        assert_eq!(values, vec![20.5, 21.0, 22.25]);
    }

    #[test]
    fn stream_f32() {
        let payload: Vec<u8> = [21.5f32, -3.0]
            .iter()
            .flat_map(|v| v.to_be_bytes().to_vec())
            .collect();
        assert_eq!(decode_stream_payload(&payload).unwrap(), vec![21.5, -3.0]);
    }

    #[test]
    fn stream_raw_u16() {
        let payload = 8192u16.to_be_bytes();
        assert_eq!(decode_stream_payload(&payload).unwrap(), vec![0.0]);
        let payload: Vec<u8> = [8192u16, 11392, 0, 1, 2]
            .iter()
            .flat_map(|v| v.to_be_bytes().to_vec())
            .collect();
        // 10 bytes, so not f32.
        let values = decode_stream_payload(&payload).unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(values[1], 25.0);
        assert_eq!(values[2], -64.0);
    }

    #[test]
    fn stream_unrecognized() {
        let parsed = decode_stream_payload(&[1, 2, 3]);
        assert!(matches!(parsed, Err(PayloadError::Unrecognized(3))));
    }

    #[test]
    fn stream_empty() {
        assert!(decode_stream_payload(&[]).unwrap().is_empty());
    }

    #[test]
    fn raw_conversion() {
        assert_eq!(raw_to_celsius(8192), 0.0);
        assert_eq!(raw_to_celsius(0), -64.0);
        assert_eq!(raw_to_celsius(8192 + 128), 1.0);
    }
}
