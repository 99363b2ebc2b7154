//! Reading normalizer.
//!
//! Turns loosely typed key/value payloads into `Reading`s. Missing or null
//! numeric fields default to 0.0; a field holding a non-numeric value
//! rejects the whole payload.

use common::{Error, Reading};
use serde_json::{Map, Value};

/// Source field names for each reading metric.
#[derive(Debug, Clone, Copy)]
pub struct FieldNames {
    pub temperature: &'static str,
    pub humidity: &'static str,
    pub wind_speed: &'static str,
    pub wind_direction: &'static str,
}

impl FieldNames {
    /// Field names published on the MQTT feed.
    pub const FEED: FieldNames = FieldNames {
        temperature: "temperature",
        humidity: "humidity",
        wind_speed: "wind_speed",
        wind_direction: "wind_direction",
    };

    /// Field names of Open-Meteo `current`/`hourly` blocks.
    pub const OPEN_METEO: FieldNames = FieldNames {
        temperature: "temperature_2m",
        humidity: "relative_humidity_2m",
        wind_speed: "wind_speed_10m",
        wind_direction: "wind_direction_10m",
    };
}

fn numeric_field(obj: &Map<String, Value>, key: &str) -> Result<f64, Error> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Error::MalformedPayload(format!("{key} is not representable as f64"))),
        Some(other) => Err(Error::MalformedPayload(format!(
            "{key} must be a number, got {other}"
        ))),
    }
}

/// Build a reading from an already-parsed object.
pub fn normalize_object(
    obj: &Map<String, Value>,
    fields: &FieldNames,
    timestamp: String,
) -> Result<Reading, Error> {
    Ok(Reading {
        temperature: numeric_field(obj, fields.temperature)?,
        humidity: numeric_field(obj, fields.humidity)?,
        wind_speed: numeric_field(obj, fields.wind_speed)?,
        wind_direction: numeric_field(obj, fields.wind_direction)?,
        timestamp,
    })
}

/// Parse a raw feed message body into a reading stamped with `received_at`.
pub fn normalize_payload(payload: &[u8], received_at: String) -> Result<Reading, Error> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| Error::MalformedPayload(format!("invalid JSON: {e}")))?;

    let Value::Object(obj) = value else {
        return Err(Error::MalformedPayload(
            "payload is not a JSON object".into(),
        ));
    };

    normalize_object(&obj, &FieldNames::FEED, received_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-03-01T12:00:00.000Z";

    #[test]
    fn test_full_payload() {
        let payload =
            br#"{"temperature": 21.5, "humidity": 60, "wind_speed": 12.3, "wind_direction": 270}"#;
        let reading = normalize_payload(payload, TS.into()).expect("valid payload");

        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 60.0);
        assert_eq!(reading.wind_speed, 12.3);
        assert_eq!(reading.wind_direction, 270.0);
        assert_eq!(reading.timestamp, TS);
    }

    #[test]
    fn test_missing_and_null_fields_default_to_zero() {
        let payload = br#"{"temperature": 18, "humidity": null}"#;
        let reading = normalize_payload(payload, TS.into()).expect("valid payload");

        assert_eq!(reading.temperature, 18.0);
        assert_eq!(reading.humidity, 0.0);
        assert_eq!(reading.wind_speed, 0.0);
        assert_eq!(reading.wind_direction, 0.0);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let payload = br#"{"temperature": 5, "timestamp": "2020-01-01T00:00:00Z", "station": "a"}"#;
        let reading = normalize_payload(payload, TS.into()).expect("valid payload");
        assert_eq!(reading.timestamp, TS);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = normalize_payload(b"not json", TS.into()).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = normalize_payload(b"[1, 2, 3]", TS.into()).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_non_numeric_field_is_malformed() {
        let err = normalize_payload(br#"{"temperature": "hot"}"#, TS.into()).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_open_meteo_field_mapping() {
        let obj = serde_json::json!({
            "time": "2026-03-01T12:00",
            "temperature_2m": 9.4,
            "relative_humidity_2m": 71,
            "wind_speed_10m": 14.2,
            "wind_direction_10m": 315
        });
        let reading = normalize_object(
            obj.as_object().expect("object"),
            &FieldNames::OPEN_METEO,
            "2026-03-01T12:00".into(),
        )
        .expect("valid block");

        assert_eq!(reading.temperature, 9.4);
        assert_eq!(reading.humidity, 71.0);
        assert_eq!(reading.wind_speed, 14.2);
        assert_eq!(reading.wind_direction, 315.0);
    }
}
