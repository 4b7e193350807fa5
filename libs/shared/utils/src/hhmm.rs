//! Serde helpers for clock times exchanged as `"HH:MM"` strings.
//!
//! Postgres `time` columns come back as `HH:MM:SS`, so parsing accepts both
//! forms; output is always minute precision.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%H:%M";

pub fn format(time: &NaiveTime) -> String {
    time.format(FORMAT).to_string()
}

pub fn parse(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
}

pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(time))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Window {
        #[serde(with = "crate::hhmm")]
        start: NaiveTime,
        #[serde(with = "crate::hhmm")]
        end: NaiveTime,
    }

    #[test]
    fn accepts_seconds_but_writes_minutes() {
        let window: Window = serde_json::from_str(r#"{"start":"09:20:00","end":"17:00"}"#).unwrap();
        assert_eq!(window.start, NaiveTime::from_hms_opt(9, 20, 0).unwrap());
        assert_eq!(
            serde_json::to_value(&window).unwrap(),
            serde_json::json!({"start": "09:20", "end": "17:00"})
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Window>(r#"{"start":"9am","end":"10:00"}"#).is_err());
        assert!(parse("25:00").is_err());
    }
}
