use crate::types::RawFieldError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{Error, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%d/%m/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// A loosely typed scalar taken from a legacy record.
///
/// Both source systems store amounts, flags and dates as strings in some rows
/// and as native numbers or booleans in others. The value is kept as text and
/// only interpreted once an adapter knows which field it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawField(String);

impl RawField {
    pub fn new(value: impl Into<String>) -> Self {
        RawField(value.into())
    }

    /// The value exactly as it appeared in the source, surrounding whitespace included.
    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Parses a monetary amount, tolerating currency symbols, thousands
    /// separators and scientific notation.
    pub fn to_amount(&self) -> Result<Decimal, RawFieldError> {
        let cleaned = self.as_str().replace(['$', ','], "");
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return Err(RawFieldError::Empty);
        }

        Decimal::from_str(cleaned)
            .or_else(|_| Decimal::from_scientific(cleaned))
            .map_err(|_| RawFieldError::InvalidAmount(self.0.clone()))
    }

    /// Interprets the value as a boolean flag. Anything unrecognised is treated as absent.
    pub fn to_flag(&self) -> Option<bool> {
        match self.as_str().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None
        }
    }

    pub fn to_timestamp(&self) -> Result<DateTime<Utc>, RawFieldError> {
        let value = self.as_str();

        if value.is_empty() {
            return Err(RawFieldError::Empty);
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Ok(parsed.with_timezone(&Utc));
        }

        for format in DATE_TIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(parsed.and_utc());
            }
        }

        for format in DATE_FORMATS {
            if let Some(parsed) = NaiveDate::parse_from_str(value, format).ok().and_then(|date| date.and_hms_opt(0, 0, 0)) {
                return Ok(parsed.and_utc());
            }
        }

        //NOTE: Exported documents sometimes carry dates as epoch milliseconds
        value.parse::<i64>().ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| RawFieldError::InvalidTimestamp(value.to_string()))
    }
}

impl Display for RawField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::new(value)
    }
}

impl Serialize for RawField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RawField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawFieldVisitor)
    }
}

struct RawFieldVisitor;

impl<'de> Visitor<'de> for RawFieldVisitor {
    type Value = RawField;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string, number, boolean or null")
    }

    fn visit_unit<E>(self) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField::default())
    }

    fn visit_none<E>(self) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField::default())
    }

    fn visit_bool<E>(self, value: bool) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField(value.to_string()))
    }

    fn visit_i64<E>(self, value: i64) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField(value.to_string()))
    }

    fn visit_u64<E>(self, value: u64) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField(value.to_string()))
    }

    //NOTE: JSON numbers arrive through visit_map with their exact text; this only serves formats without arbitrary precision
    fn visit_f64<E>(self, value: f64) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField(value.to_string()))
    }

    fn visit_str<E>(self, value: &str) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<RawField, E>
    where
        E: Error,
    {
        Ok(RawField(value))
    }

    // Extended JSON wrappers such as {"$oid": ".."}, {"$date": ".."} or {"$numberDecimal": ".."}, and
    // serde_json's arbitrary precision numbers, which are a single-entry map holding the number's text
    fn visit_map<A>(self, mut map: A) -> Result<RawField, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut first = None;

        while let Some((_, value)) = map.next_entry::<String, RawField>()? {
            if first.is_none() {
                first = Some(value);
            }
        }

        Ok(first.unwrap_or_default())
    }
}
