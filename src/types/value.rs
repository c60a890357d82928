use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::types::error::{DatabaseError, Result};

/// Tags above this value are TEXT; the excess is the UTF-8 byte length.
pub const TEXT_BASE: u8 = 12;
pub const MAX_TEXT_LEN: usize = (u8::MAX - TEXT_BASE) as usize;

const YEAR_EPOCH: i16 = 2000;
const MILLIS_PER_DAY: i64 = 86_400_000;
const DATETIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    TinyInt,
    SmallInt,
    Int,
    Long,
    Float,
    Double,
    Year,
    Time,
    DateTime,
    Date,
    Text,
}

impl DataType {
    pub fn base_tag(&self) -> u8 {
        match self {
            DataType::Null => 0,
            DataType::TinyInt => 1,
            DataType::SmallInt => 2,
            DataType::Int => 3,
            DataType::Long => 4,
            DataType::Float => 5,
            DataType::Double => 6,
            DataType::Year => 8,
            DataType::Time => 9,
            DataType::DateTime => 10,
            DataType::Date => 11,
            DataType::Text => TEXT_BASE,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(DataType::Null),
            1 => Some(DataType::TinyInt),
            2 => Some(DataType::SmallInt),
            3 => Some(DataType::Int),
            4 => Some(DataType::Long),
            5 => Some(DataType::Float),
            6 => Some(DataType::Double),
            8 => Some(DataType::Year),
            9 => Some(DataType::Time),
            10 => Some(DataType::DateTime),
            11 => Some(DataType::Date),
            t if t >= TEXT_BASE => Some(DataType::Text),
            _ => None,
        }
    }

    /// Byte width of fixed-size types; `None` for TEXT.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Null => Some(0),
            DataType::TinyInt | DataType::Year => Some(1),
            DataType::SmallInt => Some(2),
            DataType::Int | DataType::Float | DataType::Time => Some(4),
            DataType::Long | DataType::Double | DataType::DateTime | DataType::Date => Some(8),
            DataType::Text => None,
        }
    }

    /// Field width implied by a stored type tag.
    pub fn size_of_tag(tag: u8) -> Option<usize> {
        match Self::from_tag(tag)? {
            DataType::Text => Some((tag - TEXT_BASE) as usize),
            fixed => fixed.fixed_size(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "NULL",
            DataType::TinyInt => "TINYINT",
            DataType::SmallInt => "SMALLINT",
            DataType::Int => "INT",
            DataType::Long => "LONG",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Year => "YEAR",
            DataType::Time => "TIME",
            DataType::DateTime => "DATETIME",
            DataType::Date => "DATE",
            DataType::Text => "TEXT",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NULL" => Ok(DataType::Null),
            "TINYINT" => Ok(DataType::TinyInt),
            "SMALLINT" => Ok(DataType::SmallInt),
            "INT" | "INTEGER" => Ok(DataType::Int),
            "LONG" | "BIGINT" => Ok(DataType::Long),
            "FLOAT" => Ok(DataType::Float),
            "DOUBLE" => Ok(DataType::Double),
            "YEAR" => Ok(DataType::Year),
            "TIME" => Ok(DataType::Time),
            "DATETIME" => Ok(DataType::DateTime),
            "DATE" => Ok(DataType::Date),
            "TEXT" => Ok(DataType::Text),
            other => Err(DatabaseError::InvalidSchema {
                details: format!("unknown data type '{}'", other),
            }),
        }
    }
}

/// A typed field value. Its raw bytes come from [`Value::to_bytes`] and its
/// display string from the `Display` impl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Calendar year, stored as a signed offset from 2000.
    Year(i16),
    /// Milliseconds since midnight.
    Time(i32),
    /// Milliseconds since the Unix epoch (UTC).
    DateTime(i64),
    /// Milliseconds since the Unix epoch at midnight UTC.
    Date(i64),
    Text(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::TinyInt(_) => DataType::TinyInt,
            Value::SmallInt(_) => DataType::SmallInt,
            Value::Int(_) => DataType::Int,
            Value::Long(_) => DataType::Long,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::Year(_) => DataType::Year,
            Value::Time(_) => DataType::Time,
            Value::DateTime(_) => DataType::DateTime,
            Value::Date(_) => DataType::Date,
            Value::Text(_) => DataType::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Encoded width in bytes.
    pub fn size(&self) -> usize {
        match self {
            Value::Text(s) => s.len(),
            other => other.data_type().fixed_size().unwrap_or(0),
        }
    }

    /// The tag written into the record header. TEXT folds its length in.
    pub fn type_tag(&self) -> Result<u8> {
        match self {
            Value::Text(s) if s.len() > MAX_TEXT_LEN => Err(DatabaseError::TypeConversion {
                value: format!("<{} bytes of text>", s.len()),
                data_type: DataType::Text,
            }),
            Value::Text(s) => Ok(TEXT_BASE + s.len() as u8),
            Value::Year(y) if !year_in_range(*y) => Err(DatabaseError::TypeConversion {
                value: y.to_string(),
                data_type: DataType::Year,
            }),
            other => Ok(other.data_type().base_tag()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::TinyInt(v) => v.to_be_bytes().to_vec(),
            Value::SmallInt(v) => v.to_be_bytes().to_vec(),
            Value::Int(v) | Value::Time(v) => v.to_be_bytes().to_vec(),
            Value::Long(v) | Value::DateTime(v) | Value::Date(v) => v.to_be_bytes().to_vec(),
            Value::Float(v) => v.to_be_bytes().to_vec(),
            Value::Double(v) => v.to_be_bytes().to_vec(),
            Value::Year(y) => vec![(y - YEAR_EPOCH) as i8 as u8],
            Value::Text(s) => s.as_bytes().to_vec(),
        }
    }

    pub fn from_bytes(tag: u8, bytes: &[u8]) -> Result<Self> {
        let data_type = DataType::from_tag(tag).ok_or_else(|| DatabaseError::SerializationError {
            details: format!("Unknown type tag: {}", tag),
        })?;
        let expected = DataType::size_of_tag(tag).unwrap_or(0);
        if bytes.len() != expected {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "Insufficient bytes for value type {}: expected {}, got {}",
                    data_type,
                    expected,
                    bytes.len()
                ),
            });
        }

        let value = match data_type {
            DataType::Null => Value::Null,
            DataType::TinyInt => Value::TinyInt(i8::from_be_bytes(array(bytes)?)),
            DataType::SmallInt => Value::SmallInt(i16::from_be_bytes(array(bytes)?)),
            DataType::Int => Value::Int(i32::from_be_bytes(array(bytes)?)),
            DataType::Long => Value::Long(i64::from_be_bytes(array(bytes)?)),
            DataType::Float => Value::Float(f32::from_be_bytes(array(bytes)?)),
            DataType::Double => Value::Double(f64::from_be_bytes(array(bytes)?)),
            DataType::Year => Value::Year(i8::from_be_bytes(array(bytes)?) as i16 + YEAR_EPOCH),
            DataType::Time => Value::Time(i32::from_be_bytes(array(bytes)?)),
            DataType::DateTime => Value::DateTime(i64::from_be_bytes(array(bytes)?)),
            DataType::Date => Value::Date(i64::from_be_bytes(array(bytes)?)),
            DataType::Text => Value::Text(String::from_utf8(bytes.to_vec()).map_err(|_| {
                DatabaseError::SerializationError {
                    details: "Invalid UTF-8 in TEXT field".to_string(),
                }
            })?),
        };
        Ok(value)
    }

    /// Parses a literal as `data_type`. The literal `null` (any case) is NULL
    /// for every type.
    pub fn parse(data_type: DataType, literal: &str) -> Result<Self> {
        let trimmed = literal.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return Ok(Value::Null);
        }
        let fail = || DatabaseError::TypeConversion {
            value: literal.to_string(),
            data_type,
        };

        match data_type {
            DataType::Null => Err(fail()),
            DataType::TinyInt => trimmed.parse().map(Value::TinyInt).map_err(|_| fail()),
            DataType::SmallInt => trimmed.parse().map(Value::SmallInt).map_err(|_| fail()),
            DataType::Int => trimmed.parse().map(Value::Int).map_err(|_| fail()),
            DataType::Long => trimmed.parse().map(Value::Long).map_err(|_| fail()),
            DataType::Float => trimmed.parse().map(Value::Float).map_err(|_| fail()),
            DataType::Double => trimmed.parse().map(Value::Double).map_err(|_| fail()),
            DataType::Year => match trimmed.parse::<i16>() {
                Ok(y) if year_in_range(y) => Ok(Value::Year(y)),
                _ => Err(fail()),
            },
            DataType::Time => {
                if let Ok(time) = NaiveTime::parse_from_str(trimmed, TIME_FORMAT) {
                    Ok(Value::Time((time.num_seconds_from_midnight() * 1000) as i32))
                } else {
                    trimmed.parse().map(Value::Time).map_err(|_| fail())
                }
            }
            DataType::DateTime => NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT)
                .map(|dt| Value::DateTime(dt.and_utc().timestamp_millis()))
                .map_err(|_| fail()),
            DataType::Date => {
                let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| fail())?;
                let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(fail)?;
                Ok(Value::Date(midnight.and_utc().timestamp_millis()))
            }
            DataType::Text if literal.len() > MAX_TEXT_LEN => Err(fail()),
            DataType::Text => Ok(Value::Text(literal.to_string())),
        }
    }

    /// Converts to `target` through the display string when the types differ.
    pub fn coerce(self, target: DataType) -> Result<Self> {
        if self.is_null() || self.data_type() == target {
            return Ok(self);
        }
        Value::parse(target, &self.to_string())
    }

    /// Equality used by UNIQUE checks: TEXT compares case-insensitively.
    pub fn matches_ignore_case(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.to_lowercase() == b.to_lowercase(),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Double(v) => write!(f, "{:?}", v),
            Value::Year(y) => write!(f, "{}", y),
            Value::Time(ms) => {
                let secs = (*ms as i64).rem_euclid(MILLIS_PER_DAY) / 1000;
                write!(
                    f,
                    "{:02}:{:02}:{:02}",
                    secs / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                )
            }
            Value::DateTime(ms) => match chrono::DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
                None => write!(f, "{}", ms),
            },
            Value::Date(ms) => match chrono::DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.format(DATE_FORMAT)),
                None => write!(f, "{}", ms),
            },
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn year_in_range(year: i16) -> bool {
    (YEAR_EPOCH + i8::MIN as i16..=YEAR_EPOCH + i8::MAX as i16).contains(&year)
}

fn array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| DatabaseError::SerializationError {
            details: format!("expected {} bytes, got {}", N, bytes.len()),
        })
}
