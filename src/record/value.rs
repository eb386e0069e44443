use std::fmt;
use std::str::FromStr;

use super::error::{RecordError, RecordResult};

/// Default declared length of a STRING column when none is given
pub const DEFAULT_STRING_LEN: usize = 128;

/// Bytes used by the length prefix of a STRING field
const STRING_LEN_PREFIX: usize = 4;

/// Longest declared STRING length the 4-byte length prefix can describe
pub const MAX_STRING_LEN: usize = u32::MAX as usize;

/// Represents a column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,         // 4 bytes
    Char(usize), // 4-byte length + n bytes (fixed length)
}

impl DataType {
    /// Get the on-disk size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Char(n) => STRING_LEN_PREFIX.saturating_add(*n),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Char(n) => write!(f, "STRING({})", n),
        }
    }
}

impl FromStr for DataType {
    type Err = RecordError;

    /// Accepts `INT`, `STRING`, or `STRING(n)` in any case
    fn from_str(s: &str) -> RecordResult<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "INT" {
            return Ok(DataType::Int);
        }
        if upper == "STRING" {
            return Ok(DataType::Char(DEFAULT_STRING_LEN));
        }
        if let Some(inner) = upper
            .strip_prefix("STRING(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let len = inner
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|len| *len <= MAX_STRING_LEN)
                .ok_or_else(|| {
                    RecordError::InvalidRecord(format!("Invalid string length in type '{}'", s))
                })?;
            return Ok(DataType::Char(len));
        }
        Err(RecordError::InvalidRecord(format!(
            "Unknown column type: {}",
            s
        )))
    }
}

/// Represents a single column value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    String(String),
}

impl Value {
    /// Check type and declared length against `data_type`
    pub fn check(&self, data_type: &DataType) -> RecordResult<()> {
        match (self, data_type) {
            (Value::Int(_), DataType::Int) => Ok(()),
            (Value::String(s), DataType::Char(max_len)) if s.len() > *max_len => {
                Err(RecordError::Serialization(format!(
                    "String length {} exceeds max length {}",
                    s.len(),
                    max_len
                )))
            }
            (Value::String(_), DataType::Char(_)) => Ok(()),
            _ => Err(RecordError::TypeMismatch {
                expected: data_type.to_string(),
                actual: format!("{:?}", self),
            }),
        }
    }

    /// Parse a textual value (e.g. a CSV cell) as `data_type`
    pub fn parse(text: &str, data_type: &DataType) -> RecordResult<Self> {
        match data_type {
            DataType::Int => text.trim().parse::<i32>().map(Value::Int).map_err(|e| {
                RecordError::InvalidRecord(format!("Invalid INT '{}': {}", text, e))
            }),
            DataType::Char(max_len) => {
                if text.len() > *max_len {
                    return Err(RecordError::Serialization(format!(
                        "String length {} exceeds max length {}",
                        text.len(),
                        max_len
                    )));
                }
                Ok(Value::String(text.to_string()))
            }
        }
    }

    /// Append the big-endian encoding of this value to `out`
    pub fn serialize_into(&self, data_type: &DataType, out: &mut Vec<u8>) -> RecordResult<()> {
        match (self, data_type) {
            (Value::Int(i), DataType::Int) => out.extend_from_slice(&i.to_be_bytes()),
            (Value::String(s), DataType::Char(max_len)) => {
                let bytes = s.as_bytes();
                if bytes.len() > *max_len {
                    return Err(RecordError::Serialization(format!(
                        "String length {} exceeds max length {}",
                        bytes.len(),
                        max_len
                    )));
                }
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
                out.resize(out.len() + (max_len - bytes.len()), 0);
            }
            _ => {
                return Err(RecordError::TypeMismatch {
                    expected: data_type.to_string(),
                    actual: format!("{:?}", self),
                });
            }
        }
        Ok(())
    }

    /// Serialize value to bytes
    pub fn serialize(&self, data_type: &DataType) -> RecordResult<Vec<u8>> {
        let mut result = Vec::with_capacity(data_type.size());
        self.serialize_into(data_type, &mut result)?;
        Ok(result)
    }

    /// Deserialize value from exactly `data_type.size()` bytes
    pub fn deserialize(bytes: &[u8], data_type: &DataType) -> RecordResult<Self> {
        if bytes.len() != data_type.size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes for {}, got {}",
                data_type.size(),
                data_type,
                bytes.len()
            )));
        }

        match data_type {
            DataType::Int => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Int(i32::from_be_bytes(buf)))
            }
            DataType::Char(max_len) => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..STRING_LEN_PREFIX]);
                let len = u32::from_be_bytes(buf) as usize;
                if len > *max_len {
                    return Err(RecordError::Deserialization(format!(
                        "Stored string length {} exceeds declared length {}",
                        len, max_len
                    )));
                }
                let payload = &bytes[STRING_LEN_PREFIX..STRING_LEN_PREFIX + len];
                let s = String::from_utf8(payload.to_vec())
                    .map_err(|e| RecordError::Deserialization(format!("Invalid UTF-8: {}", e)))?;
                Ok(Value::String(s))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_size() {
        assert_eq!(DataType::Int.size(), 4);
        assert_eq!(DataType::Char(10).size(), 14);
        assert_eq!(DataType::Char(128).size(), 132);
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Int);
        assert_eq!(" INT ".parse::<DataType>().unwrap(), DataType::Int);
        assert_eq!(
            "string".parse::<DataType>().unwrap(),
            DataType::Char(DEFAULT_STRING_LEN)
        );
        assert_eq!(
            "String(16)".parse::<DataType>().unwrap(),
            DataType::Char(16)
        );
        assert!("float".parse::<DataType>().is_err());
        assert!("string(x)".parse::<DataType>().is_err());
    }

    #[test]
    fn test_string_length_beyond_prefix_rejected() {
        assert_eq!(
            format!("STRING({})", MAX_STRING_LEN)
                .parse::<DataType>()
                .unwrap(),
            DataType::Char(MAX_STRING_LEN)
        );
        assert!(matches!(
            "STRING(4611686018427387904)".parse::<DataType>(),
            Err(RecordError::InvalidRecord(_))
        ));
        assert!("STRING(99999999999999999999999)".parse::<DataType>().is_err());
        assert_eq!(DataType::Char(usize::MAX).size(), usize::MAX);
    }

    #[test]
    fn test_int_layout_is_big_endian() {
        let bytes = Value::Int(0x01020304).serialize(&DataType::Int).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);

        let negative = Value::Int(-1).serialize(&DataType::Int).unwrap();
        assert_eq!(negative, vec![0xff; 4]);
        assert_eq!(
            Value::deserialize(&negative, &DataType::Int).unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn test_string_layout() {
        let val = Value::String("hello".to_string());
        let dt = DataType::Char(10);
        let bytes = val.serialize(&dt).unwrap();
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[..4], &[0, 0, 0, 5]);
        assert_eq!(&bytes[4..9], b"hello");
        assert_eq!(&bytes[9..], &[0u8; 5]);

        let deserialized = Value::deserialize(&bytes, &dt).unwrap();
        assert_eq!(val, deserialized);
    }

    #[test]
    fn test_string_too_long() {
        let val = Value::String("hello world".to_string());
        let result = val.serialize(&DataType::Char(5));
        assert!(matches!(result, Err(RecordError::Serialization(_))));
    }

    #[test]
    fn test_corrupt_string_length_rejected() {
        let mut bytes = vec![0u8; 8];
        bytes[..4].copy_from_slice(&9u32.to_be_bytes());
        let result = Value::deserialize(&bytes, &DataType::Char(4));
        assert!(matches!(result, Err(RecordError::Deserialization(_))));
    }

    #[test]
    fn test_type_mismatch() {
        let result = Value::Int(42).serialize(&DataType::Char(4));
        assert!(matches!(result, Err(RecordError::TypeMismatch { .. })));
    }

    #[test]
    fn test_check() {
        assert!(Value::Int(1).check(&DataType::Int).is_ok());
        assert!(Value::String("ab".to_string()).check(&DataType::Char(2)).is_ok());
        assert!(matches!(
            Value::String("abc".to_string()).check(&DataType::Char(2)),
            Err(RecordError::Serialization(_))
        ));
        assert!(matches!(
            Value::Int(1).check(&DataType::Char(2)),
            Err(RecordError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            Value::parse(" 17 ", &DataType::Int).unwrap(),
            Value::Int(17)
        );
        assert!(Value::parse("abc", &DataType::Int).is_err());
        assert_eq!(
            Value::parse("abc", &DataType::Char(3)).unwrap(),
            Value::String("abc".to_string())
        );
        assert!(Value::parse("abcd", &DataType::Char(3)).is_err());
    }
}
