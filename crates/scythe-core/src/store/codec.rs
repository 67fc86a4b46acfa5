//! Binary row codec.
//!
//! Rows are stored as a field count followed by name/value pairs. Values
//! carry a one-byte tag so a row can be decoded, or a single column
//! projected, without schema lookups.

use crate::error::Error;
use crate::value::{Row, Value};

/// Tag byte identifying the encoded type of a value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueTag {
    Null = 0,
    Bool = 1,
    Int32 = 2,
    Int64 = 3,
    Float64 = 4,
    String = 5,
    Bytes = 6,
    Uuid = 7,
    Timestamp = 8,
}

impl TryFrom<u8> for ValueTag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ValueTag::Null),
            1 => Ok(ValueTag::Bool),
            2 => Ok(ValueTag::Int32),
            3 => Ok(ValueTag::Int64),
            4 => Ok(ValueTag::Float64),
            5 => Ok(ValueTag::String),
            6 => Ok(ValueTag::Bytes),
            7 => Ok(ValueTag::Uuid),
            8 => Ok(ValueTag::Timestamp),
            _ => Err(Error::InvalidData(format!("Unknown value tag: {}", value))),
        }
    }
}

/// Encode a row into bytes.
pub fn encode_row(row: &Row) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(row.len() as u32).to_le_bytes());
    for (name, value) in row.fields() {
        let name_bytes = name.as_bytes();
        buf.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        buf.extend_from_slice(name_bytes);
        encode_value(value, &mut buf);
    }
    Ok(buf)
}

/// Decode a row from bytes.
pub fn decode_row(data: &[u8]) -> Result<Row, Error> {
    let mut pos = 0;
    let count = read_u32(data, &mut pos)? as usize;
    let mut row = Row::new();
    for _ in 0..count {
        let name = read_name(data, &mut pos)?;
        let value = decode_value(data, &mut pos)?;
        row = row.with(name, value);
    }
    Ok(row)
}

/// Decode a single column from an encoded row without building the row.
pub fn decode_field(data: &[u8], column: &str) -> Result<Option<Value>, Error> {
    let mut pos = 0;
    let count = read_u32(data, &mut pos)? as usize;
    for _ in 0..count {
        let name = read_name(data, &mut pos)?;
        if name == column {
            return decode_value(data, &mut pos).map(Some);
        }
        skip_value(data, &mut pos)?;
    }
    Ok(None)
}

/// Encode a value as a standalone sled key.
pub fn encode_key(value: &Value) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    encode_value(value, &mut buf);
    Ok(buf)
}

fn encode_value(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Null => buf.push(ValueTag::Null as u8),
        Value::Bool(b) => {
            buf.push(ValueTag::Bool as u8);
            buf.push(*b as u8);
        }
        Value::Int32(i) => {
            buf.push(ValueTag::Int32 as u8);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::Int64(i) => {
            buf.push(ValueTag::Int64 as u8);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float64(f) => {
            buf.push(ValueTag::Float64 as u8);
            buf.extend_from_slice(&f.to_le_bytes());
        }
        Value::String(s) => {
            buf.push(ValueTag::String as u8);
            buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            buf.push(ValueTag::Bytes as u8);
            buf.extend_from_slice(&(b.len() as u32).to_le_bytes());
            buf.extend_from_slice(b);
        }
        Value::Uuid(u) => {
            buf.push(ValueTag::Uuid as u8);
            buf.extend_from_slice(u);
        }
        Value::Timestamp(t) => {
            buf.push(ValueTag::Timestamp as u8);
            buf.extend_from_slice(&t.to_le_bytes());
        }
    }
}

fn decode_value(data: &[u8], pos: &mut usize) -> Result<Value, Error> {
    let tag = ValueTag::try_from(read_u8(data, pos)?)?;
    match tag {
        ValueTag::Null => Ok(Value::Null),
        ValueTag::Bool => Ok(Value::Bool(read_u8(data, pos)? != 0)),
        ValueTag::Int32 => {
            let bytes = read_bytes(data, pos, 4)?;
            Ok(Value::Int32(i32::from_le_bytes(bytes.try_into().map_err(
                |_| Error::InvalidData("Invalid Int32 encoding".to_string()),
            )?)))
        }
        ValueTag::Int64 => {
            let bytes = read_bytes(data, pos, 8)?;
            Ok(Value::Int64(i64::from_le_bytes(bytes.try_into().map_err(
                |_| Error::InvalidData("Invalid Int64 encoding".to_string()),
            )?)))
        }
        ValueTag::Float64 => {
            let bytes = read_bytes(data, pos, 8)?;
            Ok(Value::Float64(f64::from_le_bytes(
                bytes.try_into().map_err(|_| {
                    Error::InvalidData("Invalid Float64 encoding".to_string())
                })?,
            )))
        }
        ValueTag::String => {
            let len = read_u32(data, pos)? as usize;
            let bytes = read_bytes(data, pos, len)?;
            Ok(Value::String(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::InvalidData(format!("Invalid UTF-8: {}", e)))?,
            ))
        }
        ValueTag::Bytes => {
            let len = read_u32(data, pos)? as usize;
            Ok(Value::Bytes(read_bytes(data, pos, len)?.to_vec()))
        }
        ValueTag::Uuid => {
            let bytes = read_bytes(data, pos, 16)?;
            Ok(Value::Uuid(bytes.try_into().map_err(|_| {
                Error::InvalidData("Invalid Uuid encoding".to_string())
            })?))
        }
        ValueTag::Timestamp => {
            let bytes = read_bytes(data, pos, 8)?;
            Ok(Value::Timestamp(i64::from_le_bytes(
                bytes.try_into().map_err(|_| {
                    Error::InvalidData("Invalid Timestamp encoding".to_string())
                })?,
            )))
        }
    }
}

fn skip_value(data: &[u8], pos: &mut usize) -> Result<(), Error> {
    let tag = ValueTag::try_from(read_u8(data, pos)?)?;
    let len = match tag {
        ValueTag::Null => 0,
        ValueTag::Bool => 1,
        ValueTag::Int32 => 4,
        ValueTag::Int64 | ValueTag::Float64 | ValueTag::Timestamp => 8,
        ValueTag::Uuid => 16,
        ValueTag::String | ValueTag::Bytes => read_u32(data, pos)? as usize,
    };
    read_bytes(data, pos, len)?;
    Ok(())
}

fn read_name(data: &[u8], pos: &mut usize) -> Result<String, Error> {
    let len = read_u16(data, pos)? as usize;
    let bytes = read_bytes(data, pos, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::InvalidData(format!("Invalid UTF-8 in field name: {}", e)))
}

fn read_u8(data: &[u8], pos: &mut usize) -> Result<u8, Error> {
    let bytes = read_bytes(data, pos, 1)?;
    Ok(bytes[0])
}

fn read_u16(data: &[u8], pos: &mut usize) -> Result<u16, Error> {
    let bytes = read_bytes(data, pos, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], pos: &mut usize) -> Result<u32, Error> {
    let bytes = read_bytes(data, pos, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8], Error> {
    if *pos + len > data.len() {
        return Err(Error::InvalidData(
            "Unexpected end of encoded row".to_string(),
        ));
    }
    let bytes = &data[*pos..*pos + len];
    *pos += len;
    Ok(bytes)
}
