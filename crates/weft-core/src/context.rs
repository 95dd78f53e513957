//! Versioned binary encoding of the render context.
//!
//! This is the host side of the contract between the engine and the
//! generated program: blob = magic `WCTX`, little-endian `u16` version,
//! then one tagged value. Tags: 0 null, 1 false, 2 true, 3 i64, 4 f64,
//! 5 string (u32 length + UTF-8), 6 array (u32 count + values), 7 map
//! (u32 count + string/value pairs). The matching decoder shipped into
//! generated programs lives in [`crate::runtime`]; both sides must be
//! bumped together when the layout changes.

use serde_json::Value;

use crate::error::{Result, WeftError};

pub const CONTEXT_MAGIC: [u8; 4] = *b"WCTX";
pub const CONTEXT_VERSION: u16 = 1;

const TAG_NULL: u8 = 0;
const TAG_FALSE: u8 = 1;
const TAG_TRUE: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_ARRAY: u8 = 6;
const TAG_MAP: u8 = 7;

/// Encode a context value into the versioned blob handed to the
/// generated program.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&CONTEXT_MAGIC);
    out.extend_from_slice(&CONTEXT_VERSION.to_le_bytes());
    encode_value(value, &mut out);
    out
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.push(TAG_INT);
                out.extend_from_slice(&i.to_le_bytes());
            } else {
                // u64 beyond i64 range, or a float.
                out.push(TAG_FLOAT);
                out.extend_from_slice(&n.as_f64().unwrap_or(0.0).to_le_bytes());
            }
        }
        Value::String(s) => {
            out.push(TAG_STR);
            encode_str(s, out);
        }
        Value::Array(items) => {
            out.push(TAG_ARRAY);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                encode_value(item, out);
            }
        }
        Value::Object(entries) => {
            out.push(TAG_MAP);
            out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            for (key, item) in entries {
                encode_str(key, out);
                encode_value(item, out);
            }
        }
    }
}

fn encode_str(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Decode a blob back into a context value.
///
/// The generated program carries its own decoder; this one keeps the
/// contract testable in-process and helps debugging scratch files.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut reader = Reader { buf: bytes, pos: 0 };
    if reader.take(4)? != CONTEXT_MAGIC {
        return Err(WeftError::ContextDecode("bad magic".into()));
    }
    let v = reader.take(2)?;
    let version = u16::from_le_bytes([v[0], v[1]]);
    if version != CONTEXT_VERSION {
        return Err(WeftError::ContextDecode(format!(
            "unsupported version {version}, expected {CONTEXT_VERSION}"
        )));
    }
    let value = reader.value()?;
    if reader.pos != reader.buf.len() {
        return Err(WeftError::ContextDecode("trailing bytes".into()));
    }
    Ok(value)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(WeftError::ContextDecode("truncated blob".into()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn eight(&mut self) -> Result<[u8; 8]> {
        let b = self.take(8)?;
        Ok([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| WeftError::ContextDecode("invalid utf-8".into()))
    }

    fn value(&mut self) -> Result<Value> {
        match self.take(1)?[0] {
            TAG_NULL => Ok(Value::Null),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_INT => Ok(Value::from(i64::from_le_bytes(self.eight()?))),
            TAG_FLOAT => {
                let x = f64::from_le_bytes(self.eight()?);
                serde_json::Number::from_f64(x)
                    .map(Value::Number)
                    .ok_or_else(|| WeftError::ContextDecode("non-finite float".into()))
            }
            TAG_STR => Ok(Value::String(self.string()?)),
            TAG_ARRAY => {
                let count = self.u32()? as usize;
                let mut items = Vec::with_capacity(count.min(1 << 16));
                for _ in 0..count {
                    items.push(self.value()?);
                }
                Ok(Value::Array(items))
            }
            TAG_MAP => {
                let count = self.u32()? as usize;
                let mut entries = serde_json::Map::new();
                for _ in 0..count {
                    let key = self.string()?;
                    entries.insert(key, self.value()?);
                }
                Ok(Value::Object(entries))
            }
            tag => Err(WeftError::ContextDecode(format!("unknown tag {tag}"))),
        }
    }
}
