//! Runtime support source spliced into every generated program.
//!
//! The generated program is built by a bare `rustc` with no crate graph,
//! so the support code is plain-std Rust shipped as text: the builder
//! writes it into the workspace as [`RUNTIME_FILE_NAME`] and the generated
//! source pulls it in with `include!`. It defines the `Value` context tree,
//! `load_context()`, and the decoder for the versioned context blob whose
//! encoder lives in [`crate::context`]. The two sides must agree on the
//! magic and version there.

/// Filename the support source is written under in the build workspace.
pub const RUNTIME_FILE_NAME: &str = "weft_runtime.rs";

/// The support source compiled into every generated program.
pub const RUNTIME_SOURCE: &str = r##"// weft runtime support. Generated, do not edit.

use std::fmt;
use std::ops::Index;

const CONTEXT_MAGIC: [u8; 4] = *b"WCTX";
const CONTEXT_VERSION: u16 = 1;

static NULL: Value = Value::Null;

/// The render context handed to the generated program.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn items(&self) -> &[Value] {
        match self {
            Value::Array(items) => items,
            _ => &[],
        }
    }

    pub fn entries(&self) -> &[(String, Value)] {
        match self {
            Value::Map(entries) => entries,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Value {
    type Output = Value;
    fn index(&self, idx: usize) -> &Value {
        self.items().get(idx).unwrap_or(&NULL)
    }
}

/// Read and decode the context blob named by the sole program argument.
pub fn load_context() -> Result<Value, String> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| "missing context file argument".to_string())?;
    let bytes =
        std::fs::read(&path).map_err(|e| format!("cannot read context file {path}: {e}"))?;
    decode_context(&bytes)
}

pub fn decode_context(bytes: &[u8]) -> Result<Value, String> {
    let mut reader = Reader { buf: bytes, pos: 0 };
    if reader.take(4)? != CONTEXT_MAGIC {
        return Err("bad context magic".into());
    }
    let version = reader.u16()?;
    if version != CONTEXT_VERSION {
        return Err(format!(
            "unsupported context version {version}, expected {CONTEXT_VERSION}"
        ));
    }
    let value = reader.value()?;
    if reader.pos != reader.buf.len() {
        return Err("trailing bytes after context value".into());
    }
    Ok(value)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        if self.buf.len() - self.pos < n {
            return Err("truncated context blob".into());
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> Result<i64, String> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn f64(&mut self) -> Result<f64, String> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn string(&mut self) -> Result<String, String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| "invalid utf-8 in context string".to_string())
    }

    fn value(&mut self) -> Result<Value, String> {
        match self.u8()? {
            0 => Ok(Value::Null),
            1 => Ok(Value::Bool(false)),
            2 => Ok(Value::Bool(true)),
            3 => Ok(Value::Int(self.i64()?)),
            4 => Ok(Value::Float(self.f64()?)),
            5 => Ok(Value::Str(self.string()?)),
            6 => {
                let count = self.u32()? as usize;
                let mut items = Vec::with_capacity(count.min(1 << 16));
                for _ in 0..count {
                    items.push(self.value()?);
                }
                Ok(Value::Array(items))
            }
            7 => {
                let count = self.u32()? as usize;
                let mut entries = Vec::with_capacity(count.min(1 << 16));
                for _ in 0..count {
                    let key = self.string()?;
                    entries.push((key, self.value()?));
                }
                Ok(Value::Map(entries))
            }
            tag => Err(format!("unknown context tag {tag}")),
        }
    }
}
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_declares_the_contract() {
        assert!(RUNTIME_SOURCE.contains("b\"WCTX\""));
        assert!(RUNTIME_SOURCE.contains("CONTEXT_VERSION: u16 = 1"));
        assert!(RUNTIME_SOURCE.contains("pub fn load_context"));
    }

    #[test]
    fn test_runtime_has_no_main() {
        // The generated program owns `main`; the support file is items only.
        assert!(!RUNTIME_SOURCE.contains("fn main"));
    }
}
