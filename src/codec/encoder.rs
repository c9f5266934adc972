//! JSON encoder
//!
//! Serializes [`Value`] trees and [`Node`] table graphs into compact JSON.
//! Numbers are printed with 14 significant digits.

use std::fmt::Write as _;
use std::rc::Rc;

use super::error::EncodeError;
use super::table::{Node, Table};
use super::value::Value;

/// Number of significant digits used for non-integral numbers.
const SIGNIFICANT_DIGITS: i32 = 14;

/// Integral numbers below this magnitude print without a fraction or exponent.
const INTEGER_LIMIT: f64 = 1e15;

/// Types the encoder can serialize.
pub trait Encode {
    /// Write `self` into `encoder`.
    fn encode_to(&self, encoder: &mut Encoder) -> Result<(), EncodeError>;
}

/// Output buffer plus the chain of tables currently being encoded.
#[derive(Debug, Default)]
pub struct Encoder {
    out: String,
    path: Vec<*const Table>,
}

/// Encode a value into a JSON string.
///
/// # Arguments
/// * `value` - A [`Value`] tree or a [`Node`] graph
///
/// # Returns
/// * `Result<String, EncodeError>` - JSON text or the first encoding failure
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<String, EncodeError> {
    let mut encoder = Encoder::default();
    value.encode_to(&mut encoder)?;
    Ok(encoder.finish())
}

impl Encoder {
    /// Consume the encoder and return the accumulated text.
    pub fn finish(self) -> String {
        self.out
    }

    pub fn write_null(&mut self) {
        self.out.push_str("null");
    }

    pub fn write_bool(&mut self, b: bool) {
        self.out.push_str(if b { "true" } else { "false" });
    }

    pub fn write_number(&mut self, n: f64) -> Result<(), EncodeError> {
        if !n.is_finite() {
            return Err(EncodeError::InvalidNumber(n));
        }
        self.out.push_str(&format_number(n));
        Ok(())
    }

    pub fn write_string(&mut self, s: &str) {
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    /// Write a JSON array from already-ordered items.
    pub fn write_array<'a, T, I>(&mut self, items: I) -> Result<(), EncodeError>
    where
        T: Encode + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.out.push('[');
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            item.encode_to(self)?;
        }
        self.out.push(']');
        Ok(())
    }

    /// Write a JSON object from `(key, value)` pairs.
    pub fn write_object<'a, T, I>(&mut self, members: I) -> Result<(), EncodeError>
    where
        T: Encode + ?Sized + 'a,
        I: IntoIterator<Item = (&'a str, &'a T)>,
    {
        self.out.push('{');
        for (i, (key, value)) in members.into_iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.write_string(key);
            self.out.push(':');
            value.encode_to(self)?;
        }
        self.out.push('}');
        Ok(())
    }

    fn write_table(&mut self, table: &Table) -> Result<(), EncodeError> {
        if let Some(items) = table.as_sequence() {
            return self.write_array(items);
        }

        let mut members = Vec::with_capacity(table.len());
        for (key, value) in table.entries() {
            match key {
                Node::Str(k) => members.push((k.as_str(), value)),
                other => return Err(EncodeError::InvalidKeyType(other.type_name())),
            }
        }
        members.sort_by(|a, b| a.0.cmp(b.0));
        self.write_object(members)
    }
}

impl Encode for Value {
    fn encode_to(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            Value::Null => encoder.write_null(),
            Value::Bool(b) => encoder.write_bool(*b),
            Value::Number(n) => encoder.write_number(*n)?,
            Value::String(s) => encoder.write_string(s),
            Value::Array(items) => encoder.write_array(items)?,
            Value::Object(map) => encoder.write_object(map.iter().map(|(k, v)| (k.as_str(), v)))?,
        }
        Ok(())
    }
}

impl Encode for Node {
    fn encode_to(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            Node::Null => encoder.write_null(),
            Node::Bool(b) => encoder.write_bool(*b),
            Node::Number(n) => encoder.write_number(*n)?,
            Node::Str(s) => encoder.write_string(s),
            Node::Table(table) => {
                let ptr = Rc::as_ptr(table) as *const Table;
                if encoder.path.contains(&ptr) {
                    return Err(EncodeError::CircularReference);
                }
                encoder.path.push(ptr);
                let result = encoder.write_table(&table.borrow());
                encoder.path.pop();
                result?;
            }
        }
        Ok(())
    }
}

/// Format a finite number with 14 significant digits (`%.14g`).
fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < INTEGER_LIMIT {
        return format!("{}", n as i64);
    }

    let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, n);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::table::Table;
    use std::collections::BTreeMap;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&Value::Null).unwrap(), "null");
        assert_eq!(encode(&Value::Bool(false)).unwrap(), "false");
        assert_eq!(encode(&Value::from("hi")).unwrap(), "\"hi\"");
        assert_eq!(encode(&Value::Number(42.0)).unwrap(), "42");
        assert_eq!(encode(&Value::Number(-7.0)).unwrap(), "-7");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33333333333333");
        assert_eq!(format_number(123456.789), "123456.789");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(1.5e20), "1.5e+20");
        assert_eq!(format_number(1e15), "1e+15");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_encode_rejects_non_finite_numbers() {
        assert!(matches!(
            encode(&Value::Number(f64::NAN)),
            Err(EncodeError::InvalidNumber(n)) if n.is_nan()
        ));
        assert!(matches!(
            encode(&Node::Number(f64::INFINITY)),
            Err(EncodeError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_encode_string_escapes() {
        let text = encode(&Value::from("a\"b\\c\nd\te\u{1}")).unwrap();
        assert_eq!(text, r#""a\"b\\c\nd\te\u0001""#);
    }

    #[test]
    fn test_encode_non_ascii_passthrough() {
        assert_eq!(encode(&Value::from("héllo 😀")).unwrap(), "\"héllo 😀\"");
    }

    #[test]
    fn test_encode_object_sorted() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::Number(2.0));
        map.insert("a".to_string(), Value::Array(vec![Value::Null, Value::Bool(true)]));
        assert_eq!(
            encode(&Value::Object(map)).unwrap(),
            r#"{"a":[null,true],"b":2}"#
        );
    }

    #[test]
    fn test_encode_table_as_array() {
        let table = Table::new_ref();
        table.borrow_mut().push("x");
        table.borrow_mut().push(1.5);
        assert_eq!(encode(&Node::Table(table)).unwrap(), r#"["x",1.5]"#);
    }

    #[test]
    fn test_encode_empty_table_as_array() {
        assert_eq!(encode(&Node::Table(Table::new_ref())).unwrap(), "[]");
    }

    #[test]
    fn test_encode_table_as_object() {
        let table = Table::new_ref();
        table.borrow_mut().set("value", "--help");
        table.borrow_mut().set("tag", "flags");
        assert_eq!(
            encode(&Node::Table(table)).unwrap(),
            r#"{"tag":"flags","value":"--help"}"#
        );
    }

    #[test]
    fn test_encode_rejects_non_string_keys() {
        let table = Table::new_ref();
        table.borrow_mut().set("name", "x");
        table.borrow_mut().set(true, "y");
        assert_eq!(
            encode(&Node::Table(table)),
            Err(EncodeError::InvalidKeyType("boolean"))
        );

        let sparse = Table::new_ref();
        sparse.borrow_mut().set(1i64, "a");
        sparse.borrow_mut().set(5i64, "b");
        assert_eq!(
            encode(&Node::Table(sparse)),
            Err(EncodeError::InvalidKeyType("number"))
        );
    }

    #[test]
    fn test_encode_detects_self_reference() {
        let table = Table::new_ref();
        table.borrow_mut().set("me", table.clone());
        assert_eq!(
            encode(&Node::Table(table)),
            Err(EncodeError::CircularReference)
        );
    }

    #[test]
    fn test_encode_detects_indirect_cycle() {
        let outer = Table::new_ref();
        let inner = Table::new_ref();
        outer.borrow_mut().push(inner.clone());
        inner.borrow_mut().set("back", outer.clone());
        assert_eq!(
            encode(&Node::Table(outer)),
            Err(EncodeError::CircularReference)
        );
    }

    #[test]
    fn test_encode_allows_shared_subtables() {
        let shared = Table::new_ref();
        shared.borrow_mut().set("k", "v");
        let outer = Table::new_ref();
        outer.borrow_mut().push(shared.clone());
        outer.borrow_mut().push(shared);
        assert_eq!(
            encode(&Node::Table(outer)).unwrap(),
            r#"[{"k":"v"},{"k":"v"}]"#
        );
    }
}
