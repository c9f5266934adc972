//! JSON decoder
//!
//! A recursive-descent parser that never panics and never returns partial
//! results. Value parsing is dispatched on the first character through a
//! lookup table with one entry per possible value-start character.
//!
//! # Design Principles
//!
//! - **Exact diagnostics** - errors carry 1-based line and column counted in
//!   characters, so they can be shown to a user as-is
//! - **Strict strings** - raw control characters are rejected, surrogate pairs
//!   are combined, lone surrogates are errors
//! - **Bounded recursion** - nesting deeper than [`MAX_DEPTH`] is an error
//!   rather than a stack overflow

use std::collections::BTreeMap;

use super::error::DecodeError;
use super::value::Value;

/// Maximum nesting of arrays and objects.
pub const MAX_DEPTH: usize = 512;

type ParseFn = fn(&mut Parser) -> Result<Value, DecodeError>;

/// Value-start dispatch table, indexed by ASCII code.
static DISPATCH: [Option<ParseFn>; 128] = build_dispatch();

const fn build_dispatch() -> [Option<ParseFn>; 128] {
    let mut table: [Option<ParseFn>; 128] = [None; 128];
    table[b'"' as usize] = Some(Parser::parse_string_value as ParseFn);
    table[b'-' as usize] = Some(Parser::parse_number as ParseFn);
    let mut digit = b'0';
    while digit <= b'9' {
        table[digit as usize] = Some(Parser::parse_number as ParseFn);
        digit += 1;
    }
    table[b't' as usize] = Some(Parser::parse_true as ParseFn);
    table[b'f' as usize] = Some(Parser::parse_false as ParseFn);
    table[b'n' as usize] = Some(Parser::parse_null as ParseFn);
    table[b'[' as usize] = Some(Parser::parse_array as ParseFn);
    table[b'{' as usize] = Some(Parser::parse_object as ParseFn);
    table
}

/// Decode JSON text into a [`Value`].
///
/// # Arguments
/// * `text` - Complete JSON document
///
/// # Returns
/// * `Result<Value, DecodeError>` - Decoded value, or the first error found
pub fn decode(text: &str) -> Result<Value, DecodeError> {
    let mut parser = Parser::new(text);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if !parser.is_at_end() {
        let (line, column) = parser.line_column(parser.pos);
        return Err(DecodeError::TrailingGarbage { line, column });
    }
    Ok(value)
}

/// Decode raw bytes, rejecting input that is not UTF-8 text before parsing.
pub fn decode_bytes(bytes: &[u8]) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        DecodeError::Type(format!(
            "expected UTF-8 text, found invalid byte at offset {}",
            e.valid_up_to()
        ))
    })?;
    decode(text)
}

/// Parser state: the input as characters and a cursor into it.
struct Parser {
    input: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn parse_value(&mut self) -> Result<Value, DecodeError> {
        self.skip_whitespace();
        let Some(ch) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        match DISPATCH.get(ch as usize).copied().flatten() {
            Some(parse) => parse(self),
            None => Err(self.error(format!("unexpected character '{}'", ch.escape_default()))),
        }
    }

    fn parse_string_value(&mut self) -> Result<Value, DecodeError> {
        self.parse_string().map(Value::String)
    }

    fn parse_true(&mut self) -> Result<Value, DecodeError> {
        self.parse_literal("true", Value::Bool(true))
    }

    fn parse_false(&mut self) -> Result<Value, DecodeError> {
        self.parse_literal("false", Value::Bool(false))
    }

    fn parse_null(&mut self) -> Result<Value, DecodeError> {
        self.parse_literal("null", Value::Null)
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Result<Value, DecodeError> {
        for expected in word.chars() {
            if self.peek() != Some(expected) {
                return Err(self.error(format!("invalid literal, expected '{word}'")));
            }
            self.advance();
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;

        if self.peek() == Some('-') {
            self.advance();
        }
        match self.peek() {
            Some('0') => self.advance(),
            Some('1'..='9') => self.skip_digits(),
            _ => return Err(self.error("expected digit")),
        }
        if self.peek() == Some('.') {
            self.advance();
            self.expect_digits()?;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            self.expect_digits()?;
        }

        let text: String = self.input[start..self.pos].iter().collect();
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Number(n)),
            Ok(_) => Err(self.error_at(start, format!("number out of range '{text}'"))),
            Err(_) => Err(self.error_at(start, format!("invalid number '{text}'"))),
        }
    }

    fn expect_digits(&mut self) -> Result<(), DecodeError> {
        if !matches!(self.peek(), Some('0'..='9')) {
            return Err(self.error("expected digit"));
        }
        self.skip_digits();
        Ok(())
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
    }

    fn parse_string(&mut self) -> Result<String, DecodeError> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            match ch {
                '"' => {
                    self.advance();
                    return Ok(value);
                }
                '\\' => {
                    self.advance();
                    value.push(self.parse_escape()?);
                }
                c if (c as u32) < 0x20 => {
                    return Err(self.error(format!(
                        "control character U+{:04X} in string",
                        c as u32
                    )));
                }
                c => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Parse the part of an escape sequence after the backslash.
    fn parse_escape(&mut self) -> Result<char, DecodeError> {
        let Some(ch) = self.peek() else {
            return Err(self.error("unterminated string"));
        };
        let decoded = match ch {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.advance();
                return self.parse_unicode_escape();
            }
            other => {
                return Err(self.error(format!("invalid escape '\\{}'", other.escape_default())));
            }
        };
        self.advance();
        Ok(decoded)
    }

    /// Parse `XXXX` after `\u`, combining a following low surrogate if needed.
    fn parse_unicode_escape(&mut self) -> Result<char, DecodeError> {
        let start = self.pos;
        let high = self.parse_hex4()?;

        let code = match high {
            0xD800..=0xDBFF => {
                if self.peek() != Some('\\') || self.peek_at(1) != Some('u') {
                    return Err(self.error_at(start, "unpaired high surrogate"));
                }
                self.advance();
                self.advance();
                let low = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error_at(start, "invalid low surrogate"));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.error_at(start, "unpaired low surrogate")),
            _ => high,
        };

        char::from_u32(code).ok_or_else(|| self.error_at(start, "invalid unicode escape"))
    }

    fn parse_hex4(&mut self) -> Result<u32, DecodeError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("expected hex digit in unicode escape"))?;
            code = code * 16 + digit;
            self.advance();
        }
        Ok(code)
    }

    fn parse_array(&mut self) -> Result<Value, DecodeError> {
        self.enter()?;
        self.advance(); // '['
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.advance();
            self.depth -= 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(_) => return Err(self.error("expected ',' or ']' in array")),
                None => return Err(self.error("unterminated array")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> Result<Value, DecodeError> {
        self.enter()?;
        self.advance(); // '{'
        let mut members = BTreeMap::new();

        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.advance();
            self.depth -= 1;
            return Ok(Value::Object(members));
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('"') => {}
                Some(_) => return Err(self.error("expected string key in object")),
                None => return Err(self.error("unterminated object")),
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            if self.peek() != Some(':') {
                return Err(self.error("expected ':' after object key"));
            }
            self.advance();

            let value = self.parse_value()?;
            members.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(_) => return Err(self.error("expected ',' or '}' in object")),
                None => return Err(self.error("unterminated object")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(members))
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// 1-based line and column of the character at `pos`.
    fn line_column(&self, pos: usize) -> (usize, usize) {
        let consumed = &self.input[..pos.min(self.input.len())];
        let line = 1 + consumed.iter().filter(|&&c| c == '\n').count();
        let line_start = consumed
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |i| i + 1);
        (line, pos - line_start + 1)
    }

    fn error(&self, message: impl Into<String>) -> DecodeError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> DecodeError {
        let (line, column) = self.line_column(pos);
        DecodeError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn syntax_position(result: Result<Value, DecodeError>) -> (usize, usize) {
        match result {
            Err(DecodeError::Syntax { line, column, .. }) => (line, column),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode("null").unwrap(), Value::Null);
        assert_eq!(decode("true").unwrap(), Value::Bool(true));
        assert_eq!(decode(" false ").unwrap(), Value::Bool(false));
        assert_eq!(decode("-12.5e1").unwrap(), Value::Number(-125.0));
        assert_eq!(decode("0").unwrap(), Value::Number(0.0));
        assert_eq!(decode(r#""abc""#).unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_decode_rejects_out_of_range_numbers() {
        assert_eq!(syntax_position(decode("[1, 1e400]")), (1, 5));
        assert!(decode("-1e400").is_err());

        let tiny = decode("1e-400").unwrap();
        assert_eq!(decode(&encode(&tiny).unwrap()).unwrap(), tiny);
    }

    #[test]
    fn test_decode_nested_document() {
        let value = decode(
            r#"{
                "messages": [],
                "nospace": "/=",
                "values": [{"value": "--help", "tag": "flags"}]
            }"#,
        )
        .unwrap();

        assert_eq!(value.get("nospace").and_then(Value::as_str), Some("/="));
        let values = value.get("values").and_then(Value::as_array).unwrap();
        assert_eq!(values[0].get("tag").and_then(Value::as_str), Some("flags"));
        assert_eq!(value.get("messages").and_then(Value::as_array).map(|m| m.len()), Some(0));
    }

    #[test]
    fn test_decode_escapes() {
        let value = decode(r#""a\"b\\c\/d\be\ff\ng\rh\ti\u0041""#).unwrap();
        assert_eq!(value, Value::from("a\"b\\c/d\u{8}e\u{c}f\ng\rh\tiA"));
    }

    #[test]
    fn test_decode_surrogate_pair() {
        let value = decode(r#""\ud83d\ude00""#).unwrap();
        let s = value.as_str().unwrap();
        assert_eq!(s, "\u{1F600}");
        assert_eq!(s.as_bytes(), &[0xF0, 0x9F, 0x98, 0x80]);
    }

    #[test]
    fn test_decode_rejects_lone_surrogates() {
        assert!(decode(r#""\ud83d""#).is_err());
        assert!(decode(r#""\ud83dx""#).is_err());
        assert!(decode(r#""\ude00""#).is_err());
        assert!(decode(r#""\ud83d\u0041""#).is_err());
    }

    #[test]
    fn test_decode_rejects_control_characters() {
        let err = decode("\"a\tb\"").unwrap_err();
        assert_eq!(err.position(), Some((1, 3)));

        let err = decode("\"line\nbreak\"").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { ref message, .. } if message.contains("control character")));
    }

    #[test]
    fn test_syntax_error_line_and_column() {
        let text = "{\n  \"values\": [\n    {\"value\": x}\n  ]\n}";
        assert_eq!(syntax_position(decode(text)), (3, 15));
    }

    #[test]
    fn test_column_counts_characters_not_bytes() {
        let text = "[\"é😀\", ?]";
        assert_eq!(syntax_position(decode(text)), (1, 8));
    }

    #[test]
    fn test_crlf_line_counting() {
        let text = "{\r\n\"a\": 1,\r\n\"b\" 2}";
        assert_eq!(syntax_position(decode(text)), (3, 5));
    }

    #[test]
    fn test_trailing_garbage() {
        assert_eq!(
            decode("{} x"),
            Err(DecodeError::TrailingGarbage { line: 1, column: 4 })
        );
        assert_eq!(
            decode("[1]\n\n]"),
            Err(DecodeError::TrailingGarbage { line: 3, column: 1 })
        );
        assert!(decode("{}  \n\t").is_ok());
    }

    #[test]
    fn test_decode_errors_on_malformed_input() {
        for text in [
            "", "ab", "{", "[1,]", "[1 2]", "{\"a\" 1}", "{a: 1}", "tru", "nul", "-", "01x",
            "1.", "1e", "\"abc", "\"\\x\"", "{\"a\":1,}",
        ] {
            assert!(decode(text).is_err(), "expected error for {:?}", text);
        }
    }

    #[test]
    fn test_empty_input_position() {
        assert_eq!(syntax_position(decode("")), (1, 1));
        assert_eq!(syntax_position(decode("  \n ")), (2, 2));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let value = decode(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert!(decode(&deep).is_err());

        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(decode(&ok).is_ok());
    }

    #[test]
    fn test_decode_bytes_rejects_non_text() {
        assert!(matches!(
            decode_bytes(&[b'"', 0xFF, b'"']),
            Err(DecodeError::Type(_))
        ));
        assert_eq!(decode_bytes(b"[true]").unwrap(), Value::Array(vec![Value::Bool(true)]));
    }

    #[test]
    fn test_round_trip() {
        let text = r#"{"a":[1,2.5,-0.001,true,false,null],"b":{"c":"x\ny\u0001"},"d":"😀","e":[]}"#;
        let value = decode(text).unwrap();
        let encoded = encode(&value).unwrap();
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_agrees_with_reference_decoder() {
        let samples = [
            r#"{"values":[{"value":"--help","display":"--help","description":"show help","tag":"flags","style":"yellow"}],"nospace":"="}"#,
            r#"[1e3, -0.5, 123456789, 1.25E-2]"#,
            r#"{"messages":["unknown flag: --x"]}"#,
            r#""\u00e9\ud83d\ude00\t""#,
        ];
        for sample in samples {
            let ours = decode(sample).unwrap();
            let reference: serde_json::Value = serde_json::from_str(sample).unwrap();
            assert_eq!(ours, from_reference(&reference), "decode mismatch for {}", sample);

            let reparsed: serde_json::Value =
                serde_json::from_str(&encode(&ours).unwrap()).unwrap();
            assert_eq!(from_reference(&reparsed), ours, "encode mismatch for {}", sample);
        }
    }

    fn from_reference(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(from_reference).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), from_reference(v)))
                    .collect(),
            ),
        }
    }
}
