// SwitchOS page notation decoder
//
// The switch serves its pages as a JavaScript-flavoured object literal:
// unquoted keys, hex integers (`0x1f`), and single-quoted hex-encoded
// strings. This module turns that text into a `serde_json::Value` so the
// typed payload models can use plain serde derives.

use serde_json::{Map, Number, Value};

use crate::error::Error;

/// Decode a page body into JSON.
///
/// Single-quoted strings are kept as their raw hex text; the payload
/// models decide which fields are text and which are binary (MAC, etc.).
pub fn to_json(body: &str) -> Result<Value, Error> {
    let mut parser = Parser {
        src: body.as_bytes(),
        pos: 0,
        depth: 0,
        body,
    };
    parser.skip_ws();
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos != parser.src.len() {
        return Err(parser.error("trailing characters after value"));
    }
    Ok(value)
}

/// Decode a hex-encoded string (`'4d696b'`) into text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; device
/// names are free-form and occasionally carry Latin-1 bytes.
pub fn decode_hex_text(hex: &str) -> Option<String> {
    let bytes = decode_hex_bytes(hex)?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decode a hex string into raw bytes. Returns `None` on odd length or
/// non-hex characters.
pub fn decode_hex_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = char::from(pair[0]).to_digit(16)?;
            let lo = char::from(pair[1]).to_digit(16)?;
            u8::try_from(hi * 16 + lo).ok()
        })
        .collect()
}

/// Deepest `{`/`[` nesting accepted. Real pages nest two levels.
const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
    body: &'a str,
}

impl Parser<'_> {
    fn value(&mut self) -> Result<Value, Error> {
        match self.peek() {
            Some(b'{') => self.nested(Self::object),
            Some(b'[') => self.nested(Self::array),
            Some(b'\'' | b'"') => self.string().map(Value::String),
            Some(b'0'..=b'9' | b'-') => self.number(),
            Some(b't' | b'f' | b'n') => self.keyword(),
            Some(other) => Err(self.error(&format!("unexpected character '{}'", char::from(other)))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Value, Error>) -> Result<Value, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn object(&mut self) -> Result<Value, Error> {
        self.expect(b'{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat(b'}') {
                return Ok(Value::Object(map));
            }
            let key = self.key()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            self.expect(b'}')?;
            return Ok(Value::Object(map));
        }
    }

    fn array(&mut self) -> Result<Value, Error> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(b']') {
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            self.expect(b']')?;
            return Ok(Value::Array(items));
        }
    }

    fn key(&mut self) -> Result<String, Error> {
        if matches!(self.peek(), Some(b'\'' | b'"')) {
            return self.string();
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected object key"));
        }
        Ok(self.body[start..self.pos].to_owned())
    }

    fn string(&mut self) -> Result<String, Error> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected string"));
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let text = self.body[start..self.pos].to_owned();
                self.pos += 1;
                return Ok(text);
            }
            self.pos += 1;
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Value, Error> {
        let negative = self.eat(b'-');
        let start = self.pos;
        let hex = self.src[self.pos..].starts_with(b"0x") || self.src[self.pos..].starts_with(b"0X");
        if hex {
            self.pos += 2;
        }
        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            let ok = if hex {
                c.is_ascii_hexdigit()
            } else {
                c.is_ascii_digit()
            };
            if !ok {
                break;
            }
            self.pos += 1;
        }
        let digits = &self.body[digits_start..self.pos];
        if digits.is_empty() {
            return Err(self.error(&format!("malformed number '{}'", &self.body[start..self.pos])));
        }
        let radix = if hex { 16 } else { 10 };
        let magnitude = u64::from_str_radix(digits, radix)
            .map_err(|e| self.error(&format!("number out of range: {e}")))?;
        if negative {
            let signed = i64::try_from(magnitude)
                .map_err(|_| self.error("negative number out of range"))?;
            Ok(Value::Number(Number::from(-signed)))
        } else {
            Ok(Value::Number(Number::from(magnitude)))
        }
    }

    fn keyword(&mut self) -> Result<Value, Error> {
        for (word, value) in [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
        ] {
            if self.src[self.pos..].starts_with(word.as_bytes()) {
                self.pos += word.len();
                return Ok(value);
            }
        }
        Err(self.error("unknown keyword"))
    }

    // ── Low-level helpers ────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), Error> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(c))))
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::Deserialization {
            message: format!("{message} at offset {}", self.pos),
            body: self.body.to_owned(),
        }
    }
}
