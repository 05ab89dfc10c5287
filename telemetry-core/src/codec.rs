//! Text wire format: `QoS: <float>, Temp: <float>, Humidity: <float>`.
//!
//! Matching is scanf-like: a space in the template matches any run of whitespace
//! (including none), each number may be preceded by whitespace, and anything after
//! the humidity value is ignored. No range checks happen here; see `validate`.

use std::borrow::Cow;

use crate::reading::{Field, Reading};

/// Wire template, for diagnostics.
pub const TEMPLATE: &str = "QoS: <float>, Temp: <float>, Humidity: <float>";

/// Payload text as the handler sees it: cut at the first NUL, invalid UTF-8 replaced.
pub fn decode_payload(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}

/// Extract a reading from datagram text. Fails unless all three fields match.
pub fn parse_reading(text: &str) -> Result<Reading, ParseError> {
    let mut s = Scanner::new(text);
    s.literal("QoS:")?;
    let qos = s.number(Field::Qos)?;
    s.literal(",")?;
    s.skip_whitespace();
    s.literal("Temp:")?;
    let temperature = s.number(Field::Temperature)?;
    s.literal(",")?;
    s.skip_whitespace();
    s.literal("Humidity:")?;
    let humidity = s.number(Field::Humidity)?;
    Ok(Reading {
        qos,
        temperature,
        humidity,
    })
}

/// Payload did not match the template.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected:?} at byte {offset}")]
    Expected { expected: &'static str, offset: usize },
    #[error("missing {field} value at byte {offset}")]
    MissingValue { field: Field, offset: usize },
    #[error("invalid {field} value {text:?}")]
    InvalidNumber { field: Field, text: String },
}

struct Scanner<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    fn literal(&mut self, expected: &'static str) -> Result<(), ParseError> {
        if self.bytes[self.pos..].starts_with(expected.as_bytes()) {
            self.pos += expected.len();
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected,
                offset: self.pos,
            })
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && is_space(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Longest decimal literal at the cursor: `[+-]digits[.digits][(e|E)[+-]digits]`.
    fn number(&mut self, field: Field) -> Result<f32, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut digits = self.skip_digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            digits += self.skip_digits();
        }
        if digits == 0 {
            self.pos = start;
            return Err(ParseError::MissingValue {
                field,
                offset: start,
            });
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mantissa_end = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.skip_digits() == 0 {
                self.pos = mantissa_end;
            }
        }
        let literal = &self.text[start..self.pos];
        literal
            .parse::<f32>()
            .map_err(|_| ParseError::InvalidNumber {
                field,
                text: literal.to_string(),
            })
    }
}

/// C `isspace` set.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}
