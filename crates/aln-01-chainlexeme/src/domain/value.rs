//! Scalar and list values carried by chainlexeme sections.

use serde::{Deserialize, Serialize};
use shared_types::{Amount, PrimitiveError};
use std::fmt;

/// A coerced field value.
///
/// Integers keep their exact digits so amounts wider than any machine
/// integer pass through the parser untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Bool(bool),
    Integer(String),
    Decimal(f64),
    List(Vec<Value>),
}

impl Value {
    /// Coerce raw field text.
    ///
    /// Quoted text is a string, `true`/`false` a boolean, digit runs an
    /// integer, `digits.digits` a decimal, `[a, b]` a list of recursively
    /// coerced items. Anything else stays a raw string.
    pub fn parse(raw: &str) -> Value {
        let text = raw.trim();

        if text.len() >= 2 {
            let bytes = text.as_bytes();
            let (first, last) = (bytes[0], bytes[text.len() - 1]);
            if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                return Value::String(text[1..text.len() - 1].to_string());
            }
        }

        match text {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }

        if is_integer_literal(text) {
            return Value::Integer(text.to_string());
        }

        if is_decimal_literal(text) {
            if let Ok(number) = text.parse::<f64>() {
                return Value::Decimal(number);
            }
        }

        if text.starts_with('[') && text.ends_with(']') {
            let inner = text[1..text.len() - 1].trim();
            if inner.is_empty() {
                return Value::List(Vec::new());
            }
            return Value::List(split_list_items(inner).into_iter().map(Value::parse).collect());
        }

        Value::String(text.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The digit text of an integer literal.
    pub fn as_integer_text(&self) -> Option<&str> {
        match self {
            Value::Integer(digits) => Some(digits),
            _ => None,
        }
    }

    /// Integer value when it fits in 64 bits.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer_text().and_then(|d| d.parse().ok())
    }

    /// Numeric value of an integer or decimal.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(digits) => digits.parse().ok(),
            Value::Decimal(number) => Some(*number),
            _ => None,
        }
    }

    /// Read the value as a non-negative integer amount.
    ///
    /// Integer literals and digit-only strings are accepted; anything
    /// else, including negative or fractional text, is an error.
    pub fn to_amount(&self) -> Result<Amount, PrimitiveError> {
        match self {
            Value::Integer(digits) => Amount::from_dec_str(digits),
            Value::String(text) => Amount::from_dec_str(text.trim()),
            other => Err(PrimitiveError::InvalidDecimal(other.to_plain_string())),
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Unquoted text form, used where a field acts as an identifier.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_plain_string)
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_string(),
        }
    }
}

/// Formats the value the way it must be written back so that
/// [`Value::parse`] yields the same variant.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) if needs_quotes(s) => write!(f, "\"{}\"", s),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(digits) => f.write_str(digits),
            Value::Decimal(number) => {
                let text = number.to_string();
                if text.contains('.') {
                    f.write_str(&text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(n.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Decimal(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

fn is_integer_literal(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal_literal(text: &str) -> bool {
    match text.split_once('.') {
        Some((whole, frac)) => is_integer_literal(whole) && is_integer_literal(frac),
        None => false,
    }
}

/// Split list text on top-level commas.
///
/// Commas inside nested brackets or inside a quoted item do not split. A
/// quote only opens at the start of an item and only closes before a
/// `,`, a `]` or the end of the text.
fn split_list_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut at_item_start = true;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        if let Some(open) = quote {
            if c == open && closes_quote(&inner[i + c.len_utf8()..]) {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if at_item_start => {
                quote = Some(c);
                at_item_start = false;
            }
            '[' => {
                depth += 1;
                at_item_start = true;
            }
            ']' => {
                depth = depth.saturating_sub(1);
                at_item_start = false;
            }
            ',' => {
                if depth == 0 {
                    items.push(&inner[start..i]);
                    start = i + 1;
                }
                at_item_start = true;
            }
            c if c.is_whitespace() => {}
            _ => at_item_start = false,
        }
    }
    items.push(&inner[start..]);
    items
}

fn closes_quote(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with(',') || rest.starts_with(']')
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s == "true"
        || s == "false"
        || is_integer_literal(s)
        || is_decimal_literal(s)
        || s.starts_with("//")
        || s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | ',' | '[' | ']' | '"' | '\'' | '#'))
}
