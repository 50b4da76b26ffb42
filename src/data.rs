use std::{borrow::Cow, fmt, sync::OnceLock};

use regex::Regex;
use uuid::Uuid;

use crate::schema::SemanticType;

/// Markers the source data uses for suppressed or missing values.
pub const SENTINEL_TOKENS: &[&str] = &["^", "-", "I/D", "N/A", "<4", "< 4"];

/// Cell values accepted as `true` for boolean fields.
pub const TRUTHY_TOKENS: &[&str] = &["A", "*", "Y"];

static SENTINEL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn sentinel_pattern() -> &'static Regex {
    SENTINEL_PATTERN.get_or_init(|| {
        let alternation = SENTINEL_TOKENS
            .iter()
            .map(|token| regex::escape(token))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&alternation).expect("sentinel alternation is a valid pattern")
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f32),
    Boolean(bool),
    Text(String),
    Reference(Option<Uuid>),
}

impl FieldValue {
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            FieldValue::Integer(_) => SemanticType::Integer,
            FieldValue::Float(_) => SemanticType::Float,
            FieldValue::Boolean(_) => SemanticType::Boolean,
            FieldValue::Text(_) => SemanticType::Text,
            FieldValue::Reference(_) => SemanticType::Reference,
        }
    }

    /// Renders the value as a cell that coerces back to the same value.
    pub fn as_display(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(true) => "Y".to_string(),
            FieldValue::Boolean(false) => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Reference(Some(id)) => id.to_string(),
            FieldValue::Reference(None) => String::new(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceFailure {
    InvalidNumber,
    UnsupportedType,
}

/// Removes every sentinel token from the cell.
///
/// Removal is repeated until the cell no longer contains a token, so a cell
/// such as `<-4` does not leave a freshly formed `<4` behind.
pub fn strip_sentinels(cell: &str) -> Cow<'_, str> {
    let pattern = sentinel_pattern();
    let mut current = pattern.replace_all(cell, "");
    while pattern.is_match(&current) {
        current = Cow::Owned(pattern.replace_all(&current, "").into_owned());
    }
    current
}

/// Lowercases the cell, then uppercases the first letter of each
/// whitespace-delimited word. Whitespace is kept as is.
pub fn title_case(cell: &str) -> String {
    let mut output = String::with_capacity(cell.len());
    let mut at_word_start = true;
    for ch in cell.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            output.push(ch);
        } else if at_word_start {
            at_word_start = false;
            output.extend(ch.to_uppercase());
        } else {
            output.extend(ch.to_lowercase());
        }
    }
    output
}

pub fn is_truthy(cell: &str) -> bool {
    TRUTHY_TOKENS.contains(&cell)
}

/// Coerces an already stripped cell into a value of the given type.
pub fn coerce_cell(cell: &str, semantic_type: SemanticType) -> Result<FieldValue, CoerceFailure> {
    match semantic_type {
        SemanticType::Integer => {
            if cell.is_empty() {
                return Ok(FieldValue::Integer(0));
            }
            cell.parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| CoerceFailure::InvalidNumber)
        }
        SemanticType::Float => {
            if cell.is_empty() {
                return Ok(FieldValue::Float(0.0));
            }
            match cell.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(FieldValue::Float(value)),
                _ => Err(CoerceFailure::InvalidNumber),
            }
        }
        SemanticType::Boolean => Ok(FieldValue::Boolean(is_truthy(cell))),
        SemanticType::Text => Ok(FieldValue::Text(title_case(cell))),
        SemanticType::Reference => Err(CoerceFailure::UnsupportedType),
    }
}
