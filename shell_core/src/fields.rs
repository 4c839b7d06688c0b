//! # Record Accessor
//!
//! Typed access to a positional field list. A card is a sequence of optional
//! primitive tokens; position 0 holds the card name and the data fields start
//! at 1. The tokenizer that produces the list lives outside this crate and is
//! consumed through [`FieldSource`].
//!
//! Every accessor is a pure function of `(fields, index, label)`:
//!
//! | accessor | blank slot | wrong token type |
//! |---|---|---|
//! | [`required_integer`] | `MissingRequiredField` | `InvalidFieldType` |
//! | [`optional_integer`] | default | `InvalidFieldType` |
//! | [`integer_or_blank`] | `None` | `InvalidFieldType` |
//! | [`required_float`] | `MissingRequiredField` | `InvalidFieldType` |
//! | [`optional_float`] | default | `InvalidFieldType` |
//! | [`float_or_blank`] | `None` | `InvalidFieldType` |
//! | [`optional_token`] | default | `InvalidFieldType`, `InvalidEnumValue` |
//!
//! Integer tokens are not accepted in float slots: `1` and `1.` are different
//! things on a bulk data card.
//!
//! ## Example
//!
//! ```rust
//! use shell_core::fields::{BdfCard, Field, required_integer, optional_float};
//!
//! let card = BdfCard::new(vec![
//!     Some(Field::from("PSHEAR")),
//!     Some(Field::from(10)),
//!     Some(Field::from(20)),
//!     Some(Field::from(0.05)),
//! ]);
//!
//! assert_eq!(required_integer(&card, 1, "pid").unwrap(), 10);
//! assert_eq!(optional_float(&card, 4, "nsm", 0.0).unwrap(), 0.0);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PropResult, PropertyError};

/// Relative tolerance used when comparing floats for default elision and card equivalence
pub const FLOAT_TOLERANCE: f64 = 1e-12;

/// One primitive token of a card.
///
/// Deserializes from plain JSON scalars: `1` is an integer, `1.0` a float,
/// `"YES"` a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Field {
    /// Name of the token type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Int(_) => "integer",
            Field::Float(_) => "float",
            Field::Str(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Str(s) => Some(s),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Field::Str(s) if s.trim().is_empty())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Float(v) => write!(f, "{:?}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Str(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Str(s)
    }
}

/// Input capability: one tokenized logical card.
///
/// Indexing is 1-based for data fields; index 0 is the card name. Slots past
/// the end of the card read as blank.
pub trait FieldSource {
    /// The token at `index`, or `None` if the slot is blank or absent
    fn field(&self, index: usize) -> Option<&Field>;

    /// Number of fields including the card name
    fn nfields(&self) -> usize;

    /// Raw slice of fields `[start, end)`
    fn fields(&self, start: usize, end: usize) -> Vec<Option<Field>> {
        (start..end).map(|i| self.field(i).cloned()).collect()
    }

    /// Card name from field 0
    fn card_name(&self) -> &str {
        self.field(0).and_then(Field::as_str).unwrap_or("card")
    }
}

/// In-memory card backed by a vector of optional tokens.
///
/// Trailing blanks are dropped so that `nfields` reflects the last populated
/// field, the way a continuation-aware tokenizer reports it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Option<Field>>", into = "Vec<Option<Field>>")]
pub struct BdfCard {
    fields: Vec<Option<Field>>,
}

impl BdfCard {
    pub fn new(fields: Vec<Option<Field>>) -> Self {
        let mut fields: Vec<Option<Field>> = fields
            .into_iter()
            .map(|f| f.filter(|v| !v.is_blank()))
            .collect();
        while matches!(fields.last(), Some(None)) {
            fields.pop();
        }
        BdfCard { fields }
    }
}

impl From<Vec<Option<Field>>> for BdfCard {
    fn from(fields: Vec<Option<Field>>) -> Self {
        BdfCard::new(fields)
    }
}

impl From<BdfCard> for Vec<Option<Field>> {
    fn from(card: BdfCard) -> Self {
        card.fields
    }
}

impl FieldSource for BdfCard {
    fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index).and_then(|f| f.as_ref())
    }

    fn nfields(&self) -> usize {
        self.fields.len()
    }
}

// ============================================================================
// Slot coercion
// ============================================================================

/// Coerce a single slot to an integer
pub fn integer_slot(value: Option<&Field>, label: &str, index: usize) -> PropResult<Option<i64>> {
    match value {
        None => Ok(None),
        Some(Field::Int(v)) => Ok(Some(*v)),
        Some(other) => Err(PropertyError::invalid_type(label, index, "integer", other.type_name())),
    }
}

/// Coerce a single slot to a float
pub fn float_slot(value: Option<&Field>, label: &str, index: usize) -> PropResult<Option<f64>> {
    match value {
        None => Ok(None),
        Some(Field::Float(v)) => Ok(Some(*v)),
        Some(other) => Err(PropertyError::invalid_type(label, index, "float", other.type_name())),
    }
}

/// Coerce a single slot to an upper-case string token
pub fn string_slot(value: Option<&Field>, label: &str, index: usize) -> PropResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(Field::Str(s)) => Ok(Some(s.trim().to_uppercase())),
        Some(other) => Err(PropertyError::invalid_type(label, index, "string", other.type_name())),
    }
}

/// Coerce a single slot to a token from `allowed`, falling back to `default`
pub fn token_slot(
    value: Option<&Field>,
    label: &str,
    index: usize,
    default: Option<&str>,
    allowed: &[&str],
) -> PropResult<Option<String>> {
    let token = string_slot(value, label, index)?.or_else(|| default.map(str::to_string));
    match token {
        Some(t) if !allowed.contains(&t.as_str()) => Err(PropertyError::invalid_enum(label, t, allowed)),
        other => Ok(other),
    }
}

// ============================================================================
// Accessors
// ============================================================================

fn missing(src: &dyn FieldSource, label: &str, index: usize) -> PropertyError {
    PropertyError::missing_field(src.card_name(), label, index)
}

/// Unwrap a coerced slot that must be populated
pub fn required<T>(value: Option<T>, card: &str, label: &str, index: usize) -> PropResult<T> {
    value.ok_or_else(|| PropertyError::missing_field(card, label, index))
}

pub fn required_integer(src: &dyn FieldSource, index: usize, label: &str) -> PropResult<i64> {
    integer_slot(src.field(index), label, index)?.ok_or_else(|| missing(src, label, index))
}

pub fn optional_integer(src: &dyn FieldSource, index: usize, label: &str, default: i64) -> PropResult<i64> {
    Ok(integer_slot(src.field(index), label, index)?.unwrap_or(default))
}

pub fn integer_or_blank(src: &dyn FieldSource, index: usize, label: &str) -> PropResult<Option<i64>> {
    integer_slot(src.field(index), label, index)
}

pub fn required_float(src: &dyn FieldSource, index: usize, label: &str) -> PropResult<f64> {
    float_slot(src.field(index), label, index)?.ok_or_else(|| missing(src, label, index))
}

pub fn optional_float(src: &dyn FieldSource, index: usize, label: &str, default: f64) -> PropResult<f64> {
    Ok(float_slot(src.field(index), label, index)?.unwrap_or(default))
}

pub fn float_or_blank(src: &dyn FieldSource, index: usize, label: &str) -> PropResult<Option<f64>> {
    float_slot(src.field(index), label, index)
}

/// Read a token restricted to `allowed`; a blank slot yields `default`.
pub fn optional_token(
    src: &dyn FieldSource,
    index: usize,
    label: &str,
    default: Option<&str>,
    allowed: &[&str],
) -> PropResult<Option<String>> {
    token_slot(src.field(index), label, index, default, allowed)
}

/// Closed set of string tokens a card field may hold.
pub trait CardToken: Sized {
    /// Every token accepted on the card
    const ALLOWED: &'static [&'static str];

    fn from_token(token: &str) -> Option<Self>;

    fn token(&self) -> &'static str;
}

/// Read a typed token slot; `None` when blank and no default applies
pub fn token_value<T: CardToken>(
    value: Option<&Field>,
    label: &str,
    index: usize,
    default: Option<T>,
) -> PropResult<Option<T>> {
    let default = default.as_ref().map(T::token);
    let token = token_slot(value, label, index, default, T::ALLOWED)?;
    Ok(token.as_deref().and_then(T::from_token))
}

/// [`optional_token`] mapped onto a [`CardToken`] enum
pub fn optional_enum<T: CardToken>(
    src: &dyn FieldSource,
    index: usize,
    label: &str,
    default: Option<T>,
) -> PropResult<Option<T>> {
    token_value(src.field(index), label, index, default)
}

// ============================================================================
// Output helpers
// ============================================================================

/// Float equality within [`FLOAT_TOLERANCE`] (relative, absolute near zero)
pub fn is_same_float(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= FLOAT_TOLERANCE * scale
}

/// Blank a float that equals its documented default
pub fn blank_if_default(value: f64, default: f64) -> Option<Field> {
    if is_same_float(value, default) {
        None
    } else {
        Some(Field::Float(value))
    }
}

/// Blank a token that equals its documented default
pub fn blank_token_if_default<T: CardToken + PartialEq>(value: &T, default: &T) -> Option<Field> {
    if value == default {
        None
    } else {
        Some(Field::from(value.token()))
    }
}

/// Compare two positional field lists, treating floats within tolerance as equal
pub fn fields_match(a: &[Option<Field>], b: &[Option<Field>]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Some(Field::Float(x)), Some(Field::Float(y))) => is_same_float(*x, *y),
            (x, y) => x == y,
        })
}

/// Column width of the fixed-format text rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldWidth {
    /// 8-character columns
    #[default]
    Short,
    /// 16-character columns
    Long,
}

/// Output capability: renders a positional field list as fixed-width text.
pub trait CardPrinter {
    fn print_card_8(&self, fields: &[Option<Field>]) -> String;

    fn print_card_16(&self, fields: &[Option<Field>]) -> String;

    fn print_card(&self, fields: &[Option<Field>], width: FieldWidth) -> String {
        match width {
            FieldWidth::Short => self.print_card_8(fields),
            FieldWidth::Long => self.print_card_16(fields),
        }
    }
}

// ============================================================================
// Positional update tables
// ============================================================================

/// Typed setter for one header field
pub type FieldSetter<T> = fn(&mut T, Option<&Field>) -> PropResult<()>;

/// A named slot in a card's positional layout
pub struct FieldSlot<T> {
    pub name: &'static str,
    pub set: FieldSetter<T>,
}

/// Field index to setter table, built once per card type
pub type FieldMap<T> = HashMap<usize, FieldSlot<T>>;

/// Apply `value` to the slot at `index`, or fail with `FieldCountMismatch`
pub fn apply_update<T>(map: &FieldMap<T>, card: &str, target: &mut T, index: usize, value: Option<&Field>) -> PropResult<()> {
    let slot = map
        .get(&index)
        .ok_or_else(|| PropertyError::field_mismatch(card, index, "no field is declared at this position"))?;
    tracing::debug!(card, index, field = slot.name, "updating field");
    (slot.set)(target, value)
}
