//! Value tags
//!
//! Wrappers that state the intended term encoding explicitly when the
//! implicit mapping of a host value is not what the caller wants. Every tag
//! is `Serialize`, so tags can be nested anywhere a host value is accepted.
//!
//! `PlVar`, `PlStrTerm` and `PlRecord` travel through serde as newtype
//! structs with reserved names that the term serializer recognises. Other
//! serializers see them as their plain contents.

use serde::ser::{Serialize, SerializeTuple, Serializer};

pub(crate) const VARIABLE_TOKEN: &str = "$prolog_bridge::PlVar";
pub(crate) const RAW_TERM_TOKEN: &str = "$prolog_bridge::PlStrTerm";
pub(crate) const RECORD_TOKEN: &str = "$prolog_bridge::PlRecord";
pub(crate) const LIST_TOKEN: &str = "$prolog_bridge::PlList";

/// Boolean, encoded as the atom `true` or `false`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlBool(pub bool);

/// Integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlInt(pub i64);

/// Float
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlFloat(pub f64);

/// String encoded as an atom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlString(pub String);

/// String holding raw term syntax.
///
/// As a query argument the text is spliced into the goal unescaped; as a
/// nested value it becomes an atom carrying the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlStrTerm(pub String);

/// Free variable. An empty name is replaced by a positional name when the
/// variable is a query argument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlVar(pub String);

/// Sequence encoded as a list. Passed as the whole argument set of a query
/// it stays one list argument instead of being spread.
#[derive(Debug, Clone, PartialEq)]
pub struct PlList<T>(pub Vec<T>);

/// Record encoded as a compound named after its table
#[derive(Debug, Clone)]
pub struct PlRecord<R>(pub R);

impl PlString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl PlStrTerm {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl PlVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Variable named after its argument position
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Capability of host types that map to a compound term.
///
/// `field_values` must be an ordered sequence: a tuple, array, slice or
/// `Vec`. Fields follow the list element rules, so a field that cannot be
/// converted becomes `[]`.
pub trait Record {
    type Fields: Serialize;

    /// Functor of the compound; must not be empty
    fn table_name(&self) -> &str;

    fn field_values(&self) -> Self::Fields;
}

impl<R: Record + ?Sized> Record for &R {
    type Fields = R::Fields;

    fn table_name(&self) -> &str {
        (**self).table_name()
    }

    fn field_values(&self) -> Self::Fields {
        (**self).field_values()
    }
}

/// Serialize `record` the way [`PlRecord`] does.
///
/// Lets a `Record` type implement `Serialize` directly so it converts
/// without the wrapper:
///
/// ```
/// use prolog_bridge::{serialize_record, Record};
/// use serde::{Serialize, Serializer};
///
/// struct Point(i64, i64);
///
/// impl Record for Point {
///     type Fields = (i64, i64);
///     fn table_name(&self) -> &str { "point" }
///     fn field_values(&self) -> (i64, i64) { (self.0, self.1) }
/// }
///
/// impl Serialize for Point {
///     fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
///         serialize_record(self, s)
///     }
/// }
/// ```
pub fn serialize_record<R, S>(record: &R, serializer: S) -> Result<S::Ok, S::Error>
where
    R: Record + ?Sized,
    S: Serializer,
{
    serializer.serialize_newtype_struct(RECORD_TOKEN, &RecordBody(record))
}

struct RecordBody<'a, R: ?Sized>(&'a R);

impl<R: Record + ?Sized> Serialize for RecordBody<'_, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_tuple(2)?;
        body.serialize_element(self.0.table_name())?;
        body.serialize_element(&self.0.field_values())?;
        body.end()
    }
}

impl Serialize for PlBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

impl Serialize for PlInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl Serialize for PlFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl Serialize for PlString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl Serialize for PlStrTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(RAW_TERM_TOKEN, &self.0)
    }
}

impl Serialize for PlVar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(VARIABLE_TOKEN, &self.0)
    }
}

impl<T: Serialize> Serialize for PlList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(LIST_TOKEN, &self.0)
    }
}

impl<R: Record> Serialize for PlRecord<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_record(&self.0, serializer)
    }
}
