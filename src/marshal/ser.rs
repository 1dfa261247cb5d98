//! Host value → term conversion
//!
//! The serde data model is the closed set of host shapes we accept. Each
//! `serialize_*` method is one branch of the dispatch; shapes with no term
//! encoding fail with [`PlError::UnsupportedValue`].

use serde::ser::{
    Impossible, Serialize, SerializeSeq, SerializeTuple, SerializeTupleStruct, Serializer,
};
use tracing::trace;

use crate::error::{PlError, PlResult};
use crate::tags::{RAW_TERM_TOKEN, RECORD_TOKEN, VARIABLE_TOKEN};
use crate::term::Term;

/// Rejects a scalar `serialize_*` method with the error built by `$reject`
macro_rules! reject_scalars {
    ($reject:ident; $($method:ident($ty:ty) => $kind:literal),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<Self::Ok, Self::Error> {
                Err($reject($kind))
            }
        )*
    };
}

pub(crate) use reject_scalars;

/// Serializer producing a [`Term`]
pub struct TermSerializer;

fn unsupported(kind: impl Into<String>) -> PlError {
    PlError::UnsupportedValue(kind.into())
}

/// Text payload of a tag newtype
fn tag_text<T: Serialize + ?Sized>(value: &T) -> PlResult<String> {
    match value.serialize(TermSerializer)? {
        Term::Atom(text) => Ok(text),
        other => Err(PlError::UnsupportedValue(format!(
            "tag payload must be text, got {}",
            other.kind()
        ))),
    }
}

impl Serializer for TermSerializer {
    type Ok = Term;
    type Error = PlError;

    type SerializeSeq = ListBuilder;
    type SerializeTuple = ListBuilder;
    type SerializeTupleStruct = ListBuilder;
    type SerializeTupleVariant = Impossible<Term, PlError>;
    type SerializeMap = Impossible<Term, PlError>;
    type SerializeStruct = Impossible<Term, PlError>;
    type SerializeStructVariant = Impossible<Term, PlError>;

    fn serialize_bool(self, v: bool) -> PlResult<Term> {
        Ok(Term::atom(if v { "true" } else { "false" }))
    }

    fn serialize_i8(self, v: i8) -> PlResult<Term> {
        Ok(Term::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> PlResult<Term> {
        Ok(Term::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> PlResult<Term> {
        Ok(Term::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> PlResult<Term> {
        Ok(Term::Integer(v))
    }

    fn serialize_i128(self, _v: i128) -> PlResult<Term> {
        Err(unsupported("i128"))
    }

    fn serialize_u8(self, v: u8) -> PlResult<Term> {
        Ok(Term::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> PlResult<Term> {
        Ok(Term::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> PlResult<Term> {
        Ok(Term::Integer(v.into()))
    }

    /// `u64` and `usize` do not fit a signed 64-bit integer term, so they are
    /// widened to a float. Values above 2^53 lose precision.
    fn serialize_u64(self, v: u64) -> PlResult<Term> {
        Ok(Term::Float(v as f64))
    }

    fn serialize_u128(self, _v: u128) -> PlResult<Term> {
        Err(unsupported("u128"))
    }

    fn serialize_f32(self, v: f32) -> PlResult<Term> {
        Ok(Term::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> PlResult<Term> {
        Ok(Term::Float(v))
    }

    fn serialize_char(self, v: char) -> PlResult<Term> {
        Ok(Term::Atom(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> PlResult<Term> {
        Ok(Term::atom(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> PlResult<Term> {
        Ok(Term::Atom(String::from_utf8_lossy(v).into_owned()))
    }

    fn serialize_none(self) -> PlResult<Term> {
        Ok(Term::nil())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> PlResult<Term> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> PlResult<Term> {
        Ok(Term::nil())
    }

    fn serialize_unit_struct(self, name: &'static str) -> PlResult<Term> {
        Err(unsupported(format!("unit struct `{}`", name)))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> PlResult<Term> {
        Err(unsupported(format!("enum variant `{}::{}`", name, variant)))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> PlResult<Term> {
        match name {
            VARIABLE_TOKEN => Ok(Term::Variable(tag_text(value)?)),
            RAW_TERM_TOKEN => Ok(Term::Atom(tag_text(value)?)),
            RECORD_TOKEN => value.serialize(RecordSerializer),
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> PlResult<Term> {
        Err(unsupported(format!("enum variant `{}::{}`", name, variant)))
    }

    fn serialize_seq(self, len: Option<usize>) -> PlResult<ListBuilder> {
        Ok(ListBuilder::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> PlResult<ListBuilder> {
        Ok(ListBuilder::with_capacity(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> PlResult<ListBuilder> {
        Ok(ListBuilder::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeTupleVariant> {
        Err(unsupported(format!("enum variant `{}::{}`", name, variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> PlResult<Self::SerializeMap> {
        Err(unsupported("map"))
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeStruct> {
        Err(unsupported(format!("struct `{}`", name)))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeStructVariant> {
        Err(unsupported(format!("enum variant `{}::{}`", name, variant)))
    }
}

/// Collects sequence elements into a list term.
///
/// An element that fails to convert is replaced by `[]`; the rest of the
/// list is still built.
pub struct ListBuilder {
    items: Vec<Term>,
}

impl ListBuilder {
    fn with_capacity(len: usize) -> Self {
        Self {
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) {
        let term = value.serialize(TermSerializer).unwrap_or_else(|e| {
            trace!(index = self.items.len(), error = %e, "list element replaced by []");
            Term::nil()
        });
        self.items.push(term);
    }
}

impl SerializeSeq for ListBuilder {
    type Ok = Term;
    type Error = PlError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        self.push(value);
        Ok(())
    }

    fn end(self) -> PlResult<Term> {
        Ok(Term::list(self.items))
    }
}

impl SerializeTuple for ListBuilder {
    type Ok = Term;
    type Error = PlError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        self.push(value);
        Ok(())
    }

    fn end(self) -> PlResult<Term> {
        Ok(Term::list(self.items))
    }
}

impl SerializeTupleStruct for ListBuilder {
    type Ok = Term;
    type Error = PlError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        self.push(value);
        Ok(())
    }

    fn end(self) -> PlResult<Term> {
        Ok(Term::list(self.items))
    }
}

// ============================================================================
// Records
// ============================================================================

/// Accepts only the `(table_name, fields)` pair written by `serialize_record`
struct RecordSerializer;

fn not_a_record(kind: &str) -> PlError {
    PlError::InvalidRecord(format!("expected (table name, fields), got {}", kind))
}

impl Serializer for RecordSerializer {
    type Ok = Term;
    type Error = PlError;

    type SerializeSeq = Impossible<Term, PlError>;
    type SerializeTuple = RecordBuilder;
    type SerializeTupleStruct = Impossible<Term, PlError>;
    type SerializeTupleVariant = Impossible<Term, PlError>;
    type SerializeMap = Impossible<Term, PlError>;
    type SerializeStruct = Impossible<Term, PlError>;
    type SerializeStructVariant = Impossible<Term, PlError>;

    reject_scalars!(not_a_record;
        serialize_bool(bool) => "bool",
        serialize_i8(i8) => "integer",
        serialize_i16(i16) => "integer",
        serialize_i32(i32) => "integer",
        serialize_i64(i64) => "integer",
        serialize_u8(u8) => "integer",
        serialize_u16(u16) => "integer",
        serialize_u32(u32) => "integer",
        serialize_u64(u64) => "integer",
        serialize_f32(f32) => "float",
        serialize_f64(f64) => "float",
        serialize_char(char) => "char",
        serialize_str(&str) => "string",
        serialize_bytes(&[u8]) => "bytes",
        serialize_unit_struct(&'static str) => "unit struct",
    );

    fn serialize_none(self) -> PlResult<Term> {
        Err(not_a_record("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> PlResult<Term> {
        Err(not_a_record("option"))
    }

    fn serialize_unit(self) -> PlResult<Term> {
        Err(not_a_record("unit"))
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> PlResult<Term> {
        Err(not_a_record("enum variant"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> PlResult<Term> {
        Err(not_a_record("newtype"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _value: &T,
    ) -> PlResult<Term> {
        Err(not_a_record("enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> PlResult<Self::SerializeSeq> {
        Err(not_a_record("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> PlResult<RecordBuilder> {
        Ok(RecordBuilder::default())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeTupleStruct> {
        Err(not_a_record("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> PlResult<Self::SerializeTupleVariant> {
        Err(not_a_record("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> PlResult<Self::SerializeMap> {
        Err(not_a_record("map"))
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> PlResult<Self::SerializeStruct> {
        Err(not_a_record("struct"))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> PlResult<Self::SerializeStructVariant> {
        Err(not_a_record("enum variant"))
    }
}

#[derive(Default)]
struct RecordBuilder {
    table: Option<String>,
    fields: Option<Vec<Term>>,
}

impl SerializeTuple for RecordBuilder {
    type Ok = Term;
    type Error = PlError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        if self.table.is_none() {
            let table = tag_text(value)?;
            if table.is_empty() {
                return Err(PlError::InvalidRecord(
                    "table name expected for record".to_string(),
                ));
            }
            self.table = Some(table);
            return Ok(());
        }

        let fields = value.serialize(TermSerializer)?;
        if fields.is_nil() {
            self.fields = Some(Vec::new());
        } else if fields.as_cons().is_some() {
            self.fields = Some(fields.list_iter().cloned().collect());
        } else {
            return Err(PlError::InvalidRecord(format!(
                "field values must be an ordered sequence, got {}",
                fields.kind()
            )));
        }
        Ok(())
    }

    fn end(self) -> PlResult<Term> {
        let table = self
            .table
            .ok_or_else(|| PlError::InvalidRecord("table name expected for record".to_string()))?;
        Ok(Term::compound(table, self.fields.unwrap_or_default()))
    }
}
