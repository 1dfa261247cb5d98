//! Goal assembly
//!
//! Arguments arrive as one `Serialize` value: a tuple for mixed kinds,
//! a slice or `Vec` for uniform ones, `()` for none. Each argument lands in
//! the goal signature as
//!
//! - a variable name, for [`PlVar`](crate::PlVar),
//! - raw term text, for [`PlStrTerm`](crate::PlStrTerm),
//! - a `?` placeholder, for everything else, with the converted term pushed
//!   onto the literal array.

use serde::ser::{
    Impossible, Serialize, SerializeSeq, SerializeTuple, SerializeTupleStruct, Serializer,
};

use crate::error::{PlError, PlResult};
use crate::marshal::ser::{reject_scalars, TermSerializer};
use crate::marshal::to_term;
use crate::tags::{RAW_TERM_TOKEN, VARIABLE_TOKEN};
use crate::term::Term;
use crate::text::PLACEHOLDER;

/// Prefix for variables named after their argument position
///
/// Engines such as Scryer leave `_`-prefixed variables out of their answers,
/// so the default has no leading underscore.
pub const DEFAULT_VAR_PREFIX: &str = "Var";

/// A callable goal split into signature text and literal arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    name: String,
    signature: String,
    literals: Vec<Term>,
    variables: Vec<String>,
}

impl Goal {
    /// Assemble `name` applied to `args`
    pub fn build<A: Serialize + ?Sized>(name: &str, args: &A) -> PlResult<Self> {
        Self::build_with_prefix(name, args, DEFAULT_VAR_PREFIX)
    }

    /// Assemble `name` applied to `args`, naming anonymous variables
    /// `<var_prefix><position>`
    pub fn build_with_prefix<A: Serialize + ?Sized>(
        name: &str,
        args: &A,
        var_prefix: &str,
    ) -> PlResult<Self> {
        if name.is_empty() {
            return Err(PlError::EmptyGoal);
        }

        let mut writer = GoalWriter {
            var_prefix,
            position: 0,
            signature: String::new(),
            literals: Vec::new(),
            variables: Vec::new(),
        };
        args.serialize(ArgsSerializer {
            writer: &mut writer,
        })?;

        Ok(Self {
            name: name.to_string(),
            signature: writer.signature,
            literals: writer.literals,
            variables: writer.variables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Comma-separated argument text between the parentheses
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Terms bound to the `?` placeholders, in order
    pub fn literals(&self) -> &[Term] {
        &self.literals
    }

    /// Free variable names, in first-seen order, without duplicates
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn has_variables(&self) -> bool {
        !self.variables.is_empty()
    }

    /// Full goal text, `name(signature).`
    pub fn text(&self) -> String {
        format!("{}({}).", self.name, self.signature)
    }
}

struct GoalWriter<'p> {
    var_prefix: &'p str,
    position: usize,
    signature: String,
    literals: Vec<Term>,
    variables: Vec<String>,
}

impl GoalWriter<'_> {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        let index = self.position;
        self.position += 1;
        if index > 0 {
            self.signature.push(',');
        }

        match value.serialize(TagSniffer) {
            Ok(SignatureTag::Var(name)) => {
                let name = if name.is_empty() {
                    format!("{}{}", self.var_prefix, index)
                } else {
                    name
                };
                self.signature.push_str(&name);
                if !self.variables.contains(&name) {
                    self.variables.push(name);
                }
            }
            Ok(SignatureTag::Raw(text)) => self.signature.push_str(&text),
            Err(_) => {
                self.literals.push(to_term(value)?);
                self.signature.push(PLACEHOLDER);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Argument list
// ============================================================================

/// Walks the argument container; a non-sequence is a single argument
struct ArgsSerializer<'a, 'p> {
    writer: &'a mut GoalWriter<'p>,
}

/// Re-serializes a newtype handed to the argument walker as one argument
struct Newtype<'v, T: ?Sized> {
    name: &'static str,
    value: &'v T,
}

impl<T: Serialize + ?Sized> Serialize for Newtype<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(self.name, self.value)
    }
}

macro_rules! single_argument {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> PlResult<()> {
                self.writer.push(&v)
            }
        )*
    };
}

impl<'a, 'p> Serializer for ArgsSerializer<'a, 'p> {
    type Ok = ();
    type Error = PlError;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Impossible<(), PlError>;
    type SerializeMap = Impossible<(), PlError>;
    type SerializeStruct = Impossible<(), PlError>;
    type SerializeStructVariant = Impossible<(), PlError>;

    single_argument!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
    );

    fn serialize_str(self, v: &str) -> PlResult<()> {
        self.writer.push(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> PlResult<()> {
        self.writer.push(serde_bytes::Bytes::new(v))
    }

    fn serialize_none(self) -> PlResult<()> {
        self.writer.push(&())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> PlResult<()> {
        value.serialize(self)
    }

    /// No arguments
    fn serialize_unit(self) -> PlResult<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, name: &'static str) -> PlResult<()> {
        Err(PlError::UnsupportedValue(format!("unit struct `{}`", name)))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> PlResult<()> {
        Err(PlError::UnsupportedValue(format!(
            "enum variant `{}::{}`",
            name, variant
        )))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> PlResult<()> {
        self.writer.push(&Newtype { name, value })
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> PlResult<()> {
        Err(PlError::UnsupportedValue(format!(
            "enum variant `{}::{}`",
            name, variant
        )))
    }

    fn serialize_seq(self, _len: Option<usize>) -> PlResult<Self> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> PlResult<Self> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> PlResult<Self> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeTupleVariant> {
        Err(PlError::UnsupportedValue(format!(
            "enum variant `{}::{}`",
            name, variant
        )))
    }

    fn serialize_map(self, _len: Option<usize>) -> PlResult<Self::SerializeMap> {
        Err(PlError::UnsupportedValue("map".to_string()))
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeStruct> {
        Err(PlError::UnsupportedValue(format!("struct `{}`", name)))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> PlResult<Self::SerializeStructVariant> {
        Err(PlError::UnsupportedValue(format!(
            "enum variant `{}::{}`",
            name, variant
        )))
    }
}

impl SerializeSeq for ArgsSerializer<'_, '_> {
    type Ok = ();
    type Error = PlError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        self.writer.push(value)
    }

    fn end(self) -> PlResult<()> {
        Ok(())
    }
}

impl SerializeTuple for ArgsSerializer<'_, '_> {
    type Ok = ();
    type Error = PlError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        self.writer.push(value)
    }

    fn end(self) -> PlResult<()> {
        Ok(())
    }
}

impl SerializeTupleStruct for ArgsSerializer<'_, '_> {
    type Ok = ();
    type Error = PlError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> PlResult<()> {
        self.writer.push(value)
    }

    fn end(self) -> PlResult<()> {
        Ok(())
    }
}

// ============================================================================
// Tag detection
// ============================================================================

enum SignatureTag {
    Var(String),
    Raw(String),
}

/// Recognises the tags that go into the signature verbatim
struct TagSniffer;

fn not_a_tag(kind: &str) -> PlError {
    PlError::Custom(format!("{} is not a signature tag", kind))
}

impl Serializer for TagSniffer {
    type Ok = SignatureTag;
    type Error = PlError;

    type SerializeSeq = Impossible<SignatureTag, PlError>;
    type SerializeTuple = Impossible<SignatureTag, PlError>;
    type SerializeTupleStruct = Impossible<SignatureTag, PlError>;
    type SerializeTupleVariant = Impossible<SignatureTag, PlError>;
    type SerializeMap = Impossible<SignatureTag, PlError>;
    type SerializeStruct = Impossible<SignatureTag, PlError>;
    type SerializeStructVariant = Impossible<SignatureTag, PlError>;

    reject_scalars!(not_a_tag;
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

    fn serialize_none(self) -> PlResult<SignatureTag> {
        Err(not_a_tag("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> PlResult<SignatureTag> {
        Err(not_a_tag("option"))
    }

    fn serialize_unit(self) -> PlResult<SignatureTag> {
        Err(not_a_tag("unit"))
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> PlResult<SignatureTag> {
        Err(not_a_tag("enum variant"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> PlResult<SignatureTag> {
        let text = || -> PlResult<String> {
            match value.serialize(TermSerializer)? {
                Term::Atom(text) => Ok(text),
                other => Err(not_a_tag(other.kind())),
            }
        };
        match name {
            VARIABLE_TOKEN => text().map(SignatureTag::Var),
            RAW_TERM_TOKEN => text().map(SignatureTag::Raw),
            _ => Err(not_a_tag("newtype")),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _value: &T,
    ) -> PlResult<SignatureTag> {
        Err(not_a_tag("enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> PlResult<Self::SerializeSeq> {
        Err(not_a_tag("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> PlResult<Self::SerializeTuple> {
        Err(not_a_tag("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> PlResult<Self::SerializeTupleStruct> {
        Err(not_a_tag("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> PlResult<Self::SerializeTupleVariant> {
        Err(not_a_tag("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> PlResult<Self::SerializeMap> {
        Err(not_a_tag("map"))
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> PlResult<Self::SerializeStruct> {
        Err(not_a_tag("struct"))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> PlResult<Self::SerializeStructVariant> {
        Err(not_a_tag("enum variant"))
    }
}
