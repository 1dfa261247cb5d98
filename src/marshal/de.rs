//! Term → host value conversion
//!
//! `TermDeserializer` is self-describing: `deserialize_any` maps every term
//! kind to one visitor call, which is all the untyped [`Value`] needs.
//! Typed targets additionally get `bool` from `true`/`false` atoms, `None`
//! and empty sequences from `[]`.
//!
//! [`Value`]: super::Value

use serde::de::{DeserializeSeed, Deserializer, SeqAccess, Visitor};
use serde::forward_to_deserialize_any;

use crate::error::PlError;
use crate::term::{ListIter, Term};

/// Strip surrounding single quotes from atom text.
///
/// Only text longer than two bytes is inspected; anything shorter is
/// returned as is, so `''` stays `''`.
pub fn unquote_atom(text: &str) -> &str {
    let len = text.len();
    if len <= 2 {
        return text;
    }
    if text.starts_with('\'') && text.ends_with('\'') {
        &text[1..len - 1]
    } else {
        text
    }
}

/// Deserializer reading from a borrowed [`Term`]
pub struct TermDeserializer<'a> {
    term: &'a Term,
}

impl<'a> TermDeserializer<'a> {
    pub fn new(term: &'a Term) -> Self {
        Self { term }
    }
}

impl<'de, 'a> Deserializer<'de> for TermDeserializer<'a> {
    type Error = PlError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, PlError> {
        match self.term {
            Term::Atom(text) => visitor.visit_string(unquote_atom(text).to_string()),
            Term::Integer(i) => visitor.visit_i64(*i),
            Term::Float(f) => visitor.visit_f64(*f),
            Term::Compound { .. } if self.term.as_cons().is_some() => {
                visitor.visit_seq(ListAccess {
                    iter: self.term.list_iter(),
                })
            }
            // No structured form for other compounds: hand back the text
            Term::Compound { .. } => visitor.visit_string(self.term.to_string()),
            Term::Variable(name) => Err(PlError::UnsupportedTerm(format!(
                "unbound variable {}",
                name
            ))),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, PlError> {
        match self.term {
            Term::Atom(a) if a == "true" => visitor.visit_bool(true),
            Term::Atom(a) if a == "false" => visitor.visit_bool(false),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, PlError> {
        if self.term.is_nil() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, PlError> {
        if self.term.is_nil() {
            visitor.visit_unit()
        } else {
            self.deserialize_any(visitor)
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, PlError> {
        if self.term.is_nil() {
            // An empty list is the atom `[]`, walk it as zero cells
            visitor.visit_seq(ListAccess {
                iter: self.term.list_iter(),
            })
        } else {
            self.deserialize_any(visitor)
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, PlError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, PlError> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit_struct tuple_struct map struct enum identifier
        ignored_any
    }
}

struct ListAccess<'a> {
    iter: ListIter<'a>,
}

impl<'de, 'a> SeqAccess<'de> for ListAccess<'a> {
    type Error = PlError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, PlError> {
        match self.iter.next() {
            Some(term) => seed.deserialize(TermDeserializer::new(term)).map(Some),
            None => Ok(None),
        }
    }
}
