//! Term marshalling
//!
//! Converts host values into engine terms and engine terms back into host
//! values.
//!
//! ## Forward
//!
//! Any `Serialize` value converts through [`to_term`]:
//!
//! | Host shape | Term |
//! |---|---|
//! | `()` / `None` | `[]` |
//! | `bool` | `true` / `false` |
//! | `i8`..`i64`, `u8`..`u32` | integer |
//! | `u64`, `usize` | float (may lose precision) |
//! | `f32`, `f64` | float |
//! | `char`, `str`, `String` | atom |
//! | `serde_bytes::Bytes` / `ByteBuf` | atom of the bytes as text |
//! | sequences, arrays, tuples | list (bad elements become `[]`) |
//! | `Some`, `Box`, `&T`, `Rc`, `Arc` | the pointee |
//! | value tags | see [`crate::tags`] |
//! | maps, structs, enums | error |
//!
//! ## Reverse
//!
//! [`term_to_value`] produces an untyped [`Value`]; [`from_term`] decodes
//! into any `Deserialize` type.

pub mod de;
pub mod ser;
mod value;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PlResult;
use crate::term::Term;

pub use de::{unquote_atom, TermDeserializer};
pub use ser::TermSerializer;
pub use value::Value;

/// Convert a host value into a term
pub fn to_term<T: Serialize + ?Sized>(value: &T) -> PlResult<Term> {
    value.serialize(TermSerializer)
}

/// Convert a term into an untyped host value; `None` reads as `Nil`
pub fn term_to_value(term: Option<&Term>) -> PlResult<Value> {
    match term {
        None => Ok(Value::Nil),
        Some(term) => from_term(term),
    }
}

/// Decode a term into `T`
pub fn from_term<T: DeserializeOwned>(term: &Term) -> PlResult<T> {
    T::deserialize(TermDeserializer::new(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlError;
    use crate::tags::{PlBool, PlFloat, PlInt, PlList, PlRecord, PlStrTerm, PlString, PlVar, Record};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct Person {
        table: &'static str,
        name: &'static str,
        age: i64,
    }

    impl Record for Person {
        type Fields = (PlString, PlInt);

        fn table_name(&self) -> &str {
            self.table
        }

        fn field_values(&self) -> Self::Fields {
            (PlString::new(self.name), PlInt(self.age))
        }
    }

    fn alice() -> Person {
        Person {
            table: "person",
            name: "Alice",
            age: 30,
        }
    }

    // ========================================================================
    // Forward: scalars
    // ========================================================================

    #[test]
    fn test_nil_and_unit() {
        assert_eq!(to_term(&()).unwrap(), Term::nil());
        assert_eq!(to_term(&None::<i32>).unwrap(), Term::nil());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_term(&true).unwrap(), Term::atom("true"));
        assert_eq!(to_term(&false).unwrap(), Term::atom("false"));
        assert_eq!(to_term(&-5_i8).unwrap(), Term::Integer(-5));
        assert_eq!(to_term(&i64::MIN).unwrap(), Term::Integer(i64::MIN));
        assert_eq!(to_term(&2.5_f32).unwrap(), Term::Float(2.5));
        assert_eq!(to_term(&3.25_f64).unwrap(), Term::Float(3.25));
        assert_eq!(to_term("bob").unwrap(), Term::atom("bob"));
        assert_eq!(to_term(&String::from("bob")).unwrap(), Term::atom("bob"));
        assert_eq!(to_term(&'x').unwrap(), Term::atom("x"));
    }

    #[test]
    fn test_narrow_unsigned_stays_integer() {
        assert_eq!(to_term(&255_u8).unwrap(), Term::Integer(255));
        assert_eq!(to_term(&u32::MAX).unwrap(), Term::Integer(u32::MAX as i64));
    }

    #[test]
    fn test_wide_unsigned_widens_to_float() {
        assert_eq!(to_term(&u64::MAX).unwrap(), Term::Float(u64::MAX as f64));
        assert_eq!(to_term(&usize::MAX).unwrap(), Term::Float(usize::MAX as f64));
        assert_eq!(to_term(&7_u64).unwrap(), Term::Float(7.0));
    }

    #[test]
    fn test_byte_buffer_is_atom() {
        let bytes = serde_bytes::Bytes::new(b"raw text");
        assert_eq!(to_term(&bytes).unwrap(), Term::atom("raw text"));

        let buf = serde_bytes::ByteBuf::from(vec![b'o', b'k']);
        assert_eq!(to_term(&buf).unwrap(), Term::atom("ok"));
    }

    #[test]
    fn test_pointers_are_dereferenced() {
        let boxed: Box<i32> = Box::new(4);
        assert_eq!(to_term(&boxed).unwrap(), Term::Integer(4));

        let shared = Arc::new(vec![1, 2]);
        assert_eq!(
            to_term(&shared).unwrap(),
            Term::list(vec![Term::Integer(1), Term::Integer(2)])
        );

        let nested = &&Some("deep");
        assert_eq!(to_term(nested).unwrap(), Term::atom("deep"));
    }

    // ========================================================================
    // Forward: sequences
    // ========================================================================

    #[test]
    fn test_sequences() {
        assert_eq!(
            to_term(&[1, 2, 3]).unwrap(),
            Term::list(vec![Term::Integer(1), Term::Integer(2), Term::Integer(3)])
        );
        assert_eq!(to_term(&Vec::<i32>::new()).unwrap(), Term::nil());

        let grid = vec![vec![1, 2], vec![3]];
        assert_eq!(to_term(&grid).unwrap().to_string(), "[[1,2],[3]]");

        // A plain Vec<u8> is a sequence, not a byte buffer
        assert_eq!(to_term(&vec![104_u8, 105]).unwrap().to_string(), "[104,105]");
    }

    #[test]
    fn test_list_element_fallback() {
        let mixed = (1, HashMap::<String, i32>::new(), "x");
        assert_eq!(
            to_term(&mixed).unwrap(),
            Term::list(vec![Term::Integer(1), Term::nil(), Term::atom("x")])
        );
    }

    #[test]
    fn test_unsupported_kinds() {
        #[derive(serde::Serialize)]
        struct Plain {
            a: i32,
        }

        #[derive(serde::Serialize)]
        enum Shape {
            Circle,
        }

        let err = to_term(&HashMap::<String, i32>::new()).unwrap_err();
        assert!(matches!(err, PlError::UnsupportedValue(ref k) if k == "map"));

        let err = to_term(&Plain { a: 1 }).unwrap_err();
        assert!(matches!(err, PlError::UnsupportedValue(ref k) if k.contains("Plain")));

        let err = to_term(&Shape::Circle).unwrap_err();
        assert!(matches!(err, PlError::UnsupportedValue(ref k) if k.contains("Circle")));

        assert!(to_term(&1_i128).is_err());
    }

    // ========================================================================
    // Forward: tags and records
    // ========================================================================

    #[test]
    fn test_tags() {
        assert_eq!(to_term(&PlBool(true)).unwrap(), Term::atom("true"));
        assert_eq!(to_term(&PlInt(-2)).unwrap(), Term::Integer(-2));
        assert_eq!(to_term(&PlFloat(0.5)).unwrap(), Term::Float(0.5));
        assert_eq!(to_term(&PlString::new("Hi")).unwrap(), Term::atom("Hi"));
        assert_eq!(to_term(&PlStrTerm::new("f(X)")).unwrap(), Term::atom("f(X)"));
        assert_eq!(to_term(&PlVar::new("X")).unwrap(), Term::var("X"));
        assert_eq!(
            to_term(&PlList(vec![PlVar::new("H"), PlVar::new("T")])).unwrap(),
            Term::list(vec![Term::var("H"), Term::var("T")])
        );
    }

    #[test]
    fn test_record_encoding() {
        let term = to_term(&PlRecord(alice())).unwrap();
        assert_eq!(
            term,
            Term::compound("person", vec![Term::atom("Alice"), Term::Integer(30)])
        );
    }

    #[test]
    fn test_record_empty_table_rejected() {
        let nameless = Person {
            table: "",
            ..alice()
        };
        let err = to_term(&PlRecord(nameless)).unwrap_err();
        assert!(matches!(err, PlError::InvalidRecord(_)));
    }

    #[test]
    fn test_record_inside_list() {
        let nameless = Person {
            table: "",
            ..alice()
        };
        let term = to_term(&(PlRecord(alice()), PlRecord(nameless))).unwrap();
        assert_eq!(term.to_string(), "[person('Alice',30),[]]");
    }

    #[test]
    fn test_record_by_reference() {
        let person = alice();
        let term = to_term(&PlRecord(&person)).unwrap();
        assert_eq!(term.to_string(), "person('Alice',30)");
    }

    // ========================================================================
    // Reverse
    // ========================================================================

    #[test]
    fn test_reverse_nil() {
        assert_eq!(term_to_value(None).unwrap(), Value::Nil);
    }

    #[test]
    fn test_reverse_scalars() {
        assert_eq!(
            term_to_value(Some(&Term::atom("hello"))).unwrap(),
            Value::Text("hello".into())
        );
        assert_eq!(term_to_value(Some(&Term::Integer(7))).unwrap(), Value::Int(7));
        assert_eq!(term_to_value(Some(&Term::Float(0.5))).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_reverse_atom_quote_stripping() {
        assert_eq!(unquote_atom("'abc'"), "abc");
        assert_eq!(unquote_atom("'a'"), "a");
        assert_eq!(unquote_atom("plain"), "plain");
        assert_eq!(unquote_atom("'open"), "'open");
    }

    #[test]
    fn test_reverse_short_atoms_verbatim() {
        // Two characters or fewer are never inspected for quotes
        assert_eq!(unquote_atom("''"), "''");
        assert_eq!(unquote_atom("'"), "'");
        assert_eq!(unquote_atom("[]"), "[]");
        assert_eq!(
            term_to_value(Some(&Term::atom("''"))).unwrap(),
            Value::Text("''".into())
        );
    }

    #[test]
    fn test_reverse_lists() {
        let list = Term::list(vec![Term::Integer(1), Term::atom("b")]);
        assert_eq!(
            term_to_value(Some(&list)).unwrap(),
            Value::List(vec![Value::Int(1), Value::Text("b".into())])
        );

        let partial = Term::cons(Term::Integer(1), Term::var("T"));
        assert_eq!(
            term_to_value(Some(&partial)).unwrap(),
            Value::List(vec![Value::Int(1)])
        );
    }

    #[test]
    fn test_reverse_compound_as_text() {
        let term = Term::compound("person", vec![Term::atom("Alice"), Term::Integer(30)]);
        assert_eq!(
            term_to_value(Some(&term)).unwrap(),
            Value::Text("person('Alice',30)".into())
        );
    }

    #[test]
    fn test_reverse_variable_is_error() {
        let err = term_to_value(Some(&Term::var("X"))).unwrap_err();
        assert!(matches!(err, PlError::UnsupportedTerm(_)));

        let list = Term::list(vec![Term::Integer(1), Term::var("X")]);
        assert!(term_to_value(Some(&list)).is_err());
    }

    // ========================================================================
    // Round trips
    // ========================================================================

    #[test]
    fn test_scalar_round_trips() {
        assert!(from_term::<bool>(&to_term(&true).unwrap()).unwrap());
        assert!(!from_term::<bool>(&to_term(&false).unwrap()).unwrap());
        assert_eq!(from_term::<i64>(&to_term(&-42_i64).unwrap()).unwrap(), -42);
        assert_eq!(from_term::<f64>(&to_term(&1.5e300).unwrap()).unwrap(), 1.5e300);
        assert_eq!(
            from_term::<String>(&to_term("hello").unwrap()).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_list_fidelity() {
        for n in [0_i64, 1, 5] {
            let items: Vec<i64> = (0..n).collect();
            let back: Vec<i64> = from_term(&to_term(&items).unwrap()).unwrap();
            assert_eq!(back, items);
        }

        let items = vec!["one", "two", "three"];
        let back = term_to_value(Some(&to_term(&items).unwrap())).unwrap();
        assert_eq!(back, Value::from(items));
    }

    #[test]
    fn test_option_from_nil() {
        assert_eq!(from_term::<Option<i64>>(&Term::nil()).unwrap(), None);
        assert_eq!(from_term::<Option<i64>>(&Term::Integer(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_value_feeds_back_into_forward() {
        let value = Value::List(vec![Value::Int(1), Value::Text("a".into()), Value::Nil]);
        assert_eq!(to_term(&value).unwrap().to_string(), "[1,a,[]]");
    }

    #[test]
    fn test_value_to_json() {
        let value = Value::List(vec![Value::Int(1), Value::Float(0.5), Value::Nil]);
        assert_eq!(
            serde_json::Value::from(value),
            serde_json::json!([1, 0.5, null])
        );
    }
}
