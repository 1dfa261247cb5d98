//! Engine term model
//!
//! Terms are the values a Prolog engine understands. Lists are not a
//! separate variant: they are right-nested `'.'/2` cells terminated by the
//! empty-list atom `[]`.

/// Functor of a list cell
pub const LIST_FUNCTOR: &str = ".";

/// The empty-list atom, also used to encode host `nil`
pub const NIL: &str = "[]";

/// A Prolog term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Symbolic constant, also carries string data
    Atom(String),
    /// Signed whole number
    Integer(i64),
    /// Double precision number
    Float(f64),
    /// Unbound logic variable, named within one goal
    Variable(String),
    /// Structured term
    Compound { functor: String, args: Vec<Term> },
}

impl Term {
    pub fn atom(text: impl Into<String>) -> Self {
        Term::Atom(text.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn compound(functor: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Compound {
            functor: functor.into(),
            args,
        }
    }

    /// The empty-list atom
    pub fn nil() -> Self {
        Term::Atom(NIL.to_string())
    }

    /// A single list cell `'.'(head, tail)`
    pub fn cons(head: Term, tail: Term) -> Self {
        Term::compound(LIST_FUNCTOR, vec![head, tail])
    }

    /// Build a proper list from `items`
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Term>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Term::nil(), |tail, head| Term::cons(head, tail))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(a) if a == NIL)
    }

    /// Head and tail if this term is a list cell
    pub fn as_cons(&self) -> Option<(&Term, &Term)> {
        match self {
            Term::Compound { functor, args } if functor == LIST_FUNCTOR && args.len() == 2 => {
                Some((&args[0], &args[1]))
            }
            _ => None,
        }
    }

    /// Iterate the elements along a list spine.
    ///
    /// Iteration stops at the first tail that is not a list cell, so partial
    /// and improper lists yield the elements they do have.
    pub fn list_iter(&self) -> ListIter<'_> {
        ListIter { cursor: self }
    }

    /// Human readable name of the term kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Term::Atom(_) => "atom",
            Term::Integer(_) => "integer",
            Term::Float(_) => "float",
            Term::Variable(_) => "variable",
            Term::Compound { .. } => "compound",
        }
    }
}

/// Iterator over list cell heads
pub struct ListIter<'a> {
    cursor: &'a Term,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Term;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, tail) = self.cursor.as_cons()?;
        self.cursor = tail;
        Some(head)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Atom(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Atom(s)
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Integer(i)
    }
}

impl From<f64> for Term {
    fn from(f: f64) -> Self {
        Term::Float(f)
    }
}
