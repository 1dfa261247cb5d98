//! Engine contract
//!
//! The resolution engine is an external service. This crate only needs two
//! things from it: submit a goal with positional term arguments and get back
//! a cursor over solutions.
//!
//! ```text
//! Engine::submit("likes(X,?).", [bob]) ──► Cursor
//!                                            │ advance() → true
//!                                            │ read_bindings() → {X: alice}
//!                                            │ advance() → false
//!                                            ▼ close()
//! ```
//!
//! Cursors never leave the thread that advances them: the query pipeline
//! moves a cursor into its producer thread once and closes it there.

use std::collections::HashMap;
use std::path::Path;

use crate::error::PlResult;
use crate::term::Term;

/// A logic engine that accepts goal text with `?` placeholders
pub trait Engine {
    type Cursor: Cursor + Send + 'static;

    /// Submit `goal` with one term per `?` placeholder, left to right.
    ///
    /// Malformed goals and engine-side faults are reported here as
    /// [`PlError::Submission`](crate::PlError::Submission).
    fn submit(&self, goal: &str, args: &[Term]) -> PlResult<Self::Cursor>;

    /// Load program text (clauses and directives)
    fn consult(&self, program: &str) -> PlResult<()>;

    /// Load a program file
    fn consult_file(&self, path: &Path) -> PlResult<()>;
}

/// Solutions of one submitted goal
pub trait Cursor {
    /// Move to the next solution; `false` once exhausted
    fn advance(&mut self) -> PlResult<bool>;

    /// Write the current solution's variable bindings into `out`
    fn read_bindings(&mut self, out: &mut HashMap<String, Term>) -> PlResult<()>;

    /// Release engine resources; further calls to `advance` return `false`
    fn close(&mut self);
}
