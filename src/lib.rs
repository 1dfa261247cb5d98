//! Prolog bridge - host value marshalling and query invocation
//!
//! Converts Rust values to Prolog terms and back, builds goals from a
//! predicate name and arguments, and runs them against a pluggable logic
//! engine.
//!
//! # Features
//!
//! - serde based term conversion for scalars, byte strings, sequences,
//!   options and boxed values
//! - Tagged arguments ([`PlVar`], [`PlStrTerm`], [`PlRecord`], ...) that
//!   choose how a value is presented to the engine
//! - Boolean answers for ground goals, streamed [`Solutions`] for goals with
//!   free variables
//! - Optional pure-Rust Scryer Prolog backend (`scryer` feature)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use prolog_bridge::prelude::*;
//! use prolog_bridge::prolog::ScryerEngine;
//!
//! let prolog = Prolog::new(ScryerEngine::new());
//! prolog.load_script("parent(tom, bob). parent(bob, ann).")?;
//!
//! assert!(prolog.query("parent", &("tom", "bob"))?.is_true());
//!
//! for bindings in prolog.query_all("parent", &(PlVar::new("P"), "ann"))? {
//!     println!("{:?}", bindings["P"]);
//! }
//! # Ok::<(), PlError>(())
//! ```

pub mod config;
pub mod engine;
mod error;
pub mod marshal;
pub mod query;
pub mod tags;
pub mod term;
pub mod text;

#[cfg(feature = "scryer")]
pub mod prolog;

// Re-exports
pub use config::PrologConfig;
pub use engine::{Cursor, Engine};
pub use error::{PlError, PlResult};
pub use marshal::{from_term, term_to_value, to_term, Value};
pub use query::{Answer, Bindings, Goal, Prolog, Solutions};
pub use tags::{
    serialize_record, PlBool, PlFloat, PlInt, PlList, PlRecord, PlStrTerm, PlString, PlVar,
    Record,
};
pub use term::Term;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Answer, Bindings, Cursor, Engine, Goal, PlBool, PlError, PlFloat, PlInt, PlList,
        PlRecord, PlResult, PlStrTerm, PlString, PlVar, Prolog, PrologConfig, Record,
        Solutions, Term, Value,
    };
}
