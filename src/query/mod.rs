//! Query execution
//!
//! [`Prolog`] turns a predicate name and host arguments into a [`Goal`],
//! submits it to the engine and collects the answer:
//!
//! - a goal without free variables is checked once and answered with
//!   [`Answer::Truth`]
//! - a goal with free variables is answered with a [`Solutions`] stream
//!   drained by a dedicated producer thread
//!
//! ```ignore
//! let prolog = Prolog::new(ScryerEngine::new());
//! prolog.load_script("likes(alice, bob). likes(carol, bob).")?;
//!
//! let answer = prolog.query("likes", &(PlVar::new("X"), "bob"))?;
//! for bindings in answer.into_solutions().into_iter().flatten() {
//!     println!("{:?}", bindings?["X"]);
//! }
//! ```

pub mod goal;
pub mod stream;

pub use goal::{Goal, DEFAULT_VAR_PREFIX};
pub use stream::{Bindings, Solutions};

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PrologConfig;
use crate::engine::{Cursor, Engine};
use crate::error::{PlError, PlResult};

/// Result of a query
#[derive(Debug)]
pub enum Answer {
    /// Goal had no free variables; whether it succeeded at least once
    Truth(bool),
    /// Goal had free variables
    Solutions(Solutions),
}

impl Answer {
    /// `true` for a successful check. A solution stream is not inspected
    pub fn is_true(&self) -> bool {
        matches!(self, Answer::Truth(true))
    }

    pub fn into_solutions(self) -> Option<Solutions> {
        match self {
            Answer::Solutions(solutions) => Some(solutions),
            Answer::Truth(_) => None,
        }
    }
}

/// Query front end over an [`Engine`]
pub struct Prolog<E: Engine> {
    engine: E,
    config: PrologConfig,
}

impl<E: Engine> Prolog<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: PrologConfig::default(),
        }
    }

    /// Front end using `config`, which must pass [`PrologConfig::validate`]
    pub fn with_config(engine: E, config: PrologConfig) -> PlResult<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &PrologConfig {
        &self.config
    }

    /// Load program text into the engine
    pub fn load_script(&self, program: &str) -> PlResult<()> {
        debug!(bytes = program.len(), "loading script");
        guarded(|| self.engine.consult(program))
    }

    /// Load a program file into the engine
    pub fn load_file(&self, path: impl AsRef<Path>) -> PlResult<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading program file");
        guarded(|| self.engine.consult_file(path))
    }

    /// Build `name(args...)` and run it.
    ///
    /// `args` is a tuple, slice, `Vec` or `()` of argument values, or a
    /// single value for a one-argument goal. A [`PlList`](crate::PlList)
    /// passed as `args` is one list argument; a bare `Vec` is spread.
    pub fn query<A: Serialize + ?Sized>(&self, name: &str, args: &A) -> PlResult<Answer> {
        // Serialize impls and Record methods are caller code
        let goal = guarded(|| Goal::build_with_prefix(name, args, &self.config.var_prefix))?;
        self.run(&goal)
    }

    /// Submit an already built goal
    pub fn run(&self, goal: &Goal) -> PlResult<Answer> {
        let text = goal.text();
        debug!(
            goal = %text,
            literals = goal.literals().len(),
            variables = goal.variables().len(),
            "submitting goal"
        );

        let mut cursor = guarded(|| self.engine.submit(&text, goal.literals()))
            .map_err(|e| match e {
                PlError::Submission { .. } | PlError::Fault(_) => e,
                other => PlError::submission(text.as_str(), other),
            })?;

        if !goal.has_variables() {
            let truth = guarded(|| cursor.advance());
            if let Err(e) = guarded(|| {
                cursor.close();
                Ok(())
            }) {
                warn!(goal = %text, error = %e, "failed to close cursor");
            }
            let truth = truth?;
            debug!(goal = %text, truth, "goal checked");
            return Ok(Answer::Truth(truth));
        }

        Ok(Answer::Solutions(Solutions::spawn(
            cursor,
            text,
            goal.variables().to_vec(),
        )))
    }

    /// Run a query and collect every solution.
    ///
    /// A successful check yields one empty [`Bindings`], a failed check none.
    pub fn query_all<A: Serialize + ?Sized>(
        &self,
        name: &str,
        args: &A,
    ) -> PlResult<Vec<Bindings>> {
        match self.query(name, args)? {
            Answer::Truth(true) => Ok(vec![Bindings::new()]),
            Answer::Truth(false) => Ok(Vec::new()),
            Answer::Solutions(solutions) => solutions.collect(),
        }
    }
}

/// Run marshalling or an engine call, converting a panic into [`PlError::Fault`]
pub(crate) fn guarded<T>(f: impl FnOnce() -> PlResult<T>) -> PlResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let err = PlError::from_panic(payload);
        warn!(error = %err, "call panicked");
        Err(err)
    })
}
