//! Scripted engine shared by the integration tests
//!
//! Solutions are scripted per goal text. Goals without a script fall back to
//! a built-in `member/2` check so boolean queries work without a real
//! engine. Every submission, advance and close is counted.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use prolog_bridge::{Cursor, Engine, PlError, PlResult, Term};

/// One scripted cursor step
#[derive(Debug, Clone)]
pub enum Row {
    /// A solution with these bindings
    Solution(Vec<(&'static str, Term)>),
    /// A solution whose bindings cannot be read
    Unreadable(&'static str),
    /// `advance` panics
    Panic(&'static str),
}

#[derive(Debug, Clone)]
enum Script {
    Rows(Vec<Row>),
    Endless(Vec<(&'static str, Term)>),
    Reject(&'static str),
}

#[derive(Default)]
pub struct Counters {
    pub advances: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Counters {
    pub fn advances(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct ScriptedEngine {
    scripts: Mutex<HashMap<String, Script>>,
    submissions: Mutex<Vec<(String, Vec<Term>)>>,
    programs: Mutex<Vec<String>>,
    pub counters: Arc<Counters>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the solutions of `goal`
    pub fn script(&self, goal: &str, rows: Vec<Row>) {
        self.scripts
            .lock()
            .insert(goal.to_string(), Script::Rows(rows));
    }

    /// Script a goal that yields the same solution forever
    pub fn script_endless(&self, goal: &str, bindings: Vec<(&'static str, Term)>) {
        self.scripts
            .lock()
            .insert(goal.to_string(), Script::Endless(bindings));
    }

    /// Make submission of `goal` fail
    pub fn reject(&self, goal: &str, message: &'static str) {
        self.scripts
            .lock()
            .insert(goal.to_string(), Script::Reject(message));
    }

    pub fn submissions(&self) -> Vec<(String, Vec<Term>)> {
        self.submissions.lock().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.programs.lock().clone()
    }
}

impl Engine for ScriptedEngine {
    type Cursor = ScriptedCursor;

    fn submit(&self, goal: &str, args: &[Term]) -> PlResult<ScriptedCursor> {
        self.submissions
            .lock()
            .push((goal.to_string(), args.to_vec()));

        let script = self.scripts.lock().get(goal).cloned();
        let (rows, endless) = match script {
            Some(Script::Rows(rows)) => (rows.into(), None),
            Some(Script::Endless(bindings)) => (VecDeque::new(), Some(bindings)),
            Some(Script::Reject(message)) => return Err(PlError::submission(goal, message)),
            None if goal == "member(?,?)." => {
                let found = args[1].list_iter().any(|item| item == &args[0]);
                let rows = if found {
                    vec![Row::Solution(Vec::new())]
                } else {
                    Vec::new()
                };
                (rows.into(), None)
            }
            None => return Err(PlError::submission(goal, "unknown procedure")),
        };

        Ok(ScriptedCursor {
            rows,
            endless,
            current: None,
            closed: false,
            counters: Arc::clone(&self.counters),
        })
    }

    fn consult(&self, program: &str) -> PlResult<()> {
        self.programs.lock().push(program.to_string());
        Ok(())
    }

    fn consult_file(&self, path: &Path) -> PlResult<()> {
        let program = std::fs::read_to_string(path)?;
        self.consult(&program)
    }
}

pub struct ScriptedCursor {
    rows: VecDeque<Row>,
    endless: Option<Vec<(&'static str, Term)>>,
    current: Option<Row>,
    closed: bool,
    counters: Arc<Counters>,
}

impl Cursor for ScriptedCursor {
    fn advance(&mut self) -> PlResult<bool> {
        if self.closed {
            return Ok(false);
        }
        self.counters.advances.fetch_add(1, Ordering::SeqCst);

        let next = match &self.endless {
            Some(bindings) => Some(Row::Solution(bindings.clone())),
            None => self.rows.pop_front(),
        };
        if let Some(Row::Panic(message)) = &next {
            panic!("{}", message);
        }
        self.current = next;
        Ok(self.current.is_some())
    }

    fn read_bindings(&mut self, out: &mut HashMap<String, Term>) -> PlResult<()> {
        match &self.current {
            Some(Row::Solution(bindings)) => {
                for (name, term) in bindings {
                    out.insert(name.to_string(), term.clone());
                }
                Ok(())
            }
            Some(Row::Unreadable(message)) => Err(PlError::Scan(message.to_string())),
            _ => Err(PlError::Scan("no current solution".to_string())),
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install a test subscriber once; output is captured by the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
