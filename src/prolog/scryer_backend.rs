//! Scryer Prolog engine
//!
//! Pure-Rust backend with no C libraries to link.
//!
//! ## Architecture
//!
//! A Scryer `Machine` is bound to the thread that built it and its query
//! iterator borrows the machine, so neither can be handed to the solution
//! producer. Each submitted goal gets its own worker thread instead:
//!
//! ```text
//! ScryerCursor ──request──► worker: Machine::run_query(goal)
//!              ◄──Step───── (one answer per request)
//! ```
//!
//! The worker builds a fresh machine, loads the configured libraries and
//! every consulted source, then answers one request at a time. Dropping the
//! request channel stops it.
//!
//! ## Limitations
//!
//! - Scryer leaves variables starting with `_` out of its answers, so a
//!   caller-named `_X` never binds. The default `var_prefix` has no
//!   leading underscore.
//! - With `double_quotes=chars` Scryer reports lists of one-character atoms
//!   as strings. They are converted back into lists.
//! - Load errors inside consulted program text are reported by Scryer on
//!   stderr, not through the query.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use scryer_prolog::{LeafAnswer, MachineBuilder, Term as ScryerTerm};
use tracing::{debug, trace};

use crate::config::PrologConfig;
use crate::engine::{Cursor, Engine};
use crate::error::{PlError, PlResult};
use crate::term::Term;
use crate::text::bind_placeholders;

struct Source {
    origin: String,
    program: String,
}

/// Scryer Prolog engine
///
/// Keeps consulted programs and replays them into a fresh machine for every
/// query, so queries never observe each other's side effects.
pub struct ScryerEngine {
    sources: RwLock<Vec<Source>>,
    libraries: Vec<String>,
}

impl Default for ScryerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScryerEngine {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(Vec::new()),
            libraries: Vec::new(),
        }
    }

    /// Engine loading `config.libraries` before user programs
    pub fn with_config(config: &PrologConfig) -> PlResult<Self> {
        config.validate()?;
        Ok(Self {
            sources: RwLock::new(Vec::new()),
            libraries: config.libraries.clone(),
        })
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    /// Number of consulted programs
    pub fn source_count(&self) -> usize {
        self.sources.read().len()
    }

    fn add_source(&self, origin: String, program: String) {
        debug!(origin = %origin, bytes = program.len(), "consulted program");
        self.sources.write().push(Source { origin, program });
    }
}

impl Engine for ScryerEngine {
    type Cursor = ScryerCursor;

    fn submit(&self, goal: &str, args: &[Term]) -> PlResult<ScryerCursor> {
        let query = bind_placeholders(goal, args)?;
        let programs: Vec<String> = self
            .sources
            .read()
            .iter()
            .map(|source| {
                trace!(origin = %source.origin, "replaying program");
                source.program.clone()
            })
            .collect();
        let libraries = self.libraries.clone();

        let (requests, worker_requests) = bounded::<()>(0);
        let (worker_replies, replies) = bounded::<Step>(0);
        let worker = {
            let query = query.clone();
            thread::Builder::new()
                .name("scryer-query".to_string())
                .spawn(move || {
                    run_worker(&query, &libraries, &programs, worker_requests, worker_replies)
                })
                .map_err(|e| PlError::submission(goal, e))?
        };

        let mut cursor = ScryerCursor {
            goal: query,
            requests: Some(requests),
            replies,
            worker: Some(worker),
            pending: None,
            current: None,
            done: false,
        };

        // Prefetch so that malformed goals are reported at submission
        match cursor.fetch() {
            Step::LoadFailed(message) => {
                cursor.close();
                Err(PlError::submission(goal, message))
            }
            Step::Exception(error) if is_syntax_error(&error) => {
                cursor.close();
                Err(PlError::submission(goal, error))
            }
            step => {
                cursor.pending = Some(step);
                Ok(cursor)
            }
        }
    }

    fn consult(&self, program: &str) -> PlResult<()> {
        self.add_source("<text>".to_string(), program.to_string());
        Ok(())
    }

    fn consult_file(&self, path: &Path) -> PlResult<()> {
        let program = fs::read_to_string(path)?;
        self.add_source(path.display().to_string(), program);
        Ok(())
    }
}

/// One answer from the worker
#[derive(Debug)]
enum Step {
    Solution(HashMap<String, Term>),
    Exhausted,
    Exception(Term),
    LoadFailed(String),
}

/// Cursor over the answers of one Scryer query
pub struct ScryerCursor {
    goal: String,
    requests: Option<Sender<()>>,
    replies: Receiver<Step>,
    worker: Option<JoinHandle<()>>,
    pending: Option<Step>,
    current: Option<HashMap<String, Term>>,
    done: bool,
}

impl fmt::Debug for ScryerCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScryerCursor")
            .field("goal", &self.goal)
            .field("pending", &self.pending)
            .field("done", &self.done)
            .finish()
    }
}

impl ScryerCursor {
    /// Goal text after placeholder binding
    pub fn goal(&self) -> &str {
        &self.goal
    }

    fn fetch(&mut self) -> Step {
        let Some(requests) = &self.requests else {
            return Step::Exhausted;
        };
        if requests.send(()).is_err() {
            return Step::LoadFailed("query worker stopped".to_string());
        }
        self.replies
            .recv()
            .unwrap_or_else(|_| Step::LoadFailed("query worker stopped".to_string()))
    }
}

impl Cursor for ScryerCursor {
    fn advance(&mut self) -> PlResult<bool> {
        self.current = None;
        if self.done {
            return Ok(false);
        }

        let step = match self.pending.take() {
            Some(step) => step,
            None => self.fetch(),
        };
        match step {
            Step::Solution(bindings) => {
                self.current = Some(bindings);
                Ok(true)
            }
            Step::Exhausted => {
                self.done = true;
                Ok(false)
            }
            Step::Exception(error) => {
                self.done = true;
                Err(PlError::Scan(format!("exception: {}", error)))
            }
            Step::LoadFailed(message) => {
                self.done = true;
                Err(PlError::Fault(message))
            }
        }
    }

    fn read_bindings(&mut self, out: &mut HashMap<String, Term>) -> PlResult<()> {
        let bindings = self
            .current
            .as_ref()
            .ok_or_else(|| PlError::Scan("no current solution".to_string()))?;
        out.extend(bindings.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn close(&mut self) {
        self.done = true;
        self.current = None;
        self.pending = None;
        self.requests = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            trace!(goal = %self.goal, "query worker joined");
        }
    }
}

impl Drop for ScryerCursor {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(
    query: &str,
    libraries: &[String],
    programs: &[String],
    requests: Receiver<()>,
    replies: Sender<Step>,
) {
    let mut machine = MachineBuilder::default().build();

    let mut load_error = None;
    'load: for library in libraries {
        let directive = format!("use_module(library({})).", library);
        for answer in machine.run_query(&directive) {
            match answer {
                Ok(LeafAnswer::False) => {
                    load_error = Some(format!("library({}) could not be loaded", library));
                    break 'load;
                }
                Ok(LeafAnswer::Exception(error)) | Err(error) => {
                    load_error = Some(format!("library({}): {:?}", library, error));
                    break 'load;
                }
                Ok(_) => break,
            }
        }
    }
    if let Some(message) = load_error {
        if requests.recv().is_ok() {
            let _ = replies.send(Step::LoadFailed(message));
        }
        return;
    }

    // Each program gets its own module label so later consults don't replace it
    for (index, program) in programs.iter().enumerate() {
        machine.consult_module_string(&format!("source_{}", index), program.clone());
    }

    let mut answers = machine.run_query(query);
    while requests.recv().is_ok() {
        let step = match answers.next() {
            None | Some(Ok(LeafAnswer::False)) => Step::Exhausted,
            Some(Ok(LeafAnswer::True)) => Step::Solution(HashMap::new()),
            Some(Ok(LeafAnswer::LeafAnswer { bindings, .. })) => {
                let converted: PlResult<HashMap<String, Term>> = bindings
                    .iter()
                    .map(|(name, term)| Ok((name.clone(), from_scryer(term)?)))
                    .collect();
                match converted {
                    Ok(bindings) => Step::Solution(bindings),
                    Err(e) => Step::Exception(Term::atom(e.to_string())),
                }
            }
            Some(Ok(LeafAnswer::Exception(error))) | Some(Err(error)) => {
                Step::Exception(from_scryer(&error).unwrap_or_else(|e| Term::atom(e.to_string())))
            }
        };
        let last = !matches!(step, Step::Solution(_));
        if replies.send(step).is_err() || last {
            break;
        }
    }
}

fn is_syntax_error(error: &Term) -> bool {
    match error {
        Term::Compound { functor, args } if functor == "error" => {
            matches!(args.first(), Some(Term::Compound { functor, .. }) if functor == "syntax_error")
        }
        _ => false,
    }
}

/// Convert a Scryer answer term
pub fn from_scryer(term: &ScryerTerm) -> PlResult<Term> {
    match term {
        ScryerTerm::Integer(n) => {
            let digits = n.to_string();
            // Beyond i64 the digits are kept as an atom
            Ok(digits
                .parse::<i64>()
                .map(Term::Integer)
                .unwrap_or(Term::Atom(digits)))
        }
        ScryerTerm::Float(f) => Ok(Term::Float(*f)),
        ScryerTerm::Rational(r) => {
            let text = r.to_string();
            rational_to_f64(&text)
                .map(Term::Float)
                .ok_or_else(|| PlError::UnsupportedTerm(format!("rational {}", text)))
        }
        ScryerTerm::Atom(a) => Ok(Term::Atom(a.to_string())),
        ScryerTerm::String(s) => Ok(Term::list(s.chars().map(|c| Term::Atom(c.to_string())))),
        ScryerTerm::List(items) => {
            let items = items.iter().map(from_scryer).collect::<PlResult<Vec<_>>>()?;
            Ok(Term::list(items))
        }
        ScryerTerm::Compound(functor, args) => {
            let args = args.iter().map(from_scryer).collect::<PlResult<Vec<_>>>()?;
            Ok(Term::compound(functor.to_string(), args))
        }
        ScryerTerm::Var(name) => Ok(Term::var(name.to_string())),
        other => Err(PlError::UnsupportedTerm(format!("{:?}", other))),
    }
}

fn rational_to_f64(text: &str) -> Option<f64> {
    if let Ok(f) = text.parse::<f64>() {
        return Some(f);
    }
    let (num, den) = text.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Term conversion
    // ========================================================================

    #[test]
    fn test_from_scryer_scalars() {
        assert_eq!(
            from_scryer(&ScryerTerm::Atom("bob".into())).unwrap(),
            Term::atom("bob")
        );
        assert_eq!(from_scryer(&ScryerTerm::Float(2.5)).unwrap(), Term::Float(2.5));
        assert_eq!(
            from_scryer(&ScryerTerm::Var("X".into())).unwrap(),
            Term::var("X")
        );
    }

    #[test]
    fn test_from_scryer_list() {
        let list = ScryerTerm::List(vec![ScryerTerm::Atom("a".into()), ScryerTerm::Atom("b".into())]);
        let term = from_scryer(&list).unwrap();
        let items: Vec<&Term> = term.list_iter().collect();
        assert_eq!(items, vec![&Term::atom("a"), &Term::atom("b")]);
    }

    #[test]
    fn test_from_scryer_char_list() {
        let term = from_scryer(&ScryerTerm::String("abc".into())).unwrap();
        let items: Vec<&Term> = term.list_iter().collect();
        assert_eq!(
            items,
            vec![&Term::atom("a"), &Term::atom("b"), &Term::atom("c")]
        );
    }

    #[test]
    fn test_rational_to_f64() {
        assert_eq!(rational_to_f64("1/4"), Some(0.25));
        assert_eq!(rational_to_f64("3"), Some(3.0));
        assert_eq!(rational_to_f64("x/y"), None);
    }

    #[test]
    fn test_is_syntax_error() {
        let error = Term::compound(
            "error",
            vec![
                Term::compound("syntax_error", vec![Term::atom("incomplete_reduction")]),
                Term::var("_"),
            ],
        );
        assert!(is_syntax_error(&error));
        assert!(!is_syntax_error(&Term::atom("syntax_error")));
    }

    // ========================================================================
    // Engine
    // ========================================================================

    fn drain(cursor: &mut ScryerCursor) -> Vec<HashMap<String, Term>> {
        let mut solutions = Vec::new();
        while cursor.advance().unwrap() {
            let mut bindings = HashMap::new();
            cursor.read_bindings(&mut bindings).unwrap();
            solutions.push(bindings);
        }
        cursor.close();
        solutions
    }

    #[test]
    fn test_submit_binds_placeholders() {
        let engine = ScryerEngine::new();
        let mut cursor = engine
            .submit("X is ? * 2.", &[Term::Integer(21)])
            .unwrap();
        assert_eq!(cursor.goal(), "X is 21 * 2.");

        let solutions = drain(&mut cursor);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].get("X"), Some(&Term::Integer(42)));
    }

    #[test]
    fn test_consulted_program_is_replayed() {
        let engine = ScryerEngine::new();
        engine
            .consult("colour(red). colour(green). colour(blue).")
            .unwrap();
        assert_eq!(engine.source_count(), 1);

        for _ in 0..2 {
            let mut cursor = engine.submit("colour(C).", &[]).unwrap();
            let colours: Vec<Term> = drain(&mut cursor)
                .into_iter()
                .filter_map(|mut b| b.remove("C"))
                .collect();
            assert_eq!(
                colours,
                vec![Term::atom("red"), Term::atom("green"), Term::atom("blue")]
            );
        }
    }

    #[test]
    fn test_ground_goal_failure() {
        let engine = ScryerEngine::new();
        engine.consult("colour(red).").unwrap();
        let mut cursor = engine.submit("colour(?).", &[Term::atom("pink")]).unwrap();
        assert!(!cursor.advance().unwrap());
        cursor.close();
    }

    #[test]
    fn test_syntax_error_is_submission_error() {
        let engine = ScryerEngine::new();
        let err = engine.submit("foo(.", &[]).unwrap_err();
        assert!(matches!(err, PlError::Submission { .. }), "got {:?}", err);
    }

    #[test]
    fn test_placeholder_mismatch_is_submission_error() {
        let engine = ScryerEngine::new();
        let err = engine.submit("foo(?, ?).", &[Term::Integer(1)]).unwrap_err();
        assert!(matches!(err, PlError::Submission { .. }));
    }

    #[test]
    fn test_unknown_library_is_submission_error() {
        let config = PrologConfig::default().with_libraries(["no_such_library"]);
        let engine = ScryerEngine::with_config(&config).unwrap();
        let err = engine.submit("true.", &[]).unwrap_err();
        assert!(matches!(err, PlError::Submission { .. }), "got {:?}", err);
    }

    #[test]
    fn test_close_before_exhaustion() {
        let engine = ScryerEngine::new();
        let mut cursor = engine.submit("repeat.", &[]).unwrap();
        assert!(cursor.advance().unwrap());
        assert!(cursor.advance().unwrap());
        cursor.close();
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn test_consult_missing_file() {
        let engine = ScryerEngine::new();
        let err = engine
            .consult_file(Path::new("/nonexistent/program.pl"))
            .unwrap_err();
        assert!(matches!(err, PlError::Io(_)));
    }
}
