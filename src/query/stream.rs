//! Streamed solutions
//!
//! A producer thread owns the engine cursor for the lifetime of the stream.
//! It hands one fresh [`Bindings`] map at a time to the consumer over a
//! zero-capacity channel, so nothing is computed ahead of the consumer
//! beyond the solution being offered.
//!
//! The producer stops when the cursor is exhausted, after delivering a scan
//! error, or when the consumer cancels. It closes the cursor in every case.

use std::collections::HashMap;
use std::fmt;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, select, Receiver, Sender, TryRecvError};
use tracing::{debug, trace, warn};

use super::guarded;
use crate::engine::Cursor;
use crate::error::{PlError, PlResult};
use crate::marshal::{term_to_value, Value};

/// One solution: free variable name → value
pub type Bindings = HashMap<String, Value>;

/// Iterator over the solutions of a goal with free variables.
///
/// Yields `Ok` per solution in engine order. A failure to read a solution
/// is yielded once as `Err`, after which the iterator is finished.
///
/// Dropping the stream cancels the producer without waiting for it; use
/// [`Solutions::close`] to wait until the cursor has been closed.
pub struct Solutions {
    goal: String,
    variables: Vec<String>,
    receiver: Receiver<PlResult<Bindings>>,
    cancel: Option<Sender<()>>,
    producer: Option<JoinHandle<()>>,
    finished: bool,
}

impl Solutions {
    pub(crate) fn spawn<C>(cursor: C, goal: String, variables: Vec<String>) -> Self
    where
        C: Cursor + Send + 'static,
    {
        let (sender, receiver) = bounded(0);
        let (cancel, cancelled) = bounded(0);

        let producer = {
            let goal = goal.clone();
            let variables = variables.clone();
            thread::spawn(move || produce(cursor, &goal, &variables, sender, cancelled))
        };

        Self {
            goal,
            variables,
            receiver,
            cancel: Some(cancel),
            producer: Some(producer),
            finished: false,
        }
    }

    /// Goal text the stream answers
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Free variables present in every [`Bindings`]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Ask the producer to stop. Returns immediately; the producer closes
    /// the cursor once its current engine call returns.
    pub fn cancel(&mut self) {
        if self.cancel.take().is_some() {
            debug!(goal = %self.goal, "solution stream cancelled");
        }
        self.finished = true;
    }

    /// Cancel and wait until the producer has closed the cursor
    pub fn close(mut self) {
        self.cancel();
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                warn!(goal = %self.goal, "solution producer panicked");
            }
        }
    }
}

impl Iterator for Solutions {
    type Item = PlResult<Bindings>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.receiver.recv() {
            Ok(item) => {
                if item.is_err() {
                    self.finished = true;
                }
                Some(item)
            }
            Err(_) => {
                self.finished = true;
                None
            }
        }
    }
}

impl Drop for Solutions {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solutions")
            .field("goal", &self.goal)
            .field("variables", &self.variables)
            .field("finished", &self.finished)
            .finish()
    }
}

fn is_cancelled(cancelled: &Receiver<()>) -> bool {
    !matches!(cancelled.try_recv(), Err(TryRecvError::Empty))
}

/// Offer `item` to the consumer; `false` if the stream was cancelled or
/// dropped in the meantime
fn deliver(
    sender: &Sender<PlResult<Bindings>>,
    cancelled: &Receiver<()>,
    item: PlResult<Bindings>,
) -> bool {
    select! {
        send(sender, item) -> res => res.is_ok(),
        recv(cancelled) -> _ => false,
    }
}

fn produce<C: Cursor>(
    mut cursor: C,
    goal: &str,
    variables: &[String],
    sender: Sender<PlResult<Bindings>>,
    cancelled: Receiver<()>,
) {
    debug!(goal, "solution producer started");
    let mut delivered = 0usize;

    loop {
        if is_cancelled(&cancelled) {
            break;
        }

        match guarded(|| cursor.advance()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                deliver(&sender, &cancelled, Err(e));
                break;
            }
        }

        let item = guarded(|| scan(&mut cursor, variables));
        let failed = item.is_err();
        if !deliver(&sender, &cancelled, item) || failed {
            break;
        }
        delivered += 1;
        trace!(goal, delivered, "solution delivered");
    }

    if let Err(e) = guarded(|| {
        cursor.close();
        Ok(())
    }) {
        warn!(goal, error = %e, "failed to close cursor");
    }
    debug!(goal, delivered, "solution producer finished");
}

/// Read the current solution and convert each free variable
fn scan<C: Cursor>(cursor: &mut C, variables: &[String]) -> PlResult<Bindings> {
    let mut raw = HashMap::with_capacity(variables.len());
    cursor.read_bindings(&mut raw).map_err(into_scan)?;

    variables
        .iter()
        .map(|name| {
            let value = term_to_value(raw.get(name))
                .map_err(|e| PlError::Scan(format!("{}: {}", name, e)))?;
            Ok((name.clone(), value))
        })
        .collect()
}

fn into_scan(err: PlError) -> PlError {
    match err {
        PlError::Scan(_) | PlError::Fault(_) => err,
        other => PlError::Scan(other.to_string()),
    }
}
