//! Example-driven search over operator scripts
//!
//! Breadth-first exploration of the groups reachable from a start group by
//! applying search moves: operators whose arguments can be derived without a
//! user. A group is a candidate when its query matches every positive
//! example and no negative one. Visited groups are deduplicated by
//! fingerprint. The start group is never modified.
//!
//! [`spawn`] runs the same search on a worker thread and hands back a
//! [`SearchHandle`] that can cancel it or wait with a timeout.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::Serialize;
use stencil_core_types::{NodeId, RequestId};

use crate::apply::{apply, OperatorRequest};
use crate::errors::{Result, StencilError};
use crate::model::SnippetGroup;
use crate::operators::{Catalog, OperatorId, Target};
use crate::query::{Example, QueryEngine};
use crate::{log_op_end, log_op_error, log_op_start};

/// Bounds of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Longest operator script tried
    pub max_depth: usize,
    /// Groups kept per breadth-first level
    pub max_frontier: usize,
    /// Stop after this many candidates; zero stops before evaluating anything
    pub max_candidates: usize,
    pub timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_frontier: 256,
            max_candidates: 1,
            timeout: None,
        }
    }
}

/// One step of an operator script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptStep {
    pub operator: OperatorId,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub group: Arc<SnippetGroup>,
    /// Steps leading from the start group to `group`
    pub script: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Every reachable group within the bounds was evaluated
    Exhausted,
    CandidateLimit,
    Cancelled,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub candidates: Vec<Candidate>,
    /// Number of groups evaluated against the examples
    pub explored: usize,
    pub stop: StopReason,
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Node {
    group: Arc<SnippetGroup>,
    script: Vec<ScriptStep>,
}

/// Search for groups separating `positives` from `negatives`
///
/// An empty candidate list is a normal outcome, not an error.
///
/// # Errors
///
/// The first error returned by the query engine, or a group that cannot be
/// fingerprinted, aborts the search.
pub fn search(
    group: &SnippetGroup,
    positives: &[Example],
    negatives: &[Example],
    engine: &dyn QueryEngine,
    catalog: &Catalog,
    config: &SearchConfig,
    cancel: &CancelToken,
) -> Result<SearchReport> {
    let op = "search.run";
    let started = Instant::now();
    log_op_start!(op, group = group.name(), max_depth = config.max_depth);

    let result = run(group, positives, negatives, engine, catalog, config, cancel, started);
    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => {
            log_op_end!(
                op,
                duration_ms = duration_ms,
                explored = report.explored,
                stop = ?report.stop
            );
        }
        Err(err) => {
            log_op_error!(op, err.clone(), duration_ms = duration_ms);
        }
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn run(
    group: &SnippetGroup,
    positives: &[Example],
    negatives: &[Example],
    engine: &dyn QueryEngine,
    catalog: &Catalog,
    config: &SearchConfig,
    cancel: &CancelToken,
    started: Instant,
) -> Result<SearchReport> {
    let deadline = config.timeout.map(|t| started + t);
    let mut visited: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    let mut explored = 0usize;
    if config.max_candidates == 0 {
        return Ok(report(candidates, explored, StopReason::CandidateLimit));
    }

    visited.insert(group.fingerprint()?);
    let mut level = vec![Node {
        group: Arc::new(group.clone()),
        script: Vec::new(),
    }];

    for depth in 0..=config.max_depth {
        for node in &level {
            if cancel.is_cancelled() {
                return Ok(report(candidates, explored, StopReason::Cancelled));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(report(candidates, explored, StopReason::TimedOut));
            }

            explored += 1;
            if is_candidate(&node.group, positives, negatives, engine)? {
                tracing::debug!(depth, script_len = node.script.len(), "candidate found");
                candidates.push(Candidate {
                    group: Arc::clone(&node.group),
                    script: node.script.clone(),
                });
                if candidates.len() >= config.max_candidates {
                    return Ok(report(candidates, explored, StopReason::CandidateLimit));
                }
            }
        }

        if depth == config.max_depth {
            break;
        }
        level = expand(&level, catalog, &mut visited, config.max_frontier)?;
        tracing::debug!(depth = depth + 1, frontier = level.len(), "search level expanded");
        if level.is_empty() {
            break;
        }
    }

    Ok(report(candidates, explored, StopReason::Exhausted))
}

fn report(candidates: Vec<Candidate>, explored: usize, stop: StopReason) -> SearchReport {
    SearchReport {
        candidates,
        explored,
        stop,
    }
}

fn is_candidate(
    group: &SnippetGroup,
    positives: &[Example],
    negatives: &[Example],
    engine: &dyn QueryEngine,
) -> Result<bool> {
    for example in positives {
        if !engine.evaluate(group, example)?.matches {
            return Ok(false);
        }
    }
    for example in negatives {
        if engine.evaluate(group, example)?.matches {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Every unseen group one search move away from `level`, capped at `max_frontier`
fn expand(level: &[Node], catalog: &Catalog, visited: &mut HashSet<String>, max_frontier: usize) -> Result<Vec<Node>> {
    let mut next = Vec::new();
    for parent in level {
        for snippet in parent.group.snippets() {
            for node in snippet.nodes() {
                for spec in catalog.search_moves() {
                    if !spec.is_applicable(snippet, node) {
                        continue;
                    }
                    let request = OperatorRequest::new(spec.id, Target::Node(node));
                    // Moves whose preconditions fail are simply not available.
                    let Ok(group) = apply((*parent.group).clone(), &request, catalog) else {
                        continue;
                    };
                    if !visited.insert(group.fingerprint()?) {
                        continue;
                    }
                    let mut script = parent.script.clone();
                    script.push(ScriptStep {
                        operator: spec.id,
                        node,
                    });
                    next.push(Node {
                        group: Arc::new(group),
                        script,
                    });
                    if next.len() >= max_frontier {
                        return Ok(next);
                    }
                }
            }
        }
    }
    Ok(next)
}

/// A search running on a worker thread
pub struct SearchHandle {
    request_id: RequestId,
    cancel: CancelToken,
    receiver: Receiver<Result<SearchReport>>,
    worker: Option<JoinHandle<()>>,
}

/// Start [`search`] on a worker thread
pub fn spawn(
    group: Arc<SnippetGroup>,
    positives: Vec<Example>,
    negatives: Vec<Example>,
    engine: Arc<dyn QueryEngine>,
    catalog: Arc<Catalog>,
    config: SearchConfig,
) -> SearchHandle {
    let request_id = RequestId::new();
    let cancel = CancelToken::new();
    let (sender, receiver) = bounded(1);
    let token = cancel.clone();
    let span = tracing::info_span!("search.worker", request_id = %request_id);
    let worker = std::thread::spawn(move || {
        let _entered = span.enter();
        let result = search(&group, &positives, &negatives, &*engine, &catalog, &config, &token);
        // The handle may already be gone; nobody is left to tell.
        sender.send(result).ok();
    });
    SearchHandle {
        request_id,
        cancel,
        receiver,
        worker: Some(worker),
    }
}

impl SearchHandle {
    /// Correlates the worker's log events
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Ask the worker to stop at the next candidate boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Block until the worker reports
    ///
    /// # Errors
    ///
    /// The search's own error, `SearchCancelled` if the worker ended without
    /// a report after cancellation, `Internal` if it ended without one
    /// otherwise.
    pub fn wait(mut self) -> Result<SearchReport> {
        let received = self.receiver.recv();
        self.join();
        match received {
            Ok(result) => result,
            Err(_) if self.cancel.is_cancelled() => Err(StencilError::SearchCancelled),
            Err(_) => Err(StencilError::Internal {
                message: "search worker ended without a report".to_string(),
            }),
        }
    }

    /// Wait up to `timeout`, then cancel and collect the partial report
    ///
    /// # Errors
    ///
    /// As for [`Self::wait`].
    pub fn wait_timeout(self, timeout: Duration) -> Result<SearchReport> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => {
                let mut this = self;
                this.join();
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                self.cancel();
                self.wait()
            }
            Err(RecvTimeoutError::Disconnected) => self.wait(),
        }
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("search worker panicked");
            }
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        // Dropping the handle abandons the search.
        self.cancel.cancel();
    }
}
