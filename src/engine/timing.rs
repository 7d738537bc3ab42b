//! Per-stage wall-clock timing.
//!
//! Stages keep the order the flow ran them in. A stage can hold one level of
//! named sub-stages.

use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

/// A stage with nested sub-stages: its own wall-clock time plus each sub-stage in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageGroup {
    pub elapsed: f64,
    pub stages: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageEntry {
    Leaf(f64),
    Group(StageGroup),
}

impl StageEntry {
    /// Wall-clock seconds spent in the stage, sub-stages included.
    pub fn elapsed(&self) -> f64 {
        match self {
            StageEntry::Leaf(s) => *s,
            StageEntry::Group(g) => g.elapsed,
        }
    }
}

/// Ordered record of where a run spent its time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTimings {
    entries: IndexMap<String, StageEntry>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` as the named stage.
    ///
    /// The stage is recorded when `f` returns, whether it returned an error or
    /// unwound, and `f`'s result is handed back untouched.
    pub fn timed<T>(&mut self, stage: &str, f: impl FnOnce() -> T) -> T {
        let mut guard = StageGuard::open(&mut self.entries, stage, false);
        let out = f();
        guard.close();
        out
    }

    /// Run `f` as the named stage, letting it record sub-stages inside it.
    pub fn group<T>(&mut self, stage: &str, f: impl FnOnce(&mut SubStages) -> T) -> T {
        let mut guard = StageGuard::open(&mut self.entries, stage, true);
        let out = match guard.subs.as_mut() {
            Some(subs) => f(subs),
            None => f(&mut SubStages::default()),
        };
        guard.close();
        out
    }

    pub fn get(&self, stage: &str) -> Option<&StageEntry> {
        self.entries.get(stage)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sum of top-level stage times.
    pub fn total(&self) -> f64 {
        self.entries.values().map(StageEntry::elapsed).sum()
    }
}

/// Sub-stages of an open stage.
#[derive(Debug, Default)]
pub struct SubStages {
    entries: IndexMap<String, f64>,
}

impl SubStages {
    pub fn timed<T>(&mut self, stage: &str, f: impl FnOnce() -> T) -> T {
        let _guard = SubStageGuard {
            sink: &mut self.entries,
            name: stage,
            start: Instant::now(),
            _span: info_span!("stage", name = stage).entered(),
        };
        f()
    }
}

/// Records a sub-stage on drop, so a panicking step still gets an entry.
struct SubStageGuard<'a> {
    sink: &'a mut IndexMap<String, f64>,
    name: &'a str,
    start: Instant,
    _span: tracing::span::EnteredSpan,
}

impl Drop for SubStageGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        debug!(stage = self.name, elapsed, "sub-stage finished");
        self.sink.insert(self.name.to_string(), elapsed);
    }
}

/// Records the stage on drop so unwinding still leaves an entry behind.
struct StageGuard<'a> {
    sink: &'a mut IndexMap<String, StageEntry>,
    name: String,
    start: Instant,
    subs: Option<SubStages>,
    closed: bool,
    _span: tracing::span::EnteredSpan,
}

impl<'a> StageGuard<'a> {
    fn open(sink: &'a mut IndexMap<String, StageEntry>, name: &str, grouped: bool) -> Self {
        StageGuard {
            sink,
            name: name.to_string(),
            start: Instant::now(),
            subs: grouped.then(SubStages::default),
            closed: false,
            _span: info_span!("stage", name).entered(),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let elapsed = self.start.elapsed().as_secs_f64();
        debug!(stage = %self.name, elapsed, "stage finished");
        let entry = match self.subs.take() {
            Some(subs) => StageEntry::Group(StageGroup {
                elapsed,
                stages: subs.entries,
            }),
            None => StageEntry::Leaf(elapsed),
        };
        self.sink.insert(self.name.clone(), entry);
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
