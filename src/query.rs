//! Predicates and OR-fold evaluation.
//!
//! A predicate is an opaque query expression owned by an external engine;
//! this crate never parses document structure itself. Evaluation over a
//! predicate sequence is a left-to-right logical OR that stops at the first
//! match.

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An opaque, engine-specific query expression.
///
/// Immutable once extracted. Duplicates across configuration sources are
/// kept as-is; the sequence is never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate(String);

impl Predicate {
    pub fn new(expr: impl Into<String>) -> Self {
        Predicate(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An unevaluated query expression from configuration source A.
///
/// Turning one of these into a [`Predicate`] may execute arbitrary
/// host-side code; see [`ExprResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExpr(String);

impl RawExpr {
    pub fn new(expr: impl Into<String>) -> Self {
        RawExpr(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The document under evaluation: a live buffer or a plain file path.
///
/// The evaluator is agnostic and passes whichever is given through to the
/// query engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    /// An in-memory document, optionally backed by a file.
    Buffer {
        file: Option<PathBuf>,
        content: String,
    },
    /// A document identified only by its path on disk.
    File(PathBuf),
}

impl DocumentRef {
    /// The backing file path, when one is known.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            DocumentRef::Buffer { file, .. } => file.as_deref(),
            DocumentRef::File(path) => Some(path),
        }
    }
}

/// External query capability: does predicate `P` match document `D`?
///
/// Failures are not locally recovered; they propagate to whatever triggered
/// the evaluation (typically the host's save operation).
pub trait QueryEngine: Send + Sync {
    fn evaluate(&self, predicate: &Predicate, doc: &DocumentRef) -> Result<bool, TrackerError>;
}

/// Second phase of predicate extraction: turn a raw configuration
/// expression into a ready predicate.
///
/// Resolution is explicitly fallible and may have side effects, since the
/// expression can reference evaluation-time host state.
pub trait ExprResolver: Send + Sync {
    fn resolve(&self, raw: &RawExpr) -> Result<Predicate, TrackerError>;
}

/// Evaluate a document against a predicate sequence with OR semantics.
///
/// Folds left-to-right and short-circuits on the first match. An empty
/// sequence yields `false` (the identity of OR), so with no configured
/// predicates nothing is ever tracked.
pub fn matches_any(
    engine: &dyn QueryEngine,
    doc: &DocumentRef,
    predicates: &[Predicate],
) -> Result<bool, TrackerError> {
    for predicate in predicates {
        if engine.evaluate(predicate, doc)? {
            return Ok(true);
        }
    }
    Ok(false)
}
