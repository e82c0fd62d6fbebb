//! Predicate extraction from host configuration.
//!
//! Two independently-shaped configuration collections feed the tracker:
//! command definitions whose blocks may carry raw query expressions, and
//! view definitions whose property lists may carry a ready `:query`
//! predicate. Extraction normalizes both into one flat ordered predicate
//! sequence, source A first.

use crate::error::TrackerError;
use crate::query::{ExprResolver, Predicate, RawExpr};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A named command definition from configuration source A.
#[derive(Debug, Clone)]
pub struct CommandDef {
    pub name: String,
    pub blocks: Vec<BlockSpec>,
}

/// One block declaration inside a command definition.
///
/// Only blocks whose `kind` matches the configured query-block kind
/// contribute predicates; other kinds are passed over untouched.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub kind: String,
    /// Unevaluated query expression, present on query-engine blocks.
    pub query: Option<RawExpr>,
}

/// The query carried by a view definition.
pub enum ViewQuery {
    /// A ready predicate, extracted as-is.
    Static(Predicate),
    /// A query builder that needs host state at agenda-build time.
    /// Excluded from extraction: its predicate cannot be known here.
    Dynamic(Arc<dyn Fn() -> Predicate + Send + Sync>),
}

impl Clone for ViewQuery {
    fn clone(&self) -> Self {
        match self {
            ViewQuery::Static(p) => ViewQuery::Static(p.clone()),
            ViewQuery::Dynamic(f) => ViewQuery::Dynamic(Arc::clone(f)),
        }
    }
}

impl fmt::Debug for ViewQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewQuery::Static(p) => f.debug_tuple("Static").field(p).finish(),
            ViewQuery::Dynamic(_) => f.debug_tuple("Dynamic").field(&"<fn>").finish(),
        }
    }
}

/// A named view definition from configuration source B.
#[derive(Debug, Clone)]
pub struct ViewDef {
    pub name: String,
    pub query: Option<ViewQuery>,
    /// Remaining view properties, uninterpreted by the tracker.
    pub properties: HashMap<String, Value>,
}

impl ViewDef {
    pub fn new(name: impl Into<String>, query: Option<ViewQuery>) -> Self {
        ViewDef {
            name: name.into(),
            query,
            properties: HashMap::new(),
        }
    }
}

/// Read-only access to the host's current configuration collections.
///
/// Implementations snapshot whatever declaration mechanism the host uses;
/// the tracker re-reads on every extraction rather than caching.
pub trait ConfigSources: Send + Sync {
    fn commands(&self) -> Vec<CommandDef>;
    fn views(&self) -> Vec<ViewDef>;
}

/// Fixed configuration collections, for embedders without a dynamic
/// declaration mechanism and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSources {
    pub commands: Vec<CommandDef>,
    pub views: Vec<ViewDef>,
}

impl ConfigSources for StaticSources {
    fn commands(&self) -> Vec<CommandDef> {
        self.commands.clone()
    }

    fn views(&self) -> Vec<ViewDef> {
        self.views.clone()
    }
}

/// Extract the current predicate sequence from both configuration sources.
///
/// Source A: every block of every command whose kind equals
/// `query_block_kind` has its raw expression resolved through `resolver`
/// (fallible, possibly side-effecting). Source B: views with a static query
/// contribute it directly; views with a dynamic query builder are skipped.
///
/// Order is declaration order, A then B. Duplicates are kept. An empty
/// result is not an error.
pub fn extract_predicates(
    commands: &[CommandDef],
    views: &[ViewDef],
    query_block_kind: &str,
    resolver: &dyn ExprResolver,
) -> Result<Vec<Predicate>, TrackerError> {
    let mut predicates = Vec::new();

    for command in commands {
        for block in &command.blocks {
            if block.kind != query_block_kind {
                continue;
            }
            match &block.query {
                Some(raw) => predicates.push(resolver.resolve(raw)?),
                None => {
                    debug!(
                        command = %command.name,
                        "Query block without expression, skipping"
                    );
                }
            }
        }
    }

    for view in views {
        match &view.query {
            Some(ViewQuery::Static(predicate)) => predicates.push(predicate.clone()),
            Some(ViewQuery::Dynamic(_)) => {
                debug!(view = %view.name, "Dynamic view query excluded from extraction");
            }
            None => {}
        }
    }

    Ok(predicates)
}
