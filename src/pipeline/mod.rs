//! Selection and mutation over object collections
//!
//! Two primitive abstractions drive every pipeline:
//!
//! - a [`Selector`] decides whether an object is kept;
//! - a [`Mutator`] turns an object into a new object.
//!
//! Plain closures implement both traits, and the [`combinators`] module
//! composes them into nested decision trees. A [`Pipeline`] applies an
//! ordered list of selectors (all must pass) and then an ordered list of
//! mutators (each sees the previous one's output) to a whole collection.
//!
//! Errors raised while processing an object are wrapped with that object's
//! identity exactly once; see [`Error::for_object`].

use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::object::Object;

pub mod combinators;

pub use combinators::{and, chain, if_then, not, or, switch, Case};

/// Keep/discard decision for one object
pub trait Selector: Send + Sync {
    fn select(&self, ctx: &Context, obj: &Object) -> Result<bool>;
}

impl<F> Selector for F
where
    F: Fn(&Context, &Object) -> Result<bool> + Send + Sync,
{
    fn select(&self, ctx: &Context, obj: &Object) -> Result<bool> {
        self(ctx, obj)
    }
}

/// Value-producing transformation of one object
pub trait Mutator: Send + Sync {
    fn mutate(&self, ctx: &Context, obj: Object) -> Result<Object>;
}

impl<F> Mutator for F
where
    F: Fn(&Context, Object) -> Result<Object> + Send + Sync,
{
    fn mutate(&self, ctx: &Context, obj: Object) -> Result<Object> {
        self(ctx, obj)
    }
}

/// Shared handle to a selector
pub type SelectorRef = Arc<dyn Selector>;

/// Shared handle to a mutator
pub type MutatorRef = Arc<dyn Mutator>;

/// Box a closure as a shared selector
pub fn selector<F>(f: F) -> SelectorRef
where
    F: Fn(&Context, &Object) -> Result<bool> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as a shared mutator
pub fn mutator<F>(f: F) -> MutatorRef
where
    F: Fn(&Context, Object) -> Result<Object> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Keep only the objects that pass every selector.
///
/// An empty selector list returns `objects` untouched. The first failing
/// selector aborts the whole call; its error carries the object identity.
pub fn apply_filters(
    ctx: &Context,
    objects: Vec<Object>,
    selectors: &[SelectorRef],
) -> Result<Vec<Object>> {
    if selectors.is_empty() {
        return Ok(objects);
    }

    let mut kept = Vec::with_capacity(objects.len());
    'objects: for obj in objects {
        ctx.check()?;
        for selector in selectors {
            let keep = selector
                .select(ctx, &obj)
                .map_err(|e| Error::for_object(&obj, e))?;
            if !keep {
                continue 'objects;
            }
        }
        kept.push(obj);
    }
    Ok(kept)
}

/// Feed every object through every mutator in order.
///
/// An empty mutator list returns `objects` untouched.
pub fn apply_transformers(
    ctx: &Context,
    objects: Vec<Object>,
    mutators: &[MutatorRef],
) -> Result<Vec<Object>> {
    if mutators.is_empty() {
        return Ok(objects);
    }

    let mut transformed = Vec::with_capacity(objects.len());
    for obj in objects {
        ctx.check()?;
        let mut current = obj;
        for mutator in mutators {
            // Keep a copy for error context; the mutator consumes `current`.
            let identity = identity_of(&current);
            current = mutator
                .mutate(ctx, current)
                .map_err(|e| Error::for_object(&identity, e))?;
        }
        transformed.push(current);
    }
    Ok(transformed)
}

/// Filter, then transform
pub fn apply(
    ctx: &Context,
    objects: Vec<Object>,
    selectors: &[SelectorRef],
    mutators: &[MutatorRef],
) -> Result<Vec<Object>> {
    let filtered = apply_filters(ctx, objects, selectors)?;
    apply_transformers(ctx, filtered, mutators)
}

/// Copy of just the identity fields of `obj`
fn identity_of(obj: &Object) -> Object {
    let mut identity = Object::new();
    if let Some(kind) = obj.as_map().get("kind") {
        identity.as_map_mut().insert("kind".to_string(), kind.clone());
    }
    if let Some(name) = obj.get_path(&["metadata", "name"]) {
        identity.set_path(&["metadata", "name"], name.clone());
    }
    if let Some(ns) = obj.get_path(&["metadata", "namespace"]) {
        identity.set_path(&["metadata", "namespace"], ns.clone());
    }
    identity
}

/// Ordered selectors and mutators applied as one unit
#[derive(Clone, Default)]
pub struct Pipeline {
    selectors: Vec<SelectorRef>,
    mutators: Vec<MutatorRef>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("selectors", &self.selectors.len())
            .field("mutators", &self.mutators.len())
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a selector
    pub fn selector(mut self, selector: SelectorRef) -> Self {
        self.selectors.push(selector);
        self
    }

    /// Append a mutator
    pub fn mutator(mut self, mutator: MutatorRef) -> Self {
        self.mutators.push(mutator);
        self
    }

    pub fn selectors(&self) -> &[SelectorRef] {
        &self.selectors
    }

    pub fn mutators(&self) -> &[MutatorRef] {
        &self.mutators
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty() && self.mutators.is_empty()
    }

    /// A new pipeline with `other`'s stages appended after this one's
    pub fn extended(&self, other: &Pipeline) -> Pipeline {
        Pipeline {
            selectors: self
                .selectors
                .iter()
                .chain(other.selectors.iter())
                .cloned()
                .collect(),
            mutators: self
                .mutators
                .iter()
                .chain(other.mutators.iter())
                .cloned()
                .collect(),
        }
    }

    /// Run the selectors, then the mutators, over `objects`
    pub fn apply(&self, ctx: &Context, objects: Vec<Object>) -> Result<Vec<Object>> {
        apply(ctx, objects, &self.selectors, &self.mutators)
    }
}
