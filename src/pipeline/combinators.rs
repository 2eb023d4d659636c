//! Combinators over selectors and mutators
//!
//! Every combinator is itself a [`Selector`] or [`Mutator`], so they nest
//! freely. Evaluation order is left to right and part of the contract:
//! `and` stops at the first `false`, `or` at the first `true`, both stop at
//! the first error. Errors pass through unchanged; object context is added
//! by the pipeline, not here.
//!
//! ```
//! use manifest_engine::context::Context;
//! use manifest_engine::object::Object;
//! use manifest_engine::pipeline::{and, mutator, not, or, selector, switch, Case};
//! use manifest_engine::pipeline::{Mutator, Selector};
//! use serde_json::json;
//!
//! let is_service = selector(|_, o: &Object| Ok(o.kind() == "Service"));
//! let is_config = selector(|_, o: &Object| Ok(o.kind() == "ConfigMap"));
//! let unnamed = selector(|_, o: &Object| Ok(o.name().is_empty()));
//! let keep = and(vec![or(vec![is_service.clone(), is_config]), not(unnamed)]);
//!
//! let label = switch(
//!     vec![Case::new(is_service, mutator(|_, mut o: Object| {
//!         o.set_path(&["metadata", "labels", "tier"], json!("network"));
//!         Ok(o)
//!     }))],
//!     None,
//! );
//!
//! let ctx = Context::new();
//! let svc = Object::from_value(json!({"kind": "Service", "metadata": {"name": "web"}})).unwrap();
//! assert!(keep.select(&ctx, &svc).unwrap());
//! let labelled = label.mutate(&ctx, svc).unwrap();
//! assert_eq!(labelled.get_path(&["metadata", "labels", "tier"]), Some(&json!("network")));
//! ```

use std::sync::Arc;

use super::{Mutator, MutatorRef, Selector, SelectorRef};
use crate::context::Context;
use crate::error::Result;
use crate::object::Object;

/// Logical AND with short-circuit; empty means `true`
pub struct And(Vec<SelectorRef>);

impl Selector for And {
    fn select(&self, ctx: &Context, obj: &Object) -> Result<bool> {
        for selector in &self.0 {
            if !selector.select(ctx, obj)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Logical OR with short-circuit; empty means `true` (no restriction)
pub struct Or(Vec<SelectorRef>);

impl Selector for Or {
    fn select(&self, ctx: &Context, obj: &Object) -> Result<bool> {
        if self.0.is_empty() {
            return Ok(true);
        }
        for selector in &self.0 {
            if selector.select(ctx, obj)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Inverts a selector's decision
pub struct Not(SelectorRef);

impl Selector for Not {
    fn select(&self, ctx: &Context, obj: &Object) -> Result<bool> {
        Ok(!self.0.select(ctx, obj)?)
    }
}

/// Applies `then` only to objects matching `condition`
pub struct IfThen {
    condition: SelectorRef,
    then: MutatorRef,
}

impl Mutator for IfThen {
    fn mutate(&self, ctx: &Context, obj: Object) -> Result<Object> {
        if self.condition.select(ctx, &obj)? {
            self.then.mutate(ctx, obj)
        } else {
            Ok(obj)
        }
    }
}

/// One branch of a [`Switch`]
#[derive(Clone)]
pub struct Case {
    pub when: SelectorRef,
    pub then: MutatorRef,
}

impl Case {
    pub fn new(when: SelectorRef, then: MutatorRef) -> Self {
        Self { when, then }
    }
}

/// First matching case wins; falls back to `default`, else identity
pub struct Switch {
    cases: Vec<Case>,
    default: Option<MutatorRef>,
}

impl Mutator for Switch {
    fn mutate(&self, ctx: &Context, obj: Object) -> Result<Object> {
        for case in &self.cases {
            if case.when.select(ctx, &obj)? {
                return case.then.mutate(ctx, obj);
            }
        }
        match &self.default {
            Some(default) => default.mutate(ctx, obj),
            None => Ok(obj),
        }
    }
}

/// Sequential composition; an error anywhere aborts with no partial result
pub struct Chain(Vec<MutatorRef>);

impl Mutator for Chain {
    fn mutate(&self, ctx: &Context, obj: Object) -> Result<Object> {
        self.0
            .iter()
            .try_fold(obj, |current, mutator| mutator.mutate(ctx, current))
    }
}

/// True iff every selector is true
pub fn and(selectors: Vec<SelectorRef>) -> SelectorRef {
    Arc::new(And(selectors))
}

/// True iff any selector is true, or the list is empty
pub fn or(selectors: Vec<SelectorRef>) -> SelectorRef {
    Arc::new(Or(selectors))
}

/// Negation of `selector`
pub fn not(selector: SelectorRef) -> SelectorRef {
    Arc::new(Not(selector))
}

/// Apply `then` when `condition` holds, otherwise pass the object through
pub fn if_then(condition: SelectorRef, then: MutatorRef) -> MutatorRef {
    Arc::new(IfThen { condition, then })
}

/// Apply the first matching case's mutator, else `default`, else identity
pub fn switch(cases: Vec<Case>, default: Option<MutatorRef>) -> MutatorRef {
    Arc::new(Switch { cases, default })
}

/// Apply `mutators` in order, each receiving the previous output
pub fn chain(mutators: Vec<MutatorRef>) -> MutatorRef {
    Arc::new(Chain(mutators))
}
