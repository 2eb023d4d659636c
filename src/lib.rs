//! # Manifest Engine Library
//!
//! Aggregates declarative manifest objects from many producers, filters and
//! transforms them through composable pipelines, and hands back one ordered
//! collection. It is used by the `manifest-engine` command-line tool but is
//! meant to be embedded by any application that assembles manifests.
//!
//! ## Quick Example
//!
//! ```
//! use manifest_engine::context::Context;
//! use manifest_engine::engine::{Engine, RenderOptions};
//! use manifest_engine::object::Object;
//! use manifest_engine::pipeline::selector;
//! use manifest_engine::source::ObjectSource;
//! use serde_json::json;
//!
//! let web = json!({"kind": "Deployment", "metadata": {"name": "web"}});
//! let db = json!({"kind": "StatefulSet", "metadata": {"name": "db"}});
//! let objects = vec![Object::from_value(web).unwrap(), Object::from_value(db).unwrap()];
//!
//! let engine = Engine::builder()
//!     .source(ObjectSource::new("static", objects).unwrap())
//!     .selector(selector(|_, o: &Object| Ok(o.kind() == "Deployment")))
//!     .build()
//!     .unwrap();
//!
//! let objects = engine.render(&Context::new(), &RenderOptions::new()).unwrap();
//! assert_eq!(objects.len(), 1);
//! assert_eq!(objects[0].name(), "web");
//! ```
//!
//! ## Core Concepts
//!
//! - **Objects (`object`)**: An untyped mapping tree with the conventional
//!   `kind` and `metadata.name`/`metadata.namespace` identity fields.
//! - **Merging (`merge`)**: Deterministic structural merge of value trees,
//!   used to layer override values onto defaults.
//! - **Caching (`cache`)**: A TTL cache whose reads and writes are private
//!   copies, so callers can never mutate what is cached.
//! - **Filesystems (`filesystem`)**: A filesystem abstraction with in-memory,
//!   OS-backed and layered (in-memory overlay over a read-only delegate)
//!   implementations.
//! - **Pipelines (`pipeline`)**: Selectors and mutators, plus the `and`,
//!   `or`, `not`, `if_then`, `switch` and `chain` combinators.
//! - **Sources (`source`)**: Named producers of objects: fixed lists, static
//!   files, render engines and directory-build engines.
//! - **Engine (`engine`)**: Runs Sources sequentially or concurrently and
//!   applies the combined pipeline.
//!
//! ## Execution Flow
//!
//! 1. Every configured Source runs with the call's override values.
//! 2. Outputs are concatenated in configured Source order.
//! 3. Selectors filter the combined collection.
//! 4. Mutators transform the survivors, in order.

pub mod cache;
pub mod codec;
pub mod context;
pub mod engine;
pub mod error;
pub mod filesystem;
pub mod merge;
pub mod object;
pub mod pipeline;
pub mod source;

#[cfg(test)]
mod merge_proptest;
