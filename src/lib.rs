// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # crmap: A Client-Side Projection of Server-Hosted Replicated Maps
//!
//! This crate provides the client half of a server-hosted convergent
//! replicated map: a local tree of typed values (counters, flags, registers,
//! sets, and nested maps) that can be read and mutated through ordinary
//! container access. The tree never merges state itself. Every mutation is
//! translated into an [`Operation`], an immutable description of the
//! requested change, and routed upward through the chain of enclosing maps
//! to a root [`Document`], the only component that talks to the database.
//!
//! ## Core Concepts
//!
//! - [`TypedCollection`]: a homogeneous named container holding the children
//!   of one [`ValueKind`] inside a map. All access goes through collections:
//!   lookups wrap stored data into typed values, and mutations build
//!   operations and forward them to the collection's parent.
//! - [`InnerValue`]: the closed set of value variants a map can hold. A
//!   nested [`InnerMap`] owns one collection per possible child kind, which
//!   is how trees of arbitrary depth are formed.
//! - [`Operation`]: what actually travels to the server. Operations are
//!   single-use and addressed by name within their nearest enclosing map;
//!   each enclosing level wraps the operation in a map update stamped with
//!   that level's key, so the root receives one fully addressed description
//!   per mutation.
//! - [`Document`]: the external collaborator at the top of the chain. It
//!   executes operations against the server and knows whether the causal
//!   context needed for safe removals has been fetched. This crate ships no
//!   transport; any network client (or a test double) can implement it.
//!
//! ## Optimistic Local State
//!
//! A successful mutation updates the local tree immediately so reads reflect
//! the write without a refetch. The update happens strictly *after* the root
//! reports success: if the document returns an error, it propagates to the
//! caller unchanged and the collection keeps its pre-call contents. There is
//! no rollback machinery because nothing is touched until the upstream call
//! has already succeeded.
//!
//! ## Staleness and Reparenting
//!
//! When a document is refreshed, its tree is rebuilt by
//! [`reparent`](TypedCollection::reparent)ing each collection onto the new
//! parent. Carried-over values keep the identity tag of the collection that
//! originally wrapped them; a lookup only returns a stored value whose tag
//! matches the live collection. Anything else is treated as absent and
//! yields a *transient* placeholder: a value that exists purely so the
//! caller can immediately issue a correctly routed mutation, and that is
//! never inserted into the collection.
//!
//! ## Causal Context
//!
//! Removing an element from a replicated add/remove set is only safe once
//! the server-supplied causal context has been observed; without it,
//! concurrently added copies of the element can survive or resurrect.
//! Set-element removals therefore consult [`Document::has_context`] and fail
//! with [`Error::MissingContext`] before any network call is attempted.
//!
//! ## Getting Started
//!
//! ```rust
//! use crmap::{Document, DocumentError, InnerMap, Operation};
//!
//! // A root document that accepts every operation. A real implementation
//! // would serialize the operation and perform the network round trip.
//! struct Accepting;
//!
//! impl Document for Accepting {
//!     fn operate(&self, _op: Operation) -> Result<(), DocumentError> {
//!         Ok(())
//!     }
//!
//!     fn has_context(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let doc = Accepting;
//! let mut root = InnerMap::root(&doc);
//!
//! root.counters_mut().increment("visits", 3)?;
//! root.registers_mut().set("greeting", "hello")?;
//! root.sets_mut().add("tags", "replicated")?;
//!
//! assert!(root.counters().contains("visits"));
//! assert_eq!(
//!     root.counters().get("visits").unwrap().as_counter().unwrap().value(),
//!     3,
//! );
//! # Ok::<(), crmap::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! Collections hold no synchronization primitives. Mutation follows Rust's
//! `&mut` discipline, and `Document::operate` takes `&self` so implementors
//! decide how network access is shared. Operation stamping within one call
//! chain is strictly sequential; no ordering is guaranteed between separate
//! top-level calls.
//!
//! ## Features
//!
//! - `json`: conversions between map data / operations and
//!   `serde_json::Value` in the server's wire shape, plus the [`mapred`]
//!   job builder. Enabled by default.
//! - `serde`: `serde` support for operations, kinds, and plain data views.
//! - `arbitrary`: `quickcheck::Arbitrary` impls for property-based testing.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use std::sync::atomic::{AtomicU64, Ordering};

pub mod collection;
pub use collection::{Error, Lookup, Seed, TypedCollection};
pub mod document;
pub use document::{Document, DocumentError, Parent};
pub mod ops;
pub use ops::{Action, Operation, Payload};
pub mod snapshot;
pub use snapshot::{MapData, PlainValue};
pub mod values;
pub use values::{
    Blob, InnerCounter, InnerFlag, InnerMap, InnerRegister, InnerSet, InnerValue, UpdateValue,
    ValueKind,
};
#[cfg(feature = "json")]
pub mod json;
#[cfg(feature = "json")]
pub mod mapred;
/// Macros usable for tests and initialization
pub mod macros;
#[cfg(any(test, feature = "arbitrary"))]
mod test_util;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Identity tag of the collection that wrapped a value.
///
/// Minted once per collection construction, process-unique. A stored value
/// is current only while its tag matches its collection's; after a
/// [`reparent`](TypedCollection::reparent) the carried-over tags no longer
/// match, which is how stale values are detected lazily at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Generation {
    pub(crate) fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }
}
