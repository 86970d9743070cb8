// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Operation descriptions routed from collections to the root document.
//!
//! An [`Operation`] is an immutable value describing exactly one requested
//! mutation: which [`ValueKind`] produced it, the key it targets within its
//! nearest enclosing map, and an update or remove action. Operations are
//! constructed fresh per call and handed upward; the only mutation they
//! undergo after construction is name assignment by the collection that
//! forwards them (see [`Operation::named`]).
//!
//! Nesting is represented structurally: a mutation inside a nested map is
//! wrapped in one [`Payload::Entry`] update per enclosing level, each
//! wrapper stamped with that level's key. The innermost operation keeps the
//! innermost key, and the root document receives a single fully addressed
//! description.
use crate::values::{Blob, ValueKind};
use std::fmt;

/// A description of one requested mutation, destined for execution at the
/// root [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Operation {
    name: Option<String>,
    kind: ValueKind,
    action: Action,
}

/// What an [`Operation`] does to its target entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Action {
    /// Apply the payload to the entry, creating it if necessary.
    Update(Payload),
    /// Remove the entry from its enclosing map.
    Remove,
}

/// The per-kind update payload of an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Payload {
    /// Adjust a counter by a signed amount.
    Increment(i64),
    /// Set a flag.
    Flag(bool),
    /// Overwrite a register.
    Assign(Blob),
    /// Add and/or remove set members.
    Members { add: Vec<Blob>, remove: Vec<Blob> },
    /// Apply an operation to an entry of a nested map.
    Entry(Box<Operation>),
}

impl Operation {
    fn update(kind: ValueKind, payload: Payload) -> Self {
        Self {
            name: None,
            kind,
            action: Action::Update(payload),
        }
    }

    /// An operation adjusting a counter by `amount` (which may be negative).
    pub fn increment(amount: i64) -> Self {
        Self::update(ValueKind::Counter, Payload::Increment(amount))
    }

    /// An operation setting a flag.
    pub fn flag(enabled: bool) -> Self {
        Self::update(ValueKind::Flag, Payload::Flag(enabled))
    }

    /// An operation overwriting a register.
    pub fn assign(value: impl Into<Blob>) -> Self {
        Self::update(ValueKind::Register, Payload::Assign(value.into()))
    }

    /// An operation adding one element to a set.
    pub fn add(element: impl Into<Blob>) -> Self {
        Self::update(
            ValueKind::Set,
            Payload::Members {
                add: vec![element.into()],
                remove: Vec::new(),
            },
        )
    }

    /// An operation removing one element from a set.
    ///
    /// Removals are only safe to send once the document holds causal
    /// context; the owning collection checks this before forwarding.
    pub fn remove(element: impl Into<Blob>) -> Self {
        Self::update(
            ValueKind::Set,
            Payload::Members {
                add: Vec::new(),
                remove: vec![element.into()],
            },
        )
    }

    /// Wraps `inner` as an update of the map entry at `key`.
    ///
    /// This is the routing step applied once per enclosing map level: the
    /// wrapper carries this level's key while `inner` keeps its own.
    pub fn in_map(key: impl fmt::Display, inner: Operation) -> Self {
        Self {
            name: Some(key.to_string()),
            kind: ValueKind::Map,
            action: Action::Update(Payload::Entry(Box::new(inner))),
        }
    }

    /// An operation deleting the entry of the given kind.
    pub fn delete(kind: ValueKind) -> Self {
        Self {
            name: None,
            kind,
            action: Action::Remove,
        }
    }

    /// Stamps the operation with the key it targets.
    pub fn named(mut self, name: impl fmt::Display) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// The target key within the nearest enclosing map, once stamped.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The value kind this operation addresses.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_tag_their_kind() {
        assert_eq!(Operation::increment(1).kind(), ValueKind::Counter);
        assert_eq!(Operation::flag(true).kind(), ValueKind::Flag);
        assert_eq!(Operation::assign("x").kind(), ValueKind::Register);
        assert_eq!(Operation::add("x").kind(), ValueKind::Set);
        assert_eq!(Operation::remove("x").kind(), ValueKind::Set);
        assert_eq!(Operation::delete(ValueKind::Flag).kind(), ValueKind::Flag);
        assert_eq!(
            Operation::in_map("k", Operation::increment(1)).kind(),
            ValueKind::Map,
        );
    }

    #[test]
    fn named_stamps_and_restamps() {
        let op = Operation::increment(5);
        assert_eq!(op.name(), None);
        let op = op.named("visits");
        assert_eq!(op.name(), Some("visits"));
        // keys are normalized to strings, so any displayable key works
        let op = op.named(42);
        assert_eq!(op.name(), Some("42"));
    }

    #[test]
    fn in_map_preserves_the_inner_key() {
        let inner = Operation::increment(1).named("c");
        let wrapped = Operation::in_map("m", inner.clone());
        assert_eq!(wrapped.name(), Some("m"));
        match wrapped.action() {
            Action::Update(Payload::Entry(boxed)) => assert_eq!(**boxed, inner),
            other => panic!("expected a map entry payload, got {other:?}"),
        }
    }

    #[test]
    fn membership_payloads_are_one_sided() {
        match Operation::add("el").action() {
            Action::Update(Payload::Members { add, remove }) => {
                assert_eq!(add.len(), 1);
                assert!(remove.is_empty());
            }
            other => panic!("unexpected action {other:?}"),
        }
        match Operation::remove("el").action() {
            Action::Update(Payload::Members { add, remove }) => {
                assert!(add.is_empty());
                assert_eq!(remove.len(), 1);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
