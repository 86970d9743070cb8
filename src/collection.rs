// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The typed collection core: named containers of one value kind that
//! translate container access into routed operations.
use crate::{
    Generation,
    document::{Document, DocumentError, Parent},
    ops::Operation,
    snapshot::PlainValue,
    values::{Blob, InnerSet, InnerValue, UpdateValue, ValueKind},
};
use ahash::RandomState;
use std::{
    collections::{BTreeMap, HashMap},
    error, fmt,
    ops::Deref,
};

/// A collection of elements of a single kind inside a map.
///
/// Keys are normalized to strings (any [`fmt::Display`] key is accepted),
/// and every entry's variant equals the collection's kind. The collection
/// holds no network state of its own: mutations build an
/// [`Operation`], forward it through the parent handle, and only update the
/// local contents once the root has reported success. An upstream failure
/// therefore always leaves the pre-call contents intact; retrying the same
/// call is safe with respect to local consistency.
pub struct TypedCollection<D> {
    kind: ValueKind,
    parent: Parent<D>,
    generation: Generation,
    contents: HashMap<String, InnerValue<D>, RandomState>,
}

impl<D: Clone> Clone for TypedCollection<D> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            parent: self.parent.clone(),
            generation: self.generation,
            contents: self.contents.clone(),
        }
    }
}

impl<D> fmt::Debug for TypedCollection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCollection")
            .field("contains", &self.kind)
            .field("contents", &self.contents)
            .finish_non_exhaustive()
    }
}

/// Seed material for constructing a collection.
#[derive(Debug, Clone)]
pub enum Seed<D> {
    /// A value constructed by a prior fetch or an earlier tree snapshot.
    /// Kept as-is when the collection's kind is already-wrapped, re-wrapped
    /// from its payload otherwise.
    Value(InnerValue<D>),
    /// Raw payload to wrap as the collection's kind.
    Plain(PlainValue),
}

impl<D> From<InnerValue<D>> for Seed<D> {
    fn from(value: InnerValue<D>) -> Self {
        Self::Value(value)
    }
}

impl<D> From<PlainValue> for Seed<D> {
    fn from(value: PlainValue) -> Self {
        Self::Plain(value)
    }
}

/// The result of a successful [`TypedCollection::get`].
pub enum Lookup<'a, D> {
    /// The current entry stored in the collection.
    Stored(&'a InnerValue<D>),
    /// A placeholder for an absent (or superseded) entry, bound to the
    /// collection for routing but never inserted into it. Mutating through
    /// a transient creates the entry server-side.
    Transient(InnerValue<D>),
}

impl<D> Lookup<'_, D> {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// The looked-up value, cloning stored entries.
    pub fn into_value(self) -> InnerValue<D>
    where
        D: Clone,
    {
        match self {
            Self::Stored(value) => value.clone(),
            Self::Transient(value) => value,
        }
    }
}

impl<D> Deref for Lookup<'_, D> {
    type Target = InnerValue<D>;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Stored(value) => value,
            Self::Transient(value) => value,
        }
    }
}

impl<D> fmt::Debug for Lookup<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(value) => f.debug_tuple("Lookup::Stored").field(value).finish(),
            Self::Transient(value) => f.debug_tuple("Lookup::Transient").field(value).finish(),
        }
    }
}

impl<D> TypedCollection<D> {
    /// The kind every entry of this collection has.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.contents.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InnerValue<D>)> {
        self.contents.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether a value for `key` exists in this collection. No side
    /// effects, and no freshness requirement.
    pub fn contains(&self, key: impl fmt::Display) -> bool {
        self.contents.contains_key(&normalize_key(key))
    }

    /// The plain-data view of the collection: normalized key to the
    /// externally visible state of each entry.
    pub fn to_plain(&self) -> BTreeMap<String, PlainValue> {
        self.contents
            .iter()
            .map(|(k, v)| (k.clone(), v.to_plain()))
            .collect()
    }
}

impl<D: Document + Clone> TypedCollection<D> {
    /// Builds a collection of `kind` bound to `parent`, wrapping each seed.
    ///
    /// Keys are normalized on entry. Seeded instances of an already-wrapped
    /// kind are kept untouched (including their identity tag, so instances
    /// inherited from an older tree snapshot read as stale); everything
    /// else is wrapped fresh. Kinds that need a name get the key stamped on.
    pub fn new(
        kind: ValueKind,
        parent: Parent<D>,
        contents: impl IntoIterator<Item = (String, Seed<D>)>,
    ) -> Self {
        let generation = Generation::next();
        let contents = contents
            .into_iter()
            .map(|(key, seed)| {
                let key = normalize_key(key);
                let mut value = match seed {
                    Seed::Value(value) if kind.already_wrapped() && value.kind() == kind => value,
                    Seed::Value(value) => {
                        InnerValue::wrap(kind, value.to_plain(), &parent, &key, generation)
                    }
                    Seed::Plain(plain) => InnerValue::wrap(kind, plain, &parent, &key, generation),
                };
                if kind.needs_name() {
                    value.set_name(&key);
                }
                (key, value)
            })
            .collect();
        Self {
            kind,
            parent,
            generation,
            contents,
        }
    }

    /// Looks up `key`, producing either the current stored entry or a
    /// transient placeholder.
    ///
    /// A stored entry is returned only while it is current (wrapped by this
    /// collection); a stale entry inherited from a previous tree snapshot
    /// is treated as absent. On a miss, kinds that initialize as absent
    /// yield `None`; every other kind yields a transient value that can
    /// immediately route mutations even though nothing durable exists yet.
    pub fn get(&self, key: impl fmt::Display) -> Option<Lookup<'_, D>> {
        let key = normalize_key(key);
        if let Some(candidate) = self.contents.get(&key) {
            if candidate.generation() == self.generation {
                return Some(Lookup::Stored(candidate));
            }
        }

        if self.kind.initializes_absent() {
            return None;
        }

        let mut value = InnerValue::fresh(self.kind, &self.parent, &key, self.generation);
        if self.kind.needs_name() {
            value.set_name(&key);
        }
        Some(Lookup::Transient(value))
    }

    /// Mutable access to the current entry at `key`, mainly for descending
    /// into stored nested maps. Stale entries are treated as absent.
    pub fn get_mut(&mut self, key: impl fmt::Display) -> Option<&mut InnerValue<D>> {
        let key = normalize_key(key);
        let generation = self.generation;
        self.contents
            .get_mut(&key)
            .filter(|candidate| candidate.generation() == generation)
    }

    /// Sets the value for `key`. Only defined for the scalar kinds
    /// (counter, register, flag); for counters, `value` is the amount to
    /// increment by.
    ///
    /// The update operation is forwarded first; only when the root reports
    /// success is the local entry optimistically replaced with a freshly
    /// wrapped instance of `value`.
    pub fn set(
        &mut self,
        key: impl fmt::Display,
        value: impl Into<UpdateValue>,
    ) -> Result<(), Error> {
        let key = normalize_key(key);
        let value = value.into();

        let operation = self.kind.update(value.clone())?;
        self.parent.operate(operation.named(&key))?;

        let mut fresh = InnerValue::from_update(self.kind, value, self.generation);
        if self.kind.needs_name() {
            fresh.set_name(&key);
        }
        self.contents.insert(key, fresh);
        Ok(())
    }

    /// Adjusts the counter at `key` by `amount`. Alias of [`set`](Self::set)
    /// for counter collections.
    pub fn increment(&mut self, key: impl fmt::Display, amount: i64) -> Result<(), Error> {
        self.set(key, amount)
    }

    /// Removes the entry at `key` from the map, locally only once the root
    /// has accepted the operation.
    pub fn delete(&mut self, key: impl fmt::Display) -> Result<(), Error> {
        let key = normalize_key(key);
        self.parent.operate(self.kind.delete().named(&key))?;
        self.contents.remove(&key);
        Ok(())
    }

    /// Adds `element` to the set at `key`. Only defined for set
    /// collections.
    pub fn add(&mut self, key: impl fmt::Display, element: impl Into<Blob>) -> Result<(), Error> {
        self.expect_kind(ValueKind::Set)?;
        let key = normalize_key(key);
        let element = element.into();

        self.parent.operate(Operation::add(element.clone()).named(&key))?;

        match self.contents.get_mut(&key) {
            Some(InnerValue::Set(set)) if set.generation == self.generation => {
                set.members.insert(element);
            }
            _ => {
                let mut set = InnerSet::new([element].into(), self.generation);
                set.name = Some(key.clone());
                self.contents.insert(key, InnerValue::Set(set));
            }
        }
        Ok(())
    }

    /// Removes `element` from the set at `key`. Only defined for set
    /// collections, and refused before any upstream call when the document
    /// lacks the causal context that makes removals safe, regardless of
    /// whether the element is locally present.
    pub fn remove(
        &mut self,
        key: impl fmt::Display,
        element: impl Into<Blob>,
    ) -> Result<(), Error> {
        self.expect_kind(ValueKind::Set)?;
        if !self.parent.has_context() {
            return Err(Error::MissingContext);
        }
        let key = normalize_key(key);
        let element = element.into();

        self.parent
            .operate(Operation::remove(element.clone()).named(&key))?;

        if let Some(InnerValue::Set(set)) = self.contents.get_mut(&key) {
            set.members.remove(&element);
        }
        Ok(())
    }

    /// Stamps `inner` with the normalized key and forwards it to the
    /// parent. This is how a mutation on a child of a nested map percolates
    /// upward, re-addressed with this level's key.
    pub fn operate(&self, key: impl fmt::Display, inner: Operation) -> Result<(), Error> {
        self.parent.operate(inner.named(normalize_key(key)))
    }

    /// Whether the document at the end of the routing chain holds the
    /// causal context needed for remove-class operations. Collections have
    /// no context state of their own; this is a pure pass-through.
    pub fn has_context(&self) -> bool {
        self.parent.has_context()
    }

    /// A collection of the same kind and contents bound to `parent`.
    ///
    /// The original is untouched. Carried-over values of already-wrapped
    /// kinds keep their old identity tag and read as stale in the new
    /// collection until rewrapped by a future access.
    pub fn reparent(&self, parent: Parent<D>) -> Self {
        Self::new(
            self.kind,
            parent,
            self.contents
                .iter()
                .map(|(k, v)| (k.clone(), Seed::Value(v.clone()))),
        )
    }

    pub fn parent(&self) -> &Parent<D> {
        &self.parent
    }

    fn expect_kind(&self, expected: ValueKind) -> Result<(), Error> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(Error::KindMismatch {
                expected,
                actual: self.kind,
            })
        }
    }
}

fn normalize_key(key: impl fmt::Display) -> String {
    key.to_string()
}

/// Errors raised by collection operations.
#[derive(Debug)]
pub enum Error {
    /// `set` was called on a kind without a scalar update form.
    UpdateUnsupported { kind: ValueKind },
    /// The scalar value does not fit the collection's kind.
    PayloadMismatch {
        kind: ValueKind,
        payload: &'static str,
    },
    /// A set-membership operation was called on a collection of another
    /// kind.
    KindMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },
    /// A remove-class operation was attempted before the document fetched
    /// causal context. Refresh the document, then retry.
    MissingContext,
    /// The root document failed to execute the operation. Local contents
    /// are unchanged.
    Document(DocumentError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateUnsupported { kind } => {
                write!(f, "{kind} elements have no scalar update form")
            }
            Self::PayloadMismatch { kind, payload } => {
                write!(f, "a {payload} value cannot update a {kind} element")
            }
            Self::KindMismatch { expected, actual } => {
                write!(
                    f,
                    "operation requires a collection of {expected} elements, found {actual}"
                )
            }
            Self::MissingContext => {
                write!(f, "removal requires causal context from a previous fetch")
            }
            Self::Document(_) => write!(f, "the root document failed to execute the operation"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Document(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<DocumentError> for Error {
    fn from(inner: DocumentError) -> Self {
        Self::Document(inner)
    }
}
