// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::ValueKind;
use crate::{
    Generation,
    collection::{Error, Seed, TypedCollection},
    document::{Document, Parent},
    ops::Operation,
    snapshot::{MapData, PlainValue},
};
use std::fmt;

/// A map of typed values, either the top of a document tree or nested
/// inside another map.
///
/// A map owns one [`TypedCollection`] per possible child kind. Two entries
/// of different kinds may share a key; addressing is always by key *and*
/// kind, which is why operations carry both.
///
/// The top of a tree is built with [`InnerMap::root`] (empty) or
/// [`InnerMap::root_from`] (seeded from fetched [`MapData`]); refreshing
/// the document later produces a new tree via [`InnerMap::reparent`].
pub struct InnerMap<D> {
    pub(crate) name: Option<String>,
    pub(crate) generation: Generation,
    counters: TypedCollection<D>,
    flags: TypedCollection<D>,
    registers: TypedCollection<D>,
    sets: TypedCollection<D>,
    maps: TypedCollection<D>,
}

impl<D: Clone> Clone for InnerMap<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            generation: self.generation,
            counters: self.counters.clone(),
            flags: self.flags.clone(),
            registers: self.registers.clone(),
            sets: self.sets.clone(),
            maps: self.maps.clone(),
        }
    }
}

impl<D> fmt::Debug for InnerMap<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = f.debug_struct("InnerMap");
        if let Some(name) = &self.name {
            w.field("name", name);
        }
        // only the populated collections, to keep nested trees readable
        for collection in [
            &self.counters,
            &self.flags,
            &self.registers,
            &self.sets,
            &self.maps,
        ] {
            if !collection.is_empty() {
                w.field(collection.kind().type_name(), collection);
            }
        }
        w.finish_non_exhaustive()
    }
}

impl<D: Document + Clone> InnerMap<D> {
    /// An empty map tree routing directly to `document`.
    pub fn root(document: D) -> Self {
        Self::root_from(document, MapData::default())
    }

    /// A map tree seeded from fetched data, routing directly to `document`.
    pub fn root_from(document: D, data: MapData) -> Self {
        Self::new(Parent::root(document), data, Generation::next())
    }

    pub(crate) fn new(parent: Parent<D>, data: MapData, generation: Generation) -> Self {
        let MapData {
            counters,
            flags,
            registers,
            sets,
            maps,
        } = data;
        Self {
            name: None,
            generation,
            counters: TypedCollection::new(
                ValueKind::Counter,
                parent.clone(),
                counters
                    .into_iter()
                    .map(|(k, v)| (k, Seed::Plain(PlainValue::Counter(v)))),
            ),
            flags: TypedCollection::new(
                ValueKind::Flag,
                parent.clone(),
                flags
                    .into_iter()
                    .map(|(k, v)| (k, Seed::Plain(PlainValue::Flag(v)))),
            ),
            registers: TypedCollection::new(
                ValueKind::Register,
                parent.clone(),
                registers
                    .into_iter()
                    .map(|(k, v)| (k, Seed::Plain(PlainValue::Register(v)))),
            ),
            sets: TypedCollection::new(
                ValueKind::Set,
                parent.clone(),
                sets.into_iter()
                    .map(|(k, v)| (k, Seed::Plain(PlainValue::Set(v)))),
            ),
            maps: TypedCollection::new(
                ValueKind::Map,
                parent,
                maps.into_iter()
                    .map(|(k, v)| (k, Seed::Plain(PlainValue::Map(v)))),
            ),
        }
    }

    /// A structurally identical map bound to a new parent.
    ///
    /// Contents are preserved; the already-wrapped kinds carried over keep
    /// their old identity tags and will read as stale until rewrapped by a
    /// future access.
    pub fn reparent(&self, parent: Parent<D>) -> Self {
        Self {
            name: self.name.clone(),
            generation: self.generation,
            counters: self.counters.reparent(parent.clone()),
            flags: self.flags.reparent(parent.clone()),
            registers: self.registers.reparent(parent.clone()),
            sets: self.sets.reparent(parent.clone()),
            maps: self.maps.reparent(parent),
        }
    }

    /// Routes an operation for the child at `key` to the collection
    /// matching the operation's kind, and onward to the root.
    pub fn operate(&self, key: impl fmt::Display, op: Operation) -> Result<(), Error> {
        self.collection(op.kind()).operate(key, op)
    }

    pub fn collection(&self, kind: ValueKind) -> &TypedCollection<D> {
        match kind {
            ValueKind::Counter => &self.counters,
            ValueKind::Flag => &self.flags,
            ValueKind::Register => &self.registers,
            ValueKind::Set => &self.sets,
            ValueKind::Map => &self.maps,
        }
    }

    pub fn collection_mut(&mut self, kind: ValueKind) -> &mut TypedCollection<D> {
        match kind {
            ValueKind::Counter => &mut self.counters,
            ValueKind::Flag => &mut self.flags,
            ValueKind::Register => &mut self.registers,
            ValueKind::Set => &mut self.sets,
            ValueKind::Map => &mut self.maps,
        }
    }

    pub fn counters(&self) -> &TypedCollection<D> {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut TypedCollection<D> {
        &mut self.counters
    }

    pub fn flags(&self) -> &TypedCollection<D> {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut TypedCollection<D> {
        &mut self.flags
    }

    pub fn registers(&self) -> &TypedCollection<D> {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut TypedCollection<D> {
        &mut self.registers
    }

    pub fn sets(&self) -> &TypedCollection<D> {
        &self.sets
    }

    pub fn sets_mut(&mut self) -> &mut TypedCollection<D> {
        &mut self.sets
    }

    pub fn maps(&self) -> &TypedCollection<D> {
        &self.maps
    }

    pub fn maps_mut(&mut self) -> &mut TypedCollection<D> {
        &mut self.maps
    }

    /// Whether the document at the end of the routing chain holds causal
    /// context.
    pub fn has_context(&self) -> bool {
        self.counters.has_context()
    }

}

impl<D> InnerMap<D> {
    /// The plain-data view of the whole map subtree.
    pub fn to_plain(&self) -> MapData {
        MapData {
            counters: self
                .counters
                .iter()
                .filter_map(|(k, v)| v.as_counter().map(|c| (k.to_string(), c.value())))
                .collect(),
            flags: self
                .flags
                .iter()
                .filter_map(|(k, v)| v.as_flag().map(|f| (k.to_string(), f.value())))
                .collect(),
            registers: self
                .registers
                .iter()
                .filter_map(|(k, v)| v.as_register().map(|r| (k.to_string(), r.value().clone())))
                .collect(),
            sets: self
                .sets
                .iter()
                .filter_map(|(k, v)| v.as_set().map(|s| (k.to_string(), s.members().clone())))
                .collect(),
            maps: self
                .maps
                .iter()
                .filter_map(|(k, v)| v.as_map().map(|m| (k.to_string(), m.to_plain())))
                .collect(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
