// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Plain-data views of map trees, stripped of routing metadata.
//!
//! These types serve two directions. Reading, they are what
//! [`to_plain`](crate::TypedCollection::to_plain) produces: the externally
//! consumable state of a collection or subtree. Writing, they are the seed
//! format a fetched server response is decoded into before
//! [`InnerMap::root_from`](crate::InnerMap::root_from) wraps it into live
//! collections.
//!
//! Ordered containers keep the views deterministic.
use crate::values::{Blob, ValueKind};
use std::collections::{BTreeMap, BTreeSet};

/// The externally visible state of a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum PlainValue {
    Counter(i64),
    Flag(bool),
    Register(Blob),
    Set(BTreeSet<Blob>),
    Map(MapData),
}

impl PlainValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Counter(_) => ValueKind::Counter,
            Self::Flag(_) => ValueKind::Flag,
            Self::Register(_) => ValueKind::Register,
            Self::Set(_) => ValueKind::Set,
            Self::Map(_) => ValueKind::Map,
        }
    }
}

/// The plain contents of one map, keyed per child kind.
///
/// Entries of different kinds may share a key; the per-kind maps keep them
/// apart the same way the wire form does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct MapData {
    pub counters: BTreeMap<String, i64>,
    pub flags: BTreeMap<String, bool>,
    pub registers: BTreeMap<String, Blob>,
    pub sets: BTreeMap<String, BTreeSet<Blob>>,
    pub maps: BTreeMap<String, MapData>,
}

impl MapData {
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
            && self.flags.is_empty()
            && self.registers.is_empty()
            && self.sets.is_empty()
            && self.maps.is_empty()
    }
}
