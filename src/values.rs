// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The closed set of value variants a replicated map can hold.
//!
//! Each variant is a thin typed wrapper over the state last seen from (or
//! optimistically written toward) the server: a counter's accumulated
//! amount, a flag's boolean, a register's opaque payload, a set's members,
//! or a nested map's own collections. Values do not mutate themselves;
//! mutation goes through the owning [`TypedCollection`], which builds an
//! [`Operation`](crate::Operation) and routes it upward.
//!
//! [`ValueKind`] carries the type-level classification the collection core
//! dispatches on. The classification is fixed per kind, never per instance:
//!
//! | kind     | already wrapped | needs name | absent on miss | scalar update |
//! |----------|-----------------|------------|----------------|---------------|
//! | Counter  | yes             | yes        | no             | yes           |
//! | Flag     | yes             | no         | no             | yes           |
//! | Register | no              | no         | yes            | yes           |
//! | Set      | no              | yes        | no             | no            |
//! | Map      | yes             | yes        | no             | no            |
use crate::{
    Generation,
    collection::Error,
    document::{Document, Parent},
    ops::Operation,
    snapshot::{MapData, PlainValue},
};
use std::fmt;

mod counter;
mod flag;
mod map;
mod register;
mod set;

pub use counter::InnerCounter;
pub use flag::InnerFlag;
pub use map::InnerMap;
pub use register::{Blob, InnerRegister};
pub use set::InnerSet;

/// The kind of value stored in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ValueKind {
    Counter,
    Flag,
    Register,
    Set,
    Map,
}

impl ValueKind {
    /// Kinds whose instances are kept as-is when a collection is seeded
    /// from previously constructed values. The remaining kinds are
    /// re-wrapped from their payload.
    pub fn already_wrapped(self) -> bool {
        matches!(self, Self::Counter | Self::Flag | Self::Map)
    }

    /// Kinds that carry their key as an explicit name, so operations can be
    /// addressed without relying on map position.
    pub fn needs_name(self) -> bool {
        matches!(self, Self::Counter | Self::Set | Self::Map)
    }

    /// Kinds for which a lookup miss yields no value instead of a transient
    /// placeholder. A register has no meaningful empty state to mutate into
    /// existence.
    pub fn initializes_absent(self) -> bool {
        matches!(self, Self::Register)
    }

    /// Kinds with a scalar `set`-style update form.
    pub fn supports_update(self) -> bool {
        matches!(self, Self::Counter | Self::Flag | Self::Register)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Flag => "flag",
            Self::Register => "register",
            Self::Set => "set",
            Self::Map => "map",
        }
    }

    /// Builds the update operation representing `set`ting an entry of this
    /// kind to `value`.
    ///
    /// Set and map entries have no scalar update form; asking for one is a
    /// usage error, as is a scalar of the wrong shape.
    pub fn update(self, value: UpdateValue) -> Result<Operation, Error> {
        if !self.supports_update() {
            return Err(Error::UpdateUnsupported { kind: self });
        }
        match (self, value) {
            (Self::Counter, UpdateValue::Int(amount)) => Ok(Operation::increment(amount)),
            (Self::Flag, UpdateValue::Bool(enabled)) => Ok(Operation::flag(enabled)),
            (Self::Register, UpdateValue::Blob(value)) => Ok(Operation::assign(value)),
            (kind, value) => Err(Error::PayloadMismatch {
                kind,
                payload: value.shape_name(),
            }),
        }
    }

    /// Builds the operation deleting an entry of this kind.
    pub fn delete(self) -> Operation {
        Operation::delete(self)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A scalar value accepted by [`TypedCollection::set`](crate::TypedCollection::set).
///
/// For counters the integer is the amount to increment by, not an absolute
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateValue {
    Int(i64),
    Bool(bool),
    Blob(Blob),
}

impl UpdateValue {
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Blob(_) => "blob",
        }
    }
}

macro_rules! impl_from {
    (
        $(
            $source:ty => $target:ident $(with $conv:ident)?
        ),* $(,)?
    ) => {
        $(
            impl From<$source> for UpdateValue {
                fn from(value: $source) -> Self {
                    Self::$target(impl_from!(value$(, $conv)?))
                }
            }
        )*
    };

    ($value:ident, $conv:ident) => {
        $value.$conv()
    };

    ($value:ident) => {
        $value
    };
}

impl_from!(
    i8         => Int with into,
    i16        => Int with into,
    // i32 because it's the "default" inference integer type
    i32        => Int with into,
    i64        => Int,
    u8         => Int with into,
    u16        => Int with into,
    u32        => Int with into,
    bool       => Bool,
    &str       => Blob with into,
    String     => Blob with into,
    &[u8]      => Blob with into,
    Vec<u8>    => Blob with into,
    Blob       => Blob,
);

/// A typed value held (or about to be held) by a [`TypedCollection`].
///
/// [`TypedCollection`]: crate::TypedCollection
#[derive(Clone)]
pub enum InnerValue<D> {
    Counter(InnerCounter),
    Flag(InnerFlag),
    Register(InnerRegister),
    Set(InnerSet),
    Map(InnerMap<D>),
}

impl<D> fmt::Debug for InnerValue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter(c) => f.debug_tuple("InnerValue::Counter").field(c).finish(),
            Self::Flag(v) => f.debug_tuple("InnerValue::Flag").field(v).finish(),
            Self::Register(r) => f.debug_tuple("InnerValue::Register").field(r).finish(),
            Self::Set(s) => f.debug_tuple("InnerValue::Set").field(s).finish(),
            Self::Map(m) => f.debug_tuple("InnerValue::Map").field(m).finish(),
        }
    }
}

impl<D> InnerValue<D> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Counter(_) => ValueKind::Counter,
            Self::Flag(_) => ValueKind::Flag,
            Self::Register(_) => ValueKind::Register,
            Self::Set(_) => ValueKind::Set,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// The key this value is stored under, for kinds that carry one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Counter(c) => c.name(),
            Self::Set(s) => s.name(),
            Self::Map(m) => m.name(),
            Self::Flag(_) | Self::Register(_) => None,
        }
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        match self {
            Self::Counter(c) => c.name = Some(name.to_string()),
            Self::Set(s) => s.name = Some(name.to_string()),
            Self::Map(m) => m.name = Some(name.to_string()),
            // positional in wire form, no name to carry
            Self::Flag(_) | Self::Register(_) => {}
        }
    }

    pub(crate) fn generation(&self) -> Generation {
        match self {
            Self::Counter(c) => c.generation,
            Self::Flag(v) => v.generation,
            Self::Register(r) => r.generation,
            Self::Set(s) => s.generation,
            Self::Map(m) => m.generation,
        }
    }

    /// The externally visible state of this value, stripped of routing
    /// metadata.
    pub fn to_plain(&self) -> PlainValue {
        match self {
            Self::Counter(c) => PlainValue::Counter(c.value),
            Self::Flag(v) => PlainValue::Flag(v.value),
            Self::Register(r) => PlainValue::Register(r.value.clone()),
            Self::Set(s) => PlainValue::Set(s.members.clone()),
            Self::Map(m) => PlainValue::Map(m.to_plain()),
        }
    }

    pub fn as_counter(&self) -> Option<&InnerCounter> {
        match self {
            Self::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<&InnerFlag> {
        match self {
            Self::Flag(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_register(&self) -> Option<&InnerRegister> {
        match self {
            Self::Register(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&InnerSet> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&InnerMap<D>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut InnerMap<D>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<InnerMap<D>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl<D: Document + Clone> InnerValue<D> {
    /// Wraps plain data as a value of `kind` owned by the collection at
    /// `parent`. Seeds of the wrong shape wrap as the kind's empty value.
    pub(crate) fn wrap(
        kind: ValueKind,
        plain: PlainValue,
        parent: &Parent<D>,
        key: &str,
        generation: Generation,
    ) -> Self {
        match kind {
            ValueKind::Counter => {
                let value = match plain {
                    PlainValue::Counter(v) => v,
                    _ => 0,
                };
                Self::Counter(InnerCounter::new(value, generation))
            }
            ValueKind::Flag => {
                let value = match plain {
                    PlainValue::Flag(v) => v,
                    _ => false,
                };
                Self::Flag(InnerFlag::new(value, generation))
            }
            ValueKind::Register => {
                let value = match plain {
                    PlainValue::Register(v) => v,
                    _ => Blob::default(),
                };
                Self::Register(InnerRegister::new(value, generation))
            }
            ValueKind::Set => {
                let members = match plain {
                    PlainValue::Set(members) => members,
                    _ => Default::default(),
                };
                Self::Set(InnerSet::new(members, generation))
            }
            ValueKind::Map => {
                let data = match plain {
                    PlainValue::Map(data) => data,
                    _ => MapData::default(),
                };
                Self::Map(InnerMap::new(parent.child(key), data, generation))
            }
        }
    }

    /// An empty value of `kind`, used for transient placeholders.
    pub(crate) fn fresh(
        kind: ValueKind,
        parent: &Parent<D>,
        key: &str,
        generation: Generation,
    ) -> Self {
        match kind {
            ValueKind::Counter => Self::Counter(InnerCounter::new(0, generation)),
            ValueKind::Flag => Self::Flag(InnerFlag::new(false, generation)),
            ValueKind::Register => Self::Register(InnerRegister::new(Blob::default(), generation)),
            ValueKind::Set => Self::Set(InnerSet::new(Default::default(), generation)),
            ValueKind::Map => Self::Map(InnerMap::new(
                parent.child(key),
                MapData::default(),
                generation,
            )),
        }
    }

    /// The optimistic local instance inserted after a successful scalar
    /// `set`. Callers have already validated the pairing via
    /// [`ValueKind::update`].
    pub(crate) fn from_update(kind: ValueKind, value: UpdateValue, generation: Generation) -> Self {
        match (kind, value) {
            (ValueKind::Counter, UpdateValue::Int(amount)) => {
                Self::Counter(InnerCounter::new(amount, generation))
            }
            (ValueKind::Flag, UpdateValue::Bool(enabled)) => {
                Self::Flag(InnerFlag::new(enabled, generation))
            }
            (ValueKind::Register, UpdateValue::Blob(value)) => {
                Self::Register(InnerRegister::new(value, generation))
            }
            (kind, value) => unreachable!(
                "ValueKind::update validated the pairing, got {kind:?} with {value:?}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_the_wire_contract() {
        use ValueKind::*;
        assert!(Counter.already_wrapped() && Flag.already_wrapped() && Map.already_wrapped());
        assert!(!Register.already_wrapped() && !Set.already_wrapped());

        assert!(Counter.needs_name() && Set.needs_name() && Map.needs_name());
        assert!(!Flag.needs_name() && !Register.needs_name());

        assert!(Register.initializes_absent());
        assert!(!Counter.initializes_absent());

        assert!(Counter.supports_update() && Flag.supports_update());
        assert!(Register.supports_update());
        assert!(!Set.supports_update() && !Map.supports_update());
    }

    #[test]
    fn update_rejects_kinds_without_a_scalar_form() {
        for kind in [ValueKind::Set, ValueKind::Map] {
            match kind.update(5.into()) {
                Err(Error::UpdateUnsupported { kind: k }) => assert_eq!(k, kind),
                other => panic!("expected a usage error, got {other:?}"),
            }
        }
    }

    #[test]
    fn update_rejects_mismatched_payloads() {
        match ValueKind::Counter.update(true.into()) {
            Err(Error::PayloadMismatch { kind, payload }) => {
                assert_eq!(kind, ValueKind::Counter);
                assert_eq!(payload, "boolean");
            }
            other => panic!("expected a payload mismatch, got {other:?}"),
        }
    }

    #[test]
    fn update_builds_the_scalar_operations() {
        assert_eq!(
            ValueKind::Counter.update(5.into()).unwrap(),
            Operation::increment(5),
        );
        assert_eq!(
            ValueKind::Flag.update(true.into()).unwrap(),
            Operation::flag(true),
        );
        assert_eq!(
            ValueKind::Register.update("v".into()).unwrap(),
            Operation::assign("v"),
        );
    }
}
