// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::Generation;
use std::fmt;

/// A named counter inside a replicated map.
///
/// The value is the amount last observed from the server, or the amount of
/// the most recent increment after an optimistic local update. The server
/// is the source of truth for the converged total.
#[derive(Clone, PartialEq, Eq)]
pub struct InnerCounter {
    pub(crate) name: Option<String>,
    pub(crate) generation: Generation,
    pub(crate) value: i64,
}

impl InnerCounter {
    pub(crate) fn new(value: i64, generation: Generation) -> Self {
        Self {
            name: None,
            generation,
            value,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for InnerCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = f.debug_struct("InnerCounter");
        if let Some(name) = &self.name {
            w.field("name", name);
        }
        w.field("value", &self.value).finish()
    }
}
