// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The external boundary at the top of the routing chain.
//!
//! The tree in this crate never performs network access itself. Everything
//! terminates in a [`Document`]: the object that executes operations
//! against the database and knows whether the causal context needed for
//! safe removals has been fetched. Implementations are typically thin
//! wrappers over a connection; tests use recording doubles.
//!
//! [`Parent`] is the non-owning handle a collection routes through: the
//! document plus the keys of the maps between it and the collection.
//! Ownership flows from the root downward; routing flows upward, so the
//! handle is plain data rather than a back-pointer, and no reference-counted
//! cycles are involved.
use crate::{collection::Error, ops::Operation};
use smallvec::SmallVec;
use std::{error, fmt, sync::Arc};

/// The root document: terminal end of the parent chain, and the only
/// component that performs network round trips.
pub trait Document {
    /// Executes one fully addressed operation against the server.
    ///
    /// Errors are opaque to the routing layer and re-raised to the caller
    /// unchanged; no local state is mutated when this fails.
    fn operate(&self, op: Operation) -> Result<(), DocumentError>;

    /// Whether the causal context needed to make remove-class operations
    /// safe has been fetched from the server.
    fn has_context(&self) -> bool;
}

impl<T: Document + ?Sized> Document for &T {
    fn operate(&self, op: Operation) -> Result<(), DocumentError> {
        (**self).operate(op)
    }

    fn has_context(&self) -> bool {
        (**self).has_context()
    }
}

impl<T: Document + ?Sized> Document for Box<T> {
    fn operate(&self, op: Operation) -> Result<(), DocumentError> {
        (**self).operate(op)
    }

    fn has_context(&self) -> bool {
        (**self).has_context()
    }
}

impl<T: Document + ?Sized> Document for Arc<T> {
    fn operate(&self, op: Operation) -> Result<(), DocumentError> {
        (**self).operate(op)
    }

    fn has_context(&self) -> bool {
        (**self).has_context()
    }
}

/// An opaque failure reported by a [`Document`].
///
/// The routing layer never interprets these; whatever the underlying
/// network or server error was, it travels to the caller intact.
pub struct DocumentError {
    inner: Box<dyn error::Error + Send + Sync>,
}

impl DocumentError {
    pub fn new(source: impl Into<Box<dyn error::Error + Send + Sync>>) -> Self {
        Self {
            inner: source.into(),
        }
    }

    pub fn get_ref(&self) -> &(dyn error::Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn error::Error + Send + Sync> {
        self.inner
    }
}

impl fmt::Debug for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentError").field(&self.inner).finish()
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.inner.source()
    }
}

/// Non-owning handle to everything above a collection: the root document
/// plus the keys of the enclosing maps, outermost first.
///
/// Forwarding an operation applies one [`Operation::in_map`] wrapper per
/// enclosing level, innermost first, so each level's key is stamped onto
/// the operation it forwards and the document's
/// [`operate`](Document::operate) runs exactly once per mutation.
#[derive(Clone)]
pub struct Parent<D> {
    document: D,
    path: SmallVec<[String; 2]>,
}

impl<D> fmt::Debug for Parent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parent")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<D: Document> Parent<D> {
    /// A handle routing directly to the root document.
    pub fn root(document: D) -> Self {
        Self {
            document,
            path: SmallVec::new(),
        }
    }

    /// The handle for children of the map stored at `key` below this
    /// parent.
    pub(crate) fn child(&self, key: &str) -> Self
    where
        D: Clone,
    {
        let mut path = self.path.clone();
        path.push(key.to_string());
        Self {
            document: self.document.clone(),
            path,
        }
    }

    /// The keys of the enclosing maps, outermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Routes `op` upward: wraps it once per enclosing map level and
    /// executes it at the root.
    pub fn operate(&self, op: Operation) -> Result<(), Error> {
        let mut op = op;
        for key in self.path.iter().rev() {
            op = Operation::in_map(key, op);
        }
        self.document.operate(op).map_err(Error::Document)
    }

    pub fn has_context(&self) -> bool {
        self.document.has_context()
    }
}
