// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::Generation;
use std::fmt;

/// The opaque payload of registers and set elements.
///
/// The server treats these as uninterpreted bytes; most callers store UTF-8
/// text, so conversions from strings are provided and [`fmt::Debug`] prints
/// text where the bytes allow it.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Blob(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>);

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The payload as text, when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => write!(f, "{text:?}"),
            None => write!(f, "{:02X?}", self.0),
        }
    }
}

impl From<&[u8]> for Blob {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for Blob {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<String> for Blob {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&str> for Blob {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Blob {
    fn from(value: &[u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl PartialEq<str> for Blob {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Blob {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<[u8]> for Blob {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<&[u8]> for Blob {
    fn eq(&self, other: &&[u8]) -> bool {
        self.0 == *other
    }
}

/// An opaque single-value register inside a replicated map.
///
/// Registers have no meaningful empty state: looking one up before it
/// exists yields no value rather than a placeholder, since there is nothing
/// sensible to optimistically mutate into existence.
#[derive(Clone, PartialEq, Eq)]
pub struct InnerRegister {
    pub(crate) generation: Generation,
    pub(crate) value: Blob,
}

impl InnerRegister {
    pub(crate) fn new(value: Blob, generation: Generation) -> Self {
        Self { generation, value }
    }

    pub fn value(&self) -> &Blob {
        &self.value
    }
}

impl fmt::Debug for InnerRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips() {
        let blob = Blob::from("hello");
        assert_eq!(blob.as_str(), Some("hello"));
        assert_eq!(blob, "hello");
        assert_eq!(format!("{blob:?}"), "\"hello\"");
    }

    #[test]
    fn non_utf8_debugs_as_hex() {
        let blob = Blob::from(&[0xFF, 0x00][..]);
        assert_eq!(blob.as_str(), None);
        assert_eq!(format!("{blob:?}"), "[FF, 00]");
    }
}
