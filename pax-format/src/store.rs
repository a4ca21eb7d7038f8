//! The keyed metadata store.

use std::collections::HashMap;

use itertools::Itertools;
use pax_scalar::{MetaText, MetaValue};

use crate::MetaLocation;

/// Comments get synthesized names starting with this byte, which can
/// never begin a user-supplied metadata name.
pub const COMMENT_NAME_DELIM: char = ';';

/// One stored metadata entry: the value plus its header slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEntry {
    location: MetaLocation,
    index: usize,
    value: MetaValue,
}

impl MetaEntry {
    #[inline]
    pub fn location(&self) -> MetaLocation {
        self.location
    }

    /// Position within the location, assigned at insertion and never
    /// rewritten.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn value(&self) -> &MetaValue {
        &self.value
    }
}

/// All metadata of one model, keyed by name and ordered by header slot.
///
/// Adding under an existing name overwrites the value in place but keeps
/// the original slot, so repeated writes cannot reorder the header. New
/// names take the next index of the current location.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: HashMap<String, MetaEntry>,
    counters: [usize; MetaLocation::COUNT],
    current: MetaLocation,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The location subsequent additions will land in.
    #[inline]
    pub fn location(&self) -> MetaLocation {
        self.current
    }

    /// Switch the current location.
    pub fn set_location(&mut self, location: MetaLocation) {
        self.current = location;
    }

    /// Add or overwrite named metadata at the current location.
    pub fn add(&mut self, name: impl Into<String>, value: MetaValue) {
        let name = name.into();
        if let Some(existing) = self.entries.get_mut(&name) {
            existing.value = value;
            return;
        }
        let location = self.current;
        let index = self.counters[location.index()];
        self.counters[location.index()] += 1;
        self.entries.insert(
            name,
            MetaEntry {
                location,
                index,
                value,
            },
        );
    }

    /// Add or overwrite named metadata at an explicit location, which
    /// also becomes the current location.
    pub fn add_at(&mut self, location: MetaLocation, name: impl Into<String>, value: MetaValue) {
        self.current = location;
        self.add(name, value);
    }

    /// Add a comment at the current location. An empty comment writes
    /// back as a bare `#` with no hanging space.
    pub fn add_comment(&mut self, text: impl AsRef<[u8]>) {
        let stripped = !text.as_ref().is_empty();
        self.add_comment_value(MetaText::new(text, stripped));
    }

    /// Add a comment at an explicit location.
    pub fn add_comment_at(&mut self, location: MetaLocation, text: impl AsRef<[u8]>) {
        self.current = location;
        self.add_comment(text);
    }

    /// Add a comment whose text and leading-space flag came off the wire.
    pub(crate) fn add_comment_value(&mut self, text: MetaText) {
        let name = format!(
            "{}{}{}{}",
            COMMENT_NAME_DELIM,
            self.current,
            COMMENT_NAME_DELIM,
            self.counters[self.current.index()]
        );
        self.add(name, MetaValue::Comment(text));
    }

    pub fn get(&self, name: &str) -> Option<&MetaEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries grouped by location and ordered by index within each
    /// location. This is the round-trip-stable enumeration the header
    /// writer serializes.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &MetaEntry)> {
        self.entries
            .iter()
            .sorted_by_key(|(_, entry)| (entry.location.index(), entry.index))
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// The entries of one location, ordered by index.
    pub fn entries_at(&self, location: MetaLocation) -> impl Iterator<Item = (&str, &MetaEntry)> {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.location == location)
            .sorted_by_key(|(_, entry)| entry.index)
            .map(|(name, entry)| (name.as_str(), entry))
    }
}
