/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Flattened member layouts.
//!
//! A [`Layout`] is the ordered member list of a message, header, trailer or
//! group entry after every component reference has been inlined. Required
//! flags are already combined with the flags of the enclosing components, so
//! the required set of a layout is simply its required top-level entries.

use std::collections::{HashMap, HashSet};

/// A field or group position within a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    /// A single field.
    Field {
        /// Field tag number.
        tag: u32,
        /// Whether the field is required.
        required: bool,
    },
    /// A repeating group.
    Group(GroupLayout),
}

impl LayoutEntry {
    /// Returns the field tag, or the count tag for a group.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> u32 {
        match self {
            Self::Field { tag, .. } => *tag,
            Self::Group(group) => group.count_tag,
        }
    }

    /// Returns true if the entry is required.
    #[inline]
    #[must_use]
    pub const fn is_required(&self) -> bool {
        match self {
            Self::Field { required, .. } => *required,
            Self::Group(group) => group.required,
        }
    }
}

/// Flattened repeating group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    /// Tag of the NumInGroup counter.
    pub count_tag: u32,
    /// Group name.
    pub name: String,
    /// First tag of every group entry.
    pub delimiter_tag: u32,
    /// Whether the group is required.
    pub required: bool,
    /// Layout of one group entry.
    pub layout: Layout,
}

/// Ordered, component-free member list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    entries: Vec<LayoutEntry>,
    index: HashMap<u32, usize>,
    deep: HashSet<u32>,
}

impl Layout {
    /// Creates a layout from flattened entries.
    #[must_use]
    pub fn new(entries: Vec<LayoutEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        let mut deep = HashSet::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            index.entry(entry.tag()).or_insert(position);
            deep.insert(entry.tag());
            if let LayoutEntry::Group(group) = entry {
                deep.extend(group.layout.deep.iter().copied());
            }
        }
        Self {
            entries,
            index,
            deep,
        }
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    /// Returns the top-level entry for a field tag or group count tag.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&LayoutEntry> {
        self.index.get(&tag).map(|&position| &self.entries[position])
    }

    /// Returns the position of a top-level entry.
    #[must_use]
    pub fn position(&self, tag: u32) -> Option<usize> {
        self.index.get(&tag).copied()
    }

    /// Returns true if `tag` is a top-level field or group count.
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.index.contains_key(&tag)
    }

    /// Returns true if `tag` appears anywhere, including nested groups.
    #[inline]
    #[must_use]
    pub fn contains_deep(&self, tag: u32) -> bool {
        self.deep.contains(&tag)
    }

    /// Returns the top-level group counted by `count_tag`.
    #[must_use]
    pub fn group(&self, count_tag: u32) -> Option<&GroupLayout> {
        match self.get(count_tag) {
            Some(LayoutEntry::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Finds a group at any depth by its delimiter tag.
    #[must_use]
    pub fn find_group_by_delimiter(&self, delimiter_tag: u32) -> Option<&GroupLayout> {
        self.entries.iter().find_map(|entry| match entry {
            LayoutEntry::Group(group) if group.delimiter_tag == delimiter_tag => Some(group),
            LayoutEntry::Group(group) => group.layout.find_group_by_delimiter(delimiter_tag),
            LayoutEntry::Field { .. } => None,
        })
    }

    /// Returns the required top-level tags in layout order.
    pub fn required_tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.is_required())
            .map(LayoutEntry::tag)
    }

    /// Returns the number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the layout has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
