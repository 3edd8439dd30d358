//! Per-source vocabularies
//!
//! Each source spells the same concept its own way. These tables are the only
//! place that knowledge lives; the predicate compiler just consults them.

use std::collections::BTreeMap;

use crate::models::{Amenity, Category};

/// Shape a source uses to write a grouped tag such as `Views - Sea`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStyle {
    /// `Group - Value`
    Dashed,
    /// `Group: Value`
    Colon,
    /// `Value`
    Bare,
}

impl TagStyle {
    fn render(self, group: Option<&str>, value: &str) -> String {
        match (self, group) {
            (Self::Dashed, Some(group)) => format!("{} - {}", group, value),
            (Self::Colon, Some(group)) => format!("{}: {}", group, value),
            _ => value.to_string(),
        }
    }
}

/// Split a canonical tag into its optional group and value.
///
/// Both `Group - Value` and `Group: Value` are accepted.
pub fn split_tag(tag: &str) -> (Option<&str>, &str) {
    let tag = tag.trim();
    if let Some((group, value)) = tag.split_once(" - ") {
        return (Some(group.trim()), value.trim());
    }
    if let Some((group, value)) = tag.split_once(": ") {
        return (Some(group.trim()), value.trim());
    }
    (None, tag)
}

/// How a source writes tags
#[derive(Debug, Clone, Default)]
pub struct TagDialect {
    pub styles: Vec<TagStyle>,
    /// Extra spellings for specific canonical tags
    pub overrides: BTreeMap<String, Vec<String>>,
}

impl TagDialect {
    pub fn new(styles: impl IntoIterator<Item = TagStyle>) -> Self {
        Self {
            styles: styles.into_iter().collect(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override<I, S>(mut self, canonical: &str, spellings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.insert(
            canonical.to_string(),
            spellings.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Every spelling this source may use for a canonical tag, without duplicates.
    pub fn spellings(&self, canonical: &str) -> Vec<String> {
        let (group, value) = split_tag(canonical);
        let mut out: Vec<String> = Vec::new();

        if let Some(extra) = self.overrides.get(canonical.trim()) {
            for s in extra {
                push_unique(&mut out, s.trim().to_string());
            }
        }
        for style in &self.styles {
            push_unique(&mut out, style.render(group, value));
        }
        if out.is_empty() {
            push_unique(&mut out, value.to_string());
        }
        out
    }
}

fn push_unique(out: &mut Vec<String>, spelling: String) {
    if !spelling.is_empty() && !out.contains(&spelling) {
        out.push(spelling);
    }
}

/// Where a source keeps an amenity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmenityBinding {
    /// Boolean column
    Flag(String),
    /// Membership of a canonical tag in the source's tag list
    Tag(String),
}

/// Complete vocabulary of one source
#[derive(Debug, Clone, Default)]
pub struct Dialect {
    pub tags: TagDialect,
    /// Labels (matched as case-insensitive substrings) for each category
    pub categories: BTreeMap<Category, Vec<String>>,
    pub amenities: BTreeMap<Amenity, AmenityBinding>,
}

impl Dialect {
    pub fn category_labels(&self, category: Category) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
