use serde::{Deserialize, Serialize};

/// How many properties the grid is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Empty,
    Single,
    Multiple,
}

/// Ordered, de-duplicated set of property names selected for viewing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertySelection {
    properties: Vec<String>,
}

impl PropertySelection {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for property in properties {
            selection.insert(property);
        }
        selection
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(property: impl Into<String>) -> Self {
        Self::new([property])
    }

    /// Adds a property, keeping first-insertion order. Blank names are ignored.
    pub fn insert(&mut self, property: impl Into<String>) -> bool {
        let property = property.into();
        let trimmed = property.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.properties.push(trimmed.to_string());
        true
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.iter().any(|name| name == property)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.properties
    }

    pub fn mode(&self) -> SelectionMode {
        match self.properties.len() {
            0 => SelectionMode::Empty,
            1 => SelectionMode::Single,
            _ => SelectionMode::Multiple,
        }
    }

    /// The selected property when exactly one is selected.
    pub fn single_property(&self) -> Option<&str> {
        match self.properties.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Editing is only permitted with exactly one property selected.
    pub fn can_edit(&self) -> bool {
        self.mode() == SelectionMode::Single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_and_preserves_order() {
        let selection = PropertySelection::new(["Lakeview", " Harbor ", "Lakeview", ""]);
        assert_eq!(selection.as_slice(), ["Lakeview", "Harbor"]);
        assert_eq!(selection.mode(), SelectionMode::Multiple);
        assert!(!selection.can_edit());
    }

    #[test]
    fn only_single_selection_can_edit() {
        assert!(!PropertySelection::none().can_edit());
        let single = PropertySelection::single("Lakeview");
        assert!(single.can_edit());
        assert_eq!(single.single_property(), Some("Lakeview"));
    }
}
