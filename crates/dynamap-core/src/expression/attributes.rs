//! Placeholder interner shared by every expression compiled for one request.
//!
//! Attribute names are interned per path *segment*: `spouse.name` and `name`
//! share the placeholder allocated for `name`. Values are never deduplicated,
//! every call to [`ExpressionAttributes::add_value`] allocates a new token.

use std::collections::HashMap;

use dynamap_model::AttributeValue;
use indexmap::IndexMap;

/// Name and value placeholder tables for one compile pass.
#[derive(Debug, Clone, Default)]
pub struct ExpressionAttributes {
    /// Segment text -> `#nN`, in first-use order.
    names: IndexMap<String, String>,
    /// `:vN` -> value, in allocation order.
    values: Vec<(String, AttributeValue)>,
}

impl ExpressionAttributes {
    /// Create an empty placeholder table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern every `.`-separated segment of `path` and return the placeholder
    /// path, e.g. `info.tags[1]` -> `#n0.#n1[1]`.
    pub fn add_path(&mut self, path: &str) -> String {
        path.split('.')
            .map(|segment| self.add_segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Intern a single attribute name.
    pub fn add_name(&mut self, name: &str) -> String {
        if let Some(placeholder) = self.names.get(name) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(name.to_owned(), placeholder.clone());
        placeholder
    }

    /// Allocate a fresh value placeholder.
    pub fn add_value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.push((placeholder.clone(), value));
        placeholder
    }

    /// Returns `true` when no name or value has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }

    /// `ExpressionAttributeNames`: placeholder -> attribute name.
    #[must_use]
    pub fn names(&self) -> HashMap<String, String> {
        self.names
            .iter()
            .map(|(name, placeholder)| (placeholder.clone(), name.clone()))
            .collect()
    }

    /// `ExpressionAttributeValues`: placeholder -> value.
    #[must_use]
    pub fn values(&self) -> HashMap<String, AttributeValue> {
        self.values.iter().cloned().collect()
    }

    /// Consume the table into the two wire maps.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, AttributeValue>) {
        let names = self
            .names
            .into_iter()
            .map(|(name, placeholder)| (placeholder, name))
            .collect();
        let values = self.values.into_iter().collect();
        (names, values)
    }

    /// A segment may carry list dereferences (`tags[0][2]`); only the name
    /// part is interned.
    fn add_segment(&mut self, segment: &str) -> String {
        match segment.find('[') {
            Some(idx) if idx > 0 => {
                let (name, suffix) = segment.split_at(idx);
                let placeholder = self.add_name(name);
                format!("{placeholder}{suffix}")
            }
            _ => self.add_name(segment),
        }
    }
}
