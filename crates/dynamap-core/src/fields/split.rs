//! One delimited property spread across several attributes.

use dynamap_model::{AttributeValue, Item};
use serde_json::Value;

use super::{Binding, Field, FieldOptions, ModelItem, Validator, WithOptions};
use crate::context::ModelContext;
use crate::error::{FieldError, SchemaError};

/// Splits a string property such as `"tenant.user"` into ordered attributes,
/// typically a partition and a sort key.
///
/// A value with more parts than attributes folds the leading parts into the
/// first attribute; a value with fewer parts writes only the leading
/// attributes. Update operations are not supported.
#[derive(Debug)]
pub struct FieldSplit {
    aliases: Vec<String>,
    delimiter: String,
    options: FieldOptions,
    binding: Binding,
}

impl FieldSplit {
    /// Split across `aliases` with delimiter `.`.
    #[must_use]
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            delimiter: ".".to_owned(),
            options: FieldOptions::default(),
            binding: Binding::default(),
        }
    }

    /// Use `delimiter` instead of `.`.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    fn parts(&self, value: &str) -> Vec<String> {
        let parts: Vec<&str> = value.split(self.delimiter.as_str()).collect();
        let count = self.aliases.len();
        if count == 0 || parts.len() <= count {
            return parts.into_iter().map(str::to_owned).collect();
        }
        let overflow = parts.len() - count + 1;
        std::iter::once(parts[..overflow].join(self.delimiter.as_str()))
            .chain(parts[overflow..].iter().map(|p| (*p).to_owned()))
            .collect()
    }
}

impl WithOptions for FieldSplit {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for FieldSplit {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let parts: Vec<&str> = self
            .aliases
            .iter()
            .filter_map(|alias| match table.get(alias)? {
                AttributeValue::S(s) | AttributeValue::N(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        if !parts.is_empty() {
            model.insert(name.to_owned(), Value::String(parts.join(self.delimiter.as_str())));
        }
    }

    fn to_table(
        &self,
        name: &str,
        model: &ModelItem,
        table: &mut Item,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        let Some(value) = self.options.resolve(name, model, ctx)? else {
            return Ok(());
        };
        let Value::String(value) = value else {
            return Err(FieldError::InvalidValue {
                name: name.to_owned(),
                expected: "a delimited string",
            });
        };
        for (alias, part) in self.aliases.iter().zip(self.parts(&value)) {
            table.insert(alias.clone(), AttributeValue::S(part));
        }
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn validator(&self) -> Option<&dyn Validator> {
        self.options.validator.as_deref()
    }
}
