//! Several properties packed into one delimited attribute.
//!
//! A composite is never added to a schema itself. Its slots are, one per
//! property, and they all write the same attribute. The first slot to run
//! in a traversal writes the packed value and the others skip, so the value
//! is written at most once. It is written only when every slot has a string
//! value.

use std::sync::{Arc, OnceLock};

use dynamap_model::{AttributeValue, Item};
use indexmap::IndexMap;
use serde_json::Value;

use super::{Binding, Field, ModelItem, ModelUpdate, UpdateValue};
use crate::context::ModelContext;
use crate::error::{FieldError, SchemaError};
use crate::expression::{TableUpdate, UpdateInput};

#[derive(Debug)]
struct Composite {
    alias: String,
    delimiter: String,
    names: Vec<OnceLock<String>>,
}

impl Composite {
    fn pack<'a>(&self, value_of: impl Fn(&str) -> Option<&'a str>) -> Option<String> {
        let parts = self
            .names
            .iter()
            .map(|name| value_of(name.get()?))
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join(self.delimiter.as_str()))
    }
}

/// `count` positional slots packed into one attribute.
#[derive(Debug)]
pub struct FieldComposite {
    alias: String,
    count: usize,
    delimiter: String,
}

impl FieldComposite {
    /// Composite of `count` slots stored under `alias`, delimiter `.`.
    #[must_use]
    pub fn new(alias: impl Into<String>, count: usize) -> Self {
        Self {
            alias: alias.into(),
            count,
            delimiter: ".".to_owned(),
        }
    }

    /// Use `delimiter` instead of `.`.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Create the slot fields in position order. Each slot takes the name it
    /// is declared under in the schema.
    #[must_use]
    pub fn slots(self) -> Vec<FieldCompositeSlot> {
        let composite = Arc::new(Composite {
            alias: self.alias,
            delimiter: self.delimiter,
            names: (0..self.count).map(|_| OnceLock::new()).collect(),
        });
        (0..self.count)
            .map(|index| FieldCompositeSlot::new(composite.clone(), index))
            .collect()
    }
}

/// Named slots packed into one attribute in declaration order.
#[derive(Debug)]
pub struct FieldNamedComposite {
    alias: String,
    slots: Vec<String>,
    delimiter: String,
}

impl FieldNamedComposite {
    /// Composite of the named `slots` stored under `alias`, delimiter `.`.
    #[must_use]
    pub fn new<I, S>(alias: impl Into<String>, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alias: alias.into(),
            slots: slots.into_iter().map(Into::into).collect(),
            delimiter: ".".to_owned(),
        }
    }

    /// Use `delimiter` instead of `.`.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Create the slot fields, keyed by slot name.
    #[must_use]
    pub fn slots(self) -> NamedSlots {
        let composite = Arc::new(Composite {
            alias: self.alias,
            delimiter: self.delimiter,
            names: self.slots.iter().map(|s| OnceLock::from(s.clone())).collect(),
        });
        let slots = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name, FieldCompositeSlot::new(composite.clone(), index)))
            .collect();
        NamedSlots { composite, slots }
    }
}

/// Slot fields of a [`FieldNamedComposite`].
#[derive(Debug)]
pub struct NamedSlots {
    composite: Arc<Composite>,
    slots: IndexMap<String, FieldCompositeSlot>,
}

impl NamedSlots {
    /// The slot declared as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownSlot`] if no such slot was declared.
    pub fn slot(&self, name: &str) -> Result<FieldCompositeSlot, SchemaError> {
        self.slots
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSlot {
                composite: self.composite.alias.clone(),
                slot: name.to_owned(),
            })
    }

    /// Slot names in packing order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

/// One position of a composite attribute.
#[derive(Debug, Clone)]
pub struct FieldCompositeSlot {
    composite: Arc<Composite>,
    index: usize,
    binding: Arc<Binding>,
}

impl FieldCompositeSlot {
    fn new(composite: Arc<Composite>, index: usize) -> Self {
        Self {
            composite,
            index,
            binding: Arc::new(Binding::default()),
        }
    }
}

impl Field for FieldCompositeSlot {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)?;
        let declared = self.composite.names[self.index].get_or_init(|| name.to_owned());
        if declared != name {
            return Err(SchemaError::AlreadyInitialized {
                existing: declared.clone(),
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let composite = &self.composite;
        let part = table
            .get(&composite.alias)
            .and_then(AttributeValue::as_s)
            .and_then(|packed| packed.split(composite.delimiter.as_str()).nth(self.index));
        if let Some(part) = part {
            model.insert(name.to_owned(), Value::String(part.to_owned()));
        }
    }

    fn to_table(
        &self,
        _name: &str,
        model: &ModelItem,
        table: &mut Item,
        _ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        let composite = &self.composite;
        if table.contains_key(&composite.alias) {
            return Ok(());
        }
        if let Some(packed) = composite.pack(|slot| model.get(slot).and_then(Value::as_str)) {
            table.insert(composite.alias.clone(), AttributeValue::S(packed));
        }
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn to_table_update(
        &self,
        name: &str,
        model: &ModelUpdate,
        table: &mut TableUpdate,
        _ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        match model.get(name) {
            None => return Ok(()),
            Some(UpdateValue::Value(_)) => {}
            Some(_) => {
                return Err(FieldError::UnsupportedUpdate {
                    name: name.to_owned(),
                });
            }
        }
        let composite = &self.composite;
        if table.contains_key(&composite.alias) {
            return Ok(());
        }
        let packed = composite.pack(|slot| match model.get(slot) {
            Some(UpdateValue::Value(Value::String(s))) => Some(s.as_str()),
            _ => None,
        });
        if let Some(packed) = packed {
            table.insert(
                composite.alias.clone(),
                UpdateInput::Value(AttributeValue::S(packed)),
            );
        }
        Ok(())
    }
}
