//! Scalar, set and untyped container fields.
//!
//! All of them share [`FieldValue`]; the stored shape is chosen by a
//! [`ValueKind`] marker.

use std::fmt;
use std::marker::PhantomData;

use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use dynamap_model::{AttributeValue, Item};
use serde_json::Value;

use super::{
    Binding, Field, FieldOptions, FieldPath, ModelItem, ModelUpdate, Validator, WithOptions,
    write_update,
};
use crate::context::ModelContext;
use crate::error::{FieldError, SchemaError};
use crate::expression::TableUpdate;

/// Conversion between one JSON shape and one attribute value type.
pub trait ValueKind: fmt::Debug + Send + Sync + 'static {
    /// Shape accepted on the model side, used in error messages.
    const EXPECTED: &'static str;

    /// Model value to table value; `None` if the shape does not match.
    fn to_table(value: &Value) -> Option<AttributeValue>;

    /// Table value to model value; `None` if the type does not match.
    fn to_model(value: &AttributeValue) -> Option<Value>;
}

/// `S` stored as a JSON string.
#[derive(Debug)]
pub struct StringKind;

impl ValueKind for StringKind {
    const EXPECTED: &'static str = "a string";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        value.as_str().map(AttributeValue::from)
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        value.as_s().map(Value::from)
    }
}

/// `N` stored as a JSON number.
#[derive(Debug)]
pub struct NumberKind;

impl ValueKind for NumberKind {
    const EXPECTED: &'static str = "a number";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        match value {
            Value::Number(n) => Some(AttributeValue::number(n)),
            _ => None,
        }
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::N(_)).then(|| value.to_json())
    }
}

/// `B` stored as a base64 JSON string.
#[derive(Debug)]
pub struct BinaryKind;

impl ValueKind for BinaryKind {
    const EXPECTED: &'static str = "a base64 string";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        decode_base64(value).map(AttributeValue::B)
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::B(_)).then(|| value.to_json())
    }
}

/// `BOOL` stored as a JSON boolean.
#[derive(Debug)]
pub struct BooleanKind;

impl ValueKind for BooleanKind {
    const EXPECTED: &'static str = "a boolean";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        value.as_bool().map(AttributeValue::Bool)
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        match value {
            AttributeValue::Bool(b) => Some(Value::Bool(*b)),
            _ => None,
        }
    }
}

/// Epoch seconds in `N`, surfaced as an RFC 3339 string.
#[derive(Debug)]
pub struct DateKind;

impl ValueKind for DateKind {
    const EXPECTED: &'static str = "an RFC 3339 timestamp or epoch seconds";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| epoch_seconds(dt.with_timezone(&Utc))),
            Value::Number(n) => n.as_i64().map(AttributeValue::from),
            _ => None,
        }
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        let secs = value.as_n()?.parse::<i64>().ok()?;
        let dt = DateTime::from_timestamp(secs, 0)?;
        Some(Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
    }
}

/// `SS` stored as an array of strings.
#[derive(Debug)]
pub struct StringSetKind;

impl ValueKind for StringSetKind {
    const EXPECTED: &'static str = "an array of strings";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        let members = value
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()?;
        Some(AttributeValue::Ss(members))
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::Ss(_)).then(|| value.to_json())
    }
}

/// `NS` stored as an array of numbers.
#[derive(Debug)]
pub struct NumberSetKind;

impl ValueKind for NumberSetKind {
    const EXPECTED: &'static str = "an array of numbers";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        let members = value
            .as_array()?
            .iter()
            .map(|v| match v {
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(AttributeValue::Ns(members))
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::Ns(_)).then(|| value.to_json())
    }
}

/// `BS` stored as an array of base64 strings.
#[derive(Debug)]
pub struct BinarySetKind;

impl ValueKind for BinarySetKind {
    const EXPECTED: &'static str = "an array of base64 strings";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        let members = value
            .as_array()?
            .iter()
            .map(decode_base64)
            .collect::<Option<Vec<_>>>()?;
        Some(AttributeValue::Bs(members))
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::Bs(_)).then(|| value.to_json())
    }
}

/// `L` stored as an untyped array.
#[derive(Debug)]
pub struct ListKind;

impl ValueKind for ListKind {
    const EXPECTED: &'static str = "an array";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        value.is_array().then(|| AttributeValue::from_json(value))
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::L(_)).then(|| value.to_json())
    }
}

/// `M` stored as an untyped object.
#[derive(Debug)]
pub struct MapKind;

impl ValueKind for MapKind {
    const EXPECTED: &'static str = "an object";

    fn to_table(value: &Value) -> Option<AttributeValue> {
        value.is_object().then(|| AttributeValue::from_json(value))
    }

    fn to_model(value: &AttributeValue) -> Option<Value> {
        matches!(value, AttributeValue::M(_)).then(|| value.to_json())
    }
}

/// String field.
pub type FieldString = FieldValue<StringKind>;
/// Number field.
pub type FieldNumber = FieldValue<NumberKind>;
/// Binary field.
pub type FieldBinary = FieldValue<BinaryKind>;
/// Boolean field.
pub type FieldBoolean = FieldValue<BooleanKind>;
/// Timestamp field.
pub type FieldDate = FieldValue<DateKind>;
/// String set field.
pub type FieldStringSet = FieldValue<StringSetKind>;
/// Number set field.
pub type FieldNumberSet = FieldValue<NumberSetKind>;
/// Binary set field.
pub type FieldBinarySet = FieldValue<BinarySetKind>;
/// Untyped list field.
pub type FieldList = FieldValue<ListKind>;
/// Untyped map field.
pub type FieldMap = FieldValue<MapKind>;

/// A property stored as one attribute of kind `K`.
///
/// JSON `null` is stored as `NULL` regardless of kind, and empty sets are not
/// written.
pub struct FieldValue<K> {
    options: FieldOptions,
    binding: Binding,
    kind: PhantomData<fn() -> K>,
}

impl<K: ValueKind> FieldValue<K> {
    /// Field with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: FieldOptions::default(),
            binding: Binding::default(),
            kind: PhantomData,
        }
    }

    /// The field options.
    #[must_use]
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }
}

impl<K: ValueKind> Default for FieldValue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ValueKind> fmt::Debug for FieldValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValue")
            .field("kind", &std::any::type_name::<K>())
            .field("name", &self.binding.name())
            .field("options", &self.options)
            .finish()
    }
}

impl<K: ValueKind> WithOptions for FieldValue<K> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<K: ValueKind> FieldPath for FieldValue<K> {
    fn path(&self) -> Result<String, SchemaError> {
        match (&self.options.alias, self.binding.name()) {
            (Some(alias), _) => Ok(alias.clone()),
            (None, Some(name)) => Ok(name.to_owned()),
            (None, None) => Err(SchemaError::Unbound),
        }
    }
}

impl<K: ValueKind> Field for FieldValue<K> {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let value = match table.get(self.options.attribute(name)) {
            Some(AttributeValue::Null(_)) => Some(Value::Null),
            Some(value) => K::to_model(value),
            None => None,
        };
        if let Some(value) = value {
            model.insert(name.to_owned(), value);
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
        let attr = if value.is_null() {
            AttributeValue::Null(true)
        } else {
            K::to_table(&value).ok_or_else(|| FieldError::InvalidValue {
                name: name.to_owned(),
                expected: K::EXPECTED,
            })?
        };
        if is_empty_set(&attr) {
            return Ok(());
        }
        table.insert(self.options.attribute(name).to_owned(), attr);
        Ok(())
    }

    fn update_attribute(&self, name: &str) -> Option<String> {
        Some(self.options.attribute(name).to_owned())
    }

    fn to_table_update(
        &self,
        name: &str,
        model: &ModelUpdate,
        table: &mut TableUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        if self.options.hidden {
            return Ok(());
        }
        write_update(self, name, model, table, ctx)
    }

    fn validator(&self) -> Option<&dyn Validator> {
        self.options.validator.as_deref()
    }
}

/// Epoch-seconds number attribute for `instant`.
pub(crate) fn epoch_seconds(instant: DateTime<Utc>) -> AttributeValue {
    AttributeValue::from(instant.timestamp())
}

fn decode_base64(value: &Value) -> Option<bytes::Bytes> {
    base64::engine::general_purpose::STANDARD
        .decode(value.as_str()?)
        .ok()
        .map(bytes::Bytes::from)
}

fn is_empty_set(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Ss(v) | AttributeValue::Ns(v) => v.is_empty(),
        AttributeValue::Bs(v) => v.is_empty(),
        _ => false,
    }
}
