//! Field mapping between model properties and table attributes.
//!
//! Every field implements the three-way [`Field`] contract:
//!
//! - `to_model`: table item -> model item, total and non-failing.
//! - `to_table`: model item -> table item, applying defaults, `hidden` and
//!   `required`, and possibly queueing conditions on the context.
//! - `to_table_update`: model update -> table update, accepting literal values
//!   or [`UpdateOp`]s.
//!
//! Scalar and container fields share one [`FieldOptions`] base behavior. What
//! a field can express in conditions or updates is added through the traits in
//! [`capability`], implemented only for the value kinds that support them.

pub mod capability;
pub mod composite;
pub mod computed;
pub mod nested;
pub mod split;
pub mod value;

use std::fmt;
use std::sync::{Arc, OnceLock};

use dynamap_model::Item;
use indexmap::IndexMap;
use serde_json::Value;

pub use capability::{
    Comparable, FieldPath, Incrementable, ListOps, SetOps, Sizeable, StringOps,
};
pub use composite::{FieldComposite, FieldCompositeSlot, FieldNamedComposite, NamedSlots};
pub use computed::{FieldCreatedDate, FieldHidden, FieldRevision, FieldType, FieldUpdatedDate};
pub use nested::{FieldModelList, FieldModelMap, FieldObject};
pub use split::FieldSplit;
pub use value::{
    FieldBinary, FieldBinarySet, FieldBoolean, FieldDate, FieldList, FieldMap, FieldNumber,
    FieldNumberSet, FieldString, FieldStringSet, FieldValue, ValueKind,
};

use crate::context::{Action, ModelContext};
use crate::error::{FieldError, SchemaError, ValidationError};
use crate::expression::{TableUpdate, UpdateInput, UpdateOp};
use crate::schema::Schema;

/// Model-side item: property name -> JSON value.
pub type ModelItem = serde_json::Map<String, Value>;

/// Model-side update: property name -> update value, in caller order.
pub type ModelUpdate = IndexMap<String, UpdateValue>;

/// The update requested for one model property.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Replace with a literal value.
    Value(Value),
    /// Apply an update operation verbatim.
    Op(UpdateOp),
    /// Plain nested data whose members may themselves be operations.
    Fields(ModelUpdate),
}

impl From<Value> for UpdateValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<UpdateOp> for UpdateValue {
    fn from(op: UpdateOp) -> Self {
        Self::Op(op)
    }
}

impl From<ModelUpdate> for UpdateValue {
    fn from(fields: ModelUpdate) -> Self {
        Self::Fields(fields)
    }
}

/// The mapping contract every schema field implements.
pub trait Field: Send + Sync + fmt::Debug {
    /// Bind the field to its logical name within `model`. Called once by the
    /// schema builder.
    fn init(&self, name: &str, model: &str) -> Result<(), SchemaError>;

    /// Project table attributes onto the model property `name`. A missing
    /// attribute leaves the property absent.
    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, ctx: &ModelContext<'_>);

    /// Write the model property `name` into `table`.
    fn to_table(
        &self,
        name: &str,
        model: &ModelItem,
        table: &mut Item,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError>;

    /// Attribute an update operation on this field targets, or `None` when
    /// the field cannot take operations.
    fn update_attribute(&self, name: &str) -> Option<String> {
        Some(name.to_owned())
    }

    /// Write the update for model property `name` into `table`.
    ///
    /// Literal values go through [`Field::to_table`] and become `SET`s;
    /// operations are passed through to [`Field::update_attribute`].
    fn to_table_update(
        &self,
        name: &str,
        model: &ModelUpdate,
        table: &mut TableUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        write_update(self, name, model, table, ctx)
    }

    /// Validator run before the traversal, if any.
    fn validator(&self) -> Option<&dyn Validator> {
        None
    }
}

/// Update mapping shared by most fields: literals are written through
/// [`Field::to_table`], operations target [`Field::update_attribute`].
pub fn write_update<F: Field + ?Sized>(
    field: &F,
    name: &str,
    model: &ModelUpdate,
    table: &mut TableUpdate,
    ctx: &mut ModelContext<'_>,
) -> Result<(), FieldError> {
    match model.get(name) {
        None => Ok(()),
        Some(UpdateValue::Value(value)) => {
            let mut item = ModelItem::new();
            item.insert(name.to_owned(), value.clone());
            let mut out = Item::new();
            field.to_table(name, &item, &mut out, ctx)?;
            let mut entries: Vec<_> = out.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            table.extend(
                entries
                    .into_iter()
                    .map(|(attr, value)| (attr, UpdateInput::Value(value))),
            );
            Ok(())
        }
        Some(UpdateValue::Op(op)) => {
            let attr = field
                .update_attribute(name)
                .ok_or_else(|| FieldError::UnsupportedUpdate {
                    name: name.to_owned(),
                })?;
            table.insert(attr, UpdateInput::Op(op.clone()));
            Ok(())
        }
        Some(UpdateValue::Fields(_)) => Err(FieldError::InvalidValue {
            name: name.to_owned(),
            expected: "a literal value or an update operation",
        }),
    }
}

/// Pluggable, possibly asynchronous value check.
#[async_trait::async_trait]
pub trait Validator: Send + Sync {
    /// Accept or reject `value` for the property `name`.
    async fn validate(&self, name: &str, value: &Value, action: Action)
    -> Result<(), ValidationError>;
}

/// Adapter turning a synchronous closure into a [`Validator`].
pub struct FnValidator<F>(pub F);

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnValidator(<fn>)")
    }
}

#[async_trait::async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&str, &Value) -> Result<(), ValidationError> + Send + Sync,
{
    async fn validate(
        &self,
        name: &str,
        value: &Value,
        _action: Action,
    ) -> Result<(), ValidationError> {
        (self.0)(name, value)
    }
}

/// Context-aware default producer.
pub type DefaultFn = Arc<dyn Fn(&str, &ModelContext<'_>) -> Option<Value> + Send + Sync>;

/// Value used when the model property is absent.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value.
    Value(Value),
    /// Computed from the property name and the call context.
    With(DefaultFn),
}

impl FieldDefault {
    fn resolve(&self, name: &str, ctx: &ModelContext<'_>) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value.clone()),
            Self::With(f) => f(name, ctx),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

/// Options shared by value, container and split fields.
#[derive(Clone, Default)]
pub struct FieldOptions {
    /// Table attribute name when it differs from the property name.
    pub alias: Option<String>,
    /// Value written when the property is absent.
    pub default: Option<FieldDefault>,
    /// Absence on a put-family write is an error.
    pub required: bool,
    /// Never written to the table.
    pub hidden: bool,
    /// Validator run before the traversal.
    pub validator: Option<Arc<dyn Validator>>,
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("alias", &self.alias)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("hidden", &self.hidden)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl FieldOptions {
    /// Table attribute for the property `name`.
    #[must_use]
    pub fn attribute<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias.as_deref().unwrap_or(name)
    }

    /// Value to write for `name`, or `None` to write nothing.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Required`] when a required property is absent,
    /// has no default, and the action writes a whole item.
    pub fn resolve(
        &self,
        name: &str,
        model: &ModelItem,
        ctx: &ModelContext<'_>,
    ) -> Result<Option<Value>, FieldError> {
        if self.hidden {
            return Ok(None);
        }
        let value = match model.get(name) {
            Some(value) => Some(value.clone()),
            None => self.default.as_ref().and_then(|d| d.resolve(name, ctx)),
        };
        if value.is_none() && self.required && ctx.action.is_put() {
            return Err(FieldError::Required {
                name: name.to_owned(),
            });
        }
        Ok(value)
    }
}

/// Builder methods for fields carrying [`FieldOptions`].
pub trait WithOptions: Sized {
    /// Mutable access to the options.
    fn options_mut(&mut self) -> &mut FieldOptions;

    /// Store under a different table attribute name.
    #[must_use]
    fn alias(mut self, alias: impl Into<String>) -> Self {
        self.options_mut().alias = Some(alias.into());
        self
    }

    /// Write `value` when the property is absent.
    #[must_use]
    fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Compute the default from the property name and call context.
    #[must_use]
    fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ModelContext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.options_mut().default = Some(FieldDefault::With(Arc::new(f)));
        self
    }

    /// Reject put-family writes without a value.
    #[must_use]
    fn required(mut self) -> Self {
        self.options_mut().required = true;
        self
    }

    /// Never write this property.
    #[must_use]
    fn hidden(mut self) -> Self {
        self.options_mut().hidden = true;
        self
    }

    /// Attach a validator.
    #[must_use]
    fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.options_mut().validator = Some(Arc::new(validator));
        self
    }

    /// Attach a synchronous validation closure.
    #[must_use]
    fn validate_with<F>(self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.with_validator(FnValidator(f))
    }
}

/// Write-once identity of a field.
#[derive(Debug, Default)]
pub struct Binding(OnceLock<String>);

impl Binding {
    /// Bind `name`; a second bind is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::AlreadyInitialized`] if already bound.
    pub fn bind(&self, name: &str) -> Result<(), SchemaError> {
        self.0
            .set(name.to_owned())
            .map_err(|_| SchemaError::AlreadyInitialized {
                existing: self.0.get().cloned().unwrap_or_default(),
                name: name.to_owned(),
            })
    }

    /// The bound name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }
}

/// Constructors for every field kind.
#[derive(Debug)]
pub struct Fields;

impl Fields {
    /// String property stored as `S`.
    #[must_use]
    pub fn string() -> FieldString {
        FieldValue::new()
    }

    /// Number property stored as `N`.
    #[must_use]
    pub fn number() -> FieldNumber {
        FieldValue::new()
    }

    /// Base64 string property stored as `B`.
    #[must_use]
    pub fn binary() -> FieldBinary {
        FieldValue::new()
    }

    /// Boolean property stored as `BOOL`.
    #[must_use]
    pub fn boolean() -> FieldBoolean {
        FieldValue::new()
    }

    /// RFC 3339 timestamp property stored as epoch seconds.
    #[must_use]
    pub fn date() -> FieldDate {
        FieldValue::new()
    }

    /// Array of strings stored as `SS`.
    #[must_use]
    pub fn string_set() -> FieldStringSet {
        FieldValue::new()
    }

    /// Array of numbers stored as `NS`.
    #[must_use]
    pub fn number_set() -> FieldNumberSet {
        FieldValue::new()
    }

    /// Array of base64 strings stored as `BS`.
    #[must_use]
    pub fn binary_set() -> FieldBinarySet {
        FieldValue::new()
    }

    /// Untyped array stored as `L`.
    #[must_use]
    pub fn list() -> FieldList {
        FieldValue::new()
    }

    /// Untyped object stored as `M`.
    #[must_use]
    pub fn map() -> FieldMap {
        FieldValue::new()
    }

    /// Nested object mapped through `schema`.
    #[must_use]
    pub fn object(schema: Schema) -> FieldObject {
        FieldObject::new(schema)
    }

    /// Array of objects, each mapped through `schema`.
    #[must_use]
    pub fn model_list(schema: Schema) -> FieldModelList {
        FieldModelList::new(schema)
    }

    /// Object of objects, each value mapped through `schema`.
    #[must_use]
    pub fn model_map(schema: Schema) -> FieldModelMap {
        FieldModelMap::new(schema)
    }

    /// One delimited property split across `attributes`, default delimiter `.`.
    #[must_use]
    pub fn split<I, S>(attributes: I) -> FieldSplit
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSplit::new(attributes)
    }

    /// `count` positional slots packed into the attribute `alias`.
    #[must_use]
    pub fn composite(alias: impl Into<String>, count: usize) -> FieldComposite {
        FieldComposite::new(alias, count)
    }

    /// Named slots packed into the attribute `alias`, in the given order.
    #[must_use]
    pub fn composite_named<I, S>(alias: impl Into<String>, slots: I) -> FieldNamedComposite
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldNamedComposite::new(alias, slots)
    }

    /// Property that is never read or written.
    #[must_use]
    pub fn hidden() -> FieldHidden {
        FieldHidden::default()
    }

    /// Stores the model name.
    #[must_use]
    pub fn model_type() -> FieldType {
        FieldType::default()
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_date() -> FieldCreatedDate {
        FieldCreatedDate::default()
    }

    /// Last-write timestamp.
    #[must_use]
    pub fn updated_date() -> FieldUpdatedDate {
        FieldUpdatedDate::default()
    }

    /// Revision counter starting at `0`.
    #[must_use]
    pub fn revision() -> FieldRevision {
        FieldRevision::default()
    }
}
