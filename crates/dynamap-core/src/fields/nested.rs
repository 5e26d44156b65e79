//! Fields whose values are mapped through a child schema.

use dynamap_model::{AttributeValue, Item};
use serde_json::Value;

use super::{
    Binding, Field, FieldOptions, ModelItem, ModelUpdate, UpdateValue, Validator, WithOptions,
    write_update,
};
use crate::context::ModelContext;
use crate::error::{FieldError, SchemaError};
use crate::expression::{TableUpdate, UpdateInput, UpdateOp};
use crate::schema::Schema;

/// An object stored as `M`, each member mapped by the child schema.
///
/// Updates with plain object data address individual members
/// (`SET parent.child = :v`) instead of replacing the whole map.
#[derive(Debug)]
pub struct FieldObject {
    schema: Schema,
    options: FieldOptions,
    binding: Binding,
}

impl FieldObject {
    /// Object mapped through `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            options: FieldOptions::default(),
            binding: Binding::default(),
        }
    }
}

impl WithOptions for FieldObject {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for FieldObject {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, ctx: &ModelContext<'_>) {
        if let Some(AttributeValue::M(members)) = table.get(self.options.attribute(name)) {
            model.insert(
                name.to_owned(),
                Value::Object(self.schema.to_model(members, ctx)),
            );
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
        let attr = match &value {
            Value::Null => AttributeValue::Null(true),
            value => object_to_table(&self.schema, name, value, ctx)?,
        };
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
        let members = match model.get(name) {
            Some(UpdateValue::Value(Value::Object(object))) => object
                .iter()
                .map(|(k, v)| (k.clone(), UpdateValue::Value(v.clone())))
                .collect(),
            Some(UpdateValue::Fields(fields)) => fields.clone(),
            _ => return write_update(self, name, model, table, ctx),
        };
        let members = self.schema.to_table_update(&members, ctx)?;
        if !members.is_empty() {
            table.insert(
                self.options.attribute(name).to_owned(),
                UpdateInput::Op(UpdateOp::map(members)),
            );
        }
        Ok(())
    }

    fn validator(&self) -> Option<&dyn Validator> {
        self.options.validator.as_deref()
    }
}

/// An array of objects stored as `L` of `M`.
#[derive(Debug)]
pub struct FieldModelList {
    schema: Schema,
    options: FieldOptions,
    binding: Binding,
}

impl FieldModelList {
    /// List whose items are mapped through `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            options: FieldOptions::default(),
            binding: Binding::default(),
        }
    }
}

impl WithOptions for FieldModelList {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for FieldModelList {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, ctx: &ModelContext<'_>) {
        if let Some(AttributeValue::L(items)) = table.get(self.options.attribute(name)) {
            let items = items
                .iter()
                .filter_map(AttributeValue::as_m)
                .map(|members| Value::Object(self.schema.to_model(members, ctx)))
                .collect();
            model.insert(name.to_owned(), Value::Array(items));
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
        let attr = match &value {
            Value::Null => AttributeValue::Null(true),
            Value::Array(items) => AttributeValue::L(
                items
                    .iter()
                    .map(|item| object_to_table(&self.schema, name, item, ctx))
                    .collect::<Result<_, _>>()?,
            ),
            _ => {
                return Err(FieldError::InvalidValue {
                    name: name.to_owned(),
                    expected: "an array of objects",
                });
            }
        };
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

/// An object of objects stored as `M` of `M`, each value mapped by the
/// child schema.
#[derive(Debug)]
pub struct FieldModelMap {
    schema: Schema,
    options: FieldOptions,
    binding: Binding,
}

impl FieldModelMap {
    /// Map whose values are mapped through `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            options: FieldOptions::default(),
            binding: Binding::default(),
        }
    }
}

impl WithOptions for FieldModelMap {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for FieldModelMap {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, ctx: &ModelContext<'_>) {
        if let Some(AttributeValue::M(entries)) = table.get(self.options.attribute(name)) {
            let entries = entries
                .iter()
                .filter_map(|(key, value)| {
                    let members = value.as_m()?;
                    Some((key.clone(), Value::Object(self.schema.to_model(members, ctx))))
                })
                .collect();
            model.insert(name.to_owned(), Value::Object(entries));
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
        let attr = match &value {
            Value::Null => AttributeValue::Null(true),
            Value::Object(entries) => AttributeValue::M(
                entries
                    .iter()
                    .map(|(key, item)| {
                        Ok((key.clone(), object_to_table(&self.schema, name, item, ctx)?))
                    })
                    .collect::<Result<_, FieldError>>()?,
            ),
            _ => {
                return Err(FieldError::InvalidValue {
                    name: name.to_owned(),
                    expected: "an object of objects",
                });
            }
        };
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

fn object_to_table(
    schema: &Schema,
    name: &str,
    value: &Value,
    ctx: &mut ModelContext<'_>,
) -> Result<AttributeValue, FieldError> {
    let Value::Object(object) = value else {
        return Err(FieldError::InvalidValue {
            name: name.to_owned(),
            expected: "an object",
        });
    };
    Ok(AttributeValue::M(schema.to_table(object, ctx)?))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::context::Action;
    use crate::expression::{ExpressionAttributes, compile_update};
    use crate::fields::Fields;
    use crate::fields::test_support::ctx;

    fn address() -> Schema {
        Schema::builder("Address")
            .field("city", Fields::string().alias("c"))
            .field("zip", Fields::string().required())
            .build()
            .unwrap()
    }

    fn item(value: Value) -> ModelItem {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_should_map_object_through_child_schema() {
        let field = FieldObject::new(address());
        let model = item(json!({"home": {"city": "Oslo", "zip": "0150"}}));
        let mut table = Item::new();
        field.to_table("home", &model, &mut table, &mut ctx(Action::Put)).unwrap();
        let members = table["home"].as_m().unwrap();
        assert_eq!(members["c"], AttributeValue::from("Oslo"));

        let mut back = ModelItem::new();
        field.to_model("home", &table, &mut back, &ctx(Action::Get));
        assert_eq!(back["home"], json!({"city": "Oslo", "zip": "0150"}));
    }

    #[test]
    fn test_should_enforce_child_required_fields() {
        let field = FieldObject::new(address());
        let model = item(json!({"home": {"city": "Oslo"}}));
        let err = field
            .to_table("home", &model, &mut Item::new(), &mut ctx(Action::Put))
            .unwrap_err();
        assert!(matches!(err, FieldError::Required { name } if name == "zip"));
    }

    #[test]
    fn test_should_update_object_members_by_path() {
        let field = FieldObject::new(address());
        let update = ModelUpdate::from([(
            "home".to_owned(),
            UpdateValue::Fields(IndexMap::from([
                ("city".to_owned(), UpdateValue::Value(json!("Bergen"))),
                ("zip".to_owned(), UpdateValue::Op(UpdateOp::del())),
            ])),
        )]);
        let mut table = TableUpdate::new();
        field
            .to_table_update("home", &update, &mut table, &mut ctx(Action::Update))
            .unwrap();
        let mut attrs = ExpressionAttributes::new();
        let text = compile_update(&table, &mut attrs).unwrap();
        assert_eq!(text, "SET #n0.#n1 = :v0 REMOVE #n0.#n2");
        assert_eq!(attrs.names()["#n1"], "c");
    }

    #[test]
    fn test_should_map_each_list_item() {
        let field = FieldModelList::new(address());
        let model = item(json!({"homes": [{"city": "A", "zip": "1"}, {"city": "B", "zip": "2"}]}));
        let mut table = Item::new();
        field.to_table("homes", &model, &mut table, &mut ctx(Action::Put)).unwrap();
        assert_eq!(table["homes"].as_l().unwrap().len(), 2);

        let mut back = ModelItem::new();
        field.to_model("homes", &table, &mut back, &ctx(Action::Get));
        assert_eq!(back["homes"][1]["city"], json!("B"));
    }

    #[test]
    fn test_should_replace_whole_list_on_update() {
        let field = FieldModelList::new(address());
        let update = ModelUpdate::from([(
            "homes".to_owned(),
            UpdateValue::Value(json!([{"city": "A", "zip": "1"}])),
        )]);
        let mut table = TableUpdate::new();
        field
            .to_table_update("homes", &update, &mut table, &mut ctx(Action::Update))
            .unwrap();
        assert!(matches!(&table["homes"], UpdateInput::Value(AttributeValue::L(l)) if l.len() == 1));
    }

    #[test]
    fn test_should_map_each_map_value() {
        let field = FieldModelMap::new(address());
        let model = item(json!({"sites": {"hq": {"city": "A", "zip": "1"}}}));
        let mut table = Item::new();
        field.to_table("sites", &model, &mut table, &mut ctx(Action::Put)).unwrap();
        let hq = table["sites"].as_m().unwrap()["hq"].as_m().unwrap();
        assert_eq!(hq["c"], AttributeValue::from("A"));

        let mut back = ModelItem::new();
        field.to_model("sites", &table, &mut back, &ctx(Action::Get));
        assert_eq!(back["sites"]["hq"]["zip"], json!("1"));
    }

    #[test]
    fn test_should_skip_hidden_list_and_map_updates() {
        let list = FieldModelList::new(address()).hidden();
        let map = FieldModelMap::new(address()).hidden();
        let update = ModelUpdate::from([
            ("homes".to_owned(), UpdateValue::Op(UpdateOp::del())),
            ("sites".to_owned(), UpdateValue::Op(UpdateOp::del())),
        ]);
        let mut table = TableUpdate::new();
        list
            .to_table_update("homes", &update, &mut table, &mut ctx(Action::Update))
            .unwrap();
        map
            .to_table_update("sites", &update, &mut table, &mut ctx(Action::Update))
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_should_pass_list_ops_through_when_visible() {
        let field = FieldModelList::new(address());
        let update = ModelUpdate::from([("homes".to_owned(), UpdateValue::Op(UpdateOp::del()))]);
        let mut table = TableUpdate::new();
        field
            .to_table_update("homes", &update, &mut table, &mut ctx(Action::Update))
            .unwrap();
        let mut attrs = ExpressionAttributes::new();
        assert_eq!(compile_update(&table, &mut attrs).unwrap(), "REMOVE #n0");
    }
}
