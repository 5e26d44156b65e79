#[cfg(test)]
mod tests {
    use dynamap_core::fields::{Fields, WithOptions};
    use dynamap_core::{Model, ModelError, ModelOptions, ModelUpdate, Schema, UpdateValue};
    use dynamap_model::AttributeValue;
    use serde_json::json;

    use crate::{MemoryTransport, fixed_clock, main_table, model_item};

    const NOW: &str = "1700000000";

    fn account_model() -> Model {
        let schema = Schema::builder("Account")
            .field("id", Fields::split(["P", "S"]))
            .field("type", Fields::model_type().alias("T"))
            .field("name", Fields::string().required())
            .field("plan", Fields::string().default_value("free"))
            .field("secret", Fields::hidden())
            .field("created", Fields::created_date().alias("C"))
            .field("updated", Fields::updated_date().alias("U"))
            .field("rev", Fields::revision().match_on_write())
            .build()
            .unwrap();
        Model::new(schema, main_table()).with_clock(fixed_clock())
    }

    fn update<const N: usize>(entries: [(&str, UpdateValue); N]) -> ModelUpdate {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect()
    }

    #[tokio::test]
    async fn test_should_fill_computed_attributes_on_put() {
        let params = account_model()
            .put_params(
                &model_item(json!({"id": "acme.a1", "name": "Acme", "secret": "s3cr3t", "rev": 4})),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(params.item["T"], AttributeValue::from("Account"));
        assert_eq!(params.item["plan"], AttributeValue::from("free"));
        assert_eq!(params.item["C"], AttributeValue::N(NOW.to_owned()));
        assert_eq!(params.item["U"], AttributeValue::N(NOW.to_owned()));
        assert_eq!(params.item["rev"], AttributeValue::from(0));
        assert!(!params.item.contains_key("secret"));
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("attribute_not_exists(#n0) OR #n0 = :v0")
        );
        assert_eq!(params.expression_attribute_names["#n0"], "rev");
        assert_eq!(params.expression_attribute_values[":v0"], AttributeValue::from(4));
    }

    #[tokio::test]
    async fn test_should_require_name_on_put_only() {
        let model = account_model();
        let err = model
            .put_params(&model_item(json!({"id": "acme.a1"})), &ModelOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Field(_)));
        assert_eq!(err.to_string(), "field 'name' is required");

        let params = model
            .update_params(&update([("id", json!("acme.a1").into())]), &ModelOptions::default())
            .await
            .unwrap();
        assert!(!params.expression_attribute_names.values().any(|n| n == "name"));
    }

    #[tokio::test]
    async fn test_should_compile_computed_attributes_on_update() {
        let params = account_model()
            .update_params(
                &update([("id", json!("acme.a1").into()), ("rev", json!(3).into())]),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            params.update_expression.as_deref(),
            Some(
                "SET #n0 = :v0, #n1 = if_not_exists(#n1, :v1), #n2 = :v2, #n3 = #n3 + :v3"
            )
        );
        assert_eq!(params.expression_attribute_names["#n0"], "T");
        assert_eq!(params.expression_attribute_names["#n1"], "C");
        assert_eq!(params.expression_attribute_names["#n2"], "U");
        assert_eq!(params.expression_attribute_names["#n3"], "rev");
        assert_eq!(params.expression_attribute_values[":v1"], AttributeValue::N(NOW.to_owned()));
        assert_eq!(params.expression_attribute_values[":v3"], AttributeValue::from(1));
        assert_eq!(params.condition_expression.as_deref(), Some("#n3 = :v4"));
        assert_eq!(params.expression_attribute_values[":v4"], AttributeValue::from(3));
        assert!(!params.expression_attribute_names.values().any(|n| n == "plan"));
    }

    #[tokio::test]
    async fn test_should_read_computed_attributes_back() {
        let model = account_model();
        let transport = MemoryTransport::new(&main_table());
        model
            .create(
                &transport,
                &model_item(json!({"id": "acme.a1", "name": "Acme"})),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        let fetched = model
            .get(&transport, &model_item(json!({"id": "acme.a1"})), &ModelOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(fetched),
            json!({
                "id": "acme.a1",
                "type": "Account",
                "name": "Acme",
                "plan": "free",
                "created": "2023-11-14T22:13:20Z",
                "updated": "2023-11-14T22:13:20Z",
                "rev": 0,
            })
        );
    }

    #[tokio::test]
    async fn test_should_write_only_key_for_get_and_delete() {
        let model = account_model();
        let key = model_item(json!({"id": "acme.a1", "rev": 2}));
        let get = model.get_params(&key, &ModelOptions::default()).unwrap();
        assert_eq!(get.key.len(), 2);

        let delete = model.delete_params(&key, &ModelOptions::default()).unwrap();
        assert!(delete.condition_expression.is_none());
    }
}
