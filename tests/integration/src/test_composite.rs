#[cfg(test)]
mod tests {
    use dynamap_core::fields::{Fields, WithOptions};
    use dynamap_core::{
        KeyCondition, KeyConditions, Model, ModelOptions, QueryOptions, Schema, SchemaError,
    };
    use dynamap_model::AttributeValue;
    use serde_json::json;

    use crate::{MemoryTransport, main_table, model_item};

    fn member_model() -> Model {
        let sort = Fields::composite_named("G0S", ["role", "name"]).slots();
        let schema = Schema::builder("Member")
            .field("id", Fields::split(["P", "S"]))
            .field("team", Fields::string().alias("G0P"))
            .field("name", sort.slot("name").unwrap())
            .field("role", sort.slot("role").unwrap())
            .build()
            .unwrap();
        Model::new(schema, main_table())
    }

    #[tokio::test]
    async fn test_should_pack_index_sort_key_in_slot_order() {
        let params = member_model()
            .put_params(
                &model_item(json!({"id": "acme.m1", "team": "core", "name": "Ada", "role": "admin"})),
                &ModelOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(params.item["G0S"], AttributeValue::from("admin.Ada"));
        assert!(!params.item.contains_key("name"));
        assert!(!params.item.contains_key("role"));
    }

    #[tokio::test]
    async fn test_should_skip_composite_when_a_slot_is_missing() {
        let params = member_model()
            .put_params(
                &model_item(json!({"id": "acme.m1", "team": "core", "name": "Ada"})),
                &ModelOptions::default(),
            )
            .await
            .unwrap();
        assert!(!params.item.contains_key("G0S"));
    }

    #[tokio::test]
    async fn test_should_query_by_composite_prefix_and_unpack_slots() {
        let model = member_model();
        let transport = MemoryTransport::new(&main_table());
        let member = model_item(json!({"id": "acme.m1", "team": "core", "name": "Ada", "role": "admin"}));
        model.put(&transport, &member, &ModelOptions::default()).await.unwrap();

        let conditions = KeyConditions::from([
            ("G0P".to_owned(), KeyCondition::eq("core")),
            ("G0S".to_owned(), KeyCondition::begins_with("admin.")),
        ]);
        let options = QueryOptions {
            index: Some("gsi0".to_owned()),
            ..Default::default()
        };
        let result = model.query(&transport, &conditions, options).await.unwrap();
        assert_eq!(result.items, vec![member]);
    }

    #[test]
    fn test_should_reject_undeclared_slot() {
        let slots = Fields::composite_named("G0S", ["role", "name"]).slots();
        assert!(matches!(
            slots.slot("email"),
            Err(SchemaError::UnknownSlot { slot, .. }) if slot == "email"
        ));
    }
}
