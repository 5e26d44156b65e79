#[cfg(test)]
mod tests {
    use dynamap_core::{ModelError, ModelOptions};
    use dynamap_model::types::ReturnValue;
    use dynamap_model::{AttributeValue, DynamoDBError, DynamoDBErrorCode};
    use serde_json::json;

    use crate::{MemoryTransport, Request, main_table, model_item, user_model};

    #[tokio::test]
    async fn test_should_put_item_without_condition() {
        let model = user_model();
        let params = model
            .put_params(&model_item(json!({"id": "a.b", "name": "x"})), &ModelOptions::default())
            .await
            .unwrap();

        assert_eq!(params.table_name, "main");
        assert_eq!(params.item.len(), 3);
        assert_eq!(params.item["P"], AttributeValue::from("a"));
        assert_eq!(params.item["S"], AttributeValue::from("b"));
        assert_eq!(params.item["name"], AttributeValue::from("x"));
        assert!(params.condition_expression.is_none());
        assert!(params.expression_attribute_names.is_empty());
        assert!(params.expression_attribute_values.is_empty());
    }

    #[tokio::test]
    async fn test_should_skip_empty_sets_and_keep_nulls() {
        let params = user_model()
            .put_params(
                &model_item(json!({"id": "a.b", "name": null, "tags": []})),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(params.item["name"], AttributeValue::Null(true));
        assert!(!params.item.contains_key("tags"));
    }

    #[tokio::test]
    async fn test_should_fold_extra_id_parts_into_partition_key() {
        let params = user_model()
            .put_params(&model_item(json!({"id": "a.b.c.d"})), &ModelOptions::default())
            .await
            .unwrap();
        assert_eq!(params.item["P"], AttributeValue::from("a.b.c"));
        assert_eq!(params.item["S"], AttributeValue::from("d"));
    }

    #[tokio::test]
    async fn test_should_round_trip_through_transport() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        let user = model_item(json!({
            "id": "acme.u1",
            "name": "Ada",
            "age": 36,
            "tags": ["admin"],
            "team": "core",
        }));

        let returned = model.put(&transport, &user, &ModelOptions::default()).await.unwrap();
        assert!(returned.is_none());
        let table_key = main_table().key("acme".into(), Some("u1".into()));
        let stored = transport.item(&table_key).unwrap();
        assert_eq!(stored["G0P"], AttributeValue::from("core"));

        let key = model_item(json!({"id": "acme.u1"}));
        let fetched = model.get(&transport, &key, &ModelOptions::default()).await.unwrap();
        assert_eq!(fetched, Some(user));
        assert!(matches!(
            &transport.requests()[1],
            Request::Get(input) if input.key == table_key && input.consistent_read.is_none()
        ));
    }

    #[tokio::test]
    async fn test_should_return_old_item_when_requested() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        let first = model_item(json!({"id": "acme.u1", "name": "Ada"}));
        model.put(&transport, &first, &ModelOptions::default()).await.unwrap();

        let options = ModelOptions::default().return_values(ReturnValue::AllOld);
        let second = model_item(json!({"id": "acme.u1", "name": "Grace"}));
        let old = model.put(&transport, &second, &options).await.unwrap();
        assert_eq!(old, Some(first));
        assert_eq!(transport.items().len(), 1);

        let key = model_item(json!({"id": "acme.u1"}));
        let deleted = model.delete(&transport, &key, &options).await.unwrap();
        assert_eq!(deleted, Some(second));
        assert!(transport.items().is_empty());
    }

    #[tokio::test]
    async fn test_should_guard_create_on_partition_key() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        let user = model_item(json!({"id": "acme.u1", "name": "Ada"}));
        model.create(&transport, &user, &ModelOptions::default()).await.unwrap();

        let Request::Put(input) = &transport.requests()[0] else {
            panic!("expected a put request");
        };
        assert_eq!(input.condition_expression.as_deref(), Some("attribute_not_exists(#n0)"));
        assert_eq!(input.expression_attribute_names["#n0"], "P");
    }

    #[tokio::test]
    async fn test_should_surface_transport_errors() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        transport.fail_next(DynamoDBError::conditional_check_failed("item exists"));

        let user = model_item(json!({"id": "acme.u1"}));
        let err = model
            .create(&transport, &user, &ModelOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            ModelError::Transport(e) if e.code == DynamoDBErrorCode::ConditionalCheckFailedException
        ));
        assert!(transport.items().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_value_of_wrong_shape() {
        let err = user_model()
            .put_params(&model_item(json!({"id": "a.b", "age": "old"})), &ModelOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "field 'age' expects a number");
    }

    #[tokio::test]
    async fn test_should_require_full_key_for_get() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        let err = model
            .get(&transport, &model_item(json!({"id": "acme"})), &ModelOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingKey { attribute } if attribute == "S"));
        assert!(transport.requests().is_empty());
    }
}
