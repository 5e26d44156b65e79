#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynamap_core::fields::{Fields, Incrementable, SetOps, WithOptions};
    use dynamap_core::{Model, ModelError, ModelOptions, ModelUpdate, Schema, UpdateOp, UpdateValue};
    use dynamap_model::AttributeValue;
    use dynamap_model::types::ReturnValue;
    use serde_json::json;

    use crate::{MemoryTransport, Request, fixed_clock, main_table, user_model};

    fn update<const N: usize>(entries: [(&str, UpdateValue); N]) -> ModelUpdate {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect()
    }

    fn profile_model() -> Model {
        let address = Schema::builder("Address")
            .field("city", Fields::string())
            .field("zip", Fields::string())
            .build()
            .unwrap();
        let schema = Schema::builder("Profile")
            .field("id", Fields::split(["P", "S"]))
            .field("address", Fields::object(address).alias("addr"))
            .build()
            .unwrap();
        Model::new(schema, main_table()).with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn test_should_compile_increment_without_touching_key() {
        let params = user_model()
            .update_params(
                &update([
                    ("id", json!("a.b").into()),
                    ("age", UpdateOp::inc(1).into()),
                ]),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(params.update_expression.as_deref(), Some("SET #n0 = #n0 + :v0"));
        assert_eq!(params.expression_attribute_names.len(), 1);
        assert_eq!(params.expression_attribute_names["#n0"], "age");
        assert_eq!(params.expression_attribute_values[":v0"], AttributeValue::from(1));
        assert_eq!(params.key.len(), 2);
        assert!(params.condition_expression.is_none());
    }

    #[tokio::test]
    async fn test_should_mix_literals_and_operations() {
        let age = Arc::new(Fields::number());
        let tags = Arc::new(Fields::string_set());
        let schema = Schema::builder("User")
            .field("id", Fields::split(["P", "S"]))
            .field("name", Fields::string())
            .shared("age", age.clone())
            .shared("tags", tags.clone())
            .build()
            .unwrap();
        let model = Model::new(schema, main_table());

        let params = model
            .update_params(
                &update([
                    ("id", json!("a.b").into()),
                    ("name", json!("Ada").into()),
                    ("age", age.dec(2).into()),
                    ("tags", tags.remove(vec!["old".to_owned()]).into()),
                ]),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            params.update_expression.as_deref(),
            Some("SET #n0 = :v0, #n1 = #n1 - :v1 DELETE #n2 :v2")
        );
        assert_eq!(params.expression_attribute_names["#n2"], "tags");
        assert_eq!(
            params.expression_attribute_values[":v2"],
            AttributeValue::Ss(vec!["old".to_owned()])
        );
    }

    #[tokio::test]
    async fn test_should_reject_operation_on_split_key() {
        let err = user_model()
            .update_params(
                &update([("id", UpdateOp::del().into())]),
                &ModelOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Field(_)));
        assert_eq!(err.to_string(), "field 'id' does not support update operations");
    }

    #[tokio::test]
    async fn test_should_require_key_in_update() {
        let err = user_model()
            .update_params(&update([("name", json!("Ada").into())]), &ModelOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingKey { attribute } if attribute == "P"));
    }

    #[tokio::test]
    async fn test_should_update_nested_object_members_by_path() {
        let params = profile_model()
            .update_params(
                &update([
                    ("id", json!("a.b").into()),
                    ("address", json!({"city": "Paris"}).into()),
                ]),
                &ModelOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(params.update_expression.as_deref(), Some("SET #n0.#n1 = :v0"));
        assert_eq!(params.expression_attribute_names["#n0"], "addr");
        assert_eq!(params.expression_attribute_names["#n1"], "city");
        assert_eq!(params.expression_attribute_values[":v0"], AttributeValue::from("Paris"));
    }

    #[tokio::test]
    async fn test_should_remove_nested_member_with_operation() {
        let members = update([("zip", UpdateOp::del().into())]);
        let params = profile_model()
            .update_params(
                &update([("id", json!("a.b").into()), ("address", members.into())]),
                &ModelOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(params.update_expression.as_deref(), Some("REMOVE #n0.#n1"));
        assert_eq!(params.expression_attribute_names["#n1"], "zip");
    }

    #[tokio::test]
    async fn test_should_send_update_through_transport() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        let options = ModelOptions::default().return_values(ReturnValue::AllNew);
        let returned = model
            .update(
                &transport,
                &update([("id", json!("a.b").into()), ("name", json!("Ada").into())]),
                &options,
            )
            .await
            .unwrap();
        assert!(returned.is_none());

        let requests = transport.requests();
        let Request::Update(input) = &requests[0] else {
            panic!("expected an update request");
        };
        assert_eq!(input.table_name, "main");
        assert_eq!(input.update_expression.as_deref(), Some("SET #n0 = :v0"));
        assert_eq!(input.return_values, Some(ReturnValue::AllNew));
    }
}
