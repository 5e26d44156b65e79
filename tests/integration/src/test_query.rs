#[cfg(test)]
mod tests {
    use dynamap_core::{Condition, KeyCondition, KeyConditions, ModelError, ModelOptions, QueryOptions};
    use dynamap_model::AttributeValue;
    use serde_json::json;

    use crate::{MemoryTransport, Request, main_table, model_item, user_model};

    fn conditions<const N: usize>(entries: [(&str, KeyCondition); N]) -> KeyConditions {
        entries
            .into_iter()
            .map(|(name, condition)| (name.to_owned(), condition))
            .collect()
    }

    #[tokio::test]
    async fn test_should_query_index_and_map_items() {
        let model = user_model();
        let transport = MemoryTransport::new(&main_table());
        let users = [
            ("acme.u1", "Ada", "core"),
            ("acme.u2", "Grace", "core"),
            ("acme.u3", "Linus", "infra"),
        ];
        for (id, name, team) in users {
            let user = model_item(json!({"id": id, "name": name, "team": team}));
            model.put(&transport, &user, &ModelOptions::default()).await.unwrap();
        }

        let options = QueryOptions {
            index: Some("gsi0".to_owned()),
            filter: Some(Condition::exists("name")),
            ..Default::default()
        };
        let result = model
            .query(&transport, &conditions([("G0P", KeyCondition::eq("core"))]), options)
            .await
            .unwrap();

        let names: Vec<_> = result.items.iter().map(|item| item["name"].clone()).collect();
        assert_eq!(names, vec![json!("Ada"), json!("Grace")]);
        assert_eq!(result.items[0]["id"], json!("acme.u1"));
        assert!(result.last_evaluated_key.is_none());

        let requests = transport.requests();
        let Some(Request::Query(input)) = requests.last() else {
            panic!("expected a query request");
        };
        assert_eq!(input.index_name.as_deref(), Some("gsi0"));
        assert_eq!(input.key_condition_expression, "#n0 = :v0");
        assert_eq!(input.filter_expression.as_deref(), Some("attribute_exists(#n1)"));
        assert_eq!(input.expression_attribute_names["#n0"], "G0P");
    }

    #[test]
    fn test_should_compile_sort_key_condition_on_table() {
        let params = user_model()
            .query_params(
                &conditions([
                    ("S", KeyCondition::begins_with("u")),
                    ("P", KeyCondition::eq("acme")),
                ]),
                QueryOptions {
                    scan_index_forward: Some(false),
                    limit: Some(25),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(params.table_name, "main");
        assert!(params.index_name.is_none());
        assert_eq!(params.key_condition_expression, "#n0 = :v0 AND begins_with(#n1, :v1)");
        assert_eq!(params.expression_attribute_values[":v1"], AttributeValue::from("u"));
        assert_eq!(params.scan_index_forward, Some(false));
        assert_eq!(params.limit, Some(25));
    }

    #[test]
    fn test_should_reject_range_on_partition_key() {
        let err = user_model()
            .query_params(
                &conditions([("P", KeyCondition::begins_with("ac"))]),
                QueryOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::Expression(_)));
        assert_eq!(
            err.to_string(),
            "key attribute 'P' does not support 'begins_with', only '=' is allowed"
        );
    }

    #[test]
    fn test_should_reject_missing_partition_key() {
        let err = user_model()
            .query_params(&conditions([("S", KeyCondition::eq("u1"))]), QueryOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "missing key condition for partition key 'P'");
    }

    #[tokio::test]
    async fn test_should_not_send_query_for_unknown_index() {
        let transport = MemoryTransport::new(&main_table());
        let options = QueryOptions {
            index: Some("gsi9".to_owned()),
            ..Default::default()
        };
        let err = user_model()
            .query(&transport, &conditions([("G9P", KeyCondition::eq("x"))]), options)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownIndex { index, .. } if index == "gsi9"));
        assert!(transport.requests().is_empty());
    }
}
