#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dynamap_core::fields::{Fields, Validator, WithOptions};
    use dynamap_core::{
        Action, Model, ModelError, ModelOptions, ModelUpdate, Schema, UpdateOp, UpdateValue,
        ValidationError,
    };
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use crate::{MemoryTransport, main_table, model_item};

    /// Records each call after an optional delay, and rejects one value.
    #[derive(Debug)]
    struct Recording {
        log: Arc<Mutex<Vec<String>>>,
        delay: Duration,
        reject: Option<Value>,
    }

    #[async_trait::async_trait]
    impl Validator for Recording {
        async fn validate(
            &self,
            name: &str,
            value: &Value,
            action: Action,
        ) -> Result<(), ValidationError> {
            tokio::time::sleep(self.delay).await;
            self.log.lock().push(format!("{name}:{action}"));
            if self.reject.as_ref() == Some(value) {
                return Err(ValidationError::new(name, format!("{name} is not allowed here")));
            }
            Ok(())
        }
    }

    fn model(log: &Arc<Mutex<Vec<String>>>) -> Model {
        let recording = |millis, reject: Option<Value>| Recording {
            log: log.clone(),
            delay: Duration::from_millis(millis),
            reject,
        };
        let schema = Schema::builder("User")
            .field("id", Fields::split(["P", "S"]))
            .field("email", Fields::string().with_validator(recording(30, Some(json!("bad")))))
            .field("age", Fields::number().with_validator(recording(0, None)))
            .field("nick", Fields::string().with_validator(recording(10, None)))
            .build()
            .unwrap();
        Model::new(schema, main_table())
    }

    #[tokio::test]
    async fn test_should_run_validators_in_declaration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let item = model_item(json!({"id": "a.b", "nick": "ada", "age": 3, "email": "a@b.c"}));
        model(&log).create_params(&item, &ModelOptions::default()).await.unwrap();
        assert_eq!(*log.lock(), ["email:create", "age:create", "nick:create"]);
    }

    #[tokio::test]
    async fn test_should_skip_validators_for_absent_values() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let item = model_item(json!({"id": "a.b", "nick": "ada"}));
        model(&log).put_params(&item, &ModelOptions::default()).await.unwrap();
        assert_eq!(*log.lock(), ["nick:put"]);
    }

    #[tokio::test]
    async fn test_should_stop_at_first_rejection_with_message_unchanged() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = MemoryTransport::new(&main_table());
        let item = model_item(json!({"id": "a.b", "email": "bad", "nick": "ada"}));
        let err = model(&log)
            .put(&transport, &item, &ModelOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(&err, ModelError::Validation(e) if e.field == "email"));
        assert_eq!(err.to_string(), "email is not allowed here");
        assert_eq!(*log.lock(), ["email:put"]);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_should_validate_only_literal_update_values() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let update: ModelUpdate = [
            ("id".to_owned(), UpdateValue::from(json!("a.b"))),
            ("age".to_owned(), UpdateOp::inc(1).into()),
            ("nick".to_owned(), json!("grace").into()),
        ]
        .into_iter()
        .collect();
        model(&log).update_params(&update, &ModelOptions::default()).await.unwrap();
        assert_eq!(*log.lock(), ["nick:update"]);
    }
}
