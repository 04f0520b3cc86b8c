//! Mutation descriptors.
//!
//! A mutation is a named server write plus the set of query-key prefixes
//! it invalidates on success. Descriptors are plain values: the endpoint
//! catalog builds them, the coordinator executes them.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::client::ClientError;

use super::key::QueryKey;

type RequestFn<I> = Box<dyn Fn(I) -> BoxFuture<'static, Result<Value, ClientError>> + Send + Sync>;
type InvalidationFn<I> = Box<dyn Fn(&Value, &I) -> Vec<QueryKey> + Send + Sync>;
type ResultFn<I> = Box<dyn Fn(&Value, &I) + Send + Sync>;

/// One server write and its cache consequences.
pub struct MutationDescriptor<I> {
    name: &'static str,
    request: RequestFn<I>,
    invalidation_keys: InvalidationFn<I>,
    on_result: Option<ResultFn<I>>,
}

impl<I> MutationDescriptor<I> {
    pub fn new<F>(name: &'static str, request: F) -> Self
    where
        F: Fn(I) -> BoxFuture<'static, Result<Value, ClientError>> + Send + Sync + 'static,
    {
        Self {
            name,
            request: Box::new(request),
            invalidation_keys: Box::new(|_, _| Vec::new()),
            on_result: None,
        }
    }

    /// Key prefixes to mark stale after a successful request. May depend
    /// on both the response data and the original input.
    #[must_use]
    pub fn invalidates<F>(mut self, keys: F) -> Self
    where
        F: Fn(&Value, &I) -> Vec<QueryKey> + Send + Sync + 'static,
    {
        self.invalidation_keys = Box::new(keys);
        self
    }

    /// Callback run on success, before invalidation.
    #[must_use]
    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Value, &I) + Send + Sync + 'static,
    {
        self.on_result = Some(Box::new(callback));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn request(&self, input: I) -> BoxFuture<'static, Result<Value, ClientError>> {
        (self.request)(input)
    }

    pub(crate) fn keys_for(&self, data: &Value, input: &I) -> Vec<QueryKey> {
        (self.invalidation_keys)(data, input)
    }

    pub(crate) fn notify_result(&self, data: &Value, input: &I) {
        if let Some(callback) = &self.on_result {
            callback(data, input);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn descriptor_runs_request_and_collects_keys() {
        let descriptor = MutationDescriptor::new("pay_order", |order_id: String| {
            async move { Ok(json!({"_id": order_id, "isPaid": true})) }.boxed()
        })
        .invalidates(|_, order_id: &String| {
            vec![
                QueryKey::root("order").push(order_id.as_str()),
                QueryKey::root("orders"),
            ]
        });

        let input = "42".to_string();
        let data = descriptor.request(input.clone()).await.expect("request ok");
        let keys = descriptor.keys_for(&data, &input);

        assert_eq!(descriptor.name(), "pay_order");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], QueryKey::root("order").push("42"));
    }

    #[tokio::test]
    async fn on_result_sees_data_and_input() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let descriptor = MutationDescriptor::new("create_order", |_input: ()| {
            async { Ok(json!({"_id": "o1"})) }.boxed()
        })
        .on_result(move |data, _input| {
            assert_eq!(data["_id"], "o1");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let data = descriptor.request(()).await.expect("request ok");
        descriptor.notify_result(&data, &());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_invalidation_set_is_empty() {
        let descriptor = MutationDescriptor::new("upload_image", |_input: ()| {
            async { Ok(Value::Null) }.boxed()
        });
        assert!(descriptor.keys_for(&Value::Null, &()).is_empty());
    }
}
