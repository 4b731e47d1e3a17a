//! Activity batch operations

use feedstream_core::validate_changes;
use feedstream_domain::{Changeset, FeedError, RequestDescriptor, Result};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use super::client::StreamClient;

const ACTIVITY_PATH: &str = "activity/";

/// Batch endpoints, borrowed from a [`StreamClient`]
#[derive(Debug, Clone, Copy)]
pub struct BatchOperations<'a> {
    client: &'a StreamClient,
}

impl<'a> BatchOperations<'a> {
    pub(crate) fn new(client: &'a StreamClient) -> Self {
        Self { client }
    }

    /// Partially update several activities in one request.
    ///
    /// `changes` is validated first; nothing is sent if any changeset is
    /// malformed.
    ///
    /// # Errors
    /// - `FeedError::Validation` for a malformed changeset
    /// - `FeedError::Configuration` if no signature can be produced
    /// - `FeedError::Transport` / `FeedError::Api` from the request
    #[instrument(skip(self, changes))]
    pub async fn activities_partial_update(&self, changes: Value) -> Result<Value> {
        let changesets = validate_changes(changes)?;
        self.partial_update(changesets).await
    }

    /// Send already validated changesets.
    pub async fn partial_update(&self, changesets: Vec<Changeset>) -> Result<Value> {
        let signature = match self.client.user_token() {
            Some(token) => token.to_string(),
            None => self.client.issuer().activities_token()?,
        };

        debug!(count = changesets.len(), "sending activity partial update");
        let descriptor = RequestDescriptor::post(ACTIVITY_PATH)
            .body(json!({ "changes": changesets }))
            .signature(signature);

        self.client.send(descriptor).await
    }

    /// Partially update one activity and return it.
    ///
    /// The updated activity is taken from `activities[0]` of the response;
    /// the response's other top-level fields are merged over it.
    ///
    /// # Errors
    /// As [`activities_partial_update`](Self::activities_partial_update),
    /// plus `FeedError::Transport` if the response has no activity.
    pub async fn activity_partial_update(&self, change: Value) -> Result<Value> {
        let response = self.activities_partial_update(Value::Array(vec![change])).await?;
        unwrap_single(response)
    }
}

fn unwrap_single(response: Value) -> Result<Value> {
    let mut fields = match response {
        Value::Object(fields) => fields,
        other => {
            return Err(FeedError::transport(
                "partial update response is not an object",
                Some(other),
            ))
        }
    };

    let first = match fields.remove("activities") {
        Some(Value::Array(activities)) => activities.into_iter().next(),
        _ => None,
    };
    let Some(Value::Object(mut activity)) = first else {
        return Err(FeedError::transport(
            "partial update response has no activity",
            Some(Value::Object(fields)),
        ));
    };

    merge_over(&mut activity, fields);
    Ok(Value::Object(activity))
}

fn merge_over(target: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_update_merges_top_level_fields() {
        let response = json!({
            "activities": [{"id": "abc", "x": 1}],
            "duration": "3ms"
        });

        assert_eq!(
            unwrap_single(response).unwrap(),
            json!({"id": "abc", "x": 1, "duration": "3ms"})
        );
    }

    #[test]
    fn missing_activity_is_a_transport_error() {
        for response in [json!({"activities": []}), json!({"duration": "1ms"}), json!([1])] {
            let err = unwrap_single(response).unwrap_err();
            assert!(matches!(err, FeedError::Transport { body: Some(_), .. }));
        }
    }
}
