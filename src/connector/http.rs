//! HTTP APIs returning JSON

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::catalog::{ApiConfig, HttpMethod};

use super::error::ConnectorError;
use super::{ConnectionStatus, Connector};

/// Relation name for a response whose top level is an array
pub const RESPONSE_RELATION: &str = "response";

#[derive(Debug, Clone)]
pub struct ApiConnector {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiConnector {
    pub fn new(config: ApiConfig, timeout: Duration) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ConnectorError::ConnectionFailure(err.to_string()))?;
        Ok(Self { config, client })
    }

    /// Issue the configured request; any non-2xx status is a failure
    async fn fetch(&self) -> Result<Value, ConnectorError> {
        let mut request = match self.config.api_method {
            HttpMethod::Get => self
                .client
                .get(&self.config.api_url)
                .query(&query_pairs(self.config.api_body.as_ref())),
            HttpMethod::Post => {
                let request = self.client.post(&self.config.api_url);
                match &self.config.api_body {
                    Some(body) => request.json(body),
                    None => request,
                }
            }
        };
        for (name, value) in &self.config.api_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|err| ConnectorError::ConnectionFailure(err.to_string()))?;
        response
            .json::<Value>()
            .await
            .map_err(|err| ConnectorError::ConnectionFailure(err.to_string()))
    }
}

/// GET parameters from a flat JSON object; nested values are skipped
fn query_pairs(body: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = body else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn relations(body: &Value) -> Vec<String> {
    match body {
        Value::Array(_) => vec![RESPONSE_RELATION.to_string()],
        Value::Object(map) => map
            .iter()
            .filter(|(_, value)| value.is_array())
            .map(|(key, _)| key.clone())
            .collect(),
        _ => Vec::new(),
    }
}

/// Keys of the first object in the relation's array
fn fields(body: &Value, relation: &str) -> Result<Vec<String>, ConnectorError> {
    let items = match body {
        Value::Array(items) if relation == RESPONSE_RELATION => items,
        Value::Object(map) => match map.get(relation) {
            Some(Value::Array(items)) => items,
            _ => return Err(ConnectorError::RelationNotFound(relation.to_string())),
        },
        _ => return Err(ConnectorError::RelationNotFound(relation.to_string())),
    };
    Ok(match items.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    })
}

#[async_trait]
impl Connector for ApiConnector {
    #[instrument(skip_all, fields(url = %self.config.api_url))]
    async fn test_connection(&self) -> ConnectionStatus {
        match self.fetch().await {
            Ok(_) => ConnectionStatus::ok(),
            Err(err) => ConnectionStatus::failed(err.to_string()),
        }
    }

    #[instrument(skip_all, fields(url = %self.config.api_url), err)]
    async fn list_relations(&self) -> Result<Vec<String>, ConnectorError> {
        Ok(relations(&self.fetch().await?))
    }

    #[instrument(skip_all, fields(url = %self.config.api_url, relation = %relation), err)]
    async fn list_fields(&self, relation: &str) -> Result<Vec<String>, ConnectorError> {
        fields(&self.fetch().await?, relation)
    }
}
