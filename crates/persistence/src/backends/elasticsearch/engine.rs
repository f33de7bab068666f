//! DocumentEngine implementation for Elasticsearch.

use async_trait::async_trait;
use elasticsearch::http::response::Response;
use elasticsearch::indices::{IndicesCreateParts, IndicesExistsParts, IndicesRefreshParts};
use elasticsearch::params::Refresh;
use elasticsearch::{
    BulkOperation, BulkParts, CreateParts, DeleteParts, ExistsParts, GetParts, IndexParts,
};
use serde_json::{Value, json};

use crate::core::{
    BulkAction, BulkItemFailure, BulkResponse, DocumentEngine, IndexCreation, WriteMode,
};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::mapping::IndexMappingSpec;
use crate::types::Document;

use super::backend::ElasticsearchBackend;

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "elasticsearch".to_string(),
        message,
        source: None,
    })
}

fn refresh_param(refresh: bool) -> Refresh {
    if refresh { Refresh::True } else { Refresh::False }
}

/// Turns a non-success response into an error, reading the body for context.
async fn error_for_status(response: Response, action: &str) -> StorageResult<Response> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(internal_error(format!(
        "Failed to {} (status {}): {}",
        action, status, body
    )))
}

/// Extracts failed actions from a bulk response body.
fn bulk_failures(body: &Value) -> Vec<BulkItemFailure> {
    if !body.get("errors").and_then(Value::as_bool).unwrap_or(false) {
        return Vec::new();
    }

    body.get("items")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.as_object()?.values().next())
        .filter_map(|result| {
            let error = result.get("error")?;
            Some(BulkItemFailure {
                id: result
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                status: result
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok())
                    .unwrap_or(500),
                reason: error
                    .get("reason")
                    .and_then(Value::as_str)
                    .or_else(|| error.get("type").and_then(Value::as_str))
                    .unwrap_or("unknown error")
                    .to_string(),
            })
        })
        .collect()
}

fn bulk_operation(action: BulkAction) -> BulkOperation<Value> {
    match action.mode {
        WriteMode::Create => BulkOperation::create(action.document)
            .id(action.id)
            .index(action.index)
            .into(),
        WriteMode::Overwrite => BulkOperation::index(action.document)
            .id(action.id)
            .index(action.index)
            .into(),
    }
}

#[async_trait]
impl DocumentEngine for ElasticsearchBackend {
    async fn create_index(
        &self,
        name: &str,
        mapping: &IndexMappingSpec,
    ) -> StorageResult<IndexCreation> {
        let exists_response = self
            .client()
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to check index existence: {}", e)))?;

        if exists_response.status_code().is_success() {
            return Ok(IndexCreation::AlreadyExists);
        }

        let body = json!({
            "settings": self.index_settings(),
            "mappings": mapping.to_json(),
        });

        let response = self
            .client()
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(body)
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to create index {}: {}", name, e)))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Another writer created it between the existence check and here
            if body.contains("resource_already_exists_exception") {
                return Ok(IndexCreation::AlreadyExists);
            }
            return Err(internal_error(format!(
                "Failed to create index {} (status {}): {}",
                name, status, body
            )));
        }

        Ok(IndexCreation::Created)
    }

    async fn exists(&self, index: &str, id: &str) -> StorageResult<bool> {
        let response = self
            .client()
            .exists(ExistsParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to check document {}: {}", id, e)))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(internal_error(format!(
                "Failed to check document {} in {} (status {})",
                id, index, status
            ))),
        }
    }

    async fn get(&self, index: &str, id: &str) -> StorageResult<Option<Document>> {
        let response = self
            .client()
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to get document {}: {}", id, e)))?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }
        let response = error_for_status(response, "get document").await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse ES response: {}", e)))?;

        Ok(body.get("_source").cloned())
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        document: Document,
        mode: WriteMode,
        refresh: bool,
    ) -> StorageResult<()> {
        let sent = match mode {
            WriteMode::Create => {
                self.client()
                    .create(CreateParts::IndexId(index, id))
                    .body(document)
                    .refresh(refresh_param(refresh))
                    .send()
                    .await
            }
            WriteMode::Overwrite => {
                self.client()
                    .index(IndexParts::IndexId(index, id))
                    .body(document)
                    .refresh(refresh_param(refresh))
                    .send()
                    .await
            }
        };
        let response =
            sent.map_err(|e| internal_error(format!("Failed to index document: {}", e)))?;

        if response.status_code().as_u16() == 409 {
            return Err(StorageError::Backend(BackendError::DocumentConflict {
                index: index.to_string(),
                id: id.to_string(),
            }));
        }
        error_for_status(response, "index document").await?;

        tracing::debug!("Indexed document '{}' into '{}' ({:?})", id, index, mode);
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str, refresh: bool) -> StorageResult<bool> {
        let response = self
            .client()
            .delete(DeleteParts::IndexId(index, id))
            .refresh(refresh_param(refresh))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to delete document: {}", e)))?;

        if response.status_code().as_u16() == 404 {
            return Ok(false);
        }
        error_for_status(response, "delete document").await?;

        tracing::debug!("Deleted document '{}' from '{}'", id, index);
        Ok(true)
    }

    async fn bulk(&self, actions: Vec<BulkAction>, refresh: bool) -> StorageResult<BulkResponse> {
        let total = actions.len();
        if total == 0 {
            return Ok(BulkResponse::default());
        }

        let operations: Vec<BulkOperation<Value>> =
            actions.into_iter().map(bulk_operation).collect();

        let response = self
            .client()
            .bulk(BulkParts::None)
            .body(operations)
            .refresh(refresh_param(refresh))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to send bulk request: {}", e)))?;
        let response = error_for_status(response, "execute bulk request").await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse bulk response: {}", e)))?;

        let failures = bulk_failures(&body);
        if !failures.is_empty() {
            tracing::warn!(
                "Bulk request reported {} failed actions of {}",
                failures.len(),
                total
            );
        }

        Ok(BulkResponse { total, failures })
    }

    async fn refresh(&self, index: &str) -> StorageResult<()> {
        let response = self
            .client()
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to refresh index {}: {}", index, e)))?;
        error_for_status(response, "refresh index").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_failures_without_errors() {
        let body = json!({"errors": false, "items": [{"create": {"_id": "a", "status": 201}}]});
        assert!(bulk_failures(&body).is_empty());
    }

    #[test]
    fn test_bulk_failures_extracts_reasons() {
        let body = json!({
            "errors": true,
            "items": [
                {"create": {"_id": "a", "status": 201}},
                {"create": {
                    "_id": "b",
                    "status": 409,
                    "error": {
                        "type": "version_conflict_engine_exception",
                        "reason": "[b]: version conflict, document already exists"
                    }
                }},
                {"create": {"_id": "c", "status": 400, "error": {"type": "mapper_parsing_exception"}}}
            ]
        });

        let failures = bulk_failures(&body);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].id, "b");
        assert_eq!(failures[0].status, 409);
        assert!(failures[0].reason.contains("version conflict"));
        assert_eq!(failures[1].reason, "mapper_parsing_exception");
    }

    #[test]
    fn test_refresh_param() {
        assert!(matches!(refresh_param(true), Refresh::True));
        assert!(matches!(refresh_param(false), Refresh::False));
    }
}
