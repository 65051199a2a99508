use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::{
    models::catalog::{
        BulkPermissionRequest, CreateRoleRequest, CreateSubjectRequest, CreateTopicRequest,
        PermissionRequest, UpdateSubjectRequest, UpdateTopicRequest,
    },
    services::kidemia_client::{api_path, KidemiaBackend, UpstreamError},
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{}", first_message(.0))]
    Validation(ValidationErrors),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Validates catalog forms and forwards them to the Kidemia API.
pub struct CatalogService<'a> {
    backend: &'a dyn KidemiaBackend,
}

impl<'a> CatalogService<'a> {
    pub fn new(backend: &'a dyn KidemiaBackend) -> Self {
        Self { backend }
    }

    pub async fn create_subject(&self, req: &CreateSubjectRequest) -> Result<Value, CatalogError> {
        self.forward(Method::POST, &["subjects"], req).await
    }

    pub async fn update_subject(
        &self,
        subject_id: &str,
        req: &UpdateSubjectRequest,
    ) -> Result<Value, CatalogError> {
        self.forward(Method::PATCH, &["subjects", subject_id], req)
            .await
    }

    pub async fn create_topic(&self, req: &CreateTopicRequest) -> Result<Value, CatalogError> {
        self.forward(Method::POST, &["topics"], req).await
    }

    pub async fn update_topic(
        &self,
        topic_id: &str,
        req: &UpdateTopicRequest,
    ) -> Result<Value, CatalogError> {
        self.forward(Method::PUT, &["topics", topic_id], req).await
    }

    pub async fn create_role(&self, req: &CreateRoleRequest) -> Result<Value, CatalogError> {
        self.forward(Method::POST, &["roles"], req).await
    }

    pub async fn assign_permissions(
        &self,
        role_id: &str,
        req: &BulkPermissionRequest,
    ) -> Result<Value, CatalogError> {
        self.forward(Method::POST, &["roles", role_id, "permissions"], req)
            .await
    }

    pub async fn create_permission(&self, req: &PermissionRequest) -> Result<Value, CatalogError> {
        self.forward(Method::POST, &["permissions"], req).await
    }

    /// `resource` is the path below `/api/v1`; each segment is encoded on its own.
    async fn forward<T>(
        &self,
        method: Method,
        resource: &[&str],
        req: &T,
    ) -> Result<Value, CatalogError>
    where
        T: Validate + Serialize + Sync,
    {
        let segments: Vec<&str> = ["api", "v1"]
            .into_iter()
            .chain(resource.iter().copied())
            .collect();
        let path = api_path(&segments)?;

        req.validate().map_err(|e| {
            tracing::debug!("Rejected catalog request to {}: {}", path, e);
            CatalogError::Validation(e)
        })?;

        let body = serde_json::to_value(req)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let response = self.backend.send_json(method.clone(), &path, Some(body)).await?;

        tracing::info!("Catalog {} {} forwarded", method, path);
        Ok(response)
    }
}

/// First message of the first failing field, in field-name order.
pub fn first_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}
