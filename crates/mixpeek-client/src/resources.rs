//! REST resource surface used by workflow tools.
//!
//! Each resource/operation pair resolves to one HTTP method and path under
//! `/v1`. Pairs the API does not offer are rejected before any request is
//! sent.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// An API resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Namespace,
    Bucket,
    Collection,
    Document,
    Retriever,
    Upload,
    Task,
    Inference,
    Taxonomy,
    Cluster,
    Webhook,
}

impl Resource {
    pub fn all() -> &'static [Resource] {
        &[
            Resource::Namespace,
            Resource::Bucket,
            Resource::Collection,
            Resource::Document,
            Resource::Retriever,
            Resource::Upload,
            Resource::Task,
            Resource::Inference,
            Resource::Taxonomy,
            Resource::Cluster,
            Resource::Webhook,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Namespace => "namespace",
            Resource::Bucket => "bucket",
            Resource::Collection => "collection",
            Resource::Document => "document",
            Resource::Retriever => "retriever",
            Resource::Upload => "upload",
            Resource::Task => "task",
            Resource::Inference => "inference",
            Resource::Taxonomy => "taxonomy",
            Resource::Cluster => "cluster",
            Resource::Webhook => "webhook",
        }
    }

    /// Operations this resource supports.
    pub fn operations(&self) -> &'static [Operation] {
        use Operation::*;
        const CRUD: &[Operation] = &[Create, Get, List, Update, Delete];
        match self {
            Resource::Namespace
            | Resource::Bucket
            | Resource::Collection
            | Resource::Document
            | Resource::Webhook => CRUD,
            Resource::Retriever => &[Create, Get, List, Update, Delete, Execute],
            Resource::Upload => &[Create, Get, List, Delete, Confirm],
            Resource::Task => &[Get, List, Cancel],
            Resource::Inference => &[Run],
            Resource::Taxonomy | Resource::Cluster => {
                &[Create, Get, List, Update, Delete, Execute]
            }
        }
    }

    /// Collection path segment.
    fn segment(&self) -> &'static str {
        match self {
            Resource::Namespace => "namespaces",
            Resource::Bucket => "buckets",
            Resource::Collection => "collections",
            Resource::Document => "documents",
            Resource::Retriever => "retrievers",
            Resource::Upload => "uploads",
            Resource::Task => "tasks",
            Resource::Inference => "inference",
            Resource::Taxonomy => "taxonomies",
            Resource::Cluster => "clusters",
            Resource::Webhook => "webhooks",
        }
    }

    /// Parent resource for nested paths.
    fn parent(&self) -> Option<Resource> {
        match self {
            Resource::Document => Some(Resource::Collection),
            Resource::Upload => Some(Resource::Bucket),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Resource::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown resource: {}", s)))
    }
}

/// An operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Get,
    List,
    Update,
    Delete,
    Execute,
    Confirm,
    Cancel,
    Run,
}

impl Operation {
    pub fn all() -> &'static [Operation] {
        &[
            Operation::Create,
            Operation::Get,
            Operation::List,
            Operation::Update,
            Operation::Delete,
            Operation::Execute,
            Operation::Confirm,
            Operation::Cancel,
            Operation::Run,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Execute => "execute",
            Operation::Confirm => "confirm",
            Operation::Cancel => "cancel",
            Operation::Run => "run",
        }
    }

    /// Returns true if the operation addresses one existing item.
    fn needs_id(&self) -> bool {
        !matches!(self, Operation::Create | Operation::List | Operation::Run)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Operation::all()
            .iter()
            .copied()
            .find(|o| o.as_str() == wanted)
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown operation: {}", s)))
    }
}

/// A resolved HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

/// A workflow request against one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub resource: Resource,
    pub operation: Operation,
    /// Id of the addressed item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Collection id for documents, bucket id for uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// JSON body for create, update, and action operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResourceRequest {
    pub fn new(resource: Resource, operation: Operation) -> Self {
        Self {
            resource,
            operation,
            id: None,
            parent_id: None,
            body: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolves the HTTP method and path.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let (resource, operation) = (self.resource, self.operation);
        if !resource.operations().contains(&operation) {
            return Err(ClientError::InvalidInput(format!(
                "operation '{}' is not supported for resource '{}'",
                operation, resource
            )));
        }

        let mut path = String::from("/v1");
        if let Some(parent) = resource.parent() {
            let parent_id = path_id(self.parent_id.as_deref(), parent.as_str())?;
            path.push_str(&format!("/{}/{}", parent.segment(), parent_id));
        }
        path.push('/');
        path.push_str(resource.segment());

        if operation.needs_id() {
            let id = path_id(self.id.as_deref(), resource.as_str())?;
            path.push('/');
            path.push_str(id);
        }

        let method = match operation {
            Operation::Get | Operation::List => Method::GET,
            Operation::Update => Method::PATCH,
            Operation::Delete => Method::DELETE,
            Operation::Create | Operation::Run => Method::POST,
            Operation::Execute | Operation::Confirm | Operation::Cancel => {
                path.push('/');
                path.push_str(operation.as_str());
                Method::POST
            }
        };

        Ok(Endpoint { method, path })
    }
}

/// Validates an id used as a path segment.
fn path_id<'a>(id: Option<&'a str>, what: &str) -> Result<&'a str> {
    let id = id.map(str::trim).unwrap_or("");
    if id.is_empty() {
        return Err(ClientError::InvalidInput(format!("{} id is required", what)));
    }
    if id.contains(['/', '?', '#', '%']) || id.chars().any(char::is_whitespace) {
        return Err(ClientError::InvalidInput(format!(
            "{} id contains invalid characters: {}",
            what, id
        )));
    }
    Ok(id)
}
