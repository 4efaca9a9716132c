//! Backend metadata API client.
//!
//! # Responsibilities
//! - List the tables of the configured base
//! - Fetch per-table details to discover relationship fields
//! - Assemble a complete [`SchemaSnapshot`] only after every detail request settles
//!
//! # Design Decisions
//! - Detail requests run with bounded concurrency
//! - A failed detail request yields no relationship fields for that table
//!   instead of failing the whole load

use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::{SchemaSettings, UpstreamConfig};
use crate::schema::snapshot::{
    FieldDescriptor, FieldKind, SchemaSnapshot, SnapshotBuilder, TableDescriptor,
};
use crate::schema::types::{SchemaLoadError, SchemaResult};

/// Response of the "list tables" endpoint.
#[derive(Debug, Deserialize)]
struct TableList {
    /// Required: a success body without it is not a table list.
    list: Vec<TableRecord>,
}

/// One table record, shared by the list and detail endpoints.
#[derive(Debug, Deserialize)]
struct TableRecord {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    table_name: Option<String>,
    #[serde(default)]
    columns: Vec<ColumnRecord>,
    #[serde(default)]
    fields: Vec<ColumnRecord>,
}

#[derive(Debug, Deserialize)]
struct ColumnRecord {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    uidt: Option<String>,
}

impl ColumnRecord {
    fn into_descriptor(self) -> FieldDescriptor {
        let kind = self
            .kind
            .as_deref()
            .or(self.uidt.as_deref())
            .map(FieldKind::from_backend_type)
            .unwrap_or(FieldKind::Scalar);
        FieldDescriptor {
            id: self.id,
            name: self.title.unwrap_or_default(),
            kind,
        }
    }
}

impl TableRecord {
    /// Detail payloads carry typed columns under `fields` or `columns`
    /// depending on the API version.
    fn typed_fields(self) -> Vec<ColumnRecord> {
        if self.fields.is_empty() {
            self.columns
        } else {
            self.fields
        }
    }
}

/// HTTP client for the backend's metadata endpoints.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    meta_url: Url,
    base_id: String,
    token_header: String,
    token: String,
    detail_concurrency: usize,
}

impl MetadataClient {
    /// Create a client from upstream and schema settings.
    pub fn new(upstream: &UpstreamConfig, settings: &SchemaSettings) -> SchemaResult<Self> {
        let raw = upstream.metadata_url();
        let mut normalized = raw.trim_end_matches('/').to_string();
        normalized.push('/');
        let meta_url = Url::parse(&normalized).map_err(|e| SchemaLoadError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()
            .map_err(|source| SchemaLoadError::Request {
                url: raw,
                source,
            })?;

        Ok(Self {
            http,
            meta_url,
            base_id: upstream.base_id.clone(),
            token_header: upstream.token_header.clone(),
            token: upstream.token.clone(),
            detail_concurrency: settings.detail_concurrency.max(1),
        })
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Fetch the full schema and build a new snapshot.
    pub async fn fetch_snapshot(&self) -> SchemaResult<SchemaSnapshot> {
        let list_url = self.endpoint(&format!("meta/bases/{}/tables", self.base_id))?;
        tracing::debug!(url = %list_url, "Fetching table metadata");
        let tables: TableList = self.get_json(list_url).await?;

        let mut builder = SnapshotBuilder::new(self.base_id.clone());
        let mut ids = Vec::with_capacity(tables.list.len());
        for record in tables.list {
            ids.push((record.id.clone(), record.title.clone().unwrap_or_default()));
            builder.add_table(TableDescriptor {
                id: record.id,
                display_name: record.title.unwrap_or_default(),
                internal_name: record.table_name.unwrap_or_default(),
                fields: record
                    .columns
                    .into_iter()
                    .map(ColumnRecord::into_descriptor)
                    .collect(),
            });
        }

        let details: Vec<_> = stream::iter(ids)
            .map(|(id, title)| async move {
                let result = self.fetch_table_details(&id).await;
                (id, title, result)
            })
            .buffer_unordered(self.detail_concurrency)
            .collect()
            .await;

        for (id, title, result) in details {
            match result {
                Ok(detail) => {
                    let links = detail
                        .typed_fields()
                        .into_iter()
                        .map(ColumnRecord::into_descriptor)
                        .filter(|f| f.kind == FieldKind::Relationship);
                    builder.add_relationship_fields(&id, links);
                }
                Err(e) => {
                    tracing::warn!(
                        table_id = %id,
                        table = %title,
                        error = %e,
                        "Failed to fetch field details, table will have no link fields"
                    );
                }
            }
        }

        Ok(builder.build())
    }

    async fn fetch_table_details(&self, table_id: &str) -> SchemaResult<TableRecord> {
        let url = self.endpoint(&format!("meta/tables/{}", table_id))?;
        self.get_json(url).await
    }

    fn endpoint(&self, path: &str) -> SchemaResult<Url> {
        self.meta_url
            .join(path)
            .map_err(|e| SchemaLoadError::InvalidUrl {
                url: format!("{}{}", self.meta_url, path),
                reason: e.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SchemaResult<T> {
        let mut request = self.http.get(url.clone());
        if !self.token.is_empty() {
            request = if self.token_header.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                request.bearer_auth(&self.token)
            } else {
                request.header(self.token_header.as_str(), &self.token)
            };
        }

        let response = request
            .send()
            .await
            .map_err(|source| SchemaLoadError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| SchemaLoadError::Request {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(SchemaLoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| SchemaLoadError::Parse {
            url: url.to_string(),
            source,
        })
    }
}
