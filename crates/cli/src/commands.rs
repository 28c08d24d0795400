//! Command implementations.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tilecache_client::{FetchConfig, HttpFileSource};
use tilecache_core::config::AppConfig;
use tilecache_core::{BundleTiles, CascadeFileSource, FileSource, Resource, Response, ResponseError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// JSON summary printed for a resolved resource.
#[derive(Debug, Serialize)]
pub struct ResponseSummary<'a> {
    pub resource: &'a Resource,
    pub bytes: Option<usize>,
    pub no_content: bool,
    pub etag: Option<&'a str>,
    pub modified: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    pub error: Option<&'a ResponseError>,
}

impl<'a> ResponseSummary<'a> {
    pub fn new(resource: &'a Resource, response: &'a Response) -> Self {
        Self {
            resource,
            bytes: response.data.as_ref().map(|d| d.len()),
            no_content: response.no_content,
            etag: response.etag.as_deref(),
            modified: response.modified,
            expires: response.expires,
            error: response.error.as_ref(),
        }
    }
}

/// Resolve one resource through the package-then-network cascade.
pub async fn resolve(config: &AppConfig, resource: Resource) -> Result<Response> {
    let runtime = Handle::current();
    let network = HttpFileSource::new(FetchConfig::from(config), runtime.clone())?;
    let cascade = CascadeFileSource::with_handle(Arc::new(network), &runtime, config.statement_cache_capacity);

    if let Some(path) = &config.package_path {
        cascade.set_primary_path(path);
    }

    let (tx, rx) = oneshot::channel();
    let _request = cascade.request(
        resource,
        Box::new(move |response| {
            let _ = tx.send(response);
        }),
    );

    rx.await.context("request was dropped before completing")
}

/// Print the summary to stdout and optionally write the payload to `output`.
pub fn report(resource: &Resource, response: &Response, output: Option<&Path>) -> Result<()> {
    let summary = ResponseSummary::new(resource, response);
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary)?;
    writeln!(stdout)?;

    if let (Some(path), Some(data)) = (output, &response.data) {
        std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = data.len(), "wrote payload");
    }

    Ok(())
}

/// List up to `limit` tiles stored in the package.
pub async fn scan(package: &Path, template: &str, limit: usize) -> Result<()> {
    let bundle = BundleTiles::open(package).await?;
    let total = bundle.count().await?;
    let tiles = bundle.collect(template).await?;
    bundle.close().await;

    let mut stdout = std::io::stdout().lock();
    for (resource, response) in tiles.iter().take(limit) {
        serde_json::to_writer(&mut stdout, &ResponseSummary::new(resource, response))?;
        writeln!(stdout)?;
    }
    writeln!(stdout, "{} of {total} tiles", tiles.len().min(limit))?;

    Ok(())
}
