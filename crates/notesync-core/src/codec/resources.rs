//! Resource reference rewriting.
//!
//! Stored HTML refers to resources as `index_files/<name>`. Exported Markdown
//! must point somewhere a reader can resolve, so references are rewritten to
//! each resource's export target.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::Resource;

static RESOURCE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"index_files/([^\s)"'<>]+)"#).unwrap());

/// Identity and resources of the note being exported.
#[derive(Debug, Clone, Copy)]
pub struct ResourceContext<'a> {
    pub kb_guid: &'a str,
    pub doc_guid: &'a str,
    pub resources: &'a [Resource],
    /// Knowledge-server base URL for resources without an explicit URL.
    pub base_url: Option<&'a str>,
}

impl<'a> ResourceContext<'a> {
    pub fn new(kb_guid: &'a str, doc_guid: &'a str, resources: &'a [Resource]) -> Self {
        Self {
            kb_guid,
            doc_guid,
            resources,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Option<&'a str>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Where a resource should point in exported Markdown.
    ///
    /// Explicit URL, else an inline `data:` URI, else the server view URL,
    /// else the stored relative reference.
    pub fn export_target(&self, resource: &Resource) -> Result<String> {
        if let Some(url) = resource.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        if let Some(data) = resource.data.as_deref() {
            let data = data.trim();
            let bytes = STANDARD.decode(data).map_err(|e| {
                Error::Codec(format!(
                    "resource {}: invalid base64 payload: {}",
                    resource.name, e
                ))
            })?;
            let mime = infer::get(&bytes)
                .map(|t| t.mime_type())
                .unwrap_or("application/octet-stream");
            return Ok(format!("data:{};base64,{}", mime, data));
        }
        if let Some(base) = self.base_url {
            return Ok(format!(
                "{}/ks/note/view/{}/{}/{}",
                base.trim_end_matches('/'),
                self.kb_guid,
                self.doc_guid,
                resource.storage_ref()
            ));
        }
        Ok(resource.storage_ref())
    }
}

/// Rewrite `index_files/<name>` references to export targets. References to
/// names not in the context are left alone.
pub fn rewrite_for_export(text: &str, ctx: &ResourceContext<'_>) -> Result<String> {
    if ctx.resources.is_empty() {
        return Ok(text.to_string());
    }
    let by_name: HashMap<&str, &Resource> =
        ctx.resources.iter().map(|r| (r.name.as_str(), r)).collect();

    let mut failure: Option<Error> = None;
    let rewritten = RESOURCE_REF_RE.replace_all(text, |caps: &Captures| {
        let Some(resource) = by_name.get(&caps[1]) else {
            return caps[0].to_string();
        };
        match ctx.export_target(resource) {
            Ok(target) => {
                tracing::trace!(resource = %resource.name, "Rewrote resource reference");
                target
            }
            Err(e) => {
                failure.get_or_insert(e);
                caps[0].to_string()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(rewritten.into_owned()),
    }
}

/// Rewrite absolute resource URLs in editor Markdown back to the stored
/// `index_files/<name>` form.
pub fn rewrite_for_storage(markdown: &str, resources: &[Resource]) -> String {
    let mut out = markdown.to_string();
    for resource in resources {
        if let Some(url) = resource.url.as_deref().filter(|u| !u.is_empty()) {
            if out.contains(url) {
                out = out.replace(url, &resource.storage_ref());
            }
        }
    }
    out
}
