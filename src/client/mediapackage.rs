use super::{RestClient, ServiceCredentials};
use ocbridge_common::{ConfigId, Result, ServiceKind};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Duration;

/// A media package document as returned by the media package service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MediaPackage(String);

impl MediaPackage {
    /// Accept `body` only if it is a well-formed XML document whose root
    /// element is `mediapackage` (with or without a namespace prefix).
    pub fn parse(body: &str) -> Option<Self> {
        let doc = body.trim();
        let root = well_formed_root(doc)?;
        let local = root.rsplit(':').next().unwrap_or(root);
        (local == "mediapackage").then(|| Self(doc.to_string()))
    }

    pub fn as_xml(&self) -> &str {
        &self.0
    }

    pub fn into_xml(self) -> String {
        self.0
    }
}

/// Walk the markup of `doc` with a tag stack and return the name of its
/// single root element. `None` if any element is left open, closed out of
/// order, or if text or a second element sits outside the root.
fn well_formed_root(doc: &str) -> Option<&str> {
    let mut stack: Vec<&str> = Vec::new();
    let mut root = None;
    let mut rest = doc;

    while let Some(start) = rest.find('<') {
        if stack.is_empty() && !rest[..start].trim().is_empty() {
            return None;
        }
        rest = &rest[start..];

        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after.find("-->")?;
            rest = &after[end + 3..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("<![CDATA[") {
            if stack.is_empty() {
                return None;
            }
            let end = after.find("]]>")?;
            rest = &after[end + 3..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("<?") {
            let end = after.find("?>")?;
            rest = &after[end + 2..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("<!") {
            // doctype belongs to the prolog
            if root.is_some() {
                return None;
            }
            let end = after.find('>')?;
            rest = &after[end + 1..];
            continue;
        }

        let end = tag_end(rest)?;
        let tag = &rest[1..end];
        rest = &rest[end + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            if stack.pop()? != name.trim_end() {
                return None;
            }
            continue;
        }

        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_end_matches('/')
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            return None;
        }

        if stack.is_empty() {
            if root.is_some() {
                return None;
            }
            root = Some(name);
        }
        if !self_closing {
            stack.push(name);
        }
    }

    if stack.is_empty() && rest.trim().is_empty() {
        root
    } else {
        None
    }
}

/// Index of the `>` closing the tag that starts `markup`, skipping quoted
/// attribute values.
fn tag_end(markup: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in markup.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '<') => return None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Client for the media package service.
pub struct MediaPackageClient(RestClient);

impl MediaPackageClient {
    pub const SERVICE_NAME: &'static str = ServiceKind::MEDIAPACKAGE;

    /// Fails with a configuration error if `credentials` carry no usable URL.
    pub fn new(credentials: ServiceCredentials, timeout: Duration) -> Result<Self> {
        credentials.validate(Self::SERVICE_NAME)?;
        Ok(Self(RestClient::new(credentials, timeout)))
    }

    /// Build a client from the stored configuration and discovered endpoint.
    pub fn from_store(conn: &Connection, config_id: ConfigId, timeout: Duration) -> Result<Self> {
        let credentials =
            ServiceCredentials::resolve(conn, config_id, &ServiceKind::new(Self::SERVICE_NAME))?;
        Self::new(credentials, timeout)
    }

    /// Add a track to a media package.
    ///
    /// Returns the updated media package, or `None` when the call fails for
    /// any reason (transport, status, empty or malformed body).
    pub async fn add_track(
        &self,
        media_package: &str,
        track_uri: &str,
        flavor: &str,
    ) -> Option<MediaPackage> {
        let form = [
            ("mediapackage", media_package),
            ("trackUri", track_uri),
            ("flavor", flavor),
        ];

        let response = match self.0.post_form("/addTrack", &form).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("addTrack on {} failed: {}", self.0.base_url(), e);
                return None;
            }
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read addTrack response: {}", e);
                return None;
            }
        };

        let parsed = MediaPackage::parse(&body);
        if parsed.is_none() {
            tracing::warn!(
                "addTrack on {} returned an unusable body ({} bytes)",
                self.0.base_url(),
                body.len()
            );
        }
        parsed
    }
}
