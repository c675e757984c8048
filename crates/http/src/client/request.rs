//! Per-request options
//!
//! Options are kept as plain data and turned into a fresh
//! `reqwest::RequestBuilder` on every send, so a request can be replayed after
//! a credential refresh.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use super::ClientError;

/// Request body
#[derive(Debug, Clone)]
pub enum Body {
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// One field of a multipart form
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Bytes,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    /// Set the mime type of a file part; ignored for text parts
    #[must_use]
    pub fn mime(mut self, mime_type: impl Into<String>) -> Self {
        if let Self::File { mime, .. } = &mut self {
            *mime = Some(mime_type.into());
        }
        self
    }
}

/// Headers, body, query and timeout for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Body>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) skip_refresh: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send a JSON body
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Send a multipart form
    #[must_use]
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(Body::Multipart(parts));
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Override the gateway timeout for this request. Each send gets the full budget.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Surface an auth-expired status as-is instead of refreshing.
    ///
    /// Used by the sign-in endpoints, where that status means bad credentials.
    #[must_use]
    pub const fn without_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    pub(crate) fn apply(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        if !self.headers.is_empty() {
            request = request.headers(self.headers.clone());
        }
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        match &self.body {
            None => Ok(request),
            Some(Body::Json(value)) => Ok(request.json(value)),
            Some(Body::Multipart(parts)) => Ok(request.multipart(build_form(parts)?)),
        }
    }
}

fn build_form(parts: &[FormPart]) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let mut file = Part::bytes(bytes.to_vec()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    file = file.mime_str(mime).map_err(|e| {
                        ClientError::Configuration(format!("invalid mime type '{mime}': {e}"))
                    })?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}
