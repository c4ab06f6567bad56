//! Parameter binding.
//!
//! # Responsibilities
//! - Resolve the request's content type to a tag namespace
//! - Decode the query string or body into the route's parameter type
//! - Run the validator over the decoded parameter
//!
//! # Design Decisions
//! - The content type is resolved before anything is read, so an
//!   unsupported type is rejected for every method
//! - XML and multipart are recognised namespaces without a decoder
//! - Bodies are capped at `MAX_BODY_BYTES`

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use serde::de::DeserializeOwned;

use crate::pipeline::BindError;
use crate::validation::{Params, TagNamespace, Validator};

/// Largest body the binder reads.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Decode and validate the parameter of `request`.
pub async fn bind<P: Params>(request: Request<Body>, validator: &Validator) -> Result<P, BindError> {
    let content_type = match request.headers().get(header::CONTENT_TYPE) {
        None => String::new(),
        Some(value) => value.to_str().map(str::to_string).map_err(|_| {
            let lossy = String::from_utf8_lossy(value.as_bytes()).into_owned();
            BindError::UnsupportedContentType(lossy)
        })?,
    };

    let namespace = TagNamespace::from_content_type(&content_type)
        .ok_or_else(|| BindError::UnsupportedContentType(content_type.clone()))?;

    let param: P = if reads_query(request.method()) {
        decode_query(request.uri().query().unwrap_or_default())?
    } else {
        let query = request.uri().query().unwrap_or_default().to_string();
        let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|err| BindError::Decode(err.to_string()))?;
        decode_body(namespace, &body, &query)?
    };

    validator
        .validate(&param)
        .map_err(|violations| BindError::Invalid {
            content_type,
            violations,
        })?;

    Ok(param)
}

/// Methods whose parameters always travel in the query string.
///
/// Other methods decode their body by content type; an empty form body
/// falls back to the query string.
pub fn reads_query(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

fn decode_query<P: DeserializeOwned>(query: &str) -> Result<P, BindError> {
    serde_urlencoded::from_str(query).map_err(|err| BindError::Decode(err.to_string()))
}

fn decode_body<P: DeserializeOwned>(
    namespace: TagNamespace,
    body: &[u8],
    query: &str,
) -> Result<P, BindError> {
    match namespace {
        TagNamespace::Json => {
            let body = if body.is_empty() { b"{}".as_slice() } else { body };
            serde_json::from_slice(body).map_err(|err| BindError::Decode(err.to_string()))
        }
        TagNamespace::Yaml => {
            let body = if body.is_empty() { b"{}".as_slice() } else { body };
            serde_yaml::from_slice(body).map_err(|err| BindError::Decode(err.to_string()))
        }
        // An empty form body falls back to the query string.
        TagNamespace::Form | TagNamespace::Html | TagNamespace::Plain if body.is_empty() => {
            decode_query(query)
        }
        TagNamespace::Form | TagNamespace::Html | TagNamespace::Plain => {
            serde_urlencoded::from_bytes(body).map_err(|err| BindError::Decode(err.to_string()))
        }
        TagNamespace::Xml => Err(BindError::Decode(format!(
            "no decoder for the {namespace} namespace"
        ))),
    }
}
