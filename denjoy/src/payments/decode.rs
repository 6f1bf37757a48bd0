//! Body decoding for gateway callbacks.
//!
//! Gateways post JSON, urlencoded forms, multipart forms, or bodies with no usable content type
//! at all. Everything is reduced to a [`FieldMap`]; query-string parameters are merged in last
//! as a fallback source.

use bytes::Bytes;
use serde_json::{Map, Value};
use url::form_urlencoded;

use super::normalizer::FieldMap;
use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Multipart,
    Unlabeled,
}

fn body_kind(content_type: Option<&str>) -> BodyKind {
    let Some(content_type) = content_type else {
        return BodyKind::Unlabeled;
    };
    let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else if mime == "multipart/form-data" {
        BodyKind::Multipart
    } else {
        BodyKind::Unlabeled
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten a JSON object: top-level scalars first, then nested objects breadth-first.
fn flatten_object(object: &Map<String, Value>, fields: &mut FieldMap) {
    let mut level: Vec<&Map<String, Value>> = vec![object];

    while !level.is_empty() {
        let mut next = Vec::new();
        for map in level {
            for (key, value) in map {
                match value {
                    Value::Object(nested) => next.push(nested),
                    other => {
                        if let Some(s) = scalar_to_string(other) {
                            fields.insert(key, s);
                        }
                    }
                }
            }
        }
        level = next;
    }
}

fn decode_json(body: &[u8]) -> Result<FieldMap, Error> {
    let mut fields = FieldMap::new();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(fields);
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| Error::InvalidJson { message: e.to_string() })?;
    match value {
        Value::Object(object) => {
            flatten_object(&object, &mut fields);
            Ok(fields)
        }
        _ => Err(Error::InvalidInput {
            message: "Callback JSON body must be an object".to_string(),
        }),
    }
}

fn decode_form(body: &[u8]) -> FieldMap {
    let mut fields = FieldMap::new();
    for (key, value) in form_urlencoded::parse(body) {
        fields.insert(&key, value.into_owned());
    }
    fields
}

async fn decode_multipart(content_type: &str, body: Bytes) -> Result<FieldMap, Error> {
    let boundary = multer::parse_boundary(content_type).map_err(|e| Error::InvalidInput {
        message: format!("Invalid multipart body: {e}"),
    })?;

    let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = FieldMap::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::InvalidInput {
        message: format!("Invalid multipart body: {e}"),
    })? {
        // File parts carry no callback fields
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(|e| Error::InvalidInput {
            message: format!("Invalid multipart field '{name}': {e}"),
        })?;
        fields.insert(&name, value);
    }

    Ok(fields)
}

/// Try JSON, then form encoding. Bodies that are neither yield no fields.
fn decode_unlabeled(body: &[u8]) -> FieldMap {
    if let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) {
        let mut fields = FieldMap::new();
        flatten_object(&object, &mut fields);
        return fields;
    }

    if body.contains(&b'=') {
        return decode_form(body);
    }

    FieldMap::new()
}

/// Decode a callback body plus query string into one field map.
pub async fn collect_fields(content_type: Option<&str>, body: Bytes, query: Option<&str>) -> Result<FieldMap, Error> {
    let mut fields = match body_kind(content_type) {
        BodyKind::Json => decode_json(&body)?,
        BodyKind::Form => decode_form(&body),
        BodyKind::Multipart => decode_multipart(content_type.unwrap_or_default(), body).await?,
        BodyKind::Unlabeled => decode_unlabeled(&body),
    };

    if let Some(query) = query {
        fields.merge_fallback(decode_form(query.as_bytes()));
    }

    Ok(fields)
}
