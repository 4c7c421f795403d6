//! Request construction for trying out a service.
//!
//! Turns a definition plus operator-entered values into the exact request a
//! client would send to the service endpoint. Nothing is sent from here.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::editor::slugify;
use crate::errors::AppError;
use crate::middleware::access;
use crate::models::parameter::{ParamType, ParameterSchema};
use crate::models::service::{ContentType, ServiceDefinition};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestInput {
    #[serde(default)]
    pub parameters: Vec<NameValue>,
    #[serde(default)]
    pub headers: Vec<NameValue>,
    /// Role ids the simulated caller holds.
    #[serde(default)]
    pub roles: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<NameValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Supplied values that match no declared input parameter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("caller may not invoke {endpoint}")]
    Denied { endpoint: String },

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<HarnessError> for AppError {
    fn from(e: HarnessError) -> Self {
        match e {
            HarnessError::Denied { endpoint } => AppError::AccessDenied { endpoint },
            HarnessError::Invalid(errors) => AppError::Validation(errors),
            HarnessError::Url(e) => AppError::Internal(e.into()),
        }
    }
}

/// File name offered when saving a test response.
pub fn response_filename(service_name: &str) -> String {
    format!("{}-response.json", slugify(service_name))
}

/// One validated input: the raw text for query/form encodings and the typed
/// value for JSON.
struct Coerced<'a> {
    param: &'a ParameterSchema,
    raw: &'a str,
    typed: Value,
}

impl PreparedRequest {
    pub fn build(
        def: &ServiceDefinition,
        input: &TestInput,
        base_url: &Url,
    ) -> Result<Self, HarnessError> {
        if !access::is_accessible(def, &input.roles) {
            tracing::warn!(
                endpoint = %def.endpoint,
                caller_roles = ?input.roles,
                "service access denied"
            );
            return Err(HarnessError::Denied {
                endpoint: def.endpoint.clone(),
            });
        }

        let mut errors = ValidationErrors::new();
        let mut values = Vec::new();

        for param in &def.input_params {
            match input.parameters.iter().find(|nv| nv.name == param.key) {
                Some(nv) if !nv.value.is_empty() => match coerce(param.param_type, &nv.value) {
                    Ok(typed) => values.push(Coerced {
                        param,
                        raw: &nv.value,
                        typed,
                    }),
                    Err(msg) => errors.add(format!("parameters.{}", param.key), msg),
                },
                _ if param.required => {
                    errors.add(format!("parameters.{}", param.key), "Value is required")
                }
                _ => {}
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let ignored = input
            .parameters
            .iter()
            .filter(|nv| !def.input_params.iter().any(|p| p.key == nv.name))
            .map(|nv| nv.name.clone())
            .collect();

        let mut url = base_url.join(&def.endpoint)?;
        if url.origin() != base_url.origin() {
            let mut errors = ValidationErrors::new();
            errors.add("endpoint", "Endpoint must stay on the test base URL");
            return Err(errors.into());
        }
        let mut content_type = def.content_type.as_str().to_string();
        let body = if def.method.uses_query_string() {
            if !values.is_empty() {
                let mut pairs = url.query_pairs_mut();
                for v in &values {
                    pairs.append_pair(&v.param.key, v.raw);
                }
            }
            None
        } else {
            Some(match def.content_type {
                ContentType::Json => json_body(&values),
                ContentType::FormUrlEncoded => form_body(&values),
                ContentType::PlainText => text_body(&values),
                ContentType::Multipart => {
                    let boundary = format!("----servicedesk{}", uuid::Uuid::new_v4().simple());
                    content_type = format!("{}; boundary={}", content_type, boundary);
                    multipart_body(&values, &boundary)
                }
            })
        };

        let mut headers: Vec<NameValue> = input
            .headers
            .iter()
            .filter(|h| !h.name.is_empty() && !h.name.eq_ignore_ascii_case("content-type"))
            .cloned()
            .collect();
        headers.insert(
            0,
            NameValue {
                name: "Content-Type".into(),
                value: content_type,
            },
        );

        tracing::debug!(endpoint = %def.endpoint, method = %def.method, "prepared test request");

        Ok(PreparedRequest {
            method: def.method.as_str().to_string(),
            url: url.to_string(),
            headers,
            body,
            ignored,
        })
    }
}

fn coerce(param_type: ParamType, raw: &str) -> Result<Value, String> {
    match param_type {
        ParamType::String | ParamType::File => Ok(Value::String(raw.to_string())),
        ParamType::Number => {
            if let Ok(i) = raw.trim().parse::<i64>() {
                return Ok(Value::from(i));
            }
            raw.trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{}' is not a number", raw))
        }
        ParamType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{}' is not true or false", raw)),
        },
        ParamType::Object => match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Object(_)) => Ok(v),
            _ => Err("Expected a JSON object".to_string()),
        },
        ParamType::Array => match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Array(_)) => Ok(v),
            _ => Err("Expected a JSON array".to_string()),
        },
        ParamType::Date => {
            let trimmed = raw.trim();
            if DateTime::parse_from_rfc3339(trimmed).is_ok()
                || NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
            {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(format!("'{}' is not a date (YYYY-MM-DD or RFC 3339)", raw))
            }
        }
    }
}

fn json_body(values: &[Coerced<'_>]) -> String {
    let map: Map<String, Value> = values
        .iter()
        .map(|v| (v.param.key.clone(), v.typed.clone()))
        .collect();
    Value::Object(map).to_string()
}

fn form_body(values: &[Coerced<'_>]) -> String {
    values
        .iter()
        .map(|v| {
            format!(
                "{}={}",
                urlencoding::encode(&v.param.key),
                urlencoding::encode(v.raw)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn text_body(values: &[Coerced<'_>]) -> String {
    values
        .iter()
        .map(|v| format!("{}={}\n", v.param.key, v.raw))
        .collect()
}

fn multipart_body(values: &[Coerced<'_>], boundary: &str) -> String {
    let mut body = String::new();
    for v in values {
        body.push_str(&format!("--{}\r\n", boundary));
        if v.param.param_type == ParamType::File {
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                v.param.key, v.raw
            ));
            body.push_str("Content-Type: application/octet-stream\r\n\r\n\r\n");
        } else {
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                v.param.key, v.raw
            ));
        }
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::{HttpMethod, ServiceDraft};
    use crate::validation::{validate_service, ValidationPolicy};
    use crate::models::parameter::ParameterDraft;

    fn nv(name: &str, value: &str) -> NameValue {
        NameValue {
            name: name.into(),
            value: value.into(),
        }
    }

    fn service(method: &str, content_type: &str, params: &[(&str, &str, bool)]) -> ServiceDefinition {
        let draft = ServiceDraft {
            name: "User Data Service".into(),
            category: "Users".into(),
            source: "users_db".into(),
            endpoint: "/api/users/user-data-service".into(),
            method: Some(method.into()),
            content_type: Some(content_type.into()),
            input_params: params
                .iter()
                .map(|(k, t, r)| ParameterDraft {
                    key: k.to_string(),
                    param_type: t.to_string(),
                    title: None,
                    required: *r,
                })
                .collect(),
            ..ServiceDraft::default()
        };
        validate_service(&draft, &ValidationPolicy::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn test_get_puts_values_in_query() {
        let def = service("GET", "application/json", &[("limit", "number", false), ("offset", "number", false)]);
        let input = TestInput {
            parameters: vec![nv("limit", "10"), nv("offset", "0"), nv("debug", "1")],
            ..TestInput::default()
        };
        let req = PreparedRequest::build(&def, &input, &base()).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(
            req.url,
            "http://localhost:8080/api/users/user-data-service?limit=10&offset=0"
        );
        assert!(req.body.is_none());
        assert_eq!(req.ignored, vec!["debug"]);
        assert_eq!(req.headers[0], nv("Content-Type", "application/json"));
    }

    #[test]
    fn test_post_json_body_is_typed() {
        let def = service(
            "POST",
            "application/json",
            &[("id", "number", true), ("active", "boolean", false), ("tags", "array", false)],
        );
        let input = TestInput {
            parameters: vec![nv("id", "42"), nv("active", "TRUE"), nv("tags", r#"["a","b"]"#)],
            ..TestInput::default()
        };
        let req = PreparedRequest::build(&def, &input, &base()).unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["id"], 42);
        assert_eq!(body["active"], true);
        assert_eq!(body["tags"][1], "b");
    }

    #[test]
    fn test_form_and_text_bodies_keep_param_order() {
        let params = [("q", "string", false), ("page", "number", false)];
        let input = TestInput {
            parameters: vec![nv("page", "2"), nv("q", "a b&c")],
            ..TestInput::default()
        };

        let form = service("PUT", "application/x-www-form-urlencoded", &params);
        let req = PreparedRequest::build(&form, &input, &base()).unwrap();
        assert_eq!(req.body.as_deref(), Some("q=a%20b%26c&page=2"));

        let text = service("PATCH", "text/plain", &params);
        let req = PreparedRequest::build(&text, &input, &base()).unwrap();
        assert_eq!(req.body.as_deref(), Some("q=a b&c\npage=2\n"));
    }

    #[test]
    fn test_multipart_sets_boundary() {
        let def = service("POST", "multipart/form-data", &[("title", "string", true), ("upload", "file", true)]);
        let input = TestInput {
            parameters: vec![nv("title", "Report"), nv("upload", "report.pdf")],
            ..TestInput::default()
        };
        let req = PreparedRequest::build(&def, &input, &base()).unwrap();
        let ct = &req.headers[0].value;
        let boundary = ct.strip_prefix("multipart/form-data; boundary=").unwrap();
        let body = req.body.unwrap();
        assert!(body.starts_with(&format!("--{}\r\n", boundary)));
        assert!(body.contains("name=\"upload\"; filename=\"report.pdf\""));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
    }

    #[test]
    fn test_missing_and_malformed_values_reported_together() {
        let def = service(
            "POST",
            "application/json",
            &[("id", "number", true), ("from", "date", false), ("filter", "object", false)],
        );
        let input = TestInput {
            parameters: vec![nv("id", ""), nv("from", "yesterday"), nv("filter", "[1]")],
            ..TestInput::default()
        };
        match PreparedRequest::build(&def, &input, &base()) {
            Err(HarnessError::Invalid(errs)) => {
                assert_eq!(errs.get("parameters.id"), Some("Value is required"));
                assert!(errs.contains("parameters.from"));
                assert_eq!(errs.get("parameters.filter"), Some("Expected a JSON object"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_dates_accept_both_forms() {
        assert!(coerce(ParamType::Date, "2025-03-10").is_ok());
        assert!(coerce(ParamType::Date, "2025-03-10T09:15:00Z").is_ok());
        assert!(coerce(ParamType::Date, "10/03/2025").is_err());
        assert_eq!(coerce(ParamType::Number, "1.5").unwrap(), serde_json::json!(1.5));
        assert!(coerce(ParamType::Number, "NaN").is_err());
    }

    #[test]
    fn test_user_content_type_header_replaced() {
        let def = service("DELETE", "text/plain", &[]);
        let input = TestInput {
            headers: vec![nv("content-type", "application/xml"), nv("Authorization", "Bearer t")],
            ..TestInput::default()
        };
        let req = PreparedRequest::build(&def, &input, &base()).unwrap();
        assert_eq!(req.method, HttpMethod::Delete.as_str());
        assert_eq!(req.headers, vec![nv("Content-Type", "text/plain"), nv("Authorization", "Bearer t")]);
    }

    #[test]
    fn test_private_service_denies_unlisted_caller() {
        let mut def = service("GET", "application/json", &[]);
        def.accessibility = crate::models::service::Accessibility::Private;
        def.selected_roles.insert(1);
        let denied = PreparedRequest::build(&def, &TestInput::default(), &base());
        assert!(matches!(denied, Err(HarnessError::Denied { .. })));

        let input = TestInput {
            roles: vec![1],
            ..TestInput::default()
        };
        assert!(PreparedRequest::build(&def, &input, &base()).is_ok());
    }

    #[test]
    fn test_endpoint_cannot_leave_base_host() {
        let mut def = service("GET", "application/json", &[]);
        def.endpoint = "//evil.example/steal".into();
        match PreparedRequest::build(&def, &TestInput::default(), &base()) {
            Err(HarnessError::Invalid(errs)) => assert!(errs.contains("endpoint")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_response_filename() {
        assert_eq!(response_filename("User Data Service"), "user-data-service-response.json");
    }
}
