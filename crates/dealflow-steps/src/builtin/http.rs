use std::collections::HashMap;

use async_trait::async_trait;
use dealflow_items::value::display_string;
use reqwest::{Client, Method};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::HTTP_REQUEST;
use crate::error::StepError;
use crate::step::{Step, StepInput};

/// Calls an HTTP endpoint and returns a `{success, data}` envelope.
///
/// Non-2xx responses are declared failures; transport errors are raised.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestStep {
  client: Client,
}

impl HttpRequestStep {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_client(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Step for HttpRequestStep {
  fn label(&self) -> &str {
    HTTP_REQUEST
  }

  async fn run(&self, input: StepInput) -> Result<Value, StepError> {
    let endpoint = input
      .non_empty("endpoint")
      .ok_or_else(|| StepError::invalid_input("endpoint", "an endpoint URL is required"))?;
    let method = parse_method(&input.non_empty("httpMethod").unwrap_or_else(|| "GET".to_string()))?;
    let headers = parse_headers(input.get("httpHeaders"))?;

    let mut request = self.client.request(method.clone(), &endpoint);
    for (key, value) in &headers {
      request = request.header(key, value);
    }
    if method != Method::GET && method != Method::HEAD {
      match input.get("httpBody") {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) if text.trim().is_empty() => {}
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
          Ok(body) => request = request.json(&body),
          Err(_) => request = request.body(text.clone()),
        },
        Some(body) => request = request.json(body),
      }
    }

    debug!(method = %method, endpoint = %endpoint, "http_request_started");
    let response = request.send().await?;

    let status = response.status();
    let response_headers: HashMap<String, String> = response
      .headers()
      .iter()
      .filter_map(|(k, v)| {
        v.to_str()
          .ok()
          .map(|val| (k.as_str().to_string(), val.to_string()))
      })
      .collect();
    let text = response.text().await?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    debug!(status = status.as_u16(), "http_request_completed");

    if !status.is_success() {
      return Ok(json!({
        "success": false,
        "error": format!("HTTP {}: {}", status.as_u16(), display_string(&body)),
      }));
    }

    Ok(json!({
      "success": true,
      "data": {
        "status": status.as_u16(),
        "headers": response_headers,
        "body": body,
      },
    }))
  }
}

fn parse_method(method: &str) -> Result<Method, StepError> {
  match method.to_uppercase().as_str() {
    "GET" => Ok(Method::GET),
    "POST" => Ok(Method::POST),
    "PUT" => Ok(Method::PUT),
    "DELETE" => Ok(Method::DELETE),
    "PATCH" => Ok(Method::PATCH),
    "HEAD" => Ok(Method::HEAD),
    "OPTIONS" => Ok(Method::OPTIONS),
    _ => Err(StepError::invalid_input(
      "httpMethod",
      format!("unsupported HTTP method: {}", method),
    )),
  }
}

/// Headers as a JSON object, given inline or as JSON text. Values are
/// stringified.
fn parse_headers(headers: Option<&Value>) -> Result<Vec<(String, String)>, StepError> {
  let map: Map<String, Value> = match headers {
    None | Some(Value::Null) => return Ok(Vec::new()),
    Some(Value::String(text)) if text.trim().is_empty() => return Ok(Vec::new()),
    Some(Value::String(text)) => serde_json::from_str(text)
      .map_err(|e| StepError::invalid_input("httpHeaders", e.to_string()))?,
    Some(Value::Object(map)) => map.clone(),
    Some(_) => {
      return Err(StepError::invalid_input(
        "httpHeaders",
        "headers must be a JSON object",
      ));
    }
  };
  Ok(
    map
      .iter()
      .map(|(k, v)| (k.clone(), display_string(v)))
      .collect(),
  )
}
