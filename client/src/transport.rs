use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one `HttpRequest` against the network (or a stand-in).
///
/// Non-2xx statuses are data, not errors: implementations return them as an
/// `HttpResponse` and leave interpretation to `TodoClient::parse_*`. Only
/// failures that produced no response map to `ApiError::Transport`.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Run `request` on `transport`, bounded by the request's own timeout.
pub async fn execute_with_timeout<T: Transport>(
    transport: &T,
    request: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let limit = request.timeout;
    match tokio::time::timeout(limit, transport.execute(request)).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Transport(format!(
            "request timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

/// Blocking ureq agent driven from tokio's blocking pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `ceiling` bounds how long a blocking call may outlive its caller's
    /// timeout; it should be at least the longest request timeout.
    pub fn new(ceiling: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(ceiling))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || call(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

fn call(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    tracing::trace!(method = ?req.method, path = %req.path, "sending request");
    let result = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => agent
            .post(&req.path)
            .content_type("application/json")
            .send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => agent
            .put(&req.path)
            .content_type("application/json")
            .send(body.as_bytes()),
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}
