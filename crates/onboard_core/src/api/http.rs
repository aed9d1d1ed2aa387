//! Blocking HTTP implementation of the onboarding API.
//!
//! # Invariants
//! - Every request carries a generated request id in its log events.
//! - Bearer tokens and passwords are never written to logs.

use super::{
    ApiError, ApiResponse, ApiResult, AuthApi, Credentials, LoginPayload, OnboardingApi,
    TaskStatusUpdate,
};
use crate::config::ClientConfig;
use crate::logging::{redact_token, sanitize_log_value};
use crate::model::form::FeedbackForm;
use crate::model::identity::UserRecord;
use crate::model::task::{NewTask, TaskRecord, TaskStatus};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct HttpApiClient {
    base_url: Url,
    http: Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim().trim_end_matches('/'))
            .map_err(|err| ApiError::InvalidRequest(format!("base url `{raw}`: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base url `{raw}` must be an http(s) url"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends each segment to the base path, percent-encoding it whole.
    /// Empty, `.` and `..` segments are rejected.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(ApiError::InvalidRequest(format!(
                "path segment `{bad}` is not addressable"
            )));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::InvalidRequest(format!("base url `{}` has no path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> ApiResult<RequestBuilder> {
        let builder = self.http.request(method, self.endpoint(segments)?);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse<T>> {
        let request_id = Uuid::new_v4();
        let session = token.map_or_else(|| "none".to_string(), redact_token);
        let started_at = Instant::now();

        let response = match request.send() {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=api_request module=api status=error op={operation} request_id={request_id} session={session} duration_ms={} error_code=transport error={}",
                    started_at.elapsed().as_millis(),
                    sanitize_log_value(&err.to_string())
                );
                return Err(ApiError::Transport(err.to_string()));
            }
        };

        let http_status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let decoded = decode_envelope::<T>(http_status, &body);

        match &decoded {
            Ok(envelope) => debug!(
                "event=api_request module=api status=ok op={operation} request_id={request_id} session={session} http_status={http_status} success={} duration_ms={}",
                envelope.success,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=api_request module=api status=error op={operation} request_id={request_id} session={session} http_status={http_status} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                sanitize_log_value(&err.to_string())
            ),
        }
        decoded
    }
}

/// Decodes a response body into an envelope.
///
/// A body that is an envelope is returned as-is even on non-2xx statuses,
/// so server-side refusals keep their `error` message.
pub fn decode_envelope<T: DeserializeOwned>(
    http_status: u16,
    body: &str,
) -> ApiResult<ApiResponse<T>> {
    match serde_json::from_str::<ApiResponse<T>>(body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !(200..300).contains(&http_status) => Err(ApiError::Status {
            code: http_status,
            body: sanitize_log_value(body),
        }),
        Err(err) => Err(ApiError::Decode(err.to_string())),
    }
}

impl AuthApi for HttpApiClient {
    fn login(&self, credentials: &Credentials) -> ApiResult<ApiResponse<LoginPayload>> {
        let request = self
            .request(Method::POST, &["auth", "login"], None)?
            .json(credentials);
        self.send("login", request, None)
    }
}

impl OnboardingApi for HttpApiClient {
    fn list_users(&self, token: &str) -> ApiResult<ApiResponse<Vec<UserRecord>>> {
        let request = self.request(Method::GET, &["users"], Some(token))?;
        self.send("list_users", request, Some(token))
    }

    fn list_tasks(&self, token: &str) -> ApiResult<ApiResponse<Vec<TaskRecord>>> {
        let request = self.request(Method::GET, &["tasks"], Some(token))?;
        self.send("list_tasks", request, Some(token))
    }

    fn list_forms(&self, token: &str) -> ApiResult<ApiResponse<Vec<FeedbackForm>>> {
        let request = self.request(Method::GET, &["forms"], Some(token))?;
        self.send("list_forms", request, Some(token))
    }

    fn create_task(&self, token: &str, task: &NewTask) -> ApiResult<ApiResponse<TaskRecord>> {
        let request = self
            .request(Method::POST, &["tasks"], Some(token))?
            .json(task);
        self.send("create_task", request, Some(token))
    }

    fn update_task_status(
        &self,
        token: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ApiResult<ApiResponse<TaskRecord>> {
        let request = self
            .request(Method::PATCH, &["tasks", task_id], Some(token))?
            .json(&TaskStatusUpdate { status });
        self.send("update_task_status", request, Some(token))
    }

    fn delete_task(
        &self,
        token: &str,
        task_id: &str,
    ) -> ApiResult<ApiResponse<serde_json::Value>> {
        let request = self.request(Method::DELETE, &["tasks", task_id], Some(token))?;
        self.send("delete_task", request, Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_envelope, HttpApiClient};
    use crate::api::{ApiError, ApiResponse, AuthApi, Credentials, OnboardingApi};
    use crate::model::task::TaskRecord;
    use reqwest::Method;
    use std::time::Duration;

    fn local_client(base_url: &str) -> HttpApiClient {
        HttpApiClient::new(base_url, Duration::from_secs(1)).expect("client builds")
    }

    #[test]
    fn endpoint_joins_without_duplicate_slashes() {
        let client = local_client("http://localhost:5000/api/");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(
            client.endpoint(&["tasks"]).expect("tasks url").as_str(),
            "http://localhost:5000/api/tasks"
        );
        assert_eq!(
            client.endpoint(&["auth", "login"]).expect("login url").as_str(),
            "http://localhost:5000/api/auth/login"
        );

        let root = local_client("http://localhost:5000/");
        assert_eq!(
            root.endpoint(&["users"]).expect("users url").as_str(),
            "http://localhost:5000/users"
        );
    }

    #[test]
    fn task_ids_stay_inside_one_path_segment() {
        let client = local_client("http://localhost:5000/api");

        let request = client
            .request(Method::DELETE, &["tasks", "1/../../users"], Some("tok"))
            .expect("request builds")
            .build()
            .expect("request is valid");
        assert_eq!(
            request.url().as_str(),
            "http://localhost:5000/api/tasks/1%2F..%2F..%2Fusers"
        );

        let request = client
            .request(Method::PATCH, &["tasks", "a?x=1#f"], Some("tok"))
            .expect("request builds")
            .build()
            .expect("request is valid");
        assert_eq!(request.url().path(), "/api/tasks/a%3Fx=1%23f");
        assert_eq!(request.url().query(), None);
        assert_eq!(request.url().fragment(), None);
    }

    #[test]
    fn dot_segments_are_refused_before_sending() {
        let client = local_client("http://127.0.0.1:1/api");
        for task_id in ["..", ".", ""] {
            let err = client
                .delete_task("tok", task_id)
                .expect_err("dot segment must not be sent");
            assert!(matches!(err, ApiError::InvalidRequest(_)), "{task_id:?}: {err}");
        }
    }

    #[test]
    fn base_url_must_be_http() {
        for raw in ["localhost:5000", "ftp://files.local/api", "not a url"] {
            assert!(matches!(
                HttpApiClient::new(raw, Duration::from_secs(1)),
                Err(ApiError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn decode_keeps_envelope_on_error_status() {
        let decoded: ApiResponse<Vec<TaskRecord>> =
            decode_envelope(401, r#"{"success":false,"error":"Invalid credentials"}"#)
                .expect("envelope should decode");
        assert!(!decoded.success);
        assert_eq!(decoded.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn decode_maps_non_envelope_bodies_by_status() {
        let status = decode_envelope::<Vec<TaskRecord>>(502, "<html>Bad Gateway</html>")
            .expect_err("html body on 502 is a status error");
        assert!(matches!(status, ApiError::Status { code: 502, .. }));

        let decode = decode_envelope::<Vec<TaskRecord>>(200, "[]")
            .expect_err("bare array is not an envelope");
        assert!(matches!(decode, ApiError::Decode(_)));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let client = local_client("http://127.0.0.1:1");
        let err = client
            .login(&Credentials::new("a@x.com", "pw"))
            .expect_err("nothing listens on port 1");
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
