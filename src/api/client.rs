use std::time::Duration;

use crate::api::model::{ClassifyRequest, CommentRecord};
use crate::api::{ApiError, CommentApi};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Blocking HTTP client for the classification API.
pub struct HttpCommentApi {
    base_url: String,
    #[cfg(feature = "network")]
    client: reqwest::blocking::Client,
}

impl HttpCommentApi {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/comments/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(feature = "network")]
mod http {
    use super::*;
    use crate::api::model::ErrorBody;
    use reqwest::blocking::{RequestBuilder, Response};
    use serde::de::DeserializeOwned;
    use tracing::{debug, warn};

    impl HttpCommentApi {
        pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            Ok(Self {
                base_url: base_url.to_string(),
                client,
            })
        }

        fn send(&self, request: RequestBuilder, api_key: &str) -> Result<Response, ApiError> {
            let response = request
                .header(API_KEY_HEADER, api_key)
                .send()
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            let status = response.status();
            debug!(status = status.as_u16(), url = %response.url(), "api response");
            if status.is_success() {
                return Ok(response);
            }
            let message = response
                .json::<ErrorBody>()
                .ok()
                .and_then(|body| body.error);
            warn!(status = status.as_u16(), ?message, "api request rejected");
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }

        fn get_json<T: DeserializeOwned>(&self, path: &str, api_key: &str) -> Result<T, ApiError> {
            let response = self.send(self.client.get(self.url(path)), api_key)?;
            response
                .json::<T>()
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
    }

    impl CommentApi for HttpCommentApi {
        fn comment_by_id(&self, api_key: &str, id: &str) -> Result<CommentRecord, ApiError> {
            self.get_json(&format!("article/{id}"), api_key)
        }

        fn random_comments(
            &self,
            api_key: &str,
            count: usize,
        ) -> Result<Vec<CommentRecord>, ApiError> {
            self.get_json(&format!("random/{count}"), api_key)
        }

        fn classify(
            &self,
            api_key: &str,
            comment_id: &str,
            body: &ClassifyRequest,
        ) -> Result<(), ApiError> {
            let request = self
                .client
                .post(self.url(&format!("classify/{comment_id}")))
                .json(body);
            self.send(request, api_key).map(|_| ())
        }
    }
}

#[cfg(not(feature = "network"))]
impl HttpCommentApi {
    pub fn new(base_url: &str, _timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.to_string(),
        })
    }
}

#[cfg(not(feature = "network"))]
impl CommentApi for HttpCommentApi {
    fn comment_by_id(&self, _api_key: &str, _id: &str) -> Result<CommentRecord, ApiError> {
        Err(ApiError::Offline)
    }

    fn random_comments(&self, _api_key: &str, _count: usize) -> Result<Vec<CommentRecord>, ApiError> {
        Err(ApiError::Offline)
    }

    fn classify(
        &self,
        _api_key: &str,
        _comment_id: &str,
        _body: &ClassifyRequest,
    ) -> Result<(), ApiError> {
        Err(ApiError::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = HttpCommentApi::new("https://api.example.org/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.url("random/1"),
            "https://api.example.org/api/comments/random/1"
        );
        let api = HttpCommentApi::new("http://localhost:3000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.url("classify/c1"),
            "http://localhost:3000/api/comments/classify/c1"
        );
    }
}
