pub mod client;
pub mod model;
pub mod worker;

use thiserror::Error;
use tracing::debug;

use model::{ClassifyRequest, Comment, CommentRecord};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server returned {status}")]
    Status { status: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("response is missing `{0}`")]
    Incomplete(&'static str),
    #[error("network support is disabled in this build")]
    Offline,
}

impl ApiError {
    /// Text shown to the user when a submission fails: the server's own
    /// message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            ApiError::Status { status, .. } => format!("Server error {status}"),
            other => other.to_string(),
        }
    }
}

/// The remote classification API. Every call forwards `api_key` unchanged.
pub trait CommentApi: Send + Sync {
    fn comment_by_id(&self, api_key: &str, id: &str) -> Result<CommentRecord, ApiError>;
    fn random_comments(&self, api_key: &str, count: usize) -> Result<Vec<CommentRecord>, ApiError>;
    fn classify(
        &self,
        api_key: &str,
        comment_id: &str,
        body: &ClassifyRequest,
    ) -> Result<(), ApiError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApiRequest {
    CommentById(String),
    RandomComment,
    Classify {
        comment_id: String,
        body: ClassifyRequest,
    },
}

/// A request tagged with the generation that issued it.
#[derive(Clone, Debug, PartialEq)]
pub struct Ticket {
    pub generation: u64,
    pub api_key: String,
    pub request: ApiRequest,
}

#[derive(Debug)]
pub enum ApiResponse {
    /// `None` when a random fetch came back empty.
    Comment(Option<Comment>),
    Classified,
}

pub type Outcome = Result<ApiResponse, ApiError>;

pub fn execute(api: &dyn CommentApi, ticket: &Ticket) -> Outcome {
    let key = ticket.api_key.as_str();
    match &ticket.request {
        ApiRequest::CommentById(id) => {
            let record = api.comment_by_id(key, id)?;
            Ok(ApiResponse::Comment(Some(Comment::try_from(record)?)))
        }
        ApiRequest::RandomComment => {
            let records = api.random_comments(key, 1)?;
            debug!(count = records.len(), "random comments received");
            match records.into_iter().next() {
                Some(record) => Ok(ApiResponse::Comment(Some(Comment::try_from(record)?))),
                None => Ok(ApiResponse::Comment(None)),
            }
        }
        ApiRequest::Classify { comment_id, body } => {
            api.classify(key, comment_id, body)?;
            Ok(ApiResponse::Classified)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::category::Category;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        keys: Mutex<Vec<String>>,
        random: Vec<CommentRecord>,
    }

    impl CommentApi for Recorder {
        fn comment_by_id(&self, api_key: &str, id: &str) -> Result<CommentRecord, ApiError> {
            self.keys.lock().unwrap().push(api_key.to_string());
            Ok(CommentRecord {
                comment_id: Some(id.to_string()),
                comment_content: Some("body".into()),
                ..Default::default()
            })
        }

        fn random_comments(
            &self,
            api_key: &str,
            _count: usize,
        ) -> Result<Vec<CommentRecord>, ApiError> {
            self.keys.lock().unwrap().push(api_key.to_string());
            Ok(self.random.clone())
        }

        fn classify(
            &self,
            _api_key: &str,
            _comment_id: &str,
            _body: &ClassifyRequest,
        ) -> Result<(), ApiError> {
            Err(ApiError::Status {
                status: 409,
                message: Some("already classified".into()),
            })
        }
    }

    fn ticket(request: ApiRequest) -> Ticket {
        Ticket {
            generation: 1,
            api_key: "k-123".into(),
            request,
        }
    }

    #[test]
    fn test_execute_by_id_forwards_key() {
        let api = Recorder::default();
        let outcome = execute(&api, &ticket(ApiRequest::CommentById("c9".into())));
        match outcome {
            Ok(ApiResponse::Comment(Some(c))) => assert_eq!(c.comment_id, "c9"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(api.keys.lock().unwrap().as_slice(), ["k-123"]);
    }

    #[test]
    fn test_execute_random_empty_is_none() {
        let api = Recorder::default();
        let outcome = execute(&api, &ticket(ApiRequest::RandomComment));
        assert!(matches!(outcome, Ok(ApiResponse::Comment(None))));
    }

    #[test]
    fn test_execute_random_incomplete_record_fails() {
        let api = Recorder {
            random: vec![CommentRecord {
                comment_id: Some("c1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let outcome = execute(&api, &ticket(ApiRequest::RandomComment));
        assert!(matches!(outcome, Err(ApiError::Incomplete(_))));
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let api = Recorder::default();
        let err = execute(
            &api,
            &ticket(ApiRequest::Classify {
                comment_id: "c1".into(),
                body: ClassifyRequest {
                    category: Category::Clarification,
                    user: "ann".into(),
                },
            }),
        )
        .unwrap_err();
        assert_eq!(err.user_message(), "already classified");
    }

    #[test]
    fn test_user_message_falls_back_to_status() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), "Server error 500");
        let err = ApiError::Status {
            status: 502,
            message: Some(String::new()),
        };
        assert_eq!(err.user_message(), "Server error 502");
    }
}
