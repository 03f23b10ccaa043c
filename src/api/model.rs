use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::ApiError;
use crate::classify::category::Category;

/// A comment as the API sends it. Every field is optional on the wire; use
/// `Comment::try_from` to get something the view can display.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentRecord {
    #[serde(default, deserialize_with = "opaque_id")]
    pub comment_id: Option<String>,
    pub comment_content: Option<String>,
    #[serde(default)]
    pub is_from_author: bool,
    pub doi_article: Option<String>,
    pub title_article: Option<String>,
    pub authors_article: Option<String>,
    pub journal_article: Option<String>,
    pub url_article: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub classifications: Vec<ClassificationEntry>,
}

/// A previously recorded classification. The server owns the shape, so
/// nothing here is required.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ClassificationEntry {
    pub category: Option<String>,
    pub user: Option<String>,
    #[serde(alias = "date", alias = "timestamp", alias = "createdAt")]
    pub created_at: Option<String>,
}

impl ClassificationEntry {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A fully loaded comment: id and content are always present.
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub comment_id: String,
    pub content: String,
    pub is_from_author: bool,
    pub article_doi: Option<String>,
    pub article_title: Option<String>,
    pub article_authors: Option<String>,
    pub article_journal: Option<String>,
    pub article_url: Option<String>,
    pub classifications: Vec<ClassificationEntry>,
}

impl Comment {
    pub fn doi_url(&self) -> Option<String> {
        self.article_doi
            .as_deref()
            .map(|doi| format!("https://doi.org/{doi}"))
    }

    pub fn pubpeer_search_url(&self) -> Option<String> {
        self.article_doi
            .as_deref()
            .map(|doi| format!("https://pubpeer.com/search?q={doi}"))
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ApiError;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let comment_id = record
            .comment_id
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::Incomplete("comment_id"))?;
        let content = record
            .comment_content
            .ok_or(ApiError::Incomplete("comment_content"))?;
        Ok(Self {
            comment_id,
            content,
            is_from_author: record.is_from_author,
            article_doi: record.doi_article,
            article_title: record.title_article,
            article_authors: record.authors_article,
            article_journal: record.journal_article,
            article_url: record.url_article,
            classifications: record.classifications,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassifyRequest {
    pub category: Category,
    pub user: String,
}

/// Body the API returns alongside a non-success status.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Uint(n) => n.to_string(),
    }))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ClassificationEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ClassificationEntry>>::deserialize(deserializer)?.unwrap_or_default())
}
