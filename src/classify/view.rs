use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::api::model::{ClassifyRequest, Comment};
use crate::api::{ApiRequest, ApiResponse, Outcome, Ticket};
use crate::classify::category::Category;
use crate::classify::guard::{NavGuard, RouteDecision};
use crate::router::HistoryMode;
use crate::store::session::Credentials;

pub const SELECT_CATEGORY_WARNING: &str = "Select a category before submitting.";
pub const LOAD_ERROR: &str = "Error while loading the comment.";
pub const NEXT_ERROR: &str = "Error while loading the next comment.";

// Process-wide so outcomes addressed to a torn-down view never match a
// ticket issued after a reload.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    /// A random fetch succeeded but returned nothing.
    Empty,
    Failed(String),
}

/// What the view asks its host to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Request(Ticket),
    Navigate {
        comment_id: String,
        mode: HistoryMode,
    },
    /// Blocking message the user has to dismiss.
    Alert(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchKind {
    /// Comment named by the route.
    Target,
    /// No route target: load a random comment and replace the location.
    Initial,
    /// Skip or post-submit advance: load a random comment and push.
    Next,
}

#[derive(Clone, Debug)]
struct PendingSubmit {
    generation: u64,
    comment_id: String,
    category: Category,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub comment_id: String,
    pub category: Category,
    pub at: DateTime<Local>,
}

pub struct ClassifyView {
    phase: Phase,
    comment: Option<Comment>,
    category: Option<Category>,
    submitting: bool,
    target: Option<String>,
    mounted: bool,
    credentials: Option<Credentials>,
    guard: NavGuard,
    pending_fetch: Option<(u64, FetchKind)>,
    /// Survives fetches: its outcome is always reported.
    pending_submit: Option<PendingSubmit>,
    submissions: Vec<Submission>,
    pub cursor: usize,
}

impl Default for ClassifyView {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifyView {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            comment: None,
            category: None,
            submitting: false,
            target: None,
            mounted: false,
            credentials: None,
            guard: NavGuard::default(),
            pending_fetch: None,
            pending_submit: None,
            submissions: Vec::new(),
            cursor: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn guard(&self) -> NavGuard {
        self.guard
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn can_submit(&self) -> bool {
        self.category.is_some() && !self.submitting && self.phase == Phase::Loaded
    }

    pub fn can_skip(&self) -> bool {
        !self.submitting && self.credentials.is_some()
    }

    /// Supplies (or withdraws) the session. Becoming authenticated while
    /// mounted starts the first load.
    pub fn set_credentials(&mut self, credentials: Option<Credentials>) -> Vec<Effect> {
        let was_missing = self.credentials.is_none();
        self.credentials = credentials;
        if self.credentials.is_none() {
            self.phase = Phase::Idle;
            self.pending_fetch = None;
            self.pending_submit = None;
            self.submitting = false;
            return Vec::new();
        }
        if was_missing && self.mounted {
            return self.fetch_current();
        }
        Vec::new()
    }

    pub fn mount(&mut self, target: Option<String>) -> Vec<Effect> {
        self.target = target;
        self.mounted = true;
        self.fetch_current()
    }

    /// The route's comment target changed. Changes caused by this view's own
    /// navigation are swallowed; anything else reloads.
    pub fn on_route_change(&mut self, target: Option<String>) -> Vec<Effect> {
        if !self.mounted {
            return self.mount(target);
        }
        if target == self.target {
            return Vec::new();
        }
        self.target = target;
        if self.credentials.is_none() {
            return Vec::new();
        }
        match self.guard.on_route_change() {
            RouteDecision::Suppress => {
                debug!(target = ?self.target, "route change was self-initiated, not refetching");
                Vec::new()
            }
            RouteDecision::Fetch => self.fetch_current(),
        }
    }

    pub fn retry(&mut self) -> Vec<Effect> {
        self.fetch_current()
    }

    pub fn skip(&mut self) -> Vec<Effect> {
        if self.submitting {
            return Vec::new();
        }
        self.begin_fetch(FetchKind::Next, ApiRequest::RandomComment)
    }

    pub fn select(&mut self, category: Category) {
        if self.phase != Phase::Loaded {
            return;
        }
        self.category = Some(category);
        self.cursor = category.index();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = Category::ALL.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    pub fn select_cursor(&mut self) {
        if let Some(category) = Category::from_index(self.cursor) {
            self.select(category);
        }
    }

    pub fn submit(&mut self) -> Vec<Effect> {
        if self.submitting {
            return Vec::new();
        }
        let (Some(category), Some(comment)) = (self.category, self.comment.as_ref()) else {
            warn!("submit attempted without a category or comment");
            return vec![Effect::Alert(SELECT_CATEGORY_WARNING.to_string())];
        };
        let Some(credentials) = self.credentials.as_ref() else {
            return Vec::new();
        };

        let generation = next_generation();
        let comment_id = comment.comment_id.clone();
        info!(%comment_id, %category, "submitting classification");
        self.submitting = true;
        self.pending_submit = Some(PendingSubmit {
            generation,
            comment_id: comment_id.clone(),
            category,
        });
        vec![Effect::Request(Ticket {
            generation,
            api_key: credentials.api_key.clone(),
            request: ApiRequest::Classify {
                comment_id,
                body: ClassifyRequest {
                    category,
                    user: credentials.nickname.clone(),
                },
            },
        })]
    }

    pub fn on_outcome(&mut self, generation: u64, outcome: Outcome) -> Vec<Effect> {
        if let Some((pending, kind)) = self.pending_fetch
            && pending == generation
        {
            self.pending_fetch = None;
            return self.finish_fetch(kind, outcome);
        }
        if let Some(pending) = self.pending_submit.take_if(|p| p.generation == generation) {
            return self.finish_submit(pending, outcome);
        }
        debug!(generation, "dropping stale api outcome");
        Vec::new()
    }

    fn fetch_current(&mut self) -> Vec<Effect> {
        match self.target.clone() {
            Some(id) => self.begin_fetch(FetchKind::Target, ApiRequest::CommentById(id)),
            None => self.begin_fetch(FetchKind::Initial, ApiRequest::RandomComment),
        }
    }

    fn begin_fetch(&mut self, kind: FetchKind, request: ApiRequest) -> Vec<Effect> {
        let Some(credentials) = self.credentials.as_ref() else {
            return Vec::new();
        };
        let api_key = credentials.api_key.clone();
        self.guard.settle();
        self.phase = Phase::Loading;
        self.comment = None;
        self.category = None;

        let generation = next_generation();
        debug!(generation, ?kind, ?request, "fetch started");
        self.pending_fetch = Some((generation, kind));
        vec![Effect::Request(Ticket {
            generation,
            api_key,
            request,
        })]
    }

    fn finish_fetch(&mut self, kind: FetchKind, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Ok(ApiResponse::Comment(Some(comment))) => {
                let comment_id = comment.comment_id.clone();
                info!(%comment_id, "comment loaded");
                self.comment = Some(comment);
                self.phase = Phase::Loaded;

                let mode = match kind {
                    FetchKind::Target => return Vec::new(),
                    FetchKind::Initial => HistoryMode::Replace,
                    FetchKind::Next => HistoryMode::Push,
                };
                if self.target.as_deref() == Some(comment_id.as_str()) {
                    return Vec::new();
                }
                self.guard.arm();
                vec![Effect::Navigate { comment_id, mode }]
            }
            Ok(ApiResponse::Comment(None)) => {
                info!("no comment available");
                self.phase = Phase::Empty;
                Vec::new()
            }
            Ok(ApiResponse::Classified) => {
                warn!("classification response arrived for a fetch ticket");
                Vec::new()
            }
            Err(err) => {
                error!(%err, ?kind, "failed to load comment");
                self.comment = None;
                self.phase = Phase::Failed(
                    match kind {
                        FetchKind::Next => NEXT_ERROR,
                        FetchKind::Target | FetchKind::Initial => LOAD_ERROR,
                    }
                    .to_string(),
                );
                Vec::new()
            }
        }
    }

    fn finish_submit(&mut self, pending: PendingSubmit, outcome: Outcome) -> Vec<Effect> {
        self.submitting = false;
        match outcome {
            Ok(_) => {
                info!(comment_id = %pending.comment_id, category = %pending.category, "classification recorded");
                // Advance only from the submitted comment; a navigation made
                // while the POST was in flight wins.
                let still_shown = self.pending_fetch.is_none()
                    && self
                        .comment
                        .as_ref()
                        .is_some_and(|c| c.comment_id == pending.comment_id);
                self.submissions.push(Submission {
                    comment_id: pending.comment_id,
                    category: pending.category,
                    at: Local::now(),
                });
                if !still_shown {
                    debug!("view moved on during submit, not advancing");
                    return Vec::new();
                }
                self.begin_fetch(FetchKind::Next, ApiRequest::RandomComment)
            }
            Err(err) => {
                error!(comment_id = %pending.comment_id, %err, "classification failed");
                vec![Effect::Alert(format!("Error: {}", err.user_message()))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::model::CommentRecord;

    fn creds() -> Credentials {
        Credentials {
            api_key: "key".into(),
            nickname: "ann".into(),
        }
    }

    fn comment(id: &str) -> Comment {
        Comment::try_from(CommentRecord {
            comment_id: Some(id.into()),
            comment_content: Some("<p>text</p>".into()),
            ..Default::default()
        })
        .unwrap()
    }

    fn only_ticket(effects: &[Effect]) -> Ticket {
        match effects {
            [Effect::Request(ticket)] => ticket.clone(),
            other => panic!("expected a single request, got {other:?}"),
        }
    }

    fn authed_view() -> ClassifyView {
        let mut view = ClassifyView::new();
        view.set_credentials(Some(creds()));
        view
    }

    fn loaded_view(id: &str) -> ClassifyView {
        let mut view = authed_view();
        let ticket = only_ticket(&view.mount(Some(id.into())));
        view.on_outcome(ticket.generation, Ok(ApiResponse::Comment(Some(comment(id)))));
        assert_eq!(view.phase(), &Phase::Loaded);
        view
    }

    #[test]
    fn test_no_credentials_stays_idle_and_silent() {
        let mut view = ClassifyView::new();
        assert!(view.mount(None).is_empty());
        assert_eq!(view.phase(), &Phase::Idle);
        assert!(view.skip().is_empty());
        assert!(view.retry().is_empty());
        assert!(view.on_route_change(Some("c1".into())).is_empty());
    }

    #[test]
    fn test_credentials_after_mount_start_loading() {
        let mut view = ClassifyView::new();
        view.mount(None);
        let ticket = only_ticket(&view.set_credentials(Some(creds())));
        assert_eq!(ticket.request, ApiRequest::RandomComment);
        assert_eq!(ticket.api_key, "key");
        assert_eq!(view.phase(), &Phase::Loading);
    }

    #[test]
    fn test_fetch_by_id_never_navigates() {
        for id in ["c1", "42", "abc-def"] {
            let mut view = authed_view();
            let ticket = only_ticket(&view.mount(Some(id.into())));
            assert_eq!(ticket.request, ApiRequest::CommentById(id.into()));
            let effects =
                view.on_outcome(ticket.generation, Ok(ApiResponse::Comment(Some(comment(id)))));
            assert!(effects.is_empty());
            assert_eq!(view.comment().unwrap().comment_id, id);
        }
    }

    #[test]
    fn test_initial_random_replaces_and_suppresses_refetch() {
        let mut view = authed_view();
        let ticket = only_ticket(&view.mount(None));
        let effects = view.on_outcome(ticket.generation, Ok(ApiResponse::Comment(Some(comment("c1")))));
        assert_eq!(
            effects,
            vec![Effect::Navigate {
                comment_id: "c1".into(),
                mode: HistoryMode::Replace
            }]
        );
        assert_eq!(view.guard(), NavGuard::SelfPending);
        assert!(view.on_route_change(Some("c1".into())).is_empty());
        assert_eq!(view.guard(), NavGuard::None);
        assert_eq!(view.comment().unwrap().comment_id, "c1");
    }

    #[test]
    fn test_skip_pushes() {
        let mut view = loaded_view("c1");
        let ticket = only_ticket(&view.skip());
        assert_eq!(ticket.request, ApiRequest::RandomComment);
        let effects = view.on_outcome(ticket.generation, Ok(ApiResponse::Comment(Some(comment("c2")))));
        assert_eq!(
            effects,
            vec![Effect::Navigate {
                comment_id: "c2".into(),
                mode: HistoryMode::Push
            }]
        );
    }

    #[test]
    fn test_external_route_change_fetches_by_id() {
        let mut view = loaded_view("c1");
        let ticket = only_ticket(&view.on_route_change(Some("c7".into())));
        assert_eq!(ticket.request, ApiRequest::CommentById("c7".into()));
        assert_eq!(view.guard(), NavGuard::None);
    }

    #[test]
    fn test_loading_clears_selection_and_comment() {
        let mut view = loaded_view("c1");
        view.select(Category::EthicalIssues);
        view.skip();
        assert_eq!(view.category(), None);
        assert!(view.comment().is_none());
        assert_eq!(view.phase(), &Phase::Loading);
    }

    #[test]
    fn test_submit_without_category_warns_and_sends_nothing() {
        let mut view = loaded_view("c1");
        assert_eq!(
            view.submit(),
            vec![Effect::Alert(SELECT_CATEGORY_WARNING.to_string())]
        );
        assert!(!view.is_submitting());
    }

    #[test]
    fn test_submit_without_comment_warns() {
        let mut view = authed_view();
        view.mount(None);
        assert_eq!(
            view.submit(),
            vec![Effect::Alert(SELECT_CATEGORY_WARNING.to_string())]
        );
    }

    #[test]
    fn test_select_ignored_unless_loaded() {
        let mut view = authed_view();
        view.mount(None);
        view.select(Category::Clarification);
        assert_eq!(view.category(), None);
    }

    #[test]
    fn test_successful_submit_fetches_exactly_one_random() {
        let mut view = loaded_view("c1");
        view.select(Category::DataValidity);
        let ticket = only_ticket(&view.submit());
        assert!(view.is_submitting());
        assert!(!view.can_skip());
        assert_eq!(
            ticket.request,
            ApiRequest::Classify {
                comment_id: "c1".into(),
                body: ClassifyRequest {
                    category: Category::DataValidity,
                    user: "ann".into()
                }
            }
        );
        let next = only_ticket(&view.on_outcome(ticket.generation, Ok(ApiResponse::Classified)));
        assert_eq!(next.request, ApiRequest::RandomComment);
        assert!(!view.is_submitting());
        assert_eq!(view.submissions().len(), 1);
        assert_eq!(view.submissions()[0].category, Category::DataValidity);
    }

    #[test]
    fn test_failed_submit_keeps_comment_and_reenables() {
        let mut view = loaded_view("c1");
        view.select(Category::FigureAnomalies);
        let ticket = only_ticket(&view.submit());
        let effects = view.on_outcome(
            ticket.generation,
            Err(ApiError::Status {
                status: 400,
                message: Some("bad category".into()),
            }),
        );
        assert_eq!(effects, vec![Effect::Alert("Error: bad category".into())]);
        assert!(!view.is_submitting());
        assert!(view.can_submit());
        assert_eq!(view.phase(), &Phase::Loaded);
        assert_eq!(view.comment().unwrap().comment_id, "c1");
        assert_eq!(view.category(), Some(Category::FigureAnomalies));
        assert!(view.submissions().is_empty());
    }

    #[test]
    fn test_submit_outcome_survives_navigation() {
        let mut view = loaded_view("c2");
        view.select(Category::Clarification);
        let post = only_ticket(&view.submit());

        let fetch = only_ticket(&view.on_route_change(Some("c1".into())));
        assert_eq!(fetch.request, ApiRequest::CommentById("c1".into()));
        assert!(view.is_submitting());
        assert!(view.skip().is_empty());

        let effects = view.on_outcome(
            post.generation,
            Err(ApiError::Status {
                status: 500,
                message: Some("db down".into()),
            }),
        );
        assert_eq!(effects, vec![Effect::Alert("Error: db down".into())]);
        assert!(!view.is_submitting());
        assert_eq!(view.phase(), &Phase::Loading);

        view.on_outcome(fetch.generation, Ok(ApiResponse::Comment(Some(comment("c1")))));
        assert_eq!(view.comment().unwrap().comment_id, "c1");
    }

    #[test]
    fn test_submit_success_after_navigation_records_without_advancing() {
        let mut view = loaded_view("c2");
        view.select(Category::DataValidity);
        let post = only_ticket(&view.submit());
        let fetch = only_ticket(&view.on_route_change(Some("c1".into())));
        view.on_outcome(fetch.generation, Ok(ApiResponse::Comment(Some(comment("c1")))));

        assert!(view.on_outcome(post.generation, Ok(ApiResponse::Classified)).is_empty());
        assert_eq!(view.submissions().len(), 1);
        assert_eq!(view.submissions()[0].comment_id, "c2");
        assert_eq!(view.comment().unwrap().comment_id, "c1");
        assert!(!view.is_submitting());
    }

    #[test]
    fn test_fetch_failure_messages() {
        let mut view = authed_view();
        let ticket = only_ticket(&view.mount(None));
        view.on_outcome(ticket.generation, Err(ApiError::Transport("down".into())));
        assert_eq!(view.phase(), &Phase::Failed(LOAD_ERROR.into()));

        let ticket = only_ticket(&view.skip());
        view.on_outcome(ticket.generation, Err(ApiError::Transport("down".into())));
        assert_eq!(view.phase(), &Phase::Failed(NEXT_ERROR.into()));
    }

    #[test]
    fn test_retry_uses_route_target() {
        let mut view = authed_view();
        let ticket = only_ticket(&view.mount(Some("c3".into())));
        view.on_outcome(ticket.generation, Err(ApiError::Offline));
        let retry = only_ticket(&view.retry());
        assert_eq!(retry.request, ApiRequest::CommentById("c3".into()));
    }

    #[test]
    fn test_stale_outcome_is_dropped() {
        let mut view = authed_view();
        let first = only_ticket(&view.mount(None));
        let second = only_ticket(&view.skip());
        assert!(
            view.on_outcome(first.generation, Ok(ApiResponse::Comment(Some(comment("old")))))
                .is_empty()
        );
        assert_eq!(view.phase(), &Phase::Loading);
        view.on_outcome(second.generation, Ok(ApiResponse::Comment(Some(comment("new")))));
        assert_eq!(view.comment().unwrap().comment_id, "new");
    }

    #[test]
    fn test_empty_random_shows_empty_without_navigation() {
        let mut view = authed_view();
        let ticket = only_ticket(&view.mount(None));
        assert!(view.on_outcome(ticket.generation, Ok(ApiResponse::Comment(None))).is_empty());
        assert_eq!(view.phase(), &Phase::Empty);
        assert_eq!(view.guard(), NavGuard::None);
    }

    #[test]
    fn test_random_returning_current_target_does_not_navigate() {
        let mut view = loaded_view("c1");
        let ticket = only_ticket(&view.skip());
        let effects = view.on_outcome(ticket.generation, Ok(ApiResponse::Comment(Some(comment("c1")))));
        assert!(effects.is_empty());
        assert_eq!(view.guard(), NavGuard::None);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut view = loaded_view("c1");
        view.move_cursor(-1);
        assert_eq!(view.cursor, 5);
        view.move_cursor(1);
        assert_eq!(view.cursor, 0);
        view.move_cursor(3);
        view.select_cursor();
        assert_eq!(view.category(), Some(Category::DataValidity));
    }
}
