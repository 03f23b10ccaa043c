use tracing::{error, info, warn};

use crate::api::{Outcome, Ticket};
use crate::classify::view::{ClassifyView, Effect};
use crate::config::Config;
use crate::content::{self, RenderedContent};
use crate::nav::{LogoutOutcome, MenuEntry, NavBar, NavLink};
use crate::router::{History, HistoryMode, Route};
use crate::store::session::{Credentials, SessionProvider};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Login,
    Classify,
    Explore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginField {
    ApiKey,
    Nickname,
}

pub struct LoginForm {
    pub api_key: LineInput,
    pub nickname: LineInput,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl LoginForm {
    fn new() -> Self {
        Self {
            api_key: LineInput::new("").masked(),
            nickname: LineInput::new(""),
            focus: LoginField::ApiKey,
            error: None,
        }
    }

    pub fn focused_input(&mut self) -> &mut LineInput {
        match self.focus {
            LoginField::ApiKey => &mut self.api_key,
            LoginField::Nickname => &mut self.nickname,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::ApiKey => LoginField::Nickname,
            LoginField::Nickname => LoginField::ApiKey,
        };
    }
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: Theme,
    pub nav: NavBar,
    pub view: ClassifyView,
    pub history: History,
    pub login: LoginForm,
    pub credentials: Option<Credentials>,
    /// Blocking message; every key but dismiss is ignored while set.
    pub alert: Option<String>,
    pub content_scroll: u16,
    pub should_quit: bool,
    /// Logout happened: tear down and rebuild from the persisted session.
    pub should_reload: bool,
    rendered: Option<(String, RenderedContent)>,
    session: Box<dyn SessionProvider>,
    outbox: Vec<Ticket>,
}

impl App {
    pub fn new(config: Config, theme: Theme, session: Box<dyn SessionProvider>) -> Self {
        let credentials = match session.read() {
            Ok(creds) => creds,
            Err(e) => {
                error!(%e, "failed to read session");
                None
            }
        };
        let start = Route::Comment(config.start_comment.clone());

        let mut app = Self {
            screen: AppScreen::Login,
            config,
            theme,
            nav: NavBar::new(),
            view: ClassifyView::new(),
            history: History::new(start),
            login: LoginForm::new(),
            credentials: None,
            alert: None,
            content_scroll: 0,
            should_quit: false,
            should_reload: false,
            rendered: None,
            session,
            outbox: Vec::new(),
        };
        if let Some(creds) = credentials {
            app.start_session(creds);
        }
        app
    }

    fn start_session(&mut self, credentials: Credentials) {
        info!(nickname = %credentials.nickname, "session active");
        self.credentials = Some(credentials.clone());
        let effects = self.view.set_credentials(Some(credentials));
        self.apply(effects);
        self.route_changed();
    }

    /// Tickets produced since the last call, for the request worker.
    pub fn take_requests(&mut self) -> Vec<Ticket> {
        std::mem::take(&mut self.outbox)
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request(ticket) => self.outbox.push(ticket),
                Effect::Navigate { comment_id, mode } => {
                    self.navigate(Route::Comment(Some(comment_id)), mode);
                }
                Effect::Alert(message) => {
                    warn!(%message, "alert");
                    self.alert = Some(message);
                }
            }
        }
        self.sync_rendered();
    }

    pub fn on_api(&mut self, generation: u64, outcome: Outcome) {
        let effects = self.view.on_outcome(generation, outcome);
        self.apply(effects);
    }

    pub fn navigate(&mut self, route: Route, mode: HistoryMode) {
        self.history.navigate(route, mode);
        self.route_changed();
    }

    pub fn go_back(&mut self) {
        if self.history.back() {
            self.route_changed();
        }
    }

    pub fn go_forward(&mut self) {
        if self.history.forward() {
            self.route_changed();
        }
    }

    fn route_changed(&mut self) {
        if self.credentials.is_none() {
            return;
        }
        match self.history.current().clone() {
            Route::Comment(target) => {
                self.screen = AppScreen::Classify;
                let effects = self.view.on_route_change(target);
                self.apply(effects);
            }
            Route::Explore => self.screen = AppScreen::Explore,
        }
    }

    pub fn follow_link(&mut self, link: NavLink) {
        let route = self.nav.follow(link);
        if &route != self.history.current() {
            self.navigate(route, HistoryMode::Push);
        }
    }

    pub fn activate_menu_entry(&mut self) {
        match self.nav.selected_entry() {
            MenuEntry::Link(link) => self.follow_link(link),
            MenuEntry::Logout => self.nav.request_logout(),
        }
    }

    pub fn confirm_logout(&mut self) {
        match self.nav.confirm_logout(self.session.as_mut()) {
            Ok(LogoutOutcome::Reload) => self.should_reload = true,
            Ok(LogoutOutcome::Ignored) => {}
            Err(e) => {
                error!(%e, "failed to clear session");
                self.nav.cancel_logout();
                self.alert = Some(format!("Error: {e}"));
            }
        }
    }

    /// Presence check only; the key is not validated here.
    pub fn submit_login(&mut self) {
        let api_key = self.login.api_key.value().trim().to_string();
        let nickname = self.login.nickname.value().trim().to_string();
        if api_key.is_empty() || nickname.is_empty() {
            self.login.error = Some("Enter both an API key and a nickname.".to_string());
            return;
        }
        let credentials = Credentials { api_key, nickname };
        if let Err(e) = self.session.write(&credentials) {
            error!(%e, "failed to save session");
            self.login.error = Some(format!("Could not save session: {e}"));
            return;
        }
        self.login.error = None;
        self.start_session(credentials);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn submit(&mut self) {
        let effects = self.view.submit();
        self.apply(effects);
    }

    pub fn skip(&mut self) {
        let effects = self.view.skip();
        self.apply(effects);
    }

    pub fn retry(&mut self) {
        let effects = self.view.retry();
        self.apply(effects);
    }

    pub fn nickname(&self) -> &str {
        self.credentials
            .as_ref()
            .map(|c| c.nickname.as_str())
            .unwrap_or_default()
    }

    /// Sanitized, flattened body of the displayed comment.
    pub fn rendered_content(&self) -> Option<&RenderedContent> {
        self.rendered.as_ref().map(|(_, content)| content)
    }

    fn sync_rendered(&mut self) {
        let current = self.view.comment().map(|c| c.comment_id.as_str());
        let cached = self.rendered.as_ref().map(|(id, _)| id.as_str());
        if current == cached {
            return;
        }
        self.content_scroll = 0;
        self.rendered = self
            .view
            .comment()
            .map(|c| (c.comment_id.clone(), content::render(&c.content)));
    }
}
