use anyhow::Result;
use tracing::info;

use crate::router::Route;
use crate::store::session::SessionProvider;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavLink {
    Classify,
    Explore,
}

impl NavLink {
    pub const ALL: [NavLink; 2] = [NavLink::Classify, NavLink::Explore];

    pub fn label(self) -> &'static str {
        match self {
            NavLink::Classify => "Classify",
            NavLink::Explore => "Explore",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            NavLink::Classify => 'c',
            NavLink::Explore => 'e',
        }
    }

    pub fn route(self) -> Route {
        match self {
            NavLink::Classify => Route::Comment(None),
            NavLink::Explore => Route::Explore,
        }
    }
}

/// Entries of the collapsed menu, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuEntry {
    Link(NavLink),
    Logout,
}

pub const MENU_ENTRIES: [MenuEntry; 3] = [
    MenuEntry::Link(NavLink::Classify),
    MenuEntry::Link(NavLink::Explore),
    MenuEntry::Logout,
];

#[derive(Debug, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Session cleared; the whole app must be rebuilt.
    Reload,
    /// Nothing to confirm.
    Ignored,
}

/// Top navigation state: collapsible menu and the two-step logout prompt.
#[derive(Debug, Default)]
pub struct NavBar {
    pub menu_open: bool,
    pub menu_selected: usize,
    pub logout_prompt: bool,
}

impl NavBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
        self.menu_selected = 0;
    }

    pub fn menu_next(&mut self) {
        self.menu_selected = (self.menu_selected + 1) % MENU_ENTRIES.len();
    }

    pub fn menu_prev(&mut self) {
        self.menu_selected = self
            .menu_selected
            .checked_sub(1)
            .unwrap_or(MENU_ENTRIES.len() - 1);
    }

    pub fn selected_entry(&self) -> MenuEntry {
        MENU_ENTRIES[self.menu_selected.min(MENU_ENTRIES.len() - 1)]
    }

    /// Following a link always closes the menu.
    pub fn follow(&mut self, link: NavLink) -> Route {
        self.menu_open = false;
        link.route()
    }

    /// First step: show the prompt. Nothing is cleared yet.
    pub fn request_logout(&mut self) {
        self.logout_prompt = true;
        self.menu_open = false;
    }

    pub fn cancel_logout(&mut self) {
        self.logout_prompt = false;
    }

    /// Second step: clear the persisted key and nickname.
    pub fn confirm_logout(&mut self, session: &mut dyn SessionProvider) -> Result<LogoutOutcome> {
        if !self.logout_prompt {
            return Ok(LogoutOutcome::Ignored);
        }
        session.clear()?;
        self.logout_prompt = false;
        info!("logged out");
        Ok(LogoutOutcome::Reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::session::{Credentials, MemorySession};

    fn session() -> MemorySession {
        MemorySession::with(Credentials {
            api_key: "k".into(),
            nickname: "ann".into(),
        })
    }

    #[test]
    fn test_follow_closes_menu() {
        let mut nav = NavBar::new();
        nav.toggle_menu();
        assert!(nav.menu_open);
        assert_eq!(nav.follow(NavLink::Explore), Route::Explore);
        assert!(!nav.menu_open);
    }

    #[test]
    fn test_request_logout_only_opens_prompt() {
        let mut nav = NavBar::new();
        nav.toggle_menu();
        nav.request_logout();
        assert!(nav.logout_prompt);
        assert!(!nav.menu_open);
    }

    #[test]
    fn test_confirm_clears_session() {
        let mut nav = NavBar::new();
        let mut session = session();
        nav.request_logout();
        assert_eq!(nav.confirm_logout(&mut session).unwrap(), LogoutOutcome::Reload);
        assert!(session.read().unwrap().is_none());
        assert!(!nav.logout_prompt);
    }

    #[test]
    fn test_confirm_without_prompt_is_ignored() {
        let mut nav = NavBar::new();
        let mut session = session();
        assert_eq!(nav.confirm_logout(&mut session).unwrap(), LogoutOutcome::Ignored);
        assert!(session.read().unwrap().is_some());
    }

    #[test]
    fn test_cancel_keeps_session() {
        let mut nav = NavBar::new();
        let session = session();
        nav.request_logout();
        nav.cancel_logout();
        assert!(!nav.logout_prompt);
        assert!(session.read().unwrap().is_some());
    }

    #[test]
    fn test_menu_selection_wraps() {
        let mut nav = NavBar::new();
        nav.toggle_menu();
        nav.menu_prev();
        assert_eq!(nav.selected_entry(), MenuEntry::Logout);
        nav.menu_next();
        assert_eq!(nav.selected_entry(), MenuEntry::Link(NavLink::Classify));
    }
}
