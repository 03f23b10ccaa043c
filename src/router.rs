use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryMode {
    /// New entry; back returns to the previous location.
    Push,
    /// Overwrite the current entry.
    Replace,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/comment` (random) or `/comment/{id}`.
    Comment(Option<String>),
    Explore,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let mut segments = trimmed.trim_start_matches('/').split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some("comment"), None, None) | (Some(""), None, None) => Some(Route::Comment(None)),
            (Some("comment"), Some(id), None) if !id.is_empty() => {
                Some(Route::Comment(Some(id.to_string())))
            }
            (Some("explore"), None, None) => Some(Route::Explore),
            _ => None,
        }
    }

    pub fn comment_target(&self) -> Option<Option<&str>> {
        match self {
            Route::Comment(target) => Some(target.as_deref()),
            Route::Explore => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Comment(None) => f.write_str("/comment"),
            Route::Comment(Some(id)) => write!(f, "/comment/{id}"),
            Route::Explore => f.write_str("/explore"),
        }
    }
}

/// Session history with browser-like push/replace/back/forward.
pub struct History {
    entries: Vec<Route>,
    index: usize,
}

impl History {
    pub fn new(initial: Route) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Route {
        &self.entries[self.index]
    }

    pub fn navigate(&mut self, route: Route, mode: HistoryMode) {
        match mode {
            HistoryMode::Push => {
                self.entries.truncate(self.index + 1);
                self.entries.push(route);
                self.index = self.entries.len() - 1;
            }
            HistoryMode::Replace => self.entries[self.index] = route,
        }
    }

    /// Returns false when already at the oldest entry.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Never zero: there is always a current entry.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        assert_eq!(Route::parse("/comment"), Some(Route::Comment(None)));
        assert_eq!(Route::parse("/"), Some(Route::Comment(None)));
        assert_eq!(
            Route::parse("/comment/c1"),
            Some(Route::Comment(Some("c1".into())))
        );
        assert_eq!(
            Route::parse("/comment/c1/"),
            Some(Route::Comment(Some("c1".into())))
        );
        assert_eq!(Route::parse("/explore"), Some(Route::Explore));
        assert_eq!(Route::parse("/comment/a/b"), None);
        assert_eq!(Route::parse("/settings"), None);
    }

    #[test]
    fn test_display_matches_parse() {
        for route in [
            Route::Comment(None),
            Route::Comment(Some("x9".into())),
            Route::Explore,
        ] {
            assert_eq!(Route::parse(&route.to_string()), Some(route));
        }
    }

    #[test]
    fn test_replace_keeps_length() {
        let mut history = History::new(Route::Comment(None));
        history.navigate(Route::Comment(Some("c1".into())), HistoryMode::Replace);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), &Route::Comment(Some("c1".into())));
        assert!(!history.back());
    }

    #[test]
    fn test_push_then_back_and_forward() {
        let mut history = History::new(Route::Comment(Some("c1".into())));
        history.navigate(Route::Comment(Some("c2".into())), HistoryMode::Push);
        assert_eq!(history.len(), 2);
        assert!(history.back());
        assert_eq!(history.current(), &Route::Comment(Some("c1".into())));
        assert!(history.forward());
        assert_eq!(history.current(), &Route::Comment(Some("c2".into())));
        assert!(!history.forward());
    }

    #[test]
    fn test_push_after_back_drops_forward_entries() {
        let mut history = History::new(Route::Comment(Some("a".into())));
        history.navigate(Route::Comment(Some("b".into())), HistoryMode::Push);
        history.back();
        history.navigate(Route::Explore, HistoryMode::Push);
        assert_eq!(history.len(), 2);
        assert!(!history.forward());
    }

    #[test]
    fn test_back_at_oldest_entry_keeps_current() {
        let mut history = History::new(Route::Explore);
        assert!(!history.back());
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), &Route::Explore);
    }
}
