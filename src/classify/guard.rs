/// Tracks whether the next route change was caused by the view itself.
///
/// Fetching a random comment navigates to that comment's route, and a route
/// change normally triggers a fetch. The guard breaks that loop: the view arms
/// it right before navigating, and the route change it causes is consumed
/// without fetching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavGuard {
    #[default]
    None,
    /// The view navigated and expects to see its own route change.
    SelfPending,
    /// A route change came from outside (link, back/forward) and is being
    /// served by a fetch that has not started yet.
    External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Fetch,
    Suppress,
}

impl NavGuard {
    pub fn arm(&mut self) {
        *self = NavGuard::SelfPending;
    }

    /// Called once per observed route change.
    pub fn on_route_change(&mut self) -> RouteDecision {
        match self {
            NavGuard::SelfPending => {
                *self = NavGuard::None;
                RouteDecision::Suppress
            }
            NavGuard::None | NavGuard::External => {
                *self = NavGuard::External;
                RouteDecision::Fetch
            }
        }
    }

    /// The fetch for an external change has started.
    pub fn settle(&mut self) {
        if *self == NavGuard::External {
            *self = NavGuard::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unarmed_change_fetches() {
        let mut guard = NavGuard::default();
        assert_eq!(guard.on_route_change(), RouteDecision::Fetch);
        assert_eq!(guard, NavGuard::External);
        guard.settle();
        assert_eq!(guard, NavGuard::None);
    }

    #[test]
    fn test_armed_guard_suppresses_exactly_one_change() {
        let mut guard = NavGuard::default();
        guard.arm();
        assert_eq!(guard.on_route_change(), RouteDecision::Suppress);
        assert_eq!(guard, NavGuard::None);
        assert_eq!(guard.on_route_change(), RouteDecision::Fetch);
    }

    #[test]
    fn test_settle_does_not_disarm_pending_self_navigation() {
        let mut guard = NavGuard::default();
        guard.arm();
        guard.settle();
        assert_eq!(guard, NavGuard::SelfPending);
    }
}
