/// Entry points the client may force the view layer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

/// Forced navigation hook, invoked on session expiry.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator for hosts without routing.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!("Ignoring navigation to {:?}", route);
    }
}
