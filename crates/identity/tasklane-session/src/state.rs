use tasklane_types::User;

/// Lifecycle of the client's belief about who is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Startup, before the persisted token was looked at
    #[default]
    Unresolved,
    /// A persisted token is being resolved to a profile
    Resolving,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Unresolved | Self::Resolving)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn session(&self) -> Session {
        Session::from(self)
    }
}

/// Flat view of [`SessionState`] for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
}

impl From<&SessionState> for Session {
    fn from(state: &SessionState) -> Self {
        Self {
            is_authenticated: state.is_authenticated(),
            user: state.user().cloned(),
            loading: state.is_loading(),
        }
    }
}
