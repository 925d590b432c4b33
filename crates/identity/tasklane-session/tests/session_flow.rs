use futures::StreamExt;
use futures_signals::signal::SignalExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasklane_http::{
    ApiClient, ApiRequest, ChannelNotifier, ClientConfig, InMemoryTokenStore, Navigator,
    Notification, Route, TokenVault,
};
use tasklane_session::{
    AuthError, Field, RegisterError, Rule, SessionState, SessionStore,
};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

struct Fixture {
    server: MockServer,
    store: SessionStore,
    vault: Arc<TokenVault>,
    navigator: Arc<RecordingNavigator>,
    notifications: UnboundedReceiver<Notification>,
}

impl Fixture {
    async fn new(token: Option<&str>) -> Self {
        let server = MockServer::start().await;
        let store = match token {
            Some(token) => InMemoryTokenStore::with_token(token),
            None => InMemoryTokenStore::new(),
        };
        let vault = Arc::new(TokenVault::new(store));
        let navigator = Arc::new(RecordingNavigator::default());
        let (notifier, notifications) = ChannelNotifier::new();

        let api = ApiClient::new(
            ClientConfig::new(server.uri()),
            vault.clone(),
            Arc::new(notifier),
            navigator.clone(),
        )
        .unwrap();

        Self {
            server,
            store: SessionStore::new(api),
            vault,
            navigator,
            notifications,
        }
    }

    async fn token(&self) -> Option<String> {
        self.vault.snapshot().await.unwrap().token
    }

    fn notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }
}

fn alice() -> serde_json::Value {
    serde_json::json!({"id": 1, "username": "alice"})
}

#[tokio::test]
async fn test_login_stores_token_then_loads_profile() {
    let mut fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=Secret1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"access_token": "tok-1", "token_type": "bearer"}),
        ))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&fx.server)
        .await;

    let user = fx.store.login("alice", "Secret1").await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(fx.token().await.as_deref(), Some("tok-1"));
    assert!(fx.store.is_authenticated());
    assert_eq!(fx.store.current_user(), Some(user));
    assert_eq!(
        fx.notifications(),
        vec![Notification::success("Logged in successfully")]
    );
}

#[tokio::test]
async fn test_login_with_wrong_password_is_quiet() {
    let mut fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"detail": "Incorrect username or password"})),
        )
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(0)
        .mount(&fx.server)
        .await;

    let result = fx.store.login("alice", "nope").await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    assert_eq!(fx.token().await, None);
    assert!(fx.navigator.routes.lock().unwrap().is_empty());
    assert!(fx.notifications().is_empty());
    assert!(!fx.store.is_authenticated());
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fx.server)
        .await;

    match fx.store.login("", "").await {
        Err(AuthError::Validation(errors)) => {
            assert_eq!(errors.0.len(), 2);
            assert_eq!(errors.for_field(Field::Username).unwrap().rule, Rule::Required);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_profile_failure_erases_token() {
    let fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "tok-2"})),
        )
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;

    let result = fx.store.login("alice", "Secret1").await;

    assert!(matches!(result, Err(AuthError::Api(_))));
    assert_eq!(fx.token().await, None);
    assert_eq!(fx.store.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_token_endpoint_failure_is_left_to_caller() {
    let mut fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"detail": "db down"})),
        )
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(0)
        .mount(&fx.server)
        .await;

    let result = fx.store.login("alice", "Secret1").await;

    match result {
        Err(AuthError::Exchange(e)) => {
            assert_eq!(e.status(), Some(500));
            assert_eq!(e.detail(), Some("db down"));
        }
        other => panic!("expected exchange error, got {other:?}"),
    }
    // No generic toast: the caller owns this message.
    assert!(fx.notifications().is_empty());
    assert_eq!(fx.token().await, None);
    assert!(!fx.store.is_authenticated());
}

#[tokio::test]
async fn test_logout_during_login_wins() {
    let mut fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "late-token"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(0)
        .mount(&fx.server)
        .await;

    let (result, ()) = tokio::join!(fx.store.login("alice", "Secret1"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.store.logout().await;
    });

    assert!(matches!(result, Err(AuthError::Superseded)));
    assert_eq!(fx.token().await, None);
    assert_eq!(fx.store.state(), SessionState::Anonymous);
    assert!(fx.notifications().is_empty());
}

#[tokio::test]
async fn test_initialize_without_token_is_anonymous() {
    let fx = Fixture::new(None).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(0)
        .mount(&fx.server)
        .await;

    assert_eq!(fx.store.state(), SessionState::Unresolved);
    assert!(fx.store.session().loading);

    assert_eq!(fx.store.initialize().await, SessionState::Anonymous);
    assert!(!fx.store.session().loading);
}

#[tokio::test]
async fn test_initialize_restores_valid_token() {
    let fx = Fixture::new(Some("persisted")).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&fx.server)
        .await;

    let state = fx.store.initialize().await;

    assert!(state.is_authenticated());
    assert_eq!(state.user().unwrap().username, "alice");
    assert_eq!(fx.token().await.as_deref(), Some("persisted"));
}

#[tokio::test]
async fn test_initialize_with_rejected_token() {
    let fx = Fixture::new(Some("expired")).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fx.server)
        .await;

    assert_eq!(fx.store.initialize().await, SessionState::Anonymous);
    assert_eq!(fx.token().await, None);
}

#[tokio::test]
async fn test_forced_expiry_drops_session() {
    let fx = Fixture::new(Some("persisted")).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fx.server)
        .await;

    assert!(fx.store.initialize().await.is_authenticated());

    let result = fx.store.api().execute(ApiRequest::get("/tasks")).await;

    assert!(result.is_err());
    assert_eq!(fx.store.state(), SessionState::Anonymous);
    assert_eq!(*fx.navigator.routes.lock().unwrap(), vec![Route::Login]);
}

#[tokio::test]
async fn test_register_validates_before_sending() {
    let fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(0)
        .mount(&fx.server)
        .await;

    match fx.store.register("bob", "abc123").await {
        Err(RegisterError::Validation(errors)) => {
            assert_eq!(
                errors.for_field(Field::Username).unwrap().rule,
                Rule::MinLength(5)
            );
            assert_eq!(errors.for_field(Field::Password).unwrap().rule, Rule::Pattern);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_success_does_not_sign_in() {
    let mut fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_string_contains("\"username\":\"alice\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&fx.server)
        .await;

    let user = fx.store.register("alice", "Secret1").await.unwrap();

    assert_eq!(user.id, 1);
    assert!(!fx.store.is_authenticated());
    assert_eq!(fx.token().await, None);
    assert_eq!(
        fx.notifications(),
        vec![Notification::success(
            "Registration successful, you can now log in"
        )]
    );
}

#[tokio::test]
async fn test_register_conflict_status() {
    let fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"detail": "Username already exists"})),
        )
        .mount(&fx.server)
        .await;

    let result = fx.store.register("alice", "Secret1").await;
    assert!(matches!(
        result,
        Err(RegisterError::UsernameTaken(detail)) if detail == "Username already exists"
    ));
}

#[tokio::test]
async fn test_register_conflict_from_detail_text() {
    let fx = Fixture::new(None).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"detail": "This username is already taken"})),
        )
        .mount(&fx.server)
        .await;

    let result = fx.store.register("alice", "Secret1").await;
    assert!(matches!(result, Err(RegisterError::UsernameTaken(_))));
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let fx = Fixture::new(Some("persisted")).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .mount(&fx.server)
        .await;

    assert!(fx.store.initialize().await.is_authenticated());

    fx.store.logout().await;

    assert_eq!(fx.store.state(), SessionState::Anonymous);
    assert_eq!(fx.token().await, None);
}

#[tokio::test]
async fn test_signal_reports_transitions() {
    let fx = Fixture::new(None).await;
    let mut states = fx.store.signal().to_stream();

    assert_eq!(states.next().await, Some(SessionState::Unresolved));

    fx.store.initialize().await;
    assert_eq!(states.next().await, Some(SessionState::Anonymous));
}
