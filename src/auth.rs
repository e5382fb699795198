//! Authentication actions: login, registration, logout

use reqwest::Method;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use panorama_protocol::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::client::{decode, ApiClient, ApiRequest, HttpTransport, Transport};
use crate::config::ClientConfig;
use crate::error::{PanoramaError, Result};
use crate::navigation::{NavigationMode, Navigator};
use crate::routing::{redirect_target, Route};
use crate::session::{SessionManager, SessionState};
use crate::store::{CredentialStore, CredentialStoreConfig, TokenPair};
use crate::user::User;

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const REGISTER_ENDPOINT: &str = "/auth/registro";

/// Login, registration and logout on top of one shared client and session
#[derive(Debug)]
pub struct AuthService<T> {
    client: Arc<ApiClient<T>>,
    session: Arc<SessionManager<T>>,
}

impl AuthService<HttpTransport> {
    /// Wire up store, client and session from configuration
    pub fn from_config(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let store = Arc::new(CredentialStore::new(CredentialStoreConfig::from(&config))?);
        let client = ApiClient::from_config(config, store, navigator)?;
        Ok(Self::new(Arc::new(client)))
    }
}

impl<T: Transport> AuthService<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        let session = Arc::new(SessionManager::new(client.clone()));
        Self { client, session }
    }

    pub fn client(&self) -> &Arc<ApiClient<T>> {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionManager<T>> {
        &self.session
    }

    pub async fn initialize_session(&self) -> SessionState {
        self.session.initialize().await
    }

    /// Log in and redirect according to the user's role
    ///
    /// Any 4xx from the backend is reported as invalid credentials.
    pub async fn login(&self, correo: &str, contrasena: &str) -> Result<User> {
        let request = LoginRequest {
            correo: correo.trim().to_string(),
            contrasena: contrasena.to_string(),
        };
        request.validate()?;

        let reply = self
            .client
            .execute(
                ApiRequest::new(Method::POST, LOGIN_ENDPOINT, Some(serde_json::to_value(&request)?))
                    .without_refresh(),
            )
            .await
            .map_err(|e| match e {
                e if e.is_client_error() => PanoramaError::invalid_credentials(api_message(&e)),
                e => e,
            })?;
        let response: LoginResponse = decode(&reply)?;

        let tokens = TokenPair::from(response.tokens());
        let user = User::from_payload(response.usuario)?;

        self.client.store().set_tokens(&tokens)?;
        self.session.establish(user.clone());
        info!(user_id = user.id, role = user.role_kind().label(), "Logged in");

        let target = redirect_target(user.role.as_ref());
        self.client.navigator().navigate(target, NavigationMode::Push);

        Ok(user)
    }

    /// Create an account; the caller logs in separately
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        request.validate()?;

        let reply = self
            .client
            .execute(
                ApiRequest::new(Method::POST, REGISTER_ENDPOINT, Some(serde_json::to_value(&request)?))
                    .without_refresh(),
            )
            .await
            .map_err(|e| match e {
                e if e.is_client_error() => PanoramaError::registration(api_message(&e)),
                e => e,
            })?;
        let created: RegisterResponse = decode(&reply)?;

        let user = User::from_payload(created)?;
        info!(user_id = user.id, "Registered");
        Ok(user)
    }

    /// Drop credentials and session, then reload at the home route
    ///
    /// Never fails; problems clearing storage are logged.
    pub async fn logout(&self) {
        if let Err(e) = self.client.store().clear_auth_tokens() {
            warn!("Failed to clear credentials during logout: {}", e);
        }
        self.session.clear();
        info!("Logged out");
        self.client
            .navigator()
            .navigate(Route::Home, NavigationMode::Hard);
    }
}

fn api_message(err: &PanoramaError) -> String {
    match err {
        PanoramaError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::REFRESH_ENDPOINT;
    use crate::navigation::RecordingNavigator;
    use crate::store::ACCESS_TOKEN_COOKIE;
    use crate::tests::mocks::MockTransport;
    use serde_json::json;

    fn service_with(transport: MockTransport) -> (AuthService<MockTransport>, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let client = ApiClient::new(
            transport,
            Arc::new(CredentialStore::in_memory()),
            navigator.clone(),
        );
        (AuthService::new(Arc::new(client)), navigator)
    }

    fn register_request(correo: &str) -> RegisterRequest {
        RegisterRequest {
            nombre: "Ana".to_string(),
            correo: correo.to_string(),
            contrasena: "secret1".to_string(),
            bio: None,
            intereses: vec!["música".to_string()],
        }
    }

    #[tokio::test]
    async fn admin_login_stores_tokens_and_lands_on_admin() {
        let transport = MockTransport::new();
        let usuario = json!({"id_usuario": 1, "rol": {"id_rol": 1}});
        transport.respond(
            LOGIN_ENDPOINT,
            200,
            json!({"accessToken": "a1", "refreshToken": "r1", "usuario": usuario}),
        );
        let (service, navigator) = service_with(transport);

        let user = service.login("user@test.com", "secret").await.unwrap();

        let store = service.client().store();
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
        assert!(store.credentials().iter().any(|c| c.name == ACCESS_TOKEN_COOKIE));

        let expected = User::from_payload(serde_json::from_value(usuario).unwrap()).unwrap();
        assert_eq!(user, expected);
        assert_eq!(service.session().user(), Some(expected));
        assert!(service.session().is_authenticated());
        assert_eq!(
            navigator.last(),
            Some((Route::AdminDashboard, NavigationMode::Push))
        );

        let sent = service.client().transport().requests();
        assert_eq!(
            sent[0].body,
            Some(json!({"correo": "user@test.com", "contrasena": "secret"}))
        );
    }

    #[tokio::test]
    async fn organizer_and_plain_users_land_elsewhere() {
        let transport = MockTransport::new();
        transport.respond(
            LOGIN_ENDPOINT,
            200,
            json!({"accessToken": "a1", "refreshToken": "r1", "usuario": {"id_usuario": 2, "rol": {"id_rol": 2}}}),
        );
        transport.respond(
            LOGIN_ENDPOINT,
            200,
            json!({"accessToken": "a2", "refreshToken": "r2", "usuario": {"id_usuario": 3, "rol": null}}),
        );
        let (service, navigator) = service_with(transport);

        service.login("org@test.com", "secret").await.unwrap();
        assert_eq!(navigator.last().map(|v| v.0), Some(Route::OrganizerDashboard));

        service.login("fan@test.com", "secret").await.unwrap();
        assert_eq!(navigator.last().map(|v| v.0), Some(Route::Home));
    }

    #[tokio::test]
    async fn rejected_login_is_invalid_credentials() {
        let transport = MockTransport::new();
        transport.respond(LOGIN_ENDPOINT, 401, json!({"error": "Credenciales inválidas"}));
        let (service, navigator) = service_with(transport);
        service
            .client()
            .store()
            .set_refresh_token(Some("old-refresh"))
            .unwrap();

        let err = service.login("user@test.com", "wrong").await.unwrap_err();

        assert!(matches!(err, PanoramaError::InvalidCredentials { .. }));
        assert!(err.to_string().contains("Credenciales inválidas"));
        assert_eq!(service.client().refresh_count(), 0);
        assert!(service.client().store().access_token().is_none());
        assert!(!service.session().is_authenticated());
        assert!(navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn server_error_on_login_is_not_invalid_credentials() {
        let transport = MockTransport::new();
        transport.respond(LOGIN_ENDPOINT, 503, json!({"error": "maintenance"}));
        let (service, _) = service_with(transport);

        let err = service.login("user@test.com", "secret").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn malformed_email_never_reaches_backend() {
        let (service, _) = service_with(MockTransport::new());

        let err = service.login("not-an-email", "secret").await.unwrap_err();

        assert!(matches!(err, PanoramaError::Validation { .. }));
        assert!(service.client().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn register_returns_user_without_session() {
        let transport = MockTransport::new();
        transport.respond(
            REGISTER_ENDPOINT,
            201,
            json!({"id_usuario": 12, "nombre": "Ana", "correo": "ana@test.com"}),
        );
        let (service, navigator) = service_with(transport);

        let user = service.register(register_request("ana@test.com")).await.unwrap();

        assert_eq!(user.id, 12);
        assert_eq!(user.email, "ana@test.com");
        assert!(!service.session().is_authenticated());
        assert!(service.client().store().access_token().is_none());
        assert!(navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_registration_error() {
        let transport = MockTransport::new();
        transport.respond(REGISTER_ENDPOINT, 409, json!({"error": "El correo ya está registrado"}));
        let (service, _) = service_with(transport);

        let err = service
            .register(register_request("ana@test.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, PanoramaError::Registration { .. }));
        assert!(err.to_string().contains("ya está registrado"));
    }

    #[tokio::test]
    async fn logout_clears_everything_and_goes_home() {
        let transport = MockTransport::new();
        transport.respond(
            LOGIN_ENDPOINT,
            200,
            json!({"accessToken": "a1", "refreshToken": "r1", "usuario": {"id_usuario": 1}}),
        );
        let (service, navigator) = service_with(transport);
        service.login("user@test.com", "secret").await.unwrap();

        service.logout().await;

        let store = service.client().store();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(service.client().authorization_header().is_none());
        assert!(!service.session().is_authenticated());
        assert_eq!(service.session().state(), SessionState::Unauthenticated);
        assert_eq!(navigator.last(), Some((Route::Home, NavigationMode::Hard)));
    }

    fn logged_in_admin(transport: MockTransport) -> MockTransport {
        transport.respond(
            LOGIN_ENDPOINT,
            200,
            json!({"accessToken": "a1", "refreshToken": "r1", "usuario": {"id_usuario": 1, "rol": {"id_rol": 1}}}),
        );
        transport
    }

    #[tokio::test]
    async fn failed_refresh_after_login_signs_session_out() {
        let transport = logged_in_admin(MockTransport::new());
        transport.respond("/eventos", 401, json!({"error": "jwt expired"}));
        transport.respond(REFRESH_ENDPOINT, 401, json!({"error": "refresh revoked"}));
        let (service, navigator) = service_with(transport);
        service.login("admin@test.com", "secret").await.unwrap();
        assert!(service.session().is_authenticated());

        let err = service
            .client()
            .get::<serde_json::Value>("/eventos")
            .await
            .unwrap_err();

        assert!(matches!(err, PanoramaError::SessionExpired { .. }));
        assert!(service.client().store().access_token().is_none());
        assert!(service.client().store().refresh_token().is_none());

        let snapshot = service.session().snapshot();
        assert_eq!(snapshot.state(), SessionState::Unauthenticated);
        assert!(!snapshot.is_authenticated());
        assert!(snapshot.user().is_none());
        assert!(snapshot.access_token().is_none());
        assert_eq!(navigator.last(), Some((Route::Login, NavigationMode::Hard)));
    }

    #[tokio::test]
    async fn refreshed_token_reaches_the_session() {
        let transport = logged_in_admin(MockTransport::new());
        transport.respond("/eventos", 401, json!({"error": "jwt expired"}));
        transport.respond("/eventos", 200, json!([]));
        transport.respond(
            REFRESH_ENDPOINT,
            200,
            json!({"accessToken": "a2", "refreshToken": "r2"}),
        );
        let (service, _) = service_with(transport);
        let user = service.login("admin@test.com", "secret").await.unwrap();

        let _: serde_json::Value = service.client().get("/eventos").await.unwrap();

        assert_eq!(service.client().store().access_token().as_deref(), Some("a2"));
        assert_eq!(service.session().access_token().as_deref(), Some("a2"));
        assert!(service.session().is_authenticated());
        assert_eq!(service.session().user(), Some(user));
    }

    #[tokio::test]
    async fn rejection_without_refresh_token_signs_session_out() {
        let transport = logged_in_admin(MockTransport::new());
        transport.respond("/eventos", 401, json!({"error": "jwt expired"}));
        let (service, navigator) = service_with(transport);
        service.login("admin@test.com", "secret").await.unwrap();
        service.client().store().set_refresh_token(None).unwrap();

        let err = service
            .client()
            .get::<serde_json::Value>("/eventos")
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(service.client().refresh_count(), 0);
        assert!(!service.session().is_authenticated());
        assert!(service.session().user().is_none());
        assert_eq!(
            navigator.last(),
            Some((Route::AdminDashboard, NavigationMode::Push))
        );
    }

    #[tokio::test]
    async fn logout_without_session_is_harmless() {
        let (service, navigator) = service_with(MockTransport::new());

        service.logout().await;
        service.logout().await;

        assert!(service.client().store().access_token().is_none());
        assert!(service.client().authorization_header().is_none());
        assert_eq!(
            navigator.visits(),
            vec![
                (Route::Home, NavigationMode::Hard),
                (Route::Home, NavigationMode::Hard),
            ]
        );
    }
}
