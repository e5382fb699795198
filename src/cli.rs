use dialoguer::{Input, Password};
use std::path::PathBuf;
use std::sync::Arc;

use panorama::auth::AuthService;
use panorama::client::HttpTransport;
use panorama::config::ClientConfig;
use panorama::error::Result;
use panorama::navigation::RecordingNavigator;
use panorama::routing::{guard, redirect_target};
use panorama::store::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use panorama::version::format_version_info;
use panorama_protocol::api::RegisterRequest;

use crate::ui::{format_remaining, UI};
use crate::{AccessArgs, Commands, LoginArgs, RegisterArgs};

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: UI,
}

impl CliHandler {
    /// Create a new CLI handler with a custom config path
    pub fn with_config_path(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: UI::new(),
        }
    }

    /// Load configuration using the handler's config path
    fn load_config(&self) -> Result<ClientConfig> {
        match &self.config_path {
            Some(path) => ClientConfig::load_from(path),
            None => ClientConfig::load(),
        }
    }

    fn auth_service(&self) -> Result<(AuthService<HttpTransport>, Arc<RecordingNavigator>)> {
        let config = self.load_config()?;
        let navigator = Arc::new(RecordingNavigator::new());
        let service = AuthService::from_config(config, navigator.clone())?;
        Ok((service, navigator))
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login(args) => self.handle_login(args).await,
            Commands::Register(args) => self.handle_register(args).await,
            Commands::Logout => self.handle_logout().await,
            Commands::Status => self.handle_status().await,
            Commands::Whoami => self.handle_whoami().await,
            Commands::Access(args) => self.handle_access(args).await,
            Commands::Config => self.handle_config(),
        }
    }

    /// Handle login command
    async fn handle_login(&mut self, args: LoginArgs) -> Result<()> {
        let (service, navigator) = self.auth_service()?;

        let email = match args.email {
            Some(email) => email,
            None => Input::<String>::new().with_prompt("Email").interact_text()?,
        };
        let password = Password::new().with_prompt("Password").interact()?;

        let user = service.login(&email, &password).await?;

        let landing = navigator
            .last()
            .map(|(route, _)| route)
            .unwrap_or_else(|| redirect_target(user.role.as_ref()));
        self.ui.success(&format!(
            "Logged in as {}",
            self.ui.format_user_field(Some(user.display_name.clone()))
        ));
        self.ui.card(
            "Session",
            vec![
                ("Email", self.ui.format_user_field(Some(user.email.clone()))),
                ("Role", user.role_kind().label().to_string()),
                ("Landing", landing.to_string()),
            ],
        );
        Ok(())
    }

    /// Handle register command
    async fn handle_register(&mut self, args: RegisterArgs) -> Result<()> {
        let (service, _) = self.auth_service()?;

        let password = Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?;

        let request = RegisterRequest {
            nombre: args.name,
            correo: args.email,
            contrasena: password,
            bio: args.bio,
            intereses: args.interests,
        };
        let user = service.register(request).await?;

        self.ui.success(&format!("Account created for {}", user.email));
        self.ui.info("Run `panorama login` to start a session.");
        Ok(())
    }

    /// Handle logout command
    async fn handle_logout(&mut self) -> Result<()> {
        let (service, _) = self.auth_service()?;
        service.logout().await;
        self.ui.success("Logged out");
        Ok(())
    }

    /// Handle status command
    async fn handle_status(&mut self) -> Result<()> {
        let (service, _) = self.auth_service()?;
        let state = service.initialize_session().await;
        let snapshot = service.session().snapshot();

        let mut rows = vec![
            ("Version", format_version_info()),
            ("Session", self.ui.format_session_state(state)),
        ];

        if let Some(user) = snapshot.user().filter(|_| snapshot.is_authenticated()) {
            rows.push(("Name", self.ui.format_user_field(Some(user.display_name.clone()))));
            rows.push(("Email", self.ui.format_user_field(Some(user.email.clone()))));
            rows.push(("Role", user.role_kind().label().to_string()));
            rows.push(("Landing", redirect_target(user.role.as_ref()).to_string()));
        }

        let now = chrono::Utc::now();
        for credential in service.client().store().credentials() {
            let label = match credential.name.as_str() {
                ACCESS_TOKEN_COOKIE => "Access token",
                REFRESH_TOKEN_COOKIE => "Refresh token",
                _ => continue,
            };
            rows.push((
                label,
                format!("expires in {}", format_remaining(credential.remaining_secs(now))),
            ));
        }

        self.ui.card("Status", rows);
        Ok(())
    }

    /// Handle whoami command
    async fn handle_whoami(&mut self) -> Result<()> {
        let (service, _) = self.auth_service()?;
        service.initialize_session().await;

        match service.session().user() {
            Some(user) if service.session().is_authenticated() => {
                let interests = if user.interests.is_empty() {
                    None
                } else {
                    Some(user.interests.join(", "))
                };
                self.ui.card(
                    "User",
                    vec![
                        ("Id", user.id.to_string()),
                        ("Name", self.ui.format_user_field(Some(user.display_name.clone()))),
                        ("Email", self.ui.format_user_field(Some(user.email.clone()))),
                        ("Role", user.role_kind().label().to_string()),
                        ("Bio", self.ui.format_user_field(user.bio.clone())),
                        ("Interests", self.ui.format_user_field(interests)),
                    ],
                );
            }
            _ => self.ui.warning("Not logged in. Run `panorama login`."),
        }
        Ok(())
    }

    /// Handle access command
    async fn handle_access(&mut self, args: AccessArgs) -> Result<()> {
        let (service, _) = self.auth_service()?;
        service.initialize_session().await;

        let access = guard(&service.session().snapshot(), args.section.into());
        println!("{}", self.ui.format_access(access));
        Ok(())
    }

    /// Handle config command
    fn handle_config(&self) -> Result<()> {
        let config = self.load_config()?;
        let storage = config
            .token_storage
            .resolved_path()
            .map(|p| p.display().to_string());

        self.ui.card(
            "Configuration",
            vec![
                ("Backend", config.base_url.clone()),
                ("Timeout", format!("{}s", config.timeout)),
                ("Environment", format!("{:?}", config.environment)),
                (
                    "Secure cookies",
                    config.environment.secure_cookies().to_string(),
                ),
                (
                    "Credentials",
                    storage.unwrap_or_else(|| "memory only".to_string()),
                ),
            ],
        );
        Ok(())
    }
}
