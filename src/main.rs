use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;
mod ui;

use cli::CliHandler;
use panorama::routing::Section;
use panorama::version::CURRENT_VERSION;

#[derive(Parser)]
#[command(
    name = "panorama",
    about = "Session client for the Panorama events platform",
    long_about = "Panorama - account and session tool for the Panorama events platform

QUICK START:
  panorama login                        # Sign in and see where your role lands you
  panorama status                       # Check the stored session against the backend
  panorama access admin                 # Can the current session open the admin area?
  panorama logout                       # Forget stored credentials

The backend URL comes from NEXT_PUBLIC_API_URL, NEXT_PUBLIC_BACKEND_URL,
PANORAMA_BASE_URL or the config file, in that order of preference.",
    version = CURRENT_VERSION,
    author = "Panorama Team",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login(LoginArgs),

    /// Create a new account
    Register(RegisterArgs),

    /// Forget stored credentials
    Logout,

    /// Show session and credential status
    #[command(aliases = &["st"])]
    Status,

    /// Show the signed-in user
    Whoami,

    /// Check whether the session may enter a section
    Access(AccessArgs),

    /// Show effective configuration
    #[command(aliases = &["cfg"])]
    Config,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Account email, prompted when omitted
    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub email: String,

    #[arg(long)]
    pub bio: Option<String>,

    /// Repeat for several interests
    #[arg(long = "interest")]
    pub interests: Vec<String>,
}

#[derive(Args)]
pub struct AccessArgs {
    #[arg(value_enum)]
    pub section: SectionArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SectionArg {
    Public,
    User,
    Organizer,
    Admin,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Public => Section::Public,
            SectionArg::User => Section::UserArea,
            SectionArg::Organizer => Section::OrganizerArea,
            SectionArg::Admin => Section::AdminArea,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("panorama={}", log_level))
        .init();

    let mut handler = CliHandler::with_config_path(cli.config);

    if let Err(e) = handler.execute(cli.command).await {
        let ui = ui::UI::new();
        ui.error(&format!("Error: {}", e));
        if e.is_auth_error() {
            ui.info("Run `panorama login` to start a new session.");
        } else if e.is_network_error() {
            ui.info("Check that the backend is reachable (`panorama config` shows the URL).");
        }
        std::process::exit(1);
    }
}
