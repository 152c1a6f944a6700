use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use client::{Auth, AuthStatus, ClientConfig, ClientError, Navigation, Session, unix_now};
use models::wire::RegisterRequest;
use models::{Role, SessionScope};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("health check failed: HTTP {0}")]
    Unhealthy(u16),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "realty-cli", about = "Realty session and API command-line client")]
struct Cli {
    /// Overrides the API host picked from DEPLOY_ENV / APP_ENV.
    #[arg(long, env = "REALTY_API_URL")]
    api_url: Option<Url>,

    /// Session file; defaults to one file per scope in the working directory.
    #[arg(long, env = "REALTY_STORE_PATH")]
    store: Option<PathBuf>,

    /// Act on the admin dashboard session instead of the client session.
    #[arg(long, global = true, default_value_t = false)]
    admin: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "REALTY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    /// Print the signed-in profile, refreshed from the server when newer.
    Whoami,
    /// Resolve the session state as a front end would on `path`.
    Status {
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Finish a third-party login from its redirect URL.
    Social { url: Url },
    Format(FormatCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "REALTY_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, default_value_t = false)]
    agent: bool,
}

#[derive(Args, Debug)]
struct FormatCommand {
    #[command(subcommand)]
    command: FormatSubcommand,
}

#[derive(Subcommand, Debug)]
enum FormatSubcommand {
    Amount {
        amount: f64,
        #[arg(long, default_value_t = false)]
        no_decimals: bool,
    },
    PropertyType {
        raw: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    if let Command::Format(format) = &cli.command {
        run_format(format);
        return Ok(());
    }

    let scope = if cli.admin { SessionScope::Admin } else { SessionScope::Client };
    let session = Session::open(client_config(&cli, scope)?, scope).await?;

    match cli.command {
        Command::Ping => run_ping(&session).await,
        Command::Login { email, password } => {
            let login_path = models::RouteTable::default().login_for(scope).to_owned();
            let nav = session.context().login_with_credentials(&email, &password, &login_path).await?;
            print_profile(&session).await?;
            print_navigation(&nav);
            Ok(())
        }
        Command::Register(args) => run_register(&session, args).await,
        Command::Logout => {
            let nav = session.context().logout().await;
            println!("signed out");
            print_navigation(&nav);
            Ok(())
        }
        Command::Whoami => run_whoami(&session).await,
        Command::Status { path } => {
            let nav = session.context().bootstrap(&path, unix_now()).await;
            let status = match session.context().status() {
                AuthStatus::Loading => "loading",
                AuthStatus::Authenticated => "authenticated",
                AuthStatus::Unauthenticated => "unauthenticated",
            };
            println!("{status}");
            print_navigation(&nav);
            Ok(())
        }
        Command::Social { url } => match session.context().complete_social_login(&url).await? {
            Some(nav) => {
                print_profile(&session).await?;
                print_navigation(&nav);
                Ok(())
            }
            None => Err(CliError::Validation("redirect URL carries no user and token".to_owned())),
        },
        Command::Format(_) => Ok(()),
    }
}

fn client_config(cli: &Cli, scope: SessionScope) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_base = url.clone();
        config.app_origin = url.clone();
    }
    config.store_path = Some(cli.store.clone().unwrap_or_else(|| match scope {
        SessionScope::Client => PathBuf::from(".realty-session.json"),
        SessionScope::Admin => PathBuf::from(".realty-admin-session.json"),
    }));
    Ok(config)
}

async fn run_ping(session: &Session) -> Result<(), CliError> {
    let api = session.context().api();
    match api.send(reqwest::Method::GET, "/healthz", None, Auth::Anonymous).await {
        Ok(_) => {
            println!("ok");
            Ok(())
        }
        Err(ClientError::Api { status, .. }) => Err(CliError::Unhealthy(status)),
        Err(e) => Err(e.into()),
    }
}

async fn run_register(session: &Session, args: RegisterArgs) -> Result<(), CliError> {
    let request = RegisterRequest {
        name: args.name,
        email: args.email,
        password: args.password,
        phone: args.phone,
        role: if args.agent { Role::Agent } else { Role::User },
    };
    match session.context().register(&request, "/").await {
        Ok(nav) => {
            print_profile(session).await?;
            print_navigation(&nav);
            Ok(())
        }
        Err(e) => match e.fields() {
            Some(fields) => {
                let detail = fields
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(CliError::Validation(detail))
            }
            None => Err(e.into()),
        },
    }
}

async fn run_whoami(session: &Session) -> Result<(), CliError> {
    let context = session.context();
    if context.profile().await.is_none() {
        return Err(CliError::NotSignedIn);
    }
    match context.reconcile_profile().await {
        Ok(true) => eprintln!("profile updated from server"),
        Ok(false) => {}
        Err(ClientError::SessionExpired) => return Err(CliError::NotSignedIn),
        Err(e) => tracing::warn!(error = %e, "profile refresh failed; showing cached profile"),
    }
    print_profile(session).await
}

fn run_format(format: &FormatCommand) {
    match &format.command {
        FormatSubcommand::Amount { amount, no_decimals } => {
            println!("{}", models::format::format_amount(*amount, !no_decimals));
        }
        FormatSubcommand::PropertyType { raw } => {
            println!("{}", models::format::format_property_type(raw));
        }
    }
}

async fn print_profile(session: &Session) -> Result<(), CliError> {
    let profile = session.context().profile().await.ok_or(CliError::NotSignedIn)?;
    print_json(&serde_json::to_value(profile)?)
}

fn print_navigation(nav: &Navigation) {
    match nav {
        Navigation::Stay => {}
        Navigation::Push(path) | Navigation::Assign(path) => eprintln!("next: {path}"),
        Navigation::Reload => eprintln!("next: reload"),
        Navigation::Replace(location) => eprintln!("location: {location}"),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
