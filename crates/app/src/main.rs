//! Gatekeep - interactive authenticated API client
//!
//! Wires the client stack over reqwest, the configured credential storage
//! and the system clock, then reads commands from stdin. Every input line
//! counts as user activity for the idle session monitor.

mod commands;
mod terminal;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gatekeep_application::NormalizedError;
use gatekeep_application::ports::{HttpTransport, Navigator};
use gatekeep_domain::{ActivityKind, ApiRequest, ApiResponse, LoginCredentials};
use gatekeep_infrastructure::{
    ClientStack, ReqwestTransport, Settings, SystemClock, storage_from_settings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Command, HELP, ParseError};
use crate::terminal::{TerminalHooks, TerminalNavigator};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "GATEKEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the backend API, overrides the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
        settings.validate()?;
    }
    info!(
        "Starting gatekeep v{} against {}",
        env!("CARGO_PKG_VERSION"),
        settings.base_url
    );

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    let navigator = Arc::new(TerminalNavigator::new(settings.login_path.as_str()));
    let stack = ClientStack::new(
        &settings,
        transport,
        storage_from_settings(&settings)?,
        navigator.clone(),
        Arc::new(SystemClock::new()),
    )?;

    match stack.auth.restore() {
        Some(user) => println!("Welcome back, {}.", user.display_name()),
        None => navigator.navigate_to_login(),
    }

    let monitor = stack.monitor(Arc::new(TerminalHooks::new(stack.auth.clone())));
    monitor.activate()?;

    let result = repl(&stack, &navigator).await;
    monitor.teardown();
    result
}

async fn repl(stack: &ClientStack, navigator: &TerminalNavigator) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(stack)?;

    while let Some(line) = lines.next_line().await? {
        stack.activity.emit(ActivityKind::KeyPress);
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => execute(stack, navigator, command).await,
            Err(ParseError::Empty) => {}
            Err(error) => eprintln!("{error}"),
        }
        prompt(stack)?;
    }
    Ok(())
}

fn prompt(stack: &ClientStack) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    match stack.auth.current_user() {
        Some(user) => write!(stdout, "{}> ", user.username)?,
        None => write!(stdout, "gatekeep> ")?,
    }
    stdout.flush()
}

async fn execute(stack: &ClientStack, navigator: &TerminalNavigator, command: Command) {
    match command {
        Command::Login { username, password } => {
            match stack.auth.login(&LoginCredentials::new(username, password)).await {
                Ok(user) => {
                    navigator.go_home();
                    println!("Signed in as {}.", user.display_name());
                }
                Err(error) => report(&error),
            }
        }
        Command::Request { method, path, body } => {
            let request = ApiRequest::new(method, path);
            let request = match body {
                Some(body) => request.with_body(body),
                None => request,
            };
            match stack.client.execute(request).await {
                Ok(response) => print_response(&response),
                Err(error) => report(&error),
            }
        }
        Command::WhoAmI => match stack.auth.current_user() {
            Some(user) => match serde_json::to_string_pretty(&user) {
                Ok(rendered) => println!("{rendered}"),
                Err(_) => println!("{}", user.username),
            },
            None => println!("Not signed in."),
        },
        Command::Logout => stack.auth.logout().await,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn print_response(response: &ApiResponse) {
    println!(
        "{} ({} ms)",
        response.status,
        response.duration.as_millis()
    );
    match response.json_value() {
        Some(value) => match serde_json::to_string_pretty(&value) {
            Ok(rendered) => println!("{rendered}"),
            Err(_) => println!("{}", response.text()),
        },
        None if !response.body.is_empty() => println!("{}", response.text()),
        None => {}
    }
}

fn report(error: &NormalizedError) {
    match error.http_status {
        Some(status) => eprintln!("{} ({status}): {}", error.kind.title(), error.message),
        None => eprintln!("{}: {}", error.kind.title(), error.message),
    }
}
