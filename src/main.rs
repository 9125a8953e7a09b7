use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use homebase::{
    api::AppState,
    cli, config, error, logger,
    types::{Provider, UserId},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Account to act for (defaults to HOMEBASE_OWNER)
    #[clap(long, global = true)]
    user: Option<UserId>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// Authorize an integration in the browser
    Connect(ProviderOption),

    /// Show token state of the integrations
    Status(StatusOptions),

    /// Refresh a token now
    Refresh(ProviderOption),

    /// Forget a stored token
    Disconnect(ProviderOption),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ProviderOption {
    /// fitness (strava) or music (spotify)
    provider: Provider,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusOptions {
    /// Only show this integration
    provider: Option<Provider>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    logger::setup_logging(&config::log_level());

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let state = match AppState::from_env(cli.user) {
        Ok(state) => state,
        Err(e) => error!("Cannot initialize. Err: {}", e),
    };

    match cli.command {
        Command::Serve => cli::serve(state).await,
        Command::Connect(opt) => cli::connect(state, opt.provider).await,
        Command::Status(opt) => cli::status(state, opt.provider).await,
        Command::Refresh(opt) => cli::refresh(state, opt.provider).await,
        Command::Disconnect(opt) => cli::disconnect(state, opt.provider).await,
        Command::Completions(_) => {}
    }
}
