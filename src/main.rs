use argh::FromArgs;
use miette::{IntoDiagnostic, WrapErr};
use tracing::{info, warn};

use bwmxmd::{Bot, Config, IrcConnector, State, auth};

/// Bwmxmd chat bot
#[derive(Debug, FromArgs)]
struct Opts {
    /// path to config file
    #[argh(option, default = "String::from(\"config.toml\")")]
    config_path: String,
    /// delete the stored session credentials and exit
    #[argh(switch)]
    logout: bool,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Parse command-line arguments
    let opts: Opts = argh::from_env();

    // Make variables from a local .env file visible to the config loader
    let dotenv = dotenvy::dotenv();

    let config = Config::load(&opts.config_path)?;

    bwmxmd::tracing::try_init(&config.tracing, config.client.log_level)?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = ?err, "could not load environment file"),
    }

    info!(
        "{} v{} running",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    if opts.logout {
        let removed = auth::clear(&config.auth.folder).await?;

        info!(folder = %config.auth.folder.display(), %removed, "cleared stored credentials");

        return Ok(());
    }

    let connector = IrcConnector::new(config.irc.clone());
    let mut bot = Bot::new(config, connector);

    tokio::select! {
        result = bot.run() => {
            result.wrap_err("bot stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, shutting down");

            return Ok(());
        }
    }

    if bot.state() == State::LoggedOut {
        // Stay up until the operator intervenes.
        tokio::signal::ctrl_c().await.into_diagnostic()?;

        info!("received interrupt, shutting down");
    }

    Ok(())
}
