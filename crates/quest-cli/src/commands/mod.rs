pub mod auth;
pub mod lobbies;
pub mod proofs;
pub mod quests;

use anyhow::{Result, anyhow, bail};
use quest_application::{AppContext, Route, RouteDecision};
use quest_core::{CommandResult, QuestError};
use quest_infrastructure::logging::{WorkerGuard, init_logging};
use quest_infrastructure::{
    ConfigService, FileAttachmentLoader, HttpRemoteClient, QuestPaths, SessionFile,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// The wired application plus the log flusher that must outlive it.
pub struct Client {
    pub app: AppContext,
    _log_guard: WorkerGuard,
}

pub async fn connect(config_dir: Option<PathBuf>, api_url: Option<String>) -> Result<Client> {
    let paths = match config_dir {
        Some(dir) => QuestPaths::at(dir),
        None => QuestPaths::resolve()?,
    };

    let mut config = ConfigService::new(&paths).get_config()?;
    if let Some(url) = api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }

    let log_guard = init_logging(&config, &paths)?;
    tracing::debug!("[Cli] Backend {}", config.api_url);

    let remote = HttpRemoteClient::connect(&config, SessionFile::new(&paths)).await?;
    let app = AppContext::new(
        Arc::new(remote),
        Arc::new(FileAttachmentLoader::new()),
        &config,
    );

    Ok(Client {
        app,
        _log_guard: log_guard,
    })
}

/// Checks the session, then whether `route` is reachable.
pub async fn ensure(app: &AppContext, route: Route) -> quest_core::Result<()> {
    app.session.check_session().await;

    match app.session.route_decision(route).await {
        RouteDecision::Allow => Ok(()),
        RouteDecision::Redirect(Route::Home) => Err(QuestError::validation(
            "Already signed in. Run `quest logout` first.",
        )),
        RouteDecision::Redirect(_) => Err(app
            .session
            .last_error()
            .await
            .unwrap_or(QuestError::Unauthenticated)),
        RouteDecision::Wait => Err(QuestError::internal("Session check did not settle")),
    }
}

/// Like [`ensure`], with a message pointing at the command to run.
pub async fn require(app: &AppContext, route: Route) -> Result<()> {
    match ensure(app, route).await {
        Ok(()) => Ok(()),
        Err(QuestError::Unauthenticated) => {
            bail!("Not signed in. Run `quest register` or `quest login` first.")
        }
        Err(err) => Err(describe(err)),
    }
}

/// Turns an error into the text a user should see.
pub fn describe(err: QuestError) -> anyhow::Error {
    anyhow!(err.display_message())
}

/// Prints `result` as a `{"status": ...}` envelope.
pub fn emit_json<T: Serialize>(result: quest_core::Result<T>) -> Result<()> {
    let envelope = CommandResult::from(result);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
