//! Command dispatch: bridges CLI args -> coordinator -> output formatting.

pub mod config_cmd;
pub mod sensors;
pub mod snapshot;
pub mod watch;

use std::sync::Arc;

use switchos_core::{Coordinator, CoordinatorConfig, CoreError, HttpSource, SnapshotSource};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a switch-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: CoordinatorConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Snapshot => snapshot::handle(config, global).await,
        Command::Sensors(args) => sensors::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not talk to a switch".into(),
        }),
    }
}

/// HTTP source for `config`.
pub(crate) fn http_source(config: &CoordinatorConfig) -> Result<Arc<dyn SnapshotSource>, CoreError> {
    Ok(Arc::new(HttpSource::from_config(config)?))
}

/// Run `f` against a coordinator that fetches once and never polls.
pub(crate) async fn oneshot<F, Fut, T>(config: CoordinatorConfig, f: F) -> Result<T, CliError>
where
    F: FnOnce(Coordinator) -> Fut,
    Fut: std::future::Future<Output = Result<T, CoreError>>,
{
    let source = http_source(&config)?;
    Ok(Coordinator::oneshot(config, source, f).await?)
}
