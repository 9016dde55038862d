//! Ctrl-C handling for long-running commands

use crate::{Controller, Error, Result};
use std::sync::Arc;

/// Route Ctrl-C to [`Controller::cancel`], so an interrupted run still
/// finishes with a partial result instead of killing the process.
///
/// Only one handler can be installed per process.
pub fn cancel_on_interrupt(controller: &Arc<Controller>) -> Result<()> {
    let controller = Arc::clone(controller);
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, cancelling the current run");
        controller.cancel();
    })
    .map_err(|err| Error::System(format!("could not install Ctrl-C handler: {err}")))
}
