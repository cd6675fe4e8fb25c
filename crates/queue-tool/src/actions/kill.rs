use crate::dispatcher::Dispatcher;
use crate::error::{QueueToolError, Result};
use crate::logger::ToolLogger;

/// Requests a kill. A refused kill is reported, not raised.
pub(crate) async fn kill_execution(
    dispatcher: &dyn Dispatcher,
    id: &str,
    logger: &dyn ToolLogger,
) -> Result<()> {
    let result = dispatcher
        .kill_execution(id)
        .await
        .map_err(|err| QueueToolError::remote("Failed request to kill the execution", err))?;
    if result.successful {
        logger.log(&format!("rd-queue kill: success. [{id}] {}", result.message));
    } else {
        logger.error(&format!("rd-queue kill: failed. [{id}] {}", result.message));
    }
    Ok(())
}
