use dispatch_protocol::{PageRequest, PageResult, QueuedItem};

use crate::dispatcher::Dispatcher;
use crate::error::{QueueToolError, Result};
use crate::logger::ToolLogger;

/// Picks the project implicitly iff the service knows exactly one.
pub(crate) async fn resolve_project(
    dispatcher: &dyn Dispatcher,
    project: Option<String>,
    logger: &dyn ToolLogger,
) -> Result<String> {
    if let Some(project) = project {
        return Ok(project);
    }
    let names = dispatcher.list_project_names().await.map_err(|err| {
        QueueToolError::Validation(format!("Could not determine project: {err}"))
    })?;
    match names.as_slice() {
        [single] => {
            logger.debug(&format!("# No project specified, defaulting to: {single}"));
            Ok(single.clone())
        }
        _ => Err(QueueToolError::Validation(
            "-p argument is required with list action".to_string(),
        )),
    }
}

/// Fetches and prints exactly one page of the queue.
pub(crate) async fn list_queue(
    dispatcher: &dyn Dispatcher,
    project: &str,
    page: PageRequest,
    logger: &dyn ToolLogger,
) -> Result<()> {
    let result = dispatcher
        .list_queue(project, page)
        .await
        .map_err(|err| QueueToolError::remote("Failed request to list the queue", err))?
        .ok_or_else(|| {
            QueueToolError::ProtocolViolation("List request returned null".to_string())
        })?;
    if result.items.len() > page.max as usize {
        return Err(QueueToolError::ProtocolViolation(format!(
            "List request returned {} items, more than the requested max of {}",
            result.items.len(),
            page.max
        )));
    }
    for line in render_queue(&result) {
        logger.log(&line);
    }
    Ok(())
}

pub(crate) fn render_queue(result: &PageResult<QueuedItem>) -> Vec<String> {
    let total = result
        .total_known()
        .map(|total| format!(" of {total}"))
        .unwrap_or_default();
    let mut lines = Vec::with_capacity(result.items.len() + 1);
    lines.push(format!("Queue: {}{} items", result.items.len(), total));
    lines.extend(
        result
            .items
            .iter()
            .map(|item| format!("[{}] {} <{}>", item.id, item.name, item.url)),
    );
    lines
}
