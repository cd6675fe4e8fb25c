use async_trait::async_trait;
use dispatch_protocol::{
    ExecutionDetail, FollowEvent, FollowRequest, FollowResult, KillResult, PageRequest,
    PageResult, QueuedItem,
};

use crate::error::DispatchError;

/// Consumer of incremental follow output. Only renders data, never decides completion.
pub(crate) trait FollowReceiver: Send {
    fn receive(&mut self, event: &FollowEvent);
}

/// Everything the tool needs from the remote dispatch service.
#[async_trait]
pub(crate) trait Dispatcher: Send + Sync {
    async fn get_execution(&self, id: &str) -> Result<ExecutionDetail, DispatchError>;

    /// Streams output into `receiver` until the service ends the stream.
    async fn follow_execution(
        &self,
        id: &str,
        request: FollowRequest,
        receiver: &mut dyn FollowReceiver,
    ) -> Result<FollowResult, DispatchError>;

    async fn kill_execution(&self, id: &str) -> Result<KillResult, DispatchError>;

    /// `Ok(None)` means the service answered without a page.
    async fn list_queue(
        &self,
        project: &str,
        page: PageRequest,
    ) -> Result<Option<PageResult<QueuedItem>>, DispatchError>;

    async fn list_project_names(&self) -> Result<Vec<String>, DispatchError>;
}
