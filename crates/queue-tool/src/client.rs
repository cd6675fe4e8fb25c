use async_trait::async_trait;
use dispatch_protocol::{
    DispatchRequest, DispatchResponse, ExecutionDetail, FollowEvent, FollowRequest, FollowResult,
    KillResult, PageRequest, PageResult, QueuedItem, RequestEnvelope,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

use crate::dispatcher::{Dispatcher, FollowReceiver};
use crate::error::DispatchError;

type DispatchFramed = Framed<TcpStream, LinesCodec>;

/// JSON-lines over TCP, one connection per request.
#[derive(Clone, Debug)]
pub(crate) struct DispatchClient {
    addr: String,
    timeout: Duration,
}

impl DispatchClient {
    pub(crate) fn new(addr: String, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    async fn connect(&self) -> Result<DispatchFramed, DispatchError> {
        let stream = timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| DispatchError::Timeout("connect"))?
            .map_err(|source| DispatchError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        Ok(Framed::new(stream, LinesCodec::new()))
    }

    async fn send(
        &self,
        framed: &mut DispatchFramed,
        request: DispatchRequest,
    ) -> Result<(), DispatchError> {
        let envelope = RequestEnvelope::new(request);
        debug!(
            request_id = %envelope.request_id,
            addr = %self.addr,
            "sending dispatch request"
        );
        let payload = serde_json::to_string(&envelope)?;
        timeout(self.timeout, framed.send(payload))
            .await
            .map_err(|_| DispatchError::Timeout("send"))??;
        Ok(())
    }

    async fn request(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchError> {
        let mut framed = self.connect().await?;
        self.send(&mut framed, request).await?;
        let line = timeout(self.timeout, framed.next())
            .await
            .map_err(|_| DispatchError::Timeout("read"))?
            .ok_or(DispatchError::Closed)??;
        Ok(serde_json::from_str(&line)?)
    }
}

fn unexpected(response: &DispatchResponse) -> DispatchError {
    DispatchError::Protocol(format!("{response:?}"))
}

#[async_trait]
impl Dispatcher for DispatchClient {
    async fn get_execution(&self, id: &str) -> Result<ExecutionDetail, DispatchError> {
        let request = DispatchRequest::GetExecution { id: id.to_string() };
        match self.request(request).await? {
            DispatchResponse::Execution { detail } => Ok(detail),
            DispatchResponse::Error { message } => Err(DispatchError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }

    async fn follow_execution(
        &self,
        id: &str,
        request: FollowRequest,
        receiver: &mut dyn FollowReceiver,
    ) -> Result<FollowResult, DispatchError> {
        let mut framed = self.connect().await?;
        self.send(
            &mut framed,
            DispatchRequest::FollowExecution {
                id: id.to_string(),
                follow: request,
            },
        )
        .await?;
        // No read timeout: the service decides how long a follow stream stays open.
        while let Some(line) = framed.next().await {
            let response: DispatchResponse = serde_json::from_str(&line?)?;
            match response {
                DispatchResponse::Follow {
                    event: FollowEvent::Finished { state },
                } => {
                    debug!(execution_id = %id, state = ?state, "follow stream finished");
                    return Ok(FollowResult { final_state: state });
                }
                DispatchResponse::Follow { event } => receiver.receive(&event),
                DispatchResponse::Error { message } => return Err(DispatchError::Remote(message)),
                other => return Err(unexpected(&other)),
            }
        }
        debug!(execution_id = %id, "follow stream closed without a final state");
        Ok(FollowResult::default())
    }

    async fn kill_execution(&self, id: &str) -> Result<KillResult, DispatchError> {
        let request = DispatchRequest::KillExecution { id: id.to_string() };
        match self.request(request).await? {
            DispatchResponse::Kill { result } => Ok(result),
            DispatchResponse::Error { message } => Err(DispatchError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }

    async fn list_queue(
        &self,
        project: &str,
        page: PageRequest,
    ) -> Result<Option<PageResult<QueuedItem>>, DispatchError> {
        let request = DispatchRequest::ListQueue {
            project: project.to_string(),
            page,
        };
        match self.request(request).await? {
            DispatchResponse::Queue { page } => Ok(page),
            DispatchResponse::Error { message } => Err(DispatchError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }

    async fn list_project_names(&self) -> Result<Vec<String>, DispatchError> {
        match self.request(DispatchRequest::ListProjects).await? {
            DispatchResponse::Projects { names } => Ok(names),
            DispatchResponse::Error { message } => Err(DispatchError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }
}
