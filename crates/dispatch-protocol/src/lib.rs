use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod execution;
pub mod paging;

pub use execution::{
    ExecutionDetail, ExecutionJob, ExecutionState, FollowEvent, FollowRequest, FollowResult,
    KillResult, LogLine,
};
pub use paging::{PageRequest, PageResult, QueuedItem, DEFAULT_PAGE_MAX, DEFAULT_PAGE_OFFSET};

pub const DEFAULT_DISPATCH_ADDR: &str = "127.0.0.1:4440";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchRequest {
    GetExecution { id: String },
    FollowExecution { id: String, follow: FollowRequest },
    KillExecution { id: String },
    ListQueue { project: String, page: PageRequest },
    ListProjects,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub request_id: Uuid,
    pub request: DispatchRequest,
}

impl RequestEnvelope {
    pub fn new(request: DispatchRequest) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchResponse {
    Execution {
        detail: ExecutionDetail,
    },
    Follow {
        event: FollowEvent,
    },
    Kill {
        result: KillResult,
    },
    Queue {
        #[serde(default)]
        page: Option<PageResult<QueuedItem>>,
    },
    Projects {
        names: Vec<String>,
    },
    Error {
        message: String,
    },
}
