use async_trait::async_trait;
use dispatch_protocol::{
    ExecutionDetail, ExecutionJob, ExecutionState, FollowEvent, FollowRequest, FollowResult,
    KillResult, PageRequest, PageResult, QueuedItem,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::dispatcher::{Dispatcher, FollowReceiver};
use crate::error::DispatchError;
use crate::logger::ToolLogger;

type Reply<T> = Mutex<Option<Result<T, DispatchError>>>;

/// In-memory dispatch service. Each scripted reply is consumed once.
#[derive(Default)]
pub(crate) struct FakeDispatcher {
    statuses: Mutex<VecDeque<Result<ExecutionState, DispatchError>>>,
    average_duration_ms: Option<i64>,
    follow_events: Vec<FollowEvent>,
    follow_result: Reply<FollowResult>,
    follow_hangs: bool,
    calls_hang: bool,
    kill: Reply<KillResult>,
    queue: Reply<Option<PageResult<QueuedItem>>>,
    projects: Reply<Vec<String>>,
    status_times: Mutex<Vec<Instant>>,
    follow_requests: Mutex<Vec<FollowRequest>>,
    page_requests: Mutex<Vec<(String, PageRequest)>>,
    kill_requests: Mutex<Vec<String>>,
    project_queries: Mutex<usize>,
}

impl FakeDispatcher {
    pub(crate) fn with_statuses(self, states: impl IntoIterator<Item = ExecutionState>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .extend(states.into_iter().map(Ok));
        self
    }

    pub(crate) fn with_status_error(self, err: DispatchError) -> Self {
        self.statuses.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn with_average_duration_ms(mut self, average_duration_ms: i64) -> Self {
        self.average_duration_ms = Some(average_duration_ms);
        self
    }

    pub(crate) fn with_follow_events(mut self, events: impl IntoIterator<Item = FollowEvent>) -> Self {
        self.follow_events.extend(events);
        self
    }

    pub(crate) fn with_follow_result(self, final_state: Option<ExecutionState>) -> Self {
        *self.follow_result.lock().unwrap() = Some(Ok(FollowResult { final_state }));
        self
    }

    pub(crate) fn with_follow_error(self, err: DispatchError) -> Self {
        *self.follow_result.lock().unwrap() = Some(Err(err));
        self
    }

    pub(crate) fn with_hanging_follow(mut self) -> Self {
        self.follow_hangs = true;
        self
    }

    /// Every call except `follow_execution` records itself and never answers.
    pub(crate) fn with_hanging_calls(mut self) -> Self {
        self.calls_hang = true;
        self
    }

    async fn hang_if_scripted(&self) {
        if self.calls_hang {
            std::future::pending::<()>().await;
        }
    }

    pub(crate) fn with_kill(self, result: Result<KillResult, DispatchError>) -> Self {
        *self.kill.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn with_queue(
        self,
        result: Result<Option<PageResult<QueuedItem>>, DispatchError>,
    ) -> Self {
        *self.queue.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn with_projects(self, result: Result<Vec<String>, DispatchError>) -> Self {
        *self.projects.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn status_queries(&self) -> usize {
        self.status_times.lock().unwrap().len()
    }

    /// Time between consecutive status queries.
    pub(crate) fn status_gaps(&self) -> Vec<Duration> {
        let times = self.status_times.lock().unwrap();
        times
            .windows(2)
            .map(|pair| pair[1].duration_since(pair[0]))
            .collect()
    }

    pub(crate) fn follow_requests(&self) -> Vec<FollowRequest> {
        self.follow_requests.lock().unwrap().clone()
    }

    pub(crate) fn page_requests(&self) -> Vec<(String, PageRequest)> {
        self.page_requests.lock().unwrap().clone()
    }

    pub(crate) fn kill_requests(&self) -> Vec<String> {
        self.kill_requests.lock().unwrap().clone()
    }

    pub(crate) fn project_queries(&self) -> usize {
        *self.project_queries.lock().unwrap()
    }

    pub(crate) fn remote_calls(&self) -> usize {
        self.status_queries()
            + self.follow_requests.lock().unwrap().len()
            + self.page_requests.lock().unwrap().len()
            + self.kill_requests.lock().unwrap().len()
            + self.project_queries()
    }
}

fn take<T>(reply: &Reply<T>, call: &str) -> Result<T, DispatchError> {
    reply
        .lock()
        .unwrap()
        .take()
        .unwrap_or_else(|| Err(DispatchError::Remote(format!("no scripted reply for {call}"))))
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn get_execution(&self, id: &str) -> Result<ExecutionDetail, DispatchError> {
        self.status_times.lock().unwrap().push(Instant::now());
        self.hang_if_scripted().await;
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DispatchError::Remote(format!("execution not found: {id}"))))?;
        Ok(ExecutionDetail {
            id: id.to_string(),
            status,
            job: self.average_duration_ms.map(|average_duration_ms| ExecutionJob {
                name: "nightly-build".to_string(),
                average_duration_ms,
            }),
        })
    }

    async fn follow_execution(
        &self,
        _id: &str,
        request: FollowRequest,
        receiver: &mut dyn FollowReceiver,
    ) -> Result<FollowResult, DispatchError> {
        self.follow_requests.lock().unwrap().push(request);
        for event in &self.follow_events {
            receiver.receive(event);
        }
        if self.follow_hangs {
            std::future::pending::<()>().await;
        }
        take(&self.follow_result, "follow_execution")
    }

    async fn kill_execution(&self, id: &str) -> Result<KillResult, DispatchError> {
        self.kill_requests.lock().unwrap().push(id.to_string());
        self.hang_if_scripted().await;
        take(&self.kill, "kill_execution")
    }

    async fn list_queue(
        &self,
        project: &str,
        page: PageRequest,
    ) -> Result<Option<PageResult<QueuedItem>>, DispatchError> {
        self.page_requests
            .lock()
            .unwrap()
            .push((project.to_string(), page));
        self.hang_if_scripted().await;
        take(&self.queue, "list_queue")
    }

    async fn list_project_names(&self) -> Result<Vec<String>, DispatchError> {
        *self.project_queries.lock().unwrap() += 1;
        self.hang_if_scripted().await;
        take(&self.projects, "list_project_names")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Level {
    Log,
    Warn,
    Error,
    Verbose,
    Debug,
}

#[derive(Default)]
pub(crate) struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub(crate) fn lines(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub(crate) fn logs(&self) -> Vec<String> {
        self.lines(Level::Log)
    }

    pub(crate) fn warnings(&self) -> Vec<String> {
        self.lines(Level::Warn)
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.lines(Level::Error)
    }

    fn push(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl ToolLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.push(Level::Log, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn verbose(&self, message: &str) {
        self.push(Level::Verbose, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }
}
