use dispatch_protocol::FollowEvent;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::FollowMode;
use crate::dispatcher::FollowReceiver;
use crate::logger::ToolLogger;

const MARKS_PER_AVERAGE: i64 = 40;
const MIN_MARK_INTERVAL: Duration = Duration::from_millis(250);
const MAX_MARK_INTERVAL: Duration = Duration::from_secs(10);
const UNKNOWN_MARK_INTERVAL: Duration = Duration::from_secs(1);
const PROGRESS_MARK: &str = ".";
const OVERRUN_MARK: &str = "+";

/// Renders follow events to a console sink in one of the three follow modes.
pub(crate) struct ConsoleFollowReceiver<'a, W: Write + Send> {
    mode: FollowMode,
    out: &'a mut W,
    logger: &'a dyn ToolLogger,
    average: Option<Duration>,
    mark_interval: Duration,
    started_at: Instant,
    last_mark: Option<Instant>,
    reported_elapsed: Option<(Duration, Instant)>,
    sink_failed: bool,
}

impl<'a, W: Write + Send> ConsoleFollowReceiver<'a, W> {
    /// `average_duration_ms` of -1 (or any negative value) means unknown.
    pub(crate) fn new(
        average_duration_ms: i64,
        mode: FollowMode,
        out: &'a mut W,
        logger: &'a dyn ToolLogger,
    ) -> Self {
        let average = u64::try_from(average_duration_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        Self {
            mode,
            out,
            logger,
            average,
            mark_interval: mark_interval(average_duration_ms),
            started_at: Instant::now(),
            last_mark: None,
            reported_elapsed: None,
            sink_failed: false,
        }
    }

    pub(crate) fn mark_interval(&self) -> Duration {
        self.mark_interval
    }

    /// Writes a progress mark if one is due, whether or not the stream has said anything.
    pub(crate) fn tick(&mut self) {
        if self.mode != FollowMode::Progress || self.sink_failed {
            return;
        }
        let written = self.write_due_mark();
        self.record(written);
    }

    /// Ends the rendered block; non-output modes leave the cursor mid-line.
    pub(crate) fn finish(mut self) -> io::Result<()> {
        if self.mode != FollowMode::Output && !self.sink_failed {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn write_lines(&mut self, event: &FollowEvent) -> io::Result<()> {
        if let FollowEvent::Output { lines } = event {
            for line in lines {
                writeln!(self.out, "{}", line.message)?;
            }
            self.out.flush()?;
        }
        Ok(())
    }

    fn write_mark(&mut self, event: &FollowEvent) -> io::Result<()> {
        if let FollowEvent::Progress { elapsed_ms, .. } = event {
            self.reported_elapsed = Some((Duration::from_millis(*elapsed_ms), Instant::now()));
        }
        self.write_due_mark()
    }

    fn write_due_mark(&mut self) -> io::Result<()> {
        let now = Instant::now();
        let due = self
            .last_mark
            .map_or(true, |last| now.duration_since(last) >= self.mark_interval);
        if !due {
            return Ok(());
        }
        self.last_mark = Some(now);
        let mark = if self.overran(now) {
            OVERRUN_MARK
        } else {
            PROGRESS_MARK
        };
        self.out.write_all(mark.as_bytes())?;
        self.out.flush()
    }

    fn record(&mut self, written: io::Result<()>) {
        if let Err(err) = written {
            self.sink_failed = true;
            self.logger
                .warn(&format!("failed to write execution output, dropping the rest: {err}"));
        }
    }

    /// The average is an estimate: past it the receiver keeps going, only the mark changes.
    fn overran(&self, now: Instant) -> bool {
        let Some(average) = self.average else {
            return false;
        };
        let elapsed = match self.reported_elapsed {
            Some((reported, at)) => reported + now.duration_since(at),
            None => now.duration_since(self.started_at),
        };
        elapsed > average
    }
}

impl<W: Write + Send> FollowReceiver for ConsoleFollowReceiver<'_, W> {
    fn receive(&mut self, event: &FollowEvent) {
        if self.sink_failed {
            return;
        }
        let written = match self.mode {
            FollowMode::Output => self.write_lines(event),
            FollowMode::Quiet => Ok(()),
            FollowMode::Progress => self.write_mark(event),
        };
        self.record(written);
    }
}

/// Lets the follow stream and the mark timer feed the same receiver.
pub(crate) struct SharedReceiver<'r, R> {
    inner: &'r Mutex<R>,
}

impl<'r, R> SharedReceiver<'r, R> {
    pub(crate) fn new(inner: &'r Mutex<R>) -> Self {
        Self { inner }
    }
}

impl<R: FollowReceiver> FollowReceiver for SharedReceiver<'_, R> {
    fn receive(&mut self, event: &FollowEvent) {
        lock(self.inner).receive(event);
    }
}

pub(crate) fn lock<R>(receiver: &Mutex<R>) -> MutexGuard<'_, R> {
    receiver.lock().unwrap_or_else(PoisonError::into_inner)
}

fn mark_interval(average_duration_ms: i64) -> Duration {
    if average_duration_ms <= 0 {
        return UNKNOWN_MARK_INTERVAL;
    }
    let per_mark = Duration::from_millis((average_duration_ms / MARKS_PER_AVERAGE) as u64);
    per_mark.clamp(MIN_MARK_INTERVAL, MAX_MARK_INTERVAL)
}
