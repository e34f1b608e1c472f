use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owned handle to a spawned task. The task is aborted when the handle is
/// cancelled or dropped, so whoever holds the handle owns the task's lifetime.
#[derive(Debug)]
pub struct TaskHandle {
    task: JoinHandle<()>,
}

impl TaskHandle {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self { task: tokio::spawn(future) }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `action` once, `delay` from now.
pub fn after<F>(delay: Duration, action: F) -> TaskHandle
where
    F: FnOnce() + Send + 'static,
{
    TaskHandle::spawn(async move {
        tokio::time::sleep(delay).await;
        action();
    })
}

/// Run `action` every `period`, starting one period from now, until it
/// returns false. Late ticks are skipped rather than bunched up.
pub fn every<F>(period: Duration, mut action: F) -> TaskHandle
where
    F: FnMut() -> bool + Send + 'static,
{
    TaskHandle::spawn(async move {
        let mut ticks = tokio::time::interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            if !action() {
                break;
            }
        }
    })
}
