use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct JobHandle {
    name: &'static str,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Holds named periodic tasks, one cancellation channel per task.
/// Cancellation is cooperative: it is observed between ticks, never during
/// a running tick, so a zone pass or an email batch always finishes before
/// its job stops.
#[derive(Default)]
pub struct JobScheduler {
    jobs: Vec<JobHandle>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(&mut self, name: &'static str, every: Duration, task: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick fires immediately; consume it so the
            // job first runs one full period after scheduling.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Triggered job: {}", name);
                        task().await;
                    }
                    _ = cancel_rx.changed() => {
                        info!("Stopped {} job", name);
                        return;
                    }
                }
            }
        });

        info!("Scheduled {} job every {:?}", name, every);
        self.jobs.push(JobHandle {
            name,
            cancel: cancel_tx,
            handle,
        });
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|job| job.name).collect()
    }

    /// Cancels every task and waits for each to finish its current tick.
    pub async fn shutdown(self) {
        for job in self.jobs {
            let _ = job.cancel.send(true);
            if let Err(e) = job.handle.await {
                warn!("Job {} terminated abnormally: {}", job.name, e);
            }
        }
    }
}
