use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{Local, NaiveDateTime, NaiveTime};
use log::{error, info, warn};

pub type JobFn = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trigger {
    /// Once, when the scheduler starts.
    AtStartup,
    /// Every day at this local wall-clock time.
    DailyAt(NaiveTime),
}

pub struct Job {
    name: String,
    trigger: Trigger,
    run: JobFn,
}

impl Job {
    pub fn new<S, F>(name: S, trigger: Trigger, run: F) -> Self
    where
        S: Into<String>,
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            trigger,
            run: Box::new(run),
        }
    }

    fn execute(&self) {
        info!("Running {}...", self.name);
        match (self.run)() {
            Ok(()) => info!("{} finished", self.name),
            Err(err) => error!("{} failed: {:#}", self.name, err),
        }
    }
}

/// The first occurrence of `at` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Background jobs of the process: started once after boot, stopped on shutdown,
/// never on a request thread.
#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<Job>,
    running: Vec<(mpsc::Sender<()>, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, job: Job) -> &mut Self {
        self.jobs.push(job);
        self
    }

    /// Runs the startup jobs in registration order, then gives every daily job a thread.
    pub fn start(&mut self) -> std::io::Result<()> {
        for job in std::mem::take(&mut self.jobs) {
            match job.trigger {
                Trigger::AtStartup => job.execute(),
                Trigger::DailyAt(at) => {
                    let (stop, stopped) = mpsc::channel::<()>();
                    let handle = thread::Builder::new()
                        .name(format!("job-{}", job.name))
                        .spawn(move || daily_loop(job, at, stopped))?;
                    self.running.push((stop, handle));
                }
            }
        }
        info!("Scheduler started with {} recurring jobs", self.running.len());
        Ok(())
    }

    pub fn shutdown(&mut self) {
        for (stop, handle) in self.running.drain(..) {
            // the worker also exits if it finds the channel closed
            let _ = stop.send(());
            if handle.join().is_err() {
                warn!("scheduler thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn daily_loop(job: Job, at: NaiveTime, stopped: mpsc::Receiver<()>) {
    loop {
        let now = Local::now().naive_local();
        let next = next_run_after(now, at);
        let wait = (next - now).to_std().unwrap_or_else(|_| Duration::from_secs(0));
        info!("{} scheduled for {}", job.name, next);

        match stopped.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => job.execute(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn next_run_is_today_when_still_ahead() {
        let nine_pm = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
        assert_eq!(next_run_after(at(3, 8, 0), nine_pm), at(3, 21, 0));
    }

    #[test]
    fn next_run_rolls_over_at_or_after_the_time() {
        let nine_pm = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
        assert_eq!(next_run_after(at(3, 21, 0), nine_pm), at(4, 21, 0));
        assert_eq!(next_run_after(at(3, 23, 59), nine_pm), at(4, 21, 0));
    }

    #[test]
    fn startup_jobs_run_once_in_order_and_failures_are_contained() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        for name in &["seed_timeslots", "broken", "seed_rooms"] {
            let order = order.clone();
            let name = name.to_string();
            scheduler.add(Job::new(name.clone(), Trigger::AtStartup, move || {
                order.lock().unwrap().push(name.clone());
                if name == "broken" {
                    anyhow::bail!("boom");
                }
                Ok(())
            }));
        }
        scheduler.start().unwrap();
        scheduler.start().unwrap();

        assert_eq!(
            *order.lock().unwrap(),
            vec!["seed_timeslots", "broken", "seed_rooms"]
        );
    }

    #[test]
    fn shutdown_stops_daily_jobs_without_running_them() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut scheduler = Scheduler::new();
        // an hour from now, so it cannot fire during the test
        let later = (Local::now() + chrono::Duration::hours(1)).time();
        scheduler.add(Job::new("daily_reset", Trigger::DailyAt(later), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        scheduler.start().unwrap();
        scheduler.shutdown();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
