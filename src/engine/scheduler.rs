//! Background playback worker.
//!
//! One thread wakes every tick interval, locks the shared state and steps it
//! by the wall-clock time since the previous tick.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};

use super::lock;

/// State the scheduler can step forward.
pub trait Tick: Send {
    /// Advance by `dt` seconds.
    fn tick(&mut self, dt: f32);
}

struct Worker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns the playback thread. Starting and stopping are idempotent.
pub struct Scheduler {
    interval: Duration,
    worker: Option<Worker>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            worker: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the worker ticking `target`. No-op when already running.
    pub fn start<T: Tick + 'static>(&mut self, target: Arc<Mutex<T>>) -> io::Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("chroma-playback".to_string())
            .spawn(move || {
                let mut last = Instant::now();
                while flag.load(Ordering::Acquire) {
                    thread::park_timeout(interval);
                    if !flag.load(Ordering::Acquire) {
                        break;
                    }
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f32();
                    last = now;
                    lock(&target).tick(dt);
                }
            })?;

        debug!("Playback scheduler started ({:?} interval)", interval);
        self.worker = Some(Worker { running, handle });
        Ok(())
    }

    /// Stop and join the worker. Animation state is left untouched.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.running.store(false, Ordering::Release);
        worker.handle.thread().unpark();
        if worker.handle.join().is_err() {
            error!("Playback scheduler thread panicked");
        } else {
            debug!("Playback scheduler stopped");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
