//! Decides which delivered frames are recognised and runs recognition off
//! the delivery thread.
//!
//! A frame passes three gates in order: decimation (only every Nth delivered
//! frame), the busy flag (at most one run in flight) and the cooldown
//! (minimum spacing between run starts). Frames refused by any gate are
//! dropped, never queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cover_core::Frame;
use log::{debug, error};
use parking_lot::Mutex;
use crate::clock::{Clock, Cooldown, MonotonicClock};
use crate::config::SchedulerConfig;
use crate::recognizer::RecognitionEngine;
use crate::result::MatchResult;
use crate::state::{ResultCell, Snapshot};

const WORKER_NAME: &str = "cover-recognition";

/// Anything that can turn a frame into a recognition result
pub trait Recognize: Send + Sync + 'static {
    fn recognize(&self, frame: &Frame) -> MatchResult;
}

impl Recognize for RecognitionEngine {
    fn recognize(&self, frame: &Frame) -> MatchResult {
        RecognitionEngine::recognize(self, frame)
    }
}

/// What happened to an offered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Offer {
    /// A recognition run was started on the frame
    Dispatched,
    /// Not one of the every-Nth frames
    Decimated,
    /// A previous run is still in flight
    Busy,
    /// The last run started too recently
    CoolingDown,
    /// The worker thread could not be started
    SpawnFailed,
}

/// Clears the busy flag when a run ends, including by panic
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RecognitionScheduler<R: Recognize, C: Clock = MonotonicClock> {
    recognizer: Arc<R>,
    state: Arc<ResultCell>,
    cooldown: Cooldown<C>,
    decimation: u64,
    delivered: AtomicU64,
    busy: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Recognize> RecognitionScheduler<R, MonotonicClock> {
    pub fn new(recognizer: Arc<R>, config: &SchedulerConfig) -> Self {
        Self::with_clock(recognizer, config, MonotonicClock::new())
    }
}

impl<R: Recognize, C: Clock> RecognitionScheduler<R, C> {
    pub fn with_clock(recognizer: Arc<R>, config: &SchedulerConfig, clock: C) -> Self {
        Self {
            recognizer,
            state: Arc::new(ResultCell::new()),
            cooldown: Cooldown::new(clock, config.cooldown()),
            decimation: config.decimation.max(1),
            delivered: AtomicU64::new(0),
            busy: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Offer a delivered frame. Never blocks on a recognition run.
    pub fn offer(&self, frame: Frame) -> Offer {
        let index = self.delivered.fetch_add(1, Ordering::Relaxed);
        if index % self.decimation != 0 {
            return Offer::Decimated;
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("frame {} dropped: recognition in progress", index);
            return Offer::Busy;
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        if !self.cooldown.try_acquire() {
            debug!(
                "frame {} dropped: cooling down for another {:?}",
                index,
                self.cooldown.remaining()
            );
            return Offer::CoolingDown;
        }

        let mut worker = self.worker.lock();
        // The previous run has released the busy flag, so this join is short
        if let Some(finished) = worker.take() {
            reap(finished);
        }

        let recognizer = Arc::clone(&self.recognizer);
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new().name(WORKER_NAME.to_string()).spawn(move || {
            let _guard = guard;
            let result = recognizer.recognize(&frame);
            let generation = state.publish(result);
            debug!("published result generation {}", generation);
        });

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                debug!("frame {} dispatched for recognition", index);
                Offer::Dispatched
            }
            Err(e) => {
                error!("failed to start recognition worker: {}", e);
                Offer::SpawnFailed
            }
        }
    }

    /// Block until the in-flight run, if any, has finished and published
    pub fn wait_idle(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            reap(handle);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn latest(&self) -> Snapshot {
        self.state.latest()
    }

    /// Shared handle to the published result
    pub fn state(&self) -> Arc<ResultCell> {
        Arc::clone(&self.state)
    }

    pub fn frames_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn cooldown(&self) -> &Cooldown<C> {
        &self.cooldown
    }
}

impl<R: Recognize, C: Clock> Drop for RecognitionScheduler<R, C> {
    fn drop(&mut self) {
        self.wait_idle();
    }
}

fn reap(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        error!("recognition worker panicked; result not published");
    }
}
