use std::thread;
use std::time::{Duration, Instant};

use cover_core::Frame;
use log::trace;
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::scheduler::{Offer, RecognitionScheduler, Recognize};
use crate::state::Snapshot;

/// Supplies frames at whatever pace it can; `None` ends the stream
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

impl<I: Iterator<Item = Frame>> FrameSource for I {
    fn next_frame(&mut self) -> Option<Frame> {
        self.next()
    }
}

/// Per-outcome frame counts for one display run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayStats {
    pub frames: u64,
    pub dispatched: u64,
    pub decimated: u64,
    pub busy: u64,
    pub cooling_down: u64,
    pub spawn_failed: u64,
    /// Newly published results observed by the renderer
    pub results_seen: u64,
}

impl DisplayStats {
    fn record(&mut self, offer: Offer) {
        match offer {
            Offer::Dispatched => self.dispatched += 1,
            Offer::Decimated => self.decimated += 1,
            Offer::Busy => self.busy += 1,
            Offer::CoolingDown => self.cooling_down += 1,
            Offer::SpawnFailed => self.spawn_failed += 1,
        }
    }
}

/// Fixed-tick display driver.
///
/// Each tick renders the frame with the latest published result and offers
/// it to the scheduler. Recognition never holds up a tick.
#[derive(Debug, Clone, Copy)]
pub struct DisplayLoop {
    tick: Duration,
}

impl DisplayLoop {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.tick())
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn run<S, R, C, F>(&self, mut source: S, scheduler: &RecognitionScheduler<R, C>, mut render: F) -> DisplayStats
    where
        S: FrameSource,
        R: Recognize,
        C: Clock,
        F: FnMut(&Frame, &Snapshot),
    {
        let mut stats = DisplayStats::default();
        let mut last_generation = scheduler.latest().generation;

        loop {
            let started = Instant::now();
            let Some(frame) = source.next_frame() else {
                break;
            };
            stats.frames += 1;

            let snapshot = scheduler.latest();
            if snapshot.generation != last_generation {
                last_generation = snapshot.generation;
                stats.results_seen += 1;
            }
            render(&frame, &snapshot);

            let offer = scheduler.offer(frame);
            trace!("frame {}: {:?}", stats.frames, offer);
            stats.record(offer);

            let rest = self.tick.saturating_sub(started.elapsed());
            if !rest.is_zero() {
                thread::sleep(rest);
            }
        }
        stats
    }
}
