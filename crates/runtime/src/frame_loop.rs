//! Self-rescheduling per-frame callback with an owned, synchronously
//! cancellable handle.
//!
//! The host supplies a [`FrameScheduler`] (for example `requestAnimationFrame`
//! in a browser). [`AnimationDriver::start`] runs the tick once per scheduled
//! callback and requests the next one. Dropping or stopping the returned
//! [`DriverHandle`] cancels the pending request and releases the tick closure;
//! a callback the host already dequeued still fires but finds the loop stopped
//! and does nothing.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::frame::Frame;

/// Identifier of a scheduled frame callback, as returned by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Host hook that runs a callback once at the next display refresh.
pub trait FrameScheduler {
    fn request(&self, callback: Box<dyn FnOnce()>) -> RequestId;
    fn cancel(&self, id: RequestId);
}

type TickFn = Box<dyn FnMut(Frame)>;

struct DriverInner {
    scheduler: Rc<dyn FrameScheduler>,
    // Taken out while the tick runs so a stop from inside the tick never
    // re-enters the cell.
    tick: RefCell<Option<TickFn>>,
    pending: Cell<Option<RequestId>>,
    next_frame: Cell<Frame>,
    stopped: Cell<bool>,
}

pub struct AnimationDriver;

impl AnimationDriver {
    /// Starts the loop: the first tick runs at the scheduler's next refresh.
    pub fn start<F>(scheduler: Rc<dyn FrameScheduler>, dt_s: f64, tick: F) -> DriverHandle
    where
        F: FnMut(Frame) + 'static,
    {
        let inner = Rc::new(DriverInner {
            scheduler,
            tick: RefCell::new(Some(Box::new(tick))),
            pending: Cell::new(None),
            next_frame: Cell::new(Frame::first(dt_s)),
            stopped: Cell::new(false),
        });
        schedule_next(&inner);
        debug!("animation driver started");
        DriverHandle { inner }
    }
}

fn schedule_next(inner: &Rc<DriverInner>) {
    let weak: Weak<DriverInner> = Rc::downgrade(inner);
    let id = inner.scheduler.request(Box::new(move || {
        if let Some(inner) = weak.upgrade() {
            run_tick(&inner);
        }
    }));
    inner.pending.set(Some(id));
}

fn run_tick(inner: &Rc<DriverInner>) {
    inner.pending.set(None);
    if inner.stopped.get() {
        return;
    }

    let Some(mut tick) = inner.tick.borrow_mut().take() else {
        return;
    };

    let frame = inner.next_frame.get();
    inner.next_frame.set(frame.next());
    tick(frame);

    if inner.stopped.get() {
        // Stopped from inside the tick.
        return;
    }
    *inner.tick.borrow_mut() = Some(tick);
    schedule_next(inner);
}

/// Owned handle of a running [`AnimationDriver`]. Stops the loop on drop.
pub struct DriverHandle {
    inner: Rc<DriverInner>,
}

impl DriverHandle {
    /// Stops the loop. Idempotent; safe to call from inside a tick.
    pub fn stop(&self) {
        if self.inner.stopped.replace(true) {
            return;
        }
        if let Some(id) = self.inner.pending.take() {
            self.inner.scheduler.cancel(id);
        }
        if let Ok(mut tick) = self.inner.tick.try_borrow_mut() {
            tick.take();
        }
        debug!(frames = self.frames_run(), "animation driver stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.inner.stopped.get()
    }

    /// Number of ticks that have started so far.
    pub fn frames_run(&self) -> u64 {
        self.inner.next_frame.get().index
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.inner.pending.get()
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverHandle")
            .field("running", &self.is_running())
            .field("frames_run", &self.frames_run())
            .field("pending", &self.pending_request())
            .finish()
    }
}

type QueuedCallback = (RequestId, Box<dyn FnOnce()>);

#[derive(Default)]
struct ManualState {
    next_id: u64,
    queue: Vec<QueuedCallback>,
    cancelled: u64,
}

/// Deterministic [`FrameScheduler`] driven by hand; used by headless runs
/// and tests.
#[derive(Clone, Default)]
pub struct ManualFrameScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn cancelled(&self) -> u64 {
        self.state.borrow().cancelled
    }

    /// Runs every callback queued before this call and returns how many ran.
    /// Callbacks requested while running wait for the next call.
    pub fn run_pending(&self) -> usize {
        let batch = std::mem::take(&mut self.state.borrow_mut().queue);
        let count = batch.len();
        for (_, callback) in batch {
            callback();
        }
        count
    }

    /// Runs `frames` refreshes and returns the total number of callbacks run.
    pub fn run_frames(&self, frames: usize) -> usize {
        (0..frames).map(|_| self.run_pending()).sum()
    }

    /// Removes the queued callbacks without running them, as a host does
    /// right before it invokes them.
    pub fn take_pending(&self) -> Vec<Box<dyn FnOnce()>> {
        std::mem::take(&mut self.state.borrow_mut().queue)
            .into_iter()
            .map(|(_, callback)| callback)
            .collect()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request(&self, callback: Box<dyn FnOnce()>) -> RequestId {
        let mut state = self.state.borrow_mut();
        let id = RequestId(state.next_id);
        state.next_id += 1;
        state.queue.push((id, callback));
        id
    }

    fn cancel(&self, id: RequestId) {
        let mut state = self.state.borrow_mut();
        let before = state.queue.len();
        state.queue.retain(|(queued, _)| *queued != id);
        if state.queue.len() != before {
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationDriver, FrameScheduler, ManualFrameScheduler};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn scheduler() -> (ManualFrameScheduler, Rc<dyn FrameScheduler>) {
        let manual = ManualFrameScheduler::new();
        let shared: Rc<dyn FrameScheduler> = Rc::new(manual.clone());
        (manual, shared)
    }

    #[test]
    fn ticks_once_per_refresh_with_increasing_frames() {
        let (manual, shared) = scheduler();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_tick = seen.clone();
        let handle = AnimationDriver::start(shared, 1.0 / 60.0, move |frame| {
            seen_in_tick.borrow_mut().push(frame.index);
        });

        assert!(seen.borrow().is_empty());
        assert_eq!(manual.run_frames(3), 3);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(handle.frames_run(), 3);
        assert_eq!(manual.pending(), 1);
    }

    #[test]
    fn stop_cancels_pending_request() {
        let (manual, shared) = scheduler();
        let ticks = Rc::new(Cell::new(0));
        let ticks_in_tick = ticks.clone();
        let handle = AnimationDriver::start(shared, 1.0, move |_| {
            ticks_in_tick.set(ticks_in_tick.get() + 1);
        });

        manual.run_pending();
        handle.stop();
        assert_eq!(manual.pending(), 0);
        assert_eq!(manual.cancelled(), 1);
        assert_eq!(manual.run_frames(5), 0);
        assert_eq!(ticks.get(), 1);
        assert!(!handle.is_running());
    }

    #[test]
    fn callback_dequeued_before_stop_does_not_tick() {
        let (manual, shared) = scheduler();
        let ticks = Rc::new(Cell::new(0));
        let ticks_in_tick = ticks.clone();
        let handle = AnimationDriver::start(shared, 1.0, move |_| {
            ticks_in_tick.set(ticks_in_tick.get() + 1);
        });

        let in_flight = manual.take_pending();
        handle.stop();
        for callback in in_flight {
            callback();
        }
        assert_eq!(ticks.get(), 0);
        assert_eq!(manual.pending(), 0);
    }

    #[test]
    fn dropping_handle_stops_and_releases_tick_state() {
        let (manual, shared) = scheduler();
        let state = Rc::new(());
        let captured = state.clone();
        let handle = AnimationDriver::start(shared, 1.0, move |_| {
            let _ = &captured;
        });
        assert_eq!(Rc::strong_count(&state), 2);

        drop(handle);
        assert_eq!(Rc::strong_count(&state), 1);
        assert_eq!(manual.run_pending(), 0);
    }

    #[test]
    fn stop_from_inside_tick_prevents_reschedule() {
        let (manual, shared) = scheduler();
        let slot: Rc<RefCell<Option<super::DriverHandle>>> = Rc::new(RefCell::new(None));
        let slot_in_tick = slot.clone();
        let ticks = Rc::new(Cell::new(0));
        let ticks_in_tick = ticks.clone();
        let handle = AnimationDriver::start(shared, 1.0, move |_| {
            ticks_in_tick.set(ticks_in_tick.get() + 1);
            if let Some(handle) = slot_in_tick.borrow().as_ref() {
                handle.stop();
            }
        });
        *slot.borrow_mut() = Some(handle);

        manual.run_pending();
        assert_eq!(ticks.get(), 1);
        assert_eq!(manual.pending(), 0);
        assert_eq!(manual.run_frames(3), 0);

        // Break the handle <-> closure cycle this test created.
        slot.borrow_mut().take();
    }

    #[test]
    fn stop_is_idempotent() {
        let (manual, shared) = scheduler();
        let handle = AnimationDriver::start(shared, 1.0, |_| {});
        handle.stop();
        handle.stop();
        assert_eq!(manual.cancelled(), 1);
    }
}
