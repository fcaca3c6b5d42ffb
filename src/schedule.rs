//! Frame-driven tick scheduling
//!
//! The simulation runs at a fixed minimum interval regardless of the
//! display refresh rate. `TickGate` makes the accept/skip decision from
//! frame timestamps; the wasm `FrameScheduler` feeds it from
//! `requestAnimationFrame`. Frames that arrive early are skipped, not
//! queued, so the effective rate adapts to the host without accumulating
//! drift beyond one frame.

/// Decides which frame timestamps become simulation ticks
#[derive(Debug, Clone)]
pub struct TickGate {
    min_interval_ms: f64,
    last_ms: Option<f64>,
}

impl TickGate {
    pub fn new(min_interval_ms: f64) -> Self {
        Self {
            min_interval_ms,
            last_ms: None,
        }
    }

    /// Returns true when this frame should tick. The first frame only
    /// seeds the reference time.
    pub fn accept(&mut self, now_ms: f64) -> bool {
        match self.last_ms {
            None => {
                self.last_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms - last >= self.min_interval_ms => {
                self.last_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }

    /// Forget the reference time, e.g. after the tab was hidden
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::FrameScheduler;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use anyhow::{Result, anyhow};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use super::TickGate;

    type LoopClosure = Closure<dyn FnMut(f64)>;

    /// Handle to a running requestAnimationFrame loop
    pub struct FrameScheduler {
        cancelled: Rc<Cell<bool>>,
        frame_id: Rc<Cell<i32>>,
        closure: Rc<RefCell<Option<LoopClosure>>>,
    }

    impl FrameScheduler {
        /// Subscribe to the frame signal and invoke `on_tick` with the
        /// frame timestamp whenever at least `min_interval_ms` has
        /// elapsed since the last accepted tick.
        pub fn run(mut on_tick: impl FnMut(f64) + 'static, min_interval_ms: f64) -> Result<Self> {
            let cancelled = Rc::new(Cell::new(false));
            let frame_id = Rc::new(Cell::new(0));
            let closure: Rc<RefCell<Option<LoopClosure>>> = Rc::new(RefCell::new(None));

            let mut gate = TickGate::new(min_interval_ms);
            let cancelled_in_loop = cancelled.clone();
            let frame_id_in_loop = frame_id.clone();
            let closure_in_loop = closure.clone();

            *closure.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
                // A frame already queued when cancel() ran
                if cancelled_in_loop.get() {
                    return;
                }
                if gate.accept(time) {
                    on_tick(time);
                }
                if cancelled_in_loop.get() {
                    return;
                }
                if let Ok(id) = request_frame(&closure_in_loop) {
                    frame_id_in_loop.set(id);
                }
            }));

            frame_id.set(request_frame(&closure)?);

            Ok(Self {
                cancelled,
                frame_id,
                closure,
            })
        }

        /// Stop future invocations and release the frame subscription.
        /// Safe to call repeatedly. Must not be called from inside
        /// `on_tick`; the in-loop cancellation flag covers that path.
        pub fn cancel(&self) {
            if self.cancelled.replace(true) {
                return;
            }
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(self.frame_id.get());
            }
            self.closure.borrow_mut().take();
            log::debug!("Frame scheduler cancelled");
        }
    }

    fn request_frame(closure: &Rc<RefCell<Option<LoopClosure>>>) -> Result<i32> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
        let borrowed = closure.borrow();
        let closure = borrowed
            .as_ref()
            .ok_or_else(|| anyhow!("frame closure already released"))?;
        window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("requestAnimationFrame failed: {:?}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_seeds_reference() {
        let mut gate = TickGate::new(16.0);
        assert!(!gate.accept(1000.0));
        assert!(gate.accept(1016.0));
    }

    #[test]
    fn test_fast_frames_are_skipped_not_queued() {
        let mut gate = TickGate::new(16.0);
        gate.accept(0.0);

        // 120 Hz frames: every other one ticks
        let mut ticks = 0;
        for frame in 1..=10 {
            if gate.accept(frame as f64 * 8.0) {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 5);
    }

    #[test]
    fn test_slow_frames_tick_once_each() {
        let mut gate = TickGate::new(16.0);
        gate.accept(0.0);

        // 30 Hz frames: one tick per frame, never a burst
        assert!(gate.accept(33.0));
        assert!(gate.accept(66.0));
        assert!(gate.accept(99.0));
    }

    #[test]
    fn test_reference_is_frame_time_not_deadline() {
        let mut gate = TickGate::new(16.0);
        gate.accept(0.0);

        // A late frame re-anchors on its own timestamp, so the gap to the
        // next tick never carries more than one frame of drift.
        assert!(gate.accept(30.0));
        assert!(!gate.accept(40.0));
        assert!(gate.accept(46.0));
    }

    #[test]
    fn test_reset_reseeds() {
        let mut gate = TickGate::new(16.0);
        gate.accept(0.0);
        gate.reset();
        assert!(!gate.accept(5000.0));
        assert!(gate.accept(5016.0));
    }
}
