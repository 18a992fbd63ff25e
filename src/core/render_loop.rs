use std::cell::RefCell;
use std::rc::Rc;

use super::host::{FrameRequestId, Host};

/// Per-frame work of a render loop, receives the frame timestamp
pub type FrameWork = Box<dyn FnMut(&mut Host, f64)>;

struct LoopState {
    running: bool,
    work: Option<FrameWork>,
    pending: Option<FrameRequestId>,
    frames: u64,
}

/// Self-rescheduling frame loop: every frame runs `work` then requests the next
///
/// This is the kind of loop the perf harness observes; it knows nothing about
/// being measured.
#[derive(Clone)]
pub struct RenderLoop {
    state: Rc<RefCell<LoopState>>,
}

impl RenderLoop {
    pub fn start(host: &mut Host, work: FrameWork) -> Self {
        let render_loop = Self {
            state: Rc::new(RefCell::new(LoopState {
                running: true,
                work: Some(work),
                pending: None,
                frames: 0,
            })),
        };
        Self::schedule(&render_loop.state, host);
        render_loop
    }

    fn schedule(state: &Rc<RefCell<LoopState>>, host: &mut Host) {
        let next = Rc::clone(state);
        let id = host.request_frame(Box::new(move |host, timestamp| {
            let work = {
                let mut state = next.borrow_mut();
                state.pending = None;
                if !state.running {
                    return;
                }
                state.frames += 1;
                state.work.take()
            };

            if let Some(mut work) = work {
                work(host, timestamp);
                next.borrow_mut().work = Some(work);
            }

            if next.borrow().running {
                RenderLoop::schedule(&next, host);
            }
        }));
        state.borrow_mut().pending = Some(id);
    }

    /// Stop after the current frame; the pending request is cancelled
    pub fn stop(&self, host: &mut Host) {
        let mut state = self.state.borrow_mut();
        state.running = false;
        if let Some(id) = state.pending.take() {
            host.cancel_frame(id);
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.state.borrow().frames
    }
}
