use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use super::renderer::RenderOutcome;
use super::session::OverlaySession;
use crate::core::{Host, TimerId};

/// Stand-in for a media element: tracks the playback position on the host
/// clock and raises time-update events into the overlay session
pub struct Playback {
    session: Rc<RefCell<OverlaySession>>,
    duration_s: f64,
    position_s: f64,
    /// Host time and position when playback last (re)started
    anchor: Option<(f64, f64)>,
    update_interval_ms: f64,
    timer: Option<TimerId>,
    updates: u64,
}

pub type SharedPlayback = Rc<RefCell<Playback>>;

impl Playback {
    pub fn new(session: Rc<RefCell<OverlaySession>>, duration_s: f64, time_update_hz: f64) -> SharedPlayback {
        Rc::new(RefCell::new(Self {
            session,
            duration_s: duration_s.max(0.0),
            position_s: 0.0,
            anchor: None,
            update_interval_ms: 1000.0 / time_update_hz.max(0.1),
            timer: None,
            updates: 0,
        }))
    }

    /// Start emitting time updates; no-op while already playing
    pub fn play(this: &SharedPlayback, host: &mut Host) {
        let mut playback = this.borrow_mut();
        if playback.timer.is_some() {
            return;
        }

        playback.anchor = Some((host.now_ms(), playback.position_s));
        let weak: Weak<RefCell<Playback>> = Rc::downgrade(this);
        let interval = playback.update_interval_ms;

        playback.timer = Some(host.set_interval(
            interval,
            Box::new(move |host| {
                if let Some(playback) = weak.upgrade() {
                    Playback::time_update(&playback, host);
                }
            }),
        ));
        debug!("playback: play from {:.2}s", playback.position_s);
    }

    pub fn pause(this: &SharedPlayback, host: &mut Host) {
        let mut playback = this.borrow_mut();
        playback.position_s = playback.position_at(host.now_ms());
        playback.anchor = None;
        if let Some(timer) = playback.timer.take() {
            host.clear_timer(timer);
        }
    }

    /// Jump to `position_s`; the overlay repaints immediately
    pub fn seek(this: &SharedPlayback, host: &mut Host, position_s: f64) -> RenderOutcome {
        let session = {
            let mut playback = this.borrow_mut();
            playback.position_s = position_s.clamp(0.0, playback.duration_s);
            if playback.anchor.is_some() {
                playback.anchor = Some((host.now_ms(), playback.position_s));
            }
            Rc::clone(&playback.session)
        };

        let position = this.borrow().position_s;
        let outcome = session.borrow_mut().on_time_update(position);
        outcome
    }

    fn time_update(this: &SharedPlayback, host: &mut Host) {
        let (session, position) = {
            let mut playback = this.borrow_mut();
            let position = playback.position_at(host.now_ms());
            playback.position_s = position;
            playback.updates += 1;

            if position >= playback.duration_s {
                playback.anchor = None;
                if let Some(timer) = playback.timer.take() {
                    host.clear_timer(timer);
                }
                debug!("playback: ended at {:.2}s", position);
            }
            (Rc::clone(&playback.session), position)
        };

        session.borrow_mut().on_time_update(position);
    }

    fn position_at(&self, now_ms: f64) -> f64 {
        match self.anchor {
            Some((since_ms, from_s)) => (from_s + (now_ms - since_ms) / 1000.0).min(self.duration_s),
            None => self.position_s,
        }
    }

    pub fn position_s(&self) -> f64 {
        self.position_s
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    /// Time updates raised so far
    pub fn updates(&self) -> u64 {
        self.updates
    }
}
