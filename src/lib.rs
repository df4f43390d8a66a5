use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct EventState {
    signaled: bool,
    /// Set when `reset` is called while threads are still inside the
    /// wait region; the actual clear is applied by the last of those
    /// threads to depart.
    reset_pending: bool,
    /// Number of threads currently inside `wait`/`wait_timeout`.
    waiters: usize,
}

impl EventState {
    /// A departing waiter that observed the signal calls this; if it
    /// is the last one out and a reset arrived in the meantime, the
    /// deferred clear is applied here, in the same critical section
    /// as the decrement.
    fn depart_signaled(&mut self) {
        self.waiters -= 1;
        if self.waiters == 0 && self.reset_pending {
            self.signaled = false;
            self.reset_pending = false;
        }
    }
}

/// A manual-reset event, modeled on the classic Windows Event:
/// once signaled it stays signaled until explicitly reset, and
/// every thread waiting at signal time is released.
///
/// The interesting part of the contract is the interplay between
/// `signal` and `reset`: a reset issued while waiters are still
/// being scheduled does not take effect until the last of those
/// waiters has observed the signal, so a `signal(); reset();`
/// pair cannot swallow a wakeup.
///
/// ```
/// use std::sync::Arc;
/// use waitevent::Event;
///
/// let event = Arc::new(Event::new(false));
/// let waiter = {
///     let event = Arc::clone(&event);
///     std::thread::spawn(move || event.wait())
/// };
/// event.signal();
/// waiter.join().unwrap();
/// ```
#[derive(Debug)]
pub struct Event {
    state: Mutex<EventState>,
    cond: Condvar,
}

impl Event {
    /// Create an event with the given initial level; `true` means
    /// already signaled.
    pub fn new(signaled: bool) -> Self {
        Self {
            state: Mutex::new(EventState {
                signaled,
                reset_pending: false,
                waiters: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block the calling thread until the event is signaled.
    /// Returns immediately if it already is.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        state.waiters += 1;
        while !state.signaled {
            self.cond.wait(&mut state);
        }
        state.depart_signaled();
    }

    /// Block until the event is signaled or until `timeout` has
    /// elapsed, whichever comes first. Returns `true` if the wait
    /// ended because of the signal, `false` on timeout.
    ///
    /// The deadline is absolute, computed once at entry, so spurious
    /// wakeups do not extend the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        state.waiters += 1;
        let mut timed_out = false;
        while !state.signaled {
            if self.cond.wait_until(&mut state, deadline).timed_out() {
                timed_out = true;
                break;
            }
        }
        if state.signaled {
            // Covers the normal wakeup, and the benign race where the
            // signal lands between the timeout firing and this thread
            // reacquiring the lock.
            state.depart_signaled();
        } else {
            state.waiters -= 1;
        }
        !timed_out
    }

    /// Signal the event, releasing every thread currently blocked in
    /// `wait`/`wait_timeout`. Signaling an already-signaled event is
    /// a no-op.
    pub fn signal(&self) {
        let mut state = self.state.lock();
        state.signaled = true;
        self.cond.notify_all();
    }

    /// Clear the signal. If threads are waiting right now, the clear
    /// is deferred until the last of them has observed the signal and
    /// left the wait region; resetting an unsignaled event does
    /// nothing.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.waiters == 0 {
            state.signaled = false;
            state.reset_pending = false;
        } else if state.signaled {
            state.reset_pending = true;
        }
    }

    /// Momentary signal level. By the time the caller looks at the
    /// result another thread may have changed it; use `wait` to
    /// synchronize.
    pub fn is_signaled(&self) -> bool {
        self.state.lock().signaled
    }
}

impl Default for Event {
    /// An unsignaled event.
    fn default() -> Self {
        Self::new(false)
    }
}
