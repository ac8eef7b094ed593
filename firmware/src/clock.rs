use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;

/// Wall clock for the watch. Synchronized from the phone's Current Time
/// Service when a connection comes up, derived from the monotonic timer in
/// between so no tick task is needed.
pub struct Clock {
    anchor: Mutex<ThreadModeRawMutex, RefCell<Anchor>>,
}

struct Anchor {
    time: time::PrimitiveDateTime,
    at: Instant,
}

impl Clock {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(RefCell::new(Anchor {
                time: time::PrimitiveDateTime::MIN,
                at: Instant::from_ticks(0),
            })),
        }
    }

    /// Pin the wall clock to `time` as of now.
    pub fn set(&self, time: time::PrimitiveDateTime) {
        self.anchor.lock(|a| {
            *a.borrow_mut() = Anchor {
                time,
                at: Instant::now(),
            };
        })
    }

    pub fn get(&self) -> time::PrimitiveDateTime {
        self.anchor.lock(|a| {
            let a = a.borrow();
            let elapsed = Instant::now() - a.at;
            a.time + time::Duration::seconds(elapsed.as_secs() as i64)
        })
    }
}
