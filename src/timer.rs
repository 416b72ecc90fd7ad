//! The timer wheel: five delay-ordered buckets plus a delete-list,
//! serviced from the PIT interrupt. Gets its own top-level module rather
//! than living under `drivers/` with the PIT itself, since scheduling
//! policy is a distinct concern from the hardware that drives its ticks.
//!
//! Timers are allocated from a fixed arena (`MAX_TIMERS`) and referenced by
//! handle, following the same arena/handle discipline as the heap's bundles
//! rather than intrusive pointers.

use crate::common::list::{LinkArena, ListHandle};
use crate::config::{MAX_TIMERS, TIMER_BUCKET_DELAYS, TIMER_BUCKET_PROCESS};
use spin::Mutex;

pub type TimerCallback = fn(u32);

const NUM_BUCKETS: usize = TIMER_BUCKET_DELAYS.len();

#[derive(Clone, Copy)]
struct Timer {
    deadline: u32,
    callback: TimerCallback,
    data: u32,
    live: bool,
}

impl Timer {
    const EMPTY: Timer = Timer { deadline: 0, callback: noop, data: 0, live: false };
}

fn noop(_data: u32) {}

struct Wheel {
    arena: LinkArena<MAX_TIMERS>,
    slots: [Timer; MAX_TIMERS],
    free_slots: [usize; MAX_TIMERS],
    free_top: usize,
    buckets: [ListHandle; NUM_BUCKETS],
    del_list: ListHandle,
    ticks: u32,
}

impl Wheel {
    const fn new() -> Self {
        let mut free_slots = [0usize; MAX_TIMERS];
        let mut i = 0;
        while i < MAX_TIMERS {
            free_slots[i] = MAX_TIMERS - 1 - i;
            i += 1;
        }
        Wheel {
            arena: LinkArena::new(),
            slots: [Timer::EMPTY; MAX_TIMERS],
            free_slots,
            free_top: MAX_TIMERS,
            buckets: [ListHandle::new(); NUM_BUCKETS],
            del_list: ListHandle::new(),
            ticks: 0,
        }
    }

    fn alloc_slot(&mut self) -> Option<usize> {
        if self.free_top == 0 {
            return None;
        }
        self.free_top -= 1;
        Some(self.free_slots[self.free_top])
    }

    fn free_slot(&mut self, id: usize) {
        self.slots[id] = Timer::EMPTY;
        self.free_slots[self.free_top] = id;
        self.free_top += 1;
    }

    /// Drains the delete-list, freeing every timer record fired since the
    /// last call. Only ever invoked from task context (via
    /// `add_dyn_timer`); firing itself runs in interrupt context and must
    /// never touch the timer arena directly.
    fn drain_del_list(&mut self) {
        while let Some(id) = self.arena.remove_front(&mut self.del_list) {
            self.free_slot(id);
        }
    }

    /// Picks the highest-index bucket `i` for which
    /// `deadline >= list_delays[i] + ticks`.
    /// Guards against underflow for an already-overdue timer.
    fn bucket_for(&self, deadline: u32) -> usize {
        let mut i = NUM_BUCKETS - 1;
        while i > 0 && deadline < TIMER_BUCKET_DELAYS[i] + self.ticks {
            i -= 1;
        }
        i
    }

    /// Zero-delay timers are treated as "fire on the very next tick"
    /// rather than rejected: they land in bucket 0 with
    /// `deadline == ticks`, which the bucket-0 fire check (`deadline <=
    /// ticks`) already satisfies immediately.
    fn add_dyn_timer(&mut self, delay: u32, callback: TimerCallback, data: u32) -> Option<usize> {
        self.drain_del_list();

        let id = self.alloc_slot()?;
        let deadline = self.ticks.wrapping_add(delay);
        self.slots[id] = Timer { deadline, callback, data, live: true };

        let bucket = self.bucket_for(deadline);
        self.arena.add_tail(&mut self.buckets[bucket], id);
        Some(id)
    }

    /// One PIT tick: walks every bucket due for processing this tick
    /// (`ticks % list_process[i] == 0`), firing bucket-0 timers that are
    /// now due and re-bucketing everything else closer to its deadline
    ///. Each bucket is moved to a local list
    /// before iterating, so a re-insertion never corrupts the walk.
    fn service_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);

        for i in 0..NUM_BUCKETS {
            if self.ticks % TIMER_BUCKET_PROCESS[i] != 0 {
                continue;
            }

            let mut snapshot = ListHandle::new();
            core::mem::swap(&mut snapshot, &mut self.buckets[i]);

            while let Some(id) = self.arena.remove_front(&mut snapshot) {
                let timer = self.slots[id];
                if i == 0 && timer.deadline <= self.ticks {
                    (timer.callback)(timer.data);
                    self.arena.add_tail(&mut self.del_list, id);
                } else {
                    let bucket = self.bucket_for(timer.deadline);
                    self.arena.add_tail(&mut self.buckets[bucket], id);
                }
            }
        }
    }

    fn live_count(&self) -> usize {
        MAX_TIMERS - self.free_top
    }
}

static WHEEL: Mutex<Wheel> = Mutex::new(Wheel::new());

/// Schedules `callback(data)` to run `delay` ticks from now, from within
/// `isr_dispatch`'s IRQ context. Returns `None` if the timer arena is full
///.
pub fn add_dyn_timer(delay: u32, callback: TimerCallback, data: u32) -> Option<usize> {
    WHEEL.lock().add_dyn_timer(delay, callback, data)
}

/// Called once per PIT tick.
pub fn on_tick() {
    WHEEL.lock().service_tick();
}

pub fn ticks() -> u32 {
    WHEEL.lock().ticks
}

pub fn live_count() -> usize {
    WHEEL.lock().live_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static FIRE_COUNT: AtomicU32 = AtomicU32::new(0);
    static LAST_DATA: AtomicU32 = AtomicU32::new(0);

    fn record(data: u32) {
        FIRE_COUNT.fetch_add(1, Ordering::SeqCst);
        LAST_DATA.store(data, Ordering::SeqCst);
    }

    #[test]
    fn fires_once_no_earlier_than_delay() {
        let mut wheel = Wheel::new();
        let id = wheel.add_dyn_timer(3, record, 42).unwrap();
        assert!(wheel.slots[id].live);

        FIRE_COUNT.store(0, Ordering::SeqCst);
        for _ in 0..2 {
            wheel.service_tick();
        }
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 0, "must not fire before its deadline");

        wheel.service_tick();
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 1);
        assert_eq!(LAST_DATA.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn zero_delay_fires_next_tick() {
        let mut wheel = Wheel::new();
        FIRE_COUNT.store(0, Ordering::SeqCst);
        wheel.add_dyn_timer(0, record, 7).unwrap();
        wheel.service_tick();
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_free_reclaims_on_next_add() {
        let mut wheel = Wheel::new();
        let before = wheel.live_count();
        wheel.add_dyn_timer(0, noop, 0).unwrap();
        wheel.service_tick(); // fires, moves to del_list; not freed yet
        assert_eq!(wheel.live_count(), before + 1);

        wheel.add_dyn_timer(10, noop, 0).unwrap(); // drains del_list first
        assert_eq!(wheel.live_count(), before + 1);
    }

    #[test]
    fn bucket_selection_does_not_underflow_when_overdue() {
        let mut wheel = Wheel::new();
        wheel.ticks = 10_000;
        // deadline far in the past relative to every bucket threshold
        assert_eq!(wheel.bucket_for(0), 0);
    }
}
