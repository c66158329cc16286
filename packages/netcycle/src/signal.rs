use core::cell::Cell;

use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    signal::Signal,
};

pub const READY_SIGNAL_SLOTS: usize = 2;

/// One-shot handoff from the event dispatch context to a waiting caller.
pub struct ReadySignal<M: RawMutex> {
    signal: Signal<M, ()>,
    fires: Mutex<M, Cell<u8>>,
}

impl<M: RawMutex> ReadySignal<M> {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            fires: Mutex::new(Cell::new(0)),
        }
    }

    pub fn fire(&self) {
        self.fires
            .lock(|fires| fires.set(fires.get().saturating_add(1)));
        self.signal.signal(());
    }

    pub async fn wait(&self) {
        self.signal.wait().await
    }

    pub fn fires(&self) -> u8 {
        self.fires.lock(Cell::get)
    }

    fn clear(&self) {
        self.signal.reset();
        self.fires.lock(|fires| fires.set(0));
    }
}

impl<M: RawMutex> Default for ReadySignal<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed set of ready signals handed out per connect cycle.
pub struct SignalPool<M: RawMutex> {
    slots: [ReadySignal<M>; READY_SIGNAL_SLOTS],
    claimed: Mutex<M, Cell<u8>>,
}

impl<M: RawMutex> SignalPool<M> {
    pub const fn new() -> Self {
        Self {
            slots: [const { ReadySignal::new() }; READY_SIGNAL_SLOTS],
            claimed: Mutex::new(Cell::new(0)),
        }
    }

    /// Returns `None` when every slot is leased.
    pub fn claim(&self) -> Option<SignalLease<'_, M>> {
        let index = self.claimed.lock(|claimed| {
            let mask = claimed.get();
            let index = (0..READY_SIGNAL_SLOTS).find(|idx| mask & (1 << idx) == 0)?;
            claimed.set(mask | (1 << index));
            Some(index)
        })?;
        let slot = &self.slots[index];
        slot.clear();
        Some(SignalLease {
            slot,
            index,
            claimed: &self.claimed,
        })
    }

    pub fn available(&self) -> usize {
        let mask = self.claimed.lock(Cell::get);
        READY_SIGNAL_SLOTS - mask.count_ones() as usize
    }
}

impl<M: RawMutex> Default for SignalPool<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A claimed slot; dropping it returns the slot to its pool.
pub struct SignalLease<'p, M: RawMutex> {
    slot: &'p ReadySignal<M>,
    index: usize,
    claimed: &'p Mutex<M, Cell<u8>>,
}

impl<'p, M: RawMutex> SignalLease<'p, M> {
    pub fn signal(&self) -> &'p ReadySignal<M> {
        self.slot
    }
}

impl<M: RawMutex> Drop for SignalLease<'_, M> {
    fn drop(&mut self) {
        self.slot.clear();
        let bit = 1u8 << self.index;
        self.claimed
            .lock(|claimed| claimed.set(claimed.get() & !bit));
    }
}
