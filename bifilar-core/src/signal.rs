//! Interrupt-to-task completion notification
//!
//! A single slot: the interrupt side sets it, the waiting caller takes it.
//! Clearing before each START guarantees a stale completion from an
//! earlier phase is never mistaken for the current one.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::transfer::Completion;

/// Single-slot completion notification
pub struct CompletionSignal<M: RawMutex> {
    inner: Signal<M, Completion>,
}

impl<M: RawMutex> Default for CompletionSignal<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> CompletionSignal<M> {
    /// Create an empty signal
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Clear any pending completion
    pub fn clear(&self) {
        self.inner.reset();
    }

    /// Publish a completion (interrupt side)
    ///
    /// A second notification before the first is taken replaces it.
    pub fn notify(&self, completion: Completion) {
        self.inner.signal(completion);
    }

    /// Wait for and take the next completion
    pub async fn wait(&self) -> Completion {
        self.inner.wait().await
    }

    /// Take a pending completion without waiting
    pub fn try_take(&self) -> Option<Completion> {
        self.inner.try_take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_notify_then_wait() {
        let signal = CompletionSignal::<NoopRawMutex>::new();
        signal.notify(Completion::WriteDone);

        let got = embassy_futures::block_on(signal.wait());
        assert_eq!(got, Completion::WriteDone);
        assert_eq!(signal.try_take(), None);
    }

    #[test]
    fn test_clear_drops_stale_completion() {
        let signal = CompletionSignal::<NoopRawMutex>::new();
        signal.notify(Completion::HoldBus);

        signal.clear();

        assert_eq!(signal.try_take(), None);
    }

    #[test]
    fn test_single_slot_keeps_latest() {
        let signal = CompletionSignal::<NoopRawMutex>::new();
        signal.notify(Completion::HoldBus);
        signal.notify(Completion::Nack);

        assert_eq!(signal.try_take(), Some(Completion::Nack));
        assert_eq!(signal.try_take(), None);
    }
}
