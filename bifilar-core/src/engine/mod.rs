//! Transaction engine
//!
//! Sequences START / address / data / STOP for one physical bus. Callers
//! are serialized on an async mutex; the single suspension point is the
//! wait for the completion signal, bounded by the configured deadline.
//!
//! # Interrupt wiring
//!
//! The platform's bus interrupt trampoline reads the status flags, clears
//! them, and reports the outcome:
//!
//! ```ignore
//! fn i2c_event_irq() {
//!     if nack_flag_set() {
//!         ENGINE.on_nack();
//!     } else if transfer_complete_flag_set() {
//!         ENGINE.on_transfer_complete();
//!     }
//! }
//! ```
//!
//! The completion handler evaluates the restart/direction decision in
//! interrupt context; the waiting caller then issues STOP and disables
//! DMA on the hardware it owns.

mod i2c;

use core::cell::RefCell;

use bifilar_hal::{BusEvent, BusPeripheral, DmaBuffer, DmaChannel, Direction};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::with_timeout;

use crate::address::Address;
use crate::config::{BusClockConfig, EngineConfig};
use crate::configurator::BusConfigurator;
use crate::dma::{DmaChannelBinding, MAX_TRANSFER_LEN};
use crate::error::{ArmError, BusError, ConfigError};
use crate::signal::CompletionSignal;
use crate::transfer::{Completion, TransferState};

/// Hardware owned by whichever caller holds the engine lock
struct Hardware<P, T, R> {
    peripheral: P,
    configurator: BusConfigurator,
    tx: DmaChannelBinding<T>,
    rx: DmaChannelBinding<R>,
}

/// Bus master transaction engine
///
/// Exactly one per physical bus. Shared between tasks by reference and
/// with the interrupt trampoline through [`on_transfer_complete`] and
/// [`on_nack`].
///
/// [`on_transfer_complete`]: Self::on_transfer_complete
/// [`on_nack`]: Self::on_nack
pub struct TransactionEngine<M: RawMutex, P, T, R> {
    hardware: Mutex<M, Hardware<P, T, R>>,
    state: BlockingMutex<M, RefCell<TransferState>>,
    completion: CompletionSignal<M>,
    config: EngineConfig,
}

impl<M, P, T, R> TransactionEngine<M, P, T, R>
where
    M: RawMutex,
    P: BusPeripheral,
    T: DmaChannel,
    R: DmaChannel,
{
    /// Create an engine around a peripheral and its two DMA channels
    ///
    /// # Arguments
    /// * `peripheral` - Bus controller
    /// * `tx` - Channel bound to the transmit data register
    /// * `rx` - Channel bound to the receive data register
    /// * `config` - Engine settings
    pub fn new(peripheral: P, tx: T, rx: R, config: EngineConfig) -> Self {
        Self {
            hardware: Mutex::new(Hardware {
                peripheral,
                configurator: BusConfigurator::new(),
                tx: DmaChannelBinding::tx(tx),
                rx: DmaChannelBinding::rx(rx),
            }),
            state: BlockingMutex::new(RefCell::new(TransferState::new())),
            completion: CompletionSignal::new(),
            config,
        }
    }

    /// Apply bus timing (one-shot)
    ///
    /// Rejected with [`ConfigError::Busy`] while a transaction is in flight.
    pub fn configure(&self, cfg: BusClockConfig) -> Result<(), ConfigError> {
        let mut guard = self.hardware.try_lock().map_err(|_| ConfigError::Busy)?;
        let hw = &mut *guard;
        hw.configurator.configure(&mut hw.peripheral, cfg)
    }

    /// Enable the peripheral after [`configure`](Self::configure)
    pub fn enable(&self) -> Result<(), ConfigError> {
        let mut guard = self.hardware.try_lock().map_err(|_| ConfigError::Busy)?;
        let hw = &mut *guard;
        hw.configurator.enable(&mut hw.peripheral)
    }

    /// Write `payload` to a slave: `START, addr+W, payload, STOP`
    pub async fn transmit(&self, address: u8, payload: &[u8]) -> Result<(), BusError> {
        self.execute(address, Some(payload), None).await
    }

    /// Read `out.len()` bytes starting at register `pointer`
    ///
    /// `START, addr+W, pointer, repeated START, addr+R, out, STOP`
    pub async fn read(&self, address: u8, pointer: u8, out: &mut [u8]) -> Result<(), BusError> {
        self.write_read(address, &[pointer], out).await
    }

    /// Read a single register
    pub async fn read_register(&self, address: u8, pointer: u8) -> Result<u8, BusError> {
        let mut value = [0u8; 1];
        self.read(address, pointer, &mut value).await?;
        Ok(value[0])
    }

    /// Write a command of any length, then read under a repeated START
    pub async fn write_read(
        &self,
        address: u8,
        command: &[u8],
        out: &mut [u8],
    ) -> Result<(), BusError> {
        self.execute(address, Some(command), Some(out)).await
    }

    /// Read without a command phase: `START, addr+R, out, STOP`
    pub async fn receive(&self, address: u8, out: &mut [u8]) -> Result<(), BusError> {
        self.execute(address, None, Some(out)).await
    }

    /// Interrupt entry: programmed byte count reached
    pub fn on_transfer_complete(&self) {
        self.on_bus_event(BusEvent::TransferComplete);
    }

    /// Interrupt entry: slave did not acknowledge
    pub fn on_nack(&self) {
        self.on_bus_event(BusEvent::Nack);
    }

    /// Interrupt entry: evaluate the completion decision and wake the caller
    pub fn on_bus_event(&self, event: BusEvent) {
        match self.state.lock(|s| s.borrow_mut().complete(event)) {
            Some(completion) => self.completion.notify(completion),
            None => warn!("Ignoring {} with no transfer in flight", event),
        }
    }

    /// Snapshot of the transfer state
    pub fn state(&self) -> TransferState {
        self.state.lock(|s| *s.borrow())
    }

    /// Engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn execute(
        &self,
        address: u8,
        command: Option<&[u8]>,
        response: Option<&mut [u8]>,
    ) -> Result<(), BusError> {
        let address = Address::new(address)?;
        if command.is_none() && response.is_none() {
            return Err(BusError::UnsupportedSequence);
        }

        // Reject bad lengths before anything reaches the wire
        let command_len = command.map(|c| phase_len(c.len())).transpose()?;
        let response_len = response
            .as_ref()
            .map(|r| phase_len(r.len()))
            .transpose()?;

        let mut guard = BusGuard {
            engine: self,
            hardware: self.hardware.lock().await,
            armed: false,
        };
        guard.hardware.configurator.ensure_ready()?;

        debug!(
            "Transaction to {=u8:#x}: write {} read {}",
            address.get(),
            command_len,
            response_len
        );

        // From here on, dropping the future releases the bus
        guard.armed = true;
        let result = self.run(&mut guard.hardware, address, command, response).await;
        if let Err(e) = result {
            self.abort(&mut guard.hardware, e);
        }
        guard.armed = false;
        result
    }

    async fn run(
        &self,
        hw: &mut Hardware<P, T, R>,
        address: Address,
        command: Option<&[u8]>,
        response: Option<&mut [u8]>,
    ) -> Result<(), BusError> {
        if let Some(command) = command {
            let hold_bus = response.is_some();
            let nbytes = phase_len(command.len())?;

            hw.peripheral
                .set_transfer(address.get(), Direction::Write, nbytes);
            hw.tx.arm(DmaBuffer::Tx(command))?;
            hw.tx.enable();
            self.update(|s| s.begin_write(hold_bus))?;
            self.completion.clear();

            trace!("START write {} bytes (hold={})", nbytes, hold_bus);
            hw.peripheral.start();

            let expected = if hold_bus {
                Completion::HoldBus
            } else {
                Completion::WriteDone
            };
            let completion = self.wait_completion().await?;
            expect(completion, expected)?;

            if completion.issues_stop() {
                hw.peripheral.stop();
                hw.tx.disable();
                self.finish();
                return Ok(());
            }

            // Bus stays ours; swap channels for the read phase
            hw.tx.disable();
        }

        let Some(out) = response else {
            return Err(BusError::Sequence);
        };
        let nbytes = phase_len(out.len())?;

        hw.peripheral
            .set_transfer(address.get(), Direction::Read, nbytes);
        hw.rx.arm(DmaBuffer::Rx(out))?;
        hw.rx.enable();
        self.update(|s| s.begin_read())?;
        self.completion.clear();

        trace!("START read {} bytes", nbytes);
        hw.peripheral.start();

        let completion = self.wait_completion().await?;
        expect(completion, Completion::ReadDone)?;

        hw.peripheral.stop();
        hw.rx.disable();
        self.finish();
        Ok(())
    }

    async fn wait_completion(&self) -> Result<Completion, BusError> {
        match with_timeout(self.config.timeout, self.completion.wait()).await {
            Ok(completion) => {
                self.update(|s| {
                    s.acknowledge();
                    Ok(())
                })?;
                Ok(completion)
            }
            Err(_) => Err(BusError::Timeout),
        }
    }

    /// Release the bus after a failed transaction
    ///
    /// A timeout additionally runs the bus-reset sequence before the
    /// error is returned.
    fn abort(&self, hw: &mut Hardware<P, T, R>, error: BusError) {
        match error {
            BusError::Timeout => error!("Transfer timed out in {}", self.state().phase()),
            BusError::Nack => warn!("Slave NACK"),
            _ => debug!("Transaction aborted: {}", error),
        }

        self.release(hw);
        if error == BusError::Timeout {
            hw.configurator.recover(&mut hw.peripheral);
        }
    }

    /// STOP if a START went out, disarm both channels, back to idle
    fn release(&self, hw: &mut Hardware<P, T, R>) {
        let bus_active = self.state.lock(|s| !s.borrow().is_idle());
        if bus_active {
            hw.peripheral.stop();
        }
        hw.tx.disable();
        hw.rx.disable();

        if let Some(stale) = self.completion.try_take() {
            debug!("Dropping unobserved {}", stale);
        }
        self.finish();
    }

    fn finish(&self) {
        self.state.lock(|s| s.borrow_mut().finish());
    }

    fn update(
        &self,
        f: impl FnOnce(&mut TransferState) -> Result<(), BusError>,
    ) -> Result<(), BusError> {
        self.state.lock(|s| f(&mut s.borrow_mut()))
    }
}

/// Releases the bus if a transaction is dropped mid-flight
///
/// Armed while a transaction owns the hardware; a caller cancelling the
/// future (an outer timeout, `select`, task abort) must not leave DMA
/// pointed at its freed buffer.
struct BusGuard<'a, M: RawMutex, P, T, R>
where
    P: BusPeripheral,
    T: DmaChannel,
    R: DmaChannel,
{
    engine: &'a TransactionEngine<M, P, T, R>,
    hardware: MutexGuard<'a, M, Hardware<P, T, R>>,
    armed: bool,
}

impl<M, P, T, R> Drop for BusGuard<'_, M, P, T, R>
where
    M: RawMutex,
    P: BusPeripheral,
    T: DmaChannel,
    R: DmaChannel,
{
    fn drop(&mut self) {
        if self.armed {
            warn!("Transaction cancelled, releasing bus");
            self.engine.release(&mut self.hardware);
        }
    }
}

/// Map a completion onto the one the phase in flight expects
fn expect(completion: Completion, expected: Completion) -> Result<(), BusError> {
    match completion {
        Completion::Nack => Err(BusError::Nack),
        c if c == expected => Ok(()),
        _ => Err(BusError::Sequence),
    }
}

/// Programmed byte count for a phase of `len` bytes
fn phase_len(len: usize) -> Result<u8, ArmError> {
    if len == 0 {
        return Err(ArmError::EmptyTransfer);
    }
    if len > MAX_TRANSFER_LEN {
        return Err(ArmError::TooLong);
    }
    Ok(len as u8)
}
