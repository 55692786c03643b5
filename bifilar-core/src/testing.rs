//! Simulated bus for engine tests
//!
//! A peripheral, two DMA channels and a set of register-file slaves
//! sharing one state. START resolves the whole phase immediately and
//! queues the interrupt the hardware would raise; [`service_interrupts`]
//! plays the role of the interrupt trampoline.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use bifilar_hal::{BusEvent, BusPeripheral, DmaBuffer, DmaChannel, DmaDirection, Direction, SclSpeed, Timing};
use embassy_futures::select::{select, Either};
use embassy_futures::{block_on, yield_now};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;

use crate::config::{BusClockConfig, DeviceTiming, EngineConfig};
use crate::engine::TransactionEngine;

pub type SimEngine = TransactionEngine<NoopRawMutex, SimPeripheral, SimDma, SimDma>;

/// What happened on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Start,
    RepeatedStart,
    /// Address byte (address << 1 | R/W)
    Address(u8),
    Data(u8),
    Nack,
    Stop,
}

/// Bus phases, folded out of the wire trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseRecord {
    Start,
    RepeatedStart,
    Write(usize),
    Read(usize),
    Stop,
}

/// How a slave answers its address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveMode {
    Ack,
    Nack,
    /// Holds SCL low forever; no interrupt is ever raised
    Silent,
    /// Acknowledges writes, declines its read address
    NackOnRead,
    /// Acknowledges writes, stalls after its read address
    SilentOnRead,
}

/// Register-file slave with an auto-incrementing pointer
struct SimSlave {
    address: u8,
    registers: Vec<u8>,
    pointer: usize,
    mode: SlaveMode,
}

impl SimSlave {
    fn peek(&self, offset: usize) -> u8 {
        self.registers[(self.pointer + offset) % self.registers.len()]
    }

    fn write(&mut self, byte: u8) {
        let index = self.pointer % self.registers.len();
        self.registers[index] = byte;
        self.pointer = (index + 1) % self.registers.len();
    }
}

#[derive(Default)]
struct SimState {
    slaves: Vec<SimSlave>,
    wire: Vec<Wire>,
    events: VecDeque<BusEvent>,
    timing: Option<Timing>,
    enabled: bool,
    bus_held: bool,
    transfer: Option<(u8, Direction, u8)>,
    tx_data: Vec<u8>,
    tx_enabled: bool,
    rx_enabled: bool,
    resets: u32,
}

impl SimState {
    fn slave(&self, address: u8) -> Option<&SimSlave> {
        self.slaves.iter().find(|s| s.address == address)
    }

    fn start(&mut self) {
        assert!(self.enabled, "START on a disabled peripheral");
        assert!(
            !(self.tx_enabled && self.rx_enabled),
            "both DMA channels enabled"
        );
        let Some((address, direction, nbytes)) = self.transfer else {
            panic!("START without a programmed transfer");
        };
        match direction {
            Direction::Write => assert!(self.tx_enabled, "write phase without Tx DMA"),
            Direction::Read => assert!(self.rx_enabled, "read phase without Rx DMA"),
        }

        self.wire.push(if self.bus_held {
            Wire::RepeatedStart
        } else {
            Wire::Start
        });
        self.bus_held = true;
        self.wire
            .push(Wire::Address((address << 1) | direction.rw_bit()));

        let Some(slave) = self.slaves.iter_mut().find(|s| s.address == address) else {
            self.wire.push(Wire::Nack);
            self.events.push_back(BusEvent::Nack);
            return;
        };

        let mode = match (slave.mode, direction) {
            (SlaveMode::NackOnRead, Direction::Read) => SlaveMode::Nack,
            (SlaveMode::SilentOnRead, Direction::Read) => SlaveMode::Silent,
            (SlaveMode::NackOnRead | SlaveMode::SilentOnRead, Direction::Write) => SlaveMode::Ack,
            (mode, _) => mode,
        };

        match mode {
            SlaveMode::Ack | SlaveMode::NackOnRead | SlaveMode::SilentOnRead => {}
            SlaveMode::Nack => {
                self.wire.push(Wire::Nack);
                self.events.push_back(BusEvent::Nack);
                return;
            }
            SlaveMode::Silent => return,
        }

        match direction {
            Direction::Write => {
                assert_eq!(self.tx_data.len(), nbytes as usize);
                for (i, &byte) in self.tx_data.iter().enumerate() {
                    self.wire.push(Wire::Data(byte));
                    if i == 0 {
                        slave.pointer = byte as usize % slave.registers.len();
                    } else {
                        slave.write(byte);
                    }
                }
            }
            Direction::Read => {
                for i in 0..nbytes as usize {
                    self.wire.push(Wire::Data(slave.peek(i)));
                }
                slave.pointer = (slave.pointer + nbytes as usize) % slave.registers.len();
            }
        }

        self.events.push_back(BusEvent::TransferComplete);
    }

    fn fill_rx(&self, dst: &mut [u8]) {
        let Some((address, Direction::Read, _)) = self.transfer else {
            panic!("Rx DMA loaded without a read phase programmed");
        };
        if let Some(slave) = self.slave(address) {
            for (i, byte) in dst.iter_mut().enumerate() {
                *byte = slave.peek(i);
            }
        }
    }
}

/// Handle to the shared simulation
#[derive(Clone, Default)]
pub struct SimBus(Rc<RefCell<SimState>>);

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a slave whose registers start as `registers`
    pub fn with_slave(self, address: u8, registers: &[u8]) -> Self {
        self.0.borrow_mut().slaves.push(SimSlave {
            address,
            registers: registers.to_vec(),
            pointer: 0,
            mode: SlaveMode::Ack,
        });
        self
    }

    pub fn set_mode(&self, address: u8, mode: SlaveMode) {
        let mut state = self.0.borrow_mut();
        if let Some(slave) = state.slaves.iter_mut().find(|s| s.address == address) {
            slave.mode = mode;
        }
    }

    pub fn registers(&self, address: u8) -> Vec<u8> {
        self.0
            .borrow()
            .slave(address)
            .map(|s| s.registers.clone())
            .unwrap_or_default()
    }

    pub fn wire(&self) -> Vec<Wire> {
        self.0.borrow().wire.clone()
    }

    pub fn phases(&self) -> Vec<PhaseRecord> {
        let mut phases = Vec::new();
        for record in self.wire() {
            match record {
                Wire::Start => phases.push(PhaseRecord::Start),
                Wire::RepeatedStart => phases.push(PhaseRecord::RepeatedStart),
                Wire::Address(byte) if byte & 1 == 1 => phases.push(PhaseRecord::Read(0)),
                Wire::Address(_) => phases.push(PhaseRecord::Write(0)),
                Wire::Data(_) => match phases.last_mut() {
                    Some(PhaseRecord::Write(n) | PhaseRecord::Read(n)) => *n += 1,
                    _ => panic!("data outside a phase"),
                },
                Wire::Nack => {}
                Wire::Stop => phases.push(PhaseRecord::Stop),
            }
        }
        phases
    }

    pub fn clear_wire(&self) {
        self.0.borrow_mut().wire.clear();
    }

    pub fn timing(&self) -> Option<Timing> {
        self.0.borrow().timing
    }

    pub fn is_enabled(&self) -> bool {
        self.0.borrow().enabled
    }

    pub fn is_bus_held(&self) -> bool {
        self.0.borrow().bus_held
    }

    /// Number of enable-bit toggles that reset the controller
    pub fn resets(&self) -> u32 {
        self.0.borrow().resets
    }

    pub fn dma_enabled(&self) -> (bool, bool) {
        let state = self.0.borrow();
        (state.tx_enabled, state.rx_enabled)
    }

    pub fn take_event(&self) -> Option<BusEvent> {
        self.0.borrow_mut().events.pop_front()
    }

    /// Engine on this bus, not yet configured
    pub fn engine(&self, config: EngineConfig) -> SimEngine {
        TransactionEngine::new(
            SimPeripheral(self.clone()),
            SimDma(self.clone(), DmaDirection::Tx),
            SimDma(self.clone(), DmaDirection::Rx),
            config,
        )
    }

    /// Engine configured for 100 kHz from 16 MHz and enabled
    pub fn ready_engine(&self, config: EngineConfig) -> SimEngine {
        let engine = self.engine(config);
        let cfg = BusClockConfig::derive(
            16_000_000,
            SclSpeed::Standard.hz(),
            DeviceTiming::STANDARD_MODE,
        )
        .expect("16 MHz / 100 kHz is feasible");
        engine.configure(cfg).unwrap();
        engine.enable().unwrap();
        engine
    }
}

pub struct SimPeripheral(SimBus);

impl BusPeripheral for SimPeripheral {
    fn apply_timing(&mut self, timing: Timing) {
        let mut state = self.0 .0.borrow_mut();
        assert!(!state.enabled, "timing written while enabled");
        state.timing = Some(timing);
    }

    fn enable(&mut self) {
        self.0 .0.borrow_mut().enabled = true;
    }

    fn disable(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        if state.enabled {
            state.resets += 1;
        }
        state.enabled = false;
        state.bus_held = false;
    }

    fn is_enabled(&self) -> bool {
        self.0 .0.borrow().enabled
    }

    fn set_transfer(&mut self, address: u8, direction: Direction, nbytes: u8) {
        self.0 .0.borrow_mut().transfer = Some((address, direction, nbytes));
    }

    fn start(&mut self) {
        self.0 .0.borrow_mut().start();
    }

    fn stop(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        if state.bus_held {
            state.wire.push(Wire::Stop);
        }
        state.bus_held = false;
    }
}

pub struct SimDma(SimBus, DmaDirection);

impl DmaChannel for SimDma {
    fn load(&mut self, buffer: DmaBuffer<'_>) {
        let mut state = self.0 .0.borrow_mut();
        match buffer {
            DmaBuffer::Tx(src) => {
                assert!(!state.rx_enabled, "Tx armed while Rx running");
                state.tx_data = src.to_vec();
            }
            DmaBuffer::Rx(dst) => {
                assert!(!state.tx_enabled, "Rx armed while Tx running");
                state.fill_rx(dst);
            }
        }
    }

    fn enable(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        match self.1 {
            DmaDirection::Tx => {
                assert!(!state.rx_enabled, "Tx enabled while Rx running");
                state.tx_enabled = true;
            }
            DmaDirection::Rx => {
                assert!(!state.tx_enabled, "Rx enabled while Tx running");
                state.rx_enabled = true;
            }
        }
    }

    fn disable(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        match self.1 {
            DmaDirection::Tx => {
                state.tx_enabled = false;
                state.tx_data.clear();
            }
            DmaDirection::Rx => state.rx_enabled = false,
        }
    }
}

/// Interrupt trampoline: deliver queued events forever
pub async fn service_interrupts(engine: &SimEngine, bus: &SimBus) {
    loop {
        if let Some(event) = bus.take_event() {
            engine.on_bus_event(event);
        }
        yield_now().await;
    }
}

/// Drive `op` to completion with interrupts serviced alongside
pub fn run<F: Future>(engine: &SimEngine, bus: &SimBus, op: F) -> F::Output {
    match block_on(select(op, service_interrupts(engine, bus))) {
        Either::First(output) => output,
        Either::Second(()) => unreachable!("interrupt loop never ends"),
    }
}
