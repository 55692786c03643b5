//! `embedded-hal-async` bus implementation
//!
//! Lets stock device drivers run on the engine. The controller holds the
//! bus across exactly one direction change, so only the operation lists a
//! single transaction can express are accepted.

use bifilar_hal::{BusPeripheral, DmaChannel};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

use super::TransactionEngine;
use crate::error::BusError;

impl<M, P, T, R> ErrorType for &TransactionEngine<M, P, T, R>
where
    M: RawMutex,
    P: BusPeripheral,
    T: DmaChannel,
    R: DmaChannel,
{
    type Error = BusError;
}

impl<M, P, T, R> I2c<SevenBitAddress> for &TransactionEngine<M, P, T, R>
where
    M: RawMutex,
    P: BusPeripheral,
    T: DmaChannel,
    R: DmaChannel,
{
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), BusError> {
        TransactionEngine::receive(*self, address, read).await
    }

    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), BusError> {
        TransactionEngine::transmit(*self, address, write).await
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), BusError> {
        TransactionEngine::write_read(*self, address, write, read).await
    }

    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), BusError> {
        match operations {
            [] => Ok(()),
            [Operation::Write(write)] => TransactionEngine::transmit(*self, address, write).await,
            [Operation::Read(read)] => TransactionEngine::receive(*self, address, read).await,
            [Operation::Write(write), Operation::Read(read)] => {
                TransactionEngine::write_read(*self, address, write, read).await
            }
            _ => {
                warn!("Unsupported operation list of {} entries", operations.len());
                Err(BusError::UnsupportedSequence)
            }
        }
    }
}
