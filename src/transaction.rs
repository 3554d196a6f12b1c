//! Bus transactions shared by both drivers.
//!
//! Two shapes are used:
//!
//! - addressless (AHT21): a plain write of N bytes, or a plain read of N bytes
//!   that returns whatever the chip streams out;
//! - register-addressed (ENS160): the register byte is written first, then the
//!   payload follows in the same write, or the direction is switched with a
//!   repeated start so no other master can get in between selection and read.
//!
//! Start/stop placement and the NACK on the final read byte are delegated to
//! the [`I2c`] implementation, whose contract matches the framing above.

use embassy_time::{Duration, with_timeout};
use embedded_hal_async::i2c::{I2c, Operation};

use crate::BusError;

/// Transaction timeout used unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Slave address and timeout applied to every transaction of one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// 7-bit slave address.
    pub address: u8,
    pub timeout: Duration,
}

impl BusConfig {
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Start, address + W, `bytes`, stop.
    pub async fn write<T: I2c>(&self, i2c: &mut T, bytes: &[u8]) -> Result<(), BusError> {
        trace!("i2c write {=u8:#x}: {=[u8]:#x}", self.address, bytes);
        self.submit(i2c.write(self.address, bytes)).await
    }

    /// Start, address + R, N bytes (NACK on the last), stop.
    ///
    /// A zero-length read never touches the bus.
    pub async fn read<T: I2c, const N: usize>(&self, i2c: &mut T) -> Result<[u8; N], BusError> {
        let mut buf = [0u8; N];
        if N == 0 {
            return Ok(buf);
        }
        trace!("i2c read {=u8:#x}: {=usize} bytes", self.address, N);
        self.submit(i2c.read(self.address, &mut buf)).await?;
        Ok(buf)
    }

    /// Start, address + W, `register`, `bytes`, stop.
    pub async fn write_register<T: I2c>(
        &self,
        i2c: &mut T,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), BusError> {
        trace!(
            "i2c write {=u8:#x} reg {=u8:#x}: {=[u8]:#x}",
            self.address,
            register,
            bytes
        );
        let register = [register];
        let mut operations = [Operation::Write(&register), Operation::Write(bytes)];
        self.submit(i2c.transaction(self.address, &mut operations))
            .await
    }

    /// Start, address + W, `register`, repeated start, address + R, N bytes
    /// (NACK on the last), stop.
    ///
    /// A zero-length read never touches the bus.
    pub async fn read_register<T: I2c, const N: usize>(
        &self,
        i2c: &mut T,
        register: u8,
    ) -> Result<[u8; N], BusError> {
        let mut buf = [0u8; N];
        if N == 0 {
            return Ok(buf);
        }
        trace!(
            "i2c read {=u8:#x} reg {=u8:#x}: {=usize} bytes",
            self.address,
            register,
            N
        );
        self.submit(i2c.write_read(self.address, &[register], &mut buf))
            .await?;
        Ok(buf)
    }

    async fn submit<E>(
        &self,
        transaction: impl Future<Output = Result<(), E>>,
    ) -> Result<(), BusError> {
        match with_timeout(self.timeout, transaction).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => {
                warn!("i2c transaction with {=u8:#x} failed", self.address);
                Err(BusError)
            }
            Err(_) => {
                warn!(
                    "i2c transaction with {=u8:#x} timed out after {=u64} ms",
                    self.address,
                    self.timeout.as_millis()
                );
                Err(BusError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::fake_bus::{FakeBus, Op};

    #[test]
    fn write_is_a_single_transaction() {
        let mut bus = FakeBus::new();
        let config = BusConfig::new(0x38);

        block_on(config.write(&mut bus, &[0xAC, 0x33, 0x00])).unwrap();

        assert_eq!(bus.transactions.len(), 1);
        assert_eq!(bus.transactions[0].address, 0x38);
        assert_eq!(bus.transactions[0].ops, vec![Op::Write(vec![0xAC, 0x33, 0x00])]);
    }

    #[test]
    fn read_returns_streamed_bytes() {
        let mut bus = FakeBus::with_response(&[1, 2, 3, 4, 5, 6]);
        let config = BusConfig::new(0x38);

        let frame: [u8; 6] = block_on(config.read(&mut bus)).unwrap();

        assert_eq!(frame, [1, 2, 3, 4, 5, 6]);
        assert_eq!(bus.transactions[0].ops, vec![Op::Read(6)]);
    }

    #[test]
    fn zero_length_read_skips_the_bus() {
        for address in [0x00, 0x38, 0x53, 0x7F] {
            let mut bus = FakeBus::failing();
            let config = BusConfig::new(address);

            let empty: [u8; 0] = block_on(config.read(&mut bus)).unwrap();
            assert!(empty.is_empty());
            let empty: [u8; 0] = block_on(config.read_register(&mut bus, 0x20)).unwrap();
            assert!(empty.is_empty());
            assert!(bus.transactions.is_empty());
        }
    }

    #[test]
    fn register_read_uses_repeated_start() {
        let mut bus = FakeBus::with_response(&[0x34, 0x12]);
        let config = BusConfig::new(0x53);

        let data: [u8; 2] = block_on(config.read_register(&mut bus, 0x24)).unwrap();

        assert_eq!(data, [0x34, 0x12]);
        // write and read within one transaction means no stop in between
        assert_eq!(bus.transactions.len(), 1);
        assert_eq!(
            bus.transactions[0].ops,
            vec![Op::Write(vec![0x24]), Op::Read(2)]
        );
    }

    #[test]
    fn register_write_sends_register_then_payload() {
        let mut bus = FakeBus::new();
        let config = BusConfig::new(0x53);

        block_on(config.write_register(&mut bus, 0x13, &[0x06, 0x40])).unwrap();

        assert_eq!(bus.transactions.len(), 1);
        assert_eq!(
            bus.transactions[0].ops,
            vec![Op::Write(vec![0x13]), Op::Write(vec![0x06, 0x40])]
        );
    }

    #[test]
    fn bus_failure_is_reported_once() {
        let mut bus = FakeBus::failing();
        let config = BusConfig::new(0x53);

        assert_eq!(block_on(config.write(&mut bus, &[0x00])), Err(BusError));
        let result: Result<[u8; 2], _> = block_on(config.read_register(&mut bus, 0x22));
        assert_eq!(result, Err(BusError));
        // no retries
        assert_eq!(bus.transactions.len(), 2);
    }

    #[test]
    fn hung_bus_times_out() {
        let mut bus = FakeBus::hanging();
        let config = BusConfig::new(0x38).with_timeout(Duration::from_millis(10));

        let result: Result<[u8; 6], _> = block_on(config.read(&mut bus));

        assert_eq!(result, Err(BusError));
    }

    #[test]
    fn default_timeout_is_one_second() {
        let config = BusConfig::new(0x38);
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.with_timeout(Duration::from_millis(50)).address, 0x38);
    }
}
