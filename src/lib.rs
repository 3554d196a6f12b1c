#![cfg_attr(not(test), no_std)]

mod fmt;

mod aht21;
mod ens160;
mod transaction;

#[cfg(test)]
mod fake_bus;

pub use aht21::{AHT21Sensor, AHT21Status, AHT21_DEFAULT_ADDRESS, MEASUREMENT_DELAY};
pub use aht21::{humidity_from_raw, raw_humidity, raw_temperature, temperature_from_raw};
pub use ens160::{AirQualityIndex, DeviceStatus, ENS160Sensor, OperatingMode, Validity};
pub use ens160::{ENS160_ALTERNATE_ADDRESS, ENS160_DEFAULT_ADDRESS, ENS160_PART_ID};
pub use ens160::{
    encode_humidity_compensation, encode_temperature_compensation, humidity_from_compensation,
    le_u16, temperature_from_compensation,
};
pub use transaction::{BusConfig, DEFAULT_TIMEOUT};

/// Temperature and relative humidity decoded from one AHT21 frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AHT21Response {
    pub temperature: f32,
    pub humidity: f32,
}

/// Air quality outputs of the ENS160.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ENS160Response {
    /// AQI register masked to its low 3 bits.
    pub aqi: u8,
    /// Total volatile organic compounds in ppb.
    pub tvoc: u16,
    /// Equivalent CO2 in ppm.
    pub eco2: u16,
}

/// A bus transaction failed: missing ACK, bus fault or timeout.
///
/// The underlying HAL error is not carried; distinguishing its causes is left
/// to the bus driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusError;

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("I2C bus transaction failed")
    }
}

impl core::error::Error for BusError {}
