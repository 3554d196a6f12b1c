use embassy_time::{Duration, Timer};
use embedded_hal_async::i2c::I2c;

use crate::transaction::BusConfig;
use crate::{AHT21Response, BusError};

pub const AHT21_DEFAULT_ADDRESS: u8 = 0x38;

/// Conversion time the chip needs after a measurement was triggered.
pub const MEASUREMENT_DELAY: Duration = Duration::from_millis(80);

const CALIBRATE_CMD: [u8; 3] = [0xE1, 0x08, 0x00];
const NORMAL_CMD: [u8; 3] = [0xA8, 0x00, 0x00];
const MEASURE_CMD: [u8; 3] = [0xAC, 0x33, 0x00];
const RESET_CMD: u8 = 0xBA;

const STATUS_BUSY: u8 = 0x80;
const STATUS_CALIBRATED: u8 = 0x08;

// 2^20, full scale of both 20-bit codes
const FULL_SCALE: f32 = 1_048_576.0;

/// AHT21 humidity and temperature sensor.
///
/// The chip has no register map: commands are plain writes and every read
/// streams the 6-byte frame `status, hum[19:12], hum[11:4], hum[3:0]|temp[19:16],
/// temp[15:8], temp[7:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AHT21Sensor {
    config: BusConfig,
}

impl Default for AHT21Sensor {
    fn default() -> Self {
        Self::new(AHT21_DEFAULT_ADDRESS)
    }
}

impl AHT21Sensor {
    pub const fn new(address: u8) -> Self {
        Self::with_config(BusConfig::new(address))
    }

    pub const fn with_config(config: BusConfig) -> Self {
        Self { config }
    }

    /// Takes effect on the next transaction.
    pub fn set_address(&mut self, address: u8) {
        self.config.address = address;
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Starts a conversion. Wait [`MEASUREMENT_DELAY`] before reading.
    pub async fn trigger_measurement<T: I2c>(&self, i2c: &mut T) -> Result<(), BusError> {
        self.config.write(i2c, &MEASURE_CMD).await
    }

    pub async fn calibrate<T: I2c>(&self, i2c: &mut T) -> Result<(), BusError> {
        self.config.write(i2c, &CALIBRATE_CMD).await
    }

    pub async fn enter_normal_mode<T: I2c>(&self, i2c: &mut T) -> Result<(), BusError> {
        self.config.write(i2c, &NORMAL_CMD).await
    }

    pub async fn reset<T: I2c>(&self, i2c: &mut T) -> Result<(), BusError> {
        self.config.write(i2c, &[RESET_CMD]).await
    }

    /// Reads a fresh frame and decodes its temperature in °C.
    ///
    /// Two consecutive reads return the same sample unless a measurement was
    /// triggered in between; use [`Self::read_measurement`] to get both values
    /// of one sample.
    pub async fn read_temperature<T: I2c>(&self, i2c: &mut T) -> Result<f32, BusError> {
        let frame = self.read_frame(i2c).await?;
        let temperature = temperature_from_raw(raw_temperature(&frame));
        debug!("AHT21 temperature: {}°C", temperature);
        Ok(temperature)
    }

    /// Reads a fresh frame and decodes its relative humidity in %.
    pub async fn read_humidity<T: I2c>(&self, i2c: &mut T) -> Result<f32, BusError> {
        let frame = self.read_frame(i2c).await?;
        let humidity = humidity_from_raw(raw_humidity(&frame));
        debug!("AHT21 humidity: {}%", humidity);
        Ok(humidity)
    }

    /// Decodes temperature and humidity from one frame.
    pub async fn read_measurement<T: I2c>(&self, i2c: &mut T) -> Result<AHT21Response, BusError> {
        let frame = self.read_frame(i2c).await?;
        let response = AHT21Response {
            temperature: temperature_from_raw(raw_temperature(&frame)),
            humidity: humidity_from_raw(raw_humidity(&frame)),
        };
        debug!(
            "AHT21 temperature: {}°C, humidity: {}%",
            response.temperature,
            response.humidity
        );
        Ok(response)
    }

    pub async fn read_status<T: I2c>(&self, i2c: &mut T) -> Result<AHT21Status, BusError> {
        let status: [u8; 1] = self.config.read(i2c).await?;
        Ok(AHT21Status(status[0]))
    }

    /// Triggers a conversion, waits for it and reads the result.
    ///
    /// The busy flag is not polled.
    pub async fn measure<T: I2c>(&self, i2c: &mut T) -> Result<AHT21Response, BusError> {
        self.trigger_measurement(i2c).await?;
        Timer::after(MEASUREMENT_DELAY).await;
        self.read_measurement(i2c).await
    }

    async fn read_frame<T: I2c>(&self, i2c: &mut T) -> Result<[u8; 6], BusError> {
        self.config.read(i2c).await
    }
}

/// Status byte, first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AHT21Status(u8);

impl AHT21Status {
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// A conversion is still running.
    pub fn is_busy(&self) -> bool {
        self.0 & STATUS_BUSY != 0
    }

    pub fn is_calibrated(&self) -> bool {
        self.0 & STATUS_CALIBRATED != 0
    }
}

/// 20-bit temperature code: low nibble of byte 3, bytes 4 and 5.
pub fn raw_temperature(frame: &[u8; 6]) -> u32 {
    ((frame[3] as u32 & 0x0F) << 16) | ((frame[4] as u32) << 8) | frame[5] as u32
}

/// 20-bit humidity code: bytes 1 and 2, high nibble of byte 3.
pub fn raw_humidity(frame: &[u8; 6]) -> u32 {
    (((frame[1] as u32) << 16) | ((frame[2] as u32) << 8) | frame[3] as u32) >> 4
}

/// `raw * 200 / 2^20 - 50`, in °C.
pub fn temperature_from_raw(raw: u32) -> f32 {
    raw as f32 * 200.0 / FULL_SCALE - 50.0
}

/// `raw * 100 / 2^20`, in %RH.
pub fn humidity_from_raw(raw: u32) -> f32 {
    raw as f32 * 100.0 / FULL_SCALE
}
