use embedded_hal_async::i2c::I2c;

use crate::transaction::BusConfig;
use crate::{BusError, ENS160Response};

pub const ENS160_DEFAULT_ADDRESS: u8 = 0x53;
/// Address with the ADDR pin pulled low.
pub const ENS160_ALTERNATE_ADDRESS: u8 = 0x52;
/// Content of the part id register.
pub const ENS160_PART_ID: u16 = 0x0160;

const REG_PART_ID: u8 = 0x00;
const REG_OPMODE: u8 = 0x10;
const REG_TEMP_IN: u8 = 0x13;
const REG_RH_IN: u8 = 0x15;
const REG_DEVICE_STATUS: u8 = 0x20;
const REG_DATA_AQI: u8 = 0x21;
const REG_DATA_TVOC: u8 = 0x22;
const REG_DATA_ECO2: u8 = 0x24;

const AQI_MASK: u8 = 0x07;
const RH_IN_MAX: i32 = (127 << 9) | 511;

/// ENS160 digital metal-oxide gas sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ENS160Sensor {
    config: BusConfig,
}

impl Default for ENS160Sensor {
    fn default() -> Self {
        Self::new(ENS160_DEFAULT_ADDRESS)
    }
}

impl ENS160Sensor {
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

    pub async fn set_mode<T: I2c>(&self, i2c: &mut T, mode: OperatingMode) -> Result<(), BusError> {
        self.config
            .write_register(i2c, REG_OPMODE, &[mode.into()])
            .await
    }

    /// Raw content of the operating mode register.
    pub async fn get_mode<T: I2c>(&self, i2c: &mut T) -> Result<u8, BusError> {
        let data: [u8; 1] = self.config.read_register(i2c, REG_OPMODE).await?;
        Ok(data[0])
    }

    pub async fn get_status<T: I2c>(&self, i2c: &mut T) -> Result<DeviceStatus, BusError> {
        let data: [u8; 1] = self.config.read_register(i2c, REG_DEVICE_STATUS).await?;
        Ok(DeviceStatus(data[0]))
    }

    pub async fn get_part_id<T: I2c>(&self, i2c: &mut T) -> Result<u16, BusError> {
        let data = self.config.read_register(i2c, REG_PART_ID).await?;
        Ok(le_u16(data))
    }

    /// Equivalent CO2 in ppm.
    pub async fn get_eco2<T: I2c>(&self, i2c: &mut T) -> Result<u16, BusError> {
        let data = self.config.read_register(i2c, REG_DATA_ECO2).await?;
        let eco2 = le_u16(data);
        debug!("ENS160 eCO2: {=u16} ppm", eco2);
        Ok(eco2)
    }

    /// Total volatile organic compounds in ppb.
    pub async fn get_tvoc<T: I2c>(&self, i2c: &mut T) -> Result<u16, BusError> {
        let data = self.config.read_register(i2c, REG_DATA_TVOC).await?;
        let tvoc = le_u16(data);
        debug!("ENS160 TVOC: {=u16} ppb", tvoc);
        Ok(tvoc)
    }

    /// AQI register masked to its low 3 bits.
    ///
    /// Only 1..=5 are valid classes, see [`AirQualityIndex::from_raw`].
    pub async fn get_aqi<T: I2c>(&self, i2c: &mut T) -> Result<u8, BusError> {
        let data: [u8; 1] = self.config.read_register(i2c, REG_DATA_AQI).await?;
        let aqi = data[0] & AQI_MASK;
        debug!("ENS160 AQI: {=u8}", aqi);
        Ok(aqi)
    }

    /// Ambient temperature used by the chip for compensation.
    pub async fn set_temperature_compensation<T: I2c>(
        &self,
        i2c: &mut T,
        celsius: f32,
    ) -> Result<(), BusError> {
        self.config
            .write_register(i2c, REG_TEMP_IN, &encode_temperature_compensation(celsius))
            .await
    }

    /// Ambient relative humidity used by the chip for compensation.
    pub async fn set_humidity_compensation<T: I2c>(
        &self,
        i2c: &mut T,
        percent: f32,
    ) -> Result<(), BusError> {
        self.config
            .write_register(i2c, REG_RH_IN, &encode_humidity_compensation(percent))
            .await
    }

    /// Reads AQI, TVOC and eCO2 one after another.
    pub async fn read<T: I2c>(&self, i2c: &mut T) -> Result<ENS160Response, BusError> {
        Ok(ENS160Response {
            aqi: self.get_aqi(i2c).await?,
            tvoc: self.get_tvoc(i2c).await?,
            eco2: self.get_eco2(i2c).await?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingMode {
    DeepSleep = 0x00,
    Idle = 0x01,
    Standard = 0x02,
    Reset = 0xF0,
}

impl OperatingMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Self::DeepSleep),
            0x01 => Some(Self::Idle),
            0x02 => Some(Self::Standard),
            0xF0 => Some(Self::Reset),
            _ => None,
        }
    }
}

impl From<OperatingMode> for u8 {
    fn from(mode: OperatingMode) -> Self {
        mode as u8
    }
}

/// Content of the device status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus(u8);

impl DeviceStatus {
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// An operating mode is running.
    pub fn is_running(&self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn has_error(&self) -> bool {
        self.0 & 0x40 != 0
    }

    pub fn validity(&self) -> Validity {
        match (self.0 >> 2) & 0x03 {
            0 => Validity::Normal,
            1 => Validity::WarmUp,
            2 => Validity::InitialStartUp,
            _ => Validity::Invalid,
        }
    }

    /// New data in the data registers.
    pub fn new_data(&self) -> bool {
        self.0 & 0x02 != 0
    }

    /// New data in the general purpose read registers.
    pub fn new_gpr(&self) -> bool {
        self.0 & 0x01 != 0
    }
}

impl From<u8> for DeviceStatus {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validity {
    Normal,
    WarmUp,
    InitialStartUp,
    Invalid,
}

/// UBA air quality index classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AirQualityIndex {
    Excellent = 1,
    Good = 2,
    Moderate = 3,
    Poor = 4,
    Unhealthy = 5,
}

impl AirQualityIndex {
    /// `None` for the reserved values 0, 6 and 7 (and anything wider).
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Excellent),
            2 => Some(Self::Good),
            3 => Some(Self::Moderate),
            4 => Some(Self::Poor),
            5 => Some(Self::Unhealthy),
            _ => None,
        }
    }
}

/// °C as signed fixed point with 6 fractional bits, big-endian.
///
/// Truncates toward zero and saturates to the `i16` range.
pub fn encode_temperature_compensation(celsius: f32) -> [u8; 2] {
    ((celsius * 64.0) as i16).to_be_bytes()
}

/// %RH as fixed point with 9 fractional bits, big-endian.
///
/// Truncates toward zero and saturates at `(127 << 9) | 511` (127.998 %).
/// Negative input is not clamped and goes out as two's complement.
pub fn encode_humidity_compensation(percent: f32) -> [u8; 2] {
    let scaled = ((percent * 512.0) as i32).min(RH_IN_MAX);
    (scaled as u16).to_be_bytes()
}

pub fn temperature_from_compensation(raw: i16) -> f32 {
    raw as f32 / 64.0
}

pub fn humidity_from_compensation(raw: u16) -> f32 {
    raw as f32 / 512.0
}

/// `bytes[1] << 8 | bytes[0]`
pub fn le_u16(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}
