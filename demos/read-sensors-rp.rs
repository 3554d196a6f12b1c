#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_air_sensors::{AHT21Sensor, AirQualityIndex, ENS160Sensor, OperatingMode};
use embassy_executor::Spawner;
use embassy_rp::peripherals::I2C0;
use embassy_rp::{bind_interrupts, i2c};
use embassy_time::{Duration, Timer};
use panic_probe as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    let sda = p.PIN_0;
    let scl = p.PIN_1;

    // Configure I2C
    let mut i2c = i2c::I2c::new_async(p.I2C0, scl, sda, Irqs, Default::default());

    // Both chips sit on the same bus, each driver only keeps its address
    let aht21 = AHT21Sensor::default();
    let ens160 = ENS160Sensor::default();

    if let Err(e) = aht21.calibrate(&mut i2c).await {
        error!("AHT21 calibration failed: {}", e);
    }
    if let Err(e) = ens160.set_mode(&mut i2c, OperatingMode::Standard).await {
        error!("ENS160 mode change failed: {}", e);
    }

    loop {
        match aht21.measure(&mut i2c).await {
            Ok(data) => {
                info!(
                    "Temperature: {}°C, Humidity: {}%",
                    data.temperature, data.humidity
                );
                let compensated = match ens160
                    .set_temperature_compensation(&mut i2c, data.temperature)
                    .await
                {
                    Ok(()) => ens160
                        .set_humidity_compensation(&mut i2c, data.humidity)
                        .await,
                    Err(e) => Err(e),
                };
                if compensated.is_err() {
                    warn!("ENS160 compensation not updated");
                }
            }
            Err(_) => error!("AHT21 communication error"),
        }

        match ens160.read(&mut i2c).await {
            Ok(data) => match AirQualityIndex::from_raw(data.aqi) {
                Some(aqi) => info!(
                    "AQI: {}, TVOC: {} ppb, eCO2: {} ppm",
                    aqi, data.tvoc, data.eco2
                ),
                None => warn!("ENS160 not ready, AQI {}", data.aqi),
            },
            Err(_) => error!("ENS160 communication error"),
        }

        Timer::after(Duration::from_secs(5)).await;
    }
}
