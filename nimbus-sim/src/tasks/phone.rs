//! Simulated phone
//!
//! Acks every push from the watch. When a push carries a forecast
//! request, waits `latency_ms` and pushes the next forecast from a fixed
//! script. The script repeats some forecasts so the watch sees replies
//! that change nothing.

use embassy_time::Timer;
use log::*;
use nimbus_protocol::{
    AppMessage, DictionaryReader, DictionaryWriter, FrameParser, Tuple, WeatherKey,
};

use crate::channels::{PHONE_TO_WATCH, WATCH_TO_PHONE};
use crate::config::PhoneConfig;

/// Icon code and temperature text
struct Forecast {
    icon: u8,
    temperature: &'static str,
}

static FORECASTS: [Forecast; 6] = [
    Forecast { icon: 2, temperature: "12°C" },
    Forecast { icon: 2, temperature: "12°C" },
    Forecast { icon: 1, temperature: "13°C" },
    Forecast { icon: 0, temperature: "17°C" },
    Forecast { icon: 3, temperature: "-2°C" },
    Forecast { icon: 3, temperature: "-4°C" },
];

/// Phone task - answers the watch over the link pipes
#[embassy_executor::task]
pub async fn phone_task(config: PhoneConfig) {
    info!("Phone task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; 64];
    let mut forecasts = FORECASTS.iter().cycle();
    let mut next_txid: u8 = 0;

    loop {
        let n = WATCH_TO_PHONE.read(&mut buf).await;

        for &byte in &buf[..n] {
            let frame = match parser.feed(byte) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Phone: frame error {:?}", e);
                    continue;
                }
            };

            match AppMessage::from_frame(&frame) {
                Ok(AppMessage::Push { txid, dictionary }) => {
                    send(AppMessage::Ack { txid }).await;
                    if !is_forecast_request(dictionary) {
                        debug!("Phone: push {} is not a forecast request", txid);
                        continue;
                    }

                    Timer::after_millis(config.latency_ms).await;
                    if let Some(forecast) = forecasts.next() {
                        push_forecast(forecast, next_txid).await;
                        next_txid = next_txid.wrapping_add(1);
                    }
                }
                Ok(AppMessage::Ack { txid }) => trace!("Phone: push {} delivered", txid),
                Ok(AppMessage::Nack { txid }) => warn!("Phone: push {} refused", txid),
                Err(e) => warn!("Phone: bad message {:?}", e),
            }
        }
    }
}

fn is_forecast_request(dictionary: &[u8]) -> bool {
    DictionaryReader::new(dictionary)
        .and_then(|reader| reader.find(WeatherKey::ForecastRequest.to_u32()))
        .map(|tuple| tuple.is_some())
        .unwrap_or(false)
}

async fn push_forecast(forecast: &Forecast, txid: u8) {
    let mut buffer = [0u8; 64];
    let encoded = DictionaryWriter::new(&mut buffer).and_then(|mut writer| {
        writer.write(&Tuple::uint8(WeatherKey::Icon, forecast.icon))?;
        writer.write(&Tuple::cstring(WeatherKey::Temperature, forecast.temperature))?;
        Ok(writer.finish())
    });

    match encoded {
        Ok(len) => {
            info!(
                "Phone: sending icon {} temperature {}",
                forecast.icon, forecast.temperature
            );
            send(AppMessage::Push {
                txid,
                dictionary: &buffer[..len],
            })
            .await;
        }
        Err(e) => warn!("Phone: forecast does not encode: {:?}", e),
    }
}

async fn send(message: AppMessage<'_>) {
    match message.to_frame().and_then(|frame| frame.encode_to_vec()) {
        Ok(bytes) => PHONE_TO_WATCH.write_all(&bytes).await,
        Err(e) => warn!("Phone: cannot frame message: {:?}", e),
    }
}
