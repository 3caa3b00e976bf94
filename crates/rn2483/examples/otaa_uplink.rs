//! LoRaWAN over-the-air activation and a single uplink.
//!
//! Provisions the module with OTAA credentials, joins the network, and sends
//! one unconfirmed uplink on the default port.
//!
//! ```sh
//! RN2483_APPKEY=... RN2483_APPEUI=... RN2483_DEVEUI=... \
//!     cargo run -p rn2483 --example otaa_uplink -- /dev/ttyACM0
//! ```
//!
//! Joining can take several seconds; the serial read timeout below bounds
//! how long the driver waits for the network's verdict.

use std::time::Duration;

use rn2483::{OtaaCredentials, Rn2483Builder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyACM0".into());

    let creds = OtaaCredentials {
        appkey: std::env::var("RN2483_APPKEY")?,
        appeui: std::env::var("RN2483_APPEUI")?,
        deveui: std::env::var("RN2483_DEVEUI")?,
    };

    println!("Connecting to RN2483 on {port}...");
    let mut radio = Rn2483Builder::new()
        .serial_port(&port)
        .read_timeout(Duration::from_secs(10))
        .build()
        .await?;

    let hweui = radio.config_otaa(&creds).await?;
    println!("Module hardware EUI: {hweui}");

    println!("Joining...");
    radio.join().await?;
    println!("Joined.");

    radio.send_uplink(&rn2483::codec::encode_payload("Hi")).await?;
    println!("Uplink confirmed by MAC layer.");

    radio.close().await?;
    Ok(())
}
