//! Point-to-point LoRa text chat, one direction.
//!
//! Run one module as the sender and another as the receiver:
//!
//! ```sh
//! cargo run -p rn2483 --example point_to_point -- /dev/ttyACM0 send "Hello"
//! cargo run -p rn2483 --example point_to_point -- /dev/ttyACM1 recv
//! ```
//!
//! Both sides must share the radio configuration the driver applies at
//! construction (868 MHz, SF12, 250 kHz bandwidth).

use std::time::Duration;

use rn2483::{Error, Rn2483Builder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyACM0".into());
    let role = args.next().unwrap_or_else(|| "recv".into());

    println!("Connecting to RN2483 on {port}...");
    let mut radio = Rn2483Builder::new()
        .serial_port(&port)
        .read_timeout(Duration::from_secs(2))
        .watchdog_timeout_ms(10_000)
        .build()
        .await?;
    println!("Module configured.");

    match role.as_str() {
        "send" => {
            let text = args.next().unwrap_or_else(|| "Hello".into());
            radio.send_str(&text).await?;
            println!("Sent: {text}");
        }
        "recv" => loop {
            match radio.recv_str().await {
                Ok(text) => println!("Received: {text}"),
                // Nothing on the air within the watchdog window; re-arm.
                Err(Error::Timeout) => continue,
                Err(e) => return Err(e.into()),
            }
        },
        other => anyhow::bail!("unknown role `{other}` (use `send` or `recv`)"),
    }

    radio.close().await?;
    Ok(())
}
