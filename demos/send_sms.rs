// ABOUTME: Command line demo sending one SMS through the configured session strategy
// ABOUTME: Reads settings from a TOML file or flags and repeats the send to show session reuse

//! # Sending SMS
//!
//! ```bash
//! # Everything from flags, one session per message
//! cargo run --example send_sms -- --system-id test --password secret \
//!   --to +33612345678 --from ACME --message "Hello!"
//!
//! # Settings from a file, three sends ten seconds apart
//! cargo run --example send_sms -- --config sender.toml \
//!   --to +33612345678 --from ACME --message "Hello!" --repeat 3 --pause 10
//! ```

use argh::FromArgs;
use smpp_sender::client::{KeepAliveConfig, SenderConfig, SessionStrategy};
use smpp_sender::{SmsMessage, SmsSenderBuilder};
use std::error::Error;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Send an SMS through an SMSC
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// TOML file with the sender settings; flags override it
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// keep one session alive, probing it every N seconds
    #[argh(option)]
    keep_alive: Option<u64>,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the sender, a telephone number or an alphanumeric name
    #[argh(option, short = 'f')]
    from: String,

    /// the message text
    #[argh(option, short = 'm')]
    message: String,

    /// how many times to send the message (default: 1)
    #[argh(option, default = "1")]
    repeat: u32,

    /// seconds to wait between sends (default: 0)
    #[argh(option, default = "0")]
    pause: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli_args.config {
        Some(path) => SenderConfig::load(path)?,
        None => SenderConfig::default(),
    };
    if let Some(host) = cli_args.host {
        config.host = host;
    }
    if let Some(port) = cli_args.port {
        config.port = port;
    }
    if let Some(system_id) = cli_args.system_id {
        config.system_id = system_id;
    }
    if let Some(password) = cli_args.password {
        config.password = password;
    }
    if let Some(seconds) = cli_args.keep_alive {
        config.session = SessionStrategy::KeepAlive(
            KeepAliveConfig::new(Duration::from_secs(seconds)).with_connect_at_startup(true),
        );
    }

    info!("Sending through {} with {:?}", config.address(), config.session);
    let sender = SmsSenderBuilder::new(config).build().await?;
    let sms = SmsMessage::new(cli_args.from, cli_args.to, cli_args.message);

    for attempt in 1..=cli_args.repeat {
        match sender.send(&sms).await {
            Ok(receipt) => info!(
                "Send {attempt}: {} segment(s) accepted on session {}: {:?}",
                receipt.message_ids.len(),
                receipt.session_id,
                receipt.message_ids
            ),
            Err(e) => error!("Send {attempt} failed: {e}"),
        }
        if attempt < cli_args.repeat {
            tokio::time::sleep(Duration::from_secs(cli_args.pause)).await;
        }
    }

    sender.clean().await;
    Ok(())
}
