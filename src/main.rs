//! # IMU Relay
//!
//! Runs one node of the relay over a serial-attached LoRa module.
//!
//! # Roles
//!
//! - **sensor**: sample the IMU every `transmitter.period_ms` and broadcast one
//!   frame per sample
//! - **base**: parse the channel, keep frames addressed to this node or to
//!   broadcast, publish the latest one and record it to JSONL
//!
//! # Examples
//!
//! ```bash
//! imu-relay --config config/sensor.toml sensor
//! RUST_LOG=imu_relay=debug imu-relay --config config/base.toml base
//! ```
//!
//! Expected output (base):
//! ```text
//! INFO imu_relay: IMU Relay v0.1.0 starting as base node 0x01
//! INFO imu_relay::serial: Opened radio module at /dev/ttyACM0 (9600 baud)
//! INFO imu_relay: Notify: {"sender":2,"recipient":255,"message":"{\"x\":12.0000,\"y\":1.9867,\"z\":4.9003}","SNR":0.0,"RSSI":0,"FreqErr":0}
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use imu_relay::config::Config;
use imu_relay::node::base::BaseStation;
use imu_relay::node::transmitter::ChannelTransmitter;
use imu_relay::node::FixedQuality;
use imu_relay::protocol::parser::RxBuffer;
use imu_relay::sensor::SimulatedImu;
use imu_relay::serial::port_trait::SerialPortIO;
use imu_relay::serial::SerialLink;
use imu_relay::telemetry::recorder::TelemetryRecorder;
use imu_relay::transport::notify::NotifyCharacteristic;
use imu_relay::transport::{Publisher, TransportEvents};

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 60;

#[derive(Debug, Parser)]
#[command(name = "imu-relay", version, about = "LoRa IMU telemetry relay")]
struct Cli {
    /// Path to the TOML configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured serial port
    #[arg(short, long)]
    port: Option<String>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Role {
    /// Sample the sensor and transmit frames
    Sensor,
    /// Receive frames and publish them
    Base,
}

/// What woke the receive loop
enum RxEvent {
    Read(std::io::Result<usize>),
    Poll,
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    config.validate()?;

    let role = match cli.role {
        Role::Sensor => "sensor",
        Role::Base => "base",
    };
    info!(
        "IMU Relay v{} starting as {} node 0x{:02X}",
        env!("CARGO_PKG_VERSION"),
        role,
        config.node.address
    );

    // No radio means no node: fail at startup rather than run degraded
    let link = SerialLink::open(&config.serial)?;

    match cli.role {
        Role::Sensor => run_sensor(&config, link).await,
        Role::Base => run_base(&config, link).await,
    }
}

/// Transmit one frame per period until Ctrl+C
async fn run_sensor(config: &Config, link: SerialLink) -> Result<()> {
    let mut tx = ChannelTransmitter::new(
        &config.node,
        config.transmitter.payload,
        SimulatedImu::new(),
        link,
    );
    let mut period = interval(Duration::from_millis(config.transmitter.period_ms));

    info!(
        "Transmitting {:?} payload to 0x{:02X} every {}ms",
        config.transmitter.payload, config.node.destination, config.transmitter.period_ms
    );
    info!("Press Ctrl+C to exit");

    let mut last_log_count: u64 = 0;

    loop {
        tokio::select! {
            _ = period.tick() => {
                tx.tick().await;

                let sent = tx.stats().sent;
                if sent - last_log_count >= LOG_INTERVAL_FRAMES {
                    info!("Sent {} frames", sent);
                    last_log_count = sent;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let stats = tx.stats();
    info!(
        "Total frames sent: {} (oversized: {}, sensor errors: {}, write errors: {})",
        stats.sent, stats.oversized, stats.sensor_errors, stats.write_errors
    );
    Ok(())
}

/// Parse and publish incoming frames until Ctrl+C or the port closes
async fn run_base(config: &Config, mut link: SerialLink) -> Result<()> {
    let mut notify = NotifyCharacteristic::new();
    let mut client_view = notify.subscribe();
    notify.on_connected();

    // Stand-in for a connected client: log every value the characteristic notifies
    tokio::spawn(async move {
        while client_view.changed().await.is_ok() {
            let value = client_view.borrow_and_update().clone();
            if let Some(value) = value {
                info!("Notify: {}", value);
            }
        }
    });

    let publisher: Box<dyn Publisher> = if config.telemetry.enabled {
        Box::new((notify, TelemetryRecorder::new(&config.telemetry)?))
    } else {
        Box::new(notify)
    };

    let mut base = BaseStation::new(&config.node, &config.receiver, publisher, FixedQuality::default());
    let mut rx = RxBuffer::new();
    let mut poll = interval(Duration::from_millis(config.receiver.poll_interval_ms));

    info!(
        "Listening on {} as 0x{:02X} (frame timeout {}ms)",
        link.device_path(),
        config.node.address,
        config.receiver.frame_timeout_ms
    );
    info!("Press Ctrl+C to exit");

    loop {
        let event = tokio::select! {
            read = link.read_into(rx.as_bytes_mut()) => RxEvent::Read(read),
            _ = poll.tick() => RxEvent::Poll,
            _ = tokio::signal::ctrl_c() => RxEvent::Shutdown,
        };

        match event {
            RxEvent::Read(Ok(0)) => {
                warn!("Serial port closed");
                break;
            }
            RxEvent::Read(Ok(n)) => {
                debug!("Received {} bytes", n);
                base.tick(&mut rx, Instant::now());
            }
            RxEvent::Read(Err(e)) => return Err(e.into()),
            RxEvent::Poll => {
                base.tick(&mut rx, Instant::now());
            }
            RxEvent::Shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let dispatch = base.dispatch_stats();
    let parser = base.parser_stats();
    info!(
        "Frames: {} parsed, {} forwarded, {} for other nodes, {} malformed, {} stale",
        parser.frames, dispatch.forwarded, dispatch.not_for_us, dispatch.malformed, parser.stale
    );
    Ok(())
}
