use anyhow::Context;
use clap::{Parser, Subcommand};
use radar_rs::board::{signal_failure, FAILURE_BLINK_INTERVAL};
use radar_rs::logging::{log_debug, log_warn};
use radar_rs::{
    decode_frame, init_logger, interpret, log_info, open_sensor, run_gateway, GatewayConfig,
    LogIndicator, SerialConfig, TelemetryRecord,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "radar-cli")]
#[command(about = "CLI tool for Seeed Studio mmWave radar sensors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full gateway from a configuration file
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Reset the sensor and print its product information
    Probe {
        #[arg(short, long)]
        port: String,
        #[arg(short, long, default_value = "115200")]
        baudrate: u32,
    },
    /// Print poll cycle records as JSON
    Poll {
        #[arg(short, long)]
        port: String,
        #[arg(short, long, default_value = "115200")]
        baudrate: u32,
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },
    /// Decode a captured frame given as hex
    Decode { hex: String },
}

fn serial_config(port: String, baudrate: u32) -> SerialConfig {
    SerialConfig {
        port,
        baudrate,
        ..SerialConfig::default()
    }
}

async fn run(config: PathBuf) -> anyhow::Result<()> {
    let result = match GatewayConfig::from_file(&config) {
        Ok(config) => run_gateway(&config).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            let mut led = LogIndicator::new();
            signal_failure(&mut led, &err, FAILURE_BLINK_INTERVAL).await;
            // A non-zero exit lets the supervisor restart the device.
            Err(err).context("gateway stopped")
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config).await?,
        Commands::Probe { port, baudrate } => {
            let mut sensor = open_sensor(&serial_config(port, baudrate))?;
            let model = sensor.init().await?;
            log_info(&format!("Detected model: {model}"));
            let info = sensor.product_info().await?;
            for (key, value) in info.iter() {
                match value.as_bytes() {
                    Some(bytes) => log_info(&format!("{key}: {}", String::from_utf8_lossy(bytes))),
                    None => log_info(&format!("{key}: {value:?}")),
                }
            }
        }
        Commands::Poll {
            port,
            baudrate,
            count,
        } => {
            let config = serial_config(port, baudrate);
            let mut sensor = open_sensor(&config)?;
            sensor.init().await?;
            for _ in 0..count {
                let record = sensor.poll().await?;
                if let Some(err) = record.error() {
                    log_warn(&format!("Degraded reading: {err}"));
                }
                println!("{}", record.to_json()?);
            }
        }
        Commands::Decode { hex } => {
            let bytes = hex::decode(hex.trim()).context("frame must be hex")?;
            log_debug(&format!("Decoding {} captured bytes", bytes.len()));
            let (frame, used) = decode_frame(&bytes)?;
            log_info(&format!(
                "Frame control 0x{:02X} command 0x{:02X}, {} payload bytes, {used} bytes consumed",
                frame.control,
                frame.command,
                frame.payload.len()
            ));
            let mut record = TelemetryRecord::new();
            record.merge(interpret(frame.control, frame.command, &frame.payload));
            println!("{}", record.to_json()?);
        }
    }

    Ok(())
}
