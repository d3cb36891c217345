//! Breathlink host binary.
//!
//! Runs a headless session host: binds, logs the pairing endpoint and
//! token, marks itself ready, and logs every command a paired peer
//! dispatches. Useful for driving companion apps against a real host
//! without the full application.
//!
//! # Usage
//!
//! ```bash
//! # Generated pairing (fresh token, OS-assigned port)
//! breathlink-server
//!
//! # Fixed port, generated token
//! breathlink-server --host 0.0.0.0 --port 5020
//!
//! # Static pairing (pre-shared port and token)
//! breathlink-server --static-pairing
//! ```

use breathlink_core::{DEFAULT_HOST, Pairing, ServerConfig};
use breathlink_net::{NetEvent, NetServer};
use breathlink_proto::CommandKind;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Breathlink session host
#[derive(Parser, Debug)]
#[command(name = "breathlink-server")]
#[command(about = "Breathlink remote-session host")]
#[command(version)]
struct Args {
    /// Host/interface to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind (0 = OS-assigned)
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Use the fixed pre-shared port and token instead of generating
    #[arg(long)]
    static_pairing: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let pairing = if args.static_pairing { Pairing::static_default() } else { Pairing::Generated };
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        pairing,
        ..ServerConfig::default()
    };

    let (server, events) = NetServer::start(config)?;

    let endpoint = server.endpoint();
    tracing::info!("pair at {} with token {}", endpoint, endpoint.token);

    server.set_ready(true);

    for event in events {
        match event {
            NetEvent::Command(command) => match command.kind {
                CommandKind::Mode => {
                    tracing::info!(
                        mode = %command.label(),
                        minutes = command.time,
                        "mode run requested"
                    );
                },
                CommandKind::Stop => tracing::info!("running mode interrupted by peer"),
                CommandKind::Close => {},
            },
            // Host-role bridges only carry commands; nothing to do here.
            NetEvent::Response(_) => {},
        }
    }

    Ok(())
}
