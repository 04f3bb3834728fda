//! KNX Link 命令行客户端。
//!
//! ```text
//! knx-link-client [-H host] [-p port] read -g 1/2/3 -d 7.600
//! knx-link-client [-H host] [-p port] write -g 1/2/3 -d 1.001 on
//! ```

mod client;

use clap::{Parser, Subcommand};
use client::{ClientError, IO_TIMEOUT, exchange};
use domain::{DatapointId, GroupAddress};
use knx_link_protocol::v1::{encode_read_request, encode_write_request};
use knx_link_telemetry::init_tracing;
use std::process::ExitCode;

/// Sends read and write requests to a KNX Link gateway.
#[derive(Parser, Debug)]
#[command(name = "knx-link-client", version)]
struct Cli {
    /// Gateway host.
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Gateway port.
    #[arg(short, long, default_value_t = 3672)]
    port: u16,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reads the current value of a group address.
    Read {
        /// Group address, e.g. `1/2/3`, `1/234` or `2563`.
        #[arg(short, long)]
        group_address: String,
        /// Data point type, e.g. `7.600` or `dpst-1-1`.
        #[arg(short = 'd', long)]
        dpt: String,
    },
    /// Writes a value to a group address.
    Write {
        #[arg(short, long)]
        group_address: String,
        #[arg(short = 'd', long)]
        dpt: String,
        /// Values passed to the data point type.
        #[arg(value_name = "VALUE", num_args = 0.., allow_hyphen_values = true)]
        values: Vec<String>,
    },
}

impl Command {
    fn frame(&self) -> Result<Vec<u8>, ClientError> {
        match self {
            Self::Read { group_address, dpt } => Ok(encode_read_request(
                group_address.parse::<GroupAddress>()?,
                dpt.parse::<DatapointId>()?,
            )),
            Self::Write {
                group_address,
                dpt,
                values,
            } => Ok(encode_write_request(
                group_address.parse::<GroupAddress>()?,
                dpt.parse::<DatapointId>()?,
                values,
            )?),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let frame = cli.command.frame()?;
    let addr = format!("{}:{}", cli.host, cli.port);
    let replies = exchange(&addr, &frame, IO_TIMEOUT).await?;

    let mut failed = false;
    for reply in &replies {
        println!("{}", reply.render());
        failed |= !reply.body.status.is_success();
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
