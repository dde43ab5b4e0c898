#![forbid(unsafe_code)]

//! `proman-ctl`: local CLI companion for `proman`.
//!
//! Connects to the IPC socket of a running supervisor, sends one JSON
//! command, and prints the response.

use std::io::{BufRead, BufReader, Write};

use clap::{Parser, Subcommand};
use interprocess::local_socket::{traits::Stream as _, GenericNamespaced, Stream, ToNsName};

#[derive(Debug, Parser)]
#[command(
    name = "proman-ctl",
    about = "Local CLI for a running proman supervisor",
    version,
    long_about = None
)]
struct Cli {
    /// IPC socket name (must match the supervisor's `[ipc] name` setting).
    #[arg(long, default_value = "proman")]
    ipc_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the status of every process.
    Status,

    /// List process names.
    List,

    /// Start a process.
    Start {
        /// Process name.
        name: String,
    },

    /// Stop a process.
    Stop {
        /// Process name.
        name: String,
    },

    /// Show the full description of a process.
    Describe {
        /// Process name.
        name: String,
    },

    /// Start every process.
    StartAll,

    /// Stop every process.
    StopAll,
}

impl Command {
    fn to_request(&self) -> serde_json::Value {
        match self {
            Self::Status => serde_json::json!({ "command": "status" }),
            Self::List => serde_json::json!({ "command": "list" }),
            Self::Start { name } => serde_json::json!({ "command": "start", "name": name }),
            Self::Stop { name } => serde_json::json!({ "command": "stop", "name": name }),
            Self::Describe { name } => {
                serde_json::json!({ "command": "describe", "name": name })
            }
            Self::StartAll => serde_json::json!({ "command": "start_all" }),
            Self::StopAll => serde_json::json!({ "command": "stop_all" }),
        }
    }
}

fn main() {
    let args = Cli::parse();
    let request_json = args.command.to_request();

    match send_ipc_command(&args.ipc_name, &request_json) {
        Ok(response) => {
            if let Some(obj) = response.as_object() {
                let ok = obj
                    .get("ok")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                if ok {
                    if let Some(data) = obj.get("data") {
                        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
                    } else {
                        println!("OK");
                    }
                } else {
                    let err_msg = obj
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown error");
                    eprintln!("Error: {err_msg}");
                    std::process::exit(1);
                }
            } else {
                println!("{response}");
            }
        }
        Err(err) => {
            eprintln!("Failed to connect to supervisor: {err}");
            eprintln!("Is proman running with ipc name '{}'?", args.ipc_name);
            std::process::exit(1);
        }
    }
}

/// Connect to the IPC socket, send a JSON command, and read the response.
fn send_ipc_command(
    ipc_name: &str,
    request: &serde_json::Value,
) -> std::result::Result<serde_json::Value, Box<dyn std::error::Error>> {
    let name = ipc_name.to_ns_name::<GenericNamespaced>()?;
    let mut stream = Stream::connect(name)?;

    let mut request_line = serde_json::to_string(request)?;
    request_line.push('\n');
    stream.write_all(request_line.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    let response: serde_json::Value = serde_json::from_str(response_line.trim())?;
    Ok(response)
}
