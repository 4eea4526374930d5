//! Mode tour: connect to an appliance and run a command in every CLI mode.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example ftd_modes -- --host 192.168.1.10 --user admin --password secret
//! ```
//!
//! Pass `--capture` to also write the raw device output to `ftdshell.log`.

use std::env;
use std::time::Duration;

use ftdshell::{FtdClientBuilder, Mode, Outcome};
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.capture {
        ftdshell::capture::init(None, LevelFilter::Debug)?;
    } else {
        // Initialize logging (set RUST_LOG=debug for verbose output)
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let Some(password) = args.password else {
        eprintln!("Error: --password is required");
        std::process::exit(1);
    };

    let mut client = FtdClientBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(password)
        .timeout(Duration::from_secs(args.timeout))
        .debug_capture(args.capture)
        .build()?;

    println!("Connecting to {}:{}...", args.host, args.port);
    if let Outcome::TimedOut(phase) = client.connect().await? {
        eprintln!("No prompt seen ({phase}), continuing anyway");
    }

    let tour = [
        (Mode::DiagnosticCli, "show version"),
        (Mode::Lina, "show interface ip brief"),
        (Mode::Expert, "uname -a"),
        (Mode::Clish, "show managers"),
        (Mode::Regular, "show version"),
    ];

    for (mode, command) in tour {
        println!("\n== {mode} ==");
        client.enter_mode(mode).await?;

        let response = client.send_command(command).await?;
        if response.is_success() {
            println!("{}", response.result);
        } else {
            eprintln!("{command}: {:?}", response.outcome);
        }
    }

    println!("\nLast prompt: {:?}", client.last_prompt());
    client.disconnect().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    timeout: u64,
    capture: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = "admin".to_string();
        let mut password = env::var("FTD_PASSWORD").ok();
        let mut timeout = 5u64;
        let mut capture = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(5);
                    }
                }
                "--capture" => capture = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            timeout,
            capture,
        }
    }

    fn print_help() {
        println!(
            r#"ftdshell ftd_modes example

USAGE:
    cargo run --example ftd_modes -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target host [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: admin]
    -P, --password <PASS>    Password [env: FTD_PASSWORD]
    -t, --timeout <SECS>     Network timeout [default: 5]
    --capture                Write device output to ftdshell.log
    --help                   Print this help message
"#
        );
    }
}
