use std::ffi::CString;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ese::hw::pcsc::{self, PcscOptions};
use ese::{Card, Registry, Session};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Unknown backend: {0} (try `ese-cli list`)")]
    UnknownBackend(String),

    #[error("Could not parse hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Reader name contains a NUL byte")]
    ReaderName(#[from] std::ffi::NulError),

    #[error("Error occurred on the secure element: {0}")]
    Ese(#[from] ese::Error),

    #[error(transparent)]
    Card(#[from] ese::card::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists the available backends.
    List,

    /// Sends raw APDUs, given in hex, and prints the responses.
    Transceive {
        #[command(flatten)]
        session: SessionArgs,

        /// Size of the receive buffer.
        #[arg(long, default_value_t = 258)]
        rx_max: usize,

        /// Prints one JSON object per exchange.
        #[arg(long)]
        json: bool,

        /// APDUs to send, in order.
        #[arg(required = true)]
        apdus: Vec<String>,
    },

    /// Selects an applet by its AID and prints the answer.
    Select {
        #[command(flatten)]
        session: SessionArgs,

        /// AID in hex.
        aid: String,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Backend to talk through.
    #[arg(short, long, default_value = "echo")]
    backend: String,

    /// PC/SC reader to bind, instead of the first one found.
    #[arg(long)]
    reader: Option<String>,

    /// Seconds to wait for a card to be presented.
    #[arg(long)]
    wait: Option<u64>,
}

impl SessionArgs {
    /// Builds and opens the session.
    fn open(&self, registry: &Registry) -> Result<Box<dyn Session>> {
        let mut ese: Box<dyn Session> = match (self.backend.as_str(), &self.reader) {
            (pcsc::NAME, Some(reader)) => {
                let reader = CString::new(reader.as_str())?;

                Box::new(pcsc::new(Some(&reader)))
            }
            (name, _) => registry
                .create(name)
                .ok_or_else(|| Error::UnknownBackend(name.to_string()))?,
        };

        debug!("Opening {}", ese.name());

        let opts = PcscOptions {
            wait: self.wait.map(Duration::from_secs),
            ..Default::default()
        };
        if let Err(e) = ese.open(Some(&opts)) {
            ese.close();
            return Err(e.into());
        }

        info!("Session opened on {}", ese.name());

        Ok(ese)
    }
}

fn transceive(ese: &mut dyn Session, apdus: &[String], rx_max: usize, json: bool) -> Result<()> {
    let mut rx = vec![0u8; rx_max];

    for apdu in apdus {
        let tx = hex::decode(apdu)?;
        let result = ese.transceive(&tx, &mut rx);

        if json {
            let line = match result {
                Ok(len) => json!({ "tx": apdu, "rx": hex::encode(&rx[..len]) }),
                Err(e) => json!({
                    "tx": apdu,
                    "error": { "code": e.code(), "message": e.message() },
                }),
            };
            println!("{}", line);
        } else {
            println!("{}", hex::encode(&rx[..result?]));
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let registry = Registry::with_builtins();

    match cli.command {
        Command::List => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Command::Transceive {
            session,
            rx_max,
            json,
            apdus,
        } => {
            let mut ese = session.open(&registry)?;
            let result = transceive(ese.as_mut(), &apdus, rx_max, json);

            ese.close();
            result?;
        }
        Command::Select { session, aid } => {
            let aid = hex::decode(aid)?;
            let mut card = Card::new(session.open(&registry)?);
            let result = card.select(aid);

            card.into_inner().close();
            println!("{}", hex::encode(result?));
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_echo_transceive() {
        let args = SessionArgs {
            backend: "echo".to_string(),
            reader: None,
            wait: None,
        };
        let mut ese = args.open(&Registry::with_builtins()).unwrap();

        assert!(transceive(ese.as_mut(), &["00a40400".to_string()], 16, true).is_ok());
        assert!(matches!(
            transceive(ese.as_mut(), &["zz".to_string()], 16, false),
            Err(Error::Hex(_)),
        ));

        ese.close();
    }

    #[test]
    fn test_unknown_backend() {
        let args = SessionArgs {
            backend: "nfc".to_string(),
            reader: None,
            wait: None,
        };

        assert!(matches!(
            args.open(&Registry::with_builtins()),
            Err(Error::UnknownBackend(_)),
        ));
    }
}
