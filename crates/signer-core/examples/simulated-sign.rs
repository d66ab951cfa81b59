//! Simulated Signing Example
//!
//! Runs a full signing exchange against an in-process stand-in for the Stacks
//! app, so the APDU flow can be inspected without a device.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example simulated-sign -p ledger-stacks-signer-core
//!
//! # Custom path and message, with APDU bytes logged
//! RUST_LOG=ledger_stacks_signer_core=trace \
//!   cargo run --example simulated-sign -p ledger-stacks-signer-core -- \
//!   "m/44'/5757'/0'/0/1" deadbeef
//! ```
//!
//! The stand-in signs every payload it accepts with a fixed test key. It
//! answers `BadKeyHandle` for paths outside `m/44'/5757'`, like the app does.

#![expect(
    unused_crate_dependencies,
    reason = "examples share the library's dependency list"
)]

use std::env;
use std::process::ExitCode;

use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use ledger_stacks_signer_core::ledger::{
    Apdu, ApduResponse, PayloadType, SigningSession, Transport,
};
use ledger_stacks_signer_core::path::HARDENED;
use ledger_stacks_signer_core::{DerivationPath, Error, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PATH: &str = "m/44'/5757'/0'/0/0";
const DEFAULT_MESSAGE: &str = "0000000001040015c31b8c1c11c515e244b75806bac48d1399c77500000000000000000000000000000000000001";

/// In-process stand-in for the Stacks app.
struct Simulator {
    key: SigningKey,
    path: Option<DerivationPath>,
    message: Vec<u8>,
}

impl Simulator {
    fn new() -> Result<Self> {
        let key = SigningKey::from_slice(&[0x11; 32])
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self {
            key,
            path: None,
            message: Vec::new(),
        })
    }

    fn start(&mut self, data: &[u8]) -> Option<ApduResponse> {
        let path = data.try_into().ok().map(DerivationPath::from_encoded);
        let allowed = path.is_some_and(|p| {
            let [purpose, coin, ..] = p.components();
            purpose.to_u32() == 44 | HARDENED && coin.to_u32() == 5757 | HARDENED
        });
        if !allowed {
            return Some(ApduResponse::new(b"Invalid path".to_vec(), 0x6A80));
        }
        self.path = path;
        self.message.clear();
        None
    }

    fn finish(&mut self) -> Result<ApduResponse> {
        self.path = None;
        let message = std::mem::take(&mut self.message);
        let (signature, recovery_id) = self
            .key
            .sign_recoverable(&message)
            .map_err(|e| Error::Transport(e.to_string()))?;

        let mut body = signature.to_bytes().to_vec();
        body.push(recovery_id.to_byte());
        body.extend_from_slice(signature.to_der().as_bytes());
        Ok(ApduResponse::new(body, 0x9000))
    }
}

#[async_trait]
impl Transport for Simulator {
    async fn transmit(&mut self, apdu: &Apdu) -> Result<ApduResponse> {
        let p1 = apdu.p1();
        if p1 == PayloadType::Init.p1() || (p1 == PayloadType::Last.p1() && self.path.is_none()) {
            if let Some(rejection) = self.start(apdu.data()) {
                return Ok(rejection);
            }
        } else if self.path.is_none() {
            return Ok(ApduResponse::new(b"Unexpected chunk".to_vec(), 0x6984));
        } else {
            self.message.extend_from_slice(apdu.data());
        }

        if p1 == PayloadType::Last.p1() {
            self.finish()
        } else {
            Ok(ApduResponse::new(Vec::new(), 0x9000))
        }
    }

    fn is_connected(&self) -> bool {
        true
    }
}

async fn run(path: &str, message_hex: &str) -> Result<bool> {
    let message = hex::decode(message_hex.trim_start_matches("0x"))?;
    let mut session = SigningSession::new(Box::new(Simulator::new()?));

    info!(path, len = message.len(), "signing");
    let response = session.sign(path, &message).await?;

    println!("Return code:   {:#06x}", response.return_code());
    println!("Message:       {}", response.error_message());

    let Some(signature) = response.signature() else {
        return Ok(false);
    };
    signature.verify_consistency()?;
    println!("Compact (rsv): {signature}");
    println!("DER:           0x{}", hex::encode(signature.der()));
    println!(
        "JSON:          {}",
        serde_json::to_string(&response).map_err(Error::from)?
    );
    Ok(true)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_PATH.to_string());
    let message = args.next().unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

    match run(&path, &message).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
