//! Sign command - computes the signature header value for a request body
//!
//! Useful for calling the API by hand: the output goes into the
//! `x-signature` header of a request carrying exactly the signed bytes.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::infrastructure::signature::{SharedSecret, SignatureVerifier};

#[derive(Debug, Args)]
pub struct SignArgs {
    /// Hex encoded shared secret
    #[arg(long)]
    pub secret: String,

    /// File holding the request body. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn run(args: SignArgs) -> anyhow::Result<()> {
    let body = match &args.file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read request body from stdin")?;
            buf
        }
    };

    println!("{}", sign(&args.secret, &body)?);

    Ok(())
}

fn sign(secret: &str, body: &[u8]) -> anyhow::Result<String> {
    let verifier = SignatureVerifier::new(SharedSecret::from_hex(secret)?);
    Ok(hex::encode(verifier.sign(body)))
}
