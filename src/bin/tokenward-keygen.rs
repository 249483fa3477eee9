// ABOUTME: Key generation utility producing the RSA key pair used to sign session tokens
// ABOUTME: Writes a PKCS#8 private key and SPKI public key as PEM files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Generates the signing key pair read by `tokenward-server`.
//!
//! Usage:
//! ```bash
//! # Write ./keys/private.pem and ./keys/public.pem
//! cargo run --bin tokenward-keygen
//!
//! # Custom directory and modulus size, replacing existing files
//! cargo run --bin tokenward-keygen -- --out-dir /etc/tokenward --bits 4096 --force
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokenward::keys::generate_pem_pair;
use tracing::info;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const PRIVATE_KEY_FILE: &str = "private.pem";
const PUBLIC_KEY_FILE: &str = "public.pem";

#[derive(Parser)]
#[command(
    name = "tokenward-keygen",
    about = "Generate the RSA key pair used to sign Tokenward credentials"
)]
struct KeygenArgs {
    /// Directory receiving private.pem and public.pem
    #[arg(long, default_value = "./keys")]
    out_dir: PathBuf,

    /// RSA modulus size in bits
    #[arg(long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(2048..=8192))]
    bits: u32,

    /// Overwrite existing key files
    #[arg(long)]
    force: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = KeygenArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let private_path = args.out_dir.join(PRIVATE_KEY_FILE);
    let public_path = args.out_dir.join(PUBLIC_KEY_FILE);

    if !args.force {
        for path in [&private_path, &public_path] {
            if path.exists() {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }
        }
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    info!(bits = args.bits, "Generating RSA key pair");
    let pair = generate_pem_pair(args.bits as usize)?;

    write_key(&private_path, &pair.private_pem, true)?;
    write_key(&public_path, &pair.public_pem, false)?;

    info!("Private key: {}", private_path.display());
    info!("Public key:  {}", public_path.display());
    info!(
        "Set RSA_PRIVATE_KEY_PATH and RSA_PUBLIC_KEY_PATH to these files before starting the server"
    );
    Ok(())
}

fn write_key(path: &Path, pem: &str, private: bool) -> Result<()> {
    fs::write(path, pem).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    if private {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    if private {
        tracing::warn!("Restrict read access to {} manually", path.display());
    }

    Ok(())
}
