//! Password hash generator for bootstrapping the first user record.
//!
//! Prints the Argon2 PHC string and the JSON file body to commit under the
//! users directory.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher};
use clap::Parser;
use password_hash::SaltString;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "gitshelf-hash")]
#[command(about = "Generate an Argon2 password hash and a ready-to-commit user record")]
struct Args {
    /// User identifier, usually an email address
    username: String,

    /// Password to hash
    password: String,

    /// Display name for the admin UI
    #[arg(long, default_value = "Your full name")]
    full_name: String,

    /// Profile image URL
    #[arg(long, default_value = "https://link.to.your.profile.image")]
    avatar: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(args.password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))?
        .to_string();

    let record = json!({
        "fullName": args.full_name,
        "id": args.username,
        "hash": hash,
        "avatar": args.avatar,
    });

    println!("Password hashed!");
    println!(
        "Now create a file named content/users/{}.json with the following JSON content:",
        args.username
    );
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
