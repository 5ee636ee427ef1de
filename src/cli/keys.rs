use anyhow::Result;

use crate::core::AppConfig;
use crate::notify::generate_key_pair;

/// Print the VAPID public key the client should subscribe with,
/// deriving it from the private key if it isn't configured.
pub fn run() -> Result<()> {
    let keys = AppConfig::from_env().vapid_keys()?;
    println!("{}", keys.public_key);
    Ok(())
}

/// Print a new key pair in the form the environment expects.
pub fn generate() -> Result<()> {
    let (private_key, public_key) = generate_key_pair();
    println!("VAPID_PUBLIC_KEY={}", public_key);
    println!("VAPID_PRIVATE_KEY={}", private_key);
    Ok(())
}
