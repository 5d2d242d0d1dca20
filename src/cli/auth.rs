//! Interactive `auth` and `deauth` commands.

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::core::credentials::API_KEY_ENV_VARS;
use crate::core::keyring::{KeyringStore, KEYRING_SERVICE};

const KEY_PROMPT: &str = "Enter your Gemini API key: ";

pub fn run_auth() -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let key = prompt_for_key(&mut stdin.lock(), &mut stdout)?;
    KeyringStore::default().store_api_key(&key)?;
    println!("✅ Stored API key in the system keyring (service: {KEYRING_SERVICE})");
    if let Some(var) = API_KEY_ENV_VARS
        .iter()
        .find(|var| std::env::var(var).is_ok_and(|v| !v.trim().is_empty()))
    {
        println!("ℹ️  {var} is set and will take precedence over the stored key");
    }
    Ok(())
}

pub fn run_deauth() -> Result<(), Box<dyn Error>> {
    if KeyringStore::default().remove_api_key()? {
        println!("✅ Removed API key from the system keyring");
    } else {
        println!("No stored API key found");
    }
    Ok(())
}

fn prompt_for_key<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String, io::Error> {
    write!(output, "{KEY_PROMPT}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim();
    if key.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no API key entered",
        ));
    }
    Ok(key.to_string())
}
