//! Manage the stored API key outside the chat screen.

use std::error::Error;

use clap::Subcommand;

use crate::core::credentials::{mask_credential, CredentialError, SettingsStore};
use crate::utils::line_editor::{prompt_line_editor, LineEditorError, LineEditorOptions};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    /// Store an API key (prompts with masked input when omitted)
    Set { value: Option<String> },
    /// Remove the stored API key
    Clear,
    /// Show the stored API key, masked
    Show,
}

/// Save `value`; a blank value clears the entry. Returns the message to print.
pub fn store_key(store: &SettingsStore, value: &str) -> Result<&'static str, CredentialError> {
    store.save_credential(value)?;
    Ok(if value.trim().is_empty() {
        "✅ API key cleared"
    } else {
        "✅ API key saved"
    })
}

pub fn describe_key(store: &SettingsStore) -> Result<String, CredentialError> {
    Ok(match store.load_credential()? {
        Some(value) => format!("API key: {}", mask_credential(&value)),
        None => "No API key stored; queries use the server's default".to_string(),
    })
}

pub fn run_key(command: KeyCommand, store: &SettingsStore) -> Result<(), Box<dyn Error>> {
    match command {
        KeyCommand::Set { value } => {
            let value = match value {
                Some(value) => value,
                None => match prompt_line_editor("API key: ", &LineEditorOptions::secret()) {
                    Ok(value) => value,
                    Err(LineEditorError::Cancelled) => {
                        println!("Cancelled; stored key unchanged");
                        return Ok(());
                    }
                    Err(err) => {
                        eprintln!("❌ {err}");
                        std::process::exit(1);
                    }
                },
            };
            println!("{}", store_key(store, &value)?);
        }
        KeyCommand::Clear => {
            store.clear_credential()?;
            println!("✅ API key cleared");
        }
        KeyCommand::Show => println!("{}", describe_key(store)?),
    }
    Ok(())
}
