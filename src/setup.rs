//! Interactive configuration (`--config`).
//!
//! Prompts for the CA endpoint, the account and the default template, then
//! stores them through [`ConfigLoader::store`]. Pressing enter keeps the
//! value already on file.

use std::io::{BufRead, Write};

use crate::config::{obfuscate, ConfigFile, ConfigLoader};
use crate::error::{CertsrvError, Result};
use crate::exit::Response;

/// Ask for every setting, starting from `existing`.
///
/// The password is read through `read_password`, which gets the prompt text
/// and must not echo what is typed.
///
/// The returned record is validated but not yet stored.
pub fn configure<R, W, P>(
    input: &mut R,
    output: &mut W,
    mut read_password: P,
    existing: Option<&ConfigFile>,
) -> Result<ConfigFile>
where
    R: BufRead,
    W: Write,
    P: FnMut(&str) -> std::io::Result<String>,
{
    let mut config = existing.cloned().unwrap_or_default();

    config.server = prompt(input, output, "CA server", Some(&config.server))?;
    config.username = prompt(input, output, "Username", Some(&config.username))?;

    let label = if config.password.is_empty() {
        "Password: "
    } else {
        "Password [keep current]: "
    };
    let password = read_password(label)?;
    let password = password.trim_end_matches(['\r', '\n']);
    if !password.is_empty() {
        config.password = obfuscate(password);
    }

    config.default_template =
        prompt(input, output, "Default template", Some(&config.default_template))?;

    config.clone().into_credentials()?;
    Ok(config)
}

/// Run the interactive configuration against stdin/stdout.
///
/// Exit 0 once the file is written, exit 3 if it cannot be.
pub fn run_interactive(loader: &ConfigLoader) -> Response {
    let existing = loader.load_file().ok();

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    let result = configure(
        &mut input,
        &mut output,
        |label: &str| rpassword::prompt_password(label),
        existing.as_ref(),
    )
        .and_then(|config| loader.store(&config));

    match result {
        Ok(()) => Response::success(format!(
            "Configuration saved to {}",
            loader.path().display()
        )),
        Err(e) => {
            tracing::error!("Configuration failed: {}", e);
            let e = if e.is_config() {
                e
            } else {
                CertsrvError::config(e.to_string())
            };
            Response::config_error(&e)
        }
    }
}

/// Ask one question; an empty answer returns `current`.
fn prompt<R, W>(
    input: &mut R,
    output: &mut W,
    label: &str,
    current: Option<&str>,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    match current.filter(|c| !c.is_empty()) {
        Some(current) => write!(output, "{} [{}]: ", label, current)?,
        None => write!(output, "{}: ", label)?,
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();

    if answer.is_empty() {
        Ok(current.unwrap_or_default().to_string())
    } else {
        Ok(answer.to_string())
    }
}
