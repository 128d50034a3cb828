//! Command implementations.
//!
//! Each command takes the storefront context and a writer for its output.
//! Protected commands check for a stored token before doing anything else.

pub mod auth;
pub mod cart;
pub mod products;
pub mod profile;

use std::io::{self, BufRead, Write};

use mercado_client::{ClientError, Storefront};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// No usable session.
    #[error("you are not logged in; run `mercado login` first")]
    NotLoggedIn,

    /// Login refused with 403.
    #[error("access denied: incorrect credentials")]
    AccessDenied,

    /// The client reported a failure.
    #[error(transparent)]
    Client(ClientError),

    /// Output could not be written or input read.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotAuthenticated => Self::NotLoggedIn,
            other => Self::Client(other),
        }
    }
}

/// Fail early unless a token is stored.
fn require_login(storefront: &Storefront) -> Result<(), CliError> {
    if storefront.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn)
    }
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is no.
fn confirm(out: &mut impl Write, question: &str) -> io::Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    read_yes(&mut io::stdin().lock())
}

fn read_yes(input: &mut impl BufRead) -> io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
