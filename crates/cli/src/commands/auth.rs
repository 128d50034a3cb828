//! `login`, `register`, `logout` and `whoami`.

use std::io::Write;

use mercado_client::Storefront;
use mercado_client::validation::RegistrationForm;
use secrecy::SecretString;

use super::CliError;
use crate::render;

pub async fn login(
    storefront: &mut Storefront,
    out: &mut impl Write,
    email: &str,
    password: &SecretString,
) -> Result<(), CliError> {
    let user = storefront.sign_in(email, password).await.map_err(|e| {
        if e.is_forbidden() {
            CliError::AccessDenied
        } else {
            e.into()
        }
    })?;

    writeln!(out, "Logged in as {}.", user.display_name())?;
    let items = storefront.cart().items().len();
    if items > 0 {
        writeln!(out, "Your cart has {items} item(s).")?;
    }
    Ok(())
}

pub async fn register(
    storefront: &mut Storefront,
    out: &mut impl Write,
    form: &RegistrationForm,
) -> Result<(), CliError> {
    let user = storefront.sign_up(form).await?;
    writeln!(
        out,
        "Account created for {}. Run `mercado login` to sign in.",
        user.email
    )?;
    Ok(())
}

pub fn logout(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let was_signed_in = storefront.is_authenticated();
    storefront.sign_out()?;
    if was_signed_in {
        writeln!(out, "Logged out.")?;
    } else {
        writeln!(out, "Not logged in.")?;
    }
    Ok(())
}

pub async fn whoami(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let user = storefront.require_user().await?;
    render::user(out, user)?;
    Ok(())
}
