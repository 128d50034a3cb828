//! `profile update`.

use std::io::Write;

use mercado_client::Storefront;
use mercado_client::validation::ProfileChanges;

use super::{CliError, require_login};

/// Fields given on the command line; the rest keep their current values.
#[derive(Debug, Default)]
pub struct ProfileEdit {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
}

pub async fn update(
    storefront: &mut Storefront,
    out: &mut impl Write,
    edit: ProfileEdit,
) -> Result<(), CliError> {
    require_login(storefront)?;
    let current = storefront.require_user().await?;

    let changes = ProfileChanges {
        first_name: edit
            .first_name
            .unwrap_or_else(|| current.first_name.clone()),
        last_name: edit.last_name.unwrap_or_else(|| current.last_name.clone()),
        address: edit.address.unwrap_or_else(|| current.address.clone()),
    };

    storefront.update_profile(&changes).await?;
    writeln!(out, "Profile updated. Please log in again.")?;
    Ok(())
}
