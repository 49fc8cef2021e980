//! Connection form flags applied to the wizard.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use datadock_core::{ConnectionPayload, ConnectionWizard, ErrorKind, FormField};

/// Form fields accepted by `create`, `edit` and `test-config`.
///
/// Unset flags leave the field untouched, so in edit mode only the given
/// values change.
#[derive(Debug, Clone, Default, Args)]
pub struct FieldArgs {
    /// Connection name
    #[arg(long)]
    pub name: Option<String>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port (defaults to the engine's port)
    #[arg(long)]
    pub port: Option<String>,

    /// Database name, or bucket name for S3
    #[arg(long, visible_alias = "bucket")]
    pub database: Option<String>,

    /// Username, or access key id for S3
    #[arg(long, visible_alias = "access-key")]
    pub username: Option<String>,

    /// Password, or secret access key for S3
    #[arg(
        long,
        visible_alias = "secret-key",
        env = "DATADOCK_CONNECTION_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Snowflake account identifier
    #[arg(long)]
    pub account: Option<String>,

    /// Snowflake warehouse
    #[arg(long)]
    pub warehouse: Option<String>,

    /// Snowflake role
    #[arg(long)]
    pub role: Option<String>,

    /// Snowflake schema
    #[arg(long)]
    pub schema: Option<String>,

    /// File holding the PEM-encoded Snowflake private key
    #[arg(long, value_name = "PATH")]
    pub private_key_file: Option<PathBuf>,

    /// Passphrase of the Snowflake private key
    #[arg(
        long,
        env = "DATADOCK_PRIVATE_KEY_PASSPHRASE",
        hide_env_values = true
    )]
    pub private_key_passphrase: Option<String>,

    /// S3 region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint URL
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Enable SSL (true or false)
    #[arg(long, value_name = "BOOL")]
    pub ssl: Option<bool>,
}

impl FieldArgs {
    /// Copies every given flag into the wizard form.
    pub fn apply(&self, wizard: &mut ConnectionWizard) -> anyhow::Result<()> {
        let private_key = self
            .private_key_file
            .as_deref()
            .map(|path| {
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read private key from {}", path.display()))
            })
            .transpose()?;
        let ssl = self.ssl.map(|ssl| ssl.to_string());

        let values = [
            (FormField::Name, self.name.as_deref()),
            (FormField::Host, self.host.as_deref()),
            (FormField::Port, self.port.as_deref()),
            (FormField::Database, self.database.as_deref()),
            (FormField::Username, self.username.as_deref()),
            (FormField::Password, self.password.as_deref()),
            (FormField::Account, self.account.as_deref()),
            (FormField::Warehouse, self.warehouse.as_deref()),
            (FormField::Role, self.role.as_deref()),
            (FormField::Schema, self.schema.as_deref()),
            (FormField::PrivateKey, private_key.as_deref()),
            (
                FormField::PrivateKeyPassphrase,
                self.private_key_passphrase.as_deref(),
            ),
            (FormField::Region, self.region.as_deref()),
            (FormField::EndpointUrl, self.endpoint_url.as_deref()),
            (FormField::SslEnabled, ssl.as_deref()),
        ];

        for (field, value) in values {
            if let Some(value) = value {
                wizard.set(field, value).map_err(|error| {
                    anyhow::anyhow!(
                        "invalid --{}: {}",
                        flag_name(field),
                        error.display_message()
                    )
                })?;
            }
        }

        Ok(())
    }
}

fn flag_name(field: FormField) -> String {
    match field {
        FormField::PrivateKey => "private-key-file".to_owned(),
        FormField::SslEnabled => "ssl".to_owned(),
        other => other.as_ref().replace('_', "-"),
    }
}

/// Builds the payload, reporting missing fields with the wizard's combined
/// message alone.
pub fn build_payload(wizard: &ConnectionWizard) -> anyhow::Result<ConnectionPayload> {
    wizard.build_payload().map_err(|error| match error.kind() {
        ErrorKind::Validation => anyhow::anyhow!(error.display_message()),
        _ => anyhow::Error::from(error),
    })
}
