//! Two-step connection wizard: pick a service, then configure it.
//!
//! ```text
//!            select(descriptor)
//!   Select ─────────────────────▶ Configure
//!      ▲                              │
//!      └──────── back() / cancel() ───┘   (form reset)
//! ```
//!
//! Validation and payload construction only run in `Configure`. Test
//! failures are kept in [`TestStatus`] and never escape the wizard.

use crate::catalog::{self, DatabaseServiceDescriptor};
use crate::error::{Error, Result};
use crate::form::{ConnectionFormState, EngineFamily, FormField, visible_fields};
use crate::model::{Connection, ConnectionTestResult, ResourceId};
use crate::payload::{ConnectionPayload, S3_HOST, S3_PORT, SubmitMode};

/// Tracing target for wizard transitions.
pub const TRACING_TARGET: &str = "datadock_core::wizard";

/// Prefix of the combined missing-fields message.
pub const MISSING_FIELDS_PREFIX: &str = "Please fill in all required fields";

/// Current step of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardStep {
    #[default]
    Select,
    Configure,
}

/// Progress of the "Test Connection" action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Idle,
    Testing,
    Success(String),
    Error(String),
}

/// Required fields per family, in display order.
pub fn required_fields(family: EngineFamily) -> &'static [FormField] {
    use FormField::*;

    match family {
        EngineFamily::Generic => &[Name, Host, Port, Database, Username, Password],
        EngineFamily::Snowflake => &[Name, Account, Database, Username, Password, PrivateKey],
        EngineFamily::S3 => &[Name, Database, Username, Password],
    }
}

/// One wizard session. Created on open, dropped on close or submit.
#[derive(Debug, Clone, Default)]
pub struct ConnectionWizard {
    step: WizardStep,
    descriptor: Option<&'static DatabaseServiceDescriptor>,
    editing: Option<ResourceId>,
    form: ConnectionFormState,
    status: TestStatus,
}

impl ConnectionWizard {
    /// Opens a wizard on the select step with a cleared form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a wizard in edit mode, pre-filled from a saved connection.
    ///
    /// Secrets are never returned by the backend, so they start blank and
    /// stay optional.
    pub fn edit(connection: &Connection) -> Self {
        let mut form = ConnectionFormState::default();
        form.set_engine(connection.connection_type.clone());
        form.name = connection.name.clone();
        form.host = connection.host.clone();
        form.port = connection.port;
        form.database = connection.database.clone();
        form.username = connection.username.clone();
        form.ssl_enabled = connection.ssl_enabled;

        let extra = |key: &str| connection.extra_str(key).unwrap_or_default().to_owned();
        match form.family() {
            EngineFamily::Snowflake => {
                form.account = match connection.extra_str("account") {
                    Some(account) => account.to_owned(),
                    None => connection.host.clone(),
                };
                form.warehouse = extra("warehouse");
                form.role = extra("role");
                form.schema = extra("schema");
            }
            EngineFamily::S3 => {
                form.region = extra("region");
                form.endpoint_url = extra("endpoint_url");
            }
            EngineFamily::Generic => {}
        }

        tracing::debug!(
            target: TRACING_TARGET,
            connection_id = %connection.id,
            engine = %form.engine,
            "Opened wizard in edit mode"
        );

        Self {
            step: WizardStep::Configure,
            descriptor: catalog::find(&connection.connection_type),
            editing: Some(connection.id.clone()),
            form,
            status: TestStatus::Idle,
        }
    }

    /// Current step.
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Descriptor picked on the select step, if any.
    pub fn descriptor(&self) -> Option<&'static DatabaseServiceDescriptor> {
        self.descriptor
    }

    /// Id of the connection being edited, if in edit mode.
    pub fn editing(&self) -> Option<&ResourceId> {
        self.editing.as_ref()
    }

    /// Submission mode derived from whether a connection is being edited.
    pub fn mode(&self) -> SubmitMode {
        if self.editing.is_some() {
            SubmitMode::Edit
        } else {
            SubmitMode::Create
        }
    }

    /// Read access to the form.
    pub fn form(&self) -> &ConnectionFormState {
        &self.form
    }

    /// Current test status.
    pub fn status(&self) -> &TestStatus {
        &self.status
    }

    /// Engine family of the current form.
    pub fn family(&self) -> EngineFamily {
        self.form.family()
    }

    /// Moves from select to configure with the descriptor's defaults.
    ///
    /// Picking while already configuring switches the engine, which clears
    /// the engine-specific fields.
    pub fn select(&mut self, descriptor: &'static DatabaseServiceDescriptor) {
        self.form.set_engine(descriptor.connection_type);
        self.descriptor = Some(descriptor);

        match self.form.family() {
            EngineFamily::S3 => {
                self.form.host = S3_HOST.to_owned();
                self.form.port = Some(S3_PORT);
            }
            _ if descriptor.default_port > 0 => self.form.port = Some(descriptor.default_port),
            _ => {}
        }

        self.status = TestStatus::Idle;
        self.step = WizardStep::Configure;

        tracing::debug!(
            target: TRACING_TARGET,
            engine = descriptor.connection_type,
            family = %self.form.family(),
            "Selected database service"
        );
    }

    /// Looks a descriptor up by id and selects it.
    ///
    /// # Errors
    ///
    /// Returns a not found error for ids missing from the catalog.
    pub fn select_by_id(&mut self, id: &str) -> Result<()> {
        let descriptor = catalog::find(id).ok_or_else(|| {
            Error::not_found().with_message(format!("Unknown database service: {id}"))
        })?;
        self.select(descriptor);
        Ok(())
    }

    /// Returns to the select step and resets every field.
    pub fn back(&mut self) {
        self.reset();
        tracing::debug!(target: TRACING_TARGET, "Returned to service selection");
    }

    /// Discards the session.
    pub fn cancel(&mut self) {
        self.reset();
        self.editing = None;
    }

    /// Sets a form field from text.
    ///
    /// Only the fields shown for the current family are accepted, so a value
    /// is never silently dropped from the payload.
    ///
    /// # Errors
    ///
    /// Returns an invalid state error on the select step, an invalid input
    /// error for a field the family does not use, or the error of
    /// [`ConnectionFormState::set`].
    pub fn set(&mut self, field: FormField, value: &str) -> Result<()> {
        self.ensure_configuring()?;
        self.ensure_visible(field)?;
        self.form.set(field, value)
    }

    /// Labels of required fields that are blank, in display order.
    ///
    /// Secrets are optional while editing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let family = self.family();
        let editing = self.editing.is_some();

        required_fields(family)
            .iter()
            .filter(|field| !(editing && field.is_secret()))
            .filter(|field| self.form.is_blank(**field))
            .map(|field| field.label(family))
            .collect()
    }

    /// Runs the required-field checklist.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing every missing field in one message.
    pub fn validate(&self) -> Result<()> {
        self.ensure_configuring()?;

        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }

        Err(Error::validation().with_message(format!(
            "{MISSING_FIELDS_PREFIX}: {}",
            missing.join(", ")
        )))
    }

    /// Validates the form and builds the payload for its family.
    ///
    /// # Errors
    ///
    /// Returns an invalid state error on the select step or a validation
    /// error when required fields are missing.
    pub fn build_payload(&self) -> Result<ConnectionPayload> {
        self.validate()?;
        ConnectionPayload::from_form(&self.form, self.mode())
    }

    /// Marks a test as started.
    pub fn begin_test(&mut self) {
        self.status = TestStatus::Testing;
    }

    /// Records the outcome of a test. Errors become the error status.
    pub fn finish_test<E>(&mut self, result: std::result::Result<ConnectionTestResult, E>)
    where
        E: std::fmt::Display,
    {
        self.status = match result {
            Ok(result) if result.passed() => TestStatus::Success(result.display_message()),
            Ok(result) => TestStatus::Error(result.display_message()),
            Err(error) => TestStatus::Error(error.to_string()),
        };
    }

    fn reset(&mut self) {
        self.form.clear();
        self.descriptor = None;
        self.status = TestStatus::Idle;
        self.step = WizardStep::Select;
    }

    fn ensure_visible(&self, field: FormField) -> Result<()> {
        let family = self.family();
        if visible_fields(family).contains(&field) {
            return Ok(());
        }

        let label = field.label(family);
        let message = match (family, field) {
            (EngineFamily::S3, FormField::Host | FormField::Port) => format!(
                "{label} cannot be set: S3 connections always use {S3_HOST}:{S3_PORT}"
            ),
            _ => format!("{label} is not used by {} connections", self.service_name()),
        };
        Err(Error::invalid_input().with_message(message))
    }

    fn service_name(&self) -> &str {
        match self.descriptor {
            Some(descriptor) => descriptor.display_name,
            None => &self.form.engine,
        }
    }

    fn ensure_configuring(&self) -> Result<()> {
        match self.step {
            WizardStep::Configure => Ok(()),
            WizardStep::Select => Err(Error::invalid_state()
                .with_message("Select a database service before configuring it")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn configured(id: &str) -> ConnectionWizard {
        let mut wizard = ConnectionWizard::new();
        wizard.select_by_id(id).unwrap();
        wizard
    }

    #[test]
    fn test_select_moves_to_configure_with_default_port() {
        let wizard = configured("mysql");
        assert_eq!(wizard.step(), WizardStep::Configure);
        assert_eq!(wizard.form().engine, "mysql");
        assert_eq!(wizard.form().port, Some(3306));
    }

    #[test]
    fn test_unknown_service_is_not_found() {
        let mut wizard = ConnectionWizard::new();
        let err = wizard.select_by_id("foxpro").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(wizard.step(), WizardStep::Select);
    }

    #[test]
    fn test_back_resets_everything() {
        let mut wizard = configured("postgresql");
        wizard.set(FormField::Host, "db").unwrap();
        wizard.back();

        assert_eq!(wizard.step(), WizardStep::Select);
        assert_eq!(wizard.form(), &ConnectionFormState::default());
        assert!(wizard.descriptor().is_none());
    }

    #[test]
    fn test_select_step_rejects_edits_and_submission() {
        let mut wizard = ConnectionWizard::new();
        assert_eq!(
            wizard.set(FormField::Host, "x").unwrap_err().kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            wizard.build_payload().unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_snowflake_without_private_key_lists_it() {
        let mut wizard = configured("snowflake");
        wizard.set(FormField::Name, "dwh").unwrap();
        wizard.set(FormField::Account, "acme").unwrap();
        wizard.set(FormField::Database, "ANALYTICS").unwrap();
        wizard.set(FormField::Username, "LOADER").unwrap();
        wizard.set(FormField::Password, "pw").unwrap();

        assert_eq!(wizard.missing_fields(), vec!["Private Key"]);
        let err = wizard.build_payload().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.message.as_deref(),
            Some("Please fill in all required fields: Private Key")
        );
    }

    #[test]
    fn test_missing_fields_are_combined_in_display_order() {
        let wizard = configured("postgresql");
        assert_eq!(
            wizard.validate().unwrap_err().message.as_deref(),
            Some("Please fill in all required fields: Connection Name, Host, Database, Username, Password")
        );
    }

    #[test]
    fn test_s3_labels_and_forced_endpoint() {
        let mut wizard = configured("s3");
        assert_eq!(
            wizard.missing_fields(),
            vec!["Connection Name", "Bucket Name", "AWS Access Key", "AWS Secret Key"]
        );

        wizard.set(FormField::Name, "raw").unwrap();
        wizard.set(FormField::Database, "raw-events").unwrap();
        wizard.set(FormField::Username, "AKIA").unwrap();
        wizard.set(FormField::Password, "secret").unwrap();

        let err = wizard.set(FormField::Host, "localhost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            err.message.as_deref(),
            Some("Host cannot be set: S3 connections always use s3.amazonaws.com:443")
        );
        assert!(wizard.set(FormField::Port, "9000").is_err());

        let payload = wizard.build_payload().unwrap();
        assert_eq!(payload.endpoint(), ("s3.amazonaws.com", 443));
    }

    #[test]
    fn test_fields_outside_the_family_are_rejected() {
        let mut wizard = configured("snowflake");
        for (field, value) in [
            (FormField::Host, "db.internal"),
            (FormField::Port, "5432"),
            (FormField::Region, "eu-west-1"),
            (FormField::SslEnabled, "false"),
        ] {
            let err = wizard.set(field, value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(
            wizard
                .set(FormField::Region, "eu-west-1")
                .unwrap_err()
                .message
                .as_deref(),
            Some("Region is not used by Snowflake connections")
        );
        assert!(wizard.form().region.is_empty());
        assert!(wizard.set(FormField::Warehouse, "COMPUTE_WH").is_ok());

        let mut generic = configured("postgresql");
        assert!(generic.set(FormField::Account, "acme").is_err());
        assert!(generic.set(FormField::SslEnabled, "true").is_ok());
    }

    #[test]
    fn test_reselecting_clears_engine_fields() {
        let mut wizard = configured("snowflake");
        wizard.set(FormField::PrivateKey, "pem").unwrap();
        wizard.select_by_id("postgresql").unwrap();
        wizard.select_by_id("snowflake").unwrap();
        assert!(wizard.form().private_key.is_empty());
    }

    #[test]
    fn test_edit_mode_prefills_and_relaxes_secrets() {
        let connection: Connection = serde_json::from_value(json!({
            "id": 12,
            "name": "dwh",
            "connection_type": "snowflake",
            "host": "acme",
            "port": 443,
            "database": "ANALYTICS",
            "username": "LOADER",
            "warehouse": "COMPUTE_WH"
        }))
        .unwrap();

        let wizard = ConnectionWizard::edit(&connection);
        assert_eq!(wizard.step(), WizardStep::Configure);
        assert_eq!(wizard.mode(), SubmitMode::Edit);
        assert_eq!(wizard.form().account, "acme");
        assert_eq!(wizard.form().warehouse, "COMPUTE_WH");
        assert!(wizard.missing_fields().is_empty());

        let value = serde_json::to_value(wizard.build_payload().unwrap()).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("private_key").is_none());
    }

    #[test]
    fn test_status_transitions() {
        let mut wizard = configured("postgresql");
        wizard.begin_test();
        assert_eq!(wizard.status(), &TestStatus::Testing);

        wizard.finish_test::<Error>(Ok(ConnectionTestResult::failure("no route to host")));
        assert_eq!(
            wizard.status(),
            &TestStatus::Error("no route to host".to_owned())
        );

        wizard.finish_test(Err(Error::timeout().with_message("took too long")));
        assert!(matches!(wizard.status(), TestStatus::Error(m) if m.contains("took too long")));

        wizard.finish_test::<Error>(Ok(ConnectionTestResult {
            success: true,
            ..Default::default()
        }));
        assert_eq!(
            wizard.status(),
            &TestStatus::Success("Connection successful".to_owned())
        );
    }

    #[test]
    fn test_cancel_leaves_edit_mode() {
        let connection: Connection =
            serde_json::from_value(json!({"id": 1, "name": "a", "connection_type": "mysql"}))
                .unwrap();
        let mut wizard = ConnectionWizard::edit(&connection);
        wizard.cancel();
        assert!(wizard.editing().is_none());
        assert_eq!(wizard.step(), WizardStep::Select);
    }
}
