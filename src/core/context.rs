//! Execution context: the handle a fixture program receives for one run.
//!
//! The context owns the run's configuration, forwards resource-creation calls
//! to the provider, and collects registered resources, exported outputs,
//! provenance events, and report lines for the executor to persist.

use super::config::{Config, ConfigStore};
use super::types::*;
use crate::error::{Result, StackError};
use crate::provenance::eventlog;
use crate::resources::Provider;
use indexmap::IndexMap;
use std::time::Instant;

/// Everything a finished (or failed) run produced.
#[derive(Debug, Clone, Default)]
pub struct RunRecord {
    pub resources: IndexMap<String, ResourceState>,
    pub outputs: IndexMap<String, OutputValue>,
    pub events: Vec<ProvenanceEvent>,
    pub report: Vec<String>,
}

pub struct Context<'p> {
    project: String,
    stack: String,
    config: ConfigStore,
    provider: &'p dyn Provider,
    dry_run: bool,
    record: RunRecord,
}

impl<'p> Context<'p> {
    pub fn new(
        project: &str,
        stack: &str,
        config: ConfigStore,
        provider: &'p dyn Provider,
        dry_run: bool,
    ) -> Self {
        Self {
            project: project.to_string(),
            stack: stack.to_string(),
            config,
            provider,
            dry_run,
            record: RunRecord::default(),
        }
    }

    /// Configuration in the project namespace.
    pub fn config(&self) -> Config<'_> {
        Config::new(&self.config, &self.project)
    }

    /// Register one resource. In preview the provider only checks the
    /// arguments; otherwise it creates the resource. Provider errors come
    /// back as `StackError::Provisioning` carrying the provider's message.
    pub fn register_resource(
        &mut self,
        name: &str,
        args: impl Into<ResourceArgs>,
    ) -> Result<ResourceState> {
        let args = args.into();
        let resource_type = args.resource_type();
        let urn = resource_urn(&self.stack, &self.project, resource_type, name);
        if self.record.resources.contains_key(&urn) {
            return Err(StackError::DuplicateResource(urn));
        }
        tracing::debug!(%urn, dry_run = self.dry_run, "registering resource");

        let state = if self.dry_run {
            self.provider
                .check(&args)
                .map_err(|message| self.fail(&urn, message))?;
            self.record.events.push(ProvenanceEvent::ResourceChecked {
                stack: self.stack.clone(),
                urn: urn.clone(),
            });
            self.record
                .report
                .push(format!("+ {} {} create", resource_type, name));
            ResourceState {
                urn: urn.clone(),
                resource_type,
                name: name.to_string(),
                id: String::new(),
                inputs: args.to_inputs(),
                outputs: IndexMap::new(),
                created_at: None,
            }
        } else {
            let start = Instant::now();
            let created = self
                .provider
                .create(name, &args)
                .map_err(|message| self.fail(&urn, message))?;
            let duration = start.elapsed().as_secs_f64();
            self.record.events.push(ProvenanceEvent::ResourceCreated {
                stack: self.stack.clone(),
                urn: urn.clone(),
                id: created.id.clone(),
                duration_seconds: duration,
            });
            self.record
                .report
                .push(format!("+ {} {} created ({:.2}s)", resource_type, name, duration));
            tracing::info!(%urn, id = %created.id, "resource created");
            ResourceState {
                urn: urn.clone(),
                resource_type,
                name: name.to_string(),
                id: created.id,
                inputs: args.to_inputs(),
                outputs: created.outputs,
                created_at: Some(eventlog::now_iso8601()),
            }
        };

        self.record.resources.insert(urn, state.clone());
        Ok(state)
    }

    /// Shorthand for registering a `RandomPet`.
    pub fn random_pet(&mut self, name: &str, args: RandomPetArgs) -> Result<ResourceState> {
        self.register_resource(name, args)
    }

    /// Shorthand for registering a `RandomString`.
    pub fn random_string(&mut self, name: &str, args: RandomStringArgs) -> Result<ResourceState> {
        self.register_resource(name, args)
    }

    fn fail(&mut self, urn: &str, message: String) -> StackError {
        tracing::warn!(%urn, %message, "provisioning failed");
        self.record.events.push(ProvenanceEvent::ResourceFailed {
            stack: self.stack.clone(),
            urn: urn.to_string(),
            error: message.clone(),
        });
        StackError::Provisioning {
            urn: urn.to_string(),
            message,
        }
    }

    /// Export a resource's id; unknown until the resource exists.
    pub fn export_id(&mut self, key: &str, resource: &ResourceState) -> Result<()> {
        let output = if resource.id.is_empty() {
            OutputValue::unknown()
        } else {
            OutputValue::new(resource.id.clone().into())
        };
        self.insert_output(key, output)
    }

    /// Export one of a resource's provider outputs; unknown until computed.
    pub fn export_output(&mut self, key: &str, resource: &ResourceState, output: &str) -> Result<()> {
        self.insert_output(key, resource_output(resource, output))
    }

    /// Like `export_output`, but the value is masked in reports and
    /// published as a secret.
    pub fn export_secret_output(
        &mut self,
        key: &str,
        resource: &ResourceState,
        output: &str,
    ) -> Result<()> {
        let value = OutputValue {
            secret: true,
            ..resource_output(resource, output)
        };
        self.insert_output(key, value)
    }

    fn insert_output(&mut self, key: &str, value: OutputValue) -> Result<()> {
        if self.record.outputs.contains_key(key) {
            return Err(StackError::DuplicateOutput(key.to_string()));
        }
        self.record.events.push(ProvenanceEvent::OutputExported {
            stack: self.stack.clone(),
            key: key.to_string(),
            secret: value.secret,
        });
        self.record.outputs.insert(key.to_string(), value);
        Ok(())
    }

    /// Diagnostic message from the program; surfaces at debug level.
    pub fn debug(&self, message: &str) {
        tracing::debug!(stack = %self.stack, "{}", message);
    }

    /// Hand the collected record to the caller.
    pub fn finish(self) -> RunRecord {
        self.record
    }
}

fn resource_output(resource: &ResourceState, output: &str) -> OutputValue {
    match resource.outputs.get(output) {
        Some(v) => OutputValue::new(v.clone()),
        None => OutputValue::unknown(),
    }
}
