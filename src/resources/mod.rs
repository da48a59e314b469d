//! Providers: the black-box contract behind every resource-creation call.
//!
//! A provider:
//! 1. `check`s arguments without side effects (used by preview)
//! 2. `create`s a resource and returns its id and outputs
//! 3. `read`s a recorded resource back (used by refresh)
//! 4. `delete`s a recorded resource (used by destroy)

pub mod random_pet;
pub mod random_string;

use crate::core::types::{ResourceArgs, ResourceState, ResourceType};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;

/// What a provider hands back for a created or read resource.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResult {
    pub id: String,
    pub outputs: IndexMap<String, serde_json::Value>,
}

/// Resource provider. Errors are plain messages; the runtime attaches the
/// resource URN when it surfaces them.
pub trait Provider {
    /// Package name, e.g. `random`.
    fn name(&self) -> &str;

    fn check(&self, args: &ResourceArgs) -> Result<(), String>;

    fn create(&self, name: &str, args: &ResourceArgs) -> Result<CreateResult, String>;

    fn read(&self, state: &ResourceState) -> Result<CreateResult, String>;

    fn delete(&self, state: &ResourceState) -> Result<(), String>;
}

/// In-process `random` provider. Seeded instances are deterministic.
pub struct RandomProvider {
    rng: RefCell<StdRng>,
}

impl RandomProvider {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for RandomProvider {
    fn name(&self) -> &str {
        "random"
    }

    fn check(&self, args: &ResourceArgs) -> Result<(), String> {
        match args {
            ResourceArgs::RandomPet(a) => random_pet::check(a),
            ResourceArgs::RandomString(a) => random_string::check(a),
        }
    }

    fn create(&self, name: &str, args: &ResourceArgs) -> Result<CreateResult, String> {
        self.check(args)?;
        let mut rng = self.rng.borrow_mut();
        let mut outputs: IndexMap<String, serde_json::Value> = IndexMap::new();
        let id = match args {
            ResourceArgs::RandomPet(a) => {
                let pet = random_pet::generate(a, &mut *rng);
                outputs.insert("length".to_string(), a.effective_length().into());
                outputs.insert("separator".to_string(), a.effective_separator().into());
                pet
            }
            ResourceArgs::RandomString(a) => {
                let result = random_string::generate(a, &mut *rng);
                outputs.insert("length".to_string(), a.length.into());
                outputs.insert("result".to_string(), result.clone().into());
                result
            }
        };
        outputs.insert("id".to_string(), id.clone().into());
        tracing::debug!(resource = name, provider = self.name(), "generated value");
        Ok(CreateResult { id, outputs })
    }

    fn read(&self, state: &ResourceState) -> Result<CreateResult, String> {
        if state.id.is_empty() {
            return Err(format!("{} has no id recorded", state.urn));
        }
        if state.resource_type == ResourceType::RandomString
            && state.output_str("result").is_none()
        {
            return Err(format!("{} has no result recorded", state.urn));
        }
        Ok(CreateResult {
            id: state.id.clone(),
            outputs: state.outputs.clone(),
        })
    }

    fn delete(&self, _state: &ResourceState) -> Result<(), String> {
        Ok(())
    }
}
