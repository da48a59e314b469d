//! Fixture programs: one resource-provisioning attempt each.
//!
//! | fixture        | config | resource                               | export    |
//! |----------------|--------|----------------------------------------|-----------|
//! | `random-pet`   | none   | RandomPet `my-user-name`               | none      |
//! | `pet-name`     | none   | RandomPet `pet`                        | `pet-name`|
//! | `named-string` | `name` | RandomString named by `name`, 60 chars | `name`    |
//!
//! `named-string` exports `name` as a secret when its `name` config is secret.
//! | `long-pet`     | none   | RandomPet `pet`, three words           | `petName` |

use crate::core::context::Context;
use crate::core::types::{RandomPetArgs, RandomStringArgs};
use crate::error::Result;

/// A fixture program.
pub type Program = fn(&mut Context<'_>) -> Result<()>;

/// A named fixture with its declared contract.
#[derive(Clone, Copy)]
pub struct Fixture {
    pub name: &'static str,
    pub description: &'static str,
    /// Config key the fixture requires, if any
    pub requires: Option<&'static str>,
    /// Output key the fixture exports, if any
    pub exports: Option<&'static str>,
    pub program: Program,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "random-pet",
        description: "create a random pet; export nothing",
        requires: None,
        exports: None,
        program: random_pet,
    },
    Fixture {
        name: "pet-name",
        description: "create a random pet; export its id",
        requires: None,
        exports: Some("pet-name"),
        program: pet_name,
    },
    Fixture {
        name: "named-string",
        description: "create a 60-character random string named by config",
        requires: Some("name"),
        exports: Some("name"),
        program: named_string,
    },
    Fixture {
        name: "long-pet",
        description: "create a three-word random pet; export its id",
        requires: None,
        exports: Some("petName"),
        program: long_pet,
    },
];

/// Every registered fixture, in declaration order.
pub fn all() -> &'static [Fixture] {
    FIXTURES
}

pub fn find(name: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|f| f.name == name)
}

pub fn names() -> Vec<&'static str> {
    FIXTURES.iter().map(|f| f.name).collect()
}

fn random_pet(ctx: &mut Context<'_>) -> Result<()> {
    ctx.random_pet("my-user-name", RandomPetArgs::default())?;
    Ok(())
}

fn pet_name(ctx: &mut Context<'_>) -> Result<()> {
    let pet = ctx.random_pet("pet", RandomPetArgs::default())?;
    ctx.export_id("pet-name", &pet)
}

fn named_string(ctx: &mut Context<'_>) -> Result<()> {
    let config = ctx.config();
    let name = config.require("name")?.to_string();
    let secret = config.is_secret("name");
    let generated = ctx.random_string(&name, RandomStringArgs::with_length(60))?;
    ctx.debug("I'm a random string");
    if secret {
        ctx.export_secret_output("name", &generated, "result")
    } else {
        ctx.export_output("name", &generated, "result")
    }
}

fn long_pet(ctx: &mut Context<'_>) -> Result<()> {
    let args = RandomPetArgs {
        length: Some(3),
        ..Default::default()
    };
    let pet = ctx.random_pet("pet", args)?;
    ctx.export_id("petName", &pet)
}
