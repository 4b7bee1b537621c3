//! Wayfarer: headless third-person locomotion and branching dialogue
//!
//! The library exposes the player controller, the dialogue runtime and a
//! rapier-backed scene so they can be driven from the CLI or from tests.

pub mod config;
pub mod game;
