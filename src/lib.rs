pub mod catalog;
pub mod commands;
pub mod components;
pub mod engine;
pub mod expedition;
pub mod grid;
pub mod journal;
pub mod orders;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use commands::{ColonistOrder, CommandError, PlayerCommand};
pub use engine::{Engine, EngineBuilder, EngineSettings, TickReport};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{World, WorldSnapshot};
