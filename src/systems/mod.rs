pub mod animals;
pub mod colonists;
pub mod nodes;
pub mod story;
pub mod structures;
pub mod world_events;

pub use animals::AnimalSystem;
pub use colonists::ColonistSystem;
pub use nodes::RegrowthSystem;
pub use story::StorySystem;
pub use structures::ProductionSystem;
pub use world_events::WorldEventSystem;
