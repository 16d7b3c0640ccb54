mod events;
mod resources;
mod systems;

pub use self::events::{Event, EventQueue, OperationOutcome, Priority};
pub use self::resources::{Resource, ResourceAmount};
pub use self::systems::{System, SystemRunner, SystemStatus};
