mod ai;
mod collision;
mod components;
mod config;
mod marks;
mod path;
mod raycast;
mod sight;
mod step;

pub use components::{Body, Buttons, Guard, GuardState, Heading, Position};
pub use config::Tuning;
pub use marks::{Mark, MarkBuf, MarkKind};
pub use path::find_path;
pub use raycast::cast_ray;
pub use sight::{SightMap, compute_visible};
pub use step::Sim;
