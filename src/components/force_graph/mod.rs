//! Force-directed attraction graph drawn on a canvas.

mod component;
mod render;
/// Viewport size breakpoints.
pub mod scale;
mod simulation;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use simulation::{
	ALPHA_MIN, DRAG_ALPHA_TARGET, Force, LINK_DISTANCE_PROPORTION, LinkGeometry, ListenerId, Pin,
	SimNode, Simulation, SimulationSlot, SimulationState, TickFrame, VELOCITY_DECAY, Viewport,
};
pub use state::ForceGraphState;
pub use types::{GraphData, GraphLink, GraphNode, NodeKind};
