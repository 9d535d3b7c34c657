use std::cell::Cell;
use std::rc::Rc;

use log::{debug, warn};

use super::scale::proportion_for_width;
use super::simulation::Viewport;
use super::types::{GraphNode, NodeKind};
use crate::graph::{
	GraphConfiguration, GraphController, Person, RebuildTrigger, Result, TriggerOutcome,
};

/// Pointer distance, in graph units, that still hits a node.
pub const HIT_RADIUS: f64 = 12.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

/// Pan and zoom applied before drawing.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	/// Horizontal offset.
	pub x: f64,
	/// Vertical offset.
	pub y: f64,
	/// Zoom factor.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Node drag in progress, if any.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// Id of the node being dragged.
	pub node: Option<String>,
	/// Owning person of the dragged node, for label focus.
	pub person: Option<String>,
}

/// Background drag in progress.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// Whether a pan is running.
	pub active: bool,
	/// Screen x where the pan started.
	pub start_x: f64,
	/// Screen y where the pan started.
	pub start_y: f64,
	/// Transform x when the pan started.
	pub transform_start_x: f64,
	/// Transform y when the pan started.
	pub transform_start_y: f64,
}

/// Everything the canvas needs between frames.
pub struct ForceGraphState {
	/// Graph, inputs and live simulation.
	pub controller: GraphController,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// Node drag.
	pub drag: DragState,
	/// Background pan.
	pub pan: PanState,
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
	dirty: Rc<Cell<bool>>,
	/// Last population handed in, kept even when its build failed.
	latest_persons: Vec<Person>,
}

impl ForceGraphState {
	/// Build the first graph for a `width` x `height` canvas.
	pub fn new(
		persons: Vec<Person>,
		config: GraphConfiguration,
		attributes: Vec<String>,
		width: f64,
		height: f64,
	) -> Result<Self> {
		let viewport = Viewport::new(width, height)?;
		let controller =
			GraphController::new(attributes, config, proportion_for_width(width), viewport)?;
		let mut state = Self {
			controller,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			dirty: Rc::new(Cell::new(true)),
			latest_persons: Vec::new(),
		};
		// a failed first build leaves an empty graph that later triggers can fill
		if let Err(err) = state.apply(RebuildTrigger::Profiles(persons)) {
			warn!("Initial graph not built: {}", err);
		}
		Ok(state)
	}

	/// Forward a change to the controller and follow the new simulation.
	pub fn apply(&mut self, trigger: RebuildTrigger) -> Result<TriggerOutcome> {
		let retry = match &trigger {
			RebuildTrigger::Profiles(persons) => {
				self.latest_persons = persons.clone();
				false
			}
			RebuildTrigger::Configuration(_) | RebuildTrigger::Proportion(_) => true,
			RebuildTrigger::Viewport(_) => false,
		};
		let mut outcome = self.controller.on_trigger_change(trigger)?;
		if retry
			&& outcome == TriggerOutcome::Deferred
			&& self.controller.persons().is_empty()
			&& !self.latest_persons.is_empty()
		{
			let persons = self.latest_persons.clone();
			outcome = self.controller.on_trigger_change(RebuildTrigger::Profiles(persons))?;
		}
		if outcome == TriggerOutcome::Rebuilt {
			self.drag = DragState::default();
			let dirty = self.dirty.clone();
			if let Some(simulation) = self.controller.simulation_mut() {
				simulation.on_tick(move |_| dirty.set(true));
			}
		}
		self.mark_dirty();
		Ok(outcome)
	}

	/// Whether labels are drawn.
	pub fn show_names(&self) -> bool {
		self.controller.config().show_names
	}

	/// Request a redraw on the next frame.
	pub fn mark_dirty(&self) {
		self.dirty.set(true);
	}

	/// Whether anything changed since the last call.
	pub fn take_dirty(&self) -> bool {
		self.dirty.replace(false)
	}

	/// Undo the view transform.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Closest node centre within the hit radius.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<&GraphNode> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let simulation = self.controller.simulation()?;
		self.controller
			.data()
			.nodes
			.iter()
			.zip(simulation.nodes())
			.map(|(node, sim)| (node, (sim.x() - gx).hypot(sim.y() - gy)))
			.filter(|(_, d)| *d < HIT_RADIUS)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(node, _)| node)
	}

	/// Pin node `id` and start following the pointer.
	pub fn begin_drag(&mut self, id: &str) {
		let person = self.controller.data().node(id).map(|node| match node.kind {
			NodeKind::Person => node.id.clone(),
			NodeKind::Attribute => node
				.person_id
				.map(|p| p.to_string())
				.unwrap_or_else(|| node.id.clone()),
		});
		let Some(simulation) = self.controller.simulation_mut() else {
			return;
		};
		if let Err(err) = simulation.drag_start(id) {
			warn!("Drag start ignored: {}", err);
			return;
		}
		debug!("Dragging {}", id);
		self.drag.node = Some(id.to_string());
		self.drag.person = person;
		self.mark_dirty();
	}

	/// Move the dragged node to screen point `(sx, sy)`.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let (Some(id), Some(simulation)) = (&self.drag.node, self.controller.simulation_mut())
		else {
			return;
		};
		if let Err(err) = simulation.drag_move(id, gx, gy) {
			warn!("Drag move ignored: {}", err);
		}
	}

	/// Release the dragged node.
	pub fn end_drag(&mut self) {
		let Some(id) = self.drag.node.take() else {
			return;
		};
		self.drag.person = None;
		if let Some(simulation) = self.controller.simulation_mut() {
			if let Err(err) = simulation.drag_end(&id) {
				warn!("Drag end ignored: {}", err);
			}
		}
		self.mark_dirty();
	}

	/// Whether a node is being dragged.
	pub fn is_dragging(&self) -> bool {
		self.drag.node.is_some()
	}

	/// Whether a node's label is shown while a drag is in progress.
	pub fn is_focused(&self, node: &GraphNode) -> bool {
		let Some(person) = &self.drag.person else {
			return false;
		};
		self.drag.node.as_deref() == Some(node.id.as_str())
			|| node.person_id.is_some_and(|p| p.to_string() == *person)
	}

	/// Start panning from screen point `(sx, sy)`.
	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Follow the pointer while panning.
	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		self.mark_dirty();
	}

	/// Drop any drag or pan in progress.
	pub fn release(&mut self) {
		self.end_drag();
		self.pan.active = false;
	}

	/// Zoom by one wheel notch, keeping the graph point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = k;
		self.mark_dirty();
	}

	/// Advance the simulation one step while it is running.
	pub fn tick(&mut self) {
		if let Some(simulation) = self.controller.simulation_mut() {
			if simulation.is_running() {
				simulation.tick();
			}
		}
	}

	/// New canvas size: rebuild if the density breakpoint changed, then
	/// re-centre the simulation.
	pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
		self.width = width;
		self.height = height;
		let proportion = proportion_for_width(width);
		if proportion != self.controller.proportion() {
			self.apply(RebuildTrigger::Proportion(proportion))?;
		}
		self.apply(RebuildTrigger::Viewport(Viewport::new(width, height)?))?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{PERSON_QUALITIES, ProfileStore};

	fn state() -> ForceGraphState {
		let attributes: Vec<String> = PERSON_QUALITIES.iter().map(|q| q.to_string()).collect();
		let mut store = ProfileStore::with_default_qualities(5, 70.0, 200.0);
		let persons = store.resize(4, 70.0, &attributes).to_vec();
		ForceGraphState::new(persons, GraphConfiguration::default(), attributes, 1200.0, 800.0)
			.unwrap()
	}

	#[test]
	fn recovers_after_a_failed_first_build() {
		let attributes: Vec<String> = PERSON_QUALITIES.iter().map(|q| q.to_string()).collect();
		let mut store = ProfileStore::with_default_qualities(5, 70.0, 200.0);
		let persons = store.resize(4, 70.0, &attributes).to_vec();
		let missing = GraphConfiguration {
			id_person_selected: 99,
			..Default::default()
		};
		let mut s = ForceGraphState::new(persons, missing, attributes, 1200.0, 800.0).unwrap();
		assert!(s.controller.simulation().is_none());

		let outcome = s
			.apply(RebuildTrigger::Configuration(GraphConfiguration::default()))
			.unwrap();
		assert_eq!(outcome, TriggerOutcome::Rebuilt);
		assert_eq!(s.controller.persons().len(), 4);
		assert!(s.controller.simulation().is_some());
	}

	#[test]
	fn ticks_mark_the_frame_dirty() {
		let mut s = state();
		assert!(s.take_dirty());
		assert!(!s.take_dirty());
		s.tick();
		assert!(s.take_dirty());
	}

	#[test]
	fn hit_test_finds_node_under_cursor() {
		let s = state();
		let (x, y) = s.controller.simulation().unwrap().position("0").unwrap();
		assert!(s.node_at_position(x, y).is_some());
		assert!(s.node_at_position(-500.0, -500.0).is_none());
	}

	#[test]
	fn drag_focuses_the_owner_and_releases() {
		let mut s = state();
		s.begin_drag("1");
		assert!(s.is_dragging());
		let satellite = s.controller.data().node("1_strength").cloned().unwrap();
		assert!(s.is_focused(&satellite));
		s.drag_to(30.0, 40.0);
		s.end_drag();
		assert!(!s.is_dragging());
		assert!(!s.is_focused(&satellite));
	}

	#[test]
	fn pan_moves_the_transform() {
		let mut s = state();
		s.begin_pan(100.0, 100.0);
		s.pan_to(130.0, 80.0);
		assert_eq!((s.transform.x, s.transform.y), (30.0, -20.0));
		s.release();
		s.pan_to(0.0, 0.0);
		assert_eq!((s.transform.x, s.transform.y), (30.0, -20.0));
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut s = state();
		let before = s.screen_to_graph(300.0, 200.0);
		s.zoom_at(300.0, 200.0, true);
		let after = s.screen_to_graph(300.0, 200.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
		for _ in 0..100 {
			s.zoom_at(0.0, 0.0, true);
		}
		assert_eq!(s.transform.k, MAX_ZOOM);
	}

	#[test]
	fn resize_across_a_breakpoint_rebuilds() {
		let mut s = state();
		let generation = s.controller.generation();
		s.resize(500.0, 400.0).unwrap();
		assert_eq!(s.controller.proportion(), 0.5);
		assert_eq!(s.controller.generation(), generation + 1);
		assert_eq!(s.controller.simulation().unwrap().viewport().width, 500.0);
	}
}
