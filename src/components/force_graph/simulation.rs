//! Force layout over built graph data.
//!
//! Velocity-Verlet style integration with a cooling `alpha`, a spring force
//! along links, pairwise repulsion, a centring translation and a per-tick
//! pin for caller-selected nodes. Node state lives in an index-addressed
//! arena that only this module mutates; renderers read through `&Simulation`
//! or through [`TickFrame`] in tick listeners.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, info, warn};

use super::types::GraphData;
use crate::graph::{GraphError, Result};

/// Alpha below which a simulation settles.
pub const ALPHA_MIN: f64 = 0.001;
/// Fraction of velocity lost per tick.
pub const VELOCITY_DECAY: f64 = 0.4;
/// `alphaTarget` while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.05;
/// Multiplier applied to every link's `distance`.
pub const LINK_DISTANCE_PROPORTION: f64 = 1.0;

const INITIAL_RADIUS: f64 = 10.0;
const DISTANCE_MIN2: f64 = 1.0;

fn alpha_decay() -> f64 {
	1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

/// Layout bounds. Node positions are clamped into `[0, width] x [0, height]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Width in graph units.
	pub width: f64,
	/// Height in graph units.
	pub height: f64,
}

impl Viewport {
	/// Rejects non-finite and non-positive sizes.
	pub fn new(width: f64, height: f64) -> Result<Self> {
		if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
			return Err(GraphError::InvalidViewport { width, height });
		}
		Ok(Self { width, height })
	}

	/// Centre point.
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
		(x.clamp(0.0, self.width), y.clamp(0.0, self.height))
	}
}

/// Whether a node follows the simulation or is held in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pin {
	/// Moved by forces.
	Free,
	/// Held at a fixed point, velocity zeroed every tick.
	Pinned {
		/// Pinned x.
		x: f64,
		/// Pinned y.
		y: f64,
	},
}

/// Position, velocity and pin state of one node.
#[derive(Clone, Debug)]
pub struct SimNode {
	id: String,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	pin: Pin,
}

impl SimNode {
	/// Id of the graph node this tracks.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Current x.
	pub fn x(&self) -> f64 {
		self.x
	}

	/// Current y.
	pub fn y(&self) -> f64 {
		self.y
	}

	/// Whether the node is held in place.
	pub fn pin(&self) -> Pin {
		self.pin
	}
}

#[derive(Clone, Debug)]
struct SimLink {
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	bias: f64,
}

/// Endpoint coordinates of a link after the latest tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkGeometry {
	/// Source x.
	pub x1: f64,
	/// Source y.
	pub y1: f64,
	/// Target x.
	pub x2: f64,
	/// Target y.
	pub y2: f64,
}

/// Read-only view handed to tick listeners.
pub struct TickFrame<'a> {
	/// Nodes in build order.
	pub nodes: &'a [SimNode],
	/// Link endpoints in build order.
	pub links: &'a [LinkGeometry],
	/// Alpha after this tick.
	pub alpha: f64,
}

/// Lifecycle of a [`Simulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
	/// Created, never restarted.
	Idle,
	/// Alpha is cooling towards the target.
	Running,
	/// Alpha and target are both below [`ALPHA_MIN`].
	Settled,
	/// Listeners are gone and ticks are no-ops.
	Disposed,
}

/// Force parameters addressable by name.
#[derive(Clone, Debug, PartialEq)]
pub enum Force {
	/// Springs along every link.
	Link {
		/// Multiplier on each link's rest length.
		distance_proportion: f64,
	},
	/// Pairwise many-body force, negative repels.
	Charge {
		/// Charge per node.
		strength: f64,
	},
	/// Translates the mean position onto a point.
	Center {
		/// Target x.
		x: f64,
		/// Target y.
		y: f64,
	},
	/// Nodes pinned to the viewport centre on every tick.
	Attract {
		/// Ids of the pinned nodes.
		selected: Vec<String>,
	},
}

impl Force {
	/// Name under which the force is registered.
	pub fn name(&self) -> &'static str {
		match self {
			Force::Link { .. } => "link",
			Force::Charge { .. } => "charge",
			Force::Center { .. } => "center",
			Force::Attract { .. } => "attract",
		}
	}
}

#[derive(Clone, Debug)]
struct Forces {
	link_distance_proportion: f64,
	charge: f64,
	center: (f64, f64),
	attract: Vec<usize>,
}

/// Replaces `Math.random` jitter with a reproducible sequence.
#[derive(Clone, Debug, Default)]
struct Jiggle(u64);

impl Jiggle {
	fn next(&mut self) -> f64 {
		self.0 = (self.0 * 9301 + 49297) % 233_280;
		(self.0 as f64 / 233_280.0 - 0.5) * 1e-6
	}
}

/// Handle returned by [`Simulation::on_tick`].
pub type ListenerId = usize;
type TickListener = Box<dyn FnMut(&TickFrame<'_>)>;

/// A running force layout over one built graph.
pub struct Simulation {
	nodes: Vec<SimNode>,
	index: HashMap<String, usize>,
	links: Vec<SimLink>,
	geometry: Vec<LinkGeometry>,
	forces: Forces,
	viewport: Viewport,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	state: SimulationState,
	jiggle: Jiggle,
	drag_origin: HashMap<String, (f64, f64)>,
	listeners: Vec<(ListenerId, TickListener)>,
	next_listener: ListenerId,
}

impl Simulation {
	/// Seed nodes on a phyllotaxis spiral around the viewport centre.
	pub fn new(data: &GraphData, viewport: Viewport, strength: f64) -> Self {
		let (cx, cy) = viewport.center();
		let initial_angle = PI * (3.0 - 5f64.sqrt());
		let nodes: Vec<SimNode> = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * initial_angle;
				let (x, y) = viewport.clamp(cx + radius * angle.cos(), cy + radius * angle.sin());
				SimNode {
					id: node.id.clone(),
					x,
					y,
					vx: 0.0,
					vy: 0.0,
					pin: Pin::Free,
				}
			})
			.collect();
		let index: HashMap<String, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();

		let mut links: Vec<SimLink> = data
			.links
			.iter()
			.filter_map(|link| {
				match (index.get(&link.source), index.get(&link.target)) {
					(Some(&source), Some(&target)) => Some(SimLink {
						source,
						target,
						distance: link.distance,
						strength: 0.0,
						bias: 0.0,
					}),
					_ => {
						warn!("Dropping link {} -> {}: unknown endpoint", link.source, link.target);
						None
					}
				}
			})
			.collect();

		let mut degree = vec![0usize; nodes.len()];
		for link in &links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		for link in &mut links {
			let (s, t) = (degree[link.source] as f64, degree[link.target] as f64);
			link.bias = s / (s + t);
			link.strength = 1.0 / s.min(t);
		}

		let mut simulation = Self {
			geometry: vec![LinkGeometry::default(); links.len()],
			nodes,
			index,
			links,
			forces: Forces {
				link_distance_proportion: LINK_DISTANCE_PROPORTION,
				charge: -strength,
				center: (cx, cy),
				attract: Vec::new(),
			},
			viewport,
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: alpha_decay(),
			state: SimulationState::Idle,
			jiggle: Jiggle::default(),
			drag_origin: HashMap::new(),
			listeners: Vec::new(),
			next_listener: 0,
		};
		simulation.update_geometry();
		simulation
	}

	/// Lifecycle state.
	pub fn state(&self) -> SimulationState {
		self.state
	}

	/// Whether ticks still move nodes.
	pub fn is_running(&self) -> bool {
		self.state == SimulationState::Running
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Energy the simulation cools towards.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Bounds nodes are clamped to.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Nodes in build order.
	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&SimNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Current `(x, y)` of a node.
	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		self.node(id).map(|n| (n.x, n.y))
	}

	/// Link endpoints as of the last tick.
	pub fn link_geometry(&self) -> &[LinkGeometry] {
		&self.geometry
	}

	/// Visit both endpoints of every link.
	pub fn visit_links(&self, mut f: impl FnMut(&SimNode, &SimNode)) {
		for link in &self.links {
			f(&self.nodes[link.source], &self.nodes[link.target]);
		}
	}

	/// Set `alpha` and (re)enter the running state.
	pub fn restart(&mut self, alpha: f64) {
		if self.state == SimulationState::Disposed {
			return;
		}
		self.alpha = alpha;
		self.state = SimulationState::Running;
	}

	/// Set the energy to cool towards. Does not restart.
	pub fn set_alpha_target(&mut self, alpha_target: f64) {
		self.alpha_target = alpha_target;
	}

	/// Replace one force. Unknown ids in [`Force::Attract`] are an error.
	pub fn set_force(&mut self, force: Force) -> Result<()> {
		debug!("Setting {} force", force.name());
		match force {
			Force::Link {
				distance_proportion,
			} => self.forces.link_distance_proportion = distance_proportion,
			Force::Charge { strength } => self.forces.charge = strength,
			Force::Center { x, y } => self.forces.center = (x, y),
			Force::Attract { selected } => {
				self.forces.attract = selected
					.iter()
					.map(|id| self.index_of(id))
					.collect::<Result<_>>()?;
			}
		}
		Ok(())
	}

	/// Call `listener` after every tick until [`Simulation::off_tick`] or disposal.
	pub fn on_tick(&mut self, listener: impl FnMut(&TickFrame<'_>) + 'static) -> ListenerId {
		let id = self.next_listener;
		self.next_listener += 1;
		self.listeners.push((id, Box::new(listener)));
		id
	}

	/// Remove a listener. Returns whether it was registered.
	pub fn off_tick(&mut self, id: ListenerId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(lid, _)| *lid != id);
		self.listeners.len() != before
	}

	/// Drop every listener and stop for good.
	pub fn dispose(&mut self) {
		self.listeners.clear();
		self.state = SimulationState::Disposed;
	}

	/// New viewport: re-centre and re-settle from `alpha = 1`.
	pub fn resize(&mut self, viewport: Viewport) {
		debug!("Resizing simulation to {}x{}", viewport.width, viewport.height);
		self.viewport = viewport;
		self.forces.center = viewport.center();
		self.restart(1.0);
	}

	/// Advance one step. Returns whether the simulation is still running.
	pub fn tick(&mut self) -> bool {
		if self.state != SimulationState::Running {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		self.apply_link_force();
		self.apply_attract_force();
		self.apply_charge_force();
		self.apply_center_force();

		let retain = 1.0 - VELOCITY_DECAY;
		for node in &mut self.nodes {
			match node.pin {
				Pin::Pinned { x, y } => {
					(node.x, node.y) = (x, y);
					(node.vx, node.vy) = (0.0, 0.0);
				}
				Pin::Free => {
					node.vx *= retain;
					node.vy *= retain;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
			(node.x, node.y) = self.viewport.clamp(node.x, node.y);
		}
		self.update_geometry();

		let frame = TickFrame {
			nodes: &self.nodes,
			links: &self.geometry,
			alpha: self.alpha,
		};
		for (_, listener) in &mut self.listeners {
			listener(&frame);
		}

		if self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN {
			info!("Simulation settled");
			self.state = SimulationState::Settled;
		}
		self.is_running()
	}

	/// Tick until settled or `max_ticks` is reached; returns ticks run.
	pub fn run(&mut self, max_ticks: usize) -> usize {
		let mut ticks = 0;
		while ticks < max_ticks && self.tick() {
			ticks += 1;
		}
		ticks
	}

	/// Pin the node where it is and keep the simulation warm.
	pub fn drag_start(&mut self, id: &str) -> Result<()> {
		let i = self.index_of(id)?;
		self.set_alpha_target(DRAG_ALPHA_TARGET);
		self.restart(self.alpha);
		let node = &mut self.nodes[i];
		node.pin = Pin::Pinned {
			x: node.x,
			y: node.y,
		};
		self.drag_origin.insert(node.id.clone(), (node.x, node.y));
		Ok(())
	}

	/// Move the pin of a dragged node.
	pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
		let i = self.index_of(id)?;
		self.nodes[i].pin = Pin::Pinned { x, y };
		Ok(())
	}

	/// Unpin and snap back to the position recorded at drag start.
	pub fn drag_end(&mut self, id: &str) -> Result<()> {
		let i = self.index_of(id)?;
		self.set_alpha_target(0.0);
		let node = &mut self.nodes[i];
		node.pin = Pin::Free;
		if let Some((x, y)) = self.drag_origin.remove(id) {
			(node.x, node.y) = (x, y);
		}
		Ok(())
	}

	fn index_of(&self, id: &str) -> Result<usize> {
		self.index
			.get(id)
			.copied()
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))
	}

	fn apply_link_force(&mut self) {
		let Self {
			nodes,
			links,
			forces,
			jiggle,
			alpha,
			..
		} = self;
		for link in links.iter() {
			let (s, t) = (&nodes[link.source], &nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = jiggle.next();
			}
			if y == 0.0 {
				y = jiggle.next();
			}
			let length = (x * x + y * y).sqrt();
			let distance = link.distance * forces.link_distance_proportion;
			let k = (length - distance) / length * *alpha * link.strength;
			let (x, y) = (x * k, y * k);

			let target = &mut nodes[link.target];
			target.vx -= x * link.bias;
			target.vy -= y * link.bias;
			let source = &mut nodes[link.source];
			source.vx += x * (1.0 - link.bias);
			source.vy += y * (1.0 - link.bias);
		}
	}

	fn apply_attract_force(&mut self) {
		let (cx, cy) = self.viewport.center();
		for &i in &self.forces.attract {
			self.nodes[i].pin = Pin::Pinned { x: cx, y: cy };
		}
	}

	/// Exact pairwise many-body force; negative strength repels.
	fn apply_charge_force(&mut self) {
		let weight = self.forces.charge * self.alpha;
		if weight == 0.0 {
			return;
		}
		let n = self.nodes.len();
		for i in 0..n {
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.nodes[j].x - self.nodes[i].x;
				let mut y = self.nodes[j].y - self.nodes[i].y;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.jiggle.next();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle.next();
					l += y * y;
				}
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				dvx += x * weight / l;
				dvy += y * weight / l;
			}
			self.nodes[i].vx += dvx;
			self.nodes[i].vy += dvy;
		}
	}

	/// Translate every node so the mean position sits on the centre.
	fn apply_center_force(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (cx, cy) = self.forces.center;
		let (dx, dy) = (sx / n - cx, sy / n - cy);
		for node in &mut self.nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}

	fn update_geometry(&mut self) {
		for (geometry, link) in self.geometry.iter_mut().zip(&self.links) {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			*geometry = LinkGeometry {
				x1: s.x,
				y1: s.y,
				x2: t.x,
				y2: t.y,
			};
		}
	}
}

/// Holds at most one live simulation per graph view.
#[derive(Default)]
pub struct SimulationSlot {
	current: Option<Simulation>,
	generation: u64,
}

impl SimulationSlot {
	/// Dispose the previous simulation before the new one becomes visible.
	pub fn install(&mut self, simulation: Simulation) -> &mut Simulation {
		self.clear();
		self.generation += 1;
		self.current.insert(simulation)
	}

	/// Dispose the live simulation, if any.
	pub fn clear(&mut self) {
		if let Some(mut previous) = self.current.take() {
			previous.dispose();
		}
	}

	/// The live simulation.
	pub fn get(&self) -> Option<&Simulation> {
		self.current.as_ref()
	}

	/// The live simulation, mutably.
	pub fn get_mut(&mut self) -> Option<&mut Simulation> {
		self.current.as_mut()
	}

	/// Number of simulations installed so far.
	pub fn generation(&self) -> u64 {
		self.generation
	}
}
