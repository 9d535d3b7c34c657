use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use super::types::NodeKind;

const BACKGROUND: &str = "#1a1a2e";
const LINK_COLOR: &str = "rgba(100, 180, 255, 0.25)";
const LINK_FOCUS_COLOR: &str = "white";
const GLARE_COLOR: &str = "rgba(255, 255, 255, 0.9)";
const GLARE_SHADE: &str = "rgba(0, 0, 0, 0.35)";

/// Draw one frame.
pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let Some(simulation) = state.controller.simulation() else {
		return;
	};
	let dragged = state.drag.node.as_deref();
	ctx.set_line_width(1.0 / state.transform.k);

	simulation.visit_links(|source, target| {
		// while dragging only the dragged node's links are drawn
		let color = match dragged {
			Some(id) if source.id() != id && target.id() != id => return,
			Some(_) => LINK_FOCUS_COLOR,
			None => LINK_COLOR,
		};
		ctx.set_stroke_style_str(color);
		ctx.begin_path();
		ctx.move_to(source.x(), source.y());
		ctx.line_to(target.x(), target.y());
		ctx.stroke();
	});
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let Some(simulation) = state.controller.simulation() else {
		return;
	};
	let k = state.transform.k;
	let show_names = state.show_names();

	for (node, sim) in state.controller.data().nodes.iter().zip(simulation.nodes()) {
		let (x, y, radius) = (sim.x(), sim.y(), node.value.max(0.5));

		if node.full_color {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(&node.color.to_string());
			ctx.fill();

			// glare offset towards the lower right
			if let Ok(glare) = ctx.create_radial_gradient(
				x + radius * 0.4,
				y + radius * 0.4,
				0.0,
				x + radius * 0.4,
				y + radius * 0.4,
				radius * 1.6,
			) {
				let _ = glare.add_color_stop(0.0, GLARE_COLOR);
				let _ = glare.add_color_stop(1.0, GLARE_SHADE);
				ctx.set_global_alpha(0.35);
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&glare);
				ctx.fill();
				ctx.set_global_alpha(1.0);
			}
		} else if let Ok(aura) = ctx.create_radial_gradient(x, y, 0.0, x, y, radius) {
			let _ = aura.add_color_stop(0.0, &node.color_aura.to_string());
			let _ = aura.add_color_stop(1.0, "rgba(0, 0, 0, 0)");
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
			#[allow(deprecated)]
			ctx.set_fill_style(&aura);
			ctx.fill();
		}

		let label_visible = match node.kind {
			NodeKind::Person => true,
			NodeKind::Attribute => state.is_focused(node),
		};
		if show_names && label_visible {
			ctx.set_fill_style_str("white");
			ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
			let _ = ctx.fill_text(&node.name, x + 12.0, y + 3.0);
		}
	}
}
