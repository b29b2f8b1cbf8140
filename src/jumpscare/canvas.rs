//! 2D canvas backend for the jumpscare surface.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use super::{DrawSurface, GradientStop, Rgba};
use crate::error::GameError;

pub const CANVAS_ID: &str = "jumpscareCanvas";

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Reuse `#jumpscareCanvas`, or create a full-viewport one if the page lacks it.
    pub fn attach(doc: &Document) -> Result<Self, GameError> {
        let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
            el.dyn_into().map_err(|_| GameError::MissingElement(CANVAS_ID.into()))?
        } else {
            log::warn!("#{CANVAS_ID} not found, creating one");
            let c: HtmlCanvasElement = doc
                .create_element("canvas")?
                .dyn_into()
                .map_err(|_| GameError::Js("created element is not a canvas".into()))?;
            c.set_id(CANVAS_ID);
            c.set_class_name("hidden");
            c.set_attribute(
                "style",
                "position:fixed; inset:0; width:100%; height:100%; z-index:60; pointer-events:none;",
            )
            .ok();
            doc.body().ok_or(GameError::NoDocument)?.append_child(&c)?;
            c
        };
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| GameError::Js("2d context unavailable".into()))?
            .dyn_into()
            .map_err(|_| GameError::Js("unexpected 2d context type".into()))?;
        Ok(Self { canvas, ctx })
    }

    fn fill_style(&self, color: Rgba) {
        self.ctx.set_fill_style_str(&color.css());
    }
}

impl DrawSurface for CanvasSurface {
    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    fn resize_to_display(&mut self) {
        self.canvas.set_width(self.canvas.client_width().max(0) as u32);
        self.canvas.set_height(self.canvas.client_height().max(0) as u32);
    }

    fn set_visible(&mut self, visible: bool) {
        let classes = self.canvas.class_list();
        let _ = if visible {
            classes.remove_1("hidden")
        } else {
            classes.add_1("hidden")
        };
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
    }

    fn fill_vertical_gradient(&mut self, stops: &[GradientStop]) {
        let (w, h) = (self.width(), self.height());
        let g = self.ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
        for s in stops {
            g.add_color_stop(s.offset as f32, &s.color.css()).ok();
        }
        self.ctx.set_fill_style_canvas_gradient(&g);
        self.ctx.fill_rect(0.0, 0.0, w, h);
    }

    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, color: Rgba) {
        self.fill_style(color);
        self.ctx.begin_path();
        if self
            .ctx
            .ellipse(cx, cy, rx.max(0.0), ry.max(0.0), 0.0, 0.0, std::f64::consts::TAU)
            .is_ok()
        {
            self.ctx.fill();
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.fill_style(color);
        self.ctx.fill_rect(x, y, w, h);
    }
}
