// src/renderer.rs

use crate::config::{Color, RenderConfig};
use crate::error::RenderError;
use crate::layout::{prepare, CommitRendering, Link, RenderingData};
use crate::model::{CommitHash, Ref};
use crate::repository::Repository;
use crate::surface::{OutputFormat, Point, RasterSurface, Surface, SvgSurface, TextStyle};
use tracing::{debug, instrument};

/// An encoded diagram ready to be written out.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Lays out the history reachable from `from` and encodes it.
pub fn render_graph(
    repo: &Repository,
    from: &Ref,
    config: &RenderConfig,
    format: OutputFormat,
) -> Result<Rendered, RenderError> {
    let data = prepare(repo, from)?;
    Renderer::new(config.clone()).render_to(&data, format)
}

/// Colors per branch label. Unattributed commits use slot 0, named branches
/// take the following slots in order of first appearance.
#[derive(Debug, Clone)]
pub struct BranchPalette {
    branches: Vec<String>,
    colors: Vec<Color>,
}

impl BranchPalette {
    pub fn new(data: &RenderingData, colors: Vec<Color>) -> Self {
        let mut branches: Vec<String> = Vec::new();
        for commit in data.iter() {
            if let Some(name) = &commit.branch {
                if !branches.contains(name) {
                    branches.push(name.clone());
                }
            }
        }
        Self { branches, colors }
    }

    pub fn slot(&self, branch: Option<&str>) -> usize {
        branch
            .and_then(|name| self.branches.iter().position(|b| b == name))
            .map_or(0, |pos| pos + 1)
    }

    pub fn color(&self, branch: Option<&str>) -> Color {
        if self.colors.is_empty() {
            return Color::new(0, 0, 0);
        }
        self.colors[self.slot(branch) % self.colors.len()]
    }
}

/// One straight piece of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: Color,
}

/// Paints [`RenderingData`] onto a [`Surface`].
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render_to(
        &self,
        data: &RenderingData,
        format: OutputFormat,
    ) -> Result<Rendered, RenderError> {
        let (width, height, bytes) = match format {
            OutputFormat::Png => {
                let surface: RasterSurface = self.render(data)?;
                (surface.width(), surface.height(), surface.encode()?)
            }
            OutputFormat::Svg => {
                let surface: SvgSurface = self.render(data)?;
                (surface.width(), surface.height(), surface.encode()?)
            }
        };
        Ok(Rendered {
            format,
            width,
            height,
            bytes,
        })
    }

    /// Canvas size: every lane plus the widest label, and every row.
    pub fn canvas_size(&self, data: &RenderingData) -> (u32, u32) {
        let c = &self.config;
        let max_text = data
            .iter()
            .map(|commit| c.text_width(&commit.text))
            .fold(0.0f32, f32::max);
        let rows = (data.max_timestamp() - data.min_timestamp()) as f32;
        let width = 2.0 * c.margin + (data.max_lane() + 1) as f32 * c.lane_width + max_text;
        let height = 2.0 * c.margin + rows * c.row_spacing();
        (width.ceil() as u32, height.ceil() as u32)
    }

    #[instrument(skip_all, fields(commits = data.len(), links = data.links.len()))]
    pub fn render<S: Surface>(&self, data: &RenderingData) -> Result<S, RenderError> {
        if data.is_empty() {
            return Err(RenderError::EmptyLayout);
        }
        let (width, height) = self.canvas_size(data);
        let mut surface = S::create(width, height);
        let palette = BranchPalette::new(data, self.config.palette.clone());
        let d = self.config.circle_diameter;

        // 1. Edges, so nodes are drawn on top of them
        for link in &data.links {
            let from = endpoint(data, link.from, link)?;
            let to = endpoint(data, link.to, link)?;
            for segment in self.route(data, &palette, from, to) {
                surface.stroke_line(segment.from, segment.to, d / 5.0, segment.color);
                surface.stroke_line(segment.from, segment.to, d / 10.0, self.config.edge_core);
            }
        }

        // 2. Nodes and their labels
        let line_width = d / 7.0;
        let text_x = self.config.margin + (data.max_lane() + 1) as f32 * self.config.lane_width;
        for commit in data.iter() {
            let color = palette.color(commit.branch.as_deref());
            let center = self.position(data, commit.lane, commit.commit.timestamp);
            surface.fill_circle(center, d / 2.0 - line_width, self.config.node_fill);
            surface.stroke_circle(center, d / 2.0 - line_width, line_width, color);

            let style = TextStyle {
                fill: color,
                outline: self.config.text_outline,
                outline_width: self.config.text_outline_width,
                font_size: self.config.font_size,
                char_width: self.config.char_width(),
            };
            surface.outlined_text(Point::new(text_x, center.y), &commit.text, &style);
        }

        debug!(width, height, branches = palette.branches.len(), "diagram painted");
        Ok(surface)
    }

    fn position(&self, data: &RenderingData, lane: usize, timestamp: u64) -> Point {
        let c = &self.config;
        Point::new(
            c.margin + lane as f32 * c.lane_width,
            c.margin + (data.max_timestamp() - timestamp) as f32 * c.row_spacing(),
        )
    }

    /// Splits an edge into drawable segments.
    ///
    /// Same-lane edges are one segment in the source color. Cross-lane edges
    /// spanning more than one row first run along the source lane up to the
    /// row next to the target; the final diagonal takes the color of the
    /// endpoint in the higher lane.
    pub fn route(
        &self,
        data: &RenderingData,
        palette: &BranchPalette,
        from: &CommitRendering,
        to: &CommitRendering,
    ) -> Vec<Segment> {
        let from_color = palette.color(from.branch.as_deref());
        let start = self.position(data, from.lane, from.commit.timestamp);
        let end = self.position(data, to.lane, to.commit.timestamp);

        if from.lane == to.lane {
            return vec![Segment {
                from: start,
                to: end,
                color: from_color,
            }];
        }

        let deeper = if from.lane > to.lane { from } else { to };
        let join_color = palette.color(deeper.branch.as_deref());

        let (from_ts, to_ts) = (from.commit.timestamp, to.commit.timestamp);
        let mut segments = Vec::with_capacity(2);
        let mut joint = start;
        if from_ts.abs_diff(to_ts) > 1 {
            let joint_ts = if from_ts < to_ts { to_ts - 1 } else { to_ts + 1 };
            joint = self.position(data, from.lane, joint_ts);
            segments.push(Segment {
                from: start,
                to: joint,
                color: from_color,
            });
        }
        segments.push(Segment {
            from: joint,
            to: end,
            color: join_color,
        });
        segments
    }
}

fn endpoint<'a>(
    data: &'a RenderingData,
    hash: CommitHash,
    link: &Link,
) -> Result<&'a CommitRendering, RenderError> {
    data.get(&hash).ok_or(RenderError::DanglingEdge {
        from: link.from,
        to: link.to,
    })
}
