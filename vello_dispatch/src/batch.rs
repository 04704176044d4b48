// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batches: immutable descriptions of one draw, handed to the draw target.

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;

use crate::instanced::{InstanceRecord, InstancedShape};
use crate::kurbo::{Affine, BezPath, Point, Rect, RoundedRect};
use crate::math::IRect;
use crate::path_renderer::PathRendererKind;
use crate::peniko::{Color, Fill};
use crate::render_target::RenderTargetId;

/// A packed, premultiplied RGBA8 color, red in the lowest byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct DrawColor(pub u32);

impl From<Color> for DrawColor {
    fn from(color: Color) -> Self {
        Self(color.premultiply().to_rgba8().to_u32())
    }
}

impl DrawColor {
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self(0);

    /// The alpha channel.
    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

/// How a rect batch computes local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocalCoords {
    /// Local coordinates are the rect's own coordinates.
    None,
    /// The rect maps onto this local rect.
    Rect(Rect),
    /// Local coordinates are the rect's coordinates transformed by this matrix.
    Matrix(Affine),
}

/// How the corners of a stroked rect are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RectJoin {
    /// Sharp corners.
    Miter,
    /// Cut corners.
    Bevel,
}

/// The oval algorithm chosen by the oval renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OvalKind {
    /// A circle under a similarity transform.
    Circle,
    /// An axis-aligned ellipse.
    Ellipse,
    /// An ellipse under an arbitrary affine transform, using derivatives.
    DiEllipse,
}

/// How the outline of an oval or rounded rect batch is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutlineStyle {
    /// The interior.
    Fill,
    /// A one pixel outline.
    Hairline,
    /// An outline of the given local width.
    Stroke(f64),
}

/// Primitive topology of a vertices batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    /// Independent triangles.
    Triangles,
    /// A triangle strip.
    TriangleStrip,
    /// A triangle fan.
    TriangleFan,
    /// Single pixel points.
    Points,
    /// Independent one pixel lines.
    Lines,
    /// A connected one pixel polyline.
    LineStrip,
}

impl PrimitiveType {
    /// Whether the primitives are one pixel wide lines or points.
    pub fn is_hairline(self) -> bool {
        matches!(self, Self::Points | Self::Lines | Self::LineStrip)
    }
}

/// The geometry of a path batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PathGeometry {
    /// Local space path.
    pub path: BezPath,
    /// Fill rule.
    pub fill: Fill,
    /// Whether the outside is drawn.
    pub inverse: bool,
    /// How the path is drawn.
    pub outline: OutlineStyle,
}

/// What a batch draws.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchKind {
    /// Clear a device rect to the batch color.
    Clear {
        /// The pixels cleared.
        rect: IRect,
    },
    /// Let the backend drop the target's current contents.
    Discard,
    /// Reset the stencil clip bit inside a rect.
    ClearStencilClip {
        /// The pixels affected.
        rect: IRect,
        /// The value the clip bit is set to.
        inside_clip: bool,
    },
    /// Copy pixels from another surface.
    CopySurface {
        /// The source.
        src: RenderTargetId,
        /// The source pixels.
        src_rect: IRect,
        /// Where the source's top left pixel lands.
        dst_point: (i32, i32),
    },
    /// Fill a rect.
    FillRect {
        /// Whether edges get coverage antialiasing.
        aa: bool,
        /// View transform.
        view: Affine,
        /// Local rect.
        rect: Rect,
        /// Local coordinates.
        local: LocalCoords,
    },
    /// Stroke an axis-aligned rect.
    StrokeRect {
        /// Whether edges get coverage antialiasing.
        aa: bool,
        /// View transform.
        view: Affine,
        /// Local rect.
        rect: Rect,
        /// Local stroke width, zero for hairlines.
        width: f64,
        /// Corner treatment.
        join: RectJoin,
    },
    /// Fill the area between two nested rects, antialiased.
    NestedRects {
        /// View transform.
        view: Affine,
        /// Outer rect.
        outer: Rect,
        /// Inner rect.
        inner: Rect,
    },
    /// An antialiased oval.
    Oval {
        /// The algorithm used.
        kind: OvalKind,
        /// View transform.
        view: Affine,
        /// Local bounds of the oval.
        oval: Rect,
        /// Outline.
        style: OutlineStyle,
    },
    /// An antialiased rounded rect.
    RRect {
        /// View transform.
        view: Affine,
        /// Local rounded rect.
        rrect: RoundedRect,
        /// Outline.
        style: OutlineStyle,
    },
    /// A shape recorded by the instanced renderer.
    Instanced {
        /// Which shape.
        shape: InstancedShape,
        /// The instance data.
        record: InstanceRecord,
    },
    /// A path drawn by a path renderer.
    Path {
        /// The renderer that produced the batch.
        renderer: PathRendererKind,
        /// View transform.
        view: Affine,
        /// Geometry.
        geometry: PathGeometry,
    },
    /// Write path coverage into the stencil buffer only.
    StencilPath {
        /// View transform.
        view: Affine,
        /// Local path.
        path: BezPath,
        /// Fill rule.
        fill: Fill,
        /// Whether the stencil is multisampled.
        use_hw_aa: bool,
    },
    /// Caller supplied triangles, lines or points.
    Vertices {
        /// Topology.
        primitive: PrimitiveType,
        /// View transform.
        view: Affine,
        /// Local positions.
        positions: Vec<Point>,
        /// Texture coordinates, one per position.
        tex_coords: Option<Vec<Point>>,
        /// Colors, one per position.
        colors: Option<Vec<DrawColor>>,
        /// Indices into the positions.
        indices: Option<Vec<u16>>,
    },
    /// Sprites from a texture atlas.
    Atlas {
        /// View transform.
        view: Affine,
        /// Per sprite transforms.
        xforms: Vec<Affine>,
        /// Per sprite atlas rects.
        tex_rects: Vec<Rect>,
        /// Per sprite colors.
        colors: Option<Vec<DrawColor>>,
    },
    /// A nine-patch stretch of an image.
    NinePatch {
        /// View transform.
        view: Affine,
        /// Image width in pixels.
        image_width: u32,
        /// Image height in pixels.
        image_height: u32,
        /// The stretchable center of the image.
        center: IRect,
        /// Destination rect.
        dst: Rect,
    },
    /// A dashed straight line.
    DashLine {
        /// View transform.
        view: Affine,
        /// End points.
        points: [Point; 2],
        /// Alternating on and off lengths.
        intervals: SmallVec<[f64; 4]>,
        /// Offset into the intervals.
        phase: f64,
        /// Local stroke width, zero for hairlines.
        width: f64,
        /// Whether edges get coverage antialiasing.
        aa: bool,
    },
    /// A path rasterized on the CPU, drawn as a masked device rect.
    SoftwareMask {
        /// View transform the mask is rasterized with.
        view: Affine,
        /// Geometry to rasterize.
        geometry: PathGeometry,
        /// Device space pixels covered by the mask.
        mask_bounds: IRect,
        /// Whether the mask may be kept and reused for the same path.
        cacheable: bool,
    },
}

impl BatchKind {
    /// A short name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clear { .. } => "Clear",
            Self::Discard => "Discard",
            Self::ClearStencilClip { .. } => "ClearStencilClip",
            Self::CopySurface { .. } => "CopySurface",
            Self::FillRect { aa: true, .. } => "AAFillRect",
            Self::FillRect { aa: false, .. } => "NonAAFillRect",
            Self::StrokeRect { aa: true, .. } => "AAStrokeRect",
            Self::StrokeRect { aa: false, .. } => "NonAAStrokeRect",
            Self::NestedRects { .. } => "AAFillNestedRects",
            Self::Oval { .. } => "Oval",
            Self::RRect { .. } => "RRect",
            Self::Instanced { .. } => "Instanced",
            Self::Path { .. } => "Path",
            Self::StencilPath { .. } => "StencilPath",
            Self::Vertices { .. } => "Vertices",
            Self::Atlas { .. } => "Atlas",
            Self::NinePatch { .. } => "NinePatch",
            Self::DashLine { .. } => "DashLine",
            Self::SoftwareMask { .. } => "SoftwareMask",
        }
    }
}

/// One draw operation: what to draw, its color and its device space bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    kind: BatchKind,
    color: DrawColor,
    bounds: Rect,
}

impl Batch {
    /// Create a batch.
    pub fn new(kind: BatchKind, color: impl Into<DrawColor>, bounds: Rect) -> Self {
        Self {
            kind,
            color: color.into(),
            bounds,
        }
    }

    /// What the batch draws.
    pub fn kind(&self) -> &BatchKind {
        &self.kind
    }

    /// The premultiplied source color.
    pub fn color(&self) -> DrawColor {
        self.color
    }

    /// Device space bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}
