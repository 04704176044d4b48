// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device space clips and their conservative queries.

use smallvec::SmallVec;

use crate::kurbo::Rect;
use crate::math::{self, IRect};
use crate::path::Path;

/// One element of a clip stack, in device space. Elements are intersected.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipElement {
    /// Keep what's inside the rect.
    Rect(Rect),
    /// Keep what's covered by the path.
    Path(Path),
}

/// The intersection of a list of clip elements, plus an optional scissor.
///
/// An empty clip keeps everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clip {
    elements: SmallVec<[ClipElement; 2]>,
    scissor: Option<IRect>,
}

/// The part of a clip that a batch still needs after it's been tested
/// against the batch's bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AppliedClip {
    /// Pixels outside of this rect must not be touched.
    pub scissor: Option<IRect>,
    /// Whether a coverage or stencil mask is needed on top of the scissor.
    pub needs_clip_mask: bool,
}

impl Clip {
    /// A clip that keeps everything.
    pub fn wide_open() -> Self {
        Self::default()
    }

    /// A clip to a single device space rect.
    pub fn from_rect(rect: Rect) -> Self {
        Self::wide_open().with_element(ClipElement::Rect(rect))
    }

    /// A clip to a device space path.
    pub fn from_path(path: Path) -> Self {
        Self::wide_open().with_element(ClipElement::Path(path))
    }

    /// Intersect with one more element.
    #[must_use]
    pub fn with_element(mut self, element: ClipElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Intersect with a scissor rect.
    #[must_use]
    pub fn with_scissor(mut self, scissor: IRect) -> Self {
        self.scissor = Some(match self.scissor {
            Some(existing) => existing.intersect(&scissor).unwrap_or_default(),
            None => scissor,
        });
        self
    }

    /// The clip elements.
    pub fn elements(&self) -> &[ClipElement] {
        &self.elements
    }

    /// Whether the clip keeps everything.
    pub fn is_wide_open(&self) -> bool {
        self.elements.is_empty() && self.scissor.is_none()
    }

    /// Whether everything inside `rect` is certainly kept. May return false
    /// negatives for path elements.
    pub fn quick_contains(&self, rect: &Rect) -> bool {
        if let Some(scissor) = self.scissor {
            if !math::rect_contains_rect(&scissor.to_rect(), rect) {
                return false;
            }
        }
        self.elements.iter().all(|element| match element {
            ClipElement::Rect(clip) => math::rect_contains_rect(clip, rect),
            ClipElement::Path(path) => path
                .as_rect()
                .filter(|_| !path.is_inverse_fill())
                .is_some_and(|clip| math::rect_contains_rect(&clip, rect)),
        })
    }

    /// The pixels the clip might keep, limited to a `width` by `height` target.
    pub fn conservative_bounds(&self, width: u32, height: u32) -> IRect {
        let mut bounds = IRect::from_size(width, height);
        if let Some(scissor) = self.scissor {
            bounds = bounds.intersect(&scissor).unwrap_or_default();
        }
        for element in &self.elements {
            let element_bounds = match element {
                ClipElement::Rect(rect) => IRect::round_out(*rect),
                // The outside of an inverse path is unbounded.
                ClipElement::Path(path) if path.is_inverse_fill() => continue,
                ClipElement::Path(path) => IRect::round_out(path.bounds()),
            };
            bounds = bounds.intersect(&element_bounds).unwrap_or_default();
        }
        bounds
    }

    /// Test a batch's device bounds against the clip.
    ///
    /// Returns `None` when nothing of the batch can survive the clip.
    pub fn apply(&self, device_bounds: &Rect, width: u32, height: u32) -> Option<AppliedClip> {
        let conservative = self.conservative_bounds(width, height);
        IRect::round_out(*device_bounds).intersect(&conservative)?;
        if self.quick_contains(device_bounds) {
            return Some(AppliedClip::default());
        }

        let mut needs_clip_mask = false;
        let mut rect_clip: Option<Rect> = None;
        for element in &self.elements {
            match element {
                ClipElement::Rect(rect) => {
                    rect_clip = Some(match rect_clip {
                        Some(clip) => math::intersect_rect(&clip, rect).unwrap_or(Rect::ZERO),
                        None => *rect,
                    });
                }
                ClipElement::Path(path) => match path.as_rect() {
                    Some(rect) if !path.is_inverse_fill() => {
                        rect_clip = Some(match rect_clip {
                            Some(clip) => math::intersect_rect(&clip, &rect).unwrap_or(Rect::ZERO),
                            None => rect,
                        });
                    }
                    _ => needs_clip_mask = true,
                },
            }
        }
        // A scissor alone is exact only for pixel aligned rects.
        if let Some(rect) = rect_clip {
            if IRect::round_out(rect).to_rect() != rect {
                needs_clip_mask = true;
            }
        }

        Some(AppliedClip {
            scissor: Some(conservative),
            needs_clip_mask,
        })
    }
}
