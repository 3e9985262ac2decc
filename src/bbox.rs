use crate::error::Error;
use serde_derive::Deserialize;
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

/// Pixel box, origin top-left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f64; 4], PhantomData<F>);

/// The form every stage after normalization works with.
pub type BoundingBox = BBox<Ltwh>;

impl<F: BBoxFormat> From<BBox<F>> for [f64; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f64; 4] {
        &self.0
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(x: f64, y: f64, w: f64, h: f64) -> Self {
        BBox([x, y, w, h], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f64 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f64 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline]
    pub fn as_xywh(&self) -> BBox<Xywh> {
        self.into()
    }

    /// Forces the box inside a `width` x `height` frame with a 1x1 minimum size.
    pub fn clamp(&self, (width, height): (u32, u32)) -> Self {
        let (fw, fh) = (width as f64, height as f64);

        let w = self.width().max(1.0);
        let h = self.height().max(1.0);

        let x = self.left().min(fw - 1.0).max(0.0);
        let y = self.top().min(fh - 1.0).max(0.0);
        let w = w.min(fw - x).max(1.0);
        let h = h.min(fh - y).max(1.0);

        Self::ltwh(x, y, w, h)
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        BBox([x1, y1, x2, y2], Default::default())
    }

    /// Builds a box from two arbitrary opposite corners.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::ltrb(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f64 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f64 {
        self.0[3]
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        BBox([cx, cy, w, h], Default::default())
    }

    #[inline(always)]
    pub fn cx(&self) -> f64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f64 {
        self.0[1]
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] + v.0[0], v.0[3] + v.0[1]],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Xywh> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0] + v.0[2] / 2.0, v.0[1] + v.0[3] / 2.0, v.0[2], v.0[3]],
            Default::default(),
        )
    }
}

/// One coordinate of a user supplied box, either a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Component {
    Number(f64),
    Text(String),
}

impl Component {
    fn value(&self, name: &str) -> Result<f64, Error> {
        let value = match self {
            Component::Number(v) => *v,
            Component::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                Error::Validation(format!("bbox component `{}` is not numeric: {:?}", name, s))
            })?,
        };

        if !value.is_finite() {
            return Err(Error::Validation(format!(
                "bbox component `{}` is not finite: {}",
                name, value
            )));
        }

        Ok(value)
    }
}

impl From<f64> for Component {
    fn from(v: f64) -> Self {
        Component::Number(v)
    }
}

/// Box exactly as it arrives from the annotation layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawBBox {
    /// `{x, y, w, h}`
    Ltwh {
        x: Component,
        y: Component,
        w: Component,
        h: Component,
    },
    /// `{x1, y1, x2, y2}`, corners in any order
    Corners {
        x1: Component,
        y1: Component,
        x2: Component,
        y2: Component,
    },
    /// `[[x1, y1], [x2, y2]]`
    Points([[Component; 2]; 2]),
    /// `[x, y, w, h]`
    List([Component; 4]),
}

impl RawBBox {
    pub fn ltwh(x: f64, y: f64, w: f64, h: f64) -> Self {
        RawBBox::Ltwh {
            x: x.into(),
            y: y.into(),
            w: w.into(),
            h: h.into(),
        }
    }

    pub fn corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        RawBBox::Corners {
            x1: x1.into(),
            y1: y1.into(),
            x2: x2.into(),
            y2: y2.into(),
        }
    }

    pub fn points(p1: [f64; 2], p2: [f64; 2]) -> Self {
        RawBBox::Points([
            [p1[0].into(), p1[1].into()],
            [p2[0].into(), p2[1].into()],
        ])
    }

    pub fn list(v: [f64; 4]) -> Self {
        RawBBox::List([v[0].into(), v[1].into(), v[2].into(), v[3].into()])
    }

    /// Resolves the shape into an unclamped `Ltwh` box, rejecting
    /// non-numeric and non-finite components. Needs no frame, so it can run
    /// before the video is opened.
    pub fn resolve(&self) -> Result<BoundingBox, Error> {
        match self {
            RawBBox::Ltwh { x, y, w, h } | RawBBox::List([x, y, w, h]) => Ok(BBox::ltwh(
                x.value("x")?,
                y.value("y")?,
                w.value("w")?,
                h.value("h")?,
            )),
            RawBBox::Corners { x1, y1, x2, y2 } | RawBBox::Points([[x1, y1], [x2, y2]]) => {
                Ok(BBox::from_corners(
                    x1.value("x1")?,
                    y1.value("y1")?,
                    x2.value("x2")?,
                    y2.value("y2")?,
                )
                .as_ltwh())
            }
        }
    }

    /// Canonical box for a frame of `dims` (width, height).
    pub fn normalize(&self, dims: (u32, u32)) -> Result<BoundingBox, Error> {
        Ok(self.resolve()?.clamp(dims))
    }
}

impl From<BoundingBox> for RawBBox {
    fn from(b: BoundingBox) -> Self {
        RawBBox::ltwh(b.left(), b.top(), b.width(), b.height())
    }
}
