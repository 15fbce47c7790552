use tracing::warn;

use crate::parse::Statement;
use crate::primitives::{angle_valid, size_valid, Angle, Dist, Layer, Point};
use crate::source::Origin;
use crate::write::FieldSink;
use crate::{ErrorKind, PcbError};

/// A circle or arc around a center point.
///
/// `start` and `stop` bound the drawn arc; both zero draws the full circle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circle {
    /// The layer the circle is drawn on.
    pub layer: Layer,
    /// Stroke width.
    pub width: Dist,
    /// Center position.
    pub center: Point,
    /// Radius.
    pub radius: Dist,

    /// Clearance to surrounding copper. Default 0.4 mm.
    pub clear: Dist,
    /// Whether the circle is subtracted from a ground plane.
    pub cutout: bool,
    /// Whether the circle is exposed in the soldermask.
    pub soldermask: bool,
    /// Arc start angle.
    pub start: Angle,
    /// Arc stop angle.
    pub stop: Angle,
    /// Whether the circle is filled.
    pub fill: bool,
}

impl Circle {
    /// Default clearance.
    pub const DEFAULT_CLEAR: Dist = 4000;

    /// Creates a circle from its required fields, with every optional field
    /// at its default.
    pub fn new(layer: Layer, width: Dist, center: Point, radius: Dist) -> Result<Circle, PcbError> {
        let circle = Circle {
            layer,
            width,
            center,
            radius,
            clear: Circle::DEFAULT_CLEAR,
            cutout: false,
            soldermask: false,
            start: 0,
            stop: 0,
            fill: false,
        };
        if circle.valid() {
            Ok(circle)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "circle field out of range",
            ))
        }
    }

    /// Whether every field respects its range.
    pub fn valid(&self) -> bool {
        size_valid(self.width)
            && self.center.valid()
            && size_valid(self.radius)
            && size_valid(self.clear)
            && angle_valid(self.start)
            && angle_valid(self.stop)
    }

    pub(crate) fn from_statements(origin: Origin, stmts: &[Statement]) -> Result<Circle, PcbError> {
        let mut layer = None;
        let mut width = None;
        let mut center = None;
        let mut radius = None;
        let mut clear = Circle::DEFAULT_CLEAR;
        let mut cutout = false;
        let mut soldermask = false;
        let mut start = 0;
        let mut stop = 0;
        let mut fill = false;

        for stmt in stmts {
            if stmt.is("LAYER") {
                layer = Some(stmt.layer_value()?);
            } else if stmt.is("WIDTH") {
                width = Some(stmt.size_value()?);
            } else if stmt.is("CENTER") {
                center = Some(stmt.point_value()?);
            } else if stmt.is("RADIUS") {
                radius = Some(stmt.size_value()?);
            } else if stmt.is("CLEAR") {
                clear = stmt.size_value()?;
            } else if stmt.is("CUTOUT") {
                cutout = stmt.bool_value()?;
            } else if stmt.is("SOLDERMASK") {
                soldermask = stmt.bool_value()?;
            } else if stmt.is("START") {
                start = stmt.angle_value()?;
            } else if stmt.is("STOP") {
                stop = stmt.angle_value()?;
            } else if stmt.is("FILL") {
                fill = stmt.bool_value()?;
            } else {
                warn!("unknown circle statement skipped: {}", stmt.name);
            }
        }

        let (Some(layer), Some(width), Some(center), Some(radius)) =
            (layer, width, center, radius)
        else {
            return Err(PcbError::at(
                ErrorKind::Syntax,
                origin,
                "circle missing a required field (LAYER, WIDTH, CENTER, RADIUS)",
            ));
        };
        let circle = Circle {
            layer,
            width,
            center,
            radius,
            clear,
            cutout,
            soldermask,
            start,
            stop,
            fill,
        };
        if circle.valid() {
            Ok(circle)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                origin,
                "circle field out of range",
            ))
        }
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        f.layer("LAYER", "layer", self.layer);
        f.dist("WIDTH", "width", self.width);
        f.point("CENTER", "center", self.center);
        f.dist("RADIUS", "radius", self.radius);
        f.dist_if("CLEAR", "clear", self.clear, Circle::DEFAULT_CLEAR);
        f.bool_if("CUTOUT", "cutout", self.cutout, false);
        f.bool_if("SOLDERMASK", "soldermask", self.soldermask, false);
        f.angle_if("START", "start", self.start, 0);
        f.angle_if("STOP", "stop", self.stop, 0);
        f.bool_if("FILL", "fill", self.fill, false);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_installed() {
        let circle = Circle::new(Layer::Mechanical, 100, Point::new(0, 0), 5000).unwrap();
        assert_eq!(circle.start, 0);
        assert_eq!(circle.stop, 0);
        assert!(!circle.fill);
    }

    #[test]
    fn radius_range() {
        let err = Circle::new(Layer::Mechanical, 100, Point::new(0, 0), -5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentRange);
    }
}
