use tracing::warn;

use crate::element::check_index;
use crate::parse::Statement;
use crate::primitives::{size_valid, Dist, Layer, Point};
use crate::source::Origin;
use crate::write::FieldSink;
use crate::{ErrorKind, PcbError};

/// A filled or hatched copper area bounded by a point outline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    /// The layer the zone is drawn on.
    pub layer: Layer,
    /// Outline stroke width.
    pub width: Dist,
    /// The outline vertices, in drawing order.
    pub points: Vec<Point>,

    /// Clearance to surrounding copper. Default 0.4 mm.
    pub clear: Dist,
    /// Whether the zone is subtracted from a ground plane instead of drawn.
    pub cutout: bool,
    /// Whether the zone is exposed in the soldermask.
    pub soldermask: bool,
    /// Whether the fill is hatched instead of solid.
    pub hatch: bool,
    /// Whether the hatch pitch is chosen automatically. Default true.
    pub hatch_auto: bool,
    /// Explicit hatch pitch, when not automatic.
    pub hatch_width: Option<Dist>,
}

impl Zone {
    /// Default clearance.
    pub const DEFAULT_CLEAR: Dist = 4000;

    /// Creates a zone from its required fields, with every optional field
    /// at its default.
    pub fn new(layer: Layer, width: Dist, points: Vec<Point>) -> Result<Zone, PcbError> {
        let zone = Zone {
            layer,
            width,
            points,
            clear: Zone::DEFAULT_CLEAR,
            cutout: false,
            soldermask: false,
            hatch: false,
            hatch_auto: true,
            hatch_width: None,
        };
        if zone.valid() {
            Ok(zone)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "zone field out of range",
            ))
        }
    }

    /// Whether every field respects its range.
    pub fn valid(&self) -> bool {
        size_valid(self.width)
            && size_valid(self.clear)
            && self.hatch_width.map_or(true, size_valid)
            && self.points.iter().all(Point::valid)
    }

    pub(crate) fn from_statements(origin: Origin, stmts: &[Statement]) -> Result<Zone, PcbError> {
        let mut layer = None;
        let mut width = None;
        let mut points = Vec::new();
        let mut clear = Zone::DEFAULT_CLEAR;
        let mut cutout = false;
        let mut soldermask = false;
        let mut hatch = false;
        let mut hatch_auto = true;
        let mut hatch_width = None;

        for stmt in stmts {
            if stmt.is("LAYER") {
                layer = Some(stmt.layer_value()?);
            } else if stmt.is("WIDTH") {
                width = Some(stmt.size_value()?);
            } else if stmt.is("CLEAR") {
                clear = stmt.size_value()?;
            } else if stmt.is("CUTOUT") {
                cutout = stmt.bool_value()?;
            } else if stmt.is("SOLDERMASK") {
                soldermask = stmt.bool_value()?;
            } else if stmt.is("HATCH") {
                hatch = stmt.bool_value()?;
            } else if stmt.is("HATCH_AUTO") {
                hatch_auto = stmt.bool_value()?;
            } else if stmt.is("HATCH_WIDTH") {
                hatch_width = Some(stmt.size_value()?);
            } else if stmt.is("P") {
                check_index(stmt, points.len())?;
                points.push(stmt.point_value()?);
            } else {
                warn!("unknown zone statement skipped: {}", stmt.name);
            }
        }

        let (Some(layer), Some(width)) = (layer, width) else {
            return Err(PcbError::at(
                ErrorKind::Syntax,
                origin,
                "zone missing a required field (LAYER, WIDTH)",
            ));
        };
        let zone = Zone {
            layer,
            width,
            points,
            clear,
            cutout,
            soldermask,
            hatch,
            hatch_auto,
            hatch_width,
        };
        if zone.valid() {
            Ok(zone)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                origin,
                "zone field out of range",
            ))
        }
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        f.layer("LAYER", "layer", self.layer);
        f.dist("WIDTH", "width", self.width);
        f.dist_if("CLEAR", "clear", self.clear, Zone::DEFAULT_CLEAR);
        f.bool_if("CUTOUT", "cutout", self.cutout, false);
        f.bool_if("SOLDERMASK", "soldermask", self.soldermask, false);
        f.bool_if("HATCH", "hatch", self.hatch, false);
        f.bool_if("HATCH_AUTO", "hatch auto", self.hatch_auto, true);
        if let Some(hatch_width) = self.hatch_width {
            f.dist("HATCH_WIDTH", "hatch width", hatch_width);
        }
        for (index, point) in self.points.iter().enumerate() {
            f.point_indexed("P", "p", index, *point);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_installed() {
        let zone = Zone::new(Layer::Mechanical, 100, vec![]).unwrap();
        assert_eq!(zone.clear, 4000);
        assert!(zone.hatch_auto);
        assert!(!zone.hatch);
        assert_eq!(zone.hatch_width, None);
    }

    #[test]
    fn hatch_width_range() {
        let mut zone = Zone::new(Layer::CopperTop, 100, vec![]).unwrap();
        zone.hatch_width = Some(-1);
        assert!(!zone.valid());
        zone.hatch_width = Some(2000);
        assert!(zone.valid());
    }
}
