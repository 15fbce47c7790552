use tracing::warn;

use crate::element::check_index;
use crate::parse::Statement;
use crate::primitives::{size_valid, Dist, Layer, Point};
use crate::source::Origin;
use crate::write::FieldSink;
use crate::{ErrorKind, PcbError};

/// A conductive trace: a stroked polyline on one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    /// The layer the track is drawn on.
    pub layer: Layer,
    /// Stroke width.
    pub width: Dist,
    /// The polyline vertices, in drawing order.
    pub points: Vec<Point>,

    /// Clearance to surrounding copper. Default 0.4 mm.
    pub clear: Dist,
    /// Whether the track is subtracted from a ground plane instead of drawn.
    pub cutout: bool,
    /// Whether the track is exposed in the soldermask.
    pub soldermask: bool,
    /// Whether the first vertex gets a flat cap instead of a round one.
    pub flat_start: bool,
    /// Whether the last vertex gets a flat cap instead of a round one.
    pub flat_end: bool,
}

impl Track {
    /// Default clearance.
    pub const DEFAULT_CLEAR: Dist = 4000;

    /// Creates a track from its required fields, with every optional field
    /// at its default.
    pub fn new(layer: Layer, width: Dist, points: Vec<Point>) -> Result<Track, PcbError> {
        let track = Track {
            layer,
            width,
            points,
            clear: Track::DEFAULT_CLEAR,
            cutout: false,
            soldermask: false,
            flat_start: false,
            flat_end: false,
        };
        if track.valid() {
            Ok(track)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "track field out of range",
            ))
        }
    }

    /// Whether every field respects its range.
    pub fn valid(&self) -> bool {
        size_valid(self.width)
            && size_valid(self.clear)
            && self.points.iter().all(Point::valid)
    }

    pub(crate) fn from_statements(origin: Origin, stmts: &[Statement]) -> Result<Track, PcbError> {
        let mut layer = None;
        let mut width = None;
        let mut points = Vec::new();
        let mut clear = Track::DEFAULT_CLEAR;
        let mut cutout = false;
        let mut soldermask = false;
        let mut flat_start = false;
        let mut flat_end = false;

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
            } else if stmt.is("FLATSTART") {
                flat_start = stmt.bool_value()?;
            } else if stmt.is("FLATEND") {
                flat_end = stmt.bool_value()?;
            } else if stmt.is("P") {
                check_index(stmt, points.len())?;
                points.push(stmt.point_value()?);
            } else {
                warn!("unknown track statement skipped: {}", stmt.name);
            }
        }

        let (Some(layer), Some(width)) = (layer, width) else {
            return Err(PcbError::at(
                ErrorKind::Syntax,
                origin,
                "track missing a required field (LAYER, WIDTH)",
            ));
        };
        let track = Track {
            layer,
            width,
            points,
            clear,
            cutout,
            soldermask,
            flat_start,
            flat_end,
        };
        if track.valid() {
            Ok(track)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                origin,
                "track field out of range",
            ))
        }
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        f.layer("LAYER", "layer", self.layer);
        f.dist("WIDTH", "width", self.width);
        f.dist_if("CLEAR", "clear", self.clear, Track::DEFAULT_CLEAR);
        f.bool_if("CUTOUT", "cutout", self.cutout, false);
        f.bool_if("SOLDERMASK", "soldermask", self.soldermask, false);
        f.bool_if("FLATSTART", "flat start", self.flat_start, false);
        f.bool_if("FLATEND", "flat end", self.flat_end, false);
        for (index, point) in self.points.iter().enumerate() {
            f.point_indexed("P", "p", index, *point);
        }
    }
}
