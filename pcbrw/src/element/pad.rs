use core::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::warn;

use crate::element::check_index;
use crate::parse::{Statement, Value};
use crate::primitives::{angle_valid, size_valid, Angle, Dist, Layer, Point};
use crate::source::Origin;
use crate::write::FieldSink;
use crate::{ErrorKind, PcbError};

/// Pad connectivity: an optional pad id plus the ids of connected pads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    /// The id other pads refer to this one by.
    pub id: Option<i32>,
    /// Ids of the pads this one is connected to, in input order.
    pub connections: Vec<i32>,
}

/// The drill shape of a through-hole pad. Wire form is the integer index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum PadForm {
    /// Round.
    Round = 1,
    /// Octagon.
    Octagon,
    /// Square.
    Square,
    /// Rounded, landscape.
    TransverseRounded,
    /// Octagon, landscape.
    TransverseOctagon,
    /// Rectangular, landscape.
    TransverseRectangular,
    /// Rounded, portrait.
    HighRounded,
    /// Octagon, portrait.
    HighOctagon,
    /// Rectangular, portrait.
    HighRectangular,
}

impl PadForm {
    /// The keyword form accepted by the parser next to the integer index.
    pub fn keyword(self) -> &'static str {
        match self {
            PadForm::Round => "ROUND",
            PadForm::Octagon => "OCTAGON",
            PadForm::Square => "SQUARE",
            PadForm::TransverseRounded => "TRANSVERSE_ROUNDED",
            PadForm::TransverseOctagon => "TRANSVERSE_OCTAGON",
            PadForm::TransverseRectangular => "TRANSVERSE_RECTANGULAR",
            PadForm::HighRounded => "HIGH_ROUNDED",
            PadForm::HighOctagon => "HIGH_OCTAGON",
            PadForm::HighRectangular => "HIGH_RECTANGULAR",
        }
    }

    fn all() -> [PadForm; 9] {
        [
            PadForm::Round,
            PadForm::Octagon,
            PadForm::Square,
            PadForm::TransverseRounded,
            PadForm::TransverseOctagon,
            PadForm::TransverseRectangular,
            PadForm::HighRounded,
            PadForm::HighOctagon,
            PadForm::HighRectangular,
        ]
    }

    fn from_statement(stmt: &Statement) -> Result<PadForm, PcbError> {
        match stmt.value()? {
            Value::Int(index) => PadForm::try_from(*index).map_err(|_| {
                PcbError::at(
                    ErrorKind::ArgumentRange,
                    stmt.origin,
                    format!("pad form out of range: {index}"),
                )
            }),
            Value::Word(word) => PadForm::all()
                .into_iter()
                .find(|form| form.keyword().eq_ignore_ascii_case(word))
                .ok_or_else(|| {
                    PcbError::at(
                        ErrorKind::ArgumentFormat,
                        stmt.origin,
                        format!("unknown pad form: {word}"),
                    )
                }),
            Value::Str(_) | Value::Pair(..) => Err(PcbError::at(
                ErrorKind::ArgumentFormat,
                stmt.origin,
                "pad form expects a name or an index",
            )),
        }
    }
}

impl Display for PadForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            PadForm::Round => "round",
            PadForm::Octagon => "octagon",
            PadForm::Square => "square",
            PadForm::TransverseRounded => "transverse rounded",
            PadForm::TransverseOctagon => "transverse octagon",
            PadForm::TransverseRectangular => "transverse rectangular",
            PadForm::HighRounded => "high rounded",
            PadForm::HighOctagon => "high octagon",
            PadForm::HighRectangular => "high rectangular",
        };
        f.write_str(name)
    }
}

/// A through-hole pad.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PadTht {
    /// The copper layer the pad ring is drawn on.
    pub layer: Layer,
    /// Center position.
    pub position: Point,
    /// Outer diameter of the pad.
    pub size: Dist,
    /// Drill diameter.
    pub drill: Dist,
    /// Pad shape.
    pub form: PadForm,

    /// Connectivity to other pads.
    pub link: Link,
    /// Clearance to surrounding copper. Default 0.4 mm.
    pub clear: Dist,
    /// Whether the pad is exposed in the soldermask. Default true.
    pub soldermask: bool,
    /// Rotation around the position.
    pub rotation: Angle,
    /// Whether the pad is plated through as a via.
    pub via: bool,
    /// Whether the pad connects to ground planes through thermal relief.
    pub thermal: bool,
    /// Bitmask selecting which of the possible relief spokes are drawn.
    pub thermal_tracks: i32,
    /// Relief spoke width in percent of the pad clearance, 50..=300.
    pub thermal_tracks_width: i32,
    /// Whether each layer keeps its own spoke mask.
    pub thermal_tracks_individual: bool,
}

impl PadTht {
    /// Default clearance.
    pub const DEFAULT_CLEAR: Dist = 4000;
    /// Default thermal spoke mask (every second spoke on every layer).
    pub const DEFAULT_THERMAL_TRACKS: i32 = 0x5555_5555;
    /// Default thermal spoke width in percent.
    pub const DEFAULT_THERMAL_TRACKS_WIDTH: i32 = 100;

    /// Creates a through-hole pad from its required fields, with every
    /// optional field at its default.
    pub fn new(
        layer: Layer,
        position: Point,
        size: Dist,
        drill: Dist,
        form: PadForm,
    ) -> Result<PadTht, PcbError> {
        let pad = PadTht {
            layer,
            position,
            size,
            drill,
            form,
            link: Link::default(),
            clear: PadTht::DEFAULT_CLEAR,
            soldermask: true,
            rotation: 0,
            via: false,
            thermal: false,
            thermal_tracks: PadTht::DEFAULT_THERMAL_TRACKS,
            thermal_tracks_width: PadTht::DEFAULT_THERMAL_TRACKS_WIDTH,
            thermal_tracks_individual: false,
        };
        if pad.valid() {
            Ok(pad)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "THT pad field out of range",
            ))
        }
    }

    /// Whether every field respects its range.
    pub fn valid(&self) -> bool {
        self.position.valid()
            && size_valid(self.size)
            && size_valid(self.drill)
            && size_valid(self.clear)
            && angle_valid(self.rotation)
            && (50..=300).contains(&self.thermal_tracks_width)
    }

    pub(crate) fn from_statements(origin: Origin, stmts: &[Statement]) -> Result<PadTht, PcbError> {
        let mut layer = None;
        let mut position = None;
        let mut size = None;
        let mut drill = None;
        let mut form = None;
        let mut link = Link::default();
        let mut clear = PadTht::DEFAULT_CLEAR;
        let mut soldermask = true;
        let mut rotation = 0;
        let mut via = false;
        let mut thermal = false;
        let mut thermal_tracks = PadTht::DEFAULT_THERMAL_TRACKS;
        let mut thermal_tracks_width = PadTht::DEFAULT_THERMAL_TRACKS_WIDTH;
        let mut thermal_tracks_individual = false;

        for stmt in stmts {
            if stmt.is("LAYER") {
                layer = Some(stmt.layer_value()?);
            } else if stmt.is("POS") {
                position = Some(stmt.point_value()?);
            } else if stmt.is("SIZE") {
                size = Some(stmt.size_value()?);
            } else if stmt.is("DRILL") {
                drill = Some(stmt.size_value()?);
            } else if stmt.is("FORM") {
                form = Some(PadForm::from_statement(stmt)?);
            } else if stmt.is("PAD_ID") {
                link.id = Some(stmt.int_value()?);
            } else if stmt.is("CON") {
                check_index(stmt, link.connections.len())?;
                link.connections.push(stmt.int_value()?);
            } else if stmt.is("CLEAR") {
                clear = stmt.size_value()?;
            } else if stmt.is("SOLDERMASK") {
                soldermask = stmt.bool_value()?;
            } else if stmt.is("ROTATION") {
                rotation = stmt.angle_value()?;
            } else if stmt.is("VIA") {
                via = stmt.bool_value()?;
            } else if stmt.is("THERMAL") {
                thermal = stmt.bool_value()?;
            } else if stmt.is("THERMAL_TRACKS") {
                thermal_tracks = stmt.int_value()?;
            } else if stmt.is("THERMAL_TRACKS_WIDTH") {
                thermal_tracks_width = stmt.int_value_in(50, 300)?;
            } else if stmt.is("THERMAL_TRACKS_INDIVIDUAL") {
                thermal_tracks_individual = stmt.bool_value()?;
            } else {
                warn!("unknown THT pad statement skipped: {}", stmt.name);
            }
        }

        let (Some(layer), Some(position), Some(size), Some(drill), Some(form)) =
            (layer, position, size, drill, form)
        else {
            return Err(PcbError::at(
                ErrorKind::Syntax,
                origin,
                "THT pad missing a required field (LAYER, POS, SIZE, DRILL, FORM)",
            ));
        };
        let pad = PadTht {
            layer,
            position,
            size,
            drill,
            form,
            link,
            clear,
            soldermask,
            rotation,
            via,
            thermal,
            thermal_tracks,
            thermal_tracks_width,
            thermal_tracks_individual,
        };
        if pad.valid() {
            Ok(pad)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                origin,
                "THT pad field out of range",
            ))
        }
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        f.layer("LAYER", "layer", self.layer);
        f.point("POS", "position", self.position);
        f.dist("SIZE", "size", self.size);
        f.dist("DRILL", "drill", self.drill);
        f.form("FORM", "form", self.form);
        f.dist_if("CLEAR", "clear", self.clear, PadTht::DEFAULT_CLEAR);
        f.bool_if("SOLDERMASK", "soldermask", self.soldermask, true);
        f.angle_if("ROTATION", "rotation", self.rotation, 0);
        f.bool_if("VIA", "via", self.via, false);
        f.bool_if("THERMAL", "thermal", self.thermal, false);
        f.int_if(
            "THERMAL_TRACKS",
            "tracks",
            self.thermal_tracks,
            PadTht::DEFAULT_THERMAL_TRACKS,
        );
        f.int_if(
            "THERMAL_TRACKS_WIDTH",
            "tracks width",
            self.thermal_tracks_width,
            PadTht::DEFAULT_THERMAL_TRACKS_WIDTH,
        );
        f.bool_if(
            "THERMAL_TRACKS_INDIVIDUAL",
            "tracks individual",
            self.thermal_tracks_individual,
            false,
        );
        if let Some(id) = self.link.id {
            f.int("PAD_ID", "pad ID", id);
        }
        for (index, connection) in self.link.connections.iter().enumerate() {
            f.int_indexed("CON", "c", index, *connection);
        }
    }
}

/// A surface-mount pad.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PadSmt {
    /// The copper layer the pad is drawn on.
    pub layer: Layer,
    /// Center position.
    pub position: Point,
    /// Horizontal extent.
    pub width: Dist,
    /// Vertical extent.
    pub height: Dist,

    /// Connectivity to other pads.
    pub link: Link,
    /// Clearance to surrounding copper. Default 0.4 mm.
    pub clear: Dist,
    /// Whether the pad is exposed in the soldermask. Default true.
    pub soldermask: bool,
    /// Rotation around the position.
    pub rotation: Angle,
    /// Whether the pad connects to ground planes through thermal relief.
    pub thermal: bool,
    /// Bitmask selecting which of the eight relief spokes are drawn, 0..=255.
    pub thermal_tracks: i32,
    /// Relief spoke width in percent of the pad clearance, 50..=300.
    pub thermal_tracks_width: i32,
}

impl PadSmt {
    /// Default clearance.
    pub const DEFAULT_CLEAR: Dist = 4000;
    /// Default thermal spoke mask (every second spoke).
    pub const DEFAULT_THERMAL_TRACKS: i32 = 0x55;
    /// Default thermal spoke width in percent.
    pub const DEFAULT_THERMAL_TRACKS_WIDTH: i32 = 100;

    /// Creates a surface-mount pad from its required fields, with every
    /// optional field at its default.
    pub fn new(
        layer: Layer,
        position: Point,
        width: Dist,
        height: Dist,
    ) -> Result<PadSmt, PcbError> {
        let pad = PadSmt {
            layer,
            position,
            width,
            height,
            link: Link::default(),
            clear: PadSmt::DEFAULT_CLEAR,
            soldermask: true,
            rotation: 0,
            thermal: false,
            thermal_tracks: PadSmt::DEFAULT_THERMAL_TRACKS,
            thermal_tracks_width: PadSmt::DEFAULT_THERMAL_TRACKS_WIDTH,
        };
        if pad.valid() {
            Ok(pad)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "SMT pad field out of range",
            ))
        }
    }

    /// Whether every field respects its range.
    pub fn valid(&self) -> bool {
        self.position.valid()
            && size_valid(self.width)
            && size_valid(self.height)
            && size_valid(self.clear)
            && angle_valid(self.rotation)
            && (0..=0xff).contains(&self.thermal_tracks)
            && (50..=300).contains(&self.thermal_tracks_width)
    }

    pub(crate) fn from_statements(origin: Origin, stmts: &[Statement]) -> Result<PadSmt, PcbError> {
        let mut layer = None;
        let mut position = None;
        let mut width = None;
        let mut height = None;
        let mut link = Link::default();
        let mut clear = PadSmt::DEFAULT_CLEAR;
        let mut soldermask = true;
        let mut rotation = 0;
        let mut thermal = false;
        let mut thermal_tracks = PadSmt::DEFAULT_THERMAL_TRACKS;
        let mut thermal_tracks_width = PadSmt::DEFAULT_THERMAL_TRACKS_WIDTH;

        for stmt in stmts {
            if stmt.is("LAYER") {
                layer = Some(stmt.layer_value()?);
            } else if stmt.is("POS") {
                position = Some(stmt.point_value()?);
            } else if stmt.is("SIZE_X") {
                width = Some(stmt.size_value()?);
            } else if stmt.is("SIZE_Y") {
                height = Some(stmt.size_value()?);
            } else if stmt.is("PAD_ID") {
                link.id = Some(stmt.int_value()?);
            } else if stmt.is("CON") {
                check_index(stmt, link.connections.len())?;
                link.connections.push(stmt.int_value()?);
            } else if stmt.is("CLEAR") {
                clear = stmt.size_value()?;
            } else if stmt.is("SOLDERMASK") {
                soldermask = stmt.bool_value()?;
            } else if stmt.is("ROTATION") {
                rotation = stmt.angle_value()?;
            } else if stmt.is("THERMAL") {
                thermal = stmt.bool_value()?;
            } else if stmt.is("THERMAL_TRACKS") {
                thermal_tracks = stmt.int_value_in(0, 0xff)?;
            } else if stmt.is("THERMAL_TRACKS_WIDTH") {
                thermal_tracks_width = stmt.int_value_in(50, 300)?;
            } else {
                warn!("unknown SMT pad statement skipped: {}", stmt.name);
            }
        }

        let (Some(layer), Some(position), Some(width), Some(height)) =
            (layer, position, width, height)
        else {
            return Err(PcbError::at(
                ErrorKind::Syntax,
                origin,
                "SMT pad missing a required field (LAYER, POS, SIZE_X, SIZE_Y)",
            ));
        };
        let pad = PadSmt {
            layer,
            position,
            width,
            height,
            link,
            clear,
            soldermask,
            rotation,
            thermal,
            thermal_tracks,
            thermal_tracks_width,
        };
        if pad.valid() {
            Ok(pad)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                origin,
                "SMT pad field out of range",
            ))
        }
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        f.layer("LAYER", "layer", self.layer);
        f.point("POS", "position", self.position);
        f.dist("SIZE_X", "width", self.width);
        f.dist("SIZE_Y", "height", self.height);
        f.dist_if("CLEAR", "clear", self.clear, PadSmt::DEFAULT_CLEAR);
        f.bool_if("SOLDERMASK", "soldermask", self.soldermask, true);
        f.angle_if("ROTATION", "rotation", self.rotation, 0);
        f.bool_if("THERMAL", "thermal", self.thermal, false);
        f.int_if(
            "THERMAL_TRACKS",
            "tracks",
            self.thermal_tracks,
            PadSmt::DEFAULT_THERMAL_TRACKS,
        );
        f.int_if(
            "THERMAL_TRACKS_WIDTH",
            "tracks width",
            self.thermal_tracks_width,
            PadSmt::DEFAULT_THERMAL_TRACKS_WIDTH,
        );
        if let Some(id) = self.link.id {
            f.int("PAD_ID", "pad ID", id);
        }
        for (index, connection) in self.link.connections.iter().enumerate() {
            f.int_indexed("CON", "c", index, *connection);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn form_from_index() {
        assert_eq!(PadForm::try_from(2), Ok(PadForm::Octagon));
        assert_eq!(PadForm::try_from(9), Ok(PadForm::HighRectangular));
        assert!(PadForm::try_from(0).is_err());
        assert!(PadForm::try_from(10).is_err());
    }

    #[test]
    fn tht_defaults() {
        let pad = PadTht::new(Layer::CopperTop, Point::new(0, 0), 2000, 800, PadForm::Round)
            .unwrap();
        assert_eq!(pad.clear, 4000);
        assert!(pad.soldermask);
        assert_eq!(pad.rotation, 0);
        assert!(!pad.via);
        assert!(!pad.thermal);
        assert_eq!(pad.thermal_tracks, 0x5555_5555);
        assert_eq!(pad.thermal_tracks_width, 100);
        assert!(!pad.thermal_tracks_individual);
        assert_eq!(pad.link, Link::default());
    }

    #[test]
    fn smt_thermal_tracks_range() {
        let mut pad =
            PadSmt::new(Layer::CopperTop, Point::new(0, 0), 1000, 2000).unwrap();
        assert_eq!(pad.thermal_tracks, 0x55);
        pad.thermal_tracks = 0x100;
        assert!(!pad.valid());
        pad.thermal_tracks = 0xff;
        assert!(pad.valid());
    }

    #[test]
    fn thermal_tracks_width_bounds() {
        let mut pad = PadTht::new(Layer::CopperTop, Point::new(0, 0), 2000, 800, PadForm::Round)
            .unwrap();
        pad.thermal_tracks_width = 49;
        assert!(!pad.valid());
        pad.thermal_tracks_width = 50;
        assert!(pad.valid());
        pad.thermal_tracks_width = 300;
        assert!(pad.valid());
        pad.thermal_tracks_width = 301;
        assert!(!pad.valid());
    }
}
