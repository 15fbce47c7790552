//! Scalar value kinds shared by every element: layers, distances, angles,
//! points, and their raw/cooked text forms.

use core::fmt::{Display, Formatter, Write};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A distance in 1/10,000 mm.
///
/// The wire format stores distances as plain integers in this unit; 10,000
/// is one millimetre, [`DIST_MAX`] is 50 cm.
pub type Dist = i32;

/// An angle in 1/1,000 degree.
pub type Angle = i32;

/// Distance units per micrometre.
pub const DIST_PER_UM: Dist = 10;
/// Distance units per millimetre.
pub const DIST_PER_MM: Dist = DIST_PER_UM * 1000;
/// Distance units per centimetre.
pub const DIST_PER_CM: Dist = DIST_PER_MM * 10;
/// Distance units per thou (1/1000 inch).
pub const DIST_PER_TH: Dist = 254;
/// Distance units per inch.
pub const DIST_PER_IN: Dist = DIST_PER_TH * 1000;

/// Largest representable distance (50 cm).
pub const DIST_MAX: Dist = 50 * DIST_PER_CM;
/// Smallest representable distance (-50 cm).
pub const DIST_MIN: Dist = -DIST_MAX;

/// Angle units per whole degree.
pub const ANGLE_PER_DEGREE: Angle = 1000;
/// Largest representable angle (one full turn).
pub const ANGLE_MAX: Angle = 360 * ANGLE_PER_DEGREE;
/// Smallest representable angle (one full turn backwards).
pub const ANGLE_MIN: Angle = -ANGLE_MAX;

/// Whether `dist` lies within the representable distance range.
pub fn dist_valid(dist: Dist) -> bool {
    (DIST_MIN..=DIST_MAX).contains(&dist)
}

/// Whether `size` is a valid non-negative distance.
pub fn size_valid(size: Dist) -> bool {
    (0..=DIST_MAX).contains(&size)
}

/// Whether `angle` lies within one full turn in either direction.
pub fn angle_valid(angle: Angle) -> bool {
    (ANGLE_MIN..=ANGLE_MAX).contains(&angle)
}

/// Converts millimetres into distance units.
pub fn dist_mm(mm: i32) -> Dist {
    mm * DIST_PER_MM
}

/// Converts micrometres into distance units.
pub fn dist_um(um: i32) -> Dist {
    um * DIST_PER_UM
}

/// One of the seven drawing planes of the board.
///
/// On the wire a layer is its integer index. The short codes (`C1`, `S1`,
/// `C2`, `S2`, `I1`, `I2`, `O`) are accepted as keywords when parsing, since
/// the human readable names contain spaces and cannot appear as words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum Layer {
    /// The top copper layer (C1).
    CopperTop = 1,
    /// The top silkscreen layer (S1).
    SilkscreenTop,
    /// The bottom copper layer (C2).
    CopperBottom,
    /// The bottom silkscreen layer (S2).
    SilkscreenBottom,
    /// The first (usually top) inner copper layer (I1).
    CopperInner1,
    /// The second (usually bottom) inner copper layer (I2).
    CopperInner2,
    /// The mechanical outline layer (O).
    Mechanical,
}

impl Layer {
    /// The short keyword form accepted by the parser.
    pub fn code(self) -> &'static str {
        match self {
            Layer::CopperTop => "C1",
            Layer::SilkscreenTop => "S1",
            Layer::CopperBottom => "C2",
            Layer::SilkscreenBottom => "S2",
            Layer::CopperInner1 => "I1",
            Layer::CopperInner2 => "I2",
            Layer::Mechanical => "O",
        }
    }

    /// Looks a layer up by its short keyword, case-insensitively.
    pub fn from_code(code: &str) -> Option<Layer> {
        [
            Layer::CopperTop,
            Layer::SilkscreenTop,
            Layer::CopperBottom,
            Layer::SilkscreenBottom,
            Layer::CopperInner1,
            Layer::CopperInner2,
            Layer::Mechanical,
        ]
        .into_iter()
        .find(|layer| layer.code().eq_ignore_ascii_case(code))
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Layer::CopperTop => "top copper",
            Layer::SilkscreenTop => "top silkscreen",
            Layer::CopperBottom => "bottom copper",
            Layer::SilkscreenBottom => "bottom silkscreen",
            Layer::CopperInner1 => "inner copper 1",
            Layer::CopperInner2 => "inner copper 2",
            Layer::Mechanical => "mechanical",
        };
        f.write_str(name)
    }
}

/// A pair of distances, used for positions and outline points.
///
/// Raw wire form is `x/y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Horizontal distance from the board origin.
    pub x: Dist,
    /// Vertical distance from the board origin.
    pub y: Dist,
}

impl Point {
    /// Creates a point from its two distances.
    pub fn new(x: Dist, y: Dist) -> Point {
        Point { x, y }
    }

    /// Whether both distances are within range.
    pub fn valid(&self) -> bool {
        dist_valid(self.x) && dist_valid(self.y)
    }
}

/// The unit cooked distances are printed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Millimetres, four fractional digits.
    #[default]
    Mm,
    /// Micrometres, one fractional digit.
    Um,
    /// Centimetres, six fractional digits.
    Cm,
    /// Thou (1/1000 inch), three fractional digits.
    Th,
    /// Inches, five fractional digits.
    In,
}

impl Unit {
    fn dist_per(self) -> Dist {
        match self {
            Unit::Mm => DIST_PER_MM,
            Unit::Um => DIST_PER_UM,
            Unit::Cm => DIST_PER_CM,
            Unit::Th => DIST_PER_TH,
            Unit::In => DIST_PER_IN,
        }
    }

    fn precision(self) -> u32 {
        match self {
            Unit::Mm => 4,
            Unit::Um => 1,
            Unit::Cm => 6,
            Unit::Th => 3,
            Unit::In => 5,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Um => "um",
            Unit::Cm => "cm",
            Unit::Th => "th",
            Unit::In => "in",
        }
    }
}

/// How scalar values are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// The on-wire form: plain integers, accepted back by the parser.
    Raw,
    /// The diagnostic form: decimals with a unit suffix, for humans only.
    Cooked(Unit),
}

impl Format {
    /// Cooked output with the default unit.
    pub fn cooked() -> Format {
        Format::Cooked(Unit::default())
    }

    /// Whether this is a cooked format.
    pub fn is_cooked(self) -> bool {
        match self {
            Format::Raw => false,
            Format::Cooked(_) => true,
        }
    }
}

// scalar emission
// ----

/// Appends a distance to `out` in the requested format.
pub fn write_dist(out: &mut String, dist: Dist, format: Format) {
    match format {
        Format::Raw => {
            let _ = write!(out, "{dist}");
        }
        Format::Cooked(unit) => {
            let per = i64::from(unit.dist_per());
            let prec = unit.precision();
            let sign = if dist < 0 { "-" } else { "" };
            let whole = (i64::from(dist) / per).abs();
            // remainder scaled to the unit's fractional digits, truncating
            let frac = (i64::from(dist) % per).abs() * 10i64.pow(prec) / per;
            let _ = write!(
                out,
                "{sign}{whole}.{frac:0width$}{}",
                unit.suffix(),
                width = prec as usize
            );
        }
    }
}

/// Appends an angle to `out`, as a raw integer or as degrees with three
/// fractional digits.
pub fn write_angle(out: &mut String, angle: Angle, format: Format) {
    match format {
        Format::Raw => {
            let _ = write!(out, "{angle}");
        }
        Format::Cooked(_) => {
            let sign = if angle < 0 { "-" } else { "" };
            let whole = (angle / ANGLE_PER_DEGREE).abs();
            let frac = (angle % ANGLE_PER_DEGREE).abs();
            let _ = write!(out, "{sign}{whole}.{frac:03}deg");
        }
    }
}

/// Appends a point to `out` as `x/y`.
pub fn write_point(out: &mut String, point: Point, format: Format) {
    write_dist(out, point.x, format);
    out.push('/');
    write_dist(out, point.y, format);
}

/// Appends a layer to `out`, as its index or its human readable name.
pub fn write_layer(out: &mut String, layer: Layer, format: Format) {
    if format.is_cooked() {
        let _ = write!(out, "{layer}");
    } else {
        let _ = write!(out, "{}", i32::from(layer));
    }
}

/// Appends a boolean to `out`; `true`/`false` in both formats.
pub fn write_bool(out: &mut String, val: bool) {
    out.push_str(if val { "true" } else { "false" });
}

/// Appends an integer to `out`; identical in both formats.
pub fn write_int(out: &mut String, val: i32) {
    let _ = write!(out, "{val}");
}

/// Appends a string to `out`, `|`-delimited raw and `"`-quoted cooked.
///
/// The format has no escape mechanism; the delimiter character must not
/// occur in the string itself.
pub fn write_str(out: &mut String, val: &str, format: Format) {
    if format.is_cooked() {
        let _ = write!(out, "\"{val}\"");
    } else {
        let _ = write!(out, "|{val}|");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dist_range() {
        assert!(dist_valid(0));
        assert!(dist_valid(DIST_MAX));
        assert!(dist_valid(DIST_MIN));
        assert!(!dist_valid(DIST_MAX + 1));
        assert!(!dist_valid(DIST_MIN - 1));

        assert!(size_valid(0));
        assert!(size_valid(DIST_MAX));
        assert!(!size_valid(-1));
    }

    #[test]
    fn angle_range() {
        assert!(angle_valid(ANGLE_MAX));
        assert!(angle_valid(ANGLE_MIN));
        assert!(!angle_valid(ANGLE_MAX + 1));
        assert!(!angle_valid(ANGLE_MIN - 1));
    }

    #[test]
    fn layer_from_index() {
        assert_eq!(Layer::try_from(3), Ok(Layer::CopperBottom));
        assert_eq!(Layer::try_from(7), Ok(Layer::Mechanical));
        assert!(Layer::try_from(0).is_err());
        assert!(Layer::try_from(8).is_err());
    }

    #[test]
    fn layer_from_code() {
        assert_eq!(Layer::from_code("C1"), Some(Layer::CopperTop));
        assert_eq!(Layer::from_code("c2"), Some(Layer::CopperBottom));
        assert_eq!(Layer::from_code("o"), Some(Layer::Mechanical));
        assert_eq!(Layer::from_code("X9"), None);
    }

    #[test]
    fn dist_cooked() {
        let mut out = String::new();
        write_dist(&mut out, 1000, Format::cooked());
        assert_eq!(out, "0.1000mm");

        out.clear();
        write_dist(&mut out, -500, Format::cooked());
        assert_eq!(out, "-0.0500mm");

        out.clear();
        write_dist(&mut out, dist_mm(12) + 3456, Format::cooked());
        assert_eq!(out, "12.3456mm");

        out.clear();
        write_dist(&mut out, DIST_PER_TH, Format::Cooked(Unit::Th));
        assert_eq!(out, "1.000th");

        out.clear();
        write_dist(&mut out, 127, Format::Cooked(Unit::Th));
        assert_eq!(out, "0.500th");
    }

    #[test]
    fn dist_raw() {
        let mut out = String::new();
        write_dist(&mut out, -12345, Format::Raw);
        assert_eq!(out, "-12345");
    }

    #[test]
    fn angle_cooked() {
        let mut out = String::new();
        write_angle(&mut out, 45_000, Format::cooked());
        assert_eq!(out, "45.000deg");

        out.clear();
        write_angle(&mut out, -1_500, Format::cooked());
        assert_eq!(out, "-1.500deg");
    }

    #[test]
    fn point_round() {
        let mut out = String::new();
        write_point(&mut out, Point::new(100, -200), Format::Raw);
        assert_eq!(out, "100/-200");
    }

    #[test]
    fn string_delimiters() {
        let mut out = String::new();
        write_str(&mut out, "hello", Format::Raw);
        assert_eq!(out, "|hello|");

        out.clear();
        write_str(&mut out, "hello", Format::cooked());
        assert_eq!(out, "\"hello\"");
    }
}
