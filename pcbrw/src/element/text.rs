use core::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::warn;

use crate::parse::{Statement, Value};
use crate::primitives::{angle_valid, size_valid, Angle, Dist, Layer, Point};
use crate::source::Origin;
use crate::write::FieldSink;
use crate::{ErrorKind, PcbError};

/// What role a text element plays.
///
/// `Id` and `Value` texts normally live in the two dedicated slots of a
/// component; outside one they surface as plain text elements carrying the
/// subtype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Free-standing text.
    #[default]
    Regular,
    /// The id label of a component (`ID_TEXT`).
    Id,
    /// The value label of a component (`VALUE_TEXT`).
    Value,
}

impl TextKind {
    /// The wire tag selecting this text kind.
    pub fn tag(self) -> &'static str {
        match self {
            TextKind::Regular => "TEXT",
            TextKind::Id => "ID_TEXT",
            TextKind::Value => "VALUE_TEXT",
        }
    }

    /// The human readable name used in cooked output.
    pub fn name(self) -> &'static str {
        match self {
            TextKind::Regular => "text",
            TextKind::Id => "ID text",
            TextKind::Value => "value text",
        }
    }
}

/// The glyph width class of a text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum TextStyle {
    /// Narrow width glyphs.
    Narrow = 0,
    /// Regular width glyphs.
    #[default]
    Regular,
    /// Wide glyphs.
    Wide,
}

impl TextStyle {
    fn keyword(self) -> &'static str {
        match self {
            TextStyle::Narrow => "NARROW",
            TextStyle::Regular => "REGULAR",
            TextStyle::Wide => "WIDE",
        }
    }

    fn from_statement(stmt: &Statement) -> Result<TextStyle, PcbError> {
        keyword_or_index(
            stmt,
            "text style",
            &[TextStyle::Narrow, TextStyle::Regular, TextStyle::Wide],
            TextStyle::keyword,
        )
    }
}

impl Display for TextStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            TextStyle::Narrow => "narrow",
            TextStyle::Regular => "regular",
            TextStyle::Wide => "wide",
        };
        f.write_str(name)
    }
}

/// The stroke thickness class of a text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum TextThickness {
    /// Thin strokes.
    Thin = 0,
    /// Regular strokes.
    #[default]
    Regular,
    /// Thick strokes.
    Thick,
}

impl TextThickness {
    fn keyword(self) -> &'static str {
        match self {
            TextThickness::Thin => "THIN",
            TextThickness::Regular => "REGULAR",
            TextThickness::Thick => "THICK",
        }
    }

    fn from_statement(stmt: &Statement) -> Result<TextThickness, PcbError> {
        keyword_or_index(
            stmt,
            "text thickness",
            &[
                TextThickness::Thin,
                TextThickness::Regular,
                TextThickness::Thick,
            ],
            TextThickness::keyword,
        )
    }
}

impl Display for TextThickness {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            TextThickness::Thin => "thin",
            TextThickness::Regular => "regular",
            TextThickness::Thick => "thick",
        };
        f.write_str(name)
    }
}

/// Decodes an enumerated value given either as a keyword or as its index.
fn keyword_or_index<T>(
    stmt: &Statement,
    what: &str,
    all: &[T],
    keyword: fn(T) -> &'static str,
) -> Result<T, PcbError>
where
    T: Copy + TryFrom<i32>,
{
    match stmt.value()? {
        Value::Int(index) => T::try_from(*index).map_err(|_| {
            PcbError::at(
                ErrorKind::ArgumentRange,
                stmt.origin,
                format!("{what} out of range: {index}"),
            )
        }),
        Value::Word(word) => all
            .iter()
            .copied()
            .find(|value| keyword(*value).eq_ignore_ascii_case(word))
            .ok_or_else(|| {
                PcbError::at(
                    ErrorKind::ArgumentFormat,
                    stmt.origin,
                    format!("unknown {what}: {word}"),
                )
            }),
        Value::Str(_) | Value::Pair(..) => Err(PcbError::at(
            ErrorKind::ArgumentFormat,
            stmt.origin,
            format!("{what} expects a name or an index"),
        )),
    }
}

/// A text label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    /// The role this text plays; encoded through the element tag.
    pub kind: TextKind,
    /// The layer the text is drawn on.
    pub layer: Layer,
    /// Position of the text anchor.
    pub position: Point,
    /// Glyph height.
    pub height: Dist,
    /// The label contents. The wire format has no escape, so the text must
    /// not contain the `|` delimiter or a line break.
    pub text: String,

    /// Clearance to surrounding copper. Default 0.4 mm.
    pub clear: Dist,
    /// Whether the text is subtracted from a ground plane instead of drawn.
    pub cutout: bool,
    /// Whether the text is exposed in the soldermask.
    pub soldermask: bool,
    /// Glyph width class.
    pub style: TextStyle,
    /// Stroke thickness class.
    pub thickness: TextThickness,
    /// Rotation around the anchor.
    pub rotation: Angle,
    /// Whether the text is mirrored horizontally.
    pub mirror_horizontal: bool,
    /// Whether the text is mirrored vertically.
    pub mirror_vertical: bool,
    /// Whether the text is visible. Default true.
    pub visible: bool,
}

impl Text {
    /// Default clearance.
    pub const DEFAULT_CLEAR: Dist = 4000;

    /// Creates a text from its required fields, with every optional field
    /// at its default.
    pub fn new(
        kind: TextKind,
        layer: Layer,
        position: Point,
        height: Dist,
        text: impl Into<String>,
    ) -> Result<Text, PcbError> {
        let text = Text {
            kind,
            layer,
            position,
            height,
            text: text.into(),
            clear: Text::DEFAULT_CLEAR,
            cutout: false,
            soldermask: false,
            style: TextStyle::default(),
            thickness: TextThickness::default(),
            rotation: 0,
            mirror_horizontal: false,
            mirror_vertical: false,
            visible: true,
        };
        if text.valid() {
            Ok(text)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "text field out of range",
            ))
        }
    }

    /// A defaulted text filling a component slot that the input left empty.
    pub(crate) fn placeholder(kind: TextKind) -> Text {
        Text {
            kind,
            layer: Layer::SilkscreenTop,
            position: Point::new(0, 0),
            height: 0,
            text: String::new(),
            clear: Text::DEFAULT_CLEAR,
            cutout: false,
            soldermask: false,
            style: TextStyle::default(),
            thickness: TextThickness::default(),
            rotation: 0,
            mirror_horizontal: false,
            mirror_vertical: false,
            visible: true,
        }
    }

    /// Whether every field respects its range.
    pub fn valid(&self) -> bool {
        self.position.valid()
            && size_valid(self.height)
            && size_valid(self.clear)
            && angle_valid(self.rotation)
    }

    pub(crate) fn from_statements(
        kind: TextKind,
        origin: Origin,
        stmts: &[Statement],
    ) -> Result<Text, PcbError> {
        let mut layer = None;
        let mut position = None;
        let mut height = None;
        let mut contents = None;
        let mut clear = Text::DEFAULT_CLEAR;
        let mut cutout = false;
        let mut soldermask = false;
        let mut style = TextStyle::default();
        let mut thickness = TextThickness::default();
        let mut rotation = 0;
        let mut mirror_horizontal = false;
        let mut mirror_vertical = false;
        let mut visible = true;

        for stmt in stmts {
            if stmt.is("LAYER") {
                layer = Some(stmt.layer_value()?);
            } else if stmt.is("POS") {
                position = Some(stmt.point_value()?);
            } else if stmt.is("HEIGHT") {
                height = Some(stmt.size_value()?);
            } else if stmt.is("TEXT") {
                contents = Some(stmt.str_value()?);
            } else if stmt.is("CLEAR") {
                clear = stmt.size_value()?;
            } else if stmt.is("CUTOUT") {
                cutout = stmt.bool_value()?;
            } else if stmt.is("SOLDERMASK") {
                soldermask = stmt.bool_value()?;
            } else if stmt.is("STYLE") {
                style = TextStyle::from_statement(stmt)?;
            } else if stmt.is("THICKNESS") {
                thickness = TextThickness::from_statement(stmt)?;
            } else if stmt.is("ROTATION") {
                rotation = stmt.angle_value()?;
            } else if stmt.is("MIRROR_HORZ") {
                mirror_horizontal = stmt.bool_value()?;
            } else if stmt.is("MIRROR_VERT") {
                mirror_vertical = stmt.bool_value()?;
            } else if stmt.is("VISIBLE") {
                visible = stmt.bool_value()?;
            } else {
                warn!("unknown text statement skipped: {}", stmt.name);
            }
        }

        let (Some(layer), Some(position), Some(height), Some(contents)) =
            (layer, position, height, contents)
        else {
            return Err(PcbError::at(
                ErrorKind::Syntax,
                origin,
                "text missing a required field (LAYER, POS, HEIGHT, TEXT)",
            ));
        };
        let text = Text {
            kind,
            layer,
            position,
            height,
            text: contents,
            clear,
            cutout,
            soldermask,
            style,
            thickness,
            rotation,
            mirror_horizontal,
            mirror_vertical,
            visible,
        };
        if text.valid() {
            Ok(text)
        } else {
            Err(PcbError::at(
                ErrorKind::ArgumentRange,
                origin,
                "text field out of range",
            ))
        }
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        f.layer("LAYER", "layer", self.layer);
        f.point("POS", "position", self.position);
        f.dist("HEIGHT", "height", self.height);
        f.str_("TEXT", "text", &self.text);
        f.dist_if("CLEAR", "clear", self.clear, Text::DEFAULT_CLEAR);
        f.bool_if("CUTOUT", "cutout", self.cutout, false);
        f.bool_if("SOLDERMASK", "soldermask", self.soldermask, false);
        if self.style != TextStyle::default() {
            f.style("STYLE", "style", self.style);
        }
        if self.thickness != TextThickness::default() {
            f.thickness("THICKNESS", "thickness", self.thickness);
        }
        f.angle_if("ROTATION", "rotation", self.rotation, 0);
        f.bool_if("MIRROR_HORZ", "mirror horizontal", self.mirror_horizontal, false);
        f.bool_if("MIRROR_VERT", "mirror vertical", self.mirror_vertical, false);
        f.bool_if("VISIBLE", "visible", self.visible, true);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_installed() {
        let text = Text::new(
            TextKind::Regular,
            Layer::SilkscreenTop,
            Point::new(0, 0),
            1000,
            "U1",
        )
        .unwrap();
        assert_eq!(text.style, TextStyle::Regular);
        assert_eq!(text.thickness, TextThickness::Regular);
        assert!(text.visible);
        assert!(!text.mirror_horizontal);
    }

    #[test]
    fn height_range() {
        let err = Text::new(
            TextKind::Regular,
            Layer::SilkscreenTop,
            Point::new(0, 0),
            -1,
            "x",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentRange);
    }

    #[test]
    fn rotation_range() {
        let mut text = Text::new(
            TextKind::Regular,
            Layer::SilkscreenTop,
            Point::new(0, 0),
            1000,
            "x",
        )
        .unwrap();
        text.rotation = 360_000;
        assert!(text.valid());
        text.rotation = 360_001;
        assert!(!text.valid());
        text.rotation = -360_001;
        assert!(!text.valid());
    }

    #[test]
    fn placeholder_is_valid() {
        assert!(Text::placeholder(TextKind::Id).valid());
        assert_eq!(Text::placeholder(TextKind::Value).kind, TextKind::Value);
    }
}
