//! The serializer: walks an element tree and emits the raw on-wire format
//! or the cooked diagnostic format.
//!
//! Optional fields are emitted only when they differ from their documented
//! default, so a freshly constructed element serializes to its required
//! fields alone.

use core::fmt::Write as _;

use crate::element::{Element, PadForm, Text, TextStyle, TextThickness, MAX_DEPTH};
use crate::primitives::{
    write_angle, write_bool, write_dist, write_layer, write_point, write_str, Angle, Dist, Format,
    Layer, Point,
};
use crate::{ErrorKind, PcbError};

/// Two spaces per nesting level.
const INDENT: &str = "  ";

/// Serializes one element (and its children) into `out`.
pub fn write_element(element: &Element, out: &mut String, format: Format) -> Result<(), PcbError> {
    write_at_depth(element, out, format, 0)
}

/// Serializes a sequence of top-level elements into one string.
pub fn write_elements(elements: &[Element], format: Format) -> Result<String, PcbError> {
    let mut out = String::new();
    for element in elements {
        write_at_depth(element, &mut out, format, 0)?;
        if format.is_cooked() {
            out.push('\n');
        }
    }
    Ok(out)
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_at_depth(
    element: &Element,
    out: &mut String,
    format: Format,
    depth: usize,
) -> Result<(), PcbError> {
    if depth >= MAX_DEPTH {
        return Err(PcbError::new(
            ErrorKind::Recursion,
            format!("element nesting deeper than {MAX_DEPTH}"),
        ));
    }
    match format {
        Format::Raw => write_raw(element, out, depth),
        Format::Cooked(_) => write_cooked(element, out, format, depth),
    }
}

fn write_raw(element: &Element, out: &mut String, depth: usize) -> Result<(), PcbError> {
    indent(out, depth);
    out.push_str(element.tag());
    {
        let mut sink = FieldSink::new(out, Format::Raw);
        write_fields_of(element, &mut sink);
    }
    out.push(';');
    out.push('\n');

    match element {
        Element::Component(component) => {
            write_raw_text(&component.text_id, out, depth + 1)?;
            write_raw_text(&component.text_value, out, depth + 1)?;
            for child in &component.elements {
                write_at_depth(child, out, Format::Raw, depth + 1)?;
            }
        }
        Element::Group(group) => {
            for child in &group.elements {
                write_at_depth(child, out, Format::Raw, depth + 1)?;
            }
        }
        Element::Track(_)
        | Element::PadTht(_)
        | Element::PadSmt(_)
        | Element::Zone(_)
        | Element::Text(_)
        | Element::Circle(_) => {}
    }

    if let Some(closing) = element.closing_tag() {
        indent(out, depth);
        out.push_str(closing);
        out.push(';');
        out.push('\n');
    }
    Ok(())
}

/// A component id/value slot travels as an ordinary text child line.
fn write_raw_text(text: &Text, out: &mut String, depth: usize) -> Result<(), PcbError> {
    if depth >= MAX_DEPTH {
        return Err(PcbError::new(
            ErrorKind::Recursion,
            format!("element nesting deeper than {MAX_DEPTH}"),
        ));
    }
    indent(out, depth);
    out.push_str(text.kind.tag());
    {
        let mut sink = FieldSink::new(out, Format::Raw);
        text.write_fields(&mut sink);
    }
    out.push(';');
    out.push('\n');
    Ok(())
}

fn write_cooked(
    element: &Element,
    out: &mut String,
    format: Format,
    depth: usize,
) -> Result<(), PcbError> {
    out.push_str(element.name());
    out.push('{');
    match element {
        Element::Track(track) => {
            let mut sink = FieldSink::new(out, format);
            track.write_fields(&mut sink);
        }
        Element::PadTht(pad) => {
            let mut sink = FieldSink::new(out, format);
            pad.write_fields(&mut sink);
        }
        Element::PadSmt(pad) => {
            let mut sink = FieldSink::new(out, format);
            pad.write_fields(&mut sink);
        }
        Element::Zone(zone) => {
            let mut sink = FieldSink::new(out, format);
            zone.write_fields(&mut sink);
        }
        Element::Text(text) => {
            let mut sink = FieldSink::new(out, format);
            text.write_fields(&mut sink);
        }
        Element::Circle(circle) => {
            let mut sink = FieldSink::new(out, format);
            circle.write_fields(&mut sink);
        }
        Element::Component(component) => {
            out.push_str("id=");
            write_cooked_text(&component.text_id, out, format);
            out.push_str(", value=");
            write_cooked_text(&component.text_value, out, format);
            {
                let mut sink = FieldSink::continued(out, format);
                component.write_fields(&mut sink);
            }
            out.push_str(", ");
            write_cooked_children(&component.elements, out, format, depth)?;
        }
        Element::Group(group) => {
            write_cooked_children(&group.elements, out, format, depth)?;
        }
    }
    out.push('}');
    Ok(())
}

fn write_cooked_text(text: &Text, out: &mut String, format: Format) {
    out.push_str(text.kind.name());
    out.push('{');
    let mut sink = FieldSink::new(out, format);
    text.write_fields(&mut sink);
    out.push('}');
}

fn write_cooked_children(
    children: &[Element],
    out: &mut String,
    format: Format,
    depth: usize,
) -> Result<(), PcbError> {
    out.push_str("elements=[");
    if !children.is_empty() {
        out.push('\n');
        for (index, child) in children.iter().enumerate() {
            indent(out, depth + 1);
            write_at_depth(child, out, format, depth + 1)?;
            if index + 1 < children.len() {
                out.push(',');
            }
            out.push('\n');
        }
        indent(out, depth);
    }
    out.push(']');
    Ok(())
}

fn write_fields_of(element: &Element, sink: &mut FieldSink<'_>) {
    match element {
        Element::Track(track) => track.write_fields(sink),
        Element::PadTht(pad) => pad.write_fields(sink),
        Element::PadSmt(pad) => pad.write_fields(sink),
        Element::Zone(zone) => zone.write_fields(sink),
        Element::Text(text) => text.write_fields(sink),
        Element::Circle(circle) => circle.write_fields(sink),
        Element::Component(component) => component.write_fields(sink),
        Element::Group(_) => {}
    }
}

/// Writes `FIELD=value` pairs in the canonical order, raw or cooked.
///
/// Raw fields are always preceded by the statement separator (the tag came
/// first); cooked fields separate with `", "` after the first.
pub(crate) struct FieldSink<'a> {
    out: &'a mut String,
    format: Format,
    first: bool,
}

impl<'a> FieldSink<'a> {
    fn new(out: &'a mut String, format: Format) -> FieldSink<'a> {
        FieldSink {
            out,
            format,
            first: true,
        }
    }

    /// A sink continuing a cooked field list that already has entries.
    fn continued(out: &'a mut String, format: Format) -> FieldSink<'a> {
        FieldSink {
            out,
            format,
            first: false,
        }
    }

    fn begin(&mut self, raw: &str, cooked: &str, index: Option<usize>) {
        match self.format {
            Format::Raw => {
                self.out.push(',');
                self.out.push_str(raw);
            }
            Format::Cooked(_) => {
                if !self.first {
                    self.out.push_str(", ");
                }
                self.out.push_str(cooked);
            }
        }
        if let Some(index) = index {
            let _ = write!(self.out, "{index}");
        }
        self.out.push('=');
        self.first = false;
    }

    pub(crate) fn layer(&mut self, raw: &str, cooked: &str, layer: Layer) {
        self.begin(raw, cooked, None);
        write_layer(self.out, layer, self.format);
    }

    pub(crate) fn dist(&mut self, raw: &str, cooked: &str, dist: Dist) {
        self.begin(raw, cooked, None);
        write_dist(self.out, dist, self.format);
    }

    pub(crate) fn dist_if(&mut self, raw: &str, cooked: &str, dist: Dist, default: Dist) {
        if dist != default {
            self.dist(raw, cooked, dist);
        }
    }

    pub(crate) fn point(&mut self, raw: &str, cooked: &str, point: Point) {
        self.begin(raw, cooked, None);
        write_point(self.out, point, self.format);
    }

    pub(crate) fn point_indexed(&mut self, raw: &str, cooked: &str, index: usize, point: Point) {
        self.begin(raw, cooked, Some(index));
        write_point(self.out, point, self.format);
    }

    pub(crate) fn bool_if(&mut self, raw: &str, cooked: &str, val: bool, default: bool) {
        if val != default {
            self.begin(raw, cooked, None);
            write_bool(self.out, val);
        }
    }

    pub(crate) fn angle_if(&mut self, raw: &str, cooked: &str, angle: Angle, default: Angle) {
        if angle != default {
            self.begin(raw, cooked, None);
            write_angle(self.out, angle, self.format);
        }
    }

    pub(crate) fn int(&mut self, raw: &str, cooked: &str, val: i32) {
        self.begin(raw, cooked, None);
        let _ = write!(self.out, "{val}");
    }

    pub(crate) fn int_if(&mut self, raw: &str, cooked: &str, val: i32, default: i32) {
        if val != default {
            self.int(raw, cooked, val);
        }
    }

    pub(crate) fn int_indexed(&mut self, raw: &str, cooked: &str, index: usize, val: i32) {
        self.begin(raw, cooked, Some(index));
        let _ = write!(self.out, "{val}");
    }

    pub(crate) fn str_(&mut self, raw: &str, cooked: &str, val: &str) {
        self.begin(raw, cooked, None);
        write_str(self.out, val, self.format);
    }

    pub(crate) fn form(&mut self, raw: &str, cooked: &str, form: PadForm) {
        self.begin(raw, cooked, None);
        if self.format.is_cooked() {
            let _ = write!(self.out, "{form}");
        } else {
            let _ = write!(self.out, "{}", i32::from(form));
        }
    }

    pub(crate) fn style(&mut self, raw: &str, cooked: &str, style: TextStyle) {
        self.begin(raw, cooked, None);
        if self.format.is_cooked() {
            let _ = write!(self.out, "{style}");
        } else {
            let _ = write!(self.out, "{}", i32::from(style));
        }
    }

    pub(crate) fn thickness(&mut self, raw: &str, cooked: &str, thickness: TextThickness) {
        self.begin(raw, cooked, None);
        if self.format.is_cooked() {
            let _ = write!(self.out, "{thickness}");
        } else {
            let _ = write!(self.out, "{}", i32::from(thickness));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::element::{Component, Group, TextKind, Track};
    use crate::primitives::{Layer, Unit};
    use crate::testing::{assert_round_trip, parse_one, raw};

    fn track(points: Vec<Point>) -> Track {
        Track::new(Layer::CopperTop, 100, points).unwrap()
    }

    #[test]
    fn raw_track_line() {
        let element = parse_one("TRACK,LAYER=3,WIDTH=2000,P0=100/200,P1=300/400;");
        assert_eq!(
            raw(&[element]),
            "TRACK,LAYER=3,WIDTH=2000,P0=100/200,P1=300/400;\n"
        );
    }

    #[test]
    fn raw_omits_fields_at_their_default() {
        let element = Element::Track(track(vec![Point::new(0, 0)]));
        let out = raw(&[element]);
        assert_eq!(out, "TRACK,LAYER=1,WIDTH=100,P0=0/0;\n");
        assert!(!out.contains("CLEAR"));
        assert!(!out.contains("SOLDERMASK"));
    }

    #[test]
    fn raw_writes_changed_optionals() {
        let mut changed = track(vec![]);
        changed.clear = 8000;
        changed.flat_end = true;
        assert_eq!(
            raw(&[Element::Track(changed)]),
            "TRACK,LAYER=1,WIDTH=100,CLEAR=8000,FLATEND=true;\n"
        );
    }

    #[test]
    fn scenario_text_round_trip() {
        let input = "TEXT,LAYER=1,POS=0/0,HEIGHT=1000,TEXT=|hello|,CLEAR=8000,STYLE=NARROW;";
        let element = parse_one(input);
        let out = raw(&[element.clone()]);
        assert_eq!(
            out,
            "TEXT,LAYER=1,POS=0/0,HEIGHT=1000,TEXT=|hello|,CLEAR=8000,STYLE=0;\n"
        );
        assert_round_trip(&[element]);
    }

    #[test]
    fn cooked_text() {
        let element =
            parse_one("TEXT,LAYER=1,POS=0/0,HEIGHT=1000,TEXT=|hello|,CLEAR=8000,STYLE=NARROW;");
        let mut out = String::new();
        write_element(&element, &mut out, Format::cooked()).unwrap();
        assert_eq!(
            out,
            "text{layer=top copper, position=0.0000mm/0.0000mm, height=0.1000mm, \
             text=\"hello\", clear=0.8000mm, style=narrow}"
        );
    }

    #[test]
    fn cooked_units_are_selectable() {
        let element = Element::Track(track(vec![]));
        let mut out = String::new();
        write_element(&element, &mut out, Format::Cooked(Unit::Um)).unwrap();
        assert_eq!(out, "track{layer=top copper, width=10.0um}");
    }

    #[test]
    fn raw_group_nests_with_indent() {
        let element = parse_one("GROUP;TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;END_GROUP;");
        assert_eq!(
            raw(&[element]),
            "GROUP;\n  TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;\nEND_GROUP;\n"
        );
    }

    #[test]
    fn raw_component_writes_slots_first() {
        let element = parse_one(
            "BEGIN_COMPONENT;\
             ID_TEXT,LAYER=2,POS=0/0,HEIGHT=1000,TEXT=|U1|;\
             VALUE_TEXT,LAYER=2,POS=0/100,HEIGHT=1000,TEXT=|MCU|;\
             PAD,LAYER=1,POS=0/0,SIZE=2000,DRILL=800,FORM=2;\
             END_COMPONENT;",
        );
        assert_eq!(
            raw(&[element]),
            "BEGIN_COMPONENT;\n\
             \x20\x20ID_TEXT,LAYER=2,POS=0/0,HEIGHT=1000,TEXT=|U1|;\n\
             \x20\x20VALUE_TEXT,LAYER=2,POS=0/100,HEIGHT=1000,TEXT=|MCU|;\n\
             \x20\x20PAD,LAYER=1,POS=0/0,SIZE=2000,DRILL=800,FORM=2;\n\
             END_COMPONENT;\n"
        );
    }

    #[test]
    fn cooked_group_indents_children() {
        let element = parse_one("GROUP;TRACK,LAYER=1,WIDTH=100;END_GROUP;");
        let mut out = String::new();
        write_element(&element, &mut out, Format::cooked()).unwrap();
        assert_eq!(
            out,
            "group{elements=[\n  track{layer=top copper, width=0.0100mm}\n]}"
        );
    }

    #[test]
    fn indexed_points_round_trip() {
        for count in [0usize, 1, 2, 1024] {
            let points: Vec<Point> = (0..count)
                .map(|i| Point::new(i as i32, (i as i32) * 2))
                .collect();
            let element = Element::Track(track(points));
            let out = raw(&[element.clone()]);
            if count > 0 {
                assert!(out.contains(&format!("P{}=", count - 1)));
            }
            assert_round_trip(&[element]);
        }
    }

    #[test]
    fn pad_link_round_trip() {
        let element = parse_one(
            "PAD,LAYER=1,POS=0/0,SIZE=2000,DRILL=800,FORM=1,PAD_ID=7,CON0=1,CON1=4;",
        );
        let out = raw(&[element.clone()]);
        assert!(out.contains("PAD_ID=7"));
        assert!(out.contains("CON0=1,CON1=4"));
        assert_round_trip(&[element]);
    }

    #[test]
    fn write_rejects_trees_past_the_depth_cap() {
        let mut element = Element::Group(Group::new(vec![]));
        for _ in 0..MAX_DEPTH {
            element = Element::Group(Group::new(vec![element]));
        }
        let mut out = String::new();
        let err = write_element(&element, &mut out, Format::Raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Recursion);
    }

    #[test]
    fn component_slots_always_written() {
        // a defaulted component still carries both slot lines
        let component = Component::new(
            crate::element::Text::new(TextKind::Id, Layer::SilkscreenTop, Point::new(0, 0), 0, "")
                .unwrap(),
            crate::element::Text::new(
                TextKind::Value,
                Layer::SilkscreenTop,
                Point::new(0, 0),
                0,
                "",
            )
            .unwrap(),
            vec![],
        )
        .unwrap();
        let out = raw(&[Element::Component(component)]);
        assert!(out.contains("ID_TEXT,"));
        assert!(out.contains("VALUE_TEXT,"));
    }
}
