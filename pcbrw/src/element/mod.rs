//! The element tree: one typed record per drawing object, with documented
//! defaults, validation, and the tag keywords tying them to the wire format.

use core::fmt::{Display, Formatter};

pub mod circle;
pub mod component;
pub mod group;
pub mod pad;
pub mod text;
pub mod track;
pub mod zone;

pub use circle::Circle;
pub use component::Component;
pub use group::Group;
pub use pad::{Link, PadForm, PadSmt, PadTht};
pub use text::{Text, TextKind, TextStyle, TextThickness};
pub use track::Track;
pub use zone::Zone;

/// The maximum element nesting depth, shared by the parser, the serializer
/// and the teardown path.
pub const MAX_DEPTH: usize = 1000;

/// One drawing object of a board.
///
/// Components and groups own nested elements; everything reachable from an
/// element is owned by it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// A conductive trace along a point sequence.
    Track(Track),
    /// A through-hole pad.
    PadTht(PadTht),
    /// A surface-mount pad.
    PadSmt(PadSmt),
    /// A filled or hatched copper area.
    Zone(Zone),
    /// A text label (regular, or a component id/value slot).
    Text(Text),
    /// A circle or arc.
    Circle(Circle),
    /// A component: id and value texts plus child elements.
    Component(Component),
    /// An anonymous grouping of child elements.
    Group(Group),
}

impl Element {
    /// The opening tag word of this element on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Element::Track(_) => "TRACK",
            Element::PadTht(_) => "PAD",
            Element::PadSmt(_) => "SMDPAD",
            Element::Zone(_) => "ZONE",
            Element::Text(text) => text.kind.tag(),
            Element::Circle(_) => "CIRCLE",
            Element::Component(_) => "BEGIN_COMPONENT",
            Element::Group(_) => "GROUP",
        }
    }

    /// The closing tag word, for the two container cases.
    pub fn closing_tag(&self) -> Option<&'static str> {
        match self {
            Element::Component(_) => Some("END_COMPONENT"),
            Element::Group(_) => Some("END_GROUP"),
            Element::Track(_)
            | Element::PadTht(_)
            | Element::PadSmt(_)
            | Element::Zone(_)
            | Element::Text(_)
            | Element::Circle(_) => None,
        }
    }

    /// The human readable element name used in cooked output.
    pub fn name(&self) -> &'static str {
        match self {
            Element::Track(_) => "track",
            Element::PadTht(_) => "THT pad",
            Element::PadSmt(_) => "SMT pad",
            Element::Zone(_) => "zone",
            Element::Text(text) => text.kind.name(),
            Element::Circle(_) => "circle",
            Element::Component(_) => "component",
            Element::Group(_) => "group",
        }
    }

    /// Whether every field of this element (without descending into
    /// children) respects its range invariants.
    pub fn valid(&self) -> bool {
        match self {
            Element::Track(track) => track.valid(),
            Element::PadTht(pad) => pad.valid(),
            Element::PadSmt(pad) => pad.valid(),
            Element::Zone(zone) => zone.valid(),
            Element::Text(text) => text.valid(),
            Element::Circle(circle) => circle.valid(),
            Element::Component(component) => component.valid(),
            // groups have no fields of their own
            Element::Group(_) => true,
        }
    }

    /// The nested child elements, for the two container cases.
    pub fn children(&self) -> &[Element] {
        match self {
            Element::Component(component) => &component.elements,
            Element::Group(group) => &group.elements,
            Element::Track(_)
            | Element::PadTht(_)
            | Element::PadSmt(_)
            | Element::Zone(_)
            | Element::Text(_)
            | Element::Circle(_) => &[],
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// An element tag word, resolved case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tag {
    Track,
    PadTht,
    PadSmt,
    Zone,
    Text(TextKind),
    Circle,
    BeginComponent,
    EndComponent,
    BeginGroup,
    EndGroup,
}

impl Tag {
    pub(crate) fn lookup(word: &str) -> Option<Tag> {
        const TAGS: [(&str, Tag); 12] = [
            ("TRACK", Tag::Track),
            ("PAD", Tag::PadTht),
            ("SMDPAD", Tag::PadSmt),
            ("ZONE", Tag::Zone),
            ("TEXT", Tag::Text(TextKind::Regular)),
            ("ID_TEXT", Tag::Text(TextKind::Id)),
            ("VALUE_TEXT", Tag::Text(TextKind::Value)),
            ("CIRCLE", Tag::Circle),
            ("BEGIN_COMPONENT", Tag::BeginComponent),
            ("END_COMPONENT", Tag::EndComponent),
            ("GROUP", Tag::BeginGroup),
            ("END_GROUP", Tag::EndGroup),
        ];
        TAGS.into_iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map(|(_, tag)| tag)
    }
}

/// Checks that an indexed statement continues its sequence: indices must be
/// contiguous, zero-based and ascending.
pub(crate) fn check_index(
    stmt: &crate::parse::Statement,
    len: usize,
) -> Result<(), crate::PcbError> {
    use crate::{ErrorKind, PcbError};
    let index = stmt.index.ok_or_else(|| {
        PcbError::at(
            ErrorKind::Syntax,
            stmt.origin,
            format!("{} requires an index", stmt.name),
        )
    })?;
    if index < 0 || index as usize != len {
        return Err(PcbError::at(
            ErrorKind::Syntax,
            stmt.origin,
            format!("{}{} out of sequence, expected {}{}", stmt.name, index, stmt.name, len),
        ));
    }
    Ok(())
}

/// Drains a child list without recursing, so that trees at the depth cap
/// cannot overflow the stack during teardown.
pub(crate) fn drain_children(elements: &mut Vec<Element>) {
    let mut stack = core::mem::take(elements);
    while let Some(mut element) = stack.pop() {
        match &mut element {
            Element::Component(component) => stack.append(&mut component.elements),
            Element::Group(group) => stack.append(&mut group.elements),
            Element::Track(_)
            | Element::PadTht(_)
            | Element::PadSmt(_)
            | Element::Zone(_)
            | Element::Text(_)
            | Element::Circle(_) => {}
        }
        // element is childless here and drops without nested recursion
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitives::{Layer, Point};

    #[test]
    fn tag_lookup_is_case_insensitive() {
        assert_eq!(Tag::lookup("TRACK"), Some(Tag::Track));
        assert_eq!(Tag::lookup("track"), Some(Tag::Track));
        assert_eq!(Tag::lookup("SmdPad"), Some(Tag::PadSmt));
        assert_eq!(Tag::lookup("end_group"), Some(Tag::EndGroup));
        assert_eq!(Tag::lookup("id_text"), Some(Tag::Text(TextKind::Id)));
        assert_eq!(Tag::lookup("SPIRAL"), None);
    }

    #[test]
    fn deep_tree_teardown() {
        // a tree at the depth cap must drop without blowing the stack
        let mut element = Element::Group(Group::new(vec![]));
        for _ in 1..MAX_DEPTH {
            element = Element::Group(Group::new(vec![element]));
        }
        drop(element);
    }

    #[test]
    fn display_names() {
        let track = Element::Track(
            Track::new(Layer::CopperTop, 100, vec![Point::new(0, 0)]).unwrap(),
        );
        assert_eq!(track.to_string(), "track");
        assert_eq!(track.tag(), "TRACK");
        assert_eq!(track.closing_tag(), None);
    }
}
