use crate::element::{drain_children, Element, Text, TextKind};
use crate::primitives::{angle_valid, Angle};
use crate::write::FieldSink;
use crate::{ErrorKind, PcbError};

/// A component: two dedicated text slots plus owned child elements.
///
/// The id and value slots hold [`TextKind::Id`] and [`TextKind::Value`]
/// texts; on the wire they travel as `ID_TEXT`/`VALUE_TEXT` children between
/// `BEGIN_COMPONENT` and `END_COMPONENT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    /// The component id label (reference designator), e.g. "U1".
    pub text_id: Text,
    /// The component value label, e.g. "10k".
    pub text_value: Text,
    /// The drawing objects making up the component.
    pub elements: Vec<Element>,

    /// Free-form comment.
    pub comment: Option<String>,
    /// Whether the component takes part in pick and place export.
    pub use_pickplace: bool,
    /// Package name for pick and place export.
    pub package: Option<String>,
    /// Rotation of the whole component.
    pub rotation: Angle,
}

impl Component {
    /// Creates a component from its slots and children, with every optional
    /// field at its default.
    pub fn new(
        text_id: Text,
        text_value: Text,
        elements: Vec<Element>,
    ) -> Result<Component, PcbError> {
        let component = Component {
            text_id,
            text_value,
            elements,
            comment: None,
            use_pickplace: false,
            package: None,
            rotation: 0,
        };
        if component.valid() {
            Ok(component)
        } else {
            Err(PcbError::new(
                ErrorKind::ArgumentRange,
                "component field out of range",
            ))
        }
    }

    /// Whether the slots carry the right text kinds and every field
    /// respects its range.
    pub fn valid(&self) -> bool {
        self.text_id.kind == TextKind::Id
            && self.text_id.valid()
            && self.text_value.kind == TextKind::Value
            && self.text_value.valid()
            && angle_valid(self.rotation)
    }

    pub(crate) fn write_fields(&self, f: &mut FieldSink<'_>) {
        if let Some(comment) = &self.comment {
            f.str_("COMMENT", "comment", comment);
        }
        f.bool_if("USE_PICKPLACE", "use pickplace", self.use_pickplace, false);
        if let Some(package) = &self.package {
            f.str_("PACKAGE", "package", package);
        }
        f.angle_if("ROTATION", "rotation", self.rotation, 0);
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        drain_children(&mut self.elements);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitives::{Layer, Point};

    fn slot(kind: TextKind, label: &str) -> Text {
        Text::new(kind, Layer::SilkscreenTop, Point::new(0, 0), 1000, label).unwrap()
    }

    #[test]
    fn defaults_installed() {
        let component =
            Component::new(slot(TextKind::Id, "U1"), slot(TextKind::Value, "MCU"), vec![])
                .unwrap();
        assert_eq!(component.comment, None);
        assert_eq!(component.package, None);
        assert!(!component.use_pickplace);
        assert_eq!(component.rotation, 0);
    }

    #[test]
    fn slot_kinds_are_checked() {
        // both slots the wrong way around
        let err = Component::new(slot(TextKind::Value, "U1"), slot(TextKind::Id, "MCU"), vec![])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentRange);
    }
}
