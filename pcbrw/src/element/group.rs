use crate::element::{drain_children, Element};

/// An anonymous grouping of elements, selected and moved as one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    /// The grouped elements, in input order.
    pub elements: Vec<Element>,
}

impl Group {
    /// Creates a group over `elements`.
    ///
    /// Groups have no fields of their own; only their children constrain
    /// validity, and those are checked per element.
    pub fn new(elements: Vec<Element>) -> Group {
        Group { elements }
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        drain_children(&mut self.elements);
    }
}
