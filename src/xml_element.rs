/// A struct for constructing XML elements.
///
/// Builds a tree of elements with attributes and children and serializes it
/// through `std::fmt::Display`. Attribute values are written verbatim; the
/// SVG backend only emits values that need no escaping.
pub(crate) struct XmlElement {
    tag: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub(crate) fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute to the element.
    pub(crate) fn add_attribute(&mut self, name: &'static str, value: impl ToString) {
        self.attributes.push((name, value.to_string()));
    }

    /// Adds an attribute to the element.
    pub(crate) fn with_attribute(mut self, name: &'static str, value: impl ToString) -> Self {
        self.add_attribute(name, value);
        self
    }

    /// Adds a child element.
    pub(crate) fn add_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Adds a child element.
    pub(crate) fn with_child(mut self, child: XmlElement) -> Self {
        self.add_child(child);
        self
    }
}

impl std::fmt::Display for XmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, value)?;
        }

        if self.children.is_empty() {
            write!(f, "/>")?;
        } else {
            write!(f, ">")?;
            for child in &self.children {
                write!(f, "{}", child)?;
            }
            write!(f, "</{}>", self.tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_element() {
        let el = XmlElement::new("rect");
        assert_eq!(el.to_string(), "<rect/>");
    }

    #[test]
    fn element_with_attributes() {
        let el = XmlElement::new("rect")
            .with_attribute("x", 10)
            .with_attribute("y", "20");
        assert_eq!(el.to_string(), "<rect x=\"10\" y=\"20\"/>");
    }

    #[test]
    fn nested_structure() {
        let child1 = XmlElement::new("stop").with_attribute("offset", 0);
        let child2 = XmlElement::new("stop");
        let parent = XmlElement::new("linearGradient")
            .with_attribute("id", "g0")
            .with_child(child1)
            .with_child(child2);

        assert_eq!(
            parent.to_string(),
            "<linearGradient id=\"g0\"><stop offset=\"0\"/><stop/></linearGradient>"
        );
    }
}
