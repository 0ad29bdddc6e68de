//! Simple element selectors.

use crate::node::Element;

/// A single-step element selector.
///
/// Covers the handful of selector forms the engine and its side-modules
/// need: a tag name, `#id`, `.class`, `[attr]` and `[attr=value]`.
/// Compound and descendant selectors are not supported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Element with the given tag name (case-insensitive).
    Tag(String),
    /// Element whose `id` attribute equals the value.
    Id(String),
    /// Element whose `class` list contains the value.
    Class(String),
    /// Element carrying the attribute, whatever its value.
    Attr(String),
    /// Element whose attribute equals the value.
    AttrEq(String, String),
}

impl Selector {
    /// Match elements by tag name.
    #[must_use]
    pub fn tag(name: &str) -> Self {
        Self::Tag(name.to_ascii_lowercase())
    }

    /// Match the element with the given id.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Match elements with the given class.
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Match elements carrying an attribute.
    #[must_use]
    pub fn attr(name: impl Into<String>) -> Self {
        Self::Attr(name.into())
    }

    /// Match elements whose attribute has an exact value.
    #[must_use]
    pub fn attr_eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttrEq(name.into(), value.into())
    }

    /// Parse a selector string.
    ///
    /// Returns `None` for empty input or unsupported syntax.
    ///
    /// ```
    /// use sym_dom::Selector;
    ///
    /// assert_eq!(Selector::parse(".main-content"), Some(Selector::class("main-content")));
    /// assert_eq!(Selector::parse("[data-bind=title]"), Some(Selector::attr_eq("data-bind", "title")));
    /// assert_eq!(Selector::parse("nav a"), None);
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains(char::is_whitespace) {
            return None;
        }

        if let Some(id) = input.strip_prefix('#') {
            return (!id.is_empty()).then(|| Self::id(id));
        }
        if let Some(class) = input.strip_prefix('.') {
            return (!class.is_empty()).then(|| Self::class(class));
        }
        if let Some(inner) = input.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return match inner.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    let value = value.trim_matches(|c| c == '"' || c == '\'');
                    Some(Self::attr_eq(name, value))
                }
                Some(_) => None,
                None if inner.is_empty() => None,
                None => Some(Self::attr(inner)),
            };
        }

        input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
            .then(|| Self::tag(input))
    }

    /// Check whether an element matches this selector.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Tag(name) => element.tag.eq_ignore_ascii_case(name),
            Self::Id(id) => element.attr("id") == Some(id.as_str()),
            Self::Class(class) => element.has_class(class),
            Self::Attr(name) => element.has_attr(name),
            Self::AttrEq(name, value) => element.attr(name) == Some(value.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_lowercases() {
        assert_eq!(Selector::parse("THEAD"), Some(Selector::Tag("thead".to_owned())));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(Selector::parse("#theme-toggle"), Some(Selector::id("theme-toggle")));
    }

    #[test]
    fn test_parse_attr_quoted_value() {
        assert_eq!(
            Selector::parse(r#"[rel="stylesheet"]"#),
            Some(Selector::attr_eq("rel", "stylesheet"))
        );
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        assert_eq!(Selector::parse(""), None);
        assert_eq!(Selector::parse("#"), None);
        assert_eq!(Selector::parse("[]"), None);
        assert_eq!(Selector::parse("[=x]"), None);
        assert_eq!(Selector::parse("a > b"), None);
        assert_eq!(Selector::parse("a:hover"), None);
    }

    #[test]
    fn test_matches_class_in_list() {
        let el = Element::new("main").with_attr("class", "main-content wide");

        assert!(Selector::class("main-content").matches(&el));
        assert!(Selector::class("wide").matches(&el));
        assert!(!Selector::class("main").matches(&el));
    }

    #[test]
    fn test_matches_tag_case_insensitive() {
        let el = Element::new("TBODY");

        assert!(Selector::tag("tbody").matches(&el));
    }

    #[test]
    fn test_matches_valueless_attr() {
        let el = Element::new("p").with_attr("optional", "");

        assert!(Selector::attr("optional").matches(&el));
        assert!(!Selector::attr_eq("optional", "yes").matches(&el));
    }
}
