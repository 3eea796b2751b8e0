//! Connection status indicator.
//!
//! The page exposes two hooks: a panel that is hidden until the first
//! successful connection, and an icon whose class flips between a
//! "connected" and a "disconnected" class.

use livepage_dom::{DomError, LiveDom};

/// Element ids and classes of the status hooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSettings {
    /// Id of the panel made visible on first connection.
    pub panel_id: String,
    /// Id of the icon element.
    pub icon_id: String,
    /// Icon class while connected.
    pub connected_class: String,
    /// Icon class while disconnected.
    pub disconnected_class: String,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            panel_id: "websocket".to_owned(),
            icon_id: "websocketStatus".to_owned(),
            connected_class: "glyphicon-ok".to_owned(),
            disconnected_class: "glyphicon-remove".to_owned(),
        }
    }
}

/// Status hooks located on a page.
///
/// Either hook may be absent; updates to an absent hook are skipped.
#[derive(Clone, Debug)]
pub struct StatusIndicator<N> {
    panel: Option<N>,
    icon: Option<N>,
    settings: StatusSettings,
}

impl<N: Clone + PartialEq> StatusIndicator<N> {
    /// Create an indicator over the given hooks.
    #[must_use]
    pub fn new(panel: Option<N>, icon: Option<N>, settings: StatusSettings) -> Self {
        Self {
            panel,
            icon,
            settings,
        }
    }

    /// Show the panel and switch the icon to the connected class.
    ///
    /// # Errors
    ///
    /// Returns the DOM error if an attribute cannot be written.
    pub fn show_connected<D: LiveDom<Node = N>>(&self, dom: &mut D) -> Result<(), DomError> {
        if let Some(panel) = &self.panel {
            let style = dom.attribute(panel, "style").unwrap_or_default();
            dom.set_attribute(panel, "style", &set_style_property(&style, "display", "block"))?;
        }
        self.swap_icon_class(
            dom,
            &self.settings.disconnected_class,
            &self.settings.connected_class,
        )
    }

    /// Switch the icon to the disconnected class.
    ///
    /// # Errors
    ///
    /// Returns the DOM error if the class attribute cannot be written.
    pub fn show_disconnected<D: LiveDom<Node = N>>(&self, dom: &mut D) -> Result<(), DomError> {
        self.swap_icon_class(
            dom,
            &self.settings.connected_class,
            &self.settings.disconnected_class,
        )
    }

    fn swap_icon_class<D: LiveDom<Node = N>>(
        &self,
        dom: &mut D,
        remove: &str,
        add: &str,
    ) -> Result<(), DomError> {
        let Some(icon) = &self.icon else {
            return Ok(());
        };
        let current = dom.attribute(icon, "class").unwrap_or_default();
        let mut classes: Vec<&str> = current
            .split_whitespace()
            .filter(|class| *class != remove && *class != add)
            .collect();
        classes.push(add);
        dom.set_attribute(icon, "class", &classes.join(" "))
    }
}

/// Set one declaration in an inline `style` attribute value.
fn set_style_property(style: &str, property: &str, value: &str) -> String {
    let mut declarations: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .filter(|declaration| {
            declaration
                .split_once(':')
                .is_none_or(|(name, _)| !name.trim().eq_ignore_ascii_case(property))
        })
        .map(str::to_owned)
        .collect();
    declarations.push(format!("{property}: {value}"));
    declarations.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepage_dom::Document;
    use pretty_assertions::assert_eq;

    fn page() -> (Document, StatusIndicator<livepage_dom::NodeId>) {
        let doc = Document::parse(
            r#"<div id="websocket" style="display: none"><span id="websocketStatus" class="glyphicon glyphicon-remove"></span></div>"#,
        )
        .unwrap();
        let panel = doc.get_element_by_id("websocket");
        let icon = doc.get_element_by_id("websocketStatus");
        (doc, StatusIndicator::new(panel, icon, StatusSettings::default()))
    }

    #[test]
    fn test_show_connected() {
        let (mut doc, indicator) = page();

        indicator.show_connected(&mut doc).unwrap();

        let panel = doc.get_element_by_id("websocket").unwrap();
        let icon = doc.get_element_by_id("websocketStatus").unwrap();
        assert_eq!(doc.attribute(&panel, "style").unwrap(), "display: block");
        assert_eq!(
            doc.attribute(&icon, "class").unwrap(),
            "glyphicon glyphicon-ok"
        );
    }

    #[test]
    fn test_show_disconnected() {
        let (mut doc, indicator) = page();
        indicator.show_connected(&mut doc).unwrap();

        indicator.show_disconnected(&mut doc).unwrap();

        let icon = doc.get_element_by_id("websocketStatus").unwrap();
        assert_eq!(
            doc.attribute(&icon, "class").unwrap(),
            "glyphicon glyphicon-remove"
        );
    }

    #[test]
    fn test_missing_hooks_are_skipped() {
        let mut doc = Document::new();
        let indicator = StatusIndicator::new(None, None, StatusSettings::default());

        assert!(indicator.show_connected(&mut doc).is_ok());
        assert!(indicator.show_disconnected(&mut doc).is_ok());
    }

    #[test]
    fn test_set_style_property() {
        assert_eq!(
            set_style_property("color: red; display:none;", "display", "block"),
            "color: red; display: block"
        );
        assert_eq!(set_style_property("", "display", "block"), "display: block");
    }
}
