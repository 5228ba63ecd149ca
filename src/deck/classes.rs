//! Page display classes and presentation toggles.
//!
//! The first class of a page selects its color scheme out of a toggle cycle,
//! either the page's own `classtoggle` list or the deck-wide cycle. Class
//! changes are author-visible: they are written unmarked and show up in
//! exports.

use super::Deck;
use crate::diagnostics::Diagnostic;
use crate::dom::NodeId;
use crate::error::Result;
use crate::provenance::set_state_attr;

/// Class assumed for pages without one.
const FALLBACK_CLASS: &str = "white";
/// Tag of optional annotations.
const ANNOTATION_TAG: &str = "ann";
/// Smallest base font size, in percent.
const MIN_FONT_SIZE: u32 = 10;

impl Deck {
    fn toggle_cycle(&self, page: NodeId) -> Vec<String> {
        match self.doc.attr(page, "classtoggle") {
            Some(list) => list.split_whitespace().map(String::from).collect(),
            None => self.config.class_cycle.clone(),
        }
    }

    /// `class` is never marked, so the new value shows up in exports.
    fn write_class(&mut self, page: NodeId, classes: &[String]) {
        self.doc.set_attr(page, "class", classes.join(" "));
        self.notify_change(page);
    }

    /// Advance page `n`'s first class one step through its toggle cycle.
    pub fn toggle_page_class(&mut self, n: usize) -> Result<()> {
        let Some(page) = self.registry.page(n) else {
            return Err(self.not_found(&n.to_string(), format!("No such location: {n}")));
        };
        let cycle = self.toggle_cycle(page);
        let mut classes: Vec<String> = match self.doc.attr(page, "class") {
            Some(class) => class.split_whitespace().map(String::from).collect(),
            None => vec![FALLBACK_CLASS.to_string()],
        };

        if cycle.is_empty() {
            let next = if classes.first().map(String::as_str) == Some("black") {
                "white"
            } else {
                "black"
            };
            if classes.is_empty() {
                classes.push(next.to_string());
            } else {
                classes[0] = next.to_string();
            }
        } else if classes.is_empty() {
            classes.push(cycle.get(1).unwrap_or(&cycle[0]).clone());
        } else {
            match cycle.iter().position(|c| *c == classes[0]) {
                Some(i) => classes[0] = cycle[(i + 1) % cycle.len()].clone(),
                None => {
                    self.diagnostics.push(Diagnostic::StructuralWarning(format!(
                        "toggling class '{}' of slide {n} might not be safe",
                        classes[0]
                    )));
                    classes.insert(0, cycle[0].clone());
                }
            }
        }
        self.write_class(page, &classes);
        Ok(())
    }

    /// Make `class` the first class of page `n`.
    pub fn set_page_class(&mut self, n: usize, class: &str) -> Result<()> {
        let Some(page) = self.registry.page(n) else {
            return Err(self.not_found(&n.to_string(), format!("No such location: {n}")));
        };
        self.set_class_of(page, class);
        Ok(())
    }

    /// Replace the cycle class of `page` with `class`.
    ///
    /// The first class is replaced when it belongs to the toggle cycle,
    /// otherwise `class` is put in front. A page-local cycle that lacks
    /// `class` gains it.
    fn set_class_of(&mut self, page: NodeId, class: &str) {
        let mut classes: Vec<String> = self
            .doc
            .attr(page, "class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        if classes.first().map(String::as_str) == Some(class) {
            return;
        }

        if let Some(list) = self.doc.attr(page, "classtoggle") {
            let mut local: Vec<String> = list.split_whitespace().map(String::from).collect();
            if !local.iter().any(|c| c == class) {
                local.push(class.to_string());
                self.doc.set_attr(page, "classtoggle", local.join(" "));
            }
        }

        let cycle = self.toggle_cycle(page);
        if classes.first().is_some_and(|first| cycle.contains(first)) {
            classes[0] = class.to_string();
        } else {
            classes.insert(0, class.to_string());
        }
        self.write_class(page, &classes);
    }

    /// Give every page `class`, adding it to the deck cycle if needed.
    pub fn set_all_page_classes(&mut self, class: &str) {
        if !self.config.class_cycle.iter().any(|c| c == class) {
            self.config.class_cycle.push(class.to_string());
        }
        for page in self.registry.pages().to_vec() {
            self.set_class_of(page, class);
        }
    }

    /// Give every page the head of the deck cycle, then rotate the cycle.
    pub fn toggle_all_page_classes(&mut self) {
        if self.config.class_cycle.len() < 2 {
            return;
        }
        let head = self.config.class_cycle[0].clone();
        self.set_all_page_classes(&head);
        self.config.class_cycle.rotate_left(1);
    }

    /// Show or hide every `ann` element at once.
    pub fn toggle_annotations(&mut self) {
        let annotations = self.doc.elements_by_tag(self.doc.root(), ANNOTATION_TAG);
        if annotations.is_empty() {
            self.diagnostics.note("No annotations in this deck.");
            return;
        }
        let shown = !self.state.widgets.annotations;
        let value = if shown { "yes" } else { "no" };
        for node in annotations {
            set_state_attr(&mut self.doc, &mut self.provenance, node, "visible", value);
        }
        self.state.widgets.annotations = shown;
    }

    /// Grow the base font size by `delta` percent and redraw the current page.
    pub fn change_font_size(&mut self, delta: i32) {
        let size = i64::from(self.state.widgets.font_size) + i64::from(delta);
        self.state.widgets.font_size =
            u32::try_from(size).unwrap_or(MIN_FONT_SIZE).max(MIN_FONT_SIZE);
        let current = self.state.current;
        self.force_goto(current);
        self.set_message(format!("Font size {}%", self.state.widgets.font_size));
    }

    pub fn font_size(&self) -> u32 {
        self.state.widgets.font_size
    }

    /// Switch every page whose classes include `from` to `to`.
    pub fn replace_page_classes(&mut self, from: &str, to: &str) {
        let pages: Vec<NodeId> = self
            .registry
            .pages()
            .iter()
            .copied()
            .filter(|&p| self.doc.classes(p).contains(&from))
            .collect();
        for page in pages {
            self.set_class_of(page, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Deck;
    use crate::export::{Target, serialize};
    use crate::overlay::{HostEvent, RecordingHost};

    fn class_of(deck: &Deck, n: usize) -> String {
        let page = deck.registry.page(n).unwrap();
        deck.doc.attr(page, "class").unwrap_or_default().to_string()
    }

    #[test]
    fn test_toggle_walks_deck_cycle() {
        let mut deck = Deck::open_str("<body><page class='white big'>a</page></body>").unwrap();
        deck.toggle_page_class(0).unwrap();
        assert_eq!(class_of(&deck, 0), "black big");
        for _ in 0..3 {
            deck.toggle_page_class(0).unwrap();
        }
        assert_eq!(class_of(&deck, 0), "white big");
    }

    #[test]
    fn test_toggle_prefers_page_cycle() {
        let mut deck = Deck::open_str("<body><page classtoggle='red blue'>a</page></body>").unwrap();
        deck.toggle_page_class(0).unwrap();
        // No class at all counts as the fallback, which is not in the cycle.
        assert_eq!(class_of(&deck, 0), "red white");
        assert!(deck.diagnostics.warnings().count() >= 1);
        deck.toggle_page_class(0).unwrap();
        assert_eq!(class_of(&deck, 0), "blue white");
    }

    #[test]
    fn test_default_class_is_authored() {
        let mut deck = Deck::open_str("<body dpc='white'><page>a</page></body>").unwrap();
        let page = deck.registry.page(0).unwrap();
        assert_eq!(
            serialize(&deck.doc, &deck.provenance, page, Target::Markup),
            "<page class=\"white\">a</page>"
        );
        deck.toggle_page_class(0).unwrap();
        assert_eq!(
            serialize(&deck.doc, &deck.provenance, page, Target::Markup),
            "<page class=\"black\">a</page>"
        );
    }

    #[test]
    fn test_toggle_keeps_recorded_marks() {
        let mut deck = Deck::open_str("<body><page class='white'>a</page></body>").unwrap();
        deck.start("").unwrap();
        let page = deck.registry.page(0).unwrap();
        let before = deck.provenance.marks(page).cloned().unwrap();
        assert!(before.attributes.iter().any(|a| a == "id"));

        deck.toggle_page_class(0).unwrap();
        deck.set_page_class(0, "aqua").unwrap();

        let after = deck.provenance.marks(page).unwrap();
        for attr in &before.attributes {
            assert!(after.attributes.contains(attr), "lost mark on {attr}");
        }
        assert!(!deck.provenance.is_synthesized(page, "class"));
        assert!(
            serialize(&deck.doc, &deck.provenance, page, Target::Markup).contains("class=\"aqua\"")
        );
    }

    #[test]
    fn test_toggle_all_rotates_cycle() {
        let host = RecordingHost::new();
        let mut deck = Deck::open_str("<body><page class='aqua'>a</page><page>b</page></body>")
            .unwrap()
            .with_host(Box::new(host.clone()));
        deck.toggle_all_page_classes();
        assert_eq!(class_of(&deck, 0), "white");
        assert_eq!(class_of(&deck, 1), "white");
        assert_eq!(deck.config.class_cycle[0], "black");
        deck.toggle_all_page_classes();
        assert_eq!(class_of(&deck, 1), "black");
        assert!(host.events().contains(&HostEvent::UpdatePage(1)));
    }

    #[test]
    fn test_replace_page_classes() {
        let mut deck =
            Deck::open_str("<body><page class='black'>a</page><page class='white'>b</page></body>")
                .unwrap();
        deck.replace_page_classes("black", "aqua");
        assert_eq!(class_of(&deck, 0), "aqua");
        assert_eq!(class_of(&deck, 1), "white");
    }

    #[test]
    fn test_annotations_toggle_together() {
        let mut deck = Deck::open_str(
            "<body><page>a<ann>x</ann></page><page><ann visible='yes'>y</ann></page></body>",
        )
        .unwrap();
        deck.toggle_annotations();
        let anns = deck.doc.elements_by_tag(deck.doc.root(), "ann");
        assert!(anns.iter().all(|&a| deck.doc.attr(a, "visible") == Some("no")));
        deck.toggle_annotations();
        assert!(anns.iter().all(|&a| deck.doc.attr(a, "visible") == Some("yes")));
        assert_eq!(
            serialize(&deck.doc, &deck.provenance, deck.doc.body(), Target::Markup),
            "<body><page>a<ann>x</ann></page><page><ann visible=\"yes\">y</ann></page></body>"
        );
    }

    #[test]
    fn test_font_size_is_bounded() {
        let mut deck = Deck::open_str("<body><page>a</page></body>").unwrap();
        deck.change_font_size(5);
        assert_eq!(deck.font_size(), 105);
        assert_eq!(deck.message(), Some("Font size 105%"));
        deck.change_font_size(-500);
        assert_eq!(deck.font_size(), 10);
    }
}
