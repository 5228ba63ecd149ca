//! Editing tests: clipboard, structural changes and re-indexing.

use std::io::Write;

use proptest::prelude::*;
use tempfile::NamedTempFile;

use slidedeck::dom::Attribute;
use slidedeck::overlay::{HostEvent, RecordingHost};
use slidedeck::{Deck, Diagnostic, Error, Target, serialize, serialize_document};

const DECK: &str = concat!(
    "<body>",
    "<page key='one'><h1>One</h1></page>",
    "<page key='two'><h2>Two</h2></page>",
    "<page key='three' descr='Third'>3</page>",
    "</body>"
);

fn started(markup: &str) -> Deck {
    let mut deck = Deck::open_str(markup).unwrap();
    deck.start("").unwrap();
    deck
}

fn page_texts(deck: &Deck) -> Vec<String> {
    deck.registry
        .pages()
        .iter()
        .map(|&p| deck.doc.text_content(p))
        .collect()
}

#[test]
fn test_open_path_reads_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(DECK.as_bytes()).unwrap();
    let deck = Deck::open_path(file.path()).unwrap();
    assert_eq!(deck.page_count(), 3);
}

#[test]
fn test_open_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Deck::open_path(dir.path().join("missing.xhtml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_malformed_markup_is_rejected() {
    assert!(matches!(
        Deck::open_str("<body><page></body>"),
        Err(Error::Xml(_) | Error::InvalidDeck(_))
    ));
}

#[test]
fn test_cut_and_paste_moves_a_page() {
    let mut deck = started(DECK);
    deck.cut_page(0).unwrap();
    assert_eq!(page_texts(&deck), vec!["Two", "3"]);
    assert_eq!(deck.current(), 0);
    assert_eq!(deck.registry.keyword("one"), None);

    deck.paste_after(1).unwrap();
    assert_eq!(page_texts(&deck), vec!["Two", "3", "One"]);
    assert_eq!(deck.registry.keyword("one"), Some(2));
    assert_eq!(deck.current(), 1);
    assert_eq!(deck.message(), Some("Pasted slide after slide 1 (One)"));
}

#[test]
fn test_pasted_page_exports_like_the_original() {
    let mut deck = started(DECK);
    let original = deck.registry.page(2).unwrap();
    let expected = serialize(&deck.doc, &deck.provenance, original, Target::Markup);

    deck.copy_page(2).unwrap();
    deck.paste_after(0).unwrap();
    let pasted = deck.registry.page(1).unwrap();
    assert_eq!(serialize(&deck.doc, &deck.provenance, pasted, Target::Markup), expected);
}

#[test]
fn test_clipboard_copy_drops_bookkeeping_id_with_its_mark() {
    let mut deck = started("<html><body><page>a</page><page>b</page></body></html>");
    deck.copy_page(0).unwrap();
    let clip = deck.state.clipboard.unwrap();
    assert_eq!(deck.doc.attr(clip, "id"), None);
    let marks = deck.provenance.marks(clip).unwrap();
    assert!(!marks.attributes.iter().any(|a| a == "id"));

    // An id given to the copy afterwards is the author's.
    deck.doc.set_attr(clip, "id", "mine");
    deck.paste_after(1).unwrap();
    let pasted = deck.registry.page(2).unwrap();
    assert_eq!(deck.doc.attr(pasted, "id"), Some("mine"));
    assert!(serialize(&deck.doc, &deck.provenance, pasted, Target::Markup).contains("id=\"mine\""));
}

#[test]
fn test_removed_pages_leave_no_marks_behind() {
    let mut deck = started(DECK);
    let removed = deck.registry.page(1).unwrap();
    let wrapper = deck.doc.parent(removed).unwrap();
    let kept = deck.registry.page(0).unwrap();
    assert!(deck.provenance.marks(removed).is_some());

    deck.remove_page(1).unwrap();
    assert!(deck.provenance.marks(removed).is_none());
    assert!(deck.provenance.marks(wrapper).is_none());
    assert!(deck.provenance.marks(kept).is_some());

    let cut = deck.registry.page(0).unwrap();
    deck.cut_page(0).unwrap();
    assert!(deck.provenance.marks(cut).is_none());
    let clip = deck.state.clipboard.unwrap();
    assert!(deck.provenance.is_synthesized(clip, "onmouseover"));
}

#[test]
fn test_replace_content_rejects_its_own_ancestor() {
    let mut deck = started(DECK);
    let page = deck.registry.page(1).unwrap();
    let body = deck.doc.body();
    assert!(matches!(deck.replace_content(1, body), Err(Error::InvalidEdit(_))));
    assert!(matches!(deck.replace_content(1, page), Err(Error::InvalidEdit(_))));
    assert_eq!(page_texts(&deck), vec!["One", "Two", "3"]);
    assert!(deck.doc.is_attached(page));
}

#[test]
fn test_paste_without_clipboard() {
    let mut deck = started(DECK);
    assert!(matches!(deck.paste_after(0), Err(Error::ClipboardEmpty)));
    assert!(deck.diagnostics.entries().contains(&Diagnostic::ClipboardEmpty));
    assert_eq!(deck.page_count(), 3);
}

#[test]
fn test_insert_bare_page_is_wrapped() {
    let mut deck = started(DECK);
    deck.goto(2);
    let page = deck.doc.create_element("page", vec![Attribute::new("key", "new")]);
    let text = deck.doc.create_text("new");
    deck.doc.append(page, text);

    deck.insert_after(page, 0).unwrap();
    assert_eq!(page_texts(&deck), vec!["One", "new", "Two", "3"]);
    assert_eq!(deck.doc.tag(deck.doc.parent(page).unwrap()), Some("pagecontainer"));
    // The current page keeps its identity.
    assert_eq!(deck.current(), 3);
    assert_eq!(deck.active_pages(), vec![3]);
}

#[test]
fn test_insert_non_page_warns() {
    let mut deck = started(DECK);
    let stray = deck.doc.create_element("div", vec![]);
    deck.insert_after(stray, 0).unwrap();
    assert!(
        deck.diagnostics
            .warnings()
            .any(|d| matches!(d, Diagnostic::StructuralWarning(_)))
    );
    assert_eq!(deck.page_count(), 3);
}

#[test]
fn test_replace_content_notifies_host() {
    let host = RecordingHost::new();
    let mut deck = started(DECK);
    deck.attach_host(Box::new(host.clone()));

    let content = deck.doc.create_element("p", vec![]);
    let text = deck.doc.create_text("replaced");
    deck.doc.append(content, text);
    deck.replace_content(1, content).unwrap();

    assert_eq!(page_texts(&deck)[1], "replaced");
    assert_eq!(host.events(), vec![HostEvent::UpdatePage(1)]);
}

#[test]
fn test_removing_last_page_leaves_empty_deck() {
    let mut deck = started("<body><page>only</page></body>");
    deck.remove_page(0).unwrap();
    assert_eq!(deck.page_count(), 0);
    assert_eq!(deck.goto(3), 0);
    assert!(deck.remove_page(0).is_err());
    assert_eq!(
        serialize_document(&deck.doc, &deck.provenance, Target::Markup),
        "<body></body>"
    );
}

#[test]
fn test_source_view_follows_edits() {
    let mut deck = started(DECK);
    deck.show_source(Target::Markup).unwrap();
    deck.show_source(Target::Markup).unwrap();

    let page = deck.current_page().unwrap();
    let extra = deck.doc.create_text("!");
    deck.doc.append(page, extra);
    deck.notify_change(page);

    deck.show_source(Target::Markup).unwrap();
    assert_eq!(deck.state.source.text, "<page key=\"one\"><h1>One</h1>!</page>");
}

fn deck_markup() -> impl Strategy<Value = String> {
    let page = (
        prop::option::of(prop::sample::select(vec!["a", "b", "c", "a b"])),
        prop::bool::ANY,
        prop::bool::ANY,
    )
        .prop_map(|(key, authored_id, wrapped)| {
            let mut attrs = String::new();
            if let Some(key) = key {
                attrs.push_str(&format!(" key='{key}'"));
            }
            if authored_id {
                attrs.push_str(" id='mine'");
            }
            let page = format!("<page{attrs}>x</page>");
            if wrapped {
                format!("<pagecontainer class='pagecontainer'>{page}</pagecontainer>")
            } else {
                page
            }
        });
    prop::collection::vec(page, 0..8).prop_map(|pages| format!("<body>{}</body>", pages.concat()))
}

proptest! {
    #[test]
    fn prop_reindex_is_idempotent(markup in deck_markup()) {
        let mut deck = Deck::open_str(&markup).unwrap();
        let first = serialize_document(&deck.doc, &deck.provenance, Target::Markup);
        let ids: Vec<Option<String>> = deck.registry.pages().iter()
            .map(|&p| deck.doc.attr(p, "id").map(String::from))
            .collect();
        let nodes = deck.doc.len();

        deck.reindex();
        deck.reindex();

        prop_assert_eq!(deck.doc.len(), nodes);
        prop_assert_eq!(serialize_document(&deck.doc, &deck.provenance, Target::Markup), first);
        let again: Vec<Option<String>> = deck.registry.pages().iter()
            .map(|&p| deck.doc.attr(p, "id").map(String::from))
            .collect();
        prop_assert_eq!(again, ids);
    }

    #[test]
    fn prop_unmutated_export_is_authored(markup in deck_markup()) {
        let deck = Deck::open_str(&markup).unwrap();
        let expected = markup
            .replace('\'', "\"");
        prop_assert_eq!(serialize_document(&deck.doc, &deck.provenance, Target::Markup), expected);
    }
}
