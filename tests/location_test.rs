//! Location string tests: a location written by one deck restarts another
//! deck in the same position with the same sticky settings.

use proptest::prelude::*;

use slidedeck::{Deck, Location, Locator, Setting, ViewMode};

const DECK: &str = concat!(
    "<body>",
    "<page key='a'>0</page><page>1</page><page key='Ünïcode two'>2</page>",
    "<page>3</page><page key='last'>4</page>",
    "</body>"
);

#[test]
fn test_keyword_locations_are_percent_encoded() {
    let mut deck = Deck::open_str(DECK).unwrap();
    deck.start("").unwrap();
    deck.goto_keyword("ünïcode").unwrap();
    assert_eq!(deck.current(), 2);
    assert_eq!(deck.location(), "#%C3%BCn%C3%AFcode");

    let mut other = Deck::open_str(DECK).unwrap();
    other.start(deck.location()).unwrap();
    assert_eq!(other.current(), 2);
}

#[test]
fn test_decode_tolerates_junk() {
    let location = Location::decode("#3?view=grid?junk?=x?lang=a=b");
    assert_eq!(location.locator, Some(Locator::Ordinal(3)));
    assert_eq!(
        location.settings,
        vec![
            ("view".to_string(), "grid".to_string()),
            ("lang".to_string(), "a=b".to_string())
        ]
    );
}

#[test]
fn test_negative_and_huge_ordinals_clamp() {
    let mut deck = Deck::open_str(DECK).unwrap();
    deck.start("#-4").unwrap();
    assert_eq!(deck.current(), 0);
    deck.on_location_change("#99999999999999999999").unwrap();
    assert_eq!(deck.current(), 4);
}

fn view_mode() -> impl Strategy<Value = ViewMode> {
    prop_oneof![
        Just(ViewMode::Full),
        Just(ViewMode::Flow),
        Just(ViewMode::TwoUp),
        Just(ViewMode::Grid),
    ]
}

proptest! {
    #[test]
    fn prop_location_restarts_same_state(
        page in 0usize..5,
        view in view_mode(),
        toolbar in any::<bool>(),
        console in any::<bool>(),
        lang in prop::option::of("[a-z]{2}"),
    ) {
        let mut deck = Deck::open_str(DECK).unwrap();
        deck.start("").unwrap();
        deck.set_setting("view", view.as_str()).unwrap();
        deck.set_setting("tb", if toolbar { "1" } else { "0" }).unwrap();
        deck.set_setting("dc", if console { "1" } else { "0" }).unwrap();
        if let Some(lang) = &lang {
            deck.set_setting("lang", lang).unwrap();
        }
        deck.goto(page as i64);

        let written = deck.location().to_string();
        let decoded = Location::decode(&written);
        prop_assert_eq!(decoded.encode(), written.clone());
        prop_assert_eq!(decoded.setting(Setting::View.name()), Some(view.as_str()));

        let mut restarted = Deck::open_str(DECK).unwrap();
        restarted.start(&written).unwrap();
        prop_assert_eq!(restarted.current(), page);
        prop_assert_eq!(restarted.state.view, view);
        prop_assert_eq!(restarted.state.widgets.toolbar, toolbar);
        prop_assert_eq!(restarted.state.widgets.console, console);
        prop_assert_eq!(restarted.state.lang.clone(), lang);
        prop_assert_eq!(restarted.state.settings.clone(), deck.state.settings.clone());
        prop_assert_eq!(restarted.location(), written.as_str());
    }
}
