use app_traverser::screen::screen_model::{Bounds, UiElement};
use app_traverser::state::identity::{
    ElementSignature, PageSignature, element_identifier, element_signature, page_signature,
    text_fingerprint,
};
use app_traverser::state::state_model::{LevelState, VisitedSet};

use crate::common::fixture::{APP, FixtureDevice, Screen, activity, main_window};

mod common;

fn view() -> UiElement {
    UiElement::new("android.view.View", Bounds::new(0, 0, 200, 200))
}

// ============================================================================
// Fingerprints
// ============================================================================

#[test]
fn fingerprint_is_sha1_hex() {
    assert_eq!(text_fingerprint("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    assert_eq!(text_fingerprint(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}

// ============================================================================
// Element identifiers
// ============================================================================

#[test]
fn resource_id_wins_over_text() {
    let el = view().resource_id("com.example.app:id/login").text("Log in");
    assert_eq!(element_identifier(&el), "com.example.app:id/login");
}

#[test]
fn empty_resource_id_falls_back_to_labels() {
    let mut el = view().text("Log in").description("Sign-in button");
    el.resource_id = Some(String::new());
    assert_eq!(element_identifier(&el), "Log in:Sign-in button:");
}

#[test]
fn unlabelled_element_has_bare_separators() {
    assert_eq!(element_identifier(&view()), "::");
}

#[test]
fn labels_are_truncated_to_twenty_characters() {
    let el = view()
        .text("Terms and conditions of service")
        .description("Opens the full legal text");
    assert_eq!(
        element_identifier(&el),
        "Terms and conditions:Opens the full legal:"
    );
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let el = view().text(&"é".repeat(25));
    let id = element_identifier(&el);
    assert_eq!(id, format!("{}::", "é".repeat(20)));
}

#[test]
fn labels_sharing_a_prefix_collide() {
    let a = view().text("Notification settings: sound");
    let b = view().text("Notification settings: vibration");
    assert_eq!(element_identifier(&a), element_identifier(&b));
}

// ============================================================================
// Page and element signatures
// ============================================================================

#[test]
fn page_signature_combines_window_size_and_package_hash() {
    let mut device = FixtureDevice::new()
        .opened()
        .with_screen(Screen::new(main_window()));

    let page = page_signature(&mut device).unwrap();

    assert_eq!(
        page.to_string(),
        format!("{}/.MainActivity:1080x2400:{}", APP, text_fingerprint(APP))
    );
}

#[test]
fn page_signature_differs_per_activity() {
    let details = activity(".DetailsActivity");
    let mut device = FixtureDevice::new().opened();
    let main = page_signature(&mut device).unwrap();
    device.navigate(details);
    let other = page_signature(&mut device).unwrap();

    assert_ne!(main, other);
}

#[test]
fn element_signature_appends_identifier_to_page() {
    let page = PageSignature("pkg/.A:10x20:abc".into());
    let el = view().text("Save");
    assert_eq!(
        element_signature(&page, &el),
        ElementSignature("pkg/.A:10x20:abc:Save::".into())
    );
}

#[test]
fn signatures_serialize_as_plain_strings() {
    let sig = ElementSignature("p:x".into());
    assert_eq!(serde_json::to_string(&sig).unwrap(), "\"p:x\"");
}

// ============================================================================
// Visited set and level state
// ============================================================================

#[test]
fn visited_set_rejects_duplicates_and_keeps_order() {
    let mut visited = VisitedSet::new();
    assert!(visited.is_empty());

    assert!(visited.insert(ElementSignature("b".into())));
    assert!(visited.insert(ElementSignature("a".into())));
    assert!(!visited.insert(ElementSignature("b".into())));

    assert_eq!(visited.len(), 2);
    assert!(visited.contains(&ElementSignature("a".into())));
    let order: Vec<&str> = visited.iter().map(|s| s.0.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
}

#[test]
fn new_level_starts_without_scrolls() {
    let level = LevelState::new(2);
    assert_eq!(level.depth, 2);
    assert_eq!(level.scroll_attempts, 0);
    assert!(level.window_before.is_none());
}
