use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::accessor::DeviceAccessor;
use crate::error::TraversalError;
use crate::screen::screen_model::UiElement;

const IDENTIFIER_TEXT_CHARS: usize = 20;

/// Coarse screen fingerprint: foreground window, display size and a hash of
/// the package name. Scrolling or transient content does not change it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSignature(pub String);

/// `PageSignature:identifier` for one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementSignature(pub String);

impl fmt::Display for PageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ElementSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn page_signature(device: &mut dyn DeviceAccessor) -> Result<PageSignature, TraversalError> {
    let window = device.current_window()?;
    let (width, height) = device.window_size()?;
    Ok(PageSignature(format!(
        "{}:{}x{}:{}",
        window,
        width,
        height,
        text_fingerprint(&window.package)
    )))
}

/// Resource id when present, otherwise the truncated text and description.
/// Elements without an id and with equal truncated labels share an identifier.
pub fn element_identifier(element: &UiElement) -> String {
    if let Some(id) = element.resource_id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    format!(
        "{}:{}:",
        truncate_chars(element.text.as_deref().unwrap_or(""), IDENTIFIER_TEXT_CHARS),
        truncate_chars(element.description.as_deref().unwrap_or(""), IDENTIFIER_TEXT_CHARS)
    )
}

pub fn element_signature(page: &PageSignature, element: &UiElement) -> ElementSignature {
    ElementSignature(format!("{}:{}", page, element_identifier(element)))
}

pub fn text_fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
