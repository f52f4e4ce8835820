use std::collections::HashSet;

use tracing::{debug, warn};

use crate::device::accessor::{DeviceAccessor, ElementQuery};
use crate::error::TraversalError;
use crate::explorer::config::ExplorerConfig;
use crate::screen::screen_model::UiElement;
use crate::state::identity::{ElementSignature, element_signature, page_signature};

/// An element snapshot together with the signature it had when discovered.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredElement {
    pub element: UiElement,
    pub signature: ElementSignature,
}

/// Structural queries issued on every discovery, in tie-break order.
pub fn default_queries() -> Vec<ElementQuery> {
    vec![
        ElementQuery::Clickable,
        ElementQuery::EnabledFocusable,
        ElementQuery::class("android.widget.EditText"),
        ElementQuery::class("android.widget.Switch"),
        ElementQuery::class("android.widget.CheckBox"),
        ElementQuery::class("android.widget.RadioButton"),
        ElementQuery::class("android.widget.Spinner"),
        ElementQuery::class("android.widget.ListView"),
        ElementQuery::class("android.widget.ScrollView"),
        ElementQuery::class("android.support.v7.widget.RecyclerView"),
        ElementQuery::class("androidx.recyclerview.widget.RecyclerView"),
        ElementQuery::class_contains("Button"),
        ElementQuery::class_contains("ImageButton"),
        ElementQuery::LongClickable,
    ]
}

pub struct ElementCatalog {
    queries: Vec<ElementQuery>,
    blacklist: Vec<String>,
    min_size: i32,
}

impl ElementCatalog {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            queries: default_queries(),
            blacklist: config.blacklist.clone(),
            min_size: config.min_element_size,
        }
    }

    /// Interactable elements of the current screen, deduplicated by
    /// signature and filtered.
    ///
    /// Discovery is best-effort: a failing query is skipped. Only a lost
    /// device connection aborts it. The result describes the current tree
    /// only and must not be reused after any interaction.
    pub fn discover_interactable_elements(
        &self,
        device: &mut dyn DeviceAccessor,
    ) -> Result<Vec<DiscoveredElement>, TraversalError> {
        let page = page_signature(device)?;

        let mut found = Vec::new();
        for query in &self.queries {
            match device.query_elements(query) {
                Ok(matches) => found.extend(matches),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(query = %query, error = %e, "element query failed, skipping"),
            }
        }

        let mut seen: HashSet<ElementSignature> = HashSet::new();
        let unique: Vec<DiscoveredElement> = found
            .into_iter()
            .filter_map(|element| {
                let signature = element_signature(&page, &element);
                seen.insert(signature.clone())
                    .then_some(DiscoveredElement { element, signature })
            })
            .collect();

        let total = unique.len();
        let kept: Vec<DiscoveredElement> = unique
            .into_iter()
            .filter(|d| !self.is_blacklisted(&d.element))
            .filter(|d| self.is_large_enough(&d.element))
            .collect();

        debug!(page = %page, unique = total, kept = kept.len(), "discovered elements");
        Ok(kept)
    }

    pub fn is_blacklisted(&self, element: &UiElement) -> bool {
        match element.resource_id.as_deref() {
            Some(id) if !id.is_empty() => self.blacklist.iter().any(|b| id.contains(b.as_str())),
            _ => false,
        }
    }

    pub fn is_large_enough(&self, element: &UiElement) -> bool {
        element.bounds.width() >= self.min_size && element.bounds.height() >= self.min_size
    }
}
