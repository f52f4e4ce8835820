use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::device::accessor::ElementQuery;
use crate::error::TraversalError;
use crate::screen::screen_model::{Bounds, Capabilities, UiElement};
use crate::state::identity::element_identifier;

static NODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<node((?:\s+[\w:.-]+="[^"]*")*)\s*/?>"#).unwrap());

static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:.-]+)="([^"]*)""#).unwrap());

static BOUNDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]$").unwrap());

/// Parse a uiautomator window dump into element snapshots, in document order.
pub fn parse_hierarchy(xml: &str) -> Result<Vec<UiElement>, TraversalError> {
    if !xml.contains("<hierarchy") {
        return Err(TraversalError::Hierarchy(
            "dump has no <hierarchy> root".into(),
        ));
    }

    NODE_RE
        .captures_iter(xml)
        .map(|caps| {
            let attrs: HashMap<&str, String> = ATTR_RE
                .captures_iter(caps.get(1).map_or("", |m| m.as_str()))
                .filter_map(|a| Some((a.get(1)?.as_str(), unescape(a.get(2)?.as_str()))))
                .collect();
            node_from_attrs(&attrs)
        })
        .collect()
}

fn node_from_attrs(attrs: &HashMap<&str, String>) -> Result<UiElement, TraversalError> {
    let flag = |name: &str| attrs.get(name).map(|v| v == "true").unwrap_or(false);
    let non_empty = |name: &str| attrs.get(name).filter(|v| !v.is_empty()).cloned();

    let bounds = match attrs.get("bounds") {
        Some(raw) => parse_bounds(raw)?,
        None => Bounds::default(),
    };

    let flags = Capabilities {
        clickable: flag("clickable"),
        long_clickable: flag("long-clickable"),
        focusable: flag("focusable"),
        enabled: flag("enabled"),
        checked: flag("checked"),
        scrollable: flag("scrollable"),
    };

    let class_name = attrs.get("class").map(String::as_str).unwrap_or("");
    let mut element = UiElement::with_flags(class_name, bounds, flags);
    element.resource_id = non_empty("resource-id");
    element.text = non_empty("text");
    element.description = non_empty("content-desc");
    Ok(element)
}

/// Parse `[left,top][right,bottom]`.
pub fn parse_bounds(raw: &str) -> Result<Bounds, TraversalError> {
    let caps = BOUNDS_RE
        .captures(raw.trim())
        .ok_or_else(|| TraversalError::Hierarchy(format!("malformed bounds '{}'", raw)))?;

    let mut values = [0i32; 4];
    for (i, value) in values.iter_mut().enumerate() {
        *value = caps[i + 1]
            .parse()
            .map_err(|_| TraversalError::Hierarchy(format!("bounds out of range '{}'", raw)))?;
    }
    Ok(Bounds::new(values[0], values[1], values[2], values[3]))
}

pub fn query(nodes: &[UiElement], query: &ElementQuery) -> Vec<UiElement> {
    nodes.iter().filter(|n| query.matches(n)).cloned().collect()
}

/// Find the live node a snapshot refers to: same class and identifier,
/// closest on screen.
pub fn resolve<'a>(nodes: &'a [UiElement], snapshot: &UiElement) -> Option<&'a UiElement> {
    resolve_index(nodes, snapshot).map(|i| &nodes[i])
}

/// Document-order position of the node `resolve` would pick.
pub fn resolve_index(nodes: &[UiElement], snapshot: &UiElement) -> Option<usize> {
    let wanted = element_identifier(snapshot);
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.class_name == snapshot.class_name && element_identifier(n) == wanted)
        .min_by_key(|(_, n)| n.bounds.distance(&snapshot.bounds))
        .map(|(i, _)| i)
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}
