//! CSS-selector helpers over `scraper`.
//!
//! Selectors in this crate are literals, but a malformed one must not take a
//! whole retailer down: it is logged and treated as "not found".

use scraper::{ElementRef, Html, Selector};

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css)
        .map_err(|e| tracing::error!(selector = css, error = %e, "invalid CSS selector"))
        .ok()
}

pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    scope.select(&sel).next()
}

pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    selector(css).map_or_else(Vec::new, |sel| scope.select(&sel).collect())
}

/// Concatenated text content of the first match.
pub(crate) fn text_of(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(scope, css).map(|el| el.text().collect::<String>())
}

pub(crate) fn attr_of(scope: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    select_first(scope, css)
        .and_then(|el| el.value().attr(attr))
        .map(str::to_owned)
}

/// Outer markup of every element matching `card` inside the first `container`.
///
/// Returns `None` when the container itself is absent.
pub(crate) fn fragments_in(doc: &Html, container: &str, card: &str) -> Option<Vec<String>> {
    let root = select_first(doc.root_element(), container)?;
    Some(select_all(root, card).into_iter().map(|el| el.html()).collect())
}

/// Parses a fragment previously produced by [`fragments_in`].
pub(crate) fn parse_fragment(markup: &str) -> Html {
    Html::parse_fragment(markup)
}
