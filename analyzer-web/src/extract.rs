//! Best-effort extraction of page metadata from fetched HTML.
//!
//! Parsing goes through `scraper` (html5ever), which recovers from malformed
//! markup the same way browsers do, so extraction itself never fails: a
//! document without the expected elements simply yields `None` fields.
use scraper::{ElementRef, Html, Selector};

/// Metadata recorded with each check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub h1: Option<String>,
    pub description: Option<String>,
}

/// Read `<title>`, the first `<h1>` and `<meta name="description">`.
///
/// ```
/// use analyzer_web::extract;
///
/// let meta = extract("<title> Hello </title><h1>World</h1>");
/// assert_eq!(meta.title.as_deref(), Some("Hello"));
/// assert_eq!(meta.h1.as_deref(), Some("World"));
/// assert_eq!(meta.description, None);
/// ```
pub fn extract(html: &str) -> PageMeta {
    let doc = Html::parse_document(html);
    let meta = PageMeta {
        title: first_text(&doc, "title"),
        h1: first_text(&doc, "h1"),
        description: meta_description(&doc),
    };
    tracing::trace!(
        has_title = meta.title.is_some(),
        has_h1 = meta.h1.is_some(),
        has_description = meta.description.is_some(),
        "extract.page_meta"
    );
    meta
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next().and_then(element_text)
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    non_blank(&el.text().collect::<String>())
}

fn meta_description(doc: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name]").ok()?;
    doc.select(&selector)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|el| el.value().attr("content"))
        .and_then(non_blank)
}

/// Collapse runs of whitespace; blank strings count as missing.
fn non_blank(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_all_three_fields() {
        let meta = extract(
            r#"<html><head><title>Example site 1</title><meta name="description" content="Lorem ipsum"></head><body><h1>Some inner data</h1></body></html>"#,
        );
        assert_eq!(
            meta,
            PageMeta {
                title: Some("Example site 1".into()),
                h1: Some("Some inner data".into()),
                description: Some("Lorem ipsum".into()),
            }
        );
    }

    #[test]
    fn missing_h1_is_none() {
        let meta = extract("<html><head><title>Only a title</title></head><body><p>x</p></body></html>");
        assert_eq!(meta.title.as_deref(), Some("Only a title"));
        assert_eq!(meta.h1, None);
    }

    #[test]
    fn missing_title_is_none() {
        let meta = extract("<body><h1>Heading</h1></body>");
        assert_eq!(meta.title, None);
        assert_eq!(meta.h1.as_deref(), Some("Heading"));
    }

    #[test]
    fn nested_heading_markup_is_flattened() {
        let meta = extract("<h1>  Hello <em>big</em>\n   world </h1><h1>second</h1>");
        assert_eq!(meta.h1.as_deref(), Some("Hello big world"));
    }

    #[test]
    fn description_name_is_case_insensitive() {
        let meta = extract(r#"<meta name="Keywords" content="a,b"><META NAME="Description" CONTENT=" Shouty ">"#);
        assert_eq!(meta.description.as_deref(), Some("Shouty"));
    }

    #[test]
    fn description_without_content_is_none() {
        assert_eq!(extract(r#"<meta name="description">"#).description, None);
        assert_eq!(extract(r#"<meta name="description" content="   ">"#).description, None);
    }

    #[test]
    fn entities_are_decoded() {
        let meta = extract("<title>Fish &amp; Chips &lt;3</title>");
        assert_eq!(meta.title.as_deref(), Some("Fish & Chips <3"));
    }

    #[test]
    fn garbage_input_yields_empty_meta() {
        assert_eq!(extract(""), PageMeta::default());
        assert_eq!(extract("<<<>>> not html </div></div>"), PageMeta::default());
        assert_eq!(extract("\u{0}\u{1}binary\u{fffd}"), PageMeta::default());
    }

    #[test]
    fn unclosed_tags_are_recovered() {
        let meta = extract("<html><head><title>Broken</title><body><div><h1>Still here");
        assert_eq!(meta.h1.as_deref(), Some("Still here"));
    }
}
