//! Catalog listing extraction.

use html_scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Collect the course detail links from a term's catalog page.
///
/// Each course row has a `td.cls-crn` cell linking to its detail page. Links
/// are resolved against `site_root` and returned in document order. A course
/// listed twice appears twice.
pub fn extract_course_links(html: &Html, site_root: &Url) -> Vec<String> {
    let link_sel = Selector::parse("td.cls-crn a").unwrap();

    let links: Vec<String> = html
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| site_root.join(href.trim()).ok())
        .map(|u| u.to_string())
        .collect();

    debug!(count = links.len(), "extracted catalog links");
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://courses.rice.edu").unwrap()
    }

    #[test]
    fn test_links_in_document_order() {
        let html = Html::parse_document(
            r#"<table>
            <tr><td class="cls-crn"><a href="/courses/C1">10001</a></td><td>COMP 140</td></tr>
            <tr><td class="cls-crn"><a href="/courses/C2">10002</a></td><td>COMP 182</td></tr>
            </table>"#,
        );
        assert_eq!(
            extract_course_links(&html, &root()),
            [
                "https://courses.rice.edu/courses/C1",
                "https://courses.rice.edu/courses/C2"
            ]
        );
    }

    #[test]
    fn test_duplicates_preserved() {
        let html = Html::parse_document(
            r#"<table>
            <tr><td class="cls-crn"><a href="/courses/C1">1</a></td></tr>
            <tr><td class="cls-crn"><a href="/courses/C1">1</a></td></tr>
            </table>"#,
        );
        assert_eq!(extract_course_links(&html, &root()).len(), 2);
    }

    #[test]
    fn test_ignores_other_cells_and_anchors_without_href() {
        let html = Html::parse_document(
            r#"<table><tr>
            <td class="cls-crn"><a name="anchor">x</a></td>
            <td class="cls-title"><a href="/courses/T1">title</a></td>
            <td class="cls-crn"><a href="/courses/!SWKSCAT.cat?p_action=COURSE&amp;p_term=202110&amp;p_crn=10003">10003</a></td>
            </tr></table>"#,
        );
        assert_eq!(
            extract_course_links(&html, &root()),
            ["https://courses.rice.edu/courses/!SWKSCAT.cat?p_action=COURSE&p_term=202110&p_crn=10003"]
        );
    }

    #[test]
    fn test_absolute_href_kept() {
        let html = Html::parse_document(
            r#"<table><tr><td class="cls-crn"><a href="https://other.example/c">1</a></td></tr></table>"#,
        );
        assert_eq!(
            extract_course_links(&html, &root()),
            ["https://other.example/c"]
        );
    }

    #[test]
    fn test_empty_catalog() {
        let html = Html::parse_document("<table></table>");
        assert!(extract_course_links(&html, &root()).is_empty());
    }
}
