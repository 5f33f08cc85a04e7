use scraper::Html;
use url::Url;

use super::{ascii_digits, element_text, select_all, select_first};

/// What a page says about the pages after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    pub next: Option<Url>,
    /// Highest page number the pagination control links to.
    pub last_page: Option<u32>,
}

pub fn detect_pagination(doc: &Html, base: &Url) -> PaginationInfo {
    let root = doc.root_element();
    let anchors = select_all(root, ".pagination a[href]");

    let next = anchors
        .iter()
        .find(|a| {
            let value = a.value();
            value
                .attr("title")
                .is_some_and(|title| title.trim().eq_ignore_ascii_case("next page"))
                || value
                    .attr("rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next"))
        })
        .copied()
        .or_else(|| select_first(root, "a[rel~=next][href]"))
        .or_else(|| select_first(root, "link[rel~=next][href]"))
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base.join(href.trim()).ok());

    let last_page = anchors
        .iter()
        .filter_map(|a| {
            let from_href = a
                .value()
                .attr("href")
                .and_then(|href| base.join(href.trim()).ok())
                .and_then(|url| page_number_of(&url));
            let from_text = element_text(*a).and_then(|text| ascii_digits(&text).parse::<u32>().ok());
            from_href.max(from_text)
        })
        .max();

    PaginationInfo { next, last_page }
}

/// Value of the `page` query parameter, if numeric.
pub fn page_number_of(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// `base` with its `page` query parameter set to `page`, other parameters kept.
pub fn page_url(base: &Url, page: u32) -> Url {
    let pairs: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    url.set_fragment(None);
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(pairs);
        query.append_pair("page", &page.to_string());
    }
    url
}

#[cfg(test)]
mod tests {
    use scraper::Html;
    use url::Url;

    use super::{detect_pagination, page_number_of, page_url};

    fn base() -> Url {
        Url::parse("https://forum.example/topic/123/slug?sort=asc").unwrap()
    }

    #[test]
    fn next_link_and_last_page_are_read() {
        let doc = Html::parse_document(
            r#"<ul class="pagination">
                 <li><a href="?page=1">1</a></li>
                 <li><a href="?page=2">2</a></li>
                 <li><a href="?page=7">۷</a></li>
                 <li><a title="Next page" href="?page=2">›</a></li>
               </ul>"#,
        );
        let info = detect_pagination(&doc, &base());
        assert_eq!(info.last_page, Some(7));
        assert_eq!(
            info.next.map(|u| u.to_string()),
            Some("https://forum.example/topic/123/slug?page=2".to_string())
        );
    }

    #[test]
    fn no_pagination_means_single_page() {
        let doc = Html::parse_document("<p>nothing here</p>");
        let info = detect_pagination(&doc, &base());
        assert_eq!(info.next, None);
        assert_eq!(info.last_page, None);
    }

    #[test]
    fn page_url_replaces_existing_parameter() {
        let url = page_url(&Url::parse("https://f.example/t/1?page=3&sort=asc").unwrap(), 4);
        assert_eq!(url.as_str(), "https://f.example/t/1?sort=asc&page=4");
        assert_eq!(page_number_of(&url), Some(4));
    }
}
