//! Search URL construction.
//!
//! Fixed query parameters select sold + completed items from the buyer's
//! region, newest first, 60 per page. Only the search term and page index
//! vary per request.

use anyhow::{Context, Result};
use url::Url;

/// Build the results URL for one page of a search.
pub fn build_search_url(base_url: &str, search_path: &str, term: &str, page: u32) -> Result<String> {
    let mut url = Url::parse(base_url)
        .with_context(|| format!("invalid base URL: {base_url}"))?
        .join(search_path)
        .with_context(|| format!("invalid search path: {search_path}"))?;

    url.query_pairs_mut()
        .append_pair("_nkw", term)
        .append_pair("_sacat", "0")
        .append_pair("LH_Sold", "1")
        .append_pair("LH_Complete", "1")
        .append_pair("LH_PrefLoc", "1")
        .append_pair("_sop", "13")
        .append_pair("_ipg", "60");
    if page > 1 {
        url.query_pairs_mut().append_pair("_pgn", &page.to_string());
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_omits_the_page_parameter() {
        let url = build_search_url("https://www.ebay.com", "/sch/i.html", "widget pro", 1).unwrap();
        assert!(url.starts_with("https://www.ebay.com/sch/i.html?"));
        assert!(url.contains("_nkw=widget+pro"));
        assert!(url.contains("LH_Sold=1"));
        assert!(url.contains("_ipg=60"));
        assert!(!url.contains("_pgn"));
    }

    #[test]
    fn later_pages_carry_the_index() {
        let url = build_search_url("https://www.ebay.com", "/sch/i.html", "widget", 4).unwrap();
        assert!(url.contains("_pgn=4"));
    }

    #[test]
    fn invalid_base_is_an_error() {
        assert!(build_search_url("not a url", "/sch/i.html", "widget", 1).is_err());
    }
}
