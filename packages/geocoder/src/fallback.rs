//! Static substitute results for when a location search comes back empty
//! or fails.
//!
//! Both lists start with a `(0, 0)` advisory row so the reporter sees why
//! they are looking at suggestions rather than matches. The lists never
//! depend on anything but the query text, so every empty search yields the
//! same suggestions.

use galamsey_watch_report_models::SearchResult;

/// Known gold mining areas offered when a search has no match.
pub const MINING_AREAS: &[(&str, f64, f64)] = &[
    ("Obuasi Gold Mines", 6.2066, -1.6689),
    ("Tarkwa Gold Mine", 5.3018, -1.9886),
    ("Prestea Mining Area", 5.4323, -2.1437),
    ("Bibiani Gold Mine", 6.4632, -2.3295),
    ("Akyem Gold Mine", 6.3400, -0.9900),
];

/// Major population centres offered when the search service is unreachable.
pub const MAJOR_CITIES: &[(&str, f64, f64)] = &[
    ("Accra", 5.6037, -0.1870),
    ("Kumasi", 6.6885, -1.6244),
    ("Takoradi", 4.8845, -1.7519),
];

/// Advisory label shown when the search service fails.
pub const SEARCH_FAILED_LABEL: &str = "Error searching. Try these major cities:";

/// Results for a search that succeeded with zero matches.
#[must_use]
pub fn no_results(query: &str) -> Vec<SearchResult> {
    let header = SearchResult::sentinel(format!(
        "No exact results for \"{query}\". Try these mining areas:"
    ));
    std::iter::once(header).chain(to_results(MINING_AREAS)).collect()
}

/// Results for a search that failed outright.
#[must_use]
pub fn search_failed() -> Vec<SearchResult> {
    std::iter::once(SearchResult::sentinel(SEARCH_FAILED_LABEL))
        .chain(to_results(MAJOR_CITIES))
        .collect()
}

fn to_results(places: &'static [(&'static str, f64, f64)]) -> impl Iterator<Item = SearchResult> {
    places
        .iter()
        .map(|(label, lat, lng)| SearchResult::new(*label, *lat, *lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_results_embeds_query_in_header() {
        let results = no_results("Dunkwa");
        assert_eq!(results.len(), MINING_AREAS.len() + 1);
        assert!(!results[0].is_selectable());
        assert!(results[0].label.contains("\"Dunkwa\""));
        assert!(results[1..].iter().all(SearchResult::is_selectable));
        assert_eq!(results[2].label, "Tarkwa Gold Mine");
    }

    #[test]
    fn no_results_suggestions_do_not_depend_on_query() {
        let a = no_results("first");
        let b = no_results("second");
        assert_eq!(a[1..], b[1..]);
    }

    #[test]
    fn search_failed_lists_major_cities() {
        let results = search_failed();
        assert_eq!(results[0].label, SEARCH_FAILED_LABEL);
        assert!(!results[0].is_selectable());
        let names: Vec<&str> = results[1..].iter().map(|r| r.label.as_str()).collect();
        assert_eq!(names, ["Accra", "Kumasi", "Takoradi"]);
    }
}
