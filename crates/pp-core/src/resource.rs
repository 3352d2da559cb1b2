//! Puzzle list resource: URL resolution and response handling.
//!
//! The transport itself lives in the wasm bridge; these helpers hold the
//! rules it follows so they can be tested natively.

use crate::error::PuzzleError;
use crate::puzzle::{Puzzle, parse_puzzle_list};

/// Resolve `url` against the directory of the page at `page_href`.
pub fn resolve_relative(page_href: &str, url: &str) -> String {
    let dir = page_href
        .rfind('/')
        .map(|i| &page_href[..i])
        .unwrap_or(page_href);
    format!("{dir}/{url}")
}

/// A request succeeded on HTTP 200, or on status 0 for a local file (pages
/// opened straight from disk report 0 even when the read worked).
pub fn load_succeeded(status: u16, resolved_url: &str) -> bool {
    status == 200 || (status == 0 && resolved_url.starts_with("file://"))
}

/// Turn a finished request into a puzzle list.
pub fn handle_response(
    status: u16,
    resolved_url: &str,
    body: &str,
) -> Result<Vec<Puzzle>, PuzzleError> {
    if !load_succeeded(status, resolved_url) {
        return Err(PuzzleError::LoadFailed {
            url: resolved_url.to_string(),
            status,
        });
    }
    parse_puzzle_list(body, resolved_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_against_page_directory() {
        assert_eq!(
            resolve_relative("https://example.org/course/week1/index.html", "puzzles.json"),
            "https://example.org/course/week1/puzzles.json"
        );
        assert_eq!(
            resolve_relative("file:///home/me/widget/page.html", "data/p.json"),
            "file:///home/me/widget/data/p.json"
        );
    }

    #[test]
    fn local_file_carve_out() {
        assert!(load_succeeded(200, "https://x/p.json"));
        assert!(load_succeeded(0, "file:///x/p.json"));
        assert!(!load_succeeded(0, "https://x/p.json"));
        assert!(!load_succeeded(404, "file:///x/p.json"));
    }

    #[test]
    fn not_found_is_a_load_failure() {
        let err = handle_response(404, "https://x/p.json", "Not Found").unwrap_err();
        assert!(matches!(err, PuzzleError::LoadFailed { status: 404, .. }));
    }

    #[test]
    fn good_response_parses() {
        let puzzles = handle_response(200, "https://x/p.json", r#"[{"code": "a\nb"}]"#).unwrap();
        assert_eq!(puzzles.len(), 1);
    }
}
