use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

static NBSP_VARIANTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\u{a0}|&nbsp;|&#160;").unwrap());
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MARKUP_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Collapse non-breaking-space variants and whitespace runs to single
/// spaces and trim the edges. Idempotent.
pub fn clean_html_light(input: &str) -> String {
    let despaced = NBSP_VARIANTS.replace_all(input, " ");
    WHITESPACE_RUNS.replace_all(&despaced, " ").trim().to_string()
}

/// Replace embedded tags with spaces, then normalize. A cell like
/// `<span>3.2</span>%` comes out as `3.2 %`.
pub fn strip_tags(html: &str) -> String {
    clean_html_light(&MARKUP_TAGS.replace_all(html, " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_nbsp_variants_and_runs() {
        assert_eq!(clean_html_light("a\u{a0}&nbsp;&#160;  b"), "a b");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = clean_html_light("  3.2 \u{a0} %\n");
        assert_eq!(clean_html_light(&once), once);
    }

    #[test]
    fn strips_tags_with_single_space_between_fragments() {
        assert_eq!(strip_tags("<span>3.2</span>%"), "3.2 %");
    }

    #[test]
    fn strips_nested_tags_inside_cell_content() {
        assert_eq!(
            strip_tags("<a href=\"x\"><b>CPI</b> (YoY)</a>&nbsp;(Dec)"),
            "CPI (YoY) (Dec)"
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(strip_tags(""), "");
        assert_eq!(clean_html_light("   "), "");
    }
}
