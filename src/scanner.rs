//! Link matching: finds Markdown link/image syntax and HTML `<img>` tags in raw text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::{Reference, Syntax};

/// `<img ... src="...">`, split into opening, target, and closing quote.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static HTML_IMG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"(<img\s+[^>]*src=")([^"]+)(")"#).expect("valid html img regex");
});

/// `[text](target)` with optional `!`, `<...>` destination, and trailing title.
/// The target is either the angled group or the shortest bare run that leaves
/// an optional quoted title followed by `)`.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static MARKDOWN_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r#"!?\[[^\]\n]*\]\((?:<(?P<angled>[^>\n]+)>|(?P<bare>[^)\n]+?))(?:\s+(?:"[^"\n]*"|'[^'\n]*'))?\)"#,
    )
    .expect("valid markdown link regex");
});

/// Every `<img src="...">` reference in `text`, in document order.
/// Remote targets are yielded too; the rewriter decides what to skip.
pub fn html_image_references(text: &str) -> impl Iterator<Item = Reference<'_>> {
    return HTML_IMG_PATTERN
        .captures_iter(text)
        .filter_map(|cap| return parse_html_img_capture(&cap));
}

/// Every Markdown link or image reference in `text` whose target is local,
/// in document order. Targets starting with `http://`, `https://`, or `#`
/// are never yielded.
pub fn markdown_references(text: &str) -> impl Iterator<Item = Reference<'_>> {
    return MARKDOWN_LINK_PATTERN
        .captures_iter(text)
        .filter_map(|cap| return parse_markdown_link_capture(text, &cap))
        .filter(|reference| return !reference.is_remote_or_anchor());
}

/// Split an `<img>` capture into its three groups.
fn parse_html_img_capture<'t>(cap: &Captures<'t>) -> Option<Reference<'t>> {
    let whole = cap.get(0)?;
    return Some(Reference {
        prefix: cap.get(1)?.as_str(),
        span: whole.range(),
        suffix: cap.get(3)?.as_str(),
        syntax: Syntax::HtmlImg,
        target: cap.get(2)?.as_str(),
    });
}

/// Whether the character right after `before` is backslash-escaped, i.e.
/// `before` ends in an odd run of backslashes.
fn is_escaped(before: &str) -> bool {
    return before
        .chars()
        .rev()
        .take_while(|c| return *c == '\\')
        .fold(false, |escaped, _| return !escaped);
}

/// Split a Markdown link capture around its target. Whatever precedes the
/// target becomes the prefix (including `<`), whatever follows it becomes the
/// suffix (including `>` and any title), so the three parts always rejoin to
/// the matched text. An escaped opening `\\[` is literal text, not a link.
fn parse_markdown_link_capture<'t>(text: &'t str, cap: &Captures<'t>) -> Option<Reference<'t>> {
    let whole = cap.get(0)?;
    if !whole.as_str().starts_with('!') && is_escaped(text.get(..whole.start())?) {
        return None;
    }
    let target = cap.name("angled").or_else(|| return cap.name("bare"))?;

    return Some(Reference {
        prefix: text.get(whole.start()..target.start())?,
        span: whole.range(),
        suffix: text.get(target.end()..whole.end())?,
        syntax: Syntax::Markdown,
        target: target.as_str(),
    });
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;

    /// Rejoin a reference's parts the way the rewriter does when leaving it unchanged.
    fn rejoin(reference: &Reference<'_>) -> String {
        return reference.with_target(reference.target);
    }

    #[test]
    fn splits_image_into_prefix_target_suffix() {
        let text = "intro ![test](./image/test.jpg) outro";
        let refs: Vec<Reference<'_>> = markdown_references(text).collect();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].prefix, "![test](");
        assert_eq!(refs[0].target, "./image/test.jpg");
        assert_eq!(refs[0].suffix, ")");
        assert_eq!(refs[0].syntax, Syntax::Markdown);
        assert_eq!(&text[refs[0].span.clone()], "![test](./image/test.jpg)");
    }

    #[test]
    fn matches_plain_links_and_empty_alt() {
        let text = "[doc](./guide.pdf) and ![](./a.png)";
        let targets: Vec<&str> = markdown_references(text).map(|r| r.target).collect();

        assert_eq!(targets, vec!["./guide.pdf", "./a.png"]);
    }

    #[test]
    fn skips_remote_and_anchor_targets() {
        let text = "[a](http://x.com/a.png) [b](https://x.com/b.png) [c](#section) ![d](./d.png)";
        let targets: Vec<&str> = markdown_references(text).map(|r| r.target).collect();

        assert_eq!(targets, vec!["./d.png"]);
    }

    #[test]
    fn remote_link_does_not_swallow_following_reference() {
        let text = "[site](https://example.com) then ![pic](photo.png)";
        let refs: Vec<Reference<'_>> = markdown_references(text).collect();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].prefix, "![pic](");
        assert_eq!(refs[0].target, "photo.png");
    }

    #[test]
    fn trailing_title_moves_into_suffix() {
        let text = r#"![alt text](./image/test.jpg "title") ![b](b.png 'single')"#;
        let refs: Vec<Reference<'_>> = markdown_references(text).collect();

        assert_eq!(refs[0].target, "./image/test.jpg");
        assert_eq!(refs[0].suffix, r#" "title")"#);
        assert_eq!(refs[1].target, "b.png");
        assert_eq!(refs[1].suffix, " 'single')");
    }

    #[test]
    fn spaces_and_hashes_stay_in_bare_target() {
        let text = "![test](./image/test space.jpg) ![h](./image/test#hash.jpg)";
        let targets: Vec<&str> = markdown_references(text).map(|r| r.target).collect();

        assert_eq!(targets, vec!["./image/test space.jpg", "./image/test#hash.jpg"]);
    }

    #[test]
    fn angled_destination_keeps_brackets_in_delimiters() {
        let text = "![x](<./image/test space.jpg>)";
        let refs: Vec<Reference<'_>> = markdown_references(text).collect();

        assert_eq!(refs[0].prefix, "![x](<");
        assert_eq!(refs[0].target, "./image/test space.jpg");
        assert_eq!(refs[0].suffix, ">)");
    }

    #[test]
    fn escaped_brackets_are_literal_text() {
        let text = r"\!\[test\](./image/test space.jpg) \\![real](./a.png) \![bang](./b.png)";
        let targets: Vec<&str> = markdown_references(text).map(|r| r.target).collect();

        assert_eq!(targets, vec!["./a.png", "./b.png"]);
        assert!(is_escaped(r"x\"));
        assert!(!is_escaped(r"x\\"));
        assert!(!is_escaped(""));
    }

    #[test]
    fn finds_html_img_src() {
        let text = r#"<p><img src="./image/test.jpg" alt="html tag"></p>"#;
        let refs: Vec<Reference<'_>> = html_image_references(text).collect();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].prefix, r#"<img src=""#);
        assert_eq!(refs[0].target, "./image/test.jpg");
        assert_eq!(refs[0].suffix, "\"");
        assert_eq!(refs[0].syntax, Syntax::HtmlImg);
    }

    #[test]
    fn html_pass_yields_remote_sources_for_the_rewriter_to_skip() {
        let text = r#"<img width="10" src="https://cdn.example.com/a.png">"#;
        let refs: Vec<Reference<'_>> = html_image_references(text).collect();

        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_remote_or_anchor());
    }

    #[test]
    fn parts_rejoin_to_matched_text() {
        let text = r#"![a](<x y.png> "t") [b](./b.md) <img class="c" src="c.gif">"#;
        for reference in markdown_references(text).chain(html_image_references(text)) {
            assert_eq!(rejoin(&reference), &text[reference.span.clone()]);
        }
    }

    #[test]
    fn scanning_is_restartable() {
        let text = "![a](a.png)\n![b](b.png)\n";
        let first: Vec<Reference<'_>> = markdown_references(text).collect();
        let second: Vec<Reference<'_>> = markdown_references(text).collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn ignores_unclosed_syntax() {
        let text = "![broken](./a.png\n[also broken](";
        assert_eq!(markdown_references(text).count(), 0);
    }
}
