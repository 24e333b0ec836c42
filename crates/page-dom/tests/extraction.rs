use page_dom::{extract_policy_text, Document, ExtractOptions};
use pretty_assertions::assert_eq;

#[test]
fn empty_first_area_falls_back_to_body_not_next_area() {
    let doc = Document::parse("<body><main></main><article>Article</article><p>Body</p></body>");

    assert_eq!(
        extract_policy_text(&doc, &ExtractOptions::first_match()),
        "Article\nBody"
    );
}

#[test]
fn whitespace_only_first_area_counts_as_empty() {
    let doc = Document::parse(
        "<body><div class=\"content\">  <script>x()</script>\n </div><article>Article</article></body>",
    );

    assert_eq!(
        extract_policy_text(&doc, &ExtractOptions::first_match()),
        "Article"
    );
}

#[test]
fn first_matching_area_wins_even_when_short() {
    let doc = Document::parse(
        "<body><main>Short</main><div class=\"privacy-policy\">A much longer privacy text</div></body>",
    );

    assert_eq!(extract_policy_text(&doc, &ExtractOptions::first_match()), "Short");
}

#[test]
fn substantial_variant_uses_body_when_no_area_is_long_enough() {
    let doc = Document::parse("<body><nav>Menu</nav><main>Short</main><p>Tail</p></body>");

    assert_eq!(
        extract_policy_text(&doc, &ExtractOptions::substantial()),
        "Short\nTail"
    );
}
