use scraper::Html;

/// Removes every tag from `input`, keeping only its text content.
///
/// Entities are decoded (`&lt;` becomes `<`), so the result must still be
/// escaped when rendered. Leading and trailing whitespace is trimmed.
pub fn strip_markup(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}
