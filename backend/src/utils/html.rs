// src/utils/html.rs

/// Renders instructor-authored text (test and question descriptions).
///
/// The text is sanitised with ammonia first, then line breaks become `<br/>`,
/// so a stray `<script>` never reaches a page while basic markup survives.
pub fn text_to_html(input: &str) -> String {
    ammonia::clean(input).replace('\n', "<br/>")
}

/// Renders untrusted plain text (submitted answers) exactly as typed.
///
/// Every markup character is escaped line by line, so `a<b AND c>d` shows up
/// verbatim instead of being parsed as a tag.
pub fn escape_to_html(input: &str) -> String {
    input
        .split('\n')
        .map(|line| ammonia::clean_text(line.trim_end_matches('\r')))
        .collect::<Vec<_>>()
        .join("<br/>")
}
