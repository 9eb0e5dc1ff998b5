/// Remove Markdown code fences a model wrapped around its answer.
///
/// Opening fences (with an optional language tag) are dropped together with
/// their line break, closing fences are dropped from line ends, and the
/// result is trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        let body = match body.strip_prefix("```") {
            Some(rest) => {
                let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_');
                if rest.is_empty() {
                    continue;
                }
                rest
            }
            None => body,
        };
        out.push_str(body.strip_suffix("```").unwrap_or(body));
        out.push_str(newline);
    }
    out.trim().to_string()
}
