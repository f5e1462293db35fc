/// Strips markdown code fences from model output.
///
/// A ```` ```json ```` fence wins over a bare ```` ``` ```` fence; in both
/// cases the content between the first fence pair is kept. Text without a
/// fence is returned trimmed.
///
/// # Examples
///
/// ```
/// use product_pipeline::generation::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
/// ```
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();

    if let Some((_, rest)) = text.split_once("```json") {
        return until_fence(rest);
    }
    if let Some((_, rest)) = text.split_once("```") {
        return until_fence(rest);
    }
    text
}

fn until_fence(rest: &str) -> &str {
    rest.split_once("```")
        .map_or(rest, |(inner, _)| inner)
        .trim()
}
