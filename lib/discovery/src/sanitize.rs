/// Replaces every character which is not valid in a label name with `_`.
///
/// Valid characters are `[a-zA-Z0-9_]`, non ASCII characters are replaced
/// one by one.
pub fn sanitize_label_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect()
}
