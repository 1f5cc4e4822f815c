use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Formatting tags kept when a transcript is fetched with `preserve_formatting`
const FORMATTING_TAGS: &[&str] = &[
    "strong", "em", "b", "i", "mark", "small", "del", "ins", "sub", "sup",
];

/// Character references as browsers recognise them: numeric ones and names of up to
/// 32 characters, each with an optional trailing semicolon
fn charref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[^\t\n\f <&#;]{1,32};?)").expect("valid charref regex")
    })
}

/// HTML5 named references keyed without the leading `&`, e.g. `eacute;` and `eacute`
fn named_entities() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        entities::ENTITIES
            .iter()
            .map(|entity| (entity.entity.trim_start_matches('&'), entity.characters))
            .collect()
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?\s*([a-zA-Z][a-zA-Z0-9]*)?[^>]*>").expect("valid tag regex"))
}

fn language_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z]{2,3}(-[a-zA-Z]{2,4})?$").expect("valid language regex"))
}

/// Decode one level of HTML character references.
///
/// Every HTML5 named reference is known, including the legacy ones that may omit
/// their semicolon (`caf&eacute` is `café`). Unknown names are left untouched and
/// invalid code points become U+FFFD.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    charref_regex()
        .replace_all(text, |caps: &Captures| decode_charref(&caps[1]))
        .into_owned()
}

fn decode_charref(reference: &str) -> String {
    if let Some(number) = reference.strip_prefix('#') {
        let number = number.trim_end_matches(';');
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        };

        let decoded = code
            .ok()
            .filter(|&code| code != 0)
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return decoded.to_string();
    }

    let table = named_entities();
    if let Some(characters) = table.get(reference) {
        return characters.to_string();
    }

    // longest known prefix wins: "&notit;" is "¬it;"
    for end in (2..reference.len()).rev() {
        if !reference.is_char_boundary(end) {
            continue;
        }
        if let Some(characters) = table.get(&reference[..end]) {
            return format!("{}{}", characters, &reference[end..]);
        }
    }

    format!("&{}", reference)
}

/// Remove HTML tags from caption text.
///
/// With `preserve_formatting`, basic formatting tags such as `<i>` and `<b>` are kept.
pub fn strip_html_tags(text: &str, preserve_formatting: bool) -> String {
    if !text.contains('<') {
        return text.to_string();
    }

    tag_regex()
        .replace_all(text, |caps: &Captures| {
            let keep = preserve_formatting
                && caps
                    .get(1)
                    .map(|name| FORMATTING_TAGS.contains(&name.as_str().to_lowercase().as_str()))
                    .unwrap_or(false);

            if keep {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Check whether a language code looks like `en`, `zh-TW` or `pt-BR`
pub fn validate_language_code(language_code: &str) -> bool {
    language_code_regex().is_match(language_code)
}

/// Whether the input is an http(s) URL rather than a bare identifier
pub fn is_url(input: &str) -> bool {
    let lower = input.trim_start().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Replace characters that are invalid in file names and trim leading or trailing
/// spaces and dots
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| if "<>:\"/\\|?*".contains(c) { '_' } else { c })
        .collect();
    sanitized.trim_matches(|c| c == ' ' || c == '.').to_string()
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
