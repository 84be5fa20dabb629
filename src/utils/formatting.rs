pub fn apply_pattern_string(pattern: &str, vars: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();
    for (key, value) in vars {
        let needle = format!(":{}", key);
        result = result.replace(&needle, value);
    }
    result
}

/// Slack mention markup for an external user id.
pub fn slack_mention(external_id: &str) -> String {
    format!("<@{}>", external_id)
}

const SHORT_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Human-facing issue id such as `WEB-1A`: upper-cased project slug plus
/// the per-project counter in Crockford base32.
pub fn qualified_short_id(project_slug: &str, short_id: i64) -> String {
    let mut value = short_id.max(0) as u64;
    let mut digits = Vec::new();
    loop {
        digits.push(SHORT_ID_ALPHABET[(value % 32) as usize] as char);
        value /= 32;
        if value == 0 {
            break;
        }
    }
    let encoded: String = digits.into_iter().rev().collect();
    format!("{}-{}", project_slug.to_uppercase(), encoded)
}
