//! Channel name normalization

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("empty channel name")]
    Empty,
    #[error("'{0}' is not a public channel name or link")]
    Invalid(String),
}

const HOSTS: [&str; 3] = ["t.me/", "telegram.me/", "telegram.dog/"];

/// Extract the public username from a name or link.
///
/// Accepts `name`, `@name`, `t.me/name`, `https://t.me/s/name`,
/// `https://t.me/name/123` and web client links such as
/// `https://web.telegram.org/k/#@name`.
pub fn normalize_channel(input: &str) -> Result<String, ChannelError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ChannelError::Empty);
    }
    let invalid = || ChannelError::Invalid(trimmed.to_string());

    let mut s = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    s = s.strip_prefix("www.").unwrap_or(s);

    if s.starts_with("web.telegram.org") {
        s = s.split_once('#').map(|(_, fragment)| fragment).ok_or_else(invalid)?;
    } else if let Some(rest) = HOSTS.iter().find_map(|h| s.strip_prefix(h)) {
        s = rest.strip_prefix("s/").unwrap_or(rest);
    }
    s = s.strip_prefix('@').unwrap_or(s);

    let name = s.split(&['/', '?', '#'][..]).next().unwrap_or_default();
    let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(invalid());
    }
    Ok(name.to_string())
}
