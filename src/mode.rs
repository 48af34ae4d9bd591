/// Parses a git-style mode string (e.g. `100644`, `100755`) into the low 12
/// bits that matter for permission application. Non-octal input is not a
/// patch error — mode lines are metadata, not content — so it is treated as
/// "no mode" rather than rejected.
pub fn parse_mode(raw: &str) -> Option<u32> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    u32::from_str_radix(&cleaned, 8).ok().map(|m| m & 0o7777)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_regular_file_mode() {
        assert_eq!(parse_mode("100644"), Some(0o644));
    }

    #[test]
    fn parses_executable_mode() {
        assert_eq!(parse_mode("100755"), Some(0o755));
    }

    #[test]
    fn strips_whitespace() {
        assert_eq!(parse_mode(" 100644 \n"), Some(0o644));
    }

    #[test]
    fn rejects_non_octal() {
        assert_eq!(parse_mode("not-a-mode"), None);
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_mode(""), None);
    }
}
