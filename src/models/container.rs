use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Integers,
    Reals,
    Characters,
    Booleans,
    Strings,
}

impl Container {
    pub const ALL: [Container; 5] = [
        Container::Integers,
        Container::Reals,
        Container::Characters,
        Container::Booleans,
        Container::Strings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Integers => "integers",
            Container::Reals => "reals",
            Container::Characters => "characters",
            Container::Booleans => "booleans",
            Container::Strings => "strings",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Container::Integers => "Integers",
            Container::Reals => "Reals",
            Container::Characters => "Characters",
            Container::Booleans => "Booleans",
            Container::Strings => "Strings",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Container::Integers => 0,
            Container::Reals => 1,
            Container::Characters => 2,
            Container::Booleans => 3,
            Container::Strings => 4,
        }
    }

    /// Accepts the full name, the singular, or a short alias (`int`, `float`, `str`, ...).
    pub fn parse_name(input: &str) -> Option<Container> {
        match input.trim().to_ascii_lowercase().as_str() {
            "integers" | "integer" | "int" => Some(Container::Integers),
            "reals" | "real" | "float" => Some(Container::Reals),
            "characters" | "character" | "char" => Some(Container::Characters),
            "booleans" | "boolean" | "bool" => Some(Container::Booleans),
            "strings" | "string" | "str" => Some(Container::Strings),
            _ => None,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a literal to the container it belongs in. First matching rule wins.
pub fn classify(token: &str) -> Container {
    if is_boolean(token) {
        Container::Booleans
    } else if is_real(token) {
        Container::Reals
    } else if is_integer(token) {
        Container::Integers
    } else if is_character(token) {
        Container::Characters
    } else {
        Container::Strings
    }
}

fn is_boolean(token: &str) -> bool {
    token == "True" || token == "False"
}

// Digits are required on both sides of the point: "5." and ".5" are not reals.
fn is_real(token: &str) -> bool {
    let unsigned = token.strip_prefix('-').unwrap_or(token);
    match unsigned.split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
        None => false,
    }
}

fn is_integer(token: &str) -> bool {
    is_digits(token.strip_prefix('-').unwrap_or(token))
}

fn is_character(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_are_case_sensitive() {
        assert_eq!(classify("True"), Container::Booleans);
        assert_eq!(classify("False"), Container::Booleans);
        assert_eq!(classify("true"), Container::Strings);
        assert_eq!(classify("FALSE"), Container::Strings);
    }

    #[test]
    fn test_reals() {
        assert_eq!(classify("3.14"), Container::Reals);
        assert_eq!(classify("-0.5"), Container::Reals);
        assert_eq!(classify("45.0"), Container::Reals);
    }

    #[test]
    fn test_real_boundaries_are_strict() {
        assert_eq!(classify("5."), Container::Strings);
        assert_eq!(classify(".5"), Container::Strings);
        assert_eq!(classify("1.2.3"), Container::Strings);
        assert_eq!(classify("1e3"), Container::Strings);
    }

    #[test]
    fn test_integers() {
        assert_eq!(classify("42"), Container::Integers);
        assert_eq!(classify("-7"), Container::Integers);
        assert_eq!(classify("5"), Container::Integers);
        assert_eq!(classify("+5"), Container::Strings);
        assert_eq!(classify("-"), Container::Strings);
    }

    #[test]
    fn test_characters() {
        assert_eq!(classify("Q"), Container::Characters);
        assert_eq!(classify("z"), Container::Characters);
        assert_eq!(classify("é"), Container::Characters);
        assert_eq!(classify("?"), Container::Strings);
        assert_eq!(classify("IB"), Container::Strings);
    }

    #[test]
    fn test_strings_catch_all() {
        assert_eq!(classify("Hello"), Container::Strings);
        assert_eq!(classify(""), Container::Strings);
        assert_eq!(classify(" 42"), Container::Strings);
    }

    #[test]
    fn test_parse_name_aliases() {
        assert_eq!(Container::parse_name("int"), Some(Container::Integers));
        assert_eq!(Container::parse_name("Reals"), Some(Container::Reals));
        assert_eq!(Container::parse_name("float"), Some(Container::Reals));
        assert_eq!(Container::parse_name(" char "), Some(Container::Characters));
        assert_eq!(Container::parse_name("bool"), Some(Container::Booleans));
        assert_eq!(Container::parse_name("string"), Some(Container::Strings));
        assert_eq!(Container::parse_name("list"), None);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, container) in Container::ALL.iter().enumerate() {
            assert_eq!(container.index(), i);
        }
    }
}
