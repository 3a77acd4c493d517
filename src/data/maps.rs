//! Recognized-token tables for the LaTeX → HTML scanner.
//!
//! Every command the transcoder understands is listed here; anything not
//! found in these maps is passed through verbatim.

use phf::phf_map;

/// Superscript or subscript direction for Unicode script mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Sub,
    Super,
}

/// What the inline scanner does when it meets a named control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandToken {
    /// `\section` family, rendered as `<hN>`
    Heading(u8),
    /// One braced argument wrapped in the given HTML tag
    Wrap(&'static str),
    /// `\AdventInitial{X}{rest}` - decorative initial, both arguments concatenated
    Initial,
    /// `\textsubscript` / `\textsuperscript`
    Script(ScriptKind),
    /// Zero-argument command replaced by literal text
    Literal(&'static str),
    /// List entry marker
    Item,
    /// `\begin{..}`
    Begin,
    /// `\end{..}`
    End,
}

/// Named control sequences and their scanner behavior.
pub static COMMANDS: phf::Map<&'static str, CommandToken> = phf_map! {
    "section" => CommandToken::Heading(3),
    "subsection" => CommandToken::Heading(4),
    "subsubsection" => CommandToken::Heading(5),
    "textbf" => CommandToken::Wrap("strong"),
    "emph" => CommandToken::Wrap("em"),
    "textit" => CommandToken::Wrap("em"),
    "AdventInitial" => CommandToken::Initial,
    "textsubscript" => CommandToken::Script(ScriptKind::Sub),
    "textsuperscript" => CommandToken::Script(ScriptKind::Super),
    "ss" => CommandToken::Literal("ß"),
    "ldots" => CommandToken::Literal("…"),
    "dots" => CommandToken::Literal("…"),
    "LaTeX" => CommandToken::Literal("LaTeX"),
    "TeX" => CommandToken::Literal("TeX"),
    "item" => CommandToken::Item,
    "begin" => CommandToken::Begin,
    "end" => CommandToken::End,
};

/// List flavor of a list-like environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
    Definition,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
            ListKind::Definition => "dl",
        }
    }
}

/// Environments with a structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    List(ListKind),
    Quote,
    /// Dropped from body HTML; entries are collected separately as references
    Bibliography,
}

pub static ENVIRONMENTS: phf::Map<&'static str, EnvKind> = phf_map! {
    "itemize" => EnvKind::List(ListKind::Unordered),
    "enumerate" => EnvKind::List(ListKind::Ordered),
    "description" => EnvKind::List(ListKind::Definition),
    "dl" => EnvKind::List(ListKind::Definition),
    "quote" => EnvKind::Quote,
    "quotation" => EnvKind::Quote,
    "thebibliography" => EnvKind::Bibliography,
};

/// Single-character escapes (`\_`, `\&`, ...) that stand for the literal character.
pub static ESCAPED_CHARS: phf::Map<char, char> = phf_map! {
    '_' => '_',
    '&' => '&',
    '%' => '%',
    '$' => '$',
    '#' => '#',
    '{' => '{',
    '}' => '}',
};

/// Umlaut accents written as `\"a`.
pub static UMLAUTS: phf::Map<char, char> = phf_map! {
    'a' => 'ä',
    'o' => 'ö',
    'u' => 'ü',
    'A' => 'Ä',
    'O' => 'Ö',
    'U' => 'Ü',
    'e' => 'ë',
    'i' => 'ï',
};

pub static SUBSCRIPTS: phf::Map<char, char> = phf_map! {
    '0' => '₀',
    '1' => '₁',
    '2' => '₂',
    '3' => '₃',
    '4' => '₄',
    '5' => '₅',
    '6' => '₆',
    '7' => '₇',
    '8' => '₈',
    '9' => '₉',
};

pub static SUPERSCRIPTS: phf::Map<char, char> = phf_map! {
    '0' => '⁰',
    '1' => '¹',
    '2' => '²',
    '3' => '³',
    '4' => '⁴',
    '5' => '⁵',
    '6' => '⁶',
    '7' => '⁷',
    '8' => '⁸',
    '9' => '⁹',
    '+' => '⁺',
    '-' => '⁻',
};

/// Map every character of `text` to its Unicode script form.
///
/// Returns `None` if any character has no precomposed counterpart.
pub fn to_script(text: &str, kind: ScriptKind) -> Option<String> {
    let table = match kind {
        ScriptKind::Sub => &SUBSCRIPTS,
        ScriptKind::Super => &SUPERSCRIPTS,
    };
    if text.is_empty() {
        return None;
    }
    text.chars().map(|c| table.get(&c).copied()).collect()
}

/// Like [`to_script`], but keeps unmappable characters as they are.
pub fn to_script_lossy(text: &str, kind: ScriptKind) -> String {
    let table = match kind {
        ScriptKind::Sub => &SUBSCRIPTS,
        ScriptKind::Super => &SUPERSCRIPTS,
    };
    text.chars()
        .map(|c| table.get(&c).copied().unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_mapping() {
        assert_eq!(to_script("12", ScriptKind::Sub).as_deref(), Some("₁₂"));
        assert_eq!(to_script("-1", ScriptKind::Super).as_deref(), Some("⁻¹"));
        assert_eq!(to_script("n", ScriptKind::Sub), None);
        assert_eq!(to_script("", ScriptKind::Sub), None);
        assert_eq!(to_script_lossy("2n", ScriptKind::Super), "²n");
    }

    #[test]
    fn test_command_table() {
        assert_eq!(COMMANDS.get("textbf"), Some(&CommandToken::Wrap("strong")));
        assert_eq!(COMMANDS.get("subsection"), Some(&CommandToken::Heading(4)));
        assert!(COMMANDS.get("frac").is_none());
        assert_eq!(
            ENVIRONMENTS.get("description"),
            Some(&EnvKind::List(ListKind::Definition))
        );
    }
}
