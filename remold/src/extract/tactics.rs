//! The individual fallback tactics of the cascading extractor.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{grammar_parses, ExtractionStrategy, Tactic};

/// Matches fenced code blocks with an optional language tag.
static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w*)[ \t]*\n(.*?)```").expect("valid fence regex"));

/// Tactic 1: the entire trimmed text, as-is.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DirectTactic;

impl Tactic for DirectTactic {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn apply(&self, input: &str) -> Option<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.to_string())
    }
}

/// Tactic 2: the inner content of a fenced code block.
///
/// Blocks whose fence tag names the target format are preferred over
/// untagged blocks; a tagged block of another language is never used. With
/// several eligible blocks, the first whose content parses wins, so the
/// tactic applies the grammar check itself while picking.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FencedBlockTactic {
    strategy: ExtractionStrategy,
}

impl FencedBlockTactic {
    pub(crate) fn json() -> Self {
        Self {
            strategy: ExtractionStrategy::Json,
        }
    }

    pub(crate) fn xml() -> Self {
        Self {
            strategy: ExtractionStrategy::Xml,
        }
    }

    fn tag_matches(&self, lang: &str) -> bool {
        let lower = lang.to_lowercase();
        match self.strategy {
            ExtractionStrategy::Json => {
                lower == "json" || lower == "jsonc" || lower == "json5"
            }
            ExtractionStrategy::Xml => lower == "xml",
        }
    }
}

impl Tactic for FencedBlockTactic {
    fn name(&self) -> &'static str {
        "fenced_block"
    }

    fn apply(&self, input: &str) -> Option<String> {
        let blocks: Vec<(&str, &str)> = CODE_BLOCK
            .captures_iter(input)
            .filter_map(|cap| {
                let lang = cap.get(1)?.as_str();
                let content = cap.get(2)?.as_str().trim();
                (!content.is_empty()).then_some((lang, content))
            })
            .collect();

        let tagged = blocks
            .iter()
            .filter(|(lang, _)| self.tag_matches(lang))
            .map(|(_, content)| *content)
            .find(|content| grammar_parses(content, self.strategy));
        if let Some(content) = tagged {
            return Some(content.to_string());
        }

        blocks
            .iter()
            .filter(|(lang, _)| lang.is_empty())
            .map(|(_, content)| *content)
            .find(|content| grammar_parses(content, self.strategy))
            .map(str::to_string)
    }
}

/// Tactic 3 (JSON): minimal balanced span from the first root delimiter in
/// the text, `{` or `[`, whichever comes first.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BalancedSpanTactic;

impl Tactic for BalancedSpanTactic {
    fn name(&self) -> &'static str {
        "balanced_span"
    }

    fn apply(&self, input: &str) -> Option<String> {
        let (open, close) = match (input.find('{'), input.find('[')) {
            (Some(obj), Some(arr)) if arr < obj => ('[', ']'),
            (Some(_), _) => ('{', '}'),
            (None, Some(_)) => ('[', ']'),
            (None, None) => return None,
        };
        balanced_span(input, open, close).map(str::to_string)
    }
}

/// Tactic 5 (JSON only): balanced span anchored on the array root delimiter.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ArraySpanTactic;

impl Tactic for ArraySpanTactic {
    fn name(&self) -> &'static str {
        "array_span"
    }

    fn apply(&self, input: &str) -> Option<String> {
        balanced_span(input, '[', ']').map(str::to_string)
    }
}

/// Scans for the first `open` delimiter and extracts the minimal span up to
/// its matching `close`, counting depth and ignoring delimiters inside
/// string literals.
fn balanced_span(input: &str, open: char, close: char) -> Option<&str> {
    let start = input.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in input[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if ch == open && !in_string => depth += 1,
            _ if ch == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..start + idx + close.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Tactic 4: strip characters outside the grammar's allow-list and retry.
///
/// For JSON this keeps letters, digits, JSON punctuation, quotes and
/// whitespace; it recovers payloads wrapped in decorative characters such
/// as smart quotes. For XML it strips invisible and control characters
/// (BOM, zero-width spaces) that break the parser.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CharFilterTactic {
    strategy: ExtractionStrategy,
}

impl CharFilterTactic {
    pub(crate) fn json() -> Self {
        Self {
            strategy: ExtractionStrategy::Json,
        }
    }

    pub(crate) fn xml() -> Self {
        Self {
            strategy: ExtractionStrategy::Xml,
        }
    }
}

impl Tactic for CharFilterTactic {
    fn name(&self) -> &'static str {
        "char_filter"
    }

    fn apply(&self, input: &str) -> Option<String> {
        let filtered: String = match self.strategy {
            ExtractionStrategy::Json => input
                .chars()
                .filter(|&c| {
                    c.is_ascii_alphanumeric()
                        || c.is_whitespace()
                        || matches!(
                            c,
                            '{' | '}'
                                | '['
                                | ']'
                                | ':'
                                | ','
                                | '"'
                                | '\''
                                | '-'
                                | '+'
                                | '.'
                                | '_'
                                | '\\'
                                | '/'
                        )
                })
                .collect(),
            ExtractionStrategy::Xml => input
                .chars()
                .filter(|&c| !is_invisible(c))
                .collect(),
        };

        let filtered = filtered.trim().to_string();
        if filtered.is_empty() || filtered == input.trim() {
            return None;
        }
        Some(filtered)
    }
}

/// Control and zero-width characters that break parsers without being
/// visible in the text.
fn is_invisible(c: char) -> bool {
    (c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        || matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}')
}

/// Tactic 3 (XML): minimal span from the first element tag to its matching
/// close tag, counting nested same-name tags.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TagSpanTactic;

impl Tactic for TagSpanTactic {
    fn name(&self) -> &'static str {
        "tag_span"
    }

    fn apply(&self, input: &str) -> Option<String> {
        let (start, name) = first_element_start(input)?;
        let mut depth = 0usize;
        let mut pos = start;

        while let Some(rel) = input[pos..].find('<') {
            let lt = pos + rel;
            let rest = &input[lt..];

            if rest.starts_with("<!--") {
                pos = lt + rest.find("-->")? + 3;
                continue;
            }
            if rest.starts_with("<![CDATA[") {
                pos = lt + rest.find("]]>")? + 3;
                continue;
            }
            if rest.starts_with("<?") {
                pos = lt + rest.find("?>")? + 2;
                continue;
            }

            let gt = lt + rest.find('>')?;
            if rest.starts_with("</") {
                if read_name(&rest[2..]) == name {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(input[start..=gt].to_string());
                    }
                }
            } else if !rest.starts_with("<!") && read_name(&rest[1..]) == name {
                let self_closing = input[lt..gt].ends_with('/');
                if self_closing {
                    if depth == 0 {
                        return Some(input[start..=gt].to_string());
                    }
                } else {
                    depth += 1;
                }
            }
            pos = gt + 1;
        }

        None
    }
}

/// Finds the first element open tag, skipping prolog, doctype and comments.
fn first_element_start(input: &str) -> Option<(usize, String)> {
    let mut pos = 0;
    while let Some(rel) = input[pos..].find('<') {
        let lt = pos + rel;
        let rest = &input[lt..];
        if !rest.starts_with("<?") && !rest.starts_with("<!") && !rest.starts_with("</") {
            let name = read_name(&rest[1..]);
            if name
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
            {
                return Some((lt, name.to_string()));
            }
        }
        pos = lt + 1;
    }
    None
}

/// Reads the leading XML name characters of a slice.
fn read_name(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
        .map_or(s.len(), |(idx, _)| idx);
    &s[..end]
}
