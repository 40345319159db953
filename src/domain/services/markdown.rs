#[cfg(test)]
#[path = "markdown_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Captures;
use regex::Regex;

pub const CODE_START: &str = "--- CODE ---";
pub const CODE_END: &str = "--- END CODE ---";

static HEADING: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+(.*?)[ \t#]*$").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?m)^([ \t]*)[-*+][ \t]+").unwrap());
/// Links, inline code and quoted spans, tried leftmost first. Quoted spans
/// are what inline code renders to, so they pass through untouched on a
/// second conversion.
static INLINE_SPAN: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(
        r#"!?\[(?P<label>[^\]\n]+)\]\((?P<url>[^)\s]+)\)|`(?P<code>[^`\n]+)`|"(?P<quoted>[^"\n]+)""#,
    )
    .unwrap();
});
static BOLD: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*|_([^_\s](?:[^_\n]*[^_\s])?)_").unwrap();
});
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| return Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// A named, pure text transform applied to prose outside of code blocks.
pub struct Stage {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Order matters: bullets run before emphasis so `* item` is not read as an
/// opening asterisk. Links, inline code and emphasis share one stage so code
/// spans like `` `a*b*c` `` or `` `arr[i](x)` `` keep their content.
pub const PROSE_STAGES: &[Stage] = &[
    Stage {
        name: "headings",
        apply: headings,
    },
    Stage {
        name: "bullets",
        apply: bullets,
    },
    Stage {
        name: "inline-spans",
        apply: inline_spans,
    },
    Stage {
        name: "blank-lines",
        apply: blank_lines,
    },
];

#[derive(Debug, PartialEq, Eq)]
pub enum Segment {
    Prose(String),
    Code(String),
}

/// Splits text into prose and code. Both markdown fences and the plaintext
/// markers this module emits are recognised, which keeps conversion
/// idempotent. An unterminated fence runs to the end of the text.
pub fn split_code_fences(text: &str) -> Vec<Segment> {
    let mut segments = vec![];
    let mut prose: Vec<&str> = vec![];
    let mut code: Vec<&str> = vec![];
    let mut closing: Option<&str> = None;

    for line in text.split('\n') {
        let trimmed = line.trim();
        match closing {
            Some(end) => {
                let is_end = if end == "```" {
                    trimmed.starts_with("```")
                } else {
                    trimmed == end
                };

                if is_end {
                    segments.push(Segment::Code(code.join("\n")));
                    code = vec![];
                    closing = None;
                } else {
                    code.push(line);
                }
            }
            None => {
                let opening = if trimmed.starts_with("```") {
                    Some("```")
                } else if trimmed == CODE_START {
                    Some(CODE_END)
                } else {
                    None
                };

                if opening.is_some() {
                    if !prose.is_empty() {
                        segments.push(Segment::Prose(prose.join("\n")));
                        prose = vec![];
                    }
                    closing = opening;
                } else {
                    prose.push(line);
                }
            }
        }
    }

    if closing.is_some() {
        segments.push(Segment::Code(code.join("\n")));
    }
    if !prose.is_empty() {
        segments.push(Segment::Prose(prose.join("\n")));
    }

    return segments;
}

fn is_word_char(c: char) -> bool {
    return c.is_alphanumeric() || c == '_';
}

/// Replaces each match with its first non-empty capture group, unless the
/// match is glued to a word on either side (`snake_case_name`, `2*3*4`).
fn strip_delimiters(text: &str, re: &Regex, require_boundary: bool) -> String {
    return re
        .replace_all(text, |caps: &Captures| {
            let Some(whole) = caps.get(0) else {
                return String::new();
            };

            if require_boundary {
                let before = text[..whole.start()].chars().next_back();
                let after = text[whole.end()..].chars().next();
                if before.map_or(false, is_word_char) || after.map_or(false, is_word_char) {
                    return whole.as_str().to_string();
                }
            }

            return caps
                .iter()
                .skip(1)
                .flatten()
                .map(|e| return e.as_str().to_string())
                .next()
                .unwrap_or_default();
        })
        .to_string();
}

pub fn headings(text: &str) -> String {
    return HEADING.replace_all(text, "$1").to_string();
}

pub fn bullets(text: &str) -> String {
    return BULLET.replace_all(text, "${1}• ").to_string();
}

pub fn emphasis(text: &str) -> String {
    let res = strip_delimiters(text, &BOLD, false);
    return strip_delimiters(&res, &ITALIC, true);
}

fn render_span(caps: &Captures) -> String {
    if let (Some(label), Some(url)) = (caps.name("label"), caps.name("url")) {
        return format!("{} ({})", inline_spans(label.as_str()), url.as_str());
    }
    if let Some(code) = caps.name("code") {
        return format!("\"{}\"", code.as_str());
    }

    return caps
        .get(0)
        .map(|e| return e.as_str().to_string())
        .unwrap_or_default();
}

/// Links become `label (url)` and inline code becomes quoted text. Quoted
/// text is kept as is, and emphasis is stripped only from the text between
/// spans.
pub fn inline_spans(text: &str) -> String {
    let mut res = String::with_capacity(text.len());
    let mut last = 0;

    for caps in INLINE_SPAN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        res += &emphasis(&text[last..whole.start()]);
        res += &render_span(&caps);
        last = whole.end();
    }
    res += &emphasis(&text[last..]);

    return res;
}

pub fn blank_lines(text: &str) -> String {
    return BLANK_LINES.replace_all(text, "\n\n").to_string();
}

fn render_code(code: &str) -> String {
    if code.is_empty() {
        return format!("{CODE_START}\n{CODE_END}");
    }

    return format!("{CODE_START}\n{code}\n{CODE_END}");
}

/// Flattens markdown into text suitable for a channel without rich text.
/// Code block content is emitted verbatim between [`CODE_START`] and
/// [`CODE_END`] markers.
pub fn markdown_to_plaintext(markdown: &str) -> String {
    let text = markdown.replace("\r\n", "\n");

    let res = split_code_fences(&text)
        .iter()
        .map(|segment| match segment {
            Segment::Code(code) => return render_code(code),
            Segment::Prose(prose) => {
                return PROSE_STAGES
                    .iter()
                    .fold(prose.to_string(), |acc, stage| {
                        tracing::trace!(stage = stage.name, "applying stage");
                        return (stage.apply)(&acc);
                    });
            }
        })
        .collect::<Vec<String>>()
        .join("\n");

    return res.trim().to_string();
}
