#[cfg(test)]
#[path = "attributed_body_test.rs"]
mod tests;

/// Class names and headers from the archive format that look like text but
/// never carry message content.
const ARCHIVE_NOISE: [&str; 10] = [
    "streamtyped",
    "NSAttributedString",
    "NSMutableAttributedString",
    "NSObject",
    "NSString",
    "NSMutableString",
    "NSDictionary",
    "NSNumber",
    "NSValue",
    "__kIMMessagePartAttributeName",
];

/// How the text was recovered. Neither strategy understands the archive
/// format, so results are guesses and are labelled as such.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Confidence {
    /// A byte that read as a length was followed by exactly that many
    /// printable bytes.
    LengthPrefixed,
    /// Longest printable run in the blob.
    LongestRun,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrubbedText {
    pub text: String,
    pub confidence: Confidence,
}

fn is_printable(byte: u8) -> bool {
    return (32..=126).contains(&byte) || byte >= 0x80;
}

fn accept(bytes: &[u8], require_letter: bool) -> Option<String> {
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    if text.is_empty() || ARCHIVE_NOISE.contains(&text.as_str()) {
        return None;
    }

    let meaningful = if require_letter {
        text.chars().any(|c| return c.is_ascii_alphabetic())
    } else {
        text.chars().any(|c| return c.is_ascii_alphanumeric())
    };
    if !meaningful {
        return None;
    }

    return Some(text);
}

fn length_prefixed(blob: &[u8]) -> Option<String> {
    let mut idx = 0;
    while idx + 3 < blob.len() {
        let len = blob[idx] as usize;
        if len > 0 && idx + len < blob.len() {
            let candidate = &blob[idx + 1..=idx + len];
            if candidate.iter().all(|e| return is_printable(*e)) {
                if let Some(text) = accept(candidate, false) {
                    return Some(text);
                }
            }
        }
        idx += 1;
    }

    return None;
}

fn longest_run(blob: &[u8]) -> Option<String> {
    let mut best: Option<String> = None;
    let mut best_len = 0;

    for run in blob.split(|e| return !is_printable(*e)) {
        if run.len() <= best_len {
            continue;
        }
        if let Some(text) = accept(run, true) {
            best_len = run.len();
            best = Some(text);
        }
    }

    return best;
}

/// Best effort recovery of message text from an archived attributed string.
/// Returns `None` when there is no blob or nothing in it resembles text.
pub fn scrub_attributed_body(blob: Option<&[u8]>) -> Option<ScrubbedText> {
    let blob = blob?;

    if let Some(text) = length_prefixed(blob) {
        return Some(ScrubbedText {
            text,
            confidence: Confidence::LengthPrefixed,
        });
    }

    if let Some(text) = longest_run(blob) {
        tracing::debug!(len = text.len(), "attributed body fell back to longest run");
        return Some(ScrubbedText {
            text,
            confidence: Confidence::LongestRun,
        });
    }

    return None;
}
