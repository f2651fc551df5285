use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A selectable quick-reply option parsed out of an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyOption {
    pub number: u8,
    pub label: String,
}

/// Structured artifacts extracted from one message, plus the message text
/// with the artifact markup removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMessage {
    pub display_text: String,
    /// Settlement report download URL, when the message carries one.
    pub report_url: Option<String>,
    pub options: Vec<QuickReplyOption>,
}

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\((https?://[^\s)]+)\)").expect("Invalid regex"));

static PLAIN_REPORT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Download your settlement report:\s*(https?://\S+)").expect("Invalid regex")
});

static VEHICLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)select the vehicle").expect("Invalid regex"));

/// A line offering one choice: a digit 1-3 rendered as a keycap glyph
/// (digit, optional U+FE0F, U+20E3) followed by the option text.
static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([1-3])\x{FE0F}?\x{20E3}\s*(.+?)\s*$").expect("Invalid regex")
});

/// Extract embedded artifacts from a message.
///
/// The settlement-report link rules are mutually exclusive: the markdown
/// form `[label](https://...)` is tried first, then the plain sentence
/// `Download your settlement report: https://...`. Whichever matches is
/// removed from the display text. Independently, when the text contains the
/// vehicle-selection marker sentence, each keycap option line becomes a
/// quick-reply option and is stripped from the display text.
pub fn extract(text: &str) -> ExtractedMessage {
    let mut display = text.to_string();
    let mut report_url = None;

    let link = MARKDOWN_LINK
        .captures(&display)
        .or_else(|| PLAIN_REPORT_LINK.captures(&display))
        .and_then(|caps| {
            let whole = caps.get(0)?;
            Some((caps[1].to_string(), whole.range()))
        });
    if let Some((url, range)) = link {
        report_url = Some(url);
        display.replace_range(range, "");
    }

    let mut options = Vec::new();
    if VEHICLE_MARKER.is_match(&display) {
        let mut kept = Vec::new();
        for line in display.lines() {
            let option = OPTION_LINE.captures(line).and_then(|caps| {
                let number = caps[1].parse().ok()?;
                Some(QuickReplyOption {
                    number,
                    label: caps[2].to_string(),
                })
            });
            match option {
                Some(option) => options.push(option),
                None => kept.push(line),
            }
        }
        display = kept.join("\n");
    }

    ExtractedMessage {
        display_text: display.trim().to_string(),
        report_url,
        options,
    }
}
