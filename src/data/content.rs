//! Post content encoding
//!
//! A post's rich content (interleaved text blocks and at most one
//! image) is persisted as a single text column. The image block is
//! replaced by the `[IMAGE]` marker and blocks are joined with
//! newlines; the image URL itself lives in the post's `image_url`
//! column. Decoding reverses this for edit re-entry.
//!
//! Two schemes coexist in stored data with no version flag:
//! - current: marker present, image sits at the marker position
//! - legacy: no marker but an image URL, image precedes all text
//!
//! The heuristic is `has marker -> current, else -> legacy`; legacy
//! decoding is lossy with respect to original block order.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Reserved literal marking the embedded image's position
pub const IMAGE_MARKER: &str = "[IMAGE]";

/// Label shown in list previews instead of a bare marker
pub const IMAGE_PLACEHOLDER_LABEL: &str = "photo post";

/// One block of editor content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// The single embedded image; the URL is the stored public URL
    Image { url: String },
}

/// Result of encoding an editor block sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContent {
    /// Persisted text payload (marker in place of the image)
    pub content: String,
    /// Image URL to store alongside, if an image block was present
    pub image_url: Option<String>,
}

/// Image size classes applied uniformly at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }
}

/// Image alignment classes, independent of the marker position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl ImageAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Encode an ordered block sequence into the persisted form.
///
/// At most one image block is supported per post.
///
/// # Errors
/// Returns a validation error when more than one image block is given
/// or when a text block contains the reserved marker literal.
pub fn encode_blocks(blocks: &[ContentBlock]) -> Result<EncodedContent, AppError> {
    let image_count = blocks
        .iter()
        .filter(|block| matches!(block, ContentBlock::Image { .. }))
        .count();
    if image_count > 1 {
        return Err(AppError::Validation(
            "a post can embed at most one image".to_string(),
        ));
    }

    let mut image_url = None;
    let mut parts = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            ContentBlock::Text { text } => {
                if text.contains(IMAGE_MARKER) {
                    return Err(AppError::Validation(format!(
                        "text content must not contain the reserved {} marker",
                        IMAGE_MARKER
                    )));
                }
                parts.push(text.as_str());
            }
            ContentBlock::Image { url } => {
                image_url = Some(url.clone());
                parts.push(IMAGE_MARKER);
            }
        }
    }

    Ok(EncodedContent {
        content: parts.join("\n"),
        image_url,
    })
}

/// Decode a persisted payload back into an approximate block sequence.
///
/// - marker present and an image URL stored: two text segments around
///   one image block
/// - no marker but an image URL stored: legacy scheme, the image
///   precedes all text
/// - no image URL: the payload is a single text block, verbatim
pub fn decode_content(content: &str, image_url: Option<&str>) -> Vec<ContentBlock> {
    let Some(url) = image_url else {
        if content.is_empty() {
            return Vec::new();
        }
        return vec![ContentBlock::Text {
            text: content.to_string(),
        }];
    };

    let Some((before, after)) = content.split_once(IMAGE_MARKER) else {
        // Legacy rows: image stored but no marker in the text.
        let mut blocks = vec![ContentBlock::Image {
            url: url.to_string(),
        }];
        if !content.is_empty() {
            blocks.push(ContentBlock::Text {
                text: content.to_string(),
            });
        }
        return blocks;
    };

    // Strip the single newline separator the encoder added on each
    // side of the marker, keeping any interior newlines intact.
    let before = before.strip_suffix('\n').unwrap_or(before);
    let after = after.strip_prefix('\n').unwrap_or(after);

    let mut blocks = Vec::with_capacity(3);
    if !before.is_empty() {
        blocks.push(ContentBlock::Text {
            text: before.to_string(),
        });
    }
    blocks.push(ContentBlock::Image {
        url: url.to_string(),
    });
    if !after.is_empty() {
        blocks.push(ContentBlock::Text {
            text: after.to_string(),
        });
    }
    blocks
}

/// Build a list-view preview for a persisted payload.
///
/// A payload that is exactly the marker (an image-only post) gets the
/// placeholder label instead of the literal marker; otherwise the
/// marker is dropped from the text. The result is truncated to
/// `max_chars` characters on a character boundary.
pub fn preview_excerpt(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    let text = if trimmed == IMAGE_MARKER {
        IMAGE_PLACEHOLDER_LABEL.to_string()
    } else {
        content
            .replace(&format!("\n{}\n", IMAGE_MARKER), "\n")
            .replace(IMAGE_MARKER, "")
            .trim()
            .to_string()
    };

    if text.chars().count() <= max_chars {
        return text;
    }
    text.chars().take(max_chars).collect()
}
