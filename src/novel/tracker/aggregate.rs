use tracing::{debug, info, instrument};

use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::store::DocumentSource;

const DELIMITER: &str = "---\n";
const CLOSING_DELIMITER: &str = "\n---\n";

/// A document split into its metadata header and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    pub header: &'a str,
    pub body: &'a str,
}

/// Splits `text` into a `---` delimited header and the body that follows.
///
/// The text must open with a `---` line and the header ends at the first
/// following `---` line. Text without that shape is rejected rather than
/// counted as a whole. Line endings must already be LF; see
/// [`count_document`] for the CRLF-tolerant entry point.
pub fn split_front_matter(text: &str) -> Option<FrontMatter<'_>> {
    let rest = text.strip_prefix(DELIMITER)?;
    let end = rest.find(CLOSING_DELIMITER)?;
    Some(FrontMatter {
        header: &rest[..end],
        body: &rest[end + CLOSING_DELIMITER.len()..],
    })
}

/// Counts the Unicode scalar values of `body` that are not whitespace, so
/// line breaks and full-width spaces are ignored and a character outside the
/// Basic Multilingual Plane counts once.
pub fn count_characters(body: &str) -> u64 {
    body.chars().filter(|ch| !ch.is_whitespace()).count() as u64
}

/// Counts the body characters of a single document.
pub fn count_document(name: &str, text: &str) -> Result<u64> {
    let normalized = text.replace("\r\n", "\n");
    let parsed =
        split_front_matter(&normalized).ok_or_else(|| TrackerError::MalformedDocument {
            document: name.to_string(),
            reason: "expected a header block delimited by '---' lines".to_string(),
        })?;
    Ok(count_characters(parsed.body))
}

/// Sums the body characters of every document in `source`.
///
/// A single unreadable or malformed document fails the whole aggregation.
#[instrument(level = "info", skip_all)]
pub fn aggregate<D: DocumentSource + ?Sized>(source: &D) -> Result<u64> {
    let documents = source.list_documents()?;
    let mut total = 0u64;
    for document in &documents {
        let text = source.read_text(document)?;
        let count = count_document(&document.name, &text)?;
        debug!(document = %document.name, count, "counted document");
        total += count;
    }
    info!(documents = documents.len(), total, "aggregated character count");
    Ok(total)
}
