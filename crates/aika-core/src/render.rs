//! Presentation helpers for assistant answers.
//!
//! Front ends use these to turn `(document.pdf)` references into download
//! links, shorten source excerpts and pick the relevant-link hints worth
//! showing.

use crate::conversation::SourceChunk;
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters of a source excerpt shown before it is cut.
pub const EXCERPT_MAX_CHARS: usize = 200;

static DOCUMENT_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([^)]*\.pdf[^)]*)\)").expect("document reference pattern is valid")
});

/// Download URL of a knowledge-base document, optionally at a page.
pub fn document_link(base_url: &str, document_id: &str, page: Option<u32>) -> String {
    let mut link = format!("{base_url}/documents/download/{document_id}");
    if let Some(page) = page {
        link.push_str(&format!("?page={page}"));
    }
    link
}

/// A piece of rendered message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// A document reference resolved against the message's sources.
    /// `reference` excludes the surrounding parentheses.
    Reference {
        reference: &'a str,
        url: String,
        page: Option<u32>,
    },
}

/// Splits `content` into plain text and resolved document references.
///
/// A `( ... .pdf ... )` group becomes a [`Segment::Reference`] only when a
/// source's filename equals it, contains it, or is contained in it. Sources
/// without a filename never match. Unresolved groups stay plain text.
pub fn render_references<'a>(
    content: &'a str,
    sources: &[SourceChunk],
    base_url: &str,
) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for captures in DOCUMENT_REFERENCE.captures_iter(content) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let reference = inner.as_str();
        let Some(source) = find_source(sources, reference) else {
            continue;
        };

        if whole.start() > last {
            segments.push(Segment::Text(&content[last..whole.start()]));
        }
        let page = source.page_number();
        segments.push(Segment::Text("("));
        segments.push(Segment::Reference {
            reference,
            url: document_link(base_url, &source.document_id, page),
            page,
        });
        segments.push(Segment::Text(")"));
        last = whole.end();
    }

    if last < content.len() {
        segments.push(Segment::Text(&content[last..]));
    }
    segments
}

fn find_source<'s>(sources: &'s [SourceChunk], reference: &str) -> Option<&'s SourceChunk> {
    sources.iter().find(|source| {
        source.filename().is_some_and(|filename| {
            filename == reference || filename.contains(reference) || reference.contains(filename)
        })
    })
}

/// Shortens a source excerpt to [`EXCERPT_MAX_CHARS`] characters plus `...`.
pub fn truncate_excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

struct LinkFamily {
    marker: &'static str,
    label: &'static str,
    keywords: &'static [&'static str],
}

const LINK_FAMILIES: &[LinkFamily] = &[
    LinkFamily {
        marker: "emreg",
        label: "Water Quality Maps (EMREG)",
        keywords: &[
            "wasser",
            "water",
            "wasserqualität",
            "water quality",
            "wasserentnahme",
            "water withdrawal",
            "wasserverbrauch",
            "water consumption",
            "emreg",
            "wasserwirtschaft",
        ],
    },
    LinkFamily {
        marker: "industry.eea.europa.eu",
        label: "Industrial Emissions Portal",
        keywords: &[
            "industrie",
            "industry",
            "emissionen",
            "emissions",
            "industrial",
            "betrieb",
            "facility",
            "anlage",
            "plant",
            "factory",
        ],
    },
    LinkFamily {
        marker: "natura2000",
        label: "Natura 2000 Viewer",
        keywords: &[
            "natur",
            "nature",
            "biodiversität",
            "biodiversity",
            "natura 2000",
            "naturschutz",
            "nature protection",
            "lebensraum",
            "habitat",
            "artenschutz",
            "species protection",
        ],
    },
];

fn family_of(link: &str) -> Option<&'static LinkFamily> {
    LINK_FAMILIES.iter().find(|f| link.contains(f.marker))
}

/// Display label of a relevant link.
pub fn link_label(link: &str) -> &'static str {
    family_of(link).map_or("Relevant Link", |f| f.label)
}

/// Keeps the links whose topic is mentioned in `content`.
///
/// Empty `content` keeps every link. Links outside the known families are
/// dropped whenever there is content to match against.
pub fn filter_relevant_links<'a>(links: &'a [String], content: &str) -> Vec<&'a str> {
    if content.is_empty() {
        return links.iter().map(String::as_str).collect();
    }
    let content = content.to_lowercase();
    links
        .iter()
        .map(String::as_str)
        .filter(|link| {
            family_of(link).is_some_and(|f| f.keywords.iter().any(|k| content.contains(k)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://localhost:8000";

    fn source(document_id: &str, filename: Option<&str>, page: Option<u32>) -> SourceChunk {
        let mut metadata = serde_json::Map::new();
        if let Some(filename) = filename {
            metadata.insert("filename".to_string(), json!(filename));
        }
        if let Some(page) = page {
            metadata.insert("page_number".to_string(), json!(page));
        }
        serde_json::from_value(json!({
            "document_id": document_id,
            "text": "excerpt",
            "metadata": metadata,
        }))
        .unwrap()
    }

    #[test]
    fn test_document_link() {
        assert_eq!(
            document_link(BASE, "doc-1", None),
            "http://localhost:8000/documents/download/doc-1"
        );
        assert_eq!(
            document_link(BASE, "doc-1", Some(7)),
            "http://localhost:8000/documents/download/doc-1?page=7"
        );
    }

    #[test]
    fn test_reference_with_matching_source_becomes_link() {
        let sources = vec![source("doc-9", Some("TAXORA_EU.pdf"), Some(3))];
        let segments = render_references("See (TAXORA_EU.pdf) for details.", &sources, BASE);

        assert_eq!(
            segments,
            vec![
                Segment::Text("See "),
                Segment::Text("("),
                Segment::Reference {
                    reference: "TAXORA_EU.pdf",
                    url: "http://localhost:8000/documents/download/doc-9?page=3".to_string(),
                    page: Some(3),
                },
                Segment::Text(")"),
                Segment::Text(" for details."),
            ]
        );
    }

    #[test]
    fn test_reference_with_date_suffix_matches_contained_filename() {
        let sources = vec![source("doc-9", Some("TAXORA_EU.pdf"), None)];
        let segments = render_references("(TAXORA_EU.pdf - 2021-07-06)", &sources, BASE);

        assert!(matches!(
            segments.as_slice(),
            [Segment::Text("("), Segment::Reference { reference: "TAXORA_EU.pdf - 2021-07-06", .. }, Segment::Text(")")]
        ));
    }

    #[test]
    fn test_unmatched_reference_stays_text() {
        let sources = vec![source("doc-9", Some("other.pdf"), None), source("doc-1", None, None)];
        let content = "As stated (unknown.pdf).";
        let segments = render_references(content, &sources, BASE);

        let joined: String = segments
            .iter()
            .map(|s| match s {
                Segment::Text(t) => *t,
                Segment::Reference { reference, .. } => *reference,
            })
            .collect();
        assert_eq!(joined, content);
        assert!(segments.iter().all(|s| matches!(s, Segment::Text(_))));
    }

    #[test]
    fn test_truncate_excerpt() {
        assert_eq!(truncate_excerpt("short"), "short");
        let long = "a".repeat(201);
        assert_eq!(truncate_excerpt(&long), format!("{}...", "a".repeat(200)));
    }

    #[test]
    fn test_relevant_links_filtered_by_topic() {
        let links = vec![
            "https://maps.wisa.bml.gv.at/emreg".to_string(),
            "https://industry.eea.europa.eu/".to_string(),
            "https://natura2000.eea.europa.eu/".to_string(),
            "https://example.org/".to_string(),
        ];

        let kept = filter_relevant_links(&links, "How much WATER does our plant use?");
        assert_eq!(
            kept,
            vec!["https://maps.wisa.bml.gv.at/emreg", "https://industry.eea.europa.eu/"]
        );
        assert_eq!(filter_relevant_links(&links, "").len(), 4);
    }

    #[test]
    fn test_link_labels() {
        assert_eq!(link_label("https://natura2000.eea.europa.eu/"), "Natura 2000 Viewer");
        assert_eq!(link_label("https://example.org/"), "Relevant Link");
    }
}
