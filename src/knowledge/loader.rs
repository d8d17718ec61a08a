//! Knowledge source loading
//!
//! `.docx` files are unpacked and the text of `word/document.xml` extracted,
//! one blank line between paragraphs. Any other file is read as UTF-8 text.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

const DOCX_BODY: &str = "word/document.xml";

/// Read a knowledge document as plain text
pub fn load_document(path: &Path) -> Result<String> {
    let is_docx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));

    if is_docx {
        read_docx(path)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn read_docx(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a .docx archive", path.display()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .with_context(|| format!("{} has no {}", path.display(), DOCX_BODY))?
        .read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {} from {}", DOCX_BODY, path.display()))?;

    let text = docx_text(&xml)?;
    tracing::debug!(
        "[Knowledge] Extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Text of the `w:t` runs, with tabs, breaks and paragraph ends
fn docx_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event().context("Malformed document.xml")? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"t" {
                    in_run = true;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run = false,
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Text(e) if in_run => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) if in_run => match resolve_reference(&e) {
                Some(ch) => text.push(ch),
                None => tracing::warn!(
                    "[Knowledge] Skipping unknown entity &{};",
                    String::from_utf8_lossy(&e)
                ),
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Resolve a predefined XML entity or a character reference (`#38`, `#x26`)
fn resolve_reference(name: &[u8]) -> Option<char> {
    let name = std::str::from_utf8(name).ok()?;
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
