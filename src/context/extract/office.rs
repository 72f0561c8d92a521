//! Office Open XML readers (`.docx`, `.pptx`): a zip archive of XML parts.

use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>> {
    ZipArchive::new(Cursor::new(bytes)).context("Not a valid Office Open XML archive")
}

fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<String> {
    let mut part = archive
        .by_name(name)
        .with_context(|| format!("Missing part {name}"))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .with_context(|| format!("Failed to read part {name}"))?;
    Ok(xml)
}

/// Paragraph and table text of `word/document.xml` in document order.
/// Table rows come out as `cell | cell`.
pub fn read_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;
    let xml = read_part(&mut archive, "word/document.xml")?;
    docx_text(&xml)
}

fn docx_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    // One entry per open table: the cells of the current row and the paragraphs of
    // the current cell.
    let mut tables: Vec<(Vec<String>, Vec<String>)> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:tbl" => tables.push((Vec::new(), Vec::new())),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().context("Invalid text run")?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let text = std::mem::take(&mut paragraph);
                    match tables.last_mut() {
                        Some((_, cell)) => cell.push(text),
                        None => blocks.push(text),
                    }
                }
                b"w:tc" => {
                    if let Some((row, cell)) = tables.last_mut() {
                        let text = cell
                            .drain(..)
                            .filter(|p| !p.trim().is_empty())
                            .collect::<Vec<_>>()
                            .join(" ");
                        row.push(text);
                    }
                }
                b"w:tr" => {
                    if let Some((row, _)) = tables.last_mut() {
                        let line = row.drain(..).collect::<Vec<_>>().join(" | ");
                        blocks.push(line);
                    }
                }
                b"w:tbl" => {
                    tables.pop();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("Malformed document.xml: {e}")),
            _ => {}
        }
    }

    Ok(blocks.join("\n"))
}

/// Text frames of every slide under a `Slide N:` marker, slides in presentation order.
pub fn read_pptx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;

    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<usize>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    if slides.is_empty() {
        return Err(anyhow!("Presentation contains no slides"));
    }

    let mut parts = Vec::new();
    for (position, (_, name)) in slides.iter().enumerate() {
        let xml = read_part(&mut archive, name)?;
        parts.push(format!("Slide {}:", position + 1));
        parts.extend(slide_paragraphs(&xml)?);
    }

    Ok(parts.join("\n\n"))
}

fn slide_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => in_text = true,
            Ok(Event::Empty(e)) if e.name().as_ref() == b"a:br" => current.push('\n'),
            Ok(Event::Text(e)) if in_text => {
                current.push_str(&e.unescape().context("Invalid text run")?);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    let text = std::mem::take(&mut current);
                    if !text.trim().is_empty() {
                        paragraphs.push(text.trim().to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("Malformed slide XML: {e}")),
            _ => {}
        }
    }

    Ok(paragraphs)
}
