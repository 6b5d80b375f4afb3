//! Minimal SpreadsheetML (.xlsx) reader and writer.
//!
//! XLSX files are ZIP archives of XML parts. The writer emits inline-string cells only;
//! the reader understands shared strings, inline strings and plain values, which covers
//! files produced by Excel, LibreOffice and Google Sheets.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Missing workbook part: {0}")]
    MissingPart(String),
}

pub type Result<T> = std::result::Result<T, XlsxError>;

/// One worksheet as a grid of cell strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

const CONTENT_TYPES_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

// ────────────────────────────────────────────────────────────────────────────
// Writing
// ────────────────────────────────────────────────────────────────────────────

/// Serializes sheets into an .xlsx archive.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut content_types = String::from(CONTENT_TYPES_HEAD);
    let mut workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#
    );
    let mut workbook_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(sheet.name.as_str())
        ));
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{WORKSHEET_REL}" Target="worksheets/sheet{n}.xml"/>"#
        ));

        zip.start_file(format!("xl/worksheets/sheet{n}.xml"), part_options())?;
        zip.write_all(&worksheet_xml(sheet)?)?;
    }

    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    workbook_rels.push_str("</Relationships>");

    zip.start_file("[Content_Types].xml", part_options())?;
    zip.write_all(content_types.as_bytes())?;
    zip.start_file("_rels/.rels", part_options())?;
    zip.write_all(ROOT_RELS.as_bytes())?;
    zip.start_file("xl/workbook.xml", part_options())?;
    zip.write_all(workbook.as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", part_options())?;
    zip.write_all(workbook_rels.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| XlsxError::Xml(e.to_string()))
}

fn worksheet_xml(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;

    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", MAIN_NS));
    emit(&mut writer, Event::Start(root))?;
    emit(&mut writer, Event::Start(BytesStart::new("sheetData")))?;

    for (r, row) in sheet.rows.iter().enumerate() {
        let row_ref = (r + 1).to_string();
        let mut row_el = BytesStart::new("row");
        row_el.push_attribute(("r", row_ref.as_str()));
        emit(&mut writer, Event::Start(row_el))?;

        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", column_name(c), r + 1);
            let mut cell = BytesStart::new("c");
            cell.push_attribute(("r", cell_ref.as_str()));
            cell.push_attribute(("t", "inlineStr"));
            emit(&mut writer, Event::Start(cell))?;
            emit(&mut writer, Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            t.push_attribute(("xml:space", "preserve"));
            emit(&mut writer, Event::Start(t))?;
            emit(&mut writer, Event::Text(BytesText::new(value)))?;
            emit(&mut writer, Event::End(BytesEnd::new("t")))?;
            emit(&mut writer, Event::End(BytesEnd::new("is")))?;
            emit(&mut writer, Event::End(BytesEnd::new("c")))?;
        }

        emit(&mut writer, Event::End(BytesEnd::new("row")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("sheetData")))?;
    emit(&mut writer, Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

/// 0 → "A", 25 → "Z", 26 → "AA".
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Sheet bounds of the SpreadsheetML format (XFD1048576).
const MAX_COLUMNS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;

/// "AB12" → 27 (0-based column). `None` when the reference carries no letters.
fn column_index(cell_ref: &str) -> Result<Option<usize>> {
    let mut n = 0usize;
    let mut seen = false;
    for b in cell_ref.bytes().take_while(|b| b.is_ascii_alphabetic()) {
        seen = true;
        n = n
            .checked_mul(26)
            .and_then(|acc| acc.checked_add((b.to_ascii_uppercase() - b'A' + 1) as usize))
            .filter(|&n| n <= MAX_COLUMNS)
            .ok_or_else(|| XlsxError::Xml(format!("cell reference {cell_ref} is out of range")))?;
    }
    Ok(seen.then(|| n - 1))
}

fn check_column(column: usize) -> Result<usize> {
    if column >= MAX_COLUMNS {
        return Err(XlsxError::Xml(format!("column {} is out of range", column + 1)));
    }
    Ok(column)
}

// ────────────────────────────────────────────────────────────────────────────
// Reading
// ────────────────────────────────────────────────────────────────────────────

/// Reads every worksheet of an .xlsx archive, in workbook order.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook = read_part(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| XlsxError::MissingPart("xl/workbook.xml".to_string()))?;
    let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".to_string()))?;
    let shared = match read_part(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let targets = parse_relationships(&rels)?;
    let mut sheets = Vec::new();
    for (name, rel_id) in parse_sheet_list(&workbook)? {
        let target = targets
            .get(&rel_id)
            .ok_or_else(|| XlsxError::MissingPart(format!("relationship {rel_id}")))?;
        let part = match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{target}"),
        };
        let xml = read_part(&mut archive, &part)?.ok_or(XlsxError::MissingPart(part))?;
        sheets.push(Sheet {
            name,
            rows: parse_worksheet(&xml, &shared)?,
        });
    }
    Ok(sheets)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn attribute(element: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| XlsxError::Xml(e.to_string()))?;
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|e| XlsxError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn xml_error(reader: &Reader<&[u8]>, e: quick_xml::Error) -> XlsxError {
    XlsxError::Xml(format!("at position {}: {e}", reader.buffer_position()))
}

/// (sheet name, relationship id) pairs from workbook.xml.
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(|e| xml_error(&reader, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attribute(&e, b"name")?, attribute(&e, b"id")?) {
                    sheets.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

/// Relationship id → target path.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event().map_err(|e| xml_error(&reader, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event().map_err(|e| xml_error(&reader, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = false;
                    strings.push(std::mem::take(&mut current));
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if in_item && in_text && !in_phonetic => {
                let text = e.unescape().map_err(|e| XlsxError::Xml(e.to_string()))?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

#[derive(Default)]
struct PendingCell {
    column: usize,
    cell_type: Option<String>,
    value: String,
}

fn parse_worksheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut cell: Option<PendingCell> = None;
    let mut next_column = 0usize;
    let mut in_value = false;

    loop {
        match reader.read_event().map_err(|e| xml_error(&reader, e))? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let row_number = attribute(&e, b"r")?
                    .and_then(|r| r.parse::<usize>().ok())
                    .unwrap_or(rows.len() + 1);
                if row_number > MAX_ROWS {
                    return Err(XlsxError::Xml(format!("row {row_number} is out of range")));
                }
                while rows.len() < row_number {
                    rows.push(Vec::new());
                }
                next_column = 0;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let column = match attribute(&e, b"r")? {
                    Some(r) => column_index(&r)?,
                    None => None,
                };
                let column = check_column(column.unwrap_or(next_column))?;
                cell = Some(PendingCell {
                    column,
                    cell_type: attribute(&e, b"t")?,
                    value: String::new(),
                });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let column = match attribute(&e, b"r")? {
                    Some(r) => column_index(&r)?,
                    None => None,
                };
                next_column = check_column(column.unwrap_or(next_column))? + 1;
            }
            Event::Start(e) if matches!(e.local_name().as_ref(), b"v" | b"t") => in_value = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(done) = cell.take() {
                        let value = match done.cell_type.as_deref() {
                            Some("s") => done
                                .value
                                .trim()
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| shared.get(i).cloned())
                                .unwrap_or_default(),
                            _ => done.value,
                        };
                        if rows.is_empty() {
                            rows.push(Vec::new());
                        }
                        if let Some(row) = rows.last_mut() {
                            if row.len() <= done.column {
                                row.resize(done.column + 1, String::new());
                            }
                            row[done.column] = value;
                        }
                        next_column = done.column + 1;
                    }
                }
                _ => {}
            },
            Event::Text(e) if in_value => {
                if let Some(pending) = cell.as_mut() {
                    let text = e.unescape().map_err(|e| XlsxError::Xml(e.to_string()))?;
                    pending.value.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}
