//! Parser for the BMFont text format.
//!
//! ```text
//! info face="Tracker Mono" size=12
//! common lineHeight=14 base=11 scaleW=128 scaleH=64 pages=1
//! page id=0 file="mono.png"
//! char id=65 x=0 y=0 width=6 height=8 xoffset=0 yoffset=3 xadvance=7
//! kerning first=65 second=86 amount=-1
//! ```
//!
//! Unknown records and keys are ignored; values may be double-quoted.

use super::FontError;
use super::font::to_char;

/// One `char` record, in atlas pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CharRecord {
    pub id: i64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
}

/// One `kerning` record.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KerningRecord {
    pub first: i64,
    pub second: i64,
    pub amount: f32,
}

/// Parsed font description, before it is bound to an atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    pub line_height: f32,
    pub base: f32,
    pub scale_w: u32,
    pub scale_h: u32,
    pub chars: Vec<CharRecord>,
    pub kernings: Vec<KerningRecord>,
}

impl FontDescription {
    pub fn parse(source: &str) -> Result<Self, FontError> {
        let mut common = None;
        let mut chars = Vec::new();
        let mut kernings = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let Some(record) = Record::parse(raw) else { continue };

            match record.tag {
                "common" => {
                    common = Some((
                        record.number(line, "lineHeight")?,
                        record.number(line, "base")?,
                        record.number::<u32>(line, "scaleW")?,
                        record.number::<u32>(line, "scaleH")?,
                    ));
                }
                "char" => chars.push(CharRecord {
                    id: record.char_id(line)?,
                    x: record.number(line, "x")?,
                    y: record.number(line, "y")?,
                    width: record.number(line, "width")?,
                    height: record.number(line, "height")?,
                    x_offset: record.number(line, "xoffset")?,
                    y_offset: record.number(line, "yoffset")?,
                    x_advance: record.number(line, "xadvance")?,
                }),
                "kerning" => kernings.push(KerningRecord {
                    first: record.number(line, "first")?,
                    second: record.number(line, "second")?,
                    amount: record.number(line, "amount")?,
                }),
                _ => {}
            }
        }

        let (line_height, base, scale_w, scale_h) = common.ok_or(FontError::MissingCommon)?;
        log::debug!(
            "font description: {} chars, {} kerning pairs, atlas {scale_w}x{scale_h}",
            chars.len(),
            kernings.len()
        );
        Ok(Self { line_height, base, scale_w, scale_h, chars, kernings })
    }
}

/// A tag followed by `key=value` pairs.
struct Record<'a> {
    tag: &'a str,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Record<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        let (tag, mut rest) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], &line[i..]),
            None => (line, ""),
        };
        if tag.is_empty() {
            return None;
        }

        let mut pairs = Vec::new();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let token_end =
                rest.find(|c: char| c == '=' || c.is_whitespace()).unwrap_or(rest.len());
            let key = &rest[..token_end];
            rest = &rest[token_end..];
            let Some(after_eq) = rest.strip_prefix('=') else {
                // Bare word without a value.
                continue;
            };

            let (value, remainder) = match after_eq.strip_prefix('"') {
                Some(quoted) => match quoted.find('"') {
                    Some(end) => (&quoted[..end], &quoted[end + 1..]),
                    None => (quoted, ""),
                },
                None => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            pairs.push((key, value));
            rest = remainder;
        }
        Some(Self { tag, pairs })
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// `id` of a `char` record: a Unicode scalar value, or -1 for the sentinel.
    fn char_id(&self, line: usize) -> Result<i64, FontError> {
        let id: i64 = self.number(line, "id")?;
        if id != -1 && to_char(id).is_none() {
            return Err(FontError::InvalidChar { line, id });
        }
        Ok(id)
    }

    fn number<T: std::str::FromStr>(&self, line: usize, key: &'static str) -> Result<T, FontError> {
        let value = self.get(key).ok_or(FontError::MissingKey { line, key })?;
        value.parse().map_err(|_| FontError::InvalidValue {
            line,
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}
