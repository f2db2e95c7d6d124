//! `@tag@` substitution over a static report template.

use std::io::Write;

use phf::phf_map;

use crate::error::{ReportError, Result};

/// Report template with `@version@`, `@command_line@`, `@summary@` and
/// `@parameters@` placeholders
pub const MOMO_TEMPLATE: &str = include_str!("momo.html");

/// Opens and closes a tag
pub const DELIMITER: u8 = b'@';

/// Size of the tag buffer, terminator included
pub const MAX_TAG_SIZE: usize = 1000;

/// The placeholders a template may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Version,
    CommandLine,
    Summary,
    Parameters,
}

static TAGS: phf::Map<&'static str, Tag> = phf_map! {
    "version" => Tag::Version,
    "command_line" => Tag::CommandLine,
    "summary" => Tag::Summary,
    "parameters" => Tag::Parameters,
};

impl Tag {
    /// Look up a tag by the name written between the delimiters
    pub fn from_name(name: &str) -> Option<Tag> {
        TAGS.get(name).copied()
    }
}

/// Something that can expand template tags
pub trait TagWriter {
    fn write_tag<W: Write>(&self, tag: Tag, out: &mut W) -> Result<()>;
}

enum State {
    Copy,
    TagCapture { start: usize },
}

/// Copy `template` to `out`, replacing each `@name@` by its expansion.
///
/// Names that are not a known [`Tag`] expand to nothing, delimiters
/// included.
///
/// # Errors
/// * `ReportError::TagOverflow` if a tag name does not fit the tag buffer
/// * `ReportError::UnterminatedTag` if the template ends inside a tag
/// * `ReportError::Io` if writing to `out` fails, or any error of the tag writer
pub fn render<W: Write, T: TagWriter>(template: &str, out: &mut W, tags: &T) -> Result<()> {
    let bytes = template.as_bytes();
    let mut state = State::Copy;
    let mut copied = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match state {
            State::Copy => {
                if b == DELIMITER {
                    out.write_all(&bytes[copied..i])?;
                    state = State::TagCapture { start: i + 1 };
                }
            }
            State::TagCapture { start } => {
                if b == DELIMITER {
                    if let Some(tag) = Tag::from_name(&template[start..i]) {
                        tags.write_tag(tag, out)?;
                    }
                    copied = i + 1;
                    state = State::Copy;
                } else if i + 1 - start >= MAX_TAG_SIZE {
                    return Err(ReportError::TagOverflow { offset: start - 1 });
                }
            }
        }
    }

    match state {
        State::Copy => {
            out.write_all(&bytes[copied..])?;
            Ok(())
        }
        State::TagCapture { start } => Err(ReportError::UnterminatedTag { offset: start - 1 }),
    }
}
