//! Canonical verse locators (`Book.Chapter.Verse[-VerseEnd]`).
//!
//! Parsing is permissive: a chapter or verse that does not parse becomes `0`
//! ("unset") rather than an error, so one bad locator never aborts a whole
//! conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical short book codes, in Protestant canon order.
pub const BOOK_CODES: [&str; 66] = [
    "Gen", "Exod", "Lev", "Num", "Deut", "Josh", "Judg", "Ruth", "1Sam", "2Sam", "1Kgs", "2Kgs",
    "1Chr", "2Chr", "Ezra", "Neh", "Esth", "Job", "Ps", "Prov", "Eccl", "Song", "Isa", "Jer",
    "Lam", "Ezek", "Dan", "Hos", "Joel", "Amos", "Obad", "Jonah", "Mic", "Nah", "Hab", "Zeph",
    "Hag", "Zech", "Mal", "Matt", "Mark", "Luke", "John", "Acts", "Rom", "1Cor", "2Cor", "Gal",
    "Eph", "Phil", "Col", "1Thess", "2Thess", "1Tim", "2Tim", "Titus", "Phlm", "Heb", "Jas",
    "1Pet", "2Pet", "1John", "2John", "3John", "Jude", "Rev",
];

/// True if `token` is one of the canonical [`BOOK_CODES`].
pub fn is_book_code(token: &str) -> bool {
    BOOK_CODES.contains(&token)
}

/// Canonical code for a 1-based book number (1 = `Gen`, 66 = `Rev`).
pub fn book_code_for_number(number: usize) -> Option<&'static str> {
    number.checked_sub(1).and_then(|i| BOOK_CODES.get(i)).copied()
}

/// 1-based position of `code` in the canonical order.
pub fn book_number(code: &str) -> Option<usize> {
    BOOK_CODES.iter().position(|c| *c == code).map(|i| i + 1)
}

/// A canonical locator.
///
/// `0` is the "unset" sentinel for `chapter`, `verse` and `verse_end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ref {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub verse_end: u32,
    pub osis_id: String,
}

impl Ref {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        let mut r = Self {
            book: book.into(),
            chapter,
            verse,
            ..Default::default()
        };
        r.osis_id = format_ref(&r);
        r
    }

    pub fn with_verse_end(mut self, verse_end: u32) -> Self {
        self.verse_end = verse_end;
        self.osis_id = format_ref(&self);
        self
    }

    /// Whether this locator addresses a range of verses.
    pub fn is_range(&self) -> bool {
        self.verse_end != 0
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.book)?;
        if self.chapter != 0 {
            write!(f, ".{}", self.chapter)?;
        }
        if self.verse != 0 {
            write!(f, ".{}", self.verse)?;
            if self.verse_end != 0 {
                write!(f, "-{}", self.verse_end)?;
            }
        }
        Ok(())
    }
}

/// Parse a locator such as `Gen.1.1`, `John.3` or `Matt.5.3-12`.
///
/// Splits on `.` into at most three parts. A verse part containing `-` is
/// split into `verse` and `verse_end`; segments after a second `-` are
/// ignored (`Gen.1.1-5-9` yields `verse_end = 5`).
pub fn parse_ref(locator: &str) -> Ref {
    let mut parts = locator.trim().splitn(3, '.');
    let book = parts.next().unwrap_or_default().to_string();
    let chapter = parts.next().map(parse_number).unwrap_or(0);

    let (verse, verse_end) = match parts.next() {
        Some(v) if v.contains('-') => {
            let mut range = v.split('-');
            let start = range.next().map(parse_number).unwrap_or(0);
            let end = range.next().map(parse_number).unwrap_or(0);
            (start, end)
        }
        Some(v) => (parse_number(v), 0),
        None => (0, 0),
    };

    let mut r = Ref {
        book,
        chapter,
        verse,
        verse_end,
        osis_id: String::new(),
    };
    r.osis_id = format_ref(&r);
    r
}

/// Format a [`Ref`] back into its locator string.
pub fn format_ref(r: &Ref) -> String {
    r.to_string()
}

fn parse_number(s: &str) -> u32 {
    s.trim().parse().unwrap_or(0)
}
