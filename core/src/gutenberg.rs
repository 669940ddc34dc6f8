//! Field extraction for plain-text ebook transcripts with a
//! `Title:` / `Author:` / `Release Date:` header and `***` body markers.

use lazy_static::lazy_static;
use regex::Regex;

use crate::corpus::DocRecord;

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"\[.*?\]").expect("valid regex");
    static ref YEAR: Regex = Regex::new(r"(?:^|\D)(\d{4})(?:\D|$)").expect("valid regex");
}

const END_MARKER: &str = "End of the Project Gutenberg EBook";

fn release_year(rest: &str) -> Option<i32> {
    let cleaned = BRACKETED.replace_all(rest, "");
    YEAR.captures(&cleaned)?.get(1)?.as_str().parse().ok()
}

/// Parse a transcript into a record whose id is `id`.
pub fn parse_transcript(id: &str, raw: &str) -> DocRecord {
    let mut title = String::new();
    let mut author = String::new();
    let mut year = None;
    let mut text = String::new();
    let mut in_body = false;
    let mut in_title = false;

    for line in raw.lines() {
        if in_body {
            if line.contains(END_MARKER) {
                break;
            }
            text.push_str(line);
            text.push('\n');
            continue;
        }
        if let (true, Some((_, rest))) = (title.is_empty(), line.split_once("Title:")) {
            title = rest.trim().to_string();
            in_title = true;
        } else if let (true, Some((_, rest))) = (author.is_empty(), line.split_once("Author:")) {
            author = rest.trim().to_string();
            in_title = false;
        } else if let (true, Some((_, rest))) = (year.is_none(), line.split_once("Release Date:")) {
            year = release_year(rest);
            in_title = false;
        } else if line.contains("***") {
            in_body = true;
            in_title = false;
        } else if in_title {
            // title continues on the next line until a blank line or another field
            if line.trim().is_empty() {
                in_title = false;
            } else {
                title.push(' ');
                title.push_str(line.trim());
            }
        }
    }

    DocRecord { id: id.to_string(), title, author, year, text, rating: None }
}
