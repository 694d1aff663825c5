//! Streaming unified-diff parser producing per-file line counts.

use std::io::BufRead;

use churn_core::{ChurnError, EmptyLineMode, FileRecord};

/// Parse a unified diff (as produced by `git diff -U0 -M`) from a reader.
///
/// Lines are consumed one at a time, so the reader can be the stdout of a
/// running `git diff`. Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns [`ChurnError::Io`] only if reading from `reader` fails; no diff
/// content is considered invalid.
///
/// # Examples
///
/// ```
/// use churn_core::EmptyLineMode;
/// use churn_difflens::parser::parse_diff;
///
/// let diff = "diff --git a/hello.rs b/hello.rs\n\
///             --- a/hello.rs\n\
///             +++ b/hello.rs\n\
///             @@ -1 +1,2 @@\n\
///             -fn main() {}\n\
///             +fn main() {\n\
///             +}\n";
/// let records = parse_diff(diff.as_bytes(), EmptyLineMode::Exclude).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].added, 2);
/// assert_eq!(records[0].deleted, 1);
/// assert_eq!(records[0].churn, 3);
/// ```
pub fn parse_diff<R: BufRead>(
    mut reader: R,
    mode: EmptyLineMode,
) -> Result<Vec<FileRecord>, ChurnError> {
    let mut parser = DiffParser::new(mode);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        parser.feed_line(&String::from_utf8_lossy(&buf));
    }
    Ok(parser.finish())
}

/// Parse an in-memory unified diff.
///
/// # Examples
///
/// ```
/// use churn_core::EmptyLineMode;
/// use churn_difflens::parser::parse_unified_diff;
///
/// assert!(parse_unified_diff("", EmptyLineMode::Exclude).is_empty());
/// ```
pub fn parse_unified_diff(input: &str, mode: EmptyLineMode) -> Vec<FileRecord> {
    let mut parser = DiffParser::new(mode);
    for line in input.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

/// Incremental parser state for one diff stream.
///
/// Owns the in-progress record; nothing else can observe a partially
/// counted file.
#[derive(Debug)]
pub struct DiffParser {
    mode: EmptyLineMode,
    records: Vec<FileRecord>,
    current: Option<FileRecord>,
    /// Started from a bare `--- ` line instead of a `diff --git` header.
    implicit: bool,
    in_binary: bool,
    seen_hunk: bool,
    /// Old/new lines still expected in the current hunk.
    hunk: Option<(u32, u32)>,
}

impl DiffParser {
    pub fn new(mode: EmptyLineMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
            current: None,
            implicit: false,
            in_binary: false,
            seen_hunk: false,
            hunk: None,
        }
    }

    /// Feed one line, with or without its trailing newline.
    pub fn feed_line(&mut self, line: &str) {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.starts_with("diff --git ") {
            self.start_record(header_path(line), false);
            return;
        }

        if self.current.is_none() {
            // Plain patches without git headers start at the old-file annotation.
            if let Some(path) = line.strip_prefix("--- ") {
                self.start_record(parse_path(path), true);
            }
            return;
        }

        if self.in_binary {
            return;
        }

        if let Some(budget) = self.hunk {
            self.feed_hunk_line(line, budget);
            return;
        }

        self.feed_header_line(line);
    }

    /// Flush the last record and return every record in stream order.
    pub fn finish(mut self) -> Vec<FileRecord> {
        self.flush();
        tracing::debug!(files = self.records.len(), "parsed diff");
        self.records
    }

    fn start_record(&mut self, path: String, implicit: bool) {
        self.flush();
        self.current = Some(FileRecord::new(path));
        self.implicit = implicit;
        self.in_binary = false;
        self.seen_hunk = false;
        self.hunk = None;
    }

    fn flush(&mut self) {
        if let Some(mut record) = self.current.take() {
            record.finish();
            self.records.push(record);
        }
    }

    fn feed_header_line(&mut self, line: &str) {
        if let Some(path) = line.strip_prefix("rename to ") {
            self.set_path(unquote(path));
            return;
        }

        if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            self.in_binary = true;
            return;
        }

        if line.starts_with("@@") {
            self.seen_hunk = true;
            self.hunk = match parse_hunk_header(line) {
                Some((0, 0)) => None,
                Some(budget) => Some(budget),
                None => Some((u32::MAX, u32::MAX)),
            };
            return;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            if self.implicit && self.seen_hunk {
                self.start_record(parse_path(path), true);
            }
            return;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            let path = parse_path(path);
            if path != "/dev/null" && (self.implicit || !self.seen_hunk) {
                self.set_path(path);
            }
            return;
        }

        if line.starts_with("---") || line.starts_with("+++") {
            return;
        }

        self.count(line);
    }

    fn feed_hunk_line(&mut self, line: &str, (old, new): (u32, u32)) {
        let remaining = match line.as_bytes().first() {
            Some(b'+') => {
                self.count(line);
                (old, new.saturating_sub(1))
            }
            Some(b'-') => {
                self.count(line);
                (old.saturating_sub(1), new)
            }
            Some(b'\\') => (old, new),
            Some(b'@') if line.starts_with("@@") => {
                self.hunk = None;
                self.feed_header_line(line);
                return;
            }
            _ => (old.saturating_sub(1), new.saturating_sub(1)),
        };
        self.hunk = (remaining != (0, 0)).then_some(remaining);
    }

    fn count(&mut self, line: &str) {
        let Some(record) = self.current.as_mut() else {
            return;
        };
        let (counter, content) = if let Some(content) = line.strip_prefix('+') {
            (&mut record.added, content)
        } else if let Some(content) = line.strip_prefix('-') {
            (&mut record.deleted, content)
        } else {
            return;
        };
        if self.mode == EmptyLineMode::Exclude && content.trim().is_empty() {
            return;
        }
        *counter += 1;
    }

    fn set_path(&mut self, path: String) {
        if let Some(record) = self.current.as_mut() {
            record.path = path;
        }
    }
}

/// Destination path from a `diff --git a/<old> b/<new>` header.
fn header_path(line: &str) -> String {
    let rest = line.strip_prefix("diff --git ").unwrap_or(line);

    if let Some(idx) = rest.find(" \"b/") {
        return parse_path(&rest[idx + 1..]);
    }

    if let Some(path) = symmetric_path(rest) {
        return path;
    }

    if let Some((_, new)) = rest.split_once(" b/") {
        return new.to_string();
    }

    rest.trim().to_string()
}

/// `a/<p> b/<p>` or, with `--no-prefix`, `<p> <p>`: both halves name the same file.
fn symmetric_path(rest: &str) -> Option<String> {
    let half = rest.len() / 2;
    if rest.len() % 2 == 0 || !rest.is_char_boundary(half) || !rest[half..].starts_with(' ') {
        return None;
    }
    let (old, new) = (&rest[..half], &rest[half + 1..]);
    match (old.strip_prefix("a/"), new.strip_prefix("b/")) {
        (Some(old), Some(new)) if old == new => Some(new.to_string()),
        _ if old == new => Some(new.to_string()),
        _ => None,
    }
}

/// Normalize a `--- ` / `+++ ` annotation path: unquote and drop the `a/` or `b/` prefix.
fn parse_path(raw: &str) -> String {
    let raw = raw.trim_end();
    // git appends a tab before timestamps in some patch producers.
    let raw = raw.split_once('\t').map_or(raw, |(path, _)| path);
    let normalized = unquote(raw);

    if normalized == "/dev/null" {
        return normalized;
    }

    match normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
    {
        Some(stripped) => stripped.to_string(),
        None => normalized,
    }
}

/// Decode a C-style quoted path as written by git; unquoted input is returned as-is.
fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.bytes().peekable();
    while let Some(b) = chars.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&o) if (b'0'..=b'7').contains(&o) => {
                            value = value * 8 + u32::from(o - b'0');
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Old and new line counts from `@@ -a[,b] +c[,d] @@`.
fn parse_hunk_header(line: &str) -> Option<(u32, u32)> {
    let inner = line.strip_prefix("@@ ")?;
    let inner = &inner[..inner.find(" @@")?];
    let (old, new) = inner.split_once(' ')?;
    let old_lines = parse_range(old.strip_prefix('-')?)?;
    let new_lines = parse_range(new.strip_prefix('+')?)?;
    Some((old_lines, new_lines))
}

fn parse_range(range: &str) -> Option<u32> {
    match range.split_once(',') {
        Some((start, count)) => {
            start.parse::<u32>().ok()?;
            count.parse().ok()
        }
        None => {
            range.parse::<u32>().ok()?;
            Some(1)
        }
    }
}
