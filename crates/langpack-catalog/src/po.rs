use color_eyre::eyre::{Report, WrapErr};
use langpack_core::{LangPackError, Result};
use std::collections::HashSet;
use std::path::Path;

/// One message of a gettext catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogEntry {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    /// One element for singular messages, one per plural form otherwise.
    pub msgstr: Vec<String>,
    pub fuzzy: bool,
    /// 1-based line of the `msgid` keyword.
    pub line: usize,
}

impl CatalogEntry {
    pub fn is_header(&self) -> bool {
        self.context.is_none() && self.msgid.is_empty()
    }

    pub fn is_translated(&self) -> bool {
        !self.msgstr.is_empty() && self.msgstr.iter().all(|s| !s.is_empty())
    }

    /// Context and msgid; two entries sharing it are duplicates even when
    /// their plural forms differ.
    pub fn identity(&self) -> String {
        let mut k = String::new();
        if let Some(ctx) = &self.context {
            k.push_str(ctx);
            k.push('\u{4}');
        }
        k.push_str(&self.msgid);
        k
    }

    /// Lookup key as stored in a compiled catalog.
    pub fn key(&self) -> String {
        let mut k = self.identity();
        if let Some(plural) = &self.msgid_plural {
            k.push('\0');
            k.push_str(plural);
        }
        k
    }
}

pub fn read_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read catalog {}", path.display()))?;
    parse_catalog(&content, path)
}

#[derive(Debug, Clone, Copy)]
enum Field {
    None,
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Pending {
    context: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: Vec<String>,
    fuzzy: bool,
    line: usize,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.context.is_none() && self.msgid.is_none() && self.msgstr.is_empty()
    }
}

struct Parser<'a> {
    path: &'a Path,
    out: Vec<CatalogEntry>,
    seen: HashSet<String>,
    cur: Pending,
    field: Field,
}

impl<'a> Parser<'a> {
    fn err(&self, line: usize, message: impl Into<String>) -> Report {
        LangPackError::MalformedCatalog {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
        .into()
    }

    /// Close the pending entry if it has a translation; a bare msgid is an error.
    fn finish(&mut self, line: usize) -> Result<()> {
        if self.cur.msgstr.is_empty() {
            if self.cur.msgid.is_some() {
                return Err(self.err(line, "msgid without msgstr"));
            }
            if self.cur.context.is_some() {
                return Err(self.err(line, "msgctxt without msgid"));
            }
            return Ok(());
        }
        let cur = std::mem::take(&mut self.cur);
        let Some(msgid) = cur.msgid else {
            return Err(self.err(cur.line.max(line), "msgstr without msgid"));
        };
        if cur.msgid_plural.is_none() && cur.msgstr.len() > 1 {
            return Err(self.err(cur.line, "plural msgstr without msgid_plural"));
        }
        let entry = CatalogEntry {
            context: cur.context,
            msgid,
            msgid_plural: cur.msgid_plural,
            msgstr: cur.msgstr,
            fuzzy: cur.fuzzy,
            line: cur.line,
        };
        if !self.seen.insert(entry.identity()) {
            return Err(self.err(entry.line, "duplicate message definition"));
        }
        self.out.push(entry);
        self.field = Field::None;
        Ok(())
    }

    /// Comments and blank lines end a complete entry but are otherwise ignored.
    fn boundary(&mut self, line: usize) -> Result<()> {
        if !self.cur.msgstr.is_empty() {
            self.finish(line)?;
        }
        Ok(())
    }

    fn line(&mut self, n: usize, raw: &str) -> Result<()> {
        let lt = raw.trim();

        if lt.is_empty() {
            return self.boundary(n);
        }

        if let Some(rest) = lt.strip_prefix('#') {
            self.boundary(n)?;
            // `#~` marks obsolete entries; they are never compiled.
            if let Some(flags) = rest.strip_prefix(',') {
                if flags.split(',').any(|f| f.trim() == "fuzzy") {
                    self.cur.fuzzy = true;
                }
            }
            return Ok(());
        }

        if let Some(rest) = lt.strip_prefix("msgctxt") {
            self.finish(n)?;
            self.cur.context = Some(self.string(n, rest)?);
            self.field = Field::Context;
            return Ok(());
        }

        if let Some(rest) = lt.strip_prefix("msgid_plural") {
            if self.cur.msgid.is_none() {
                return Err(self.err(n, "msgid_plural without msgid"));
            }
            self.cur.msgid_plural = Some(self.string(n, rest)?);
            self.field = Field::IdPlural;
            return Ok(());
        }

        if let Some(rest) = lt.strip_prefix("msgid") {
            if self.cur.context.is_none() || self.cur.msgid.is_some() {
                self.finish(n)?;
            }
            self.cur.msgid = Some(self.string(n, rest)?);
            self.cur.line = n;
            self.field = Field::Id;
            return Ok(());
        }

        if let Some(rest) = lt.strip_prefix("msgstr") {
            if self.cur.msgid.is_none() {
                return Err(self.err(n, "msgstr without msgid"));
            }
            let (idx, rest) = if let Some(indexed) = rest.strip_prefix('[') {
                let Some((num, tail)) = indexed.split_once(']') else {
                    return Err(self.err(n, "unterminated plural index"));
                };
                let idx: usize = num
                    .trim()
                    .parse()
                    .map_err(|_| self.err(n, format!("invalid plural index `{num}`")))?;
                (idx, tail)
            } else {
                (0, rest)
            };
            let value = self.string(n, rest)?;
            if self.cur.msgstr.len() <= idx {
                self.cur.msgstr.resize(idx + 1, String::new());
            }
            self.cur.msgstr[idx] = value;
            self.field = Field::Str(idx);
            return Ok(());
        }

        if lt.starts_with('"') {
            let value = self.string(n, lt)?;
            let target = match self.field {
                Field::None => return Err(self.err(n, "string continuation without keyword")),
                Field::Context => self.cur.context.as_mut(),
                Field::Id => self.cur.msgid.as_mut(),
                Field::IdPlural => self.cur.msgid_plural.as_mut(),
                Field::Str(i) => self.cur.msgstr.get_mut(i),
            };
            if let Some(s) = target {
                s.push_str(&value);
            }
            return Ok(());
        }

        Err(self.err(n, format!("unexpected line `{lt}`")))
    }

    fn string(&self, line: usize, s: &str) -> Result<String> {
        parse_po_string(s).ok_or_else(|| self.err(line, format!("invalid po string: {}", s.trim())))
    }
}

/// Parse PO text. `path` is only used for error reports.
pub fn parse_catalog(content: &str, path: &Path) -> Result<Vec<CatalogEntry>> {
    let mut p = Parser {
        path,
        out: Vec::new(),
        seen: HashSet::new(),
        cur: Pending::default(),
        field: Field::None,
    };
    let mut last = 0usize;
    for (i, raw) in content.lines().enumerate() {
        last = i + 1;
        p.line(last, raw)?;
    }
    if !p.cur.is_empty() {
        p.finish(last)?;
    }
    Ok(p.out)
}

fn parse_po_string(s: &str) -> Option<String> {
    let s = s.trim();
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return None;
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                other => out.push(other),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
