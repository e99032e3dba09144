use crate::po::{read_catalog, CatalogEntry};
use color_eyre::eyre::{bail, WrapErr};
use langpack_core::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Little-endian GNU `.mo` magic number.
pub const MO_MAGIC: u32 = 0x9504_12de;

const HEADER_LEN: usize = 28;

fn kept(e: &CatalogEntry) -> bool {
    e.is_translated() && (!e.fuzzy || e.is_header())
}

/// Render the messages `msgfmt` would keep: translated, and not fuzzy unless
/// it is the header. Entries are sorted by key bytes; no hash table is emitted.
pub fn render_mo(entries: &[CatalogEntry]) -> Vec<u8> {
    let mut messages: Vec<(String, String)> = entries
        .iter()
        .filter(|e| kept(e))
        .map(|e| (e.key(), e.msgstr.join("\0")))
        .collect();
    messages.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let n = messages.len();
    let orig_table = HEADER_LEN;
    let trans_table = orig_table + 8 * n;
    let strings_start = trans_table + 8 * n;

    let mut orig_desc = Vec::with_capacity(n);
    let mut trans_desc = Vec::with_capacity(n);
    let mut pool: Vec<u8> = Vec::new();
    for (key, _) in &messages {
        orig_desc.push((key.len(), strings_start + pool.len()));
        pool.extend_from_slice(key.as_bytes());
        pool.push(0);
    }
    for (_, value) in &messages {
        trans_desc.push((value.len(), strings_start + pool.len()));
        pool.extend_from_slice(value.as_bytes());
        pool.push(0);
    }

    let mut out = Vec::with_capacity(strings_start + pool.len());
    for word in [
        MO_MAGIC,
        0, // revision
        n as u32,
        orig_table as u32,
        trans_table as u32,
        0, // hash table size
        strings_start as u32,
    ] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (len, off) in orig_desc.into_iter().chain(trans_desc) {
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out.extend_from_slice(&(off as u32).to_le_bytes());
    }
    out.extend_from_slice(&pool);
    out
}

pub fn write_mo(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let bytes = render_mo(entries);
    std::fs::write(path, bytes).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Compile one `.po` file into `mo`. Returns the number of messages written.
pub fn compile_po_file(po: &Path, mo: &Path) -> Result<usize> {
    let entries = read_catalog(po)?;
    write_mo(mo, &entries)?;
    Ok(entries.iter().filter(|e| kept(e)).count())
}

/// Read a `.mo` file back into `key -> translation` (both as stored, with
/// `\x04` context separators and NUL-joined plural forms).
pub fn parse_mo(bytes: &[u8]) -> Result<BTreeMap<String, String>> {
    let word = |at: usize| -> Result<usize> {
        let Some(b) = bytes.get(at..at + 4) else {
            bail!("truncated mo file at offset {at}");
        };
        let mut buf = [0u8; 4];
        buf.copy_from_slice(b);
        Ok(u32::from_le_bytes(buf) as usize)
    };
    if word(0)? != MO_MAGIC as usize {
        bail!("not a little-endian mo file");
    }
    let n = word(8)?;
    let orig_table = word(12)?;
    let trans_table = word(16)?;

    let string_at = |table: usize, i: usize| -> Result<String> {
        let len = word(table + 8 * i)?;
        let off = word(table + 8 * i + 4)?;
        let Some(raw) = bytes.get(off..off + len) else {
            bail!("string {i} out of bounds");
        };
        Ok(String::from_utf8(raw.to_vec())?)
    };

    let mut out = BTreeMap::new();
    for i in 0..n {
        out.insert(string_at(orig_table, i)?, string_at(trans_table, i)?);
    }
    Ok(out)
}
