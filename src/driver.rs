//! C8 — the chunk driver.
//!
//! Owns the byte buffer and ties every other component together: frame
//! a record, scan it, fold it into the running per-chunk summary,
//! materialize it into typed columns, widen against whatever's already
//! committed from earlier chunks, and repeat until the source is
//! exhausted. Header detection, the leading `skip`, and the row-name
//! reconciliation all happen once, up front, before the main loop.

use std::io::Read;

use crate::buffer::{ChunkBuffer, EOF_AGAIN, NO_DATA};
use crate::column::Column;
use crate::error::{ReadError, ReadResult};
use crate::infer::{self, DataType};
use crate::options::{DlmReadOptions, HeaderPolicy};
use crate::parse::StringCache;
use crate::preprocess;
use crate::scan::{self, HeaderOutcome, RecordOutcome};
use crate::table::Table;
use crate::token::{Token, MAX_CHUNK_LEN};

pub fn read(mut reader: Box<dyn Read>, opts: &DlmReadOptions) -> ReadResult<Table> {
    opts.validate()?;
    let mut popts = opts.parse_options.clone();
    let eol = popts.eol_char;

    let target = opts.target_chunk_bytes(None);
    let initial_cap = (target as usize).clamp(4096, 64 * 1024);
    let mut buf = ChunkBuffer::new(initial_cap, MAX_CHUNK_LEN);

    let mut cursor = 0usize;
    let mut line_no = 1u64;

    // --- skip ---
    loop {
        if let Some(p) = preprocess::skip_n_lines(buf.bytes(), 0, opts.skip) {
            cursor = p;
            line_no += opts.skip as u64;
            break;
        }
        if !force_more_bytes(&mut buf, reader.as_mut(), eol)? {
            // Fewer lines in the source than `skip` asked to discard --
            // there's nothing left to read a header or any data from.
            return Err(ReadError::EmptyHeader);
        }
    }
    buf.consume(cursor);
    cursor = 0;

    // --- delimiter guess (§4.9), only when the caller left it unset ---
    if popts.separator.is_none() {
        loop {
            if crate::scan::bytes::scan_line_extent(buf.bytes(), 0).is_some() {
                break;
            }
            if !force_more_bytes(&mut buf, reader.as_mut(), eol)? {
                break; // guess over whatever's buffered; the source has no more
            }
        }
        popts.separator = Some(preprocess::guess_delimiter(buf.bytes()));
        popts.validate()?;
    }
    let popts = &popts;

    // --- header / name synthesis ---
    let mut names: Vec<String>;
    let mut ncols: usize;
    match opts.header {
        HeaderPolicy::FromFirstRow => loop {
            if !ensure_min_available(&mut buf, reader.as_mut(), eol, cursor)? {
                return Err(ReadError::EmptyHeader);
            }
            match scan::scan_header(buf.bytes(), cursor, popts, line_no)? {
                HeaderOutcome::NeedMore => {
                    if !force_more_bytes(&mut buf, reader.as_mut(), eol)? {
                        return Err(ReadError::EmptyHeader);
                    }
                },
                HeaderOutcome::Skipped { next_pos } => {
                    cursor = next_pos;
                    line_no += 1;
                },
                HeaderOutcome::Row { next_pos, names: found } => {
                    cursor = next_pos;
                    line_no += 1;
                    names = found;
                    break;
                },
            }
        },
        HeaderPolicy::Synthesize => loop {
            if !ensure_min_available(&mut buf, reader.as_mut(), eol, cursor)? {
                return Err(ReadError::EmptyHeader);
            }
            match scan::scan_header(buf.bytes(), cursor, popts, line_no)? {
                HeaderOutcome::NeedMore => {
                    if !force_more_bytes(&mut buf, reader.as_mut(), eol)? {
                        return Err(ReadError::EmptyHeader);
                    }
                },
                HeaderOutcome::Skipped { next_pos } => {
                    cursor = next_pos;
                    line_no += 1;
                },
                HeaderOutcome::Row { names: found, .. } => {
                    // Don't advance cursor/line_no: this row is real data.
                    names = preprocess::synthesize_names(found.len());
                    break;
                },
            }
        },
    }

    ncols = names.len();
    if ncols == 0 {
        return Err(ReadError::EmptyHeader);
    }

    // --- R-style row-name reconciliation (FromFirstRow only) ---
    if opts.header == HeaderPolicy::FromFirstRow {
        loop {
            if !ensure_min_available(&mut buf, reader.as_mut(), eol, cursor)? {
                break; // no data rows at all; nothing to reconcile against
            }
            match scan::scan_header(buf.bytes(), cursor, popts, line_no)? {
                HeaderOutcome::NeedMore => {
                    if !force_more_bytes(&mut buf, reader.as_mut(), eol)? {
                        break;
                    }
                },
                HeaderOutcome::Skipped { next_pos } => {
                    cursor = next_pos;
                    line_no += 1;
                },
                HeaderOutcome::Row { names: peeked, .. } => {
                    let data_ncols = peeked.len();
                    if preprocess::reconcile_row_names(&mut names, data_ncols) {
                        ncols = data_ncols;
                    }
                    break; // do not advance cursor: re-scan this row as real data
                },
            }
        }
    }

    if let Some(given) = &opts.colnames {
        if given.len() != ncols {
            crate::config_bail!("colnames has {} entries but the data has {ncols} columns", given.len());
        }
        names = given.clone();
    } else {
        names = preprocess::normalize_names(names, opts.normalize_names);
    }

    buf.consume(cursor);
    cursor = 0;

    // --- main chunk loop ---
    let mut committed: Vec<Option<Column>> = vec![None; ncols];
    let mut caches: Vec<StringCache> = (0..ncols).map(|_| StringCache::new()).collect();
    let chunk_target = target as usize;

    loop {
        let mut rows: Vec<(u64, Vec<Token>)> = Vec::new();
        let mut end_of_input = false;

        loop {
            if !ensure_min_available(&mut buf, reader.as_mut(), eol, cursor)? {
                end_of_input = true;
                break;
            }
            match scan::scan_record(buf.bytes(), cursor, ncols, popts, line_no)? {
                RecordOutcome::NeedMore => {
                    if !force_more_bytes(&mut buf, reader.as_mut(), eol)? {
                        let quote = popts.quote_char.unwrap_or(b'"');
                        return Err(ReadError::InvalidByteInField { line: line_no, column: 0, byte: quote });
                    }
                },
                RecordOutcome::Skipped { next_pos } => {
                    cursor = next_pos;
                    line_no += 1;
                },
                RecordOutcome::Row { next_pos, tokens } => {
                    rows.push((line_no, tokens));
                    cursor = next_pos;
                    line_no += 1;
                    if cursor >= chunk_target {
                        break;
                    }
                },
            }
        }

        if !rows.is_empty() {
            process_chunk(buf.bytes(), &rows, popts, ncols, &mut committed, &mut caches)?;
        }

        buf.consume(cursor);
        cursor = 0;

        if end_of_input {
            break;
        }
    }

    let columns: Vec<Column> = committed
        .into_iter()
        .map(|c| c.unwrap_or_else(|| Column::with_capacity(DataType::String, 0)))
        .map(Column::upgrade_dates)
        .collect();

    Ok(Table::new(names, columns))
}

fn process_chunk(
    buf: &[u8],
    rows: &[(u64, Vec<Token>)],
    popts: &crate::options::DlmParseOptions,
    ncols: usize,
    committed: &mut [Option<Column>],
    caches: &mut [StringCache],
) -> ReadResult<()> {
    let just_tokens: Vec<Vec<Token>> = rows.iter().map(|(_, t)| t.clone()).collect();
    let summaries = crate::summarize::summarize_chunk(&just_tokens, ncols);

    for c in 0..ncols {
        let new_dt = infer::infer_from_summary(&summaries[c]);
        let mut chunk_col = Column::with_capacity(new_dt, rows.len());
        for (line, row) in rows {
            chunk_col.push_token(buf, row[c], popts, *line, c, &mut caches[c])?;
        }

        match committed[c].take() {
            None => committed[c] = Some(chunk_col),
            Some(existing) => {
                let old_dt = existing.data_type();
                if old_dt == new_dt {
                    let mut existing = existing;
                    existing.extend_from(chunk_col);
                    committed[c] = Some(existing);
                } else {
                    let final_dt = infer::widen(c, old_dt, new_dt)?;
                    let mut old = existing.cast_to(final_dt);
                    let new = chunk_col.cast_to(final_dt);
                    old.extend_from(new);
                    committed[c] = Some(old);
                }
            },
        }
    }
    Ok(())
}

/// Ensure at least one byte is available at `cursor`. Returns `false`
/// only when the source is genuinely exhausted with nothing pending --
/// the normal, non-error way a parse ends.
fn ensure_min_available(buf: &mut ChunkBuffer, reader: &mut dyn Read, eol: u8, cursor: usize) -> ReadResult<bool> {
    loop {
        if buf.filled_len() > cursor {
            return Ok(true);
        }
        if !force_more_bytes(buf, reader, eol)? {
            return Ok(false);
        }
    }
}

/// Force an actual read attempt beyond whatever's currently filled.
/// Returns `false` once the source has been drained (including the one
/// synthesized end-of-input terminator) and nothing further can arrive
/// -- at that point, more bytes being needed mid-record is an error.
fn force_more_bytes(buf: &mut ChunkBuffer, reader: &mut dyn Read, eol: u8) -> ReadResult<bool> {
    let r = buf.extend(reader, eol, buf.filled_len())?;
    Ok(r != NO_DATA && r != EOF_AGAIN)
}
