//! Character-budget text wrapping.

/// Marker appended to the last line of a truncated block.
pub const ELLIPSIS: char = '…';

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits `text` into alternating runs of whitespace and non-whitespace. Runs are kept verbatim,
/// so a line's length counts every whitespace character between its words.
fn tokenize(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut in_space: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                out.push(&text[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Greedy accumulation. A line is closed when the next token would push its trimmed length past
/// `max_chars` and the line already has content; an oversized token on an empty line is accepted
/// as-is and left for [`hard_break`].
fn greedy_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for tok in tokenize(text) {
        let is_space = tok.starts_with(char::is_whitespace);
        if is_space && cur.is_empty() {
            continue;
        }
        // `cur` never starts with whitespace, so its length is already the trimmed length.
        if !is_space && !cur.is_empty() && char_len(&cur) + char_len(tok) > max_chars {
            out.push(cur.trim().to_string());
            cur.clear();
        }
        cur.push_str(tok);
    }
    if !cur.trim().is_empty() {
        out.push(cur.trim().to_string());
    }
    out
}

/// Splits a line wider than `max_chars` into `max_chars`-wide chunks, each but the last followed
/// by a hyphen.
fn hard_break(line: String, max_chars: usize) -> Vec<String> {
    if char_len(&line) <= max_chars {
        return vec![line];
    }
    let chars: Vec<char> = line.chars().collect();
    let chunks: Vec<&[char]> = chars.chunks(max_chars).collect();
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut s: String = chunk.iter().collect();
            if i < last {
                s.push('-');
            }
            s
        })
        .collect()
}

fn truncate_with_ellipsis(lines: &mut Vec<String>, max_lines: usize, max_chars: usize) {
    if lines.len() <= max_lines {
        return;
    }
    lines.truncate(max_lines);
    let Some(last) = lines.last_mut() else {
        return;
    };
    if char_len(last) < max_chars {
        last.push(ELLIPSIS);
    } else {
        let mut cut: String = last.chars().take(max_chars - 1).collect();
        cut.truncate(cut.trim_end().len());
        cut.push(ELLIPSIS);
        *last = cut;
    }
}

/// Wraps `text` into lines of at most `max_chars` characters.
///
/// - Whitespace separates tokens; a token is never split unless it alone exceeds the budget, in
///   which case it is hard-broken into hyphenated chunks.
/// - Whitespace runs between words (tabs and line breaks included) are kept as written and count
///   toward the budget; only line edges are trimmed.
/// - Blank input yields exactly one empty line, so callers always have a baseline to anchor.
/// - With `max_lines`, the result is cut to that many lines and the last one ends in
///   [`ELLIPSIS`], shortened as needed to stay within `max_chars`.
///
/// `max_chars` and `max_lines` below 1 are treated as 1.
pub fn wrap_text(text: &str, max_chars: usize, max_lines: Option<usize>) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.trim().is_empty() {
        return vec![String::new()];
    }

    let mut lines: Vec<String> = greedy_lines(text, max_chars)
        .into_iter()
        .flat_map(|line| hard_break(line, max_chars))
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }

    if let Some(max_lines) = max_lines {
        truncate_with_ellipsis(&mut lines, max_lines.max(1), max_chars);
    }
    lines
}
