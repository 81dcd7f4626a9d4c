use crate::error::ReportError;
use crate::model::ColumnSpan;
use encoding_rs::EUC_KR;

/// Split raw export bytes into lines, dropping `\r` of CRLF endings.
pub fn split_lines(raw: &[u8]) -> Vec<&[u8]> {
    raw.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

/// Find the header line: the first line mentioning every one of `required`.
pub fn find_header(lines: &[&[u8]], required: &[&str]) -> Result<usize, ReportError> {
    lines
        .iter()
        .position(|line| {
            required
                .iter()
                .all(|name| find_bytes(line, name.as_bytes(), 0).is_some())
        })
        .ok_or_else(|| {
            ReportError::TableFormat(format!(
                "header not located (expected a line containing {})",
                required
                    .iter()
                    .map(|n| format!("'{n}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// Derive column spans from the header line.
///
/// Each name is searched strictly left to right from where the previous name
/// ended, so a name that is a prefix of a later one ("Start Time" vs
/// "Active Start") still lands on its own position.
pub fn column_spans(header: &[u8], columns: &[String]) -> Result<Vec<ColumnSpan>, ReportError> {
    let mut starts = Vec::with_capacity(columns.len());
    let mut cursor = 0;

    for name in columns {
        let start = find_bytes(header, name.as_bytes(), cursor).ok_or_else(|| {
            ReportError::TableFormat(format!(
                "column '{}' not found in header after offset {}",
                name, cursor
            ))
        })?;
        starts.push(start);
        cursor = start + name.len();
    }

    let spans = columns
        .iter()
        .enumerate()
        .map(|(i, name)| ColumnSpan {
            name: name.clone(),
            start: starts[i],
            end: starts.get(i + 1).copied().unwrap_or(header.len()),
        })
        .collect();

    Ok(spans)
}

/// Index of the first data line following the header at `header_idx`.
///
/// Blank lines are skipped; a following line made of one repeated separator
/// character (e.g. `-----`) is treated as the header underline.
pub fn data_start(lines: &[&[u8]], header_idx: usize) -> usize {
    let mut j = header_idx + 1;
    while j < lines.len() && is_blank(lines[j]) {
        j += 1;
    }
    if j < lines.len() && is_separator(lines[j]) {
        j + 1
    } else {
        header_idx + 1
    }
}

/// Raw bytes of one column in a data line.
///
/// Spans are clamped to the line; the last column runs to end-of-line.
pub fn slice_field<'a>(line: &'a [u8], spans: &[ColumnSpan], index: usize) -> &'a [u8] {
    let span = &spans[index];
    let start = span.start.min(line.len());
    let end = if index + 1 == spans.len() {
        line.len()
    } else {
        span.end.min(line.len())
    };
    &line[start..end.max(start)]
}

/// Decode a field from the console's code page, trimming padding.
///
/// Invalid sequences become U+FFFD; decoding never fails.
pub fn decode_field(bytes: &[u8]) -> String {
    let (text, _had_errors) = EUC_KR.decode_without_bom_handling(bytes);
    text.trim().to_string()
}

pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// A non-empty line consisting of one repeated punctuation character.
pub fn is_separator(line: &[u8]) -> bool {
    let trimmed = line.trim_ascii();
    match trimmed.first() {
        Some(&first) if first.is_ascii_punctuation() => trimmed.iter().all(|&b| b == first),
        _ => false,
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_header() {
        let raw = b"Jobs export\r\n\r\nJob Id  Job Policy  Start Time\r\n1  P  x";
        let lines = split_lines(raw);
        let idx = find_header(&lines, &["Job Id", "Job Policy", "Start Time"]).unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn test_missing_header_is_table_format_error() {
        let lines = split_lines(b"Job Id  Client\n1 srv");
        let err = find_header(&lines, &["Job Id", "Job Policy", "Start Time"]).unwrap_err();
        assert!(matches!(err, ReportError::TableFormat(_)));
    }

    #[test]
    fn test_spans_contiguous_and_cover_line() {
        let header = b"Job Id  Type    Job Policy      Start Time   Kilobytes";
        let cols = names(&["Job Id", "Type", "Job Policy", "Start Time", "Kilobytes"]);
        let spans = column_spans(header, &cols).unwrap();

        assert_eq!(spans[0].start, 0);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
        assert_eq!(spans.last().unwrap().end, header.len());
    }

    #[test]
    fn test_prefix_names_resolved_positionally() {
        // "Start" is a prefix of "Start Time" and appears again later.
        let header = b"Start  Start Time  Active Start  Active Start Time";
        let cols = names(&["Start", "Start Time", "Active Start", "Active Start Time"]);
        let spans = column_spans(header, &cols).unwrap();
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[1].start, 7);
        assert_eq!(spans[2].start, 19);
        assert_eq!(spans[3].start, 33);
    }

    #[test]
    fn test_out_of_order_column_is_error() {
        let header = b"Job Id  Start Time  Job Policy";
        let cols = names(&["Job Id", "Job Policy", "Start Time"]);
        assert!(matches!(
            column_spans(header, &cols),
            Err(ReportError::TableFormat(_))
        ));
    }

    #[test]
    fn test_data_start_after_separator() {
        let lines = split_lines(b"Job Id Policy\n\n  -------------  \n1 a\n");
        assert_eq!(data_start(&lines, 0), 3);
    }

    #[test]
    fn test_data_start_without_separator() {
        let lines = split_lines(b"Job Id Policy\n\n1 a\n");
        assert_eq!(data_start(&lines, 0), 1);
    }

    #[test]
    fn test_slice_field_clamps_and_extends_last() {
        let spans = vec![
            ColumnSpan { name: "A".into(), start: 0, end: 4 },
            ColumnSpan { name: "B".into(), start: 4, end: 8 },
        ];
        assert_eq!(slice_field(b"ab", &spans, 1), b"");
        assert_eq!(slice_field(b"abcdefghijkl", &spans, 1), b"efghijkl");
        assert_eq!(slice_field(b"abcdefghijkl", &spans, 0), b"abcd");
    }

    #[test]
    fn test_decode_field_cp949() {
        // "오후" in CP949
        assert_eq!(decode_field(&[0xBF, 0xC0, 0xC8, 0xC4]), "오후");
        assert_eq!(decode_field(b"  ERP-APP  "), "ERP-APP");
    }

    #[test]
    fn test_decode_field_never_fails() {
        let decoded = decode_field(&[0x41, 0xFF, 0x42]);
        assert!(decoded.starts_with('A'));
        assert!(decoded.ends_with('B'));
    }

    #[test]
    fn test_is_separator() {
        assert!(is_separator(b"  ------ "));
        assert!(is_separator(b"====="));
        assert!(!is_separator(b"--=--"));
        assert!(!is_separator(b"   "));
        assert!(!is_separator(b"12345"));
    }
}
