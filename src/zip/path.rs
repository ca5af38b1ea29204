//! Member path sanitization.

/// Normalizes a stored member path.
///
/// Backslashes become forward slashes (some archivers write them), runs of
/// slashes collapse, `.` and `..` segments are resolved without ever
/// climbing above the root, and the result always starts with `/`. A
/// trailing slash marking a directory entry is kept.
pub fn sanitize(raw: &[u8]) -> Vec<u8> {
    let normalized: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'\\' { b'/' } else { b })
        .collect();

    let mut segments: Vec<&[u8]> = Vec::new();
    for segment in normalized.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => {}
            b".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut out = Vec::with_capacity(normalized.len() + 1);
    for segment in &segments {
        out.push(b'/');
        out.extend_from_slice(segment);
    }
    if out.is_empty() || normalized.last() == Some(&b'/') {
        out.push(b'/');
    }
    out
}
