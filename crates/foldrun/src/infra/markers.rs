//! Fold regions derived from comment markers.
//!
//! Hosts with a folding engine feed [`FoldRegion`]s straight from their
//! model. Hosts without one (plain buffers, the in-memory reference host)
//! can derive regions from the two marker conventions commonly used in
//! interactive scripts:
//!
//! - `#%% title` cell markers: each cell spans from its marker line to the
//!   start of the next marker, or to the end of input;
//! - `# region title` / `# endregion` pairs, which may nest.
//!
//! Marker lines are part of the region they open, so executing a region
//! re-sends the marker as a harmless comment. Region pairs start later than
//! the cell that contains them, which is what makes the extractor's
//! innermost-wins tie-break pick them first.

use crate::domain::model::FoldRegion;

/// Scan `text` for marker-delimited regions using `comment_prefix`.
///
/// Unbalanced `endregion` markers are ignored; regions still open at the end
/// of input are closed there.
pub fn scan(text: &str, comment_prefix: &str) -> Vec<FoldRegion> {
    let mut regions = Vec::new();
    let mut cells: Vec<(usize, String)> = Vec::new();
    let mut open: Vec<(usize, String)> = Vec::new();

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let content = line.trim_end_matches(['\n', '\r']);
        let Some(rest) = content.trim_start().strip_prefix(comment_prefix) else {
            continue;
        };

        if let Some(title) = cell_marker(rest) {
            cells.push((line_start, placeholder_for(title)));
            continue;
        }

        let directive = rest.trim_start();
        if directive.starts_with("endregion") {
            match open.pop() {
                Some((start, title)) => {
                    regions.push(FoldRegion::new(start, line_start + line.len(), title));
                }
                None => {
                    tracing::warn!(offset = line_start, "unbalanced endregion marker ignored");
                }
            }
        } else if let Some(title) = region_marker(directive) {
            open.push((line_start, placeholder_for(title)));
        }
    }

    for (index, (start, title)) in cells.iter().enumerate() {
        let end = cells.get(index + 1).map_or(text.len(), |(next, _)| *next);
        regions.push(FoldRegion::new(*start, end, title.clone()));
    }

    while let Some((start, title)) = open.pop() {
        regions.push(FoldRegion::new(start, text.len(), title));
    }

    regions
}

fn cell_marker(rest: &str) -> Option<&str> {
    rest.strip_prefix("%%")
        .or_else(|| rest.trim_start().strip_prefix("%%"))
}

fn region_marker(directive: &str) -> Option<&str> {
    let title = directive.strip_prefix("region")?;
    if title.is_empty() || title.starts_with(char::is_whitespace) {
        Some(title)
    } else {
        None
    }
}

fn placeholder_for(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        "…".to_owned()
    } else {
        trimmed.to_owned()
    }
}
