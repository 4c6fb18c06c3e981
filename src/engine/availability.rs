use crate::model::*;

// ── Free-slot computation ─────────────────────────────────────────

/// Parts of `window` not covered by any reservation, sorted by start.
pub fn free_slots(reservations: &[Reservation], window: &Span) -> Vec<Span> {
    let mut taken: Vec<Span> = reservations
        .iter()
        .filter(|r| r.span.overlaps(window))
        .map(|r| Span::new(r.span.start.max(window.start), r.span.end.min(window.end)))
        .collect();
    taken.sort_by_key(|s| s.start);
    let taken = merge_overlapping(&taken);
    subtract_intervals(&[*window], &taken)
}

/// Coalesce start-sorted spans into disjoint ones. Touching spans are
/// joined, so a day booked back to back reports one busy block.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    sorted.iter().fold(Vec::with_capacity(sorted.len()), |mut busy: Vec<Span>, next| {
        match busy.last_mut() {
            Some(block) if next.start <= block.end => block.end = block.end.max(next.end),
            _ => busy.push(*next),
        }
        busy
    })
}

/// The gaps of each window in `windows` left after removing `busy`.
/// Both inputs are start-sorted and disjoint; the output is too.
pub fn subtract_intervals(windows: &[Span], busy: &[Span]) -> Vec<Span> {
    let mut gaps = Vec::new();
    let mut blocks = busy.iter().peekable();

    for window in windows {
        // Blocks ending before this window cannot touch it or any later one.
        while blocks.next_if(|block| block.end <= window.start).is_some() {}

        let mut cursor = window.start;
        for block in blocks.clone().take_while(|block| block.start < window.end) {
            if cursor < block.start {
                gaps.push(Span::new(cursor, block.start));
            }
            cursor = cursor.max(block.end);
        }
        if cursor < window.end {
            gaps.push(Span::new(cursor, window.end));
        }
    }

    gaps
}
