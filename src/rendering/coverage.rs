/// Per-column coverage spans for deferred (offscreen) drawing
///
/// Each screen column keeps a sorted singly linked list of half-open row
/// intervals `[start, stop)`. Touching or overlapping intervals are always
/// merged, so consecutive spans satisfy `stop(n) < start(n + 1)`.
///
/// Nodes live in one arena shared by all columns. Nodes absorbed by a merge go
/// onto a free list and are reused; `clear` drops the whole arena at once.
use crate::count_call;

/// A covered row interval in one column: `start` inclusive, `stop` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
}

#[derive(Debug, Clone, Copy)]
struct SpanNode {
    start: usize,
    stop: usize,
    next: Option<u32>,
}

/// A slot holding a node index: a column head or some node's `next`.
#[derive(Debug, Clone, Copy)]
enum Link {
    Head(usize),
    Next(u32),
}

/// Where a new span falls relative to the existing span under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Existing span ends before the new one starts; keep scanning
    Past,
    /// New span ends before the existing one starts
    Precedes,
    /// Existing span already covers the new one
    Covered,
    /// New span runs past the end of the existing one
    OverlapsEnd,
    /// New span starts before the existing one and ends inside it
    OverlapsStart,
    /// New span extends the existing one on both sides
    Covers,
}

#[inline]
fn classify(span: &SpanNode, start: usize, stop: usize) -> Placement {
    if span.stop < start {
        Placement::Past
    } else if span.start <= start {
        if span.stop >= stop {
            Placement::Covered
        } else {
            Placement::OverlapsEnd
        }
    } else if span.start <= stop {
        if span.stop >= stop {
            Placement::OverlapsStart
        } else {
            Placement::Covers
        }
    } else {
        Placement::Precedes
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoverageBuffer {
    heads: Vec<Option<u32>>,
    nodes: Vec<SpanNode>,
    free: Option<u32>,
}

impl CoverageBuffer {
    pub fn new(columns: usize) -> Self {
        Self {
            heads: vec![None; columns],
            nodes: Vec::new(),
            free: None,
        }
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.heads.len()
    }

    /// Forget every span. O(columns); arena capacity is kept.
    pub fn clear(&mut self) {
        count_call!(crate::perf::FUNCTION_COUNTERS.coverage_clears);
        self.nodes.clear();
        self.heads.fill(None);
        self.free = None;
    }

    /// Nodes handed out by the arena since the last clear, including free ones
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Add `[start, stop)` to `column`, merging with whatever it touches.
    /// Empty intervals and out-of-range columns are ignored.
    pub fn insert(&mut self, column: usize, start: usize, stop: usize) {
        debug_assert!(column < self.heads.len(), "column {} out of range", column);
        debug_assert!(start < stop, "empty span {}..{}", start, stop);
        if column >= self.heads.len() || start >= stop {
            return;
        }
        count_call!(crate::perf::FUNCTION_COUNTERS.spans_inserted);

        let mut link = Link::Head(column);
        loop {
            let Some(idx) = self.follow(link) else {
                self.add_span(link, start, stop);
                break;
            };
            let span = self.nodes[idx as usize];
            match classify(&span, start, stop) {
                Placement::Past => link = Link::Next(idx),
                Placement::Precedes => {
                    self.add_span(link, start, stop);
                    break;
                }
                Placement::Covered => break,
                Placement::OverlapsEnd => {
                    self.extend_to(idx, stop);
                    break;
                }
                Placement::OverlapsStart => {
                    self.nodes[idx as usize].start = start;
                    break;
                }
                Placement::Covers => {
                    self.nodes[idx as usize].start = start;
                    self.extend_to(idx, stop);
                    break;
                }
            }
        }

        debug_assert!(self.column_is_valid(column), "column {} broken", column);
    }

    /// Iterate the spans of one column in row order
    pub fn spans(&self, column: usize) -> Spans<'_> {
        Spans {
            nodes: &self.nodes,
            next: self.heads.get(column).copied().flatten(),
        }
    }

    /// Spans are non-empty, sorted and separated by at least one row.
    pub fn column_is_valid(&self, column: usize) -> bool {
        let mut prev: Option<Span> = None;
        for span in self.spans(column) {
            if span.start >= span.stop {
                return false;
            }
            if let Some(p) = prev {
                if p.stop >= span.start {
                    return false;
                }
            }
            prev = Some(span);
        }
        true
    }

    #[inline]
    fn follow(&self, link: Link) -> Option<u32> {
        match link {
            Link::Head(column) => self.heads[column],
            Link::Next(idx) => self.nodes[idx as usize].next,
        }
    }

    #[inline]
    fn relink(&mut self, link: Link, target: Option<u32>) {
        match link {
            Link::Head(column) => self.heads[column] = target,
            Link::Next(idx) => self.nodes[idx as usize].next = target,
        }
    }

    fn add_span(&mut self, link: Link, start: usize, stop: usize) {
        let node = SpanNode {
            start,
            stop,
            next: self.follow(link),
        };
        let idx = self.alloc(node);
        self.relink(link, Some(idx));
    }

    /// Grow span `idx` to end at `stop`, absorbing every following span the
    /// new end reaches.
    fn extend_to(&mut self, idx: u32, stop: usize) {
        let mut stop = stop;
        let mut next = self.nodes[idx as usize].next;

        while let Some(n) = next {
            let node = self.nodes[n as usize];
            if node.start > stop || node.stop > stop {
                break;
            }
            next = node.next;
            self.release(n);
        }

        // Bridged into the following span: take its end and drop it
        if let Some(n) = next {
            let node = self.nodes[n as usize];
            if node.start <= stop {
                stop = node.stop;
                next = node.next;
                self.release(n);
            }
        }

        let span = &mut self.nodes[idx as usize];
        span.stop = stop;
        span.next = next;
    }

    fn alloc(&mut self, node: SpanNode) -> u32 {
        match self.free {
            Some(idx) => {
                self.free = self.nodes[idx as usize].next;
                self.nodes[idx as usize] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn release(&mut self, idx: u32) {
        count_call!(crate::perf::FUNCTION_COUNTERS.spans_merged);
        self.nodes[idx as usize].next = self.free;
        self.free = Some(idx);
    }
}

pub struct Spans<'a> {
    nodes: &'a [SpanNode],
    next: Option<u32>,
}

impl<'a> Iterator for Spans<'a> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let node = self.nodes[self.next? as usize];
        self.next = node.next;
        Some(Span {
            start: node.start,
            stop: node.stop,
        })
    }
}
