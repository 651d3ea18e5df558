//! Greedy block placement.
//!
//! Both the page estimate and the real placement are folds of the same
//! [`PageCursor::advance`] over one slice of measured heights, so the page
//! count printed on every page always matches the pages that get drawn.
//! Blocks are never reordered or split; a block taller than the content band
//! gets a page to itself and overflows it.

/// Vertical content band of a page, measured down from the top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Where the first block on a page starts.
    pub top: f32,
    /// A block may not extend past this line unless it is alone on its page.
    pub limit: f32,
    /// Space left after every block.
    pub gap: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub block: usize,
    /// 0-based index among content pages.
    pub page: usize,
    /// Top edge of the block, measured down from the top edge of the page.
    pub y: f32,
}

/// Layout state of one placement pass. Reset for every document.
#[derive(Clone, Copy, Debug)]
struct PageCursor {
    page: usize,
    y: f32,
    on_page: usize,
    pages_opened: usize,
}

impl PageCursor {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            page: 0,
            y: geometry.top,
            on_page: 0,
            pages_opened: 0,
        }
    }

    /// Place one block and return where it went. Opens a new page when the
    /// block would cross the limit and the current page already holds something.
    fn advance(&mut self, geometry: &PageGeometry, height: f32) -> (usize, f32) {
        if self.pages_opened == 0 {
            self.pages_opened = 1;
        } else if self.on_page > 0 && self.y + height > geometry.limit {
            self.page += 1;
            self.pages_opened += 1;
            self.y = geometry.top;
            self.on_page = 0;
        }
        let placed_at = self.y;
        self.y += height + geometry.gap;
        self.on_page += 1;
        (self.page, placed_at)
    }
}

/// Number of content pages the blocks will occupy. Draws nothing.
pub fn count_pages(heights: &[f32], geometry: &PageGeometry) -> usize {
    let mut cursor = PageCursor::new(geometry);
    for &h in heights {
        cursor.advance(geometry, h);
    }
    cursor.pages_opened
}

/// Page and offset for every block, in input order.
pub fn place_blocks(heights: &[f32], geometry: &PageGeometry) -> Vec<Placement> {
    let mut cursor = PageCursor::new(geometry);
    heights
        .iter()
        .enumerate()
        .map(|(block, &h)| {
            let (page, y) = cursor.advance(geometry, h);
            Placement { block, page, y }
        })
        .collect()
}

/// Pages a placement list touches.
pub fn pages_opened(placements: &[Placement]) -> usize {
    placements.last().map_or(0, |p| p.page + 1)
}

/// Number of page-sized windows needed to show a single tall canvas.
pub fn slice_count(canvas_height: f32, window_height: f32) -> usize {
    if canvas_height <= 0.0 || window_height <= 0.0 {
        return 1;
    }
    ((canvas_height / window_height).ceil() as usize).max(1)
}
