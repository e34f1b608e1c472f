use tui::layout::{Constraint, Layout, Rect, Size};
pub const HEADER_HEIGHT: u16 = 3;
pub const LOG_PANE_HEIGHT: u16 = 10;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub header: [Rect; 2],
    pub main: Rect,
    pub logs: Rect,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let header_height = if full_screen { 0 } else { HEADER_HEIGHT };
        let logs_height = if show_logs { LOG_PANE_HEIGHT } else { 0 };

        let [header, main, logs] = Layout::vertical([
            Constraint::Length(header_height),
            Constraint::Fill(1),
            Constraint::Length(logs_height),
        ])
        .areas(area);

        LayoutAreas {
            header: if full_screen { [Rect::ZERO, Rect::ZERO] } else { Self::split_header(header) },
            main,
            logs,
        }
    }

    fn split_header(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)]).areas(area)
    }
}
