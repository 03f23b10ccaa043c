use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥90 cols: nav links inline, metadata beside the comment
    Medium, // 60-89 cols: nav links inline, metadata under the comment
    Narrow, // <60 cols: nav links behind the menu toggle
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 90 {
            LayoutTier::Wide
        } else if area.width >= 60 {
            LayoutTier::Medium
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn collapse_nav(&self) -> bool {
        *self == LayoutTier::Narrow
    }

    pub fn side_metadata(&self) -> bool {
        *self == LayoutTier::Wide
    }
}

pub struct AppLayout {
    pub navbar: Rect,
    /// Drop-down menu area, only when the collapsed menu is open.
    pub menu: Option<Rect>,
    pub main: Rect,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect, menu_open: bool, footer_lines: u16) -> Self {
        let tier = LayoutTier::from_area(area);
        let menu_height = if tier.collapse_nav() && menu_open { 5 } else { 0 };

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(menu_height),
                Constraint::Min(5),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);

        Self {
            navbar: vertical[0],
            menu: (menu_height > 0).then_some(vertical[1]),
            main: vertical[2],
            footer: vertical[3],
            tier,
        }
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = "  ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 7;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
