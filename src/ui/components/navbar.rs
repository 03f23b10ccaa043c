use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::nav::{MENU_ENTRIES, MenuEntry, NavBar, NavLink};
use crate::ui::theme::Theme;

/// One-line top bar: logo, links (unless collapsed), nickname.
pub struct NavBarWidget<'a> {
    nav: &'a NavBar,
    nickname: &'a str,
    active: Option<NavLink>,
    collapsed: bool,
    theme: &'a Theme,
}

impl<'a> NavBarWidget<'a> {
    pub fn new(
        nav: &'a NavBar,
        nickname: &'a str,
        active: Option<NavLink>,
        collapsed: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            nav,
            nickname,
            active,
            collapsed,
            theme,
        }
    }
}

impl Widget for NavBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let base = Style::default().fg(colors.header_fg()).bg(colors.header_bg());

        let mut spans = vec![
            Span::styled(" PubPeer", base.add_modifier(Modifier::BOLD)),
            Span::styled(" Classifier ", base),
        ];
        if self.collapsed {
            let toggle = if self.nav.menu_open { " [m] ✕ " } else { " [m] ☰ " };
            spans.push(Span::styled(toggle, base.fg(colors.accent())));
        } else {
            for link in NavLink::ALL {
                let style = if Some(link) == self.active {
                    base.fg(colors.accent()).add_modifier(Modifier::BOLD)
                } else {
                    base
                };
                spans.push(Span::styled(
                    format!(" [{}] {} ", link.hotkey(), link.label()),
                    style,
                ));
            }
            spans.push(Span::styled(" [x] Logout ", base.fg(colors.text_dim())));
        }

        let user = format!("👤 {} ", self.nickname);
        let left = Paragraph::new(Line::from(spans)).style(base);
        left.render(area, buf);

        let user_width = user.chars().count() as u16 + 1;
        if area.width > user_width {
            let x = area.x + area.width - user_width;
            buf.set_string(x, area.y, &user, base.fg(colors.accent()));
        }
    }
}

/// Drop-down shown under the bar when the menu is collapsed and open.
pub struct NavMenu<'a> {
    nav: &'a NavBar,
    theme: &'a Theme,
}

impl<'a> NavMenu<'a> {
    pub fn new(nav: &'a NavBar, theme: &'a Theme) -> Self {
        Self { nav, theme }
    }
}

impl Widget for NavMenu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = MENU_ENTRIES
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let label = match entry {
                    MenuEntry::Link(link) => link.label(),
                    MenuEntry::Logout => "🚪 Logout",
                };
                let selected = i == self.nav.menu_selected;
                let style = if selected {
                    Style::default()
                        .fg(colors.accent())
                        .bg(colors.selected_bg())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(Span::styled(
                    format!("{} {label}", if selected { ">" } else { " " }),
                    style,
                ))
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}
