use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;

/// Centered modal with a title, body text and a hint row.
pub struct Dialog<'a> {
    title: &'a str,
    body: Vec<&'a str>,
    hints: &'a str,
    accent: Color,
    theme: &'a Theme,
}

impl<'a> Dialog<'a> {
    /// Blocking alert, dismissed with Enter.
    pub fn alert(message: &'a str, theme: &'a Theme) -> Self {
        Self {
            title: " Notice ",
            body: vec![message],
            hints: "[Enter] OK",
            accent: theme.colors.warning(),
            theme,
        }
    }

    pub fn logout(theme: &'a Theme) -> Self {
        Self {
            title: " Logout ",
            body: vec![
                "Are you sure you want to log out?",
                "",
                "You will need to re-enter your API Key to access again.",
            ],
            hints: "[n] No, stay    [y] Yes, log out",
            accent: theme.colors.error(),
            theme,
        }
    }
}

impl Widget for Dialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(self.title)
            .border_style(Style::default().fg(self.accent))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = vec![Line::from("")];
        lines.extend(
            self.body
                .iter()
                .map(|text| Line::from(Span::styled(*text, Style::default().fg(colors.fg())))),
        );
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            self.hints,
            Style::default()
                .fg(self.accent)
                .add_modifier(Modifier::BOLD),
        )));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
