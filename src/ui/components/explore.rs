use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::api::model::Comment;
use crate::classify::category::Category;
use crate::classify::view::Submission;
use crate::ui::theme::Theme;

/// This run's submissions next to what the server has recorded for the
/// current comment.
pub struct ExplorePanel<'a> {
    submissions: &'a [Submission],
    comment: Option<&'a Comment>,
    theme: &'a Theme,
}

impl<'a> ExplorePanel<'a> {
    pub fn new(submissions: &'a [Submission], comment: Option<&'a Comment>, theme: &'a Theme) -> Self {
        Self {
            submissions,
            comment,
            theme,
        }
    }

    fn submission_lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        if self.submissions.is_empty() {
            return vec![Line::from(Span::styled(
                "Nothing submitted yet.",
                Style::default().fg(colors.text_dim()),
            ))];
        }
        self.submissions
            .iter()
            .rev()
            .map(|s| {
                Line::from(vec![
                    Span::styled(
                        s.at.format("%H:%M:%S  ").to_string(),
                        Style::default().fg(colors.text_dim()),
                    ),
                    Span::styled(
                        format!("{:<24}", s.comment_id),
                        Style::default().fg(colors.fg()),
                    ),
                    Span::styled(
                        s.category.to_string(),
                        Style::default().fg(colors.success()),
                    ),
                ])
            })
            .collect()
    }

    fn recorded_lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let Some(comment) = self.comment else {
            return vec![Line::from(Span::styled(
                "No comment loaded.",
                Style::default().fg(colors.text_dim()),
            ))];
        };
        let mut lines = vec![Line::from(Span::styled(
            format!("Comment {}", comment.comment_id),
            Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
        ))];
        if comment.classifications.is_empty() {
            lines.push(Line::from(Span::styled(
                "No classifications recorded.",
                Style::default().fg(colors.text_dim()),
            )));
        }
        for entry in &comment.classifications {
            let when = entry
                .recorded_at()
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .or_else(|| entry.created_at.clone())
                .unwrap_or_default();
            lines.push(Line::from(vec![
                category_span(entry.category.as_deref(), self.theme),
                Span::styled(
                    format!("  by {}", entry.user.as_deref().unwrap_or("unknown")),
                    Style::default().fg(colors.fg()),
                ),
                Span::styled(format!("  {when}"), Style::default().fg(colors.text_dim())),
            ]));
        }
        lines
    }
}

/// Known labels are shown as such; anything else the server stored is
/// flagged so it stands out.
fn category_span(label: Option<&str>, theme: &Theme) -> Span<'static> {
    let colors = &theme.colors;
    match label.map(|l| (l, Category::from_label(l))) {
        Some((_, Some(category))) => {
            Span::styled(category.to_string(), Style::default().fg(colors.success()))
        }
        Some((raw, None)) => Span::styled(
            format!("{raw} (unknown)"),
            Style::default().fg(colors.warning()),
        ),
        None => Span::styled("?", Style::default().fg(colors.text_dim())),
    }
}

impl Widget for ExplorePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        Paragraph::new(self.submission_lines())
            .block(
                Block::bordered()
                    .title(format!(" Submitted this session ({}) ", self.submissions.len()))
                    .border_style(Style::default().fg(colors.border())),
            )
            .render(halves[0], buf);

        Paragraph::new(self.recorded_lines())
            .block(
                Block::bordered()
                    .title(" Recorded classifications ")
                    .border_style(Style::default().fg(colors.border())),
            )
            .wrap(Wrap { trim: true })
            .render(halves[1], buf);
    }
}
