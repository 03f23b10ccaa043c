use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::api::model::Comment;
use crate::classify::category::Category;
use crate::classify::view::{ClassifyView, Phase};
use crate::content::{RenderedContent, TextStyle};
use crate::ui::layout::LayoutTier;
use crate::ui::theme::Theme;

pub struct CommentCard<'a> {
    view: &'a ClassifyView,
    content: Option<&'a RenderedContent>,
    scroll: u16,
    tier: LayoutTier,
    theme: &'a Theme,
}

impl<'a> CommentCard<'a> {
    pub fn new(
        view: &'a ClassifyView,
        content: Option<&'a RenderedContent>,
        scroll: u16,
        tier: LayoutTier,
        theme: &'a Theme,
    ) -> Self {
        Self {
            view,
            content,
            scroll,
            tier,
            theme,
        }
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer, lines: Vec<Line>) {
        let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
        let rect = Rect::new(area.x, top, area.width, area.height.saturating_sub(top - area.y));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(rect, buf);
    }

    fn render_loaded(&self, comment: &Comment, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let grid_rows = if self.tier == LayoutTier::Narrow { 3 } else { 2 };
        let meta_height = if self.tier.side_metadata() { 0 } else { 6 };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(meta_height),
                Constraint::Length(1),
                Constraint::Length(grid_rows),
                Constraint::Length(1),
            ])
            .split(area);

        // Badges
        let (badge, badge_color) = if comment.is_from_author {
            ("🖋️ Author", colors.author_badge())
        } else {
            ("🔍 User (Not Author)", colors.peer_badge())
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                " PubPeer Analysis ",
                Style::default().fg(colors.bg()).bg(colors.accent()),
            ),
            Span::raw("  "),
            Span::styled(
                format!(" {badge} "),
                Style::default()
                    .fg(colors.bg())
                    .bg(badge_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
        .render(rows[0], buf);

        Paragraph::new(Line::from(Span::styled(
            "Classify the comment",
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        )))
        .render(rows[1], buf);

        let (body_area, meta_area) = if self.tier.side_metadata() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(rows[2]);
            (cols[0], cols[1])
        } else {
            (rows[2], rows[3])
        };

        let border = if comment.is_from_author {
            colors.author_badge()
        } else {
            colors.border()
        };
        let body_block = Block::bordered()
            .title(format!(" Comment {} ", comment.comment_id))
            .border_style(Style::default().fg(border));
        let mut lines = self
            .content
            .map(|c| content_lines(c, self.theme))
            .unwrap_or_default();
        if let Some(content) = self.content
            && !content.links.is_empty()
        {
            lines.push(Line::from(""));
            for (i, url) in content.links.iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(format!("[{}] ", i + 1), Style::default().fg(colors.text_dim())),
                    Span::styled(url.clone(), Style::default().fg(colors.link())),
                ]));
            }
        }
        Paragraph::new(lines)
            .block(body_block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(body_area, buf);

        let meta_block = Block::bordered()
            .title(" Article ")
            .border_style(Style::default().fg(colors.border()));
        Paragraph::new(metadata_lines(comment, self.theme))
            .block(meta_block)
            .wrap(Wrap { trim: true })
            .render(meta_area, buf);

        Paragraph::new(Line::from(Span::styled(
            "Choose the most appropriate category:",
            Style::default().fg(colors.text_dim()),
        )))
        .render(rows[4], buf);

        self.render_grid(rows[5], buf, grid_rows);
        self.render_actions(rows[6], buf);
    }

    fn render_grid(&self, area: Rect, buf: &mut Buffer, rows: u16) {
        let colors = &self.theme.colors;
        let per_row = Category::ALL.len().div_ceil(rows as usize);
        let row_rects = Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..rows).map(|_| Constraint::Length(1)).collect::<Vec<_>>())
            .split(area);

        for (row, chunk) in Category::ALL.chunks(per_row).enumerate() {
            let Some(row_rect) = row_rects.get(row) else {
                break;
            };
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(
                    chunk
                        .iter()
                        .map(|_| Constraint::Ratio(1, per_row as u32))
                        .collect::<Vec<_>>(),
                )
                .split(*row_rect);
            for (cell, category) in cells.iter().zip(chunk) {
                let chosen = self.view.category() == Some(*category);
                let under_cursor = self.view.cursor == category.index();
                let mut style = if chosen {
                    Style::default()
                        .fg(colors.bg())
                        .bg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else if under_cursor {
                    Style::default().fg(colors.accent_dim())
                } else {
                    Style::default().fg(colors.fg())
                };
                if under_cursor {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                let marker = if under_cursor { ">" } else { " " };
                Paragraph::new(Line::from(Span::styled(
                    format!("{marker}[{}] {category}", category.index() + 1),
                    style,
                )))
                .render(*cell, buf);
            }
        }
    }

    fn render_actions(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let enabled = Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD);
        let disabled = Style::default().fg(colors.text_dim());

        let submit_label = if self.view.is_submitting() {
            "Submitting..."
        } else {
            "[Enter] Confirm and Submit"
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                "[n] Skip / Next",
                if self.view.can_skip() { enabled } else { disabled },
            ),
            Span::raw("    "),
            Span::styled(
                submit_label,
                if self.view.can_submit() { enabled } else { disabled },
            ),
        ]))
        .alignment(Alignment::Right)
        .render(area, buf);
    }
}

impl Widget for CommentCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        match (self.view.phase(), self.view.comment()) {
            (Phase::Loading, _) => self.render_status(
                inner,
                buf,
                vec![Line::from(Span::styled(
                    "⏳ Searching for a comment...",
                    Style::default().fg(colors.accent()),
                ))],
            ),
            (Phase::Failed(message), _) => self.render_status(
                inner,
                buf,
                vec![
                    Line::from(Span::styled(
                        message.clone(),
                        Style::default().fg(colors.error()),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "[r] Retry",
                        Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
                    )),
                ],
            ),
            (Phase::Loaded, Some(comment)) => self.render_loaded(comment, inner, buf),
            _ => self.render_status(
                inner,
                buf,
                vec![Line::from(Span::styled(
                    "No comment found.",
                    Style::default().fg(colors.text_dim()),
                ))],
            ),
        }
    }
}

pub fn content_lines(content: &RenderedContent, theme: &Theme) -> Vec<Line<'static>> {
    let colors = &theme.colors;
    content
        .lines
        .iter()
        .map(|line| {
            Line::from(
                line.iter()
                    .map(|segment| Span::styled(segment.text.clone(), segment_style(segment.style, theme)))
                    .collect::<Vec<_>>(),
            )
        })
        .chain(content.lines.is_empty().then(|| {
            Line::from(Span::styled(
                "(empty comment)",
                Style::default().fg(colors.text_dim()),
            ))
        }))
        .collect()
}

fn segment_style(text: TextStyle, theme: &Theme) -> Style {
    let colors = &theme.colors;
    let mut style = Style::default().fg(colors.fg());
    if text.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if text.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if text.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if text.code {
        style = style.fg(colors.success());
    }
    if text.link.is_some() {
        style = style.fg(colors.link());
    }
    style
}

fn metadata_lines(comment: &Comment, theme: &Theme) -> Vec<Line<'static>> {
    let colors = &theme.colors;
    let label = Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD);
    let value = Style::default().fg(colors.fg());
    let link = Style::default()
        .fg(colors.link())
        .add_modifier(Modifier::UNDERLINED);
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "—".to_string());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Title: ", label),
            Span::styled(or_dash(&comment.article_title), value),
        ]),
        Line::from(vec![
            Span::styled("Authors: ", label),
            Span::styled(or_dash(&comment.article_authors), value),
        ]),
        Line::from(vec![
            Span::styled("Journal: ", label),
            Span::styled(or_dash(&comment.article_journal), value),
        ]),
        Line::from(vec![
            Span::styled("DOI: ", label),
            Span::styled(or_dash(&comment.article_doi), value),
        ]),
    ];
    if let Some(url) = &comment.article_url {
        lines.push(Line::from(Span::styled(url.clone(), link)));
    }
    if let (Some(doi), Some(pubpeer)) = (comment.doi_url(), comment.pubpeer_search_url()) {
        lines.push(Line::from(Span::styled(doi, link)));
        lines.push(Line::from(Span::styled(pubpeer, link)));
    }
    lines
}
