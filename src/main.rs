use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use peerclass::api::client::HttpCommentApi;
use peerclass::api::worker::ApiWorker;
use peerclass::app::{App, AppScreen, LoginField};
use peerclass::classify::category::Category;
use peerclass::classify::view::Phase;
use peerclass::config::Config;
use peerclass::event::{AppEvent, EventHandler};
use peerclass::nav::NavLink;
use peerclass::router::Route;
use peerclass::store::json_store::JsonSessionStore;
use peerclass::ui;
use peerclass::ui::components::comment_card::CommentCard;
use peerclass::ui::components::dialog::Dialog;
use peerclass::ui::components::explore::ExplorePanel;
use peerclass::ui::components::navbar::{NavBarWidget, NavMenu};
use peerclass::ui::layout::{AppLayout, LayoutTier, pack_hint_lines};
use peerclass::ui::line_input::{InputResult, LineInput};
use peerclass::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "peerclass", version, about = "Classify PubPeer comments from the terminal")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Base URL of the classification API")]
    api_url: Option<String>,

    #[arg(
        short,
        long,
        help = "Open this comment instead of a random one (id or /comment/<id>)"
    )]
    comment: Option<String>,

    #[arg(long, help = "Write logs here instead of the data directory")]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("peerclass=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn start_target(arg: &str) -> Result<Option<String>> {
    if !arg.starts_with('/') {
        return Ok(Some(arg.to_string()));
    }
    let route = Route::parse(arg).ok_or_else(|| anyhow!("unrecognised path: {arg}"))?;
    match route.comment_target() {
        Some(target) => Ok(target.map(String::from)),
        None => bail!("{arg} is not a comment path"),
    }
}

fn load_theme(name: &str) -> Theme {
    Theme::load(name).unwrap_or_else(|| {
        warn!(
            theme = name,
            available = ?Theme::available_themes(),
            "unknown theme, using default"
        );
        Theme::default()
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(ref arg) = cli.comment {
        config.start_comment = start_target(arg)?;
    }
    if let Some(path) = cli.log_file {
        config.log_file = path.to_string_lossy().to_string();
    }
    config.normalize();

    init_logging(&PathBuf::from(&config.log_file))?;
    if let Some(err) = config_error {
        warn!(error = format!("{err:#}"), "config file ignored, using defaults");
    }
    info!(api = %config.api_base_url, "starting");

    let api = Arc::new(HttpCommentApi::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(250));
    let worker = ApiWorker::new(api, events.sender());

    let result = run(&mut terminal, &config, &events, &worker);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(?err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Builds the app from the persisted session and runs it; a logout rebuilds
/// it from scratch, like reloading the page.
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    events: &EventHandler,
    worker: &ApiWorker,
) -> Result<()> {
    loop {
        let theme = load_theme(&config.theme);
        let session = Box::new(JsonSessionStore::new()?);
        let mut app = App::new(config.clone(), theme, session);

        run_app(terminal, &mut app, events, worker)?;

        if !app.should_reload {
            return Ok(());
        }
        info!("reloading after logout");
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    worker: &ApiWorker,
) -> Result<()> {
    loop {
        for ticket in app.take_requests() {
            worker.dispatch(ticket);
        }

        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Api(generation, outcome) => app.on_api(generation, outcome),
            AppEvent::Resize(w, h) => {
                if app.nav.menu_open && !nav_collapsed(w, h) {
                    app.nav.toggle_menu();
                }
            }
            AppEvent::Tick => {}
        }

        if app.should_quit || app.should_reload {
            return Ok(());
        }
    }
}

/// The drop-down menu only exists while the nav links are collapsed.
fn nav_collapsed(width: u16, height: u16) -> bool {
    LayoutTier::from_area(Rect::new(0, 0, width, height)).collapse_nav()
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Modal layers take priority
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return;
    }
    if app.nav.logout_prompt {
        match key.code {
            KeyCode::Char('y') => app.confirm_logout(),
            KeyCode::Char('n') | KeyCode::Esc => app.nav.cancel_logout(),
            _ => {}
        }
        return;
    }

    match app.screen {
        AppScreen::Login => handle_login_key(app, key),
        AppScreen::Classify | AppScreen::Explore => {
            if handle_nav_key(app, key) {
                return;
            }
            if app.screen == AppScreen::Classify {
                handle_classify_key(app, key);
            }
        }
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    match app.login.focused_input().handle(key) {
        InputResult::Continue => app.login.error = None,
        InputResult::Submit => {
            if app.login.focus == LoginField::ApiKey && app.login.nickname.value().is_empty() {
                app.login.toggle_focus();
            } else {
                app.submit_login();
            }
        }
        InputResult::NextField | InputResult::PrevField => app.login.toggle_focus(),
        InputResult::Cancel => app.should_quit = true,
    }
}

/// Keys shared by every signed-in screen. Returns true when consumed.
fn handle_nav_key(app: &mut App, key: KeyEvent) -> bool {
    if app.nav.menu_open {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.nav.menu_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.nav.menu_next(),
            KeyCode::Enter => app.activate_menu_entry(),
            KeyCode::Esc | KeyCode::Char('m') => app.nav.toggle_menu(),
            _ => {}
        }
        return true;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('m') => {
            let (w, h) = crossterm::terminal::size().unwrap_or((u16::MAX, u16::MAX));
            if nav_collapsed(w, h) {
                app.nav.toggle_menu();
            }
        }
        KeyCode::Char('x') => app.nav.request_logout(),
        KeyCode::Char('[') => app.go_back(),
        KeyCode::Char(']') => app.go_forward(),
        KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => app.go_back(),
        KeyCode::Right if key.modifiers.contains(KeyModifiers::ALT) => app.go_forward(),
        KeyCode::Char(ch) => {
            let Some(link) = NavLink::ALL.into_iter().find(|l| l.hotkey() == ch) else {
                return false;
            };
            app.follow_link(link);
        }
        _ => return false,
    }
    true
}

fn handle_classify_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(ch @ '1'..='6') => {
            let idx = ch as usize - '1' as usize;
            if let Some(category) = Category::from_index(idx) {
                app.view.select(category);
            }
        }
        KeyCode::Left | KeyCode::Char('h') => app.view.move_cursor(-1),
        KeyCode::Right | KeyCode::Char('l') => app.view.move_cursor(1),
        KeyCode::Char(' ') => app.view.select_cursor(),
        KeyCode::Enter => app.submit(),
        KeyCode::Char('n') | KeyCode::Char('s') => app.skip(),
        KeyCode::Char('r') => {
            if matches!(app.view.phase(), Phase::Failed(_) | Phase::Empty) {
                app.retry();
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.content_scroll = app.content_scroll.saturating_add(1);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.content_scroll = app.content_scroll.saturating_sub(1);
        }
        KeyCode::PageDown => app.content_scroll = app.content_scroll.saturating_add(10),
        KeyCode::PageUp => app.content_scroll = app.content_scroll.saturating_sub(10),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Login => render_login(frame, app),
        AppScreen::Classify | AppScreen::Explore => render_signed_in(frame, app),
    }

    if app.nav.logout_prompt {
        let popup = ui::layout::centered_rect(50, 30, area);
        frame.render_widget(Dialog::logout(&app.theme), popup);
    }
    if let Some(ref message) = app.alert {
        let popup = ui::layout::centered_rect(50, 25, area);
        frame.render_widget(Dialog::alert(message, &app.theme), popup);
    }
}

fn render_signed_in(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let hints: &[&str] = match app.screen {
        AppScreen::Classify => &[
            "[1-6] Category",
            "[←→ Space] Pick",
            "[Enter] Submit",
            "[n] Skip",
            "[↑↓] Scroll",
            "[ [ ] ] Back/Fwd",
            "[q] Quit",
        ],
        _ => &["[c] Classify", "[ [ ] ] Back/Fwd", "[q] Quit"],
    };
    let hint_lines = pack_hint_lines(hints, area.width as usize);
    let layout = AppLayout::new(area, app.nav.menu_open, hint_lines.len() as u16);

    let active = match app.screen {
        AppScreen::Explore => Some(NavLink::Explore),
        _ => Some(NavLink::Classify),
    };
    frame.render_widget(
        NavBarWidget::new(
            &app.nav,
            app.nickname(),
            active,
            layout.tier.collapse_nav(),
            &app.theme,
        ),
        layout.navbar,
    );
    if let Some(menu_area) = layout.menu {
        frame.render_widget(NavMenu::new(&app.nav, &app.theme), menu_area);
    }

    match app.screen {
        AppScreen::Explore => frame.render_widget(
            ExplorePanel::new(app.view.submissions(), app.view.comment(), &app.theme),
            layout.main,
        ),
        _ => frame.render_widget(
            CommentCard::new(
                &app.view,
                app.rendered_content(),
                app.content_scroll,
                layout.tier,
                &app.theme,
            ),
            layout.main,
        ),
    }

    let footer = Paragraph::new(
        hint_lines
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
            .collect::<Vec<_>>(),
    );
    frame.render_widget(footer, layout.footer);
}

fn render_login(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(50, 50, area);
    let block = Block::bordered()
        .title(" PubPeer Classifier ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    Paragraph::new(Line::from(Span::styled(
        "  Sign in with your API key",
        Style::default().fg(colors.fg()),
    )))
    .render(layout[0], frame.buffer_mut());

    let fields = [
        ("API Key", &app.login.api_key, LoginField::ApiKey),
        ("Nickname", &app.login.nickname, LoginField::Nickname),
    ];
    for (i, (label, input, field)) in fields.into_iter().enumerate() {
        let focused = app.login.focus == field;
        field_lines(label, input, focused, app).render(layout[1 + i], frame.buffer_mut());
    }

    if let Some(ref err) = app.login.error {
        Paragraph::new(Line::from(Span::styled(
            format!("  {err}"),
            Style::default().fg(colors.error()),
        )))
        .render(layout[3], frame.buffer_mut());
    }

    Paragraph::new(Line::from(Span::styled(
        "  [Tab] Switch field  [Enter] Continue  [Esc] Quit",
        Style::default().fg(colors.text_dim()),
    )))
    .render(layout[5], frame.buffer_mut());
}

fn field_lines<'a>(label: &'a str, input: &LineInput, focused: bool, app: &App) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    let indicator = if focused { " > " } else { "   " };
    let label_style = Style::default()
        .fg(if focused { colors.accent() } else { colors.fg() })
        .add_modifier(if focused { Modifier::BOLD } else { Modifier::empty() });

    let (before, at, after) = input.display_parts();
    let mut value = vec![Span::raw("     "), Span::styled(before, Style::default().fg(colors.fg()))];
    if focused {
        value.push(Span::styled(
            at.map(String::from).unwrap_or_else(|| " ".to_string()),
            Style::default().fg(colors.bg()).bg(colors.fg()),
        ));
    } else if let Some(ch) = at {
        value.push(Span::styled(String::from(ch), Style::default().fg(colors.fg())));
    }
    value.push(Span::styled(after, Style::default().fg(colors.fg())));

    Paragraph::new(vec![
        Line::from(Span::styled(format!("{indicator}{label}:"), label_style)),
        Line::from(value),
    ])
}
