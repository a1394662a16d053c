//! Terminal chat interface.
//!
//! Renders the conversation history and an input line, keeps at most one
//! request in flight (submission is ignored while `processing`), and runs
//! the clear action on demand. The send itself runs on a spawned task and
//! reports back over an mpsc channel so the UI stays responsive.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc;

use crate::api::AgentReply;
use crate::client::{self, AgentClient, ClientError, ConversationState, prompt};
use crate::config::Config;
use crate::core::storage::Storage;

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

type SendOutcome = (String, Result<AgentReply, ClientError>);

struct App {
    state: ConversationState,
    input: String,
    processing: bool,
    spinner: usize,
    should_quit: bool,
}

/// Run the TUI application.
///
/// # Errors
///
/// Returns an error if terminal initialization fails, the event loop
/// encounters an error, or local persistence fails.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let storage = Storage::new()?;
    let state = ConversationState::load(&storage)?;
    let client = AgentClient::new(config.client.endpoint.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, storage, state, client).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    storage: Storage,
    state: ConversationState,
    client: AgentClient,
) -> anyhow::Result<()> {
    let mut app = App {
        state,
        input: String::new(),
        processing: false,
        spinner: 0,
        should_quit: false,
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<SendOutcome>();

    loop {
        terminal.draw(|frame| draw(frame, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, &storage, &client, &tx, key.code, key.modifiers)?;
                }
            }
        }

        while let Ok((input, outcome)) = rx.try_recv() {
            client::apply_outcome(&mut app.state, &storage, &input, outcome)?;
            app.processing = false;
        }

        if app.processing {
            app.spinner = (app.spinner + 1) % SPINNER_FRAMES.len();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(
    app: &mut App,
    storage: &Storage,
    client: &AgentClient,
    tx: &mpsc::UnboundedSender<SendOutcome>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> anyhow::Result<()> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('k') => app.state.clear(storage)?,
            _ => {}
        }
        return Ok(());
    }

    match code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => submit(app, storage, client, tx)?,
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }

    Ok(())
}

/// Kick off one send. Ignored while a request is already in flight.
fn submit(
    app: &mut App,
    storage: &Storage,
    client: &AgentClient,
    tx: &mpsc::UnboundedSender<SendOutcome>,
) -> anyhow::Result<()> {
    if app.processing || app.input.trim().is_empty() {
        return Ok(());
    }

    let input = std::mem::take(&mut app.input);
    app.state.record_task(storage, &input)?;

    let message = prompt::augment(&app.state.tasks, &input);
    let session_id = app.state.session_id.clone();
    let client = client.clone();
    let tx = tx.clone();

    app.processing = true;
    tokio::spawn(async move {
        let outcome = client.send(&message, &session_id).await;
        tx.send((input, outcome)).ok();
    });

    Ok(())
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let task_count = app.state.tasks.len();
    let title = Line::from(vec![
        Span::styled("TaskPilot", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  ({task_count} tasks tracked)")),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    for turn in &app.state.turns {
        lines.push(Line::from(vec![
            Span::styled("You: ", Style::default().fg(Color::Blue)),
            Span::raw(turn.user.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Agent: ", Style::default().fg(Color::Green)),
            Span::raw(turn.bot.clone()),
        ]));
        lines.push(Line::default());
    }

    let messages_area = chunks[1];
    let scroll = scroll_offset(&lines, messages_area.width, messages_area.height);
    let messages = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(messages, messages_area);

    let input_title = if app.processing {
        format!("Message {}", SPINNER_FRAMES[app.spinner])
    } else {
        "Message".to_string()
    };
    let input = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(input_title));
    frame.render_widget(input, chunks[2]);

    let help = Paragraph::new("Enter send · Ctrl+K clear · Esc quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);

    if !app.processing {
        let cursor_x = chunks[2].x + 1 + u16::try_from(app.input.chars().count()).unwrap_or(0);
        frame.set_cursor_position(Position::new(
            cursor_x.min(chunks[2].right().saturating_sub(2)),
            chunks[2].y + 1,
        ));
    }
}

/// Keep the latest messages visible once the history outgrows the viewport.
///
/// Wrapped line count is estimated from character width, which is close
/// enough for scroll positioning.
fn scroll_offset(lines: &[Line], width: u16, height: u16) -> u16 {
    if width == 0 {
        return 0;
    }

    let width = usize::from(width);
    let total: usize = lines
        .iter()
        .map(|line| {
            let chars: usize = line
                .spans
                .iter()
                .map(|span| span.content.chars().count())
                .sum();
            chars / width + 1
        })
        .sum();

    let overflow = total.saturating_sub(usize::from(height));
    u16::try_from(overflow).unwrap_or(u16::MAX)
}
