//! Main chat event loop.
//!
//! The loop owns the [`Session`]. Terminal events arrive from a reader task,
//! query outcomes from the [`QueryService`] channel and the startup health
//! probe from a oneshot; all three are drained on the same thread of control,
//! so the processing gate needs no locking.

mod keys;
mod lifecycle;

use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use self::keys::{map_chat_key, ChatAction};
use self::lifecycle::{restore_terminal, setup_terminal};
use crate::api::MedAssistBackend;
use crate::core::credentials::SettingsStore;
use crate::core::dispatch::{QueryCompletion, QueryService};
use crate::core::health::{check_health, HealthStatus};
use crate::core::session::Session;
use crate::ui::renderer::{ui, ViewState};
use crate::ui::theme::Theme;
use crate::utils::input::sanitize_pasted_text;
use crate::utils::line_editor::{
    apply_line_edit_action, LineEditAction, LineEditOutcome, LineEditorOptions,
};

const MOUSE_SCROLL_LINES: u16 = 3;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// Everything an action handler may touch besides the session itself.
struct ChatContext<'a> {
    store: &'a SettingsStore,
    queries: &'a QueryService,
    view: &'a mut ViewState,
}

/// Apply one action. Returns true when the loop should exit.
fn handle_action(session: &mut Session, ctx: &mut ChatContext<'_>, action: ChatAction) -> bool {
    let now = Instant::now();
    match action {
        ChatAction::Quit => return true,
        ChatAction::Submit => submit(session, ctx),
        ChatAction::NewChat => {
            session.start_new_chat();
            ctx.view.follow_bottom();
        }
        ChatAction::OpenSettings => session.open_settings(ctx.store),
        ChatAction::SaveSettings => {
            if let Err(err) = session.save_settings(ctx.store, now) {
                debug!(%err, "saving the API key failed");
            }
        }
        ChatAction::CloseSettings => session.layout.close_settings(),
        ChatAction::ToggleSidebar => session.layout.toggle_sidebar(),
        ChatAction::SelectSection(section) => session.layout.select_section(section),
        ChatAction::AskSuggested(index) => {
            if session.fill_suggested(index) {
                submit(session, ctx);
            }
        }
        ChatAction::ToggleSources => {
            session.toggle_focused_sources();
        }
        ChatAction::MoveSourcesFocus(delta) => session.move_sources_focus(delta),
        ChatAction::ScrollUp(lines) => ctx.view.scroll_up(lines),
        ChatAction::ScrollDown(lines) => ctx.view.scroll_down(lines),
        ChatAction::Edit(action) => {
            session.set_input_focused(true);
            apply_line_edit_action(&mut session.input, action, &LineEditorOptions::question());
        }
        ChatAction::EditKey(action) => {
            let outcome = apply_line_edit_action(
                &mut session.layout.key_field,
                action,
                &LineEditorOptions::secret(),
            );
            if matches!(outcome, LineEditOutcome::Submit(_)) {
                return handle_action(session, ctx, ChatAction::SaveSettings);
            }
        }
    }
    false
}

fn submit(session: &mut Session, ctx: &mut ChatContext<'_>) {
    if let Some((ticket, request)) = session.begin_query(ctx.store) {
        ctx.view.follow_bottom();
        ctx.queries.spawn(ticket, request);
    }
}

fn handle_paste(session: &mut Session, ctx: &mut ChatContext<'_>, text: &str) {
    let sanitized = sanitize_pasted_text(text);
    if session.layout.settings_open {
        handle_action(
            session,
            ctx,
            ChatAction::EditKey(LineEditAction::Paste(sanitized)),
        );
    } else {
        handle_action(
            session,
            ctx,
            ChatAction::Edit(LineEditAction::Paste(sanitized)),
        );
    }
}

/// Returns true when the loop should exit.
fn handle_event(
    session: &mut Session,
    ctx: &mut ChatContext<'_>,
    event: Event,
    term_width: u16,
) -> bool {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            match map_chat_key(&key, session.layout.settings_open) {
                Some(action) => handle_action(session, ctx, action),
                None => false,
            }
        }
        Event::Paste(text) => {
            handle_paste(session, ctx, &text);
            false
        }
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => ctx.view.scroll_up(MOUSE_SCROLL_LINES),
                MouseEventKind::ScrollDown => ctx.view.scroll_down(MOUSE_SCROLL_LINES),
                MouseEventKind::Down(MouseButton::Left) => {
                    let inside = ctx.view.sidebar_area.is_some_and(|area| {
                        mouse.column >= area.x
                            && mouse.column < area.x + area.width
                            && mouse.row >= area.y
                            && mouse.row < area.y + area.height
                    });
                    if !inside {
                        session.layout.click_outside_sidebar(term_width);
                    }
                }
                _ => {}
            }
            false
        }
        _ => false,
    }
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn spawn_health_probe(backend: Arc<dyn MedAssistBackend>) -> oneshot::Receiver<HealthStatus> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let status = check_health(backend.as_ref()).await;
        let _ = tx.send(status);
    });
    rx
}

fn drain_completions(
    session: &mut Session,
    rx: &mut mpsc::UnboundedReceiver<QueryCompletion>,
) -> bool {
    let mut received = false;
    while let Ok(completion) = rx.try_recv() {
        session.complete_query(completion.ticket, completion.result);
        received = true;
    }
    received
}

pub async fn run_chat(
    backend: Arc<dyn MedAssistBackend>,
    store: SettingsStore,
    server_url: String,
) -> Result<(), Box<dyn Error>> {
    let theme = Theme::default();
    let mut session = Session::new();
    let mut view = ViewState::new(server_url);

    let mut health_rx = Some(spawn_health_probe(Arc::clone(&backend)));
    let (queries, mut query_rx) = QueryService::new(backend);

    let mut terminal = setup_terminal(theme.title_style.fg)?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader = spawn_event_reader(event_tx);
    info!("chat session started");

    const MAX_FPS: u64 = 30;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut request_redraw = true;
    let mut last_draw = Instant::now() - frame_duration;

    let result: Result<(), Box<dyn Error>> = 'main_loop: loop {
        let now = Instant::now();
        let animating = session.is_processing() || session.layout.saved_feedback_active(now);
        if (request_redraw || animating) && now.duration_since(last_draw) >= frame_duration {
            if let Err(err) = terminal.draw(|f| ui(f, &session, &mut view, &theme)) {
                break 'main_loop Err(err.into());
            }
            last_draw = now;
            request_redraw = false;
        }

        let term_width = match terminal.size() {
            Ok(size) => size.width,
            Err(err) => break 'main_loop Err(err.into()),
        };

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(event)) = event_rx.try_recv() {
            events_processed = true;
            let mut ctx = ChatContext {
                store: &store,
                queries: &queries,
                view: &mut view,
            };
            if handle_event(&mut session, &mut ctx, event, term_width) {
                break 'main_loop Ok(());
            }
        }

        let received = drain_completions(&mut session, &mut query_rx);

        if let Some(rx) = health_rx.as_mut() {
            match rx.try_recv() {
                Ok(status) => {
                    session.health = status;
                    health_rx = None;
                    request_redraw = true;
                }
                Err(oneshot::error::TryRecvError::Closed) => health_rx = None,
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }

        if events_processed || received {
            request_redraw = true;
        }

        if !events_processed && !received && !animating {
            tokio::time::sleep(Duration::from_millis(16)).await;
        } else if !events_processed && !received {
            tokio::time::sleep(frame_duration).await;
        }
    };

    event_reader.abort();
    restore_terminal(&mut terminal)?;
    info!("chat session ended");
    result
}
