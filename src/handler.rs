use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::chat::exchange;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Reply(outcome) => {
            app.session.resolve(outcome);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Quit keys
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => submit(app),

        // Draft editing
        KeyCode::Backspace => app.session.backspace(),
        KeyCode::Delete => app.session.delete(),
        KeyCode::Left => app.session.cursor_left(),
        KeyCode::Right => app.session.cursor_right(),
        KeyCode::Home => app.session.cursor_home(),
        KeyCode::End => app.session.cursor_end(),

        // Chat scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),

        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.insert_char(c);
        }
        _ => {}
    }
}

/// Move the draft into the conversation and send it in the background.
/// The outcome comes back through the event loop as `AppEvent::Reply`.
fn submit(app: &mut App) {
    let Some(text) = app.session.submit() else {
        return;
    };

    debug!(chars = text.chars().count(), "dispatching chat request");

    let transport = Arc::clone(&app.transport);
    let events = app.events.clone();
    tokio::spawn(async move {
        let outcome = exchange(transport.as_ref(), &text).await;
        if events.send(AppEvent::Reply(outcome)).is_err() {
            debug!("event loop closed before reply arrived");
        }
    });
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Message, Outcome};
    use crate::client::{ChatResponse, ChatTransport, ReplyBody};
    use crate::error::ChatError;
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use tokio::sync::mpsc;

    /// Echoes the message back, the way the development backend does.
    struct EchoTransport;

    #[async_trait]
    impl ChatTransport for EchoTransport {
        async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
            Ok(ChatResponse {
                success: true,
                response: Some(ReplyBody {
                    message: message.to_string(),
                }),
                error: None,
            })
        }
    }

    fn make_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(Arc::new(EchoTransport), "echo", tx), rx)
    }

    fn key(code: KeyCode) -> AppEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[tokio::test]
    async fn test_enter_sends_and_reply_is_appended() {
        let (mut app, mut rx) = make_app();
        type_text(&mut app, "hi");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(app.session.messages(), &[Message::user("hi")]);
        assert_eq!(app.session.draft(), "");
        assert!(app.session.is_sending());

        let reply = rx.recv().await.unwrap();
        assert!(matches!(&reply, AppEvent::Reply(Outcome::Reply(text)) if text == "hi"));
        handle_event(&mut app, reply).unwrap();

        assert_eq!(
            app.session.messages(),
            &[Message::user("hi"), Message::server("hi")]
        );
        assert!(!app.session.is_sending());
    }

    #[tokio::test]
    async fn test_enter_on_blank_draft_sends_nothing() {
        let (mut app, mut rx) = make_app();
        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert!(app.session.messages().is_empty());
        assert_eq!(app.session.draft(), "   ");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_editing_keys() {
        let (mut app, _rx) = make_app();
        type_text(&mut app, "helo");
        handle_event(&mut app, key(KeyCode::Left)).unwrap();
        type_text(&mut app, "l");
        handle_event(&mut app, key(KeyCode::End)).unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.session.draft(), "hell");

        handle_event(&mut app, key(KeyCode::Home)).unwrap();
        handle_event(&mut app, key(KeyCode::Delete)).unwrap();
        assert_eq!(app.session.draft(), "ell");
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = make_app();
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert!(app.should_quit);
        assert_eq!(app.session.draft(), "");

        let (mut app, _rx) = make_app();
        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_mouse_scroll_only_inside_chat() {
        let (mut app, _rx) = make_app();
        app.chat_area = Some(Rect::new(0, 1, 40, 10));
        app.chat_height = 8;
        app.chat_width = 38;
        for _ in 0..10 {
            app.session.set_draft("line");
            app.session.submit();
            app.session.resolve(Outcome::Failed);
        }
        app.scroll = 5;

        let scroll = |kind, row| {
            AppEvent::Mouse(MouseEvent {
                kind,
                column: 2,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };

        handle_event(&mut app, scroll(MouseEventKind::ScrollUp, 3)).unwrap();
        assert_eq!(app.scroll, 2);
        handle_event(&mut app, scroll(MouseEventKind::ScrollDown, 20)).unwrap();
        assert_eq!(app.scroll, 2);
        handle_event(&mut app, scroll(MouseEventKind::ScrollDown, 3)).unwrap();
        assert_eq!(app.scroll, 5);
    }

    #[test]
    fn test_reply_event_without_submit_still_clears_flag() {
        let (mut app, _rx) = make_app();
        handle_event(&mut app, AppEvent::Reply(Outcome::Failed)).unwrap();
        assert_eq!(app.session.messages(), &[Message::server("Network error")]);
        assert!(!app.session.is_sending());
    }
}
