use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::chat::Session;
use crate::client::ChatTransport;
use crate::tui::AppEvent;
use crate::ui::chat_paragraph;

pub struct App {
    pub should_quit: bool,
    pub session: Session,
    pub endpoint: String,

    // Chat scroll state
    pub scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub transport: Arc<dyn ChatTransport>,
    pub events: UnboundedSender<AppEvent>,

    // Set by the session whenever the message count changes
    scroll_pending: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        endpoint: impl Into<String>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let scroll_pending = Arc::new(AtomicBool::new(false));
        let mut session = Session::new();
        let flag = Arc::clone(&scroll_pending);
        session.on_messages_changed(move |_| flag.store(true, Ordering::Release));

        Self {
            should_quit: false,
            session,
            endpoint: endpoint.into(),

            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            animation_frame: 0,

            transport,
            events,

            scroll_pending,
        }
    }

    /// Consume a pending scroll-to-end request, if any.
    pub fn take_scroll_request(&self) -> bool {
        self.scroll_pending.swap(false, Ordering::AcqRel)
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Number of rendered lines in the chat area, including the thinking indicator.
    ///
    /// Wraps exactly like the chat paragraph does. Saturates at `u16::MAX`,
    /// the limit of `Paragraph::scroll`; past that the view stops following
    /// the newest message.
    pub fn content_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let lines = chat_paragraph(self).line_count(wrap_width);
        u16::try_from(lines).unwrap_or(u16::MAX)
    }

    pub fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.content_lines().saturating_sub(visible_height)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}
