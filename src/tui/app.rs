//! Event loop of the interactive view.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::event::{Event, EventReader};
use super::terminal::Tui;
use super::view;
use crate::discovery::{Discovery, SESSION_BUDGET};
use crate::error::{AppError, DeviceError};
use crate::focus::Direction;
use crate::models::light_state::DeviceState;
use crate::router::{Effect, Input, Session};

const REFRESH_RATE: Duration = Duration::from_secs(5);
const RENDER_RATE: Duration = Duration::from_millis(100);

/// Everything the loop reacts to, including results of detached work.
#[derive(Debug)]
pub enum Action {
    Input(Input),
    Refresh,
    Render,
    Discovered(Result<IndexMap<String, String>, AppError>),
    Statuses {
        version: u64,
        statuses: Vec<(String, Result<DeviceState, DeviceError>)>,
    },
}

pub struct App {
    session: Session,
    discovery: Arc<dyn Discovery>,
    running: bool,
    polling: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(session: Session, discovery: Arc<dyn Discovery>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            session,
            discovery,
            running: true,
            polling: false,
            action_tx,
            action_rx,
        }
    }

    pub async fn run(&mut self) -> Result<(), AppError> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        let mut events = EventReader::new(REFRESH_RATE, RENDER_RATE);
        info!("interactive session started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            let action = match event {
                Event::Key(key) => handle_key_event(key).map(Action::Input),
                Event::Refresh => Some(Action::Refresh),
                Event::Render | Event::Resize => Some(Action::Render),
            };
            if let Some(action) = action {
                self.enqueue(action);
            }

            while let Ok(action) = self.action_rx.try_recv() {
                let render = matches!(action, Action::Render);
                self.process_action(action).await;
                if render {
                    tui.draw(|frame| view::render(frame, &self.session))?;
                }
            }
        }

        events.stop();
        info!("interactive session ended");
        Ok(())
    }

    fn enqueue(&self, action: Action) {
        if self.action_tx.send(action).is_err() {
            debug!("action channel closed");
        }
    }

    async fn process_action(&mut self, action: Action) {
        match action {
            Action::Input(input) => match self.session.dispatch(input).await {
                Effect::Quit => self.running = false,
                Effect::StartDiscovery => self.start_discovery(),
                Effect::None => {
                    if input == Input::Activate {
                        self.start_status_poll();
                    }
                }
            },
            Action::Refresh => self.start_status_poll(),
            Action::Render => {}
            Action::Discovered(result) => {
                self.session.finish_discovery(result);
                self.start_status_poll();
            }
            Action::Statuses { version, statuses } => {
                self.polling = false;
                self.session.update_statuses(version, statuses);
            }
        }
    }

    fn start_discovery(&self) {
        let discovery = Arc::clone(&self.discovery);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = discovery.discover(SESSION_BUDGET).await;
            let _ = tx.send(Action::Discovered(result));
        });
    }

    /// Poll every registered light in the background. The result is tagged
    /// with the registry version it was taken against.
    fn start_status_poll(&mut self) {
        if self.polling {
            return;
        }
        self.polling = true;

        let registry = self.session.registry();
        let version = registry.version();
        let addresses = registry.addresses();
        let control = self.session.control().clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let statuses = control.read_all(&addresses).await;
            let _ = tx.send(Action::Statuses { version, statuses });
        });
    }
}

fn handle_key_event(key: KeyEvent) -> Option<Input> {
    let input = match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Input::Quit,
        (_, KeyCode::Char('q')) => Input::Quit,
        (_, KeyCode::Char('a')) => Input::SelectAll,
        (_, KeyCode::Char(c @ '1'..='9')) => Input::SelectOrdinal(usize::from(c as u8 - b'0')),
        (_, KeyCode::Char('d')) => Input::Discover,
        (_, KeyCode::Up | KeyCode::Char('k')) => Input::Move(Direction::Up),
        (_, KeyCode::Down | KeyCode::Char('j')) => Input::Move(Direction::Down),
        (_, KeyCode::Left | KeyCode::Char('h')) => Input::Move(Direction::Left),
        (_, KeyCode::Right | KeyCode::Char('l')) => Input::Move(Direction::Right),
        (_, KeyCode::Enter | KeyCode::Char(' ')) => Input::Activate,
        _ => return None,
    };
    Some(input)
}
