//! Component trait — the interface every UI panel implements.
//!
//! - Components own their state and render themselves.
//! - Components receive `AppState` (read-only) for data they don't own.
//! - Components produce `Vec<Action>`; they never mutate shared state directly.
//! - The App event-loop dispatches those actions to the appropriate targets.

use ratatui::crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Handle a key event. Only called when this component has focus.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// Handle a mouse event inside `area` (the last area it was drawn in).
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action>;

    /// Receive an action dispatched by the App, focused or not.
    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action>;

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);

    /// Whether the component is capturing text input (suspends global keys).
    fn is_editing(&self) -> bool {
        false
    }
}
