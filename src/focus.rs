use crate::control::{Command, Setting};
use crate::models::light_state::{Brightness, Kelvin};
use crate::settings::PersistedDefaults;

/// The control currently under the cursor.
///
/// Layout is a small grid: the three buttons share the top row, the two
/// value adjusters sit on their own rows below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Toggle,
    TurnOff,
    TurnOn,
    Brightness,
    Temperature,
}

impl Focus {
    pub fn is_button(self) -> bool {
        matches!(self, Focus::Toggle | Focus::TurnOff | Focus::TurnOn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Cursor position plus the values the adjusters will commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusStateMachine {
    focus: Focus,
    pending_brightness: Brightness,
    pending_temperature: Kelvin,
}

impl FocusStateMachine {
    pub fn new(defaults: PersistedDefaults) -> Self {
        Self {
            focus: Focus::Toggle,
            pending_brightness: defaults.brightness,
            pending_temperature: defaults.temperature,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn pending_brightness(&self) -> Brightness {
        self.pending_brightness
    }

    pub fn pending_temperature(&self) -> Kelvin {
        self.pending_temperature
    }

    /// Left/right navigate on the button row and adjust on the value rows.
    pub fn on_move(&mut self, direction: Direction) {
        use Direction::*;
        use Focus::*;

        match (self.focus, direction) {
            (Temperature, Up) => self.focus = Brightness,
            (Brightness, Up) => self.focus = Toggle,
            (Brightness, Down) => self.focus = Temperature,
            (focus, Down) if focus.is_button() => self.focus = Brightness,

            (TurnOff, Left) => self.focus = Toggle,
            (TurnOn, Left) => self.focus = TurnOff,
            (Toggle, Right) => self.focus = TurnOff,
            (TurnOff, Right) => self.focus = TurnOn,

            (Brightness, Left) => self.adjust_brightness(-1),
            (Brightness, Right) => self.adjust_brightness(1),
            (Temperature, Left) => self.adjust_temperature(-1),
            (Temperature, Right) => self.adjust_temperature(1),

            _ => {}
        }
    }

    /// The command the focused control stands for.
    pub fn commit(&self) -> Command {
        match self.focus {
            Focus::Toggle => Command::Toggle,
            Focus::TurnOff => Command::TurnOff,
            Focus::TurnOn => Command::TurnOn,
            Focus::Brightness => Command::Set(Setting::Brightness(self.pending_brightness)),
            Focus::Temperature => Command::Set(Setting::Temperature(self.pending_temperature)),
        }
    }

    fn adjust_brightness(&mut self, sign: i32) {
        self.pending_brightness = self.pending_brightness.offset(sign * Brightness::STEP);
    }

    fn adjust_temperature(&mut self, sign: i32) {
        self.pending_temperature = self.pending_temperature.offset(sign * Kelvin::STEP);
    }
}
