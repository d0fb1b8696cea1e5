//! Gestures understood by the virtual controller pipe
//!
//! Unlike the emulator, the controller does not echo: it acknowledges every
//! gesture it managed to parse with a bare `0` line.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    One,
    Two,
    Minus,
    Plus,
    Home,
    DUp,
    DDown,
    DLeft,
    DRight,
    SwingForward,
    SwingBackward,
    NunchukC,
    NunchukZ,
}

impl Button {
    pub fn token(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::One => "1",
            Button::Two => "2",
            Button::Minus => "-",
            Button::Plus => "+",
            Button::Home => "Home",
            Button::DUp => "DUp",
            Button::DDown => "DDown",
            Button::DLeft => "DLeft",
            Button::DRight => "DRight",
            Button::SwingForward => "SwingForward",
            Button::SwingBackward => "SwingBackward",
            Button::NunchukC => "NunchukC",
            Button::NunchukZ => "NunchukZ",
        }
    }
}

impl Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Two-dimensional analog inputs, each component in [0, 1] with 0.5 centred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickAxis {
    /// Absolute pointer aim
    Ir,
    Main,
    C,
}

impl StickAxis {
    pub fn token(self) -> &'static str {
        match self {
            StickAxis::Ir => "IR",
            StickAxis::Main => "MAIN",
            StickAxis::C => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Press(Button),
    Release(Button),
    Set { axis: StickAxis, x: f64, y: f64 },
}

impl Gesture {
    /// Aim the pointer at an absolute screen position
    pub fn pointer(x: f64, y: f64) -> Self {
        Gesture::Set {
            axis: StickAxis::Ir,
            x,
            y,
        }
    }
}

impl Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::Press(button) => write!(f, "Press {}", button),
            Gesture::Release(button) => write!(f, "Release {}", button),
            Gesture::Set { axis, x, y } => write!(f, "Set {} {:.10} {:.10}", axis.token(), x, y),
        }
    }
}
