use std::fmt;

/// Integer key code in the conventional terminal-input encoding
/// (ASCII for printable and control keys, curses-style codes above 255).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub i32);

impl KeyCode {
    pub const CTRL_H: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(10);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const DELETE: KeyCode = KeyCode(127);
    pub const DOWN: KeyCode = KeyCode(258);
    pub const UP: KeyCode = KeyCode(259);
    pub const LEFT: KeyCode = KeyCode(260);
    pub const RIGHT: KeyCode = KeyCode(261);
    /// Platform backspace as reported by curses-style terminals.
    pub const BACKSPACE: KeyCode = KeyCode(263);

    pub const PRINTABLE: std::ops::RangeInclusive<i32> = 32..=126;

    pub fn from_char(c: char) -> Self {
        KeyCode(c as i32)
    }

    pub fn is_printable(self) -> bool {
        Self::PRINTABLE.contains(&self.0)
    }

    pub fn is_backspace(self) -> bool {
        matches!(self, Self::DELETE | Self::CTRL_H | Self::BACKSPACE)
    }

    /// The literal character for printable codes.
    pub fn as_printable(self) -> Option<char> {
        if self.is_printable() {
            u8::try_from(self.0).ok().map(char::from)
        } else {
            None
        }
    }

    pub fn class(self) -> KeyClass {
        if self == Self::ESCAPE {
            KeyClass::Escape
        } else if self.is_backspace() {
            KeyClass::Backspace
        } else if self == Self::SPACE {
            KeyClass::Space
        } else if let Some(c) = self.as_printable() {
            KeyClass::Printable(c)
        } else {
            KeyClass::Other
        }
    }
}

/// How the session engine dispatches a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyClass {
    Escape,
    Backspace,
    Space,
    Printable(char),
    Other,
}

/// Named non-printable keys. Every code maps to exactly one variant, so
/// frequency keys never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SymbolicKey {
    #[strum(serialize = "CTRL-H")]
    CtrlH,
    Tab,
    Enter,
    #[strum(serialize = "ESC")]
    Escape,
    #[strum(serialize = "DEL")]
    Delete,
    Down,
    Up,
    Left,
    Right,
    Backspace,
    #[strum(to_string = "<{0}>")]
    Code(i32),
}

impl From<KeyCode> for SymbolicKey {
    fn from(code: KeyCode) -> Self {
        match code {
            KeyCode::CTRL_H => SymbolicKey::CtrlH,
            KeyCode::TAB => SymbolicKey::Tab,
            KeyCode::ENTER => SymbolicKey::Enter,
            KeyCode::ESCAPE => SymbolicKey::Escape,
            KeyCode::DELETE => SymbolicKey::Delete,
            KeyCode::DOWN => SymbolicKey::Down,
            KeyCode::UP => SymbolicKey::Up,
            KeyCode::LEFT => SymbolicKey::Left,
            KeyCode::RIGHT => SymbolicKey::Right,
            KeyCode::BACKSPACE => SymbolicKey::Backspace,
            KeyCode(other) => SymbolicKey::Code(other),
        }
    }
}

/// Normalized key identifier used for frequency tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    Printable(char),
    Symbolic(SymbolicKey),
}

impl KeyId {
    pub fn as_char(&self) -> Option<char> {
        match self {
            KeyId::Printable(c) => Some(*c),
            KeyId::Symbolic(_) => None,
        }
    }
}

impl From<KeyCode> for KeyId {
    fn from(code: KeyCode) -> Self {
        match code.as_printable() {
            Some(c) => KeyId::Printable(c),
            None => KeyId::Symbolic(SymbolicKey::from(code)),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Printable(' ') => write!(f, "SPACE"),
            KeyId::Printable(c) => write!(f, "{c}"),
            KeyId::Symbolic(key) => write!(f, "{key}"),
        }
    }
}
