//! Typed command table.
//!
//! Keys and command words map to a closed [`Command`] set. Nothing is ever
//! evaluated as code: page `setup` attributes and typed words are looked up
//! in the same table.

use std::collections::HashMap;

use super::ViewMode;
use crate::export::Target;

/// A keyboard key, independent of scancodes and layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Space,
    Enter,
    Backspace,
    Escape,
    ScrollLock,
    Char(char),
}

/// Modifier state accompanying a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    pub fn alt() -> Self {
        Modifiers {
            alt: true,
            ..Modifiers::NONE
        }
    }
}

/// Every action the deck can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GotoRelative(i64),
    GotoAbsolute(i64),
    GotoFirst,
    GotoLast,
    ToggleOverlay(String),
    /// Hide the active overlay, or advance one page if none is active.
    DismissOrAdvance,
    CycleViewMode,
    SetViewMode(ViewMode),
    /// Switch between focus and overview modes.
    FlipMode,
    TogglePageClass,
    ToggleAllPageClasses,
    SetAllPageClasses(String),
    ToggleAnnotations,
    /// Grow (or, when negative, shrink) the base font size by this many percent.
    ChangeFontSize(i32),
    ToggleToolbar,
    ToggleConsole,
    ToggleIndexWindow,
    ToggleEditor,
    Copy,
    Cut,
    Paste,
    Remove,
    ShowSource(Target),
    /// Ask the math renderer to reprocess every page.
    Reprocess,
}

/// Condition under which a key binding applies. Otherwise the key passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    NoAlt,
    FullViewOnly,
}

/// What a key is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub command: Command,
    /// Alternative command when Shift is held.
    pub shifted: Option<Command>,
    pub guard: Guard,
}

impl Binding {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            shifted: None,
            guard: Guard::Always,
        }
    }

    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_shifted(mut self, command: Command) -> Self {
        self.shifted = Some(command);
        self
    }
}

/// Result of looking up a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Run(Command),
    /// Bound, but the guard declined; the host should handle the key.
    PassThrough,
    Unbound,
}

/// Key and word bindings.
#[derive(Debug, Clone)]
pub struct CommandTable {
    keys: HashMap<Key, Binding>,
    words: HashMap<String, Command>,
}

impl Default for CommandTable {
    fn default() -> Self {
        let mut table = Self::empty();

        for key in [Key::PageUp, Key::Left] {
            table.map_key(key, Binding::new(Command::GotoRelative(-1)).guarded(Guard::NoAlt));
        }
        for key in [Key::PageDown, Key::Right] {
            table.map_key(key, Binding::new(Command::GotoRelative(1)).guarded(Guard::NoAlt));
        }
        table.map_key(
            Key::Up,
            Binding::new(Command::GotoRelative(-1)).guarded(Guard::FullViewOnly),
        );
        table.map_key(
            Key::Down,
            Binding::new(Command::GotoRelative(1)).guarded(Guard::FullViewOnly),
        );
        table.map_key(Key::Space, Binding::new(Command::DismissOrAdvance));
        table.map_key(Key::Home, Binding::new(Command::GotoFirst));
        table.map_key(Key::End, Binding::new(Command::GotoLast));
        table.map_key(
            Key::Char('\\'),
            Binding::new(Command::TogglePageClass).with_shifted(Command::ToggleAllPageClasses),
        );
        table.map_key(Key::Char('.'), Binding::new(Command::ToggleToolbar));
        table.map_key(Key::Char('`'), Binding::new(Command::ToggleAnnotations));
        for key in [Key::Char(','), Key::ScrollLock] {
            table.map_key(key, Binding::new(Command::CycleViewMode));
        }
        table.map_key(
            Key::Char('\''),
            Binding::new(Command::ShowSource(Target::Highlighted)),
        );

        table.map_word("index", Command::ToggleIndexWindow);
        table.map_word("debug", Command::ToggleConsole);
        table.map_word("rejax", Command::Reprocess);
        table.map_word("edit", Command::ToggleEditor);
        table.map_word("copy", Command::Copy);
        table.map_word("cut", Command::Cut);
        table.map_word("paste", Command::Paste);
        table.map_word("remove", Command::Remove);
        table.map_word("ann", Command::ToggleAnnotations);
        table.map_word("larger", Command::ChangeFontSize(5));
        table.map_word("smaller", Command::ChangeFontSize(-5));
        table.map_word("source", Command::ShowSource(Target::Highlighted));
        table.map_word("latex", Command::ShowSource(Target::Typeset));
        table
    }
}

impl CommandTable {
    /// A table with no bindings.
    pub fn empty() -> Self {
        Self {
            keys: HashMap::new(),
            words: HashMap::new(),
        }
    }

    pub fn map_key(&mut self, key: Key, binding: Binding) {
        self.keys.insert(key, binding);
    }

    pub fn unmap_key(&mut self, key: Key) {
        self.keys.remove(&key);
    }

    /// Bind a command word. Words are case-insensitive.
    pub fn map_word(&mut self, word: &str, command: Command) {
        self.words.insert(word.to_uppercase(), command);
    }

    pub fn unmap_word(&mut self, word: &str) {
        self.words.remove(&word.to_uppercase());
    }

    pub fn word(&self, word: &str) -> Option<&Command> {
        self.words.get(&word.to_uppercase())
    }

    /// Resolve a key press in the given view mode.
    pub fn resolve(&self, key: Key, mods: Modifiers, view: ViewMode) -> Resolution {
        let Some(binding) = self.keys.get(&key) else {
            return Resolution::Unbound;
        };
        let allowed = match binding.guard {
            Guard::Always => true,
            Guard::NoAlt => !mods.alt,
            Guard::FullViewOnly => view == ViewMode::Full,
        };
        if !allowed {
            return Resolution::PassThrough;
        }
        match (&binding.shifted, mods.shift) {
            (Some(shifted), true) => Resolution::Run(shifted.clone()),
            _ => Resolution::Run(binding.command.clone()),
        }
    }
}

/// What Enter should do with the typed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Empty,
    /// Digits typed: jump to this page number.
    Number(String),
    /// Letters typed (uppercased): a command word or a location.
    Word(String),
}

/// Buffer of digits and letters typed since the last command.
///
/// Digits start a page number unless a word is already being typed, in
/// which case they extend the word. Letters always extend the word and
/// discard any pending page number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    jump: String,
    find: String,
}

impl InputBuffer {
    pub fn push_digit(&mut self, digit: char) {
        if !self.jump.is_empty() || self.find.is_empty() {
            self.find.clear();
            self.jump.push(digit);
        } else {
            self.find.push(digit);
        }
    }

    pub fn push_letter(&mut self, letter: char) {
        self.jump.clear();
        self.find.extend(letter.to_uppercase());
    }

    /// Delete the last typed character. Returns `false` if nothing was typed.
    pub fn backspace(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.jump.pop();
        self.find.pop();
        true
    }

    /// Take the pending input, leaving the buffer empty.
    pub fn take(&mut self) -> Pending {
        let jump = std::mem::take(&mut self.jump);
        let find = std::mem::take(&mut self.find);
        if !jump.is_empty() {
            Pending::Number(jump)
        } else if !find.is_empty() {
            Pending::Word(find)
        } else {
            Pending::Empty
        }
    }

    pub fn clear(&mut self) {
        self.jump.clear();
        self.find.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.jump.is_empty() && self.find.is_empty()
    }
}
