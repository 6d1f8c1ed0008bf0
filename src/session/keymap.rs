use std::fmt;
use std::str::FromStr;

use super::command::EditorCommand;

/// A key chord. `primary` is Ctrl on Linux/Windows and Cmd on macOS; the
/// editor treats both the same.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub primary: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: char,
}

impl Shortcut {
    pub const fn primary(key: char) -> Self {
        Self { primary: true, shift: false, alt: false, key }
    }

    pub const fn primary_shift(key: char) -> Self {
        Self { primary: true, shift: true, alt: false, key }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutParseError {
    #[error("empty shortcut")]
    Empty,
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("key must be a single character, got '{0}'")]
    BadKey(String),
}

impl FromStr for Shortcut {
    type Err = ShortcutParseError;

    // Accepts forms like "Ctrl+S", "cmd+shift+z", "Ctrl-Y"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(['+', '-'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(ShortcutParseError::Empty);
        };
        let mut out = Shortcut { primary: false, shift: false, alt: false, key: ' ' };
        for m in modifiers {
            match m.to_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" | "meta" | "super" => out.primary = true,
                "shift" => out.shift = true,
                "alt" | "option" | "opt" => out.alt = true,
                other => return Err(ShortcutParseError::UnknownModifier(other.to_string())),
            }
        }
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => out.key = c.to_ascii_lowercase(),
            _ => return Err(ShortcutParseError::BadKey(key.to_string())),
        }
        Ok(out)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.primary { f.write_str("Ctrl+")?; }
        if self.alt { f.write_str("Alt+")?; }
        if self.shift { f.write_str("Shift+")?; }
        write!(f, "{}", self.key.to_ascii_uppercase())
    }
}

/// Default bindings, listed for help screens.
pub const BINDINGS: [(Shortcut, &str); 7] = [
    (Shortcut::primary('s'), "save"),
    (Shortcut::primary('z'), "undo"),
    (Shortcut::primary_shift('z'), "redo"),
    (Shortcut::primary('y'), "redo"),
    (Shortcut::primary('f'), "find"),
    (Shortcut::primary('c'), "copy"),
    (Shortcut::primary('v'), "paste"),
];

pub fn command_for(shortcut: &Shortcut) -> Option<EditorCommand> {
    if !shortcut.primary || shortcut.alt {
        return None;
    }
    let cmd = match (shortcut.key.to_ascii_lowercase(), shortcut.shift) {
        ('s', false) => EditorCommand::Save,
        ('z', false) => EditorCommand::Undo,
        ('z', true) | ('y', false) => EditorCommand::Redo,
        ('f', false) => EditorCommand::OpenSearch,
        ('c', false) => EditorCommand::Copy,
        ('v', false) => EditorCommand::Paste,
        _ => return None,
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("Ctrl+S".parse::<Shortcut>(), Ok(Shortcut::primary('s')));
        assert_eq!("cmd+shift+Z".parse::<Shortcut>(), Ok(Shortcut::primary_shift('z')));
        assert_eq!("Ctrl-Y".parse::<Shortcut>(), Ok(Shortcut::primary('y')));
        assert!(matches!("Hyper+S".parse::<Shortcut>(), Err(ShortcutParseError::UnknownModifier(_))));
        assert!(matches!("Ctrl+Space".parse::<Shortcut>(), Err(ShortcutParseError::BadKey(_))));
        assert_eq!("".parse::<Shortcut>(), Err(ShortcutParseError::Empty));
    }

    #[test]
    fn bindings_resolve_to_commands() {
        assert_eq!(command_for(&Shortcut::primary('s')), Some(EditorCommand::Save));
        assert_eq!(command_for(&Shortcut::primary('z')), Some(EditorCommand::Undo));
        assert_eq!(command_for(&Shortcut::primary_shift('z')), Some(EditorCommand::Redo));
        assert_eq!(command_for(&Shortcut::primary('y')), Some(EditorCommand::Redo));
        assert_eq!(command_for(&Shortcut::primary('f')), Some(EditorCommand::OpenSearch));
        assert_eq!(command_for(&Shortcut::primary('c')), Some(EditorCommand::Copy));
        assert_eq!(command_for(&Shortcut::primary('v')), Some(EditorCommand::Paste));
        let plain_s = Shortcut { primary: false, shift: false, alt: false, key: 's' };
        assert_eq!(command_for(&plain_s), None);
        for (sc, _) in BINDINGS {
            assert!(command_for(&sc).is_some(), "{} unbound", sc);
        }
    }

    #[test]
    fn display_round_trips() {
        let sc = Shortcut::primary_shift('z');
        assert_eq!(sc.to_string(), "Ctrl+Shift+Z");
        assert_eq!(sc.to_string().parse::<Shortcut>(), Ok(sc));
    }
}
