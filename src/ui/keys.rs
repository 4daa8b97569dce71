use xkbcommon::xkb::keysyms;
use crate::input::InputEvent;
use crate::selection::Direction;

/// Owns the typed search text and turns raw key presses into session events.
#[derive(Debug, Default)]
pub struct KeyTranslator {
    text: String,
    ctrl: bool,
}

impl KeyTranslator {
    pub fn new(initial: &str) -> Self {
        Self {
            text: initial.to_string(),
            ctrl: false,
        }
    }

    pub fn set_ctrl(&mut self, ctrl: bool) {
        self.ctrl = ctrl;
    }

    /// `None` when the key means nothing to the launcher or leaves the text as it was.
    pub fn translate(&mut self, keysym: u32, utf8: Option<&str>) -> Option<InputEvent> {
        match keysym {
            keysyms::KEY_Escape => Some(InputEvent::Cancel),
            keysyms::KEY_Return | keysyms::KEY_KP_Enter => Some(InputEvent::Confirm),
            keysyms::KEY_Up | keysyms::KEY_ISO_Left_Tab => Some(InputEvent::Move(Direction::Previous)),
            keysyms::KEY_Down | keysyms::KEY_Tab => Some(InputEvent::Move(Direction::Next)),
            keysyms::KEY_BackSpace => {
                self.text.pop()?;
                Some(self.changed())
            }
            _ if self.ctrl => self.control_chord(keysym),
            _ => {
                let utf8 = utf8.filter(|s| !s.is_empty() && !s.chars().any(char::is_control))?;
                self.text.push_str(utf8);
                Some(self.changed())
            }
        }
    }

    fn control_chord(&mut self, keysym: u32) -> Option<InputEvent> {
        match keysym {
            keysyms::KEY_n => Some(InputEvent::Move(Direction::Next)),
            keysyms::KEY_p => Some(InputEvent::Move(Direction::Previous)),
            keysyms::KEY_u if !self.text.is_empty() => {
                self.text.clear();
                Some(self.changed())
            }
            _ => None,
        }
    }

    fn changed(&self) -> InputEvent {
        InputEvent::TextChanged(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(keys: &mut KeyTranslator, s: &str) -> Option<InputEvent> {
        keys.translate(s.chars().next().map(u32::from).unwrap_or(0), Some(s))
    }

    #[test]
    fn typing_reports_full_text() {
        let mut keys = KeyTranslator::default();
        assert_eq!(typed(&mut keys, "f"), Some(InputEvent::TextChanged("f".to_string())));
        assert_eq!(typed(&mut keys, "i"), Some(InputEvent::TextChanged("fi".to_string())));
        assert_eq!(typed(&mut keys, "é"), Some(InputEvent::TextChanged("fié".to_string())));
    }

    #[test]
    fn backspace_removes_one_character() {
        let mut keys = KeyTranslator::new("fé");
        assert_eq!(
            keys.translate(keysyms::KEY_BackSpace, None),
            Some(InputEvent::TextChanged("f".to_string()))
        );
        assert_eq!(keys.translate(keysyms::KEY_BackSpace, None), Some(InputEvent::TextChanged(String::new())));
        assert_eq!(keys.translate(keysyms::KEY_BackSpace, None), None);
    }

    #[test]
    fn terminal_keys() {
        let mut keys = KeyTranslator::new("abc");
        assert_eq!(keys.translate(keysyms::KEY_Escape, Some("\u{1b}")), Some(InputEvent::Cancel));
        assert_eq!(keys.translate(keysyms::KEY_Return, Some("\r")), Some(InputEvent::Confirm));
        assert_eq!(keys.translate(keysyms::KEY_KP_Enter, Some("\r")), Some(InputEvent::Confirm));
        assert_eq!(typed(&mut keys, "d"), Some(InputEvent::TextChanged("abcd".to_string())));
    }

    #[test]
    fn navigation_keys() {
        let mut keys = KeyTranslator::default();
        assert_eq!(keys.translate(keysyms::KEY_Down, None), Some(InputEvent::Move(Direction::Next)));
        assert_eq!(keys.translate(keysyms::KEY_Tab, Some("\t")), Some(InputEvent::Move(Direction::Next)));
        assert_eq!(keys.translate(keysyms::KEY_Up, None), Some(InputEvent::Move(Direction::Previous)));
        assert_eq!(
            keys.translate(keysyms::KEY_ISO_Left_Tab, None),
            Some(InputEvent::Move(Direction::Previous))
        );
    }

    #[test]
    fn control_chords() {
        let mut keys = KeyTranslator::new("term");
        keys.set_ctrl(true);
        assert_eq!(keys.translate(keysyms::KEY_n, Some("\u{e}")), Some(InputEvent::Move(Direction::Next)));
        assert_eq!(keys.translate(keysyms::KEY_p, Some("\u{10}")), Some(InputEvent::Move(Direction::Previous)));
        assert_eq!(keys.translate(keysyms::KEY_x, Some("\u{18}")), None);
        assert_eq!(keys.translate(keysyms::KEY_u, Some("\u{15}")), Some(InputEvent::TextChanged(String::new())));
        assert_eq!(keys.translate(keysyms::KEY_u, Some("\u{15}")), None);

        keys.set_ctrl(false);
        assert_eq!(keys.translate(keysyms::KEY_u, Some("u")), Some(InputEvent::TextChanged("u".to_string())));
    }

    #[test]
    fn control_characters_and_bare_modifiers_are_ignored() {
        let mut keys = KeyTranslator::default();
        assert_eq!(keys.translate(keysyms::KEY_Shift_L, None), None);
        assert_eq!(keys.translate(keysyms::KEY_Delete, Some("\u{7f}")), None);
        assert_eq!(keys.translate(keysyms::KEY_BackSpace, None), None);
    }
}
