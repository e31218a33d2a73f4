use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    Toggle,
    Activate,
    ToggleExpand,
    SelectAllResources,
    SelectAllVerbs,
    Generate,
    Save,
    EditName,
    NextWorkflow,
    PrevWorkflow,
    ChooseWorkflow(u8),
    Back,
    ToggleHelp,
    PreviewDown,
    PreviewUp,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::EditName => map_input_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('h') if key.modifiers.is_empty() => Some(Action::Left),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Char('l') if key.modifiers.is_empty() => Some(Action::Right),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Home => Some(Action::Top),
        KeyCode::End | KeyCode::Char('G') => Some(Action::Bottom),
        KeyCode::Char(' ') => Some(Action::Toggle),
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char('e') => Some(Action::ToggleExpand),
        KeyCode::Char('a') => Some(Action::SelectAllResources),
        KeyCode::Char('A') => Some(Action::SelectAllVerbs),
        KeyCode::Char('g') => Some(Action::Generate),
        KeyCode::Char('s') => Some(Action::Save),
        KeyCode::Char('i') | KeyCode::Char('/') => Some(Action::EditName),
        KeyCode::Char(c @ '1'..='2') if key.modifiers.is_empty() => {
            Some(Action::ChooseWorkflow(c as u8 - b'0'))
        }
        KeyCode::Tab => Some(Action::NextWorkflow),
        KeyCode::BackTab => Some(Action::PrevWorkflow),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::PageDown => Some(Action::PreviewDown),
        KeyCode::PageUp => Some(Action::PreviewUp),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PreviewDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PreviewUp)
        }
        _ => None,
    }
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter | KeyCode::Tab => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}
