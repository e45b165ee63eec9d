use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::TreeAction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeymapProfile {
    #[default]
    Default,
    Vim,
    Arrows,
}

#[derive(Clone, Copy, Debug)]
pub struct TreeKeyBindings {
    profile: KeymapProfile,
}

impl Default for TreeKeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeKeyBindings {
    pub const fn new() -> Self {
        Self {
            profile: KeymapProfile::Default,
        }
    }

    pub const fn with_profile(profile: KeymapProfile) -> Self {
        Self { profile }
    }

    pub const fn profile(&self) -> KeymapProfile {
        self.profile
    }

    pub const fn set_profile(&mut self, profile: KeymapProfile) {
        self.profile = profile;
    }

    pub fn resolve<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        if key.modifiers.contains(KeyModifiers::SHIFT) {
            match key.code {
                KeyCode::Right => return Some(TreeAction::ExpandAll),
                KeyCode::Left => return Some(TreeAction::CollapseAll),
                _ => {}
            }
        }

        let nav_action = match self.profile {
            KeymapProfile::Default => self.resolve_default_nav(key),
            KeymapProfile::Vim => self.resolve_vim_nav(key),
            KeymapProfile::Arrows => self.resolve_arrow_nav(key),
        };
        if nav_action.is_some() {
            return nav_action;
        }

        self.resolve_common(key)
    }

    pub fn resolve_with<C, F>(&self, key: KeyEvent, custom: F) -> Option<TreeAction<C>>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        if let Some(action) = custom(key) {
            return Some(TreeAction::Custom(action));
        }

        self.resolve(key)
    }

    const fn resolve_default_nav<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(TreeAction::FocusPrev),
            KeyCode::Down | KeyCode::Char('j') => Some(TreeAction::FocusNext),
            KeyCode::Left | KeyCode::Char('h') => Some(TreeAction::FocusParent),
            KeyCode::Right | KeyCode::Char('l') => Some(TreeAction::ToggleExpand),
            _ => None,
        }
    }

    const fn resolve_vim_nav<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Char('k') => Some(TreeAction::FocusPrev),
            KeyCode::Char('j') => Some(TreeAction::FocusNext),
            KeyCode::Char('h') => Some(TreeAction::FocusParent),
            KeyCode::Char('l') => Some(TreeAction::ToggleExpand),
            _ => None,
        }
    }

    const fn resolve_arrow_nav<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Up => Some(TreeAction::FocusPrev),
            KeyCode::Down => Some(TreeAction::FocusNext),
            KeyCode::Left => Some(TreeAction::FocusParent),
            KeyCode::Right => Some(TreeAction::ToggleExpand),
            _ => None,
        }
    }

    fn resolve_common<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Char(' ') => Some(TreeAction::ToggleCheck),
            KeyCode::Enter => Some(TreeAction::ToggleExpand),
            KeyCode::Char('s') => Some(TreeAction::ToggleSelect),
            KeyCode::Char('g') => Some(TreeAction::ToggleGuides),
            KeyCode::Char('E') => Some(TreeAction::ExpandAll),
            KeyCode::Char('C') => Some(TreeAction::CollapseAll),
            KeyCode::Home => Some(TreeAction::FocusFirst),
            KeyCode::End => Some(TreeAction::FocusLast),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn default_profile_maps_gestures() {
        let keymap = TreeKeyBindings::new();
        assert_eq!(keymap.resolve::<()>(press(KeyCode::Char(' '))), Some(TreeAction::ToggleCheck));
        assert_eq!(keymap.resolve::<()>(press(KeyCode::Enter)), Some(TreeAction::ToggleExpand));
        assert_eq!(keymap.resolve::<()>(press(KeyCode::Char('s'))), Some(TreeAction::ToggleSelect));
        assert_eq!(keymap.resolve::<()>(press(KeyCode::Char('j'))), Some(TreeAction::FocusNext));
        assert_eq!(
            keymap.resolve::<()>(KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT)),
            Some(TreeAction::ExpandAll)
        );
    }

    #[test]
    fn arrows_profile_ignores_vim_keys() {
        let keymap = TreeKeyBindings::with_profile(KeymapProfile::Arrows);
        assert_eq!(keymap.resolve::<()>(press(KeyCode::Char('k'))), None);
        assert_eq!(keymap.resolve::<()>(press(KeyCode::Up)), Some(TreeAction::FocusPrev));
    }

    #[test]
    fn custom_mapping_wins() {
        let keymap = TreeKeyBindings::new();
        let action = keymap.resolve_with(press(KeyCode::Char('x')), |key| {
            (key.code == KeyCode::Char('x')).then_some("cut")
        });
        assert_eq!(action, Some(TreeAction::Custom("cut")));
    }
}
