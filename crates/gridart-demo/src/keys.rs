#![forbid(unsafe_code)]

//! Mapping from terminal events to pointer, angle and loop controls.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use gridart_core::InputEvent;
use gridart_fx::{FormulaKind, OutOfRangePolicy, SeedPolicy, mix_seed};
use gridart_runtime::Control;
use std::f64::consts::PI;

/// Fine angle step (arrow left/right).
pub const FINE_STEP: f64 = PI / 90.0;
/// Coarse angle step (arrow up/down).
pub const COARSE_STEP: f64 = PI / 12.0;

/// What a terminal event asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Input(InputEvent),
    Control(Control),
    Quit,
}

/// Translates events, tracking the state needed for toggles and reseeds.
#[derive(Debug, Clone)]
pub struct Keymap {
    seed_policy: SeedPolicy,
    seed: u64,
    reseeds: u64,
}

impl Keymap {
    pub fn new(seed_policy: SeedPolicy, seed: u64) -> Self {
        Self {
            seed_policy,
            seed,
            reseeds: 0,
        }
    }

    pub fn seed_policy(&self) -> SeedPolicy {
        self.seed_policy
    }

    pub fn map(&mut self, event: &Event) -> Option<Action> {
        match event {
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) | MouseEventKind::Down(_) => {
                    // Each terminal row shows two grid rows.
                    Some(Action::Input(InputEvent::PointerMoved {
                        x: f64::from(mouse.column),
                        y: 2.0 * f64::from(mouse.row),
                    }))
                }
                _ => None,
            },
            Event::Key(key) => self.map_key(key),
            _ => None,
        }
    }

    fn map_key(&mut self, key: &KeyEvent) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let interrupt = matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'));
            return interrupt.then_some(Action::Quit);
        }
        let nudge = |delta| Some(Action::Input(InputEvent::AngleNudged(delta)));
        let control = |c| Some(Action::Control(c));
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Left => nudge(-FINE_STEP),
            KeyCode::Right => nudge(FINE_STEP),
            KeyCode::Up => nudge(COARSE_STEP),
            KeyCode::Down => nudge(-COARSE_STEP),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                control(Control::SelectFormula(FormulaKind::defaults()[index]))
            }
            KeyCode::Char('c') => control(Control::SetOutOfRange(OutOfRangePolicy::Clamp)),
            KeyCode::Char('w') => control(Control::SetOutOfRange(OutOfRangePolicy::Wrap)),
            KeyCode::Char('s') => {
                self.seed_policy = self.seed_policy.toggled();
                control(Control::SetSeedPolicy(self.seed_policy))
            }
            KeyCode::Char('r') => {
                self.reseeds += 1;
                self.seed = mix_seed(self.seed, self.reseeds);
                control(Control::Reseed(self.seed))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseButton, MouseEvent};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn keymap() -> Keymap {
        Keymap::new(SeedPolicy::PerFrame, 1)
    }

    #[test]
    fn mouse_maps_to_grid_space() {
        let mut keys = keymap();
        let expected = Some(Action::Input(InputEvent::PointerMoved { x: 7.0, y: 6.0 }));
        assert_eq!(keys.map(&mouse(MouseEventKind::Moved, 7, 3)), expected);
        let drag = mouse(MouseEventKind::Drag(MouseButton::Left), 7, 3);
        assert_eq!(keys.map(&drag), expected);
        assert_eq!(keys.map(&mouse(MouseEventKind::ScrollUp, 7, 3)), None);
    }

    #[test]
    fn arrows_nudge_the_angle() {
        let mut keys = keymap();
        let nudged = |a: Option<Action>| match a {
            Some(Action::Input(InputEvent::AngleNudged(d))) => d,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(nudged(keys.map(&key(KeyCode::Right))), PI / 90.0);
        assert_eq!(nudged(keys.map(&key(KeyCode::Left))), -PI / 90.0);
        assert_eq!(nudged(keys.map(&key(KeyCode::Up))), PI / 12.0);
        assert_eq!(nudged(keys.map(&key(KeyCode::Down))), -PI / 12.0);
    }

    #[test]
    fn digits_select_formulas_in_order() {
        let mut keys = keymap();
        for (digit, name) in ['1', '2', '3', '4'].into_iter().zip(FormulaKind::NAMES) {
            match keys.map(&key(KeyCode::Char(digit))) {
                Some(Action::Control(Control::SelectFormula(kind))) => {
                    assert_eq!(kind.name(), name)
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(keys.map(&key(KeyCode::Char('5'))), None);
    }

    #[test]
    fn policy_keys() {
        let mut keys = keymap();
        assert_eq!(
            keys.map(&key(KeyCode::Char('w'))),
            Some(Action::Control(Control::SetOutOfRange(OutOfRangePolicy::Wrap)))
        );
        assert_eq!(
            keys.map(&key(KeyCode::Char('c'))),
            Some(Action::Control(Control::SetOutOfRange(OutOfRangePolicy::Clamp)))
        );
        assert_eq!(
            keys.map(&key(KeyCode::Char('s'))),
            Some(Action::Control(Control::SetSeedPolicy(SeedPolicy::Held)))
        );
        assert_eq!(
            keys.map(&key(KeyCode::Char('s'))),
            Some(Action::Control(Control::SetSeedPolicy(SeedPolicy::PerFrame)))
        );
    }

    #[test]
    fn reseed_changes_each_time() {
        let mut keys = keymap();
        let seed = |a: Option<Action>| match a {
            Some(Action::Control(Control::Reseed(s))) => s,
            other => panic!("unexpected {other:?}"),
        };
        let a = seed(keys.map(&key(KeyCode::Char('r'))));
        let b = seed(keys.map(&key(KeyCode::Char('r'))));
        assert_ne!(a, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn quit_keys() {
        let mut keys = keymap();
        assert_eq!(keys.map(&key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(keys.map(&key(KeyCode::Esc)), Some(Action::Quit));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(keys.map(&ctrl_c), Some(Action::Quit));
        let ctrl_x = Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(keys.map(&ctrl_x), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut keys = keymap();
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(keys.map(&release), None);
        assert_eq!(keys.map(&Event::FocusGained), None);
    }
}
