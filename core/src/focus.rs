/// Focusable controls inside the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalControl {
    Close,
    Mute,
    Share,
    VideoButton(usize),
    ToggleActions,
}

/// Where keyboard focus sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    /// The widget trigger outside the modal
    Trigger,
    Control(ModalControl),
}

/// Keeps Tab and Shift+Tab cycling through the modal's controls while it is
/// open. Focus wraps from the last control to the first and back.
#[derive(Debug, Clone)]
pub struct FocusTrap {
    order: Vec<ModalControl>,
    active: bool,
    current: usize,
}

impl FocusTrap {
    /// Controls in document order: top controls, switch buttons (only rendered
    /// for more than one video), then the actions toggle.
    pub fn new(video_buttons: usize) -> Self {
        let mut order = vec![ModalControl::Close, ModalControl::Mute, ModalControl::Share];
        if video_buttons > 1 {
            order.extend((0..video_buttons).map(ModalControl::VideoButton));
        }
        order.push(ModalControl::ToggleActions);

        Self {
            order,
            active: false,
            current: 0,
        }
    }

    pub fn controls(&self) -> &[ModalControl] {
        &self.order
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Engage the trap with focus on the first control
    pub fn activate(&mut self) -> ModalControl {
        self.active = true;
        self.current = 0;
        self.order[0]
    }

    pub fn release(&mut self) {
        self.active = false;
    }

    /// Focused control, if the trap is engaged
    pub fn current(&self) -> Option<ModalControl> {
        self.active.then(|| self.order[self.current])
    }

    /// Move focus onto `control` if it belongs to the modal
    pub fn focus(&mut self, control: ModalControl) -> bool {
        match self.order.iter().position(|c| *c == control) {
            Some(index) if self.active => {
                self.current = index;
                true
            }
            _ => false,
        }
    }

    /// Tab. Controls for which `visible` returns false are skipped; the top
    /// controls are always shown, so the search ends.
    pub fn next(&mut self, visible: impl Fn(ModalControl) -> bool) -> Option<ModalControl> {
        self.step(visible, |i, len| (i + 1) % len)
    }

    /// Shift+Tab, skipping hidden controls like `next`
    pub fn previous(&mut self, visible: impl Fn(ModalControl) -> bool) -> Option<ModalControl> {
        self.step(visible, |i, len| i.checked_sub(1).unwrap_or(len - 1))
    }

    fn step(
        &mut self,
        visible: impl Fn(ModalControl) -> bool,
        advance: impl Fn(usize, usize) -> usize,
    ) -> Option<ModalControl> {
        if !self.active {
            return None;
        }
        let len = self.order.len();
        let mut index = self.current;
        for _ in 0..len {
            index = advance(index, len);
            if visible(self.order[index]) {
                self.current = index;
                return self.current();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_video_has_no_switch_buttons() {
        let trap = FocusTrap::new(1);
        assert_eq!(
            trap.controls(),
            [ModalControl::Close, ModalControl::Mute, ModalControl::Share, ModalControl::ToggleActions]
        );
    }

    #[test]
    fn test_tab_wraps_last_to_first() {
        let mut trap = FocusTrap::new(2);
        assert_eq!(trap.activate(), ModalControl::Close);
        assert!(trap.focus(ModalControl::ToggleActions));
        assert_eq!(trap.next(|_| true), Some(ModalControl::Close));
    }

    #[test]
    fn test_back_tab_wraps_first_to_last() {
        let mut trap = FocusTrap::new(3);
        trap.activate();
        assert_eq!(trap.previous(|_| true), Some(ModalControl::ToggleActions));
        assert_eq!(trap.previous(|_| true), Some(ModalControl::VideoButton(2)));
    }

    #[test]
    fn test_released_trap_does_not_move() {
        let mut trap = FocusTrap::new(2);
        trap.activate();
        trap.release();
        assert_eq!(trap.next(|_| true), None);
        assert_eq!(trap.current(), None);
        assert!(!trap.focus(ModalControl::Mute));
    }

    #[test]
    fn test_hidden_controls_are_skipped() {
        let mut trap = FocusTrap::new(2);
        trap.activate();
        let no_switch_buttons = |c: ModalControl| !matches!(c, ModalControl::VideoButton(_));

        assert!(trap.focus(ModalControl::Share));
        assert_eq!(trap.next(no_switch_buttons), Some(ModalControl::ToggleActions));
        assert_eq!(trap.previous(no_switch_buttons), Some(ModalControl::Share));

        let no_toggle = |c: ModalControl| c != ModalControl::ToggleActions;
        assert!(trap.focus(ModalControl::VideoButton(1)));
        assert_eq!(trap.next(no_toggle), Some(ModalControl::Close));
        assert_eq!(trap.previous(no_toggle), Some(ModalControl::VideoButton(1)));
    }
}
