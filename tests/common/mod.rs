#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use app_spider::device::accessor::{AppLifecycle, Locator, ViewAccessor};
use app_spider::device::error::DeviceError;
use app_spider::extract::field_spec::FieldSpec;
use app_spider::spider::config::SpiderConfig;

pub const PACKAGE: &str = "com.example.shop";
pub const CARD: &str = "id/card";

/// One list item on screen: (locator, text) pairs in layout order.
pub type Card = Vec<(&'static str, &'static str)>;

pub fn card(entries: &[(&'static str, &'static str)]) -> Card {
    entries.to_vec()
}

/// Handle into a mock frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    frame: usize,
    card: usize,
    entry: Option<usize>,
}

#[derive(Default)]
pub struct MockState {
    /// Screen contents per scroll position; the last frame repeats
    pub frames: Vec<Vec<Card>>,
    pub frame: usize,
    pub foreground: Option<String>,
    /// Package that ends up in front after `start_app`, if not the requested one
    pub launch_lands_on: Option<String>,
    pub started: Vec<String>,
    pub swipes: Vec<((u32, u32), (u32, u32))>,
    pub find_calls: HashMap<String, usize>,
    /// Locator whose `find` fails, and whether the failure is fatal
    pub fail_find: Option<(String, bool)>,
    /// Frame index from which `find` fails fatally on every locator
    pub die_at_frame: Option<usize>,
    /// Text value whose read fails with a recoverable error
    pub fail_text: Option<String>,
    pub fail_swipe: Option<bool>,
}

/// Scripted in-memory device. Clones share state so tests can inspect it
/// after the spider drops its copy.
#[derive(Clone)]
pub struct MockDevice {
    pub state: Rc<RefCell<MockState>>,
}

impl MockDevice {
    pub fn new(frames: Vec<Vec<Card>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                frames,
                ..MockState::default()
            })),
        }
    }

    pub fn configure(&self, f: impl FnOnce(&mut MockState)) -> &Self {
        f(&mut self.state.borrow_mut());
        self
    }

    pub fn swipe_count(&self) -> usize {
        self.state.borrow().swipes.len()
    }

    pub fn find_count(&self, locator: &str) -> usize {
        self.state
            .borrow()
            .find_calls
            .get(locator)
            .copied()
            .unwrap_or(0)
    }

    /// A connector handing out clones of this device.
    pub fn connector(&self) -> impl FnMut() -> Result<MockDevice, DeviceError> + use<> {
        let device = self.clone();
        move || Ok(device.clone())
    }

    fn current_cards(state: &MockState) -> Vec<Card> {
        state.frames.get(state.frame).cloned().unwrap_or_default()
    }

    fn entry<'a>(state: &'a MockState, el: &MockElement) -> Option<&'a (&'static str, &'static str)> {
        let entry = el.entry?;
        state.frames.get(el.frame)?.get(el.card)?.get(entry)
    }
}

impl ViewAccessor for MockDevice {
    type Element = MockElement;

    fn find(&mut self, locator: &Locator) -> Result<Vec<MockElement>, DeviceError> {
        let mut state = self.state.borrow_mut();
        *state
            .find_calls
            .entry(locator.as_str().to_string())
            .or_insert(0) += 1;

        if state.die_at_frame.is_some_and(|frame| state.frame >= frame) {
            return Err(DeviceError::Io("bridge went away".into()));
        }
        let failing = state
            .fail_find
            .as_ref()
            .filter(|(failing, _)| failing == locator.as_str());
        if let Some((_, fatal)) = failing {
            return Err(if *fatal {
                DeviceError::Io("broken pipe".into())
            } else {
                DeviceError::Command {
                    command: "find".into(),
                    error: "selector timeout".into(),
                }
            });
        }

        let frame = state.frame;
        let cards = Self::current_cards(&state);
        if locator.as_str() == CARD {
            return Ok((0..cards.len())
                .map(|card| MockElement {
                    frame,
                    card,
                    entry: None,
                })
                .collect());
        }

        let mut found = Vec::new();
        for (card_index, card) in cards.iter().enumerate() {
            for (entry_index, (loc, _)) in card.iter().enumerate() {
                if *loc == locator.as_str() {
                    found.push(MockElement {
                        frame,
                        card: card_index,
                        entry: Some(entry_index),
                    });
                }
            }
        }
        Ok(found)
    }

    fn exists(&mut self, element: &MockElement) -> Result<bool, DeviceError> {
        Ok(element.frame == self.state.borrow().frame)
    }

    fn text(&mut self, element: &MockElement) -> Result<String, DeviceError> {
        let state = self.state.borrow();
        let (_, text) = Self::entry(&state, element)
            .ok_or_else(|| DeviceError::StaleElement(format!("{:?}", element)))?;
        if state.fail_text.as_deref() == Some(*text) {
            return Err(DeviceError::StaleElement(text.to_string()));
        }
        Ok(text.to_string())
    }

    fn find_child(
        &mut self,
        parent: &MockElement,
        locator: &Locator,
    ) -> Result<Option<MockElement>, DeviceError> {
        let state = self.state.borrow();
        let Some(card) = state.frames.get(parent.frame).and_then(|f| f.get(parent.card)) else {
            return Ok(None);
        };
        Ok(card
            .iter()
            .position(|(loc, _)| *loc == locator.as_str())
            .map(|entry| MockElement {
                frame: parent.frame,
                card: parent.card,
                entry: Some(entry),
            }))
    }

    fn screen_size(&mut self) -> Result<(u32, u32), DeviceError> {
        Ok((1080, 2400))
    }

    fn swipe(
        &mut self,
        from: (u32, u32),
        to: (u32, u32),
        _duration: Duration,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        if let Some(fatal) = state.fail_swipe {
            return Err(if fatal {
                DeviceError::NotConnected
            } else {
                DeviceError::Command {
                    command: "swipe".into(),
                    error: "gesture rejected".into(),
                }
            });
        }
        state.swipes.push((from, to));
        let last = state.frames.len().saturating_sub(1);
        state.frame = (state.frame + 1).min(last);
        Ok(())
    }
}

impl AppLifecycle for MockDevice {
    fn device_name(&mut self) -> Result<String, DeviceError> {
        Ok("Mock Pixel".into())
    }

    fn start_app(&mut self, package: &str) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        state.started.push(package.to_string());
        let landed = state
            .launch_lands_on
            .clone()
            .unwrap_or_else(|| package.to_string());
        state.foreground = Some(landed);
        Ok(())
    }

    fn current_app(&mut self) -> Result<Option<String>, DeviceError> {
        Ok(self.state.borrow().foreground.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// name → id/name, price → id/price, shop → id/shop
pub fn shop_fields() -> FieldSpec {
    FieldSpec::new([("name", "id/name"), ("price", "id/price"), ("shop", "id/shop")]).unwrap()
}

/// Config with no waits, suitable for tests.
pub fn fast_config(fields: FieldSpec) -> SpiderConfig {
    SpiderConfig::new(PACKAGE, fields)
        .with_settle_delay(Duration::ZERO)
        .with_launch_wait(Duration::ZERO)
}

/// A product card with all three shop fields.
pub fn product(name: &'static str, price: &'static str, shop: &'static str) -> Card {
    card(&[("id/name", name), ("id/price", price), ("id/shop", shop)])
}
