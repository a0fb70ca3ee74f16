use crate::extract::field_spec::Record;

/// Extension points around each extraction round.
///
/// Observers see the round's admitted records read-only and cannot touch
/// the session state.
pub trait RoundObserver {
    fn before_round(&mut self) {}

    fn after_round(&mut self, _admitted: &[Record]) {}
}

/// No-op observer.
impl RoundObserver for () {}

type BeforeFn<'a> = Box<dyn FnMut() + 'a>;
type AfterFn<'a> = Box<dyn FnMut(&[Record]) + 'a>;

/// Closure-backed observer.
#[derive(Default)]
pub struct Hooks<'a> {
    before: Option<BeforeFn<'a>>,
    after: Option<AfterFn<'a>>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self {
            before: None,
            after: None,
        }
    }

    pub fn before(mut self, f: impl FnMut() + 'a) -> Self {
        self.before = Some(Box::new(f));
        self
    }

    pub fn after(mut self, f: impl FnMut(&[Record]) + 'a) -> Self {
        self.after = Some(Box::new(f));
        self
    }
}

impl RoundObserver for Hooks<'_> {
    fn before_round(&mut self) {
        if let Some(f) = self.before.as_mut() {
            f();
        }
    }

    fn after_round(&mut self, admitted: &[Record]) {
        if let Some(f) = self.after.as_mut() {
            f(admitted);
        }
    }
}
