use super::ServiceError;

/// Last good value of a read-only fetch. A failed refresh is logged and the
/// previous value stays in place, flagged as stale.
#[derive(Clone, Debug, Default)]
pub struct ViewState<T> {
    value: T,
    stale: bool,
}

impl<T> ViewState<T> {
    pub fn new(initial: T) -> Self {
        ViewState {
            value: initial,
            stale: false,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns whether the value or its staleness changed.
    pub fn settle(&mut self, result: Result<T, ServiceError>, what: &str) -> bool {
        match result {
            Ok(value) => {
                self.value = value;
                self.stale = false;
                true
            }
            Err(e) => {
                log::error!("Could not fetch {}: {}", what, e);
                !std::mem::replace(&mut self.stale, true)
            }
        }
    }
}
