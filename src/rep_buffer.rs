use thiserror::Error;

/// Largest value the three-digit rep keypad can enter.
pub const MAX_REPS: u32 = 999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepError {
    #[error("exercise index {index} out of range (workout has {len} exercises)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("rep count {0} exceeds 999")]
    TooLarge(u32),
}

/// Per-exercise reps logged during one session; `None` means not logged yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepBuffer {
    entries: Vec<Option<u32>>,
}

impl RepBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![None; len],
        }
    }

    /// Adopt reps saved in a snapshot, padded or truncated to `len`.
    pub fn restore(len: usize, saved: &[Option<u32>]) -> Self {
        let mut entries: Vec<Option<u32>> = saved.iter().take(len).copied().collect();
        entries.resize(len, None);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Option<u32>] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.entries.get(index).copied().flatten()
    }

    pub fn log_rep(&mut self, index: usize, value: Option<u32>) -> Result<(), RepError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(RepError::IndexOutOfRange { index, len })?;
        if let Some(count) = value {
            if count > MAX_REPS {
                return Err(RepError::TooLarge(count));
            }
        }
        *slot = value;
        Ok(())
    }

    /// Values as persisted: unlogged entries become zero.
    pub fn coerced(&self) -> Vec<u32> {
        self.entries.iter().map(|entry| entry.unwrap_or(0)).collect()
    }

    pub fn reset(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }
}
