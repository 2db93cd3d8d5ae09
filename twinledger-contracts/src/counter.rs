use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Result};

/// Capped counter. The cap bounds the stored value, not the increment:
/// any increment that would push the value past `max` reverts and leaves
/// the value untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    value: u64,
    max: u64,
}

impl Counter {
    pub fn new(initial: u64, max: u64) -> Result<Self> {
        if initial > max {
            return Err(ContractError::InitialPastCap { initial, max });
        }
        Ok(Self {
            value: initial,
            max,
        })
    }

    pub fn read(&self) -> u64 {
        self.value
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn increment(&mut self, inc: u64) -> Result<u64> {
        let next = self.value.checked_add(inc).ok_or(ContractError::Overflow)?;
        if next > self.max {
            return Err(ContractError::CapExceeded {
                inc,
                value: self.value,
                max: self.max,
            });
        }

        self.value = next;
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_the_initial_value() {
        let counter = Counter::new(10, 100).unwrap();
        assert_eq!(counter.read(), 10);
    }

    #[test]
    fn increments_by_the_given_argument() {
        let mut counter = Counter::new(10, 100).unwrap();
        counter.increment(5).unwrap();
        assert_eq!(counter.read(), 15);
    }

    #[test]
    fn rejects_increments_past_the_cap() {
        let mut counter = Counter::new(10, 100).unwrap();
        let err = counter.increment(101).unwrap_err();
        assert!(matches!(err, ContractError::CapExceeded { .. }));
        assert!(err.to_string().contains("is out of range"));
        // state unchanged
        assert_eq!(counter.read(), 10);
    }

    #[test]
    fn can_fill_up_to_the_cap_exactly() {
        let mut counter = Counter::new(10, 100).unwrap();
        assert_eq!(counter.increment(90).unwrap(), 100);
        assert!(counter.increment(1).is_err());
    }

    #[test]
    fn rejects_an_initial_value_past_the_cap() {
        assert!(matches!(
            Counter::new(101, 100),
            Err(ContractError::InitialPastCap { .. })
        ));
    }

    #[test]
    fn rejects_overflowing_increments() {
        let mut counter = Counter::new(0, u64::MAX).unwrap();
        counter.increment(u64::MAX - 1).unwrap();
        assert!(matches!(
            counter.increment(u64::MAX),
            Err(ContractError::Overflow)
        ));
        assert_eq!(counter.read(), u64::MAX - 1);
    }
}
