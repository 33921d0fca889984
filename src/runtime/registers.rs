use std::ops::{Deref, Index};

use serde::{Deserialize, Serialize};

use super::runtime_error::RegisterError;
use crate::lang::Register;

static ZERO: u64 = 0;

/// The URM register store.
///
/// Backed by a plain vector that grows on write: reading an index past the
/// current extent yields 0 without allocating, writing to it extends the
/// vector with zeros first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RegisterBank {
    values: Vec<u64>,
}

impl RegisterBank {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Creates `size` zeroed registers.
    pub fn allocate(size: usize) -> Self {
        Self {
            values: vec![0; size],
        }
    }

    pub fn from_values(values: Vec<u64>) -> Self {
        Self { values }
    }

    /// Builds a bank from wire integers, rejecting negative values.
    pub fn from_signed(values: &[i64]) -> Result<Self, RegisterError> {
        let values = values
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                u64::try_from(value).map_err(|_| RegisterError::InvalidValue { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }

    pub fn get(&self, index: Register) -> u64 {
        self.values.get(index).copied().unwrap_or(0)
    }

    pub fn set(&mut self, index: Register, value: u64) {
        if index >= self.values.len() {
            self.values.resize(index + 1, 0);
        }
        self.values[index] = value;
    }

    pub fn checked_get(&self, index: i64) -> Result<u64, RegisterError> {
        let index = usize::try_from(index).map_err(|_| RegisterError::InvalidIndex(index))?;
        Ok(self.get(index))
    }

    pub fn checked_set(&mut self, index: i64, value: i64) -> Result<(), RegisterError> {
        let index = usize::try_from(index).map_err(|_| RegisterError::InvalidIndex(index))?;
        let value = u64::try_from(value).map_err(|_| RegisterError::InvalidValue { index, value })?;
        self.set(index, value);
        Ok(())
    }

    /// Current allocated extent.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Grows the bank to at least `size` registers. Never shrinks.
    pub fn ensure_size(&mut self, size: usize) {
        if size > self.values.len() {
            self.values.resize(size, 0);
        }
    }

    /// Copies the current contents. Later writes to the bank do not show up
    /// in the snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.values.clone().into_boxed_slice())
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }
}

impl Index<Register> for RegisterBank {
    type Output = u64;

    fn index(&self, index: Register) -> &Self::Output {
        self.values.get(index).unwrap_or(&ZERO)
    }
}

impl From<Vec<u64>> for RegisterBank {
    fn from(values: Vec<u64>) -> Self {
        Self::from_values(values)
    }
}

/// Frozen copy of a [`RegisterBank`], as stored in the trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Box<[u64]>);

impl Snapshot {
    pub fn to_vec(&self) -> Vec<u64> {
        self.0.to_vec()
    }
}

impl Deref for Snapshot {
    type Target = [u64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&RegisterBank> for Snapshot {
    fn from(bank: &RegisterBank) -> Self {
        bank.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_registers_read_zero() {
        let bank = RegisterBank::allocate(2);
        assert_eq!(bank.get(0), 0);
        assert_eq!(bank.get(1_000), 0);
        assert_eq!(bank[1_000], 0);
        assert_eq!(bank.size(), 2, "reads must not grow the bank");
    }

    #[test]
    fn test_set_extends_storage() {
        let mut bank = RegisterBank::new();
        bank.set(4, 9);
        assert_eq!(bank.size(), 5);
        assert_eq!(bank.as_slice(), &[0, 0, 0, 0, 9]);
    }

    #[test]
    fn test_snapshot_has_value_semantics() {
        let mut bank = RegisterBank::from_values(vec![1, 2, 3]);
        let snapshot = bank.snapshot();
        bank.set(0, 100);
        bank.set(10, 1);
        assert_eq!(&*snapshot, &[1, 2, 3]);
        assert_eq!(bank.get(0), 100);
    }

    #[test]
    fn test_ensure_size_never_shrinks() {
        let mut bank = RegisterBank::from_values(vec![7, 7, 7]);
        bank.ensure_size(1);
        assert_eq!(bank.size(), 3);
        bank.ensure_size(5);
        assert_eq!(bank.as_slice(), &[7, 7, 7, 0, 0]);
    }

    #[test]
    fn test_checked_access_rejects_negatives() {
        let mut bank = RegisterBank::new();
        assert_eq!(bank.checked_get(-1), Err(RegisterError::InvalidIndex(-1)));
        assert_eq!(
            bank.checked_set(-3, 1),
            Err(RegisterError::InvalidIndex(-3))
        );
        assert_eq!(
            bank.checked_set(2, -5),
            Err(RegisterError::InvalidValue { index: 2, value: -5 })
        );
        assert_eq!(bank.size(), 0, "failed writes must not touch the bank");

        bank.checked_set(2, 5).unwrap();
        assert_eq!(bank.checked_get(2), Ok(5));
    }

    #[test]
    fn test_from_signed() {
        let bank = RegisterBank::from_signed(&[0, 7, 8]).unwrap();
        assert_eq!(bank.as_slice(), &[0, 7, 8]);

        let err = RegisterBank::from_signed(&[0, -7]).unwrap_err();
        assert_eq!(err, RegisterError::InvalidValue { index: 1, value: -7 });
        assert!(err.to_string().contains("non-negative"));
    }
}
