use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::error::DomainError;

/// Accumulated shortfall against the daily quota, by day, plus a list of
/// credits applied against the total.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Debt {
    days: BTreeMap<NaiveDate, f64>,
    adjustments: Vec<f64>,
}

impl Debt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a day's shortfall. Zero and negative shortfalls are rejected.
    pub fn set(&mut self, date: NaiveDate, amount: f64) -> Result<(), DomainError> {
        if amount <= 0.0 {
            return Err(DomainError::InvalidHours);
        }
        self.days.insert(date, amount);
        Ok(())
    }

    /// Registers a credit. Credits apply in insertion order.
    pub fn adjust(&mut self, amount: f64) {
        self.adjustments.push(amount);
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &f64)> {
        self.days.iter()
    }

    /// Net debt. Each credit is subtracted in turn; the loop stops once the
    /// running total has already gone below zero, so a single credit can
    /// still drive the total negative.
    pub fn total(&self) -> f64 {
        let mut total: f64 = self.days.values().sum();

        for adjustment in &self.adjustments {
            if total < 0.0 {
                break;
            }
            total -= adjustment;
        }

        total
    }
}
