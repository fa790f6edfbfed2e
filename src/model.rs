use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::{format_range, parse_clock_time};
use crate::pricing::{Discount, EstimateDraft, LineItem, PricingError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Customer {
    pub name: String,         // company or person
    pub attn: Option<String>, // contact at the company
    pub email: Option<String>,
    pub service_address: Option<Address>,
}

/// Estimate or invoice draft as written in a TOML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EstimateFile {
    pub customer: Option<Customer>,
    /// Percent; the configured default applies when absent.
    pub tax_rate: Option<Decimal>,
    pub discount: Option<Discount>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl EstimateFile {
    pub fn into_draft(self, default_tax_rate: Decimal) -> Result<EstimateDraft, PricingError> {
        let mut draft = EstimateDraft::new(self.tax_rate.unwrap_or(default_tax_rate))?;
        for item in self.items {
            draft.add_item(item)?;
        }
        if let Some(discount) = self.discount {
            draft.apply_discount(discount)?;
        }
        Ok(draft)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Appointment {
    pub customer: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String, // "09:00 AM"
    #[serde(default)]
    pub duration: String, // free text, "2 hours"
    pub technician: Option<String>,
}

impl Appointment {
    pub fn time_range_display(&self) -> String {
        format_range(&self.start_time, &self.duration)
    }

    fn sort_key(&self) -> (NaiveDate, u32) {
        // unreadable start times go last within their day
        (self.date, parse_clock_time(&self.start_time).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppointmentBook {
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

impl AppointmentBook {
    /// Appointments ordered by day, then start time.
    pub fn sorted(&self) -> Vec<&Appointment> {
        let mut list: Vec<&Appointment> = self.appointments.iter().collect();
        list.sort_by_key(|a| a.sort_key());
        list
    }

    pub fn on(&self, date: NaiveDate) -> Vec<&Appointment> {
        self.sorted().into_iter().filter(|a| a.date == date).collect()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.appointments.iter().map(|a| a.date)
    }
}
