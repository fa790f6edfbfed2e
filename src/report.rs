//! Terminal tables for estimates, month grids and agendas.

use chrono::{Datelike, NaiveDate};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::calendar::{weeks, CalendarCell, WEEKDAY_LABELS};
use crate::model::{Appointment, Customer};
use crate::pricing::{format_money, EstimateDraft};

const TODAY_COLOR: Color = Color::Rgb { r: 219, g: 112, b: 147 };
const DISCOUNT_COLOR: Color = Color::Rgb { r: 4, g: 120, b: 87 };

fn money_cell(value: Decimal, symbol: &str) -> Cell {
    Cell::new(format_money(value, symbol)).set_alignment(CellAlignment::Right)
}

pub fn customer_header(customer: &Customer) -> String {
    let mut lines = vec![customer.name.clone()];
    if let Some(attn) = &customer.attn {
        lines.push(format!("Attn: {}", attn));
    }
    if let Some(addr) = &customer.service_address {
        lines.push(addr.street.clone());
        lines.push(format!("{}, {} {}", addr.city, addr.state, addr.zip));
    }
    if let Some(email) = &customer.email {
        lines.push(email.clone());
    }
    lines.join("\n")
}

pub fn line_items_table(draft: &EstimateDraft, symbol: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Item"),
        Cell::new("Rate"),
        Cell::new("Qty"),
        Cell::new("Amount"),
    ]);

    for (idx, item) in draft.items().iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&item.name),
            money_cell(item.unit_rate, symbol),
            Cell::new(item.quantity).set_alignment(CellAlignment::Right),
            match item.amount() {
                Ok(amount) => money_cell(amount, symbol),
                Err(e) => Cell::new(e),
            },
        ]);
    }
    table
}

/// The summary panel: subtotal, tax, discount, total.
pub fn summary_table(draft: &EstimateDraft, symbol: &str) -> Table {
    let summary = draft.summary().rounded();
    let mut table = Table::new();

    table.add_row(vec![Cell::new("Subtotal"), money_cell(summary.subtotal, symbol)]);
    table.add_row(vec![
        Cell::new(format!("Tax ({}%)", draft.tax_rate().normalize())),
        money_cell(summary.tax_amount, symbol),
    ]);
    if let Some(discount) = draft.discount() {
        table.add_row(vec![
            Cell::new(format!("Discount ({})", discount.label())),
            Cell::new(format!("-{}", format_money(summary.discount_amount, symbol)))
                .fg(DISCOUNT_COLOR)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        money_cell(summary.total, symbol).add_attribute(Attribute::Bold),
    ]);
    table
}

fn day_cell(cell: &CalendarCell, count: usize) -> Cell {
    let mut text = cell.date.day().to_string();
    if count > 0 {
        text.push_str(&format!("\n● {}", count));
    }

    let day = Cell::new(text);
    if cell.is_today {
        day.fg(TODAY_COLOR).add_attribute(Attribute::Bold)
    } else if !cell.is_current_month {
        day.fg(Color::DarkGrey)
    } else {
        day
    }
}

/// Month grid with a `● n` badge on days that have appointments.
pub fn month_table(grid: &[CalendarCell], counts: &BTreeMap<NaiveDate, usize>) -> Table {
    let mut table = Table::new();
    table.set_header(WEEKDAY_LABELS.iter().map(|d| Cell::new(*d)).collect::<Vec<_>>());

    for week in weeks(grid) {
        table.add_row(
            week.iter()
                .map(|c| day_cell(c, counts.get(&c.date).copied().unwrap_or(0)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

pub fn agenda_table(appointments: &[&Appointment]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Date"),
        Cell::new("Time"),
        Cell::new("Customer"),
        Cell::new("Job"),
        Cell::new("Technician"),
    ]);

    for appt in appointments {
        table.add_row(vec![
            Cell::new(appt.date.format("%a %m/%d/%Y")),
            Cell::new(appt.time_range_display()),
            Cell::new(&appt.customer),
            Cell::new(&appt.title),
            Cell::new(appt.technician.as_deref().unwrap_or("Unassigned")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{count_by_day, generate_month_grid};
    use crate::model::Address;
    use crate::pricing::{Discount, LineItem};
    use rust_decimal_macros::dec;

    fn draft() -> EstimateDraft {
        let mut draft = EstimateDraft::new(dec!(8)).unwrap();
        draft.add_item(LineItem::new("Water heater flush", dec!(1000), 1).unwrap()).unwrap();
        draft.add_item(LineItem::new("Anode rod", dec!(45.5), 2).unwrap()).unwrap();
        draft.apply_discount(Discount::Percentage(dec!(10))).unwrap();
        draft
    }

    #[test]
    fn estimate_tables_show_rounded_money() {
        let items = line_items_table(&draft(), "$").to_string();
        assert!(items.contains("Water heater flush"));
        assert!(items.contains("$1,000.00"));
        assert!(items.contains("$91.00"));

        let summary = summary_table(&draft(), "$").to_string();
        assert!(summary.contains("$1,091.00"));
        assert!(summary.contains("Tax (8%)"));
        assert!(summary.contains("$87.28"));
        assert!(summary.contains("Discount (10%)"));
        assert!(summary.contains("-$109.10"));
        assert!(summary.contains("$1,069.18"));
    }

    #[test]
    fn month_table_has_header_and_badges() {
        let grid = generate_month_grid(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(), "");
        let busy = NaiveDate::from_ymd_opt(2025, 11, 12).unwrap();
        let counts = count_by_day([busy, busy, busy]);

        let rendered = month_table(&grid, &counts).to_string();
        assert!(rendered.contains("Sun"));
        assert!(rendered.contains("Sat"));
        assert!(rendered.contains("● 3"));
    }

    #[test]
    fn customer_header_lists_contact_and_address() {
        let customer = Customer {
            name: "Harbor Dental".into(),
            attn: Some("Dana Lee".into()),
            email: None,
            service_address: Some(Address {
                street: "12 Pier Rd".into(),
                city: "Portland".into(),
                state: "ME".into(),
                zip: "04101".into(),
            }),
        };
        assert_eq!(
            customer_header(&customer),
            "Harbor Dental\nAttn: Dana Lee\n12 Pier Rd\nPortland, ME 04101"
        );
    }
}
