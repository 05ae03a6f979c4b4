//! Display helpers in Indonesian conventions.

use chrono::{DateTime, Datelike, NaiveDate};
use rand::Rng;

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Format an amount as rupiah, e.g. `Rp 150.000`.
///
/// The separator after `Rp` is a non-breaking space, as browsers render the
/// `id-ID` currency format.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("Rp\u{a0}{}", grouped)
}

/// Format an ISO date or timestamp as a long Indonesian date, e.g.
/// `18 Oktober 2026`. Input that doesn't parse is returned unchanged.
pub fn format_date(date: &str) -> String {
    let parsed = DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"));

    match parsed {
        Ok(d) => format!("{} {} {}", d.day(), MONTHS[d.month0() as usize], d.year()),
        Err(_) => date.to_string(),
    }
}

/// New order id in the form `#SNA1234`.
pub fn generate_order_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(1000..=9999);
    format!("#SNA{}", n)
}
