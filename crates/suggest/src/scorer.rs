//! Confidence scorer.
//!
//! Pure function over one (bank amount, invoice outstanding, description,
//! names, dates) tuple. Additive rubric, capped at 100:
//! - amount agreement, max 40
//! - description/name agreement, max 30 (mutually exclusive)
//! - date proximity, max 15

use chrono::NaiveDate;

use reconwarden_domain::{AmountBand, AmountMatch, DateMatch, MatchRationale, TextMatch};

/// Candidates below this score are never surfaced as suggestions.
pub const SCORE_ADMISSION_THRESHOLD: u8 = 20;

const AMOUNT_EXACT_SCORE: u8 = 40;
const AMOUNT_CLOSE_SCORE: u8 = 25;
const AMOUNT_APPROX_SCORE: u8 = 10;
const TEXT_INVOICE_NUMBER_SCORE: u8 = 30;
const TEXT_CUSTOMER_NAME_SCORE: u8 = 20;

/// One candidate pair to score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub bank_amount_minor: i64,
    pub invoice_outstanding_minor: i64,
    pub bank_description: &'a str,
    pub invoice_number: &'a str,
    pub customer_name: &'a str,
    pub bank_date: NaiveDate,
    pub invoice_due_date: NaiveDate,
}

/// Score one candidate pair. Returns the capped total and the full rationale
/// (sub-scores plus the raw `amount_diff_ratio` drift feature).
pub fn score(input: &ScoreInput<'_>) -> (u8, MatchRationale) {
    let rationale = MatchRationale {
        amount: score_amount(input.bank_amount_minor, input.invoice_outstanding_minor),
        text: score_text(input.bank_description, input.invoice_number, input.customer_name),
        date: score_date(input.bank_date, input.invoice_due_date),
    };
    (rationale.total_score(), rationale)
}

fn score_amount(bank_minor: i64, outstanding_minor: i64) -> AmountMatch {
    if outstanding_minor <= 0 {
        return AmountMatch {
            diff_ratio: f64::INFINITY,
            band: AmountBand::None,
            score: 0,
        };
    }

    let diff_ratio =
        (bank_minor - outstanding_minor).abs() as f64 / outstanding_minor as f64;

    let (band, score) = if diff_ratio <= 0.01 {
        (AmountBand::Exact, AMOUNT_EXACT_SCORE)
    } else if diff_ratio <= 0.05 {
        (AmountBand::Close, AMOUNT_CLOSE_SCORE)
    } else if diff_ratio <= 0.10 {
        (AmountBand::Approximate, AMOUNT_APPROX_SCORE)
    } else {
        (AmountBand::None, 0)
    };

    AmountMatch { diff_ratio, band, score }
}

fn score_text(description: &str, invoice_number: &str, customer_name: &str) -> TextMatch {
    let description = description.to_lowercase();

    // Invoice-number match preferred; empty needles never match.
    if !invoice_number.is_empty() && description.contains(&invoice_number.to_lowercase()) {
        return TextMatch::InvoiceNumber {
            score: TEXT_INVOICE_NUMBER_SCORE,
        };
    }
    if !customer_name.is_empty() && description.contains(&customer_name.to_lowercase()) {
        return TextMatch::CustomerName {
            score: TEXT_CUSTOMER_NAME_SCORE,
        };
    }
    TextMatch::None
}

fn score_date(bank_date: NaiveDate, due_date: NaiveDate) -> DateMatch {
    let day_diff = (bank_date - due_date).num_days().abs();
    let score = if day_diff <= 3 {
        15
    } else if day_diff <= 7 {
        10
    } else if day_diff <= 14 {
        5
    } else {
        0
    };
    DateMatch { day_diff, score }
}
