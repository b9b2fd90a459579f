//! Plain-text rendering for the terminal.

use core::fmt::Write as _;

use rust_decimal::Decimal;

use bangler_core::DomainError;
use bangler_pricing::PriceQuote;
use bangler_wizard::{DEFAULT_FEE, StepKind};

/// Numbered option list for one wizard step.
pub fn step_prompt(step: StepKind, options: &[String], default_fee: Decimal) -> String {
    let mut out = String::new();
    if step == StepKind::BaseFee {
        let _ = writeln!(
            out,
            "Base fee: enter an amount, or press Enter for the default ({})",
            money(default_fee)
        );
        return out;
    }

    let _ = writeln!(out, "Choose {}:", step.label());
    let width = options.len().to_string().len();
    for (idx, option) in options.iter().enumerate() {
        let _ = writeln!(out, "  {:>width$}) {option}", idx + 1);
    }
    out
}

/// Map a numeric answer onto the option it indexes (1-based).
pub fn pick_option<'a>(input: &str, options: &'a [String]) -> Option<&'a str> {
    let idx: usize = input.trim().parse().ok()?;
    options.get(idx.checked_sub(1)?).map(String::as_str)
}

pub fn domain_error(err: &DomainError) -> String {
    let mut out = err.to_string();
    let alternatives = err.alternatives();
    if !alternatives.is_empty() {
        let _ = write!(out, "\n  available here: {}", alternatives.join(", "));
    }
    out
}

/// Confirmation question for a fee past the deviation threshold.
pub fn deviation_warning(quote: &PriceQuote) -> Option<String> {
    let deviation = quote.deviation()?;
    let direction = if deviation.delta.is_sign_negative() {
        "below"
    } else {
        "above"
    };
    Some(format!(
        "base fee {} is {}% {direction} the default {}",
        money(quote.base_fee.applied),
        deviation.percent.abs(),
        money(quote.base_fee.default)
    ))
}

pub fn quote(quote: &PriceQuote) -> String {
    let material = &quote.material;
    let basis = quote.basis.token();
    let mut out = String::new();

    let _ = writeln!(out, "Quote {}", quote.quote_id);
    let _ = writeln!(out, "  Bangle      {}", quote.specification);
    let _ = writeln!(out, "  SKU         {} (priced per {basis})", quote.sku);
    let _ = writeln!(
        out,
        "  Length      {:.3} in ({:.3} in bent + {:.3} in seam)",
        material.rounded_length_in, material.bent_length_in, material.seam_allowance_in
    );
    let _ = writeln!(
        out,
        "  Density     {} g/cm3 ({})",
        material.density.grams_per_cm3, material.density.key
    );
    let _ = writeln!(out, "  Weight      {} DWT", quote.weight);
    let _ = writeln!(
        out,
        "  Unit price  {} {} / {basis}",
        quote.unit_price, quote.currency
    );
    let _ = writeln!(
        out,
        "  Material    {} x {} = {}",
        quote.billed_quantity,
        quote.unit_price,
        money(quote.material_cost)
    );

    let fee = &quote.base_fee;
    let fee_note = match (fee.deviation, fee.rejected_custom) {
        (Some(deviation), _) => format!(
            "custom, {:+}% vs {}",
            deviation.percent,
            money(fee.default)
        ),
        (None, Some(rejected)) => format!("{DEFAULT_FEE}; custom {rejected} not usable"),
        (None, None) => DEFAULT_FEE.to_string(),
    };
    let _ = writeln!(out, "  Base fee    {} ({fee_note})", money(fee.applied));
    let _ = writeln!(out, "  Total       {} {}", money(quote.total), quote.currency);
    out
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}
