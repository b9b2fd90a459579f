//! Interactive quoting over a line-oriented terminal.
//!
//! Every answer is tried as a literal value first and only then as an option
//! number, so a size of `20` is never mistaken for the twentieth entry.

use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info};

use bangler_core::DomainError;
use bangler_pricing::{PriceQuote, PricingEngine};
use bangler_wizard::{SpecificationResolver, WizardError, WizardState};

use crate::display;

/// What came back from one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Line(String),
    /// Ctrl-C while waiting for input.
    Interrupted,
    /// Input closed.
    Closed,
}

/// Line reader paired with an output sink.
pub struct Terminal<R, W> {
    lines: Lines<R>,
    out: W,
    watch_ctrl_c: bool,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
            watch_ctrl_c: false,
        }
    }

    /// Treat Ctrl-C as an answer while prompting and as a cancel signal
    /// while pricing.
    pub fn watching_ctrl_c(mut self) -> Self {
        self.watch_ctrl_c = true;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn watches_ctrl_c(&self) -> bool {
        self.watch_ctrl_c
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }

    pub async fn ask(&mut self, prompt: &str) -> io::Result<Answer> {
        self.out.write_all(prompt.as_bytes())?;
        self.out.flush()?;

        let line = if self.watch_ctrl_c {
            tokio::select! {
                line = self.lines.next_line() => line?,
                _ = ctrl_c() => {
                    self.out.write_all(b"\n")?;
                    return Ok(Answer::Interrupted);
                }
            }
        } else {
            self.lines.next_line().await?
        };

        Ok(match line {
            Some(line) => Answer::Line(line.trim().to_string()),
            None => Answer::Closed,
        })
    }
}

/// Wait for Ctrl-C. If the handler cannot be installed, wait forever.
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Cancel signal for a price fetch: Ctrl-C when `watch` is set, else never.
pub async fn interrupt(watch: bool) {
    if watch {
        ctrl_c().await;
    } else {
        std::future::pending::<()>().await;
    }
}

/// Drive one wizard session to an accepted quote.
///
/// Returns `None` when the user cancels or closes the input.
pub async fn run_quote<R, W>(
    engine: &PricingEngine,
    mut wizard: SpecificationResolver,
    term: &mut Terminal<R, W>,
) -> anyhow::Result<Option<PriceQuote>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let default_fee = engine.config().default_base_fee;
    term.say("Type a value or its number. `back` undoes a step, `cancel` quits.")?;

    loop {
        let step = match wizard.state() {
            WizardState::Cancelled => {
                term.say("Cancelled.")?;
                return Ok(None);
            }
            WizardState::Complete => {
                if let Some(quote) = price_once(engine, &mut wizard, term).await? {
                    return Ok(Some(quote));
                }
                continue;
            }
            WizardState::AwaitingStep(step) => step,
        };

        let options = wizard.options();
        term.say(&display::step_prompt(step, &options, default_fee))?;
        let input = match term.ask("> ").await? {
            Answer::Line(line) => line,
            Answer::Interrupted | Answer::Closed => {
                wizard.cancel();
                continue;
            }
        };

        match input.to_ascii_lowercase().as_str() {
            "back" => {
                if let Err(err) = wizard.back() {
                    term.say(&err.to_string())?;
                }
            }
            "cancel" | "quit" => {
                wizard.cancel();
            }
            _ => submit(&mut wizard, &input, &options, term)?,
        }
    }
}

fn submit<R, W>(
    wizard: &mut SpecificationResolver,
    input: &str,
    options: &[String],
    term: &mut Terminal<R, W>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let err = match wizard.submit(input) {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };
    if matches!(err, WizardError::Rejected { .. }) {
        if let Some(choice) = display::pick_option(input, options) {
            if wizard.submit(choice).is_ok() {
                return Ok(());
            }
        }
    }
    debug!(input, error = %err, "answer rejected");
    term.say(&err.to_string())
}

/// Price the completed specification once.
///
/// `Some` is a quote the user accepted. `None` means the wizard state moved
/// (back, cancel, or left complete for a retry) and the loop continues.
async fn price_once<R, W>(
    engine: &PricingEngine,
    wizard: &mut SpecificationResolver,
    term: &mut Terminal<R, W>,
) -> anyhow::Result<Option<PriceQuote>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let spec = wizard.resolved()?;
    term.say(&format!("Pricing {spec} ..."))?;

    match engine
        .price_specification_until(&spec, None, interrupt(term.watches_ctrl_c()))
        .await
    {
        Ok(quote) => {
            term.say(&display::quote(&quote))?;
            let warning = display::deviation_warning(&quote).filter(|_| quote.needs_confirmation);
            let Some(warning) = warning else {
                return Ok(Some(quote));
            };
            match term.ask(&format!("{warning}. Accept? [y/N] ")).await? {
                Answer::Line(answer) if is_yes(&answer) => {
                    info!(quote_id = %quote.quote_id, "fee deviation confirmed");
                    Ok(Some(quote))
                }
                Answer::Line(_) => {
                    wizard.back()?;
                    Ok(None)
                }
                Answer::Interrupted | Answer::Closed => {
                    wizard.cancel();
                    Ok(None)
                }
            }
        }
        Err(err) if err.is_retryable() || err == DomainError::Cancelled => {
            term.say(&display::domain_error(&err))?;
            match term.ask("Retry? [Y/n/back] ").await? {
                Answer::Line(answer) if answer.eq_ignore_ascii_case("back") => {
                    wizard.back()?;
                }
                Answer::Line(answer) if answer.is_empty() || is_yes(&answer) => {}
                Answer::Line(_) | Answer::Interrupted | Answer::Closed => {
                    wizard.cancel();
                }
            }
            Ok(None)
        }
        Err(err) => {
            term.say(&display::domain_error(&err))?;
            term.say("Change the selection to continue.")?;
            wizard.back()?;
            Ok(None)
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}
