//! Interactive session over a line-oriented reader.

use std::io::{BufRead, Write};

use thiserror::Error;

use invoice_builder_core::IdGenerator;
use invoice_builder_infra::{InvoiceSession, KeyValueStorage};
use invoice_builder_invoicing::LineItemId;

use crate::action::{self, Action};
use crate::render;

pub const HELP: &str = "\
commands:
  catalog                 list services
  add                     add an empty line item
  select <id> [service]   pick a service (omit to clear)
  price <id> <amount>     override the unit price
  qty <id> <quantity>     set the quantity
  remove <id>             delete a line item
  clear                   delete every line item
  tax <rate>              tax percent for this session
  discount <rate>         discount percent for this session
  show                    print the invoice
  help                    this text
  quit                    leave (line items are already saved)
";

const PROMPT: &str = "> ";

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command {0:?}; type `help` for the list")]
    UnknownVerb(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{0:?} is not a line item id")]
    BadId(String),
}

#[derive(Debug, PartialEq)]
pub enum Input {
    Action(Action),
    Help,
    Quit,
    Blank,
}

/// Parse one input line. Words are whitespace separated.
pub fn parse_line(line: &str) -> Result<Input, ParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Blank);
    };
    let args: Vec<&str> = words.collect();

    let id = |usage: &'static str| -> Result<LineItemId, ParseError> {
        let raw = args.first().ok_or(ParseError::Usage(usage))?;
        raw.parse().map_err(|_| ParseError::BadId(raw.to_string()))
    };
    let value = |usage: &'static str| -> Result<String, ParseError> {
        args.get(1)
            .map(|v| v.to_string())
            .ok_or(ParseError::Usage(usage))
    };
    let rate = |usage: &'static str| -> Result<String, ParseError> {
        args.first()
            .map(|v| v.to_string())
            .ok_or(ParseError::Usage(usage))
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => return Ok(Input::Quit),
        "catalog" => Action::Catalog,
        "add" => Action::Add,
        "show" => Action::Show,
        "clear" => Action::Clear,
        "select" => Action::Select {
            id: id("select <id> [service]")?,
            service: args.get(1).map(|s| s.to_string()).unwrap_or_default(),
        },
        "price" => Action::Price {
            id: id("price <id> <amount>")?,
            raw: value("price <id> <amount>")?,
        },
        "qty" => Action::Qty {
            id: id("qty <id> <quantity>")?,
            raw: value("qty <id> <quantity>")?,
        },
        "remove" => Action::Remove {
            id: id("remove <id>")?,
        },
        "tax" => Action::Tax {
            raw: rate("tax <rate>")?,
        },
        "discount" => Action::Discount {
            raw: rate("discount <rate>")?,
        },
        _ => return Err(ParseError::UnknownVerb(verb.to_string())),
    };
    Ok(Input::Action(action))
}

/// Read commands until `quit` or end of input.
///
/// Bad input and failed actions are reported on `out` and the loop carries on;
/// only write failures on `out` end it early.
pub fn run<S, G, R, W>(
    session: &mut InvoiceSession<S, G>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    G: IdGenerator,
    R: BufRead,
    W: Write + ?Sized,
{
    write!(out, "{}", render::invoice(session.draft()))?;
    writeln!(out, "type `help` for commands")?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;

        match parse_line(&line) {
            Ok(Input::Blank) => {}
            Ok(Input::Help) => write!(out, "{HELP}")?,
            Ok(Input::Quit) => break,
            Ok(Input::Action(requested)) => {
                if let Err(err) = action::perform(session, requested, out) {
                    tracing::warn!(error = %err, "action failed");
                    writeln!(out, "error: {err:#}")?;
                }
            }
            Err(err) => writeln!(out, "error: {err}")?,
        }
    }

    tracing::info!(line_items = session.line_items().len(), "session ended");
    Ok(())
}
