//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use invoice_builder_invoicing::LineItemId;

/// invoice-builder - assemble a pet-care services invoice
#[derive(Parser, Debug)]
#[command(name = "invoice-builder")]
#[command(version)]
#[command(about = "Build a pet-care services invoice from the terminal", long_about = None)]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, value_name = "PATH", env = "INVOICE_BUILDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the line items are stored in (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Tax rate in percent for this run; invalid input counts as 0
    #[arg(long, global = true, value_name = "RATE", allow_hyphen_values = true)]
    pub tax_rate: Option<String>,

    /// Discount rate in percent for this run; invalid input counts as 0
    #[arg(long, global = true, value_name = "RATE", allow_hyphen_values = true)]
    pub discount_rate: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run; bare `invoice-builder` shows the invoice.
    pub fn resolved_command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Show)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the services that can be put on an invoice
    Catalog,

    /// Add an empty line item and print its id
    Add,

    /// Pick the service for a line item ("" or an unknown id clears it)
    Select {
        #[arg(value_name = "ID")]
        id: LineItemId,

        #[arg(value_name = "SERVICE", default_value = "")]
        service: String,
    },

    /// Override the unit price of a line item
    Price {
        #[arg(value_name = "ID")]
        id: LineItemId,

        #[arg(value_name = "AMOUNT", allow_hyphen_values = true)]
        value: String,
    },

    /// Set the quantity of a line item
    Qty {
        #[arg(value_name = "ID")]
        id: LineItemId,

        #[arg(value_name = "QUANTITY", allow_hyphen_values = true)]
        value: String,
    },

    /// Delete a line item
    Remove {
        #[arg(value_name = "ID")]
        id: LineItemId,
    },

    /// Print the line items and totals
    Show,

    /// Delete every line item
    Clear,

    /// Read commands from stdin until `quit`
    Session,
}
