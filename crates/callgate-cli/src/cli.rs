use callgate_kernel::RequestMethod;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "callgate",
    about = "Callgate: parse, resolve, authorize and dispatch textual function calls",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a call expression without running it
    Parse {
        /// Call expression, e.g. `isEven(n)`
        expr: String,

        /// Parse as a SQL-function call (allows a `schema.` qualifier)
        #[arg(long)]
        sql: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve one argument token against a data context
    Resolve {
        /// Argument token, e.g. `n`, `'text'`, `42`, `` `k` ``
        token: String,

        /// Path to the data context (JSON object)
        #[arg(long)]
        context: String,

        /// Path to a raw-literal table (JSON object of key -> fragment); opts into raw lookup
        #[arg(long)]
        raw: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a call expression through the full pipeline with the stock functions
    Invoke {
        /// Call expression, e.g. `isEven(n)`
        expr: String,

        /// Path to the function registry JSON
        #[arg(long)]
        registry: String,

        /// Path to the data context (JSON object)
        #[arg(long)]
        context: String,

        /// Path to a dispatch config TOML
        #[arg(long)]
        config: Option<String>,

        /// Path to a raw-literal table; opts this call into raw lookup
        #[arg(long)]
        raw: Option<String>,

        /// Caller request method
        #[arg(long, default_value = "GET")]
        method: RequestMethod,

        /// Caller tag
        #[arg(long)]
        tag: Option<String>,

        /// Caller version
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        version: i64,

        /// Resolve arguments eagerly (overrides config)
        #[arg(long)]
        eager: bool,

        /// Verify results against declared return types (overrides config)
        #[arg(long)]
        strict: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a function registry and print its snapshot digest
    RegistryCheck {
        /// Path to the function registry JSON
        #[arg(long)]
        registry: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
