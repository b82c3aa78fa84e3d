use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Default, Deserialize, Serialize)]
pub struct SharedSettings {
    /// Overwrite an existing output directory
    #[arg(long, global = true)]
    pub clobber: bool,

    /// Turn on extra debug logging
    ///
    /// This option enables extra logging intended for debugging only, including reads library resolution
    /// details and the per-library estimator inputs.
    ///
    #[arg(long, global = true)]
    pub debug: bool,
}
