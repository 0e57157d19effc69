//! One module per `rex` subcommand.

pub mod fire;
pub mod history;
pub mod reload;
pub mod rules;
pub mod run;
pub mod validate;
