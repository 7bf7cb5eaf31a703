//! Shared test harness modules for the homerank CLI.

use super::*;

mod helpers;
mod sync;
mod unit;
