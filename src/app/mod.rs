//! Application runtime composition modules.

pub(crate) mod console;
pub(crate) mod runtime;
pub(crate) mod signals;
pub(crate) mod terminal;
