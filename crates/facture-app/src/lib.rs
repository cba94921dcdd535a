// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod amount;
pub mod catalog;
pub mod ids;
pub mod model;
pub mod print;
pub mod rows;
pub mod selection;
pub mod state;
pub mod totals;

pub use amount::*;
pub use catalog::*;
pub use ids::*;
pub use model::*;
pub use print::*;
pub use rows::*;
pub use selection::*;
pub use state::*;
pub use totals::*;
