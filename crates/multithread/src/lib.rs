// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod dealer;
mod pool;
mod report;
mod session;

pub use dealer::*;
pub use pool::*;
pub use report::*;
pub use session::*;

