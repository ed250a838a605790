// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod executor;
pub mod report;

pub use executor::{Executor, ExecutorOptions};
pub use report::{ExecutionReport, LoadReport, StepOutput};
