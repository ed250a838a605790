// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the engine.
//!
//! Log lines are built from message structs under [`messages`] rather than
//! ad-hoc format strings, so every event carries the same typed fields
//! wherever it is emitted. The library only emits `tracing` events; the
//! binary installs the subscriber.

pub mod messages;
