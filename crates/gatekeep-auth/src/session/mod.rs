// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Login sessions.

mod activity;
mod manager;

pub use activity::ActivityTracker;
pub use manager::{LoginOutcome, LoginRequest, SessionManager, SessionManagerBuilder, UserSummary};
