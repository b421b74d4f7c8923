// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed access/refresh token pairs.

mod claims;
mod manager;

pub use claims::{Claims, TokenType};
pub use manager::{hash_token, TokenManager, TokenPair, BEARER};
