// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Assertions

use std::fmt::Debug;

use gatekeep_auth::AuthResult;

/// Asserts that `result` failed with the given error code.
#[track_caller]
pub fn assert_auth_error<T: Debug>(result: AuthResult<T>, expected_code: &str) {
    match result {
        Ok(value) => panic!("expected {} but got Ok({:?})", expected_code, value),
        Err(e) => assert_eq!(
            e.error_code(),
            expected_code,
            "expected {} but got {:?}",
            expected_code,
            e
        ),
    }
}

/// Asserts that `result` failed with one of the given error codes.
#[track_caller]
pub fn assert_auth_error_in<T: Debug>(result: AuthResult<T>, expected_codes: &[&str]) {
    match result {
        Ok(value) => panic!("expected one of {:?} but got Ok({:?})", expected_codes, value),
        Err(e) => assert!(
            expected_codes.contains(&e.error_code()),
            "expected one of {:?} but got {:?}",
            expected_codes,
            e
        ),
    }
}
