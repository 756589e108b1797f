/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct FlateError {
    /// standard error code
    exit_code: ExitCode,

    /// diagnostic message including location. Content should not be relied on.
    message: String,
}

pub type Result<T> = std::result::Result<T, FlateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    /// the operating system could not supply the random seed for the encoder
    RandomSourceUnavailable = 1,
}

impl Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Display for FlateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0}: {1}", self.exit_code, self.message)
    }
}

impl FlateError {
    pub fn new(exit_code: ExitCode, message: &str) -> FlateError {
        FlateError {
            exit_code,
            message: message.to_owned(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<getrandom::Error> for FlateError {
    #[track_caller]
    fn from(e: getrandom::Error) -> Self {
        let caller = std::panic::Location::caller();
        FlateError {
            exit_code: ExitCode::RandomSourceUnavailable,
            message: format!("error {} at {}", e, caller),
        }
    }
}

/// translates FlateError into std::io::Error, which involves putting into a Box and using Other
impl From<FlateError> for std::io::Error {
    fn from(e: FlateError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, e)
    }
}

impl std::error::Error for FlateError {}

#[test]
fn test_error_translation() {
    // wrapping inside an io error keeps the inner error reachable
    fn my_std_error() -> std::result::Result<(), std::io::Error> {
        Err(FlateError::new(ExitCode::RandomSourceUnavailable, "test error").into())
    }

    let e = my_std_error().unwrap_err();
    let inner = e
        .into_inner()
        .unwrap()
        .downcast::<FlateError>()
        .unwrap();
    assert_eq!(inner.exit_code(), ExitCode::RandomSourceUnavailable);
    assert_eq!(inner.message(), "test error");
}
