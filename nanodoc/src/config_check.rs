// SPDX-License-Identifier: Apache-2.0

//! Compile-time configuration validation
//!
//! This module contains compile-time checks to ensure that mutually exclusive
//! features are not enabled simultaneously.

// Compile-time checks for mutually exclusive integer width features

// If none were selected that's an error
#[cfg(not(any(feature = "int32", feature = "int64")))]
compile_error!("No integer width features selected: choose one of 'int32' or 'int64'");

#[cfg(all(feature = "int32", feature = "int64"))]
compile_error!(
    "Cannot enable both 'int32' and 'int64' features simultaneously: choose one integer width"
);

// Compile-time checks for mutually exclusive string length-field widths

#[cfg(not(any(feature = "strlen8", feature = "strlen16", feature = "strlen32")))]
compile_error!(
    "No string length-field width selected: choose one of 'strlen8', 'strlen16', or 'strlen32'"
);

#[cfg(all(feature = "strlen8", feature = "strlen16"))]
compile_error!("Cannot enable both 'strlen8' and 'strlen16' features simultaneously");

#[cfg(all(feature = "strlen8", feature = "strlen32"))]
compile_error!("Cannot enable both 'strlen8' and 'strlen32' features simultaneously");

#[cfg(all(feature = "strlen16", feature = "strlen32"))]
compile_error!("Cannot enable both 'strlen16' and 'strlen32' features simultaneously");
