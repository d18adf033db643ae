// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod tokens;
pub mod workouts;

pub use credentials::{CredentialError, CredentialVerifier};
pub use tokens::{TokenError, TokenService};
pub use workouts::WorkoutService;
