// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod token;
pub mod user;
pub mod workout;

pub use token::{IssuedToken, TokenRecord};
pub use user::{NewUser, User, UserResponse};
pub use workout::{NewWorkout, NewWorkoutEntry, Workout, WorkoutEntry, WorkoutUpdate};
