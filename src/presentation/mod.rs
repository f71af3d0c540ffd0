// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 交互模式的HTTP表示层

pub mod errors;
pub mod interactive;
pub mod middleware;
pub mod routes;

pub use interactive::{run_interactive, InteractiveOptions};
