// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Value and binding model shared by the federation components

pub mod binding;
pub mod term;

pub use binding::{Binding, BindingNames};
pub use term::{Literal, LiteralAnnotation, Term};
