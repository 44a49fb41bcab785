// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod doctor;
pub mod jobs;
pub mod reports;
pub mod seed;
pub mod transactions;
pub mod users;
