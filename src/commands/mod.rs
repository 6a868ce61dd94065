// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod books;
pub mod expenses;
pub mod rates;
pub mod summary;
pub mod exporter;
pub mod doctor;
