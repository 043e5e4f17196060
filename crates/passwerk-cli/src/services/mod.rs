// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer behind the command line: configuration discovery and the
// render-to-file job.

pub mod config_dir;
pub mod render;
