// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar in the shared template style, labelled with `msg`.
///
/// Draws to stderr and hides itself when stderr is not a terminal.
pub fn progress_bar(len: usize, msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise} ETA: {eta}] {msg}: {wide_bar:.yellow} {human_pos}/{human_len}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▇▆▅▄▃▂▁  ");
    bar.set_style(style);
    bar.set_message(msg);
    bar
}
