// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dense cluster selection for noisy channel index listings.
//!
//! Config dumps mix the real, roughly sequential channel slots with reserved
//! placeholders far outside the populated range (`Encode[40]` on an 8 channel
//! recorder, for instance). The densest run of indices is taken as the real
//! channel population.

use std::collections::BTreeSet;

/// Maximum `max - min` of a kept run.
pub const CLUSTER_SPAN: u32 = 32;

/// Returns the largest run of distinct values whose span is at most
/// [`CLUSTER_SPAN`].
///
/// Ties go to the lowest-valued run.
///
/// # Examples
///
/// ```
/// use dvr_monitor::adapter::dense_cluster;
///
/// let kept = dense_cluster([0, 1, 2, 3, 40, 2]);
/// assert_eq!(kept.into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
/// ```
#[must_use]
pub fn dense_cluster(values: impl IntoIterator<Item = u32>) -> BTreeSet<u32> {
    dense_cluster_with_span(values, CLUSTER_SPAN)
}

/// [`dense_cluster`] with an explicit span.
#[must_use]
pub fn dense_cluster_with_span(values: impl IntoIterator<Item = u32>, span: u32) -> BTreeSet<u32> {
    let sorted: Vec<u32> = values
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (mut best_start, mut best_end) = (0, 0);
    let mut end = 0;
    for (start, &low) in sorted.iter().enumerate() {
        while end < sorted.len() && sorted[end] - low <= span {
            end += 1;
        }
        if end - start > best_end - best_start {
            best_start = start;
            best_end = end;
        }
    }

    sorted[best_start..best_end].iter().copied().collect()
}
