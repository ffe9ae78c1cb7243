// SPDX-License-Identifier: GPL-3.0-only

//! Pure filtering step between the probe and the published inventory.

use drivelist_types::{ProbedVolume, VolumeClass, VolumeClassFilter, VolumeRecord};

/// Keep exactly the probed volumes whose class is enabled in `filter`
/// and that are either optical or ready; order is preserved as
/// reported. Optical drives are exempt from the readiness check so an
/// empty tray still shows up.
pub fn filter_volumes(probed: &[ProbedVolume], filter: &VolumeClassFilter) -> Vec<VolumeRecord> {
    probed
        .iter()
        .filter(|v| filter.allows(v.class) && (v.class == VolumeClass::Optical || v.ready))
        .map(|v| VolumeRecord::new(v.ident.clone()))
        .collect()
}
